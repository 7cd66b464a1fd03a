pub mod camera_manager;
pub mod classifier;
#[cfg(feature = "gstreamer")]
pub mod gst_capture;
pub mod history;
pub mod narrative;
pub mod scan;
pub mod vitals;

pub use camera_manager::CameraManager;
pub use narrative::NarrativeAnnotator;
pub use scan::{ScanOutcome, ScanTerminal};
pub use vitals::VitalsSource;
