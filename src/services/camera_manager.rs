use crate::config::{CaptureBackendKind, CaptureConfig};
use crate::error::Error;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fs::File;
use std::sync::Arc;
use uuid::Uuid;

/// What the terminal asks the host for. The camera faces the user and
/// frames are mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

impl CaptureRequest {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            device: config.device.clone(),
            width: config.width,
            height: config.height,
        }
    }
}

/// One still image taken from the live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CapturedFrame {
    /// Inline image reference stored on the attendance record
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// An open capture stream
pub trait CaptureStream: Send {
    fn snapshot(&mut self) -> Result<CapturedFrame, Error>;

    /// Stop the stream. Must be safe to call more than once.
    fn close(&mut self);
}

/// Host-side capture device provider
pub trait CaptureBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open the device. Fails with `PermissionDenied` when the host refuses
    /// access and `DeviceUnavailable` for every other reason. May block.
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureStream>, Error>;
}

fn placeholder_frame(width: u32, height: u32, label: &str) -> CapturedFrame {
    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\">\
         <rect width=\"100%\" height=\"100%\" fill=\"#111827\"/>\
         <text x=\"50%\" y=\"50%\" fill=\"#60a5fa\" font-family=\"monospace\" text-anchor=\"middle\">{label}</text>\
         </svg>",
        w = width,
        h = height,
        label = label,
    );
    CapturedFrame {
        mime: "image/svg+xml".to_string(),
        bytes: svg.into_bytes(),
    }
}

/// Synthetic camera for development and demos
#[derive(Debug, Default)]
pub struct TestPatternBackend;

struct TestPatternStream {
    width: u32,
    height: u32,
    open: bool,
}

impl CaptureStream for TestPatternStream {
    fn snapshot(&mut self) -> Result<CapturedFrame, Error> {
        if !self.open {
            return Err(Error::Capture("Stream is closed".to_string()));
        }
        let label = Utc::now().format("%H:%M:%S").to_string();
        Ok(placeholder_frame(self.width, self.height, &label))
    }

    fn close(&mut self) {
        self.open = false;
    }
}

impl CaptureBackend for TestPatternBackend {
    fn name(&self) -> &'static str {
        "test_pattern"
    }

    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureStream>, Error> {
        Ok(Box::new(TestPatternStream {
            width: request.width,
            height: request.height,
            open: true,
        }))
    }
}

/// Opens the device node directly. Holding the node open is enough to
/// report permission and availability problems; frames are placeholders,
/// real images need the GStreamer backend.
#[derive(Debug, Default)]
pub struct DeviceNodeBackend;

struct DeviceNodeStream {
    device: Option<File>,
    width: u32,
    height: u32,
}

impl CaptureStream for DeviceNodeStream {
    fn snapshot(&mut self) -> Result<CapturedFrame, Error> {
        if self.device.is_none() {
            return Err(Error::Capture("Device is closed".to_string()));
        }
        Ok(placeholder_frame(self.width, self.height, "device"))
    }

    fn close(&mut self) {
        self.device.take();
    }
}

impl CaptureBackend for DeviceNodeBackend {
    fn name(&self) -> &'static str {
        "device_node"
    }

    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureStream>, Error> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&request.device)
            .map_err(Error::from)?;

        Ok(Box::new(DeviceNodeStream {
            device: Some(file),
            width: request.width,
            height: request.height,
        }))
    }
}

/// Build the backend selected in configuration
pub fn create_backend(config: &CaptureConfig) -> Result<Arc<dyn CaptureBackend>, Error> {
    match config.backend {
        CaptureBackendKind::TestPattern => Ok(Arc::new(TestPatternBackend)),
        CaptureBackendKind::DeviceNode => Ok(Arc::new(DeviceNodeBackend)),
        #[cfg(feature = "gstreamer")]
        CaptureBackendKind::Gstreamer => Ok(Arc::new(super::gst_capture::GstCaptureBackend::new()?)),
        #[cfg(not(feature = "gstreamer"))]
        CaptureBackendKind::Gstreamer => Err(Error::Config(
            "capture backend 'gstreamer' requires building with the gstreamer feature".to_string(),
        )),
    }
}

/// Open stream plus bookkeeping. Dropping the handle closes the stream.
pub struct CaptureHandle {
    pub id: Uuid,
    pub acquired_at: DateTime<Utc>,
    stream: Box<dyn CaptureStream>,
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stream.close();
        debug!("Capture handle {} released", self.id);
    }
}

/// Device open prepared by the manager and run without holding it
pub struct PendingOpen {
    backend: Arc<dyn CaptureBackend>,
    request: CaptureRequest,
    epoch: u64,
}

impl PendingOpen {
    /// Blocking part of the acquisition
    pub fn open(self) -> Result<OpenedStream, Error> {
        let stream = self.backend.open(&self.request).map_err(|e| {
            warn!("Failed to open {} camera {}: {}", self.backend.name(), self.request.device, e);
            e
        })?;
        Ok(OpenedStream {
            stream,
            epoch: self.epoch,
        })
    }
}

/// Stream opened for a given manager epoch
pub struct OpenedStream {
    stream: Box<dyn CaptureStream>,
    epoch: u64,
}

/// Owns at most one capture handle for the terminal
pub struct CameraManager {
    backend: Arc<dyn CaptureBackend>,
    request: CaptureRequest,
    active: Option<CaptureHandle>,
    /// Bumped by every release; opens started before it are stale
    epoch: u64,
}

impl CameraManager {
    pub fn new(backend: Arc<dyn CaptureBackend>, request: CaptureRequest) -> Self {
        Self {
            backend,
            request,
            active: None,
            epoch: 0,
        }
    }

    pub fn begin_open(&self) -> PendingOpen {
        PendingOpen {
            backend: self.backend.clone(),
            request: self.request.clone(),
            epoch: self.epoch,
        }
    }

    /// Install an opened stream. A stream whose open was overtaken by a
    /// release is closed again and reported as `Conflict`; if another open
    /// won the race the existing handle is kept.
    pub fn finish_open(&mut self, opened: OpenedStream) -> Result<Uuid, Error> {
        let OpenedStream { mut stream, epoch } = opened;

        if epoch != self.epoch {
            stream.close();
            return Err(Error::Conflict(
                "Capture released during initialization".to_string(),
            ));
        }

        if let Some(handle) = &self.active {
            stream.close();
            return Ok(handle.id);
        }

        let handle = CaptureHandle {
            id: Uuid::new_v4(),
            acquired_at: Utc::now(),
            stream,
        };
        let id = handle.id;
        self.active = Some(handle);

        info!(
            "Camera acquired via {} ({}x{})",
            self.backend.name(),
            self.request.width,
            self.request.height
        );
        Ok(id)
    }

    /// Close the device if open. Returns whether a handle was released.
    pub fn release(&mut self) -> bool {
        self.epoch += 1;
        match self.active.take() {
            Some(handle) => {
                info!("Camera released after {}s", (Utc::now() - handle.acquired_at).num_seconds());
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn snapshot(&mut self) -> Result<CapturedFrame, Error> {
        match self.active.as_mut() {
            Some(handle) => handle.stream.snapshot(),
            None => Err(Error::Capture("Camera is not active".to_string())),
        }
    }
}
