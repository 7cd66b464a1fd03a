use crate::error::Error;
use crate::services::camera_manager::{CaptureBackend, CaptureRequest, CaptureStream, CapturedFrame};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use log::{debug, error, info};
use std::sync::{Arc, Mutex};

const STARTUP_TIMEOUT_SECS: u64 = 5;

/// Most recent JPEG written by the appsink callback
type FrameSlot = Arc<Mutex<Option<Vec<u8>>>>;

/// Live camera through a GStreamer pipeline ending in a JPEG appsink
pub struct GstCaptureBackend;

impl GstCaptureBackend {
    pub fn new() -> Result<Self, Error> {
        gst::init().map_err(|e| Error::Internal(format!("Failed to initialize GStreamer: {}", e)))?;
        info!("GStreamer initialized for capture");
        Ok(Self)
    }

    fn pipeline_description(request: &CaptureRequest) -> String {
        // Mirrored so stored images match the mirrored preview
        format!(
            "v4l2src device={} ! videoconvert ! videoscale ! video/x-raw,width={},height={} \
             ! videoflip method=horizontal-flip ! jpegenc ! appsink name=snapshot max-buffers=1 drop=true sync=false",
            request.device, request.width, request.height
        )
    }
}

/// Map the first bus error to the capture taxonomy
fn startup_error(pipeline: &gst::Pipeline) -> Error {
    let message = pipeline
        .bus()
        .and_then(|bus| bus.pop_filtered(&[gst::MessageType::Error]));

    match message.as_ref().map(|msg| msg.view()) {
        Some(gst::MessageView::Error(err)) => {
            let gerror = err.error();
            let text = gerror.to_string();
            if gerror.matches(gst::ResourceError::NotAuthorized)
                || text.to_lowercase().contains("permission denied")
            {
                Error::PermissionDenied(text)
            } else {
                Error::DeviceUnavailable(text)
            }
        }
        _ => Error::DeviceUnavailable("pipeline failed to start".to_string()),
    }
}

/// Keep the newest encoded frame in the slot. Runs on the streaming thread,
/// so snapshots never wait on the pipeline.
fn attach_frame_slot(appsink: &gst_app::AppSink, slot: FrameSlot) {
    appsink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = match sink.pull_sample() {
                    Ok(sample) => sample,
                    Err(e) => {
                        error!("Failed to pull sample: {:?}", e);
                        return Err(gst::FlowError::Error);
                    }
                };

                let buffer = match sample.buffer() {
                    Some(buffer) => buffer,
                    None => return Ok(gst::FlowSuccess::Ok),
                };

                let map = match buffer.map_readable() {
                    Ok(map) => map,
                    Err(e) => {
                        error!("Failed to map buffer: {:?}", e);
                        return Ok(gst::FlowSuccess::Ok);
                    }
                };

                if let Ok(mut latest) = slot.lock() {
                    *latest = Some(map.as_slice().to_vec());
                }
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}

impl CaptureBackend for GstCaptureBackend {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    /// Blocks until the pipeline reaches PLAYING or the startup timeout
    /// passes; callers run it off the async workers.
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureStream>, Error> {
        let description = Self::pipeline_description(request);
        debug!("Creating capture pipeline: {}", description);

        let pipeline = gst::parse::launch(&description)
            .map_err(|e| Error::Capture(format!("Failed to build pipeline: {}", e)))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Capture("Capture description is not a pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("snapshot")
            .ok_or_else(|| Error::Capture("Missing snapshot appsink".to_string()))?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| Error::Capture("snapshot element is not an appsink".to_string()))?;

        let latest: FrameSlot = Arc::new(Mutex::new(None));
        attach_frame_slot(&appsink, latest.clone());

        if pipeline.set_state(gst::State::Playing).is_err() {
            let err = startup_error(&pipeline);
            let _ = pipeline.set_state(gst::State::Null);
            return Err(err);
        }

        let (result, _, _) = pipeline.state(gst::ClockTime::from_seconds(STARTUP_TIMEOUT_SECS));
        if result.is_err() {
            let err = startup_error(&pipeline);
            let _ = pipeline.set_state(gst::State::Null);
            return Err(err);
        }

        Ok(Box::new(GstCaptureStream {
            pipeline: Some(pipeline),
            latest,
        }))
    }
}

struct GstCaptureStream {
    pipeline: Option<gst::Pipeline>,
    latest: FrameSlot,
}

impl CaptureStream for GstCaptureStream {
    fn snapshot(&mut self) -> Result<CapturedFrame, Error> {
        if self.pipeline.is_none() {
            return Err(Error::Capture("Pipeline is closed".to_string()));
        }

        let bytes = self
            .latest
            .lock()
            .map_err(|_| Error::Internal("Frame slot poisoned".to_string()))?
            .clone()
            .ok_or_else(|| Error::Capture("No frame available yet".to_string()))?;

        Ok(CapturedFrame {
            mime: "image/jpeg".to_string(),
            bytes,
        })
    }

    fn close(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gst::State::Null) {
                error!("Failed to stop capture pipeline: {}", e);
            }
        }
    }
}

impl Drop for GstCaptureStream {
    fn drop(&mut self) {
        self.close();
    }
}
