//! Native camera backend built on nokhwa
//!
//! Frames arrive on nokhwa's callback thread and are forwarded as chunks while
//! a recorder is running. nokhwa exposes video only; audio requests are logged
//! and the stream reports `has_audio() == false`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
    CallbackCamera,
};

use super::{MediaConstraints, MediaDevices, MediaRecorder, MediaStream};
use crate::controller::ChunkSink;
use crate::errors::WebcamError;

/// Media type of the raw frame chunks this backend emits
pub const NATIVE_MIME_TYPE: &str = "video/x-raw";

/// Opens the camera at a fixed device index
#[derive(Debug, Clone)]
pub struct NativeDevices {
    device_index: u32,
}

impl NativeDevices {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

impl Default for NativeDevices {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl MediaDevices for NativeDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, WebcamError> {
        if constraints.audio {
            log::warn!("Native backend captures video only; audio request ignored");
        }

        let index = self.device_index;
        let camera = tokio::task::spawn_blocking(move || open_camera(index))
            .await
            .map_err(|e| WebcamError::DeviceAccessDenied(format!("Camera task failed: {}", e)))??;

        Ok(Box::new(NativeStream {
            id: format!("native-{}", index),
            camera: Arc::new(Mutex::new(camera)),
            stopped: false,
        }))
    }
}

fn open_camera(index: u32) -> Result<CallbackCamera, WebcamError> {
    let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);

    let mut camera = CallbackCamera::new(CameraIndex::Index(index), requested_format, |_| {})
        .map_err(|e| WebcamError::DeviceAccessDenied(format!("Failed to open camera: {}", e)))?;

    camera
        .open_stream()
        .map_err(|e| WebcamError::DeviceAccessDenied(format!("Failed to start stream: {}", e)))?;

    Ok(camera)
}

fn lock_camera(camera: &Mutex<CallbackCamera>) -> MutexGuard<'_, CallbackCamera> {
    camera.lock().unwrap_or_else(PoisonError::into_inner)
}

struct NativeStream {
    id: String,
    camera: Arc<Mutex<CallbackCamera>>,
    stopped: bool,
}

impl MediaStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_audio(&self) -> bool {
        false
    }

    fn stop_tracks(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(e) = lock_camera(&self.camera).stop_stream() {
            log::warn!("Failed to stop camera stream {}: {}", self.id, e);
        }
    }

    fn create_recorder(&mut self) -> Result<Box<dyn MediaRecorder>, WebcamError> {
        if self.stopped {
            return Err(WebcamError::Recorder("camera stream already stopped".to_string()));
        }
        Ok(Box::new(NativeRecorder {
            camera: self.camera.clone(),
            running: Arc::new(AtomicBool::new(false)),
        }))
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

struct NativeRecorder {
    camera: Arc<Mutex<CallbackCamera>>,
    running: Arc<AtomicBool>,
}

impl MediaRecorder for NativeRecorder {
    fn mime_type(&self) -> &str {
        NATIVE_MIME_TYPE
    }

    fn start(&mut self, sink: ChunkSink) -> Result<(), WebcamError> {
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        lock_camera(&self.camera)
            .set_callback(move |buffer: nokhwa::Buffer| {
                if running.load(Ordering::SeqCst) {
                    sink.deliver(Bytes::copy_from_slice(buffer.buffer()));
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                WebcamError::Recorder(format!("Failed to attach frame callback: {}", e))
            })
    }

    fn stop(&mut self) {
        // Only flip the flag: the callback thread may be the caller.
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for NativeRecorder {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
