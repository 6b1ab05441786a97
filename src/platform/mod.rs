//! Platform seams consumed by the controller
//!
//! A backend supplies device acquisition ([`MediaDevices`]), the acquired
//! stream ([`MediaStream`]) and a recorder bound to it ([`MediaRecorder`]).
//! Saving artifacts and raising user-visible alerts are separate seams so a
//! host can route them wherever it renders its UI.

pub mod file_saver;
#[cfg(feature = "native")]
pub mod native;
pub mod synthetic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::controller::ChunkSink;
use crate::dimensions::Dimensions;
use crate::errors::WebcamError;
use crate::types::RecordedVideo;

pub use file_saver::DirectorySaver;
#[cfg(feature = "native")]
pub use native::NativeDevices;
pub use synthetic::{AcquireGate, SyntheticDevices, SyntheticFeed};

/// What the controller asks the backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
    /// Preferred capture size; backends may ignore it
    pub ideal_size: Option<Dimensions>,
}

impl MediaConstraints {
    pub fn video_only() -> Self {
        Self {
            video: true,
            audio: false,
            ideal_size: None,
        }
    }

    pub fn with_audio(mut self, audio: bool) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_ideal_size(mut self, size: Dimensions) -> Self {
        self.ideal_size = Some(size);
        self
    }
}

/// Device access. Resolves once the platform grants or refuses access.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, WebcamError>;
}

/// An open capture stream. Dropping it without `stop_tracks` leaks the device
/// on some backends, so owners must stop it explicitly.
pub trait MediaStream: Send {
    fn id(&self) -> &str;

    fn has_audio(&self) -> bool;

    /// Stop every device track. Must be idempotent.
    fn stop_tracks(&mut self);

    /// Create a recorder bound to this stream. Each recording cycle gets a
    /// fresh recorder.
    fn create_recorder(&mut self) -> Result<Box<dyn MediaRecorder>, WebcamError>;
}

/// Recorder primitive. Emits chunks and, when it ends on its own, a terminal
/// stop event through the [`ChunkSink`] it was started with.
///
/// `start` must not deliver into the sink synchronously.
pub trait MediaRecorder: Send {
    /// Container media type of the emitted chunks
    fn mime_type(&self) -> &str;

    fn start(&mut self, sink: ChunkSink) -> Result<(), WebcamError>;

    /// Ask the recorder to finish. Chunks flushed after this call still land
    /// in the current session's buffer.
    fn stop(&mut self);
}

/// Client-side file save trigger
pub trait FileSaver: Send + Sync {
    fn save(&self, video: &RecordedVideo, file_name: &str) -> Result<(), WebcamError>;
}

/// Blocking user-visible notification
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert sink for headless hosts: the message goes to the log at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, message: &str) {
        log::error!("{}", message);
    }
}
