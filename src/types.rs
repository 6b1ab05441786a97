use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dimensions::{DimensionSpec, Dimensions};

/// Container media type produced by recorders unless they report their own
pub const DEFAULT_MIME_TYPE: &str = "video/webm";

/// Extension appended to downloaded recordings
pub const DOWNLOAD_EXTENSION: &str = "webm";

/// Lifecycle of a recording as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Stopped,
}

impl RecordingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Stopped => "stopped",
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording)
    }
}

impl std::fmt::Display for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-supplied configuration of one mounted component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Include a microphone track in the captured stream
    pub request_audio: bool,
    /// Render the preview fullscreen behind other content
    pub display_fullscreen: bool,
    /// Show the blinking REC overlay while recording
    pub show_indicator: bool,
    pub dimensions: DimensionSpec,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            request_audio: false,
            display_fullscreen: false,
            show_indicator: false,
            dimensions: DimensionSpec::sized(640, 360),
        }
    }
}

impl CaptureOptions {
    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.request_audio = enabled;
        self
    }

    pub fn with_fullscreen(mut self, enabled: bool) -> Self {
        self.display_fullscreen = enabled;
        self
    }

    pub fn with_indicator(mut self, enabled: bool) -> Self {
        self.show_indicator = enabled;
        self
    }

    pub fn with_dimensions(mut self, dimensions: DimensionSpec) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn resolved_dimensions(&self) -> Dimensions {
        self.dimensions.resolve()
    }
}

/// Finalized recording: every buffered chunk concatenated in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVideo {
    pub data: Bytes,
    pub mime_type: String,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

impl RecordedVideo {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Summary of an artifact, safe to serialize to a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub size_bytes: usize,
    pub mime_type: String,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&RecordedVideo> for RecordingSummary {
    fn from(video: &RecordedVideo) -> Self {
        Self {
            size_bytes: video.len(),
            mime_type: video.mime_type.clone(),
            chunk_count: video.chunk_count,
            created_at: video.created_at,
        }
    }
}
