use thiserror::Error;

/// Errors surfaced by the capture/recording component.
///
/// Every variant is terminal for the attempted operation; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebcamError {
    /// Camera or microphone could not be opened. Declined permission and a
    /// missing device collapse into this one variant.
    #[error("Device access denied: {0}")]
    DeviceAccessDenied(String),
    /// `finalize` was called before any data was captured.
    #[error("No recorded data available")]
    EmptyBuffer,
    /// The recorded chunks could not be assembled into an artifact.
    #[error("Finalize error: {0}")]
    Finalize(String),
    #[error("Recorder error: {0}")]
    Recorder(String),
    #[error("Save error: {0}")]
    Save(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebcamError {
    /// Short machine-readable name for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            WebcamError::DeviceAccessDenied(_) => "device_access_denied",
            WebcamError::EmptyBuffer => "empty_buffer",
            WebcamError::Finalize(_) => "finalize",
            WebcamError::Recorder(_) => "recorder",
            WebcamError::Save(_) => "save",
            WebcamError::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for WebcamError {
    fn from(err: std::io::Error) -> Self {
        WebcamError::Save(err.to_string())
    }
}
