//! webcam-recorder: camera capture and recording lifecycle component
//!
//! This crate wraps a platform's camera/microphone capture and recording
//! primitives behind a small controller with an `Idle -> Recording -> Stopped`
//! lifecycle, buffers the recorded chunks, and finalizes them into a single
//! downloadable artifact.
//!
//! # Features
//! - Recording lifecycle with observer notifications and a watch channel
//! - Ordered chunk buffering with empty-chunk and stale-session filtering
//! - Finalization and download of the recorded artifact
//! - Preview dimension resolution from partial constraints
//! - Blinking REC indicator driven by the recording flag
//! - Pluggable backends: in-memory synthetic, native camera (`native`)
//! - Tauri plugin surface (`tauri-plugin`)
//!
//! # Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use webcam_recorder::{CaptureOptions, WebcamController};
//! use webcam_recorder::platform::SyntheticDevices;
//!
//! let controller = WebcamController::new(Arc::new(SyntheticDevices::new()), CaptureOptions::default());
//! controller.acquire().await?;
//! controller.start()?;
//! controller.stop();
//! controller.download("my-clip")?;
//! ```
pub mod buffer;
#[cfg(feature = "tauri-plugin")]
pub mod commands;
pub mod config;
pub mod controller;
pub mod dimensions;
pub mod errors;
pub mod indicator;
pub mod layout;
pub mod platform;
pub mod types;

// Re-exports for convenience
pub use buffer::ChunkBuffer;
pub use config::WebcamConfig;
pub use controller::{ChunkSink, SubscriptionId, WebcamController, WebcamHandle};
pub use dimensions::{resolve_dimensions, AspectRatio, DimensionSpec, Dimensions};
pub use errors::WebcamError;
pub use indicator::RecordingIndicator;
pub use layout::{DisplayMode, PreviewLayout};
pub use types::{CaptureOptions, RecordedVideo, RecordingState, RecordingSummary};

#[cfg(feature = "tauri-plugin")]
pub use commands::init;

/// Initialize logging for the component
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("webcam_recorder=info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
