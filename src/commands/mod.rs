//! Tauri plugin surface
//!
//! One controller is mounted per plugin instance. Lifecycle transitions are
//! emitted to the webview as [`STATE_EVENT`] events.

pub mod recording;

pub use recording::*;

use std::sync::Arc;

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

use crate::platform::MediaDevices;

/// Event carrying the new [`crate::RecordingState`]
pub const STATE_EVENT: &str = "webcam://recording-state";

/// Initialize the plugin with the default backend for this build
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    #[cfg(feature = "native")]
    let devices: Arc<dyn MediaDevices> = Arc::new(crate::platform::NativeDevices::default());
    #[cfg(not(feature = "native"))]
    let devices: Arc<dyn MediaDevices> = Arc::new(crate::platform::SyntheticDevices::new());

    init_with_devices(devices)
}

/// Initialize the plugin with a host-supplied capture backend
pub fn init_with_devices<R: Runtime>(devices: Arc<dyn MediaDevices>) -> TauriPlugin<R> {
    recording::set_devices(devices);

    Builder::new("webcam")
        .invoke_handler(tauri::generate_handler![
            recording::webcam_mount::<R>,
            recording::webcam_unmount,
            recording::webcam_start,
            recording::webcam_stop,
            recording::webcam_state,
            recording::webcam_finalize,
            recording::webcam_download,
            recording::webcam_dimensions,
            recording::webcam_layout,
            recording::webcam_indicator,
        ])
        .build()
}
