//! Tauri commands for the capture/recording controller

use std::sync::{Arc, RwLock as StdRwLock};

use tauri::{command, AppHandle, Emitter, Runtime};
use tokio::sync::RwLock;

use super::STATE_EVENT;
use crate::config::WebcamConfig;
use crate::controller::WebcamController;
use crate::dimensions::{DimensionSpec, Dimensions};
use crate::indicator::IndicatorFrame;
use crate::layout::PreviewLayout;
use crate::platform::{DirectorySaver, MediaDevices, SyntheticDevices};
use crate::types::{CaptureOptions, RecordingState, RecordingSummary};

lazy_static::lazy_static! {
    static ref DEVICES: StdRwLock<Arc<dyn MediaDevices>> =
        StdRwLock::new(Arc::new(SyntheticDevices::new()));
    static ref MOUNTED: RwLock<Option<Arc<WebcamController>>> = RwLock::new(None);
}

pub(crate) fn set_devices(devices: Arc<dyn MediaDevices>) {
    match DEVICES.write() {
        Ok(mut slot) => *slot = devices,
        Err(poisoned) => *poisoned.into_inner() = devices,
    }
}

fn devices() -> Arc<dyn MediaDevices> {
    match DEVICES.read() {
        Ok(slot) => slot.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

async fn mounted() -> Result<Arc<WebcamController>, String> {
    MOUNTED
        .read()
        .await
        .clone()
        .ok_or_else(|| "No webcam component is mounted".to_string())
}

/// Mount the component: open the device and start emitting state events.
///
/// Replaces (and releases) any previously mounted controller.
#[command]
pub async fn webcam_mount<R: Runtime>(
    app: AppHandle<R>,
    options: Option<CaptureOptions>,
) -> Result<PreviewLayout, String> {
    let config = WebcamConfig::load_or_default();
    let options = options.unwrap_or_else(|| config.capture_options());

    let controller = Arc::new(
        WebcamController::builder(devices())
            .options(options)
            .file_saver(Arc::new(DirectorySaver::new(
                &config.storage.download_directory,
            )))
            .indicator_period(config.indicator_period())
            .build(),
    );

    controller.subscribe(move |state| {
        if let Err(e) = app.emit(STATE_EVENT, state) {
            log::warn!("Failed to emit {}: {}", STATE_EVENT, e);
        }
    });

    mount(controller).await
}

/// Make `controller` the mounted one and open its device.
///
/// The previously mounted controller, if any, is released first.
pub async fn mount(controller: Arc<WebcamController>) -> Result<PreviewLayout, String> {
    let previous = MOUNTED.write().await.replace(controller.clone());
    if let Some(previous) = previous {
        previous.release();
    }

    controller.acquire().await.map_err(|e| e.to_string())?;
    Ok(controller.layout())
}

/// Release the device and drop the mounted controller
#[command]
pub async fn webcam_unmount() -> Result<(), String> {
    if let Some(controller) = MOUNTED.write().await.take() {
        controller.release();
    }
    Ok(())
}

#[command]
pub async fn webcam_start() -> Result<RecordingState, String> {
    let controller = mounted().await?;
    controller.start().map_err(|e| e.to_string())?;
    Ok(controller.current_state())
}

#[command]
pub async fn webcam_stop() -> Result<RecordingState, String> {
    let controller = mounted().await?;
    controller.stop();
    Ok(controller.current_state())
}

#[command]
pub async fn webcam_state() -> Result<RecordingState, String> {
    Ok(mounted().await?.current_state())
}

/// Finalized recording bytes
#[command]
pub async fn webcam_finalize() -> Result<Vec<u8>, String> {
    let video = mounted().await?.finalize().map_err(|e| e.to_string())?;
    Ok(video.data.to_vec())
}

#[command]
pub async fn webcam_download(name: Option<String>) -> Result<RecordingSummary, String> {
    let controller = mounted().await?;
    let name = name.unwrap_or_else(|| WebcamConfig::load_or_default().storage.default_file_name);

    let video = controller.download(&name).map_err(|e| e.to_string())?;
    Ok(RecordingSummary::from(&video))
}

#[command]
pub async fn webcam_dimensions(spec: DimensionSpec) -> Result<Dimensions, String> {
    Ok(spec.resolve())
}

#[command]
pub async fn webcam_layout() -> Result<PreviewLayout, String> {
    Ok(mounted().await?.layout())
}

/// Current REC overlay frame; `None` when the overlay is off or idle
#[command]
pub async fn webcam_indicator() -> Result<Option<IndicatorFrame>, String> {
    Ok(mounted().await?.indicator_frame())
}
