//! Capture/recording controller
//!
//! Owns the acquired stream, the active recorder and the chunk buffer, and
//! drives the `Idle -> Recording -> Stopped` lifecycle. Recorders report back
//! through a [`ChunkSink`], which only holds a weak reference: anything they
//! deliver after the controller is gone is dropped.
//!
//! ```rust,ignore
//! let controller = WebcamController::builder(Arc::new(devices))
//!     .options(CaptureOptions::default().with_audio(true))
//!     .build();
//! controller.acquire().await?;
//! controller.start()?;
//! // ... chunks arrive ...
//! controller.stop();
//! controller.download("clip")?;
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::buffer::ChunkBuffer;
use crate::dimensions::Dimensions;
use crate::errors::WebcamError;
use crate::indicator::{IndicatorFrame, RecordingIndicator, DEFAULT_BLINK_PERIOD};
use crate::layout::PreviewLayout;
use crate::platform::{
    AlertSink, DirectorySaver, FileSaver, LogAlertSink, MediaConstraints, MediaDevices,
    MediaRecorder, MediaStream,
};
use crate::types::{
    CaptureOptions, RecordedVideo, RecordingState, DEFAULT_MIME_TYPE, DOWNLOAD_EXTENSION,
};

/// Message shown to the user when the camera cannot be opened
pub const ACCESS_ERROR_MESSAGE: &str = "An error occured while accessing the camera.";

/// Directory used by the default file saver
pub const DEFAULT_DOWNLOAD_DIR: &str = "./recordings";

/// Callback invoked with the new state after every transition
pub type StateListener = Arc<dyn Fn(RecordingState) + Send + Sync>;

/// Handle returned by [`WebcamController::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

/// Imperative operations a host can trigger on a mounted component
pub trait WebcamHandle: Send + Sync {
    fn start(&self) -> Result<(), WebcamError>;
    fn stop(&self);
    fn finalize(&self) -> Result<RecordedVideo, WebcamError>;
    fn download(&self, name: &str) -> Result<RecordedVideo, WebcamError>;
    fn current_state(&self) -> RecordingState;
}

struct Inner {
    state: RecordingState,
    chunks: ChunkBuffer,
    media: Option<Box<dyn MediaStream>>,
    recorder: Option<Box<dyn MediaRecorder>>,
    mime_type: String,
    /// Bumped on every start; sinks from older sessions are ignored
    session: u64,
    /// Bumped on every release; acquisitions from older epochs are discarded
    epoch: u64,
    options: CaptureOptions,
    dimensions: Dimensions,
    /// Present only while `show_indicator` is set
    indicator: Option<Arc<RecordingIndicator>>,
    indicator_period: Duration,
}

impl Inner {
    /// Create or drop the overlay to match `show_indicator`
    fn sync_indicator(&mut self) {
        match (self.options.show_indicator, self.indicator.is_some()) {
            (true, false) => {
                let indicator = RecordingIndicator::with_period(self.indicator_period);
                indicator.set_recording(self.state.is_recording());
                self.indicator = Some(Arc::new(indicator));
            }
            (false, true) => self.indicator = None,
            _ => {}
        }
    }
}

/// Transitions waiting to reach the listeners, in the order they happened
#[derive(Default)]
struct Dispatch {
    pending: VecDeque<RecordingState>,
    draining: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    listeners: Mutex<Vec<(SubscriptionId, StateListener)>>,
    dispatch: Mutex<Dispatch>,
    state_tx: watch::Sender<RecordingState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch_queue(&self) -> MutexGuard<'_, Dispatch> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a transition. Must be called with the inner lock held, so the
    /// queue order is the order in which states were set.
    fn transition(&self, inner: &mut Inner, state: RecordingState) {
        inner.state = state;
        if let Some(indicator) = &inner.indicator {
            indicator.set_recording(state.is_recording());
        }
        self.state_tx.send_replace(state);
        self.dispatch_queue().pending.push_back(state);
    }

    /// Deliver queued transitions to the listeners.
    ///
    /// Must be called without holding the inner lock. Only one thread drains
    /// at a time; a caller that finds a drain in progress leaves its
    /// transition to that thread, which delivers it after the earlier ones.
    fn notify(&self) {
        {
            let mut queue = self.dispatch_queue();
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        let _drain = DrainGuard(self);

        loop {
            let state = {
                let mut queue = self.dispatch_queue();
                match queue.pending.pop_front() {
                    Some(state) => state,
                    None => {
                        // Cleared under the same lock a new transition queues under.
                        queue.draining = false;
                        return;
                    }
                }
            };
            log::info!("Recording state changed: {}", state);

            let listeners: Vec<StateListener> = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            for listener in listeners {
                listener(state);
            }
        }
    }
}

/// Hands the drain back if a listener panics
struct DrainGuard<'a>(&'a Shared);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.dispatch_queue().draining = false;
        }
    }
}

/// Where a recorder delivers its chunks and its terminal stop event.
///
/// Bound to one recording session of one controller.
#[derive(Clone)]
pub struct ChunkSink {
    shared: Weak<Shared>,
    session: u64,
}

impl ChunkSink {
    /// Append a chunk to the session's buffer. Returns whether it was kept:
    /// empty chunks, stale sessions and torn-down controllers are ignored.
    pub fn deliver(&self, chunk: impl Into<Bytes>) -> bool {
        let chunk = chunk.into();
        if chunk.is_empty() {
            log::debug!("Discarding empty chunk (session {})", self.session);
            return false;
        }

        let Some(shared) = self.shared.upgrade() else {
            log::debug!("Discarding chunk for released controller");
            return false;
        };

        let mut inner = shared.lock();
        if inner.session != self.session {
            log::debug!(
                "Discarding chunk from stale session {} (current {})",
                self.session,
                inner.session
            );
            return false;
        }
        inner.chunks.push(chunk)
    }

    /// The recorder ended on its own
    pub fn stopped(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        let recorder = {
            let mut inner = shared.lock();
            if inner.session != self.session || inner.state != RecordingState::Recording {
                return;
            }
            log::warn!("Recorder stopped unexpectedly (session {})", self.session);
            shared.transition(&mut inner, RecordingState::Stopped);
            inner.recorder.take()
        };
        drop(recorder);
        shared.notify();
    }

    pub fn session(&self) -> u64 {
        self.session
    }
}

impl std::fmt::Debug for ChunkSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkSink")
            .field("session", &self.session)
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// Builder for [`WebcamController`]
pub struct WebcamControllerBuilder {
    devices: Arc<dyn MediaDevices>,
    options: CaptureOptions,
    saver: Option<Arc<dyn FileSaver>>,
    alerts: Option<Arc<dyn AlertSink>>,
    indicator_period: Duration,
}

impl WebcamControllerBuilder {
    pub fn options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    pub fn file_saver(mut self, saver: Arc<dyn FileSaver>) -> Self {
        self.saver = Some(saver);
        self
    }

    pub fn alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Blink period of the REC overlay, used when `show_indicator` is set
    pub fn indicator_period(mut self, period: Duration) -> Self {
        self.indicator_period = period;
        self
    }

    pub fn build(self) -> WebcamController {
        let dimensions = self.options.resolved_dimensions();
        let (state_tx, _) = watch::channel(RecordingState::Idle);

        let mut inner = Inner {
            state: RecordingState::Idle,
            chunks: ChunkBuffer::new(),
            media: None,
            recorder: None,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            session: 0,
            epoch: 0,
            options: self.options,
            dimensions,
            indicator: None,
            indicator_period: self.indicator_period,
        };
        inner.sync_indicator();

        WebcamController {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                listeners: Mutex::new(Vec::new()),
                dispatch: Mutex::new(Dispatch::default()),
                state_tx,
            }),
            devices: self.devices,
            saver: self
                .saver
                .unwrap_or_else(|| Arc::new(DirectorySaver::new(DEFAULT_DOWNLOAD_DIR))),
            alerts: self.alerts.unwrap_or_else(|| Arc::new(LogAlertSink)),
        }
    }
}

/// One mounted capture/recording component
pub struct WebcamController {
    shared: Arc<Shared>,
    devices: Arc<dyn MediaDevices>,
    saver: Arc<dyn FileSaver>,
    alerts: Arc<dyn AlertSink>,
}

impl WebcamController {
    pub fn builder(devices: Arc<dyn MediaDevices>) -> WebcamControllerBuilder {
        WebcamControllerBuilder {
            devices,
            options: CaptureOptions::default(),
            saver: None,
            alerts: None,
            indicator_period: DEFAULT_BLINK_PERIOD,
        }
    }

    pub fn new(devices: Arc<dyn MediaDevices>, options: CaptureOptions) -> Self {
        Self::builder(devices).options(options).build()
    }

    /// Open the camera (and microphone when requested).
    ///
    /// On failure the user-visible alert is raised once and the controller
    /// stays without a stream; nothing is retried. A result that arrives after
    /// `release` or `reconfigure` is stopped and discarded.
    pub async fn acquire(&self) -> Result<(), WebcamError> {
        let (constraints, epoch) = {
            let inner = self.shared.lock();
            if inner.media.is_some() {
                return Ok(());
            }
            let constraints = MediaConstraints::video_only()
                .with_audio(inner.options.request_audio)
                .with_ideal_size(inner.dimensions);
            (constraints, inner.epoch)
        };

        log::debug!(
            "Requesting media access (video: {}, audio: {})",
            constraints.video,
            constraints.audio
        );

        match self.devices.get_user_media(constraints).await {
            Ok(mut stream) => {
                let mut inner = self.shared.lock();
                if inner.epoch != epoch || inner.media.is_some() {
                    drop(inner);
                    log::debug!("Discarding late stream {}", stream.id());
                    stream.stop_tracks();
                    return Ok(());
                }
                log::info!(
                    "Media stream {} acquired (audio: {})",
                    stream.id(),
                    stream.has_audio()
                );
                inner.media = Some(stream);
                Ok(())
            }
            Err(err) => {
                let stale = self.shared.lock().epoch != epoch;
                let err = match err {
                    WebcamError::DeviceAccessDenied(msg) => WebcamError::DeviceAccessDenied(msg),
                    other => WebcamError::DeviceAccessDenied(other.to_string()),
                };
                if stale {
                    log::debug!("Ignoring failed acquisition for released controller: {}", err);
                    return Err(err);
                }
                log::error!("{} {}", ACCESS_ERROR_MESSAGE, err);
                self.alerts.alert(ACCESS_ERROR_MESSAGE);
                Err(err)
            }
        }
    }

    /// Begin a new recording cycle.
    ///
    /// Ignored when no stream is held or a recording is already running.
    pub fn start(&self) -> Result<(), WebcamError> {
        {
            let mut inner = self.shared.lock();
            if inner.state == RecordingState::Recording {
                log::debug!("start ignored: already recording");
                return Ok(());
            }
            let Some(media) = inner.media.as_mut() else {
                log::debug!("start ignored: no media stream");
                return Ok(());
            };

            let mut recorder = media.create_recorder()?;
            let session = inner.session + 1;
            recorder.start(ChunkSink {
                shared: Arc::downgrade(&self.shared),
                session,
            })?;

            inner.session = session;
            inner.chunks.clear();
            inner.mime_type = recorder.mime_type().to_string();
            inner.recorder = Some(recorder);
            self.shared.transition(&mut inner, RecordingState::Recording);
        }
        self.shared.notify();
        Ok(())
    }

    /// Finish the running recording. Ignored unless recording.
    pub fn stop(&self) {
        let recorder = {
            let mut inner = self.shared.lock();
            if inner.state != RecordingState::Recording {
                log::debug!("stop ignored: state is {}", inner.state);
                return;
            }
            self.shared.transition(&mut inner, RecordingState::Stopped);
            inner.recorder.take()
        };

        // Recorders may flush a final chunk into the sink while stopping.
        if let Some(mut recorder) = recorder {
            recorder.stop();
        }
        self.shared.notify();
    }

    /// Concatenate the buffered chunks into one artifact
    pub fn finalize(&self) -> Result<RecordedVideo, WebcamError> {
        let inner = self.shared.lock();
        if inner.chunks.is_empty() {
            return Err(WebcamError::EmptyBuffer);
        }
        let data = inner.chunks.concat()?;
        Ok(RecordedVideo {
            data,
            mime_type: inner.mime_type.clone(),
            chunk_count: inner.chunks.len(),
            created_at: Utc::now(),
        })
    }

    /// Finalize and hand the artifact to the file saver as `<name>.webm`.
    ///
    /// Returns the artifact that was saved.
    pub fn download(&self, name: &str) -> Result<RecordedVideo, WebcamError> {
        let video = self.finalize()?;
        let file_name = download_file_name(name);
        self.saver.save(&video, &file_name)?;
        Ok(video)
    }

    pub fn current_state(&self) -> RecordingState {
        self.shared.lock().state
    }

    /// Stop any running recorder and close the device. Safe to call repeatedly.
    pub fn release(&self) {
        let (recorder, media, was_recording) = {
            let mut inner = self.shared.lock();
            inner.epoch += 1;
            let was_recording = inner.state == RecordingState::Recording;
            if was_recording {
                self.shared.transition(&mut inner, RecordingState::Stopped);
            }
            (inner.recorder.take(), inner.media.take(), was_recording)
        };

        if let Some(mut recorder) = recorder {
            recorder.stop();
        }
        if let Some(mut media) = media {
            log::info!("Releasing media stream {}", media.id());
            media.stop_tracks();
        }
        if was_recording {
            self.shared.notify();
        }
    }

    /// Apply new host options. Toggling audio re-opens the device.
    pub async fn reconfigure(&self, options: CaptureOptions) -> Result<(), WebcamError> {
        let reacquire = {
            let mut inner = self.shared.lock();
            let audio_changed = inner.options.request_audio != options.request_audio;
            inner.dimensions = options.resolved_dimensions();
            inner.options = options;
            inner.sync_indicator();
            audio_changed
        };

        if reacquire {
            log::info!("Audio setting changed, re-acquiring media");
            self.release();
            self.acquire().await?;
        }
        Ok(())
    }

    /// Register a state-change callback
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(RecordingState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Receiver that always holds the latest state
    pub fn watch_state(&self) -> watch::Receiver<RecordingState> {
        self.shared.state_tx.subscribe()
    }

    pub fn options(&self) -> CaptureOptions {
        self.shared.lock().options.clone()
    }

    pub fn resolved_dimensions(&self) -> Dimensions {
        self.shared.lock().dimensions
    }

    pub fn layout(&self) -> PreviewLayout {
        let inner = self.shared.lock();
        PreviewLayout::compute(&inner.options, inner.dimensions)
    }

    /// The REC overlay, when `show_indicator` is set
    pub fn indicator(&self) -> Option<Arc<RecordingIndicator>> {
        self.shared.lock().indicator.clone()
    }

    /// What the REC overlay should draw now. `None` when the overlay is
    /// disabled or nothing is being recorded.
    pub fn indicator_frame(&self) -> Option<IndicatorFrame> {
        self.shared.lock().indicator.as_ref().and_then(|i| i.frame())
    }

    pub fn has_media(&self) -> bool {
        self.shared.lock().media.is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.shared.lock().chunks.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.shared.lock().chunks.total_bytes()
    }

    /// Copy of the buffered chunks, in arrival order
    pub fn chunks(&self) -> Vec<Bytes> {
        self.shared.lock().chunks.chunks().to_vec()
    }
}

impl WebcamHandle for WebcamController {
    fn start(&self) -> Result<(), WebcamError> {
        WebcamController::start(self)
    }

    fn stop(&self) {
        WebcamController::stop(self)
    }

    fn finalize(&self) -> Result<RecordedVideo, WebcamError> {
        WebcamController::finalize(self)
    }

    fn download(&self, name: &str) -> Result<RecordedVideo, WebcamError> {
        WebcamController::download(self, name)
    }

    fn current_state(&self) -> RecordingState {
        WebcamController::current_state(self)
    }
}

impl Drop for WebcamController {
    fn drop(&mut self) {
        self.release();
    }
}

/// `clip` -> `clip.webm`; names already carrying the extension are kept
pub fn download_file_name(name: &str) -> String {
    let suffix = format!(".{}", DOWNLOAD_EXTENSION);
    if name.to_ascii_lowercase().ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}
