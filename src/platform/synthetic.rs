//! In-memory capture backend
//!
//! Stands in for real hardware in tests and in the CLI. Streams and recorders
//! are fully scriptable: a [`SyntheticFeed`] pushes chunks into whichever
//! recorder session is live, and an [`AcquireGate`] holds device acquisition
//! open until the test releases it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::{MediaConstraints, MediaDevices, MediaRecorder, MediaStream};
use crate::controller::ChunkSink;
use crate::errors::WebcamError;
use crate::types::DEFAULT_MIME_TYPE;

/// Deterministic chunk payload of `len` bytes
pub fn synthetic_chunk(len: usize, seed: u8) -> Bytes {
    let data: Vec<u8> = (0..len)
        .map(|i| seed.wrapping_add((i % 251) as u8))
        .collect();
    Bytes::from(data)
}

/// Holds `get_user_media` pending until opened
#[derive(Debug, Clone)]
pub struct AcquireGate {
    semaphore: Arc<Semaphore>,
}

impl AcquireGate {
    fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(0)),
        }
    }

    /// Let one pending acquisition complete
    pub fn open(&self) {
        self.semaphore.add_permits(1);
    }

    async fn pass(&self) {
        if let Ok(permit) = self.semaphore.acquire().await {
            permit.forget();
        }
    }
}

#[derive(Default)]
struct FeedState {
    sinks: Vec<ChunkSink>,
    active: bool,
    streams: Vec<Arc<AtomicBool>>,
    recorders_stopped: usize,
    flush_on_stop: Option<Bytes>,
}

/// Test-side driver for everything the synthetic backend opens
#[derive(Clone, Default)]
pub struct SyntheticFeed {
    state: Arc<Mutex<FeedState>>,
}

impl SyntheticFeed {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver a chunk to the live recorder session, if any
    pub fn push(&self, chunk: impl Into<Bytes>) -> bool {
        let sink = {
            let state = self.lock();
            if !state.active {
                return false;
            }
            state.sinks.last().cloned()
        };
        match sink {
            Some(sink) => sink.deliver(chunk),
            None => false,
        }
    }

    /// Sink of the `index`-th recorder session, live or not
    pub fn session_sink(&self, index: usize) -> Option<ChunkSink> {
        self.lock().sinks.get(index).cloned()
    }

    /// Simulate the platform ending the recording on its own
    pub fn end(&self) {
        let sink = {
            let mut state = self.lock();
            if !state.active {
                return;
            }
            state.active = false;
            state.sinks.last().cloned()
        };
        if let Some(sink) = sink {
            sink.stopped();
        }
    }

    /// Chunk every recorder emits as its final flush when stopped
    pub fn set_flush_on_stop(&self, chunk: Option<Bytes>) {
        self.lock().flush_on_stop = chunk;
    }

    pub fn is_recording(&self) -> bool {
        self.lock().active
    }

    pub fn recorders_started(&self) -> usize {
        self.lock().sinks.len()
    }

    pub fn recorders_stopped(&self) -> usize {
        self.lock().recorders_stopped
    }

    pub fn streams_opened(&self) -> usize {
        self.lock().streams.len()
    }

    /// Streams whose tracks are still running
    pub fn live_streams(&self) -> usize {
        self.lock()
            .streams
            .iter()
            .filter(|stopped| !stopped.load(Ordering::SeqCst))
            .count()
    }

    fn register_stream(&self) -> Arc<AtomicBool> {
        let stopped = Arc::new(AtomicBool::new(false));
        self.lock().streams.push(stopped.clone());
        stopped
    }

    fn begin(&self, sink: ChunkSink) {
        let mut state = self.lock();
        state.sinks.push(sink);
        state.active = true;
    }

    fn finish(&self) {
        let flush = {
            let mut state = self.lock();
            state.recorders_stopped += 1;
            if !state.active {
                return;
            }
            state.active = false;
            state
                .flush_on_stop
                .clone()
                .and_then(|chunk| state.sinks.last().cloned().map(|sink| (sink, chunk)))
        };
        if let Some((sink, chunk)) = flush {
            sink.deliver(chunk);
        }
    }
}

/// Scriptable [`MediaDevices`] implementation
pub struct SyntheticDevices {
    denial: Option<String>,
    gate: Option<AcquireGate>,
    mime_type: String,
    feed: SyntheticFeed,
    requests: Arc<AtomicUsize>,
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self {
            denial: None,
            gate: None,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            feed: SyntheticFeed::default(),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every request fails as if the user declined access
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            denial: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Requests stay pending until the returned gate is opened
    pub fn gated() -> (Self, AcquireGate) {
        let gate = AcquireGate::new();
        let devices = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (devices, gate)
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn feed(&self) -> SyntheticFeed {
        self.feed.clone()
    }

    /// Number of `get_user_media` calls, granted or not
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, WebcamError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.pass().await;
        }

        if let Some(reason) = &self.denial {
            return Err(WebcamError::DeviceAccessDenied(reason.clone()));
        }
        if !constraints.video {
            return Err(WebcamError::DeviceAccessDenied(
                "synthetic backend only provides video streams".to_string(),
            ));
        }

        let stream = SyntheticStream {
            id: Uuid::new_v4().to_string(),
            audio: constraints.audio,
            stopped: self.feed.register_stream(),
            mime_type: self.mime_type.clone(),
            feed: self.feed.clone(),
        };
        log::debug!("Synthetic stream {} opened (audio: {})", stream.id, stream.audio);
        Ok(Box::new(stream))
    }
}

struct SyntheticStream {
    id: String,
    audio: bool,
    stopped: Arc<AtomicBool>,
    mime_type: String,
    feed: SyntheticFeed,
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_audio(&self) -> bool {
        self.audio
    }

    fn stop_tracks(&mut self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            log::debug!("Synthetic stream {} tracks stopped", self.id);
        }
    }

    fn create_recorder(&mut self) -> Result<Box<dyn MediaRecorder>, WebcamError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(WebcamError::Recorder(
                "stream tracks already stopped".to_string(),
            ));
        }
        Ok(Box::new(SyntheticRecorder {
            mime_type: self.mime_type.clone(),
            feed: self.feed.clone(),
            running: false,
        }))
    }
}

struct SyntheticRecorder {
    mime_type: String,
    feed: SyntheticFeed,
    running: bool,
}

impl MediaRecorder for SyntheticRecorder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn start(&mut self, sink: ChunkSink) -> Result<(), WebcamError> {
        if self.running {
            return Err(WebcamError::Recorder("recorder already running".to_string()));
        }
        self.running = true;
        self.feed.begin(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.feed.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_chunk_len() {
        assert_eq!(synthetic_chunk(0, 1).len(), 0);
        assert_eq!(synthetic_chunk(300, 7).len(), 300);
        assert_eq!(synthetic_chunk(3, 10).as_ref(), &[10, 11, 12]);
    }

    #[test]
    fn test_denying_devices() {
        let devices = SyntheticDevices::denying("no camera");
        let result = tokio_test::block_on(devices.get_user_media(MediaConstraints::video_only()));
        assert!(matches!(result, Err(WebcamError::DeviceAccessDenied(_))));
        assert_eq!(devices.requests(), 1);
        assert_eq!(devices.feed().streams_opened(), 0);
    }

    #[test]
    fn test_stream_stop_is_idempotent() {
        let devices = SyntheticDevices::new();
        let feed = devices.feed();
        let mut stream =
            tokio_test::block_on(devices.get_user_media(MediaConstraints::video_only())).unwrap();
        assert_eq!(feed.live_streams(), 1);

        stream.stop_tracks();
        stream.stop_tracks();
        assert_eq!(feed.live_streams(), 0);
        assert!(stream.create_recorder().is_err());
    }

    #[test]
    fn test_push_without_recorder() {
        let feed = SyntheticFeed::default();
        assert!(!feed.push(synthetic_chunk(4, 0)));
        assert!(!feed.is_recording());
    }
}
