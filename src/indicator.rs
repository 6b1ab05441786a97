//! Blinking "REC" overlay
//!
//! The dot blinks on a fixed period while the recording flag is set. The timer
//! is a tokio task and exists only while recording.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const DEFAULT_BLINK_PERIOD: Duration = Duration::from_millis(600);

pub const INDICATOR_LABEL: &str = "REC";

#[derive(Debug, Default)]
struct BlinkState {
    recording: bool,
    flashing: bool,
    toggles: u64,
}

/// What the overlay should draw right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorFrame {
    pub label: &'static str,
    pub dot_visible: bool,
}

pub struct RecordingIndicator {
    period: Duration,
    state: Arc<Mutex<BlinkState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_BLINK_PERIOD)
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            state: Arc::new(Mutex::new(BlinkState::default())),
            timer: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, BlinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drive the overlay from the recording flag.
    ///
    /// Turning it on outside a tokio runtime shows a steady dot.
    pub fn set_recording(&self, recording: bool) {
        let mut timer = self.timer();

        if !recording {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
            let mut state = self.state();
            state.recording = false;
            state.flashing = false;
            return;
        }

        {
            let mut state = self.state();
            if state.recording && timer.is_some() {
                return;
            }
            state.recording = true;
            state.flashing = false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                log::debug!("No tokio runtime; recording indicator will not blink");
                return;
            }
        };

        let state = self.state.clone();
        let period = self.period;
        *timer = Some(runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.flashing = !state.flashing;
                state.toggles += 1;
            }
        }));
    }

    pub fn is_recording(&self) -> bool {
        self.state().recording
    }

    /// The dot is shown while recording, except during the "off" half of a blink
    pub fn is_visible(&self) -> bool {
        let state = self.state();
        state.recording && !state.flashing
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of blink toggles since creation
    pub fn toggle_count(&self) -> u64 {
        self.state().toggles
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn label(&self) -> &'static str {
        INDICATOR_LABEL
    }

    /// `None` when not recording: the overlay is not rendered at all
    pub fn frame(&self) -> Option<IndicatorFrame> {
        let state = self.state();
        state.recording.then(|| IndicatorFrame {
            label: INDICATOR_LABEL,
            dot_visible: !state.flashing,
        })
    }
}

impl Default for RecordingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordingIndicator {
    fn drop(&mut self) {
        if let Some(handle) = self.timer().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_indicator_hidden() {
        let indicator = RecordingIndicator::new();
        assert!(!indicator.is_visible());
        assert!(!indicator.is_timer_active());
        assert!(indicator.frame().is_none());
        assert_eq!(indicator.period(), DEFAULT_BLINK_PERIOD);
    }

    #[test]
    fn test_no_runtime_steady_dot() {
        let indicator = RecordingIndicator::new();
        indicator.set_recording(true);
        assert!(indicator.is_visible());
        assert!(!indicator.is_timer_active());

        indicator.set_recording(false);
        assert!(!indicator.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blinks_while_recording() {
        let indicator = RecordingIndicator::with_period(Duration::from_millis(100));
        indicator.set_recording(true);
        assert!(indicator.is_visible());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!indicator.is_visible());
        assert_eq!(
            indicator.frame(),
            Some(IndicatorFrame {
                label: "REC",
                dot_visible: false
            })
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(indicator.is_visible());
        assert_eq!(indicator.toggle_count(), 2);
    }
}
