//! Frame pacing
//!
//! Caps update cadence to the selected [`TargetRate`] by sleeping out the rest
//! of a frame that finished early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::TargetRate;

/// Blocking wait used by the pacer
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Target and measured frame time of the current frame, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingState {
    pub target_frame_time: f32,
    pub measured_delta: f32,
}

impl PacingState {
    pub fn new(rate: TargetRate, measured_delta: f32) -> Self {
        Self {
            target_frame_time: rate.frame_time(),
            measured_delta,
        }
    }

    /// Time left until the target frame time, truncated to whole milliseconds.
    /// `None` when the frame already took at least the target.
    pub fn remaining(&self) -> Option<Duration> {
        if self.measured_delta < self.target_frame_time {
            let millis = ((self.target_frame_time - self.measured_delta) * 1000.0) as u64;
            Some(Duration::from_millis(millis))
        } else {
            None
        }
    }
}

/// Throttles frames to a target rate
#[derive(Debug, Default)]
pub struct FramePacer<S: Sleeper = ThreadSleeper> {
    sleeper: S,
    shutdown: Option<Arc<AtomicBool>>,
}

impl FramePacer<ThreadSleeper> {
    pub fn new() -> Self {
        Self::with_sleeper(ThreadSleeper)
    }
}

impl<S: Sleeper> FramePacer<S> {
    pub fn with_sleeper(sleeper: S) -> Self {
        Self {
            sleeper,
            shutdown: None,
        }
    }

    /// Skip pacing sleeps once `flag` is set
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    fn shutting_down(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Pace one frame and return the delta the rest of the frame should see.
    ///
    /// A frame shorter than the target sleeps out the difference and reports
    /// exactly the target frame time. A longer frame reports its own delta.
    pub fn pace(&mut self, rate: TargetRate, delta: f32) -> f32 {
        let state = PacingState::new(rate, delta);
        let Some(remaining) = state.remaining() else {
            return delta;
        };

        if self.shutting_down() {
            log::warn!("Shutdown requested, skipping {remaining:?} pacing sleep");
            return delta;
        }

        log::trace!(
            "Pacing to {} fps: sleeping {remaining:?} after {delta:.4}s frame",
            rate.fps()
        );
        self.sleeper.sleep(remaining);
        state.target_frame_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Default)]
    struct RecordingSleeper {
        sleeps: Vec<Duration>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.sleeps.push(duration);
        }
    }

    #[rstest]
    #[case::fps20(TargetRate::Fps20, 0.0105, 39)]
    #[case::fps30(TargetRate::Fps30, 0.010, 23)]
    #[case::fps60(TargetRate::Fps60, 0.0, 16)]
    fn test_short_frame_sleeps_and_reports_target(
        #[case] rate: TargetRate,
        #[case] delta: f32,
        #[case] sleep_ms: u64,
    ) {
        let mut pacer = FramePacer::with_sleeper(RecordingSleeper::default());
        let reported = pacer.pace(rate, delta);

        assert_eq!(reported, rate.frame_time());
        assert_eq!(pacer.sleeper().sleeps, vec![Duration::from_millis(sleep_ms)]);
    }

    #[rstest]
    #[case::exact(TargetRate::Fps20, 0.05)]
    #[case::slow(TargetRate::Fps60, 0.1)]
    fn test_long_frame_reports_own_delta(#[case] rate: TargetRate, #[case] delta: f32) {
        let mut pacer = FramePacer::with_sleeper(RecordingSleeper::default());
        assert_eq!(pacer.pace(rate, delta), delta);
        assert!(pacer.sleeper().sleeps.is_empty());
    }

    #[test]
    fn test_shutdown_skips_sleep() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut pacer =
            FramePacer::with_sleeper(RecordingSleeper::default()).with_shutdown(flag.clone());

        pacer.pace(TargetRate::Fps20, 0.01);
        flag.store(true, Ordering::Release);
        let reported = pacer.pace(TargetRate::Fps20, 0.01);

        assert_eq!(reported, 0.01);
        assert_eq!(pacer.sleeper().sleeps.len(), 1);
    }

    #[test]
    fn test_remaining_truncates_to_millis() {
        let state = PacingState {
            target_frame_time: 0.05,
            measured_delta: 0.0105,
        };
        assert_eq!(state.remaining(), Some(Duration::from_millis(39)));
    }
}
