//! Frame admission control
//!
//! Frames arriving faster than the minimum interval, or while the previous
//! frame is still in the detector, are dropped. There is no queue.

use std::time::{Duration, Instant};
use tracing::trace;

/// Outcome of offering a frame to the throttle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Frame may be sent to the detector
    Admitted,
    /// Dropped: less than the minimum interval since the last admitted frame
    TooSoon,
    /// Dropped: a previous frame is still being processed
    Busy,
}

/// Minimum-interval, single-in-flight frame throttle
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    min_interval: Duration,
    last_admitted: Option<Instant>,
    in_flight: bool,
    admitted: u64,
    dropped: u64,
}

impl FrameThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: None,
            in_flight: false,
            admitted: 0,
            dropped: 0,
        }
    }

    /// Offer a frame captured at `now`
    pub fn offer(&mut self, now: Instant) -> Admission {
        if let Some(last) = self.last_admitted {
            if now.saturating_duration_since(last) < self.min_interval {
                self.dropped += 1;
                trace!("Frame dropped: inside throttle window");
                return Admission::TooSoon;
            }
        }

        if self.in_flight {
            self.dropped += 1;
            trace!("Frame dropped: detector busy");
            return Admission::Busy;
        }

        self.in_flight = true;
        self.last_admitted = Some(now);
        self.admitted += 1;
        Admission::Admitted
    }

    /// Mark the in-flight frame as finished (results delivered or send failed)
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Frames admitted so far
    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    /// Frames dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Forget timing and in-flight state (camera restarted)
    pub fn reset(&mut self) {
        self.last_admitted = None;
        self.in_flight = false;
    }
}
