use std::time::Duration;

use serde::Serialize;

use super::config::{CaptureConfiguration, PeriodRequest, MAX_PERIOD_SIZE};

/// Parameters the device actually granted after opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NegotiatedParameters {
    pub rate: u32,
    pub period_size: u64,
    pub period_time: Duration,
}

impl NegotiatedParameters {
    /// Build from the granted rate and period size, deriving the period time.
    pub fn new(rate: u32, period_size: u64) -> Self {
        Self {
            rate,
            period_size,
            period_time: period_duration(period_size, rate),
        }
    }

    /// Use a period time reported by the device instead of the derived one.
    pub fn with_period_time(mut self, period_time: Duration) -> Self {
        self.period_time = period_time;
        self
    }

    /// Length in bytes of one period of interleaved samples.
    ///
    /// `None` when the granted period is larger than [`MAX_PERIOD_SIZE`] or
    /// the length does not fit in `usize`.
    pub fn buffer_len(&self, config: &CaptureConfiguration) -> Option<usize> {
        if self.period_size > MAX_PERIOD_SIZE {
            return None;
        }
        let frames = usize::try_from(self.period_size).ok()?;
        config.bytes_per_frame().checked_mul(frames)
    }

    /// Granted rate, when it differs from the requested one.
    pub fn rate_deviation(&self, config: &CaptureConfiguration) -> Option<u32> {
        (self.rate != config.rate).then_some(self.rate)
    }

    /// Granted period size, when a frame count was requested and not honored.
    ///
    /// A period requested by time has no frame count to deviate from.
    pub fn period_size_deviation(&self, config: &CaptureConfiguration) -> Option<u64> {
        match config.period_request() {
            PeriodRequest::Frames(requested) if requested != self.period_size => {
                Some(self.period_size)
            }
            _ => None,
        }
    }
}

/// Duration of `frames` frames at `rate` Hz, truncated to whole microseconds.
pub fn period_duration(frames: u64, rate: u32) -> Duration {
    if rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(frames.saturating_mul(1_000_000) / u64::from(rate))
}
