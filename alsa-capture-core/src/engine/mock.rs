//! Scripted capture engine for tests and demos without hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::config::{CaptureConfiguration, PeriodRequest};
use crate::models::error::{CaptureError, ReadFailure};
use crate::models::negotiated::NegotiatedParameters;
use crate::traits::capture_engine::CaptureEngine;

/// One scripted read outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    /// Full period, every byte set to the given value.
    Full(u8),
    /// `frames` frames filled with the given byte value.
    Short(usize, u8),
    Overrun,
    Transient(String),
    Fatal(String),
}

/// Engine that plays back a script of read outcomes.
///
/// Once the script is exhausted it keeps producing silent full periods,
/// sleeping `pace` before each one, until the session stops it.
pub struct MockEngine {
    grant: Option<(u32, u64)>,
    open_error: Option<String>,
    open_delay: Duration,
    reads: VecDeque<MockRead>,
    pace: Duration,
    frame_bytes: usize,
    period_frames: usize,
    released: Arc<AtomicBool>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            grant: None,
            open_error: None,
            open_delay: Duration::ZERO,
            reads: VecDeque::new(),
            pace: Duration::from_millis(1),
            frame_bytes: 0,
            period_frames: 0,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Grant this rate and period size regardless of the request.
    pub fn grant(mut self, rate: u32, period_size: u64) -> Self {
        self.grant = Some((rate, period_size));
        self
    }

    pub fn fail_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Block in `open()` for `delay` before negotiating.
    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn with_reads(mut self, reads: impl IntoIterator<Item = MockRead>) -> Self {
        self.reads.extend(reads);
        self
    }

    pub fn pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Flag set once `close()` has released the device.
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    fn fill(&self, buffer: &mut [u8], frames: usize, value: u8) -> usize {
        let frames = frames.min(self.period_frames);
        buffer[..frames * self.frame_bytes].fill(value);
        frames
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureEngine for MockEngine {
    fn open(&mut self, config: &CaptureConfiguration) -> Result<NegotiatedParameters, CaptureError> {
        if !self.open_delay.is_zero() {
            thread::sleep(self.open_delay);
        }
        if let Some(message) = &self.open_error {
            return Err(CaptureError::EngineOpen(message.clone()));
        }

        let (rate, period_size) = self.grant.unwrap_or_else(|| {
            let frames = match config.period_request() {
                PeriodRequest::Frames(frames) => frames,
                PeriodRequest::Time(time) => {
                    (time.as_micros() as u64 * u64::from(config.rate) / 1_000_000).max(1)
                }
            };
            (config.rate, frames)
        });

        self.frame_bytes = config.bytes_per_frame();
        self.period_frames = period_size as usize;
        Ok(NegotiatedParameters::new(rate, period_size))
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, ReadFailure> {
        match self.reads.pop_front() {
            Some(MockRead::Full(value)) => Ok(self.fill(buffer, self.period_frames, value)),
            Some(MockRead::Short(frames, value)) => Ok(self.fill(buffer, frames, value)),
            Some(MockRead::Overrun) => Err(ReadFailure::Overrun),
            Some(MockRead::Transient(message)) => Err(ReadFailure::Transient(message)),
            Some(MockRead::Fatal(message)) => Err(ReadFailure::Fatal(message)),
            None => {
                thread::sleep(self.pace);
                Ok(self.fill(buffer, self.period_frames, 0))
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}
