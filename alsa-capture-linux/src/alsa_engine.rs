//! ALSA capture engine.
//!
//! Opens a PCM capture stream in blocking, interleaved read/write mode and
//! reads one period per call. Raw bytes are handed to the session untouched
//! in whatever sample format was negotiated.

use std::time::Duration;

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};
use log::Level;

use alsa_capture_core::models::config::{CaptureConfiguration, PeriodRequest};
use alsa_capture_core::models::error::{CaptureError, ReadFailure};
use alsa_capture_core::models::format::SampleFormat;
use alsa_capture_core::models::negotiated::NegotiatedParameters;
use alsa_capture_core::traits::capture_engine::CaptureEngine;

use crate::read_errors;

/// Capture engine backed by an ALSA PCM device.
pub struct AlsaCaptureEngine {
    pcm: Option<PCM>,
    level: Level,
}

impl AlsaCaptureEngine {
    pub fn new() -> Self {
        Self {
            pcm: None,
            level: Level::Debug,
        }
    }
}

impl Default for AlsaCaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// ALSA format constant for a sample format.
pub fn alsa_format(format: SampleFormat) -> Format {
    match format {
        SampleFormat::S8 => Format::S8,
        SampleFormat::U8 => Format::U8,
        SampleFormat::S16Le => Format::S16LE,
        SampleFormat::S16Be => Format::S16BE,
        SampleFormat::U16Le => Format::U16LE,
        SampleFormat::U16Be => Format::U16BE,
        SampleFormat::S24Le => Format::S24LE,
        SampleFormat::S24Be => Format::S24BE,
        SampleFormat::U24Le => Format::U24LE,
        SampleFormat::U24Be => Format::U24BE,
        SampleFormat::S32Le => Format::S32LE,
        SampleFormat::S32Be => Format::S32BE,
        SampleFormat::U32Le => Format::U32LE,
        SampleFormat::U32Be => Format::U32BE,
        SampleFormat::FloatLe => Format::FloatLE,
        SampleFormat::FloatBe => Format::FloatBE,
        SampleFormat::Float64Le => Format::Float64LE,
        SampleFormat::Float64Be => Format::Float64BE,
    }
}

fn hw_error(step: &'static str) -> impl Fn(alsa::Error) -> CaptureError {
    move |e| CaptureError::EngineOpen(format!("unable to set HW parameters ({}): {}", step, e))
}

impl CaptureEngine for AlsaCaptureEngine {
    /// Sequence:
    /// 1. Open the PCM for capture (blocking mode)
    /// 2. Interleaved access, format, channels
    /// 3. Rate, then period size or period time, all "nearest"
    /// 4. Commit and read back what the driver granted
    fn open(&mut self, config: &CaptureConfiguration) -> Result<NegotiatedParameters, CaptureError> {
        self.level = if config.debug { Level::Info } else { Level::Debug };

        let pcm = PCM::new(&config.device, Direction::Capture, false).map_err(|e| {
            CaptureError::EngineOpen(format!("unable to open PCM device {:?}: {}", config.device, e))
        })?;

        let params = {
            let hwp = HwParams::any(&pcm).map_err(hw_error("any"))?;
            hwp.set_access(Access::RWInterleaved).map_err(hw_error("access"))?;
            hwp.set_format(alsa_format(config.format)).map_err(hw_error("format"))?;
            hwp.set_channels(config.channels).map_err(hw_error("channels"))?;

            let rate = hwp
                .set_rate_near(config.rate, ValueOr::Nearest)
                .map_err(hw_error("rate"))?;
            log::log!(self.level, "rate near {}: {}", config.rate, rate);

            match config.period_request() {
                PeriodRequest::Frames(frames) => {
                    let frames = Frames::try_from(frames).map_err(|_| {
                        CaptureError::EngineOpen(format!("period size {} out of range", frames))
                    })?;
                    hwp.set_period_size_near(frames, ValueOr::Nearest)
                        .map_err(hw_error("period size"))?;
                }
                PeriodRequest::Time(time) => {
                    let micros = u32::try_from(time.as_micros()).map_err(|_| {
                        CaptureError::EngineOpen(format!("period time {:?} out of range", time))
                    })?;
                    log::log!(self.level, "set period time near: {}", micros);
                    hwp.set_period_time_near(micros, ValueOr::Nearest)
                        .map_err(hw_error("period time"))?;
                }
            }

            pcm.hw_params(&hwp).map_err(hw_error("commit"))?;

            let current = pcm.hw_params_current().map_err(hw_error("read back"))?;
            let rate = current.get_rate().map_err(hw_error("read back rate"))?;
            let period = current.get_period_size().map_err(hw_error("read back period"))?;
            let period = u64::try_from(period).map_err(|_| {
                CaptureError::EngineOpen(format!("driver reported invalid period size {}", period))
            })?;
            let period_time = current
                .get_period_time()
                .map_err(hw_error("read back period time"))?;
            NegotiatedParameters::new(rate, period)
                .with_period_time(Duration::from_micros(u64::from(period_time)))
        };

        log::log!(
            self.level,
            "opened {:?}: {} ch {} @ {} Hz, {} frames per period",
            config.device,
            config.channels,
            config.format,
            params.rate,
            params.period_size
        );

        self.pcm = Some(pcm);
        Ok(params)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, ReadFailure> {
        let pcm = self
            .pcm
            .as_ref()
            .ok_or_else(|| ReadFailure::Fatal("capture device is not open".into()))?;

        match pcm.io_bytes().readi(buffer) {
            Ok(frames) => Ok(frames),
            Err(e) => {
                let errno = e.errno();
                if read_errors::needs_prepare(errno) {
                    if let Err(prepare_err) = pcm.prepare() {
                        return Err(ReadFailure::Fatal(format!(
                            "unable to recover capture stream: {}",
                            prepare_err
                        )));
                    }
                }
                Err(read_errors::classify(errno, e.to_string()))
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let Some(pcm) = self.pcm.take() else {
            return Ok(());
        };
        let drained = pcm.drain();
        // Dropping the PCM closes the handle.
        drop(pcm);
        drained.map_err(|e| CaptureError::Unknown(format!("drain failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_sample_format() {
        assert_eq!(alsa_format(SampleFormat::S16Le), Format::S16LE);
        assert_eq!(alsa_format(SampleFormat::U8), Format::U8);
        assert_eq!(alsa_format(SampleFormat::S24Be), Format::S24BE);
        assert_eq!(alsa_format(SampleFormat::FloatLe), Format::FloatLE);
        assert_eq!(alsa_format(SampleFormat::Float64Be), Format::Float64BE);
    }

    #[test]
    fn read_before_open_is_fatal() {
        let mut engine = AlsaCaptureEngine::new();
        let mut buffer = [0u8; 128];
        assert!(matches!(engine.read(&mut buffer), Err(ReadFailure::Fatal(_))));
        assert!(engine.close().is_ok());
    }
}
