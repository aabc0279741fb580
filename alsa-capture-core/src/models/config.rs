use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::format::SampleFormat;

/// Period request used when neither `period_size` nor `period_time` is set.
pub const DEFAULT_PERIOD_SIZE: u64 = 32;

/// Accepted sample rate range in Hz.
pub const MIN_RATE: u32 = 4000;
pub const MAX_RATE: u32 = 196_000;

/// Largest accepted channel count.
pub const MAX_CHANNELS: u32 = 256;

/// Largest accepted period, in frames.
pub const MAX_PERIOD_SIZE: u64 = 1 << 20;

/// Largest accepted period time. ALSA takes period times as 32-bit microseconds.
pub const MAX_PERIOD_TIME: Duration = Duration::from_micros(u32::MAX as u64);

/// Requested parameters for a capture session.
///
/// Field names on the wire match the option names: `channels`, `format`,
/// `device`, `rate`, `periodSize`, `periodTime` (microseconds) and `debug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CaptureConfiguration {
    /// Number of interleaved channels (default: 2).
    pub channels: u32,

    /// Sample encoding (default: `S16_LE`).
    pub format: SampleFormat,

    /// ALSA device name (default: `"default"`).
    pub device: String,

    /// Requested sample rate in Hz (default: 44100).
    pub rate: u32,

    /// Requested frames per period. Mutually exclusive with `period_time`.
    pub period_size: Option<u64>,

    /// Requested period length. Mutually exclusive with `period_size`.
    #[serde(with = "micros")]
    pub period_time: Option<Duration>,

    /// Raise diagnostics to `info` level. Does not change delivered data.
    pub debug: bool,
}

/// What drives period negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRequest {
    Frames(u64),
    Time(Duration),
}

impl CaptureConfiguration {
    /// Parse a JSON options object and validate it.
    ///
    /// `format` is read as plain text and parsed afterwards so an unknown
    /// encoding is reported against the `format` field.
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let options: Options = serde_json::from_str(json)
            .map_err(|e| CaptureError::config("options", e.to_string()))?;
        let config = Self {
            channels: options.channels,
            format: options.format.parse()?,
            device: options.device,
            rate: options.rate,
            period_size: options.period_size,
            period_time: options.period_time,
            debug: options.debug,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.channels == 0 {
            return Err(CaptureError::config("channels", "must be a positive number"));
        }
        if self.channels > MAX_CHANNELS {
            return Err(CaptureError::config(
                "channels",
                format!("must be at most {MAX_CHANNELS}, got {}", self.channels),
            ));
        }
        if !(MIN_RATE..=MAX_RATE).contains(&self.rate) {
            return Err(CaptureError::config(
                "rate",
                format!("must be between {MIN_RATE} and {MAX_RATE}, got {}", self.rate),
            ));
        }
        match self.period_size {
            Some(0) => {
                return Err(CaptureError::config("periodSize", "must be a positive number"));
            }
            Some(frames) if frames > MAX_PERIOD_SIZE => {
                return Err(CaptureError::config(
                    "periodSize",
                    format!("must be at most {MAX_PERIOD_SIZE} frames, got {frames}"),
                ));
            }
            _ => {}
        }
        match self.period_time {
            Some(Duration::ZERO) => {
                return Err(CaptureError::config("periodTime", "must be a positive duration"));
            }
            Some(time) if time > MAX_PERIOD_TIME => {
                return Err(CaptureError::config(
                    "periodTime",
                    format!("must be at most {} us, got {}", u32::MAX, time.as_micros()),
                ));
            }
            _ => {}
        }
        if self.period_size.is_some() && self.period_time.is_some() {
            return Err(CaptureError::config(
                "periodTime",
                "cannot be combined with periodSize",
            ));
        }
        if self.device.trim().is_empty() {
            return Err(CaptureError::config("device", "must not be empty"));
        }
        Ok(())
    }

    pub fn period_request(&self) -> PeriodRequest {
        match (self.period_size, self.period_time) {
            (_, Some(time)) => PeriodRequest::Time(time),
            (Some(frames), None) => PeriodRequest::Frames(frames),
            (None, None) => PeriodRequest::Frames(DEFAULT_PERIOD_SIZE),
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.format.bytes_per_sample()
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            channels: 2,
            format: SampleFormat::S16Le,
            device: "default".into(),
            rate: 44100,
            period_size: None,
            period_time: None,
            debug: false,
        }
    }
}

/// Wire form of the options object, with `format` left unparsed.
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct Options {
    channels: u32,
    format: String,
    device: String,
    rate: u32,
    period_size: Option<u64>,
    #[serde(deserialize_with = "micros::deserialize")]
    period_time: Option<Duration>,
    debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        let defaults = CaptureConfiguration::default();
        Self {
            channels: defaults.channels,
            format: defaults.format.to_string(),
            device: defaults.device,
            rate: defaults.rate,
            period_size: defaults.period_size,
            period_time: defaults.period_time,
            debug: defaults.debug,
        }
    }
}

mod micros {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_micros() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_micros))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(config: &CaptureConfiguration) -> Option<&'static str> {
        config.validate().err().and_then(|e| e.field())
    }

    #[test]
    fn defaults_are_valid() {
        let config = CaptureConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.period_request(), PeriodRequest::Frames(DEFAULT_PERIOD_SIZE));
        assert_eq!(config.bytes_per_frame(), 4);
    }

    #[test]
    fn rejects_non_positive_fields() {
        let zero_channels = CaptureConfiguration {
            channels: 0,
            ..Default::default()
        };
        assert_eq!(field_of(&zero_channels), Some("channels"));

        let zero_period = CaptureConfiguration {
            period_size: Some(0),
            ..Default::default()
        };
        assert_eq!(field_of(&zero_period), Some("periodSize"));

        let zero_time = CaptureConfiguration {
            period_time: Some(Duration::ZERO),
            ..Default::default()
        };
        assert_eq!(field_of(&zero_time), Some("periodTime"));
    }

    #[test]
    fn rejects_rate_out_of_range() {
        for rate in [0, 3999, 196_001] {
            let config = CaptureConfiguration {
                rate,
                ..Default::default()
            };
            assert_eq!(field_of(&config), Some("rate"), "rate {rate}");
        }
        let edge = CaptureConfiguration {
            rate: MAX_RATE,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn rejects_both_period_options() {
        let config = CaptureConfiguration {
            period_size: Some(64),
            period_time: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("periodTime"));
        assert!(err.to_string().contains("periodSize"));
    }

    #[test]
    fn rejects_empty_device() {
        let config = CaptureConfiguration {
            device: "  ".into(),
            ..Default::default()
        };
        assert_eq!(field_of(&config), Some("device"));
    }

    #[test]
    fn period_time_drives_request() {
        let config = CaptureConfiguration {
            period_time: Some(Duration::from_micros(725)),
            ..Default::default()
        };
        assert_eq!(
            config.period_request(),
            PeriodRequest::Time(Duration::from_micros(725))
        );
    }

    #[test]
    fn from_json_uses_option_names() {
        let config = CaptureConfiguration::from_json(
            r#"{"channels":1,"format":"S32_LE","device":"hw:1,0","rate":48000,"periodTime":5000,"debug":true}"#,
        )
        .unwrap();
        assert_eq!(config.channels, 1);
        assert_eq!(config.format, SampleFormat::S32Le);
        assert_eq!(config.device, "hw:1,0");
        assert_eq!(config.rate, 48000);
        assert_eq!(config.period_time, Some(Duration::from_millis(5)));
        assert_eq!(config.period_size, None);
        assert!(config.debug);
    }

    #[test]
    fn from_json_fills_defaults_and_validates() {
        let config = CaptureConfiguration::from_json(r#"{"periodSize":128}"#).unwrap();
        assert_eq!(config.rate, 44100);
        assert_eq!(config.period_request(), PeriodRequest::Frames(128));

        let err = CaptureConfiguration::from_json(r#"{"rate":1000}"#).unwrap_err();
        assert_eq!(err.field(), Some("rate"));

        let err = CaptureConfiguration::from_json(r#"{"volume":3}"#).unwrap_err();
        assert_eq!(err.field(), Some("options"));
    }

    #[test]
    fn from_json_reports_unknown_format_on_format_field() {
        let err = CaptureConfiguration::from_json(r#"{"format":"MU_LAW"}"#).unwrap_err();
        assert_eq!(err.field(), Some("format"));
        let message = err.to_string();
        assert!(message.starts_with("invalid configuration: format "));
        assert_eq!(message.matches("invalid configuration").count(), 1);
        assert!(message.contains("S16_LE"));
    }

    #[test]
    fn rejects_oversized_requests() {
        let huge_period = CaptureConfiguration {
            period_size: Some(1 << 62),
            ..Default::default()
        };
        assert_eq!(field_of(&huge_period), Some("periodSize"));

        let largest = CaptureConfiguration {
            period_size: Some(MAX_PERIOD_SIZE),
            ..Default::default()
        };
        assert!(largest.validate().is_ok());

        let long_time = CaptureConfiguration {
            period_time: Some(Duration::from_secs(5000)),
            ..Default::default()
        };
        assert_eq!(field_of(&long_time), Some("periodTime"));

        let many_channels = CaptureConfiguration {
            channels: MAX_CHANNELS + 1,
            ..Default::default()
        };
        assert_eq!(field_of(&many_channels), Some("channels"));
    }
}
