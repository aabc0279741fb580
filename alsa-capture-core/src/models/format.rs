use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Interleaved PCM sample encoding.
///
/// Restricted to the linear integer and IEEE float encodings. Names follow
/// the ALSA spelling (`S16_LE`, `FLOAT_LE`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SampleFormat {
    S8,
    U8,
    #[default]
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S24Le,
    S24Be,
    U24Le,
    U24Be,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    FloatLe,
    FloatBe,
    Float64Le,
    Float64Be,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 18] = [
        Self::S8,
        Self::U8,
        Self::S16Le,
        Self::S16Be,
        Self::U16Le,
        Self::U16Be,
        Self::S24Le,
        Self::S24Be,
        Self::U24Le,
        Self::U24Be,
        Self::S32Le,
        Self::S32Be,
        Self::U32Le,
        Self::U32Be,
        Self::FloatLe,
        Self::FloatBe,
        Self::Float64Le,
        Self::Float64Be,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::S8 => "S8",
            Self::U8 => "U8",
            Self::S16Le => "S16_LE",
            Self::S16Be => "S16_BE",
            Self::U16Le => "U16_LE",
            Self::U16Be => "U16_BE",
            Self::S24Le => "S24_LE",
            Self::S24Be => "S24_BE",
            Self::U24Le => "U24_LE",
            Self::U24Be => "U24_BE",
            Self::S32Le => "S32_LE",
            Self::S32Be => "S32_BE",
            Self::U32Le => "U32_LE",
            Self::U32Be => "U32_BE",
            Self::FloatLe => "FLOAT_LE",
            Self::FloatBe => "FLOAT_BE",
            Self::Float64Le => "FLOAT64_LE",
            Self::Float64Be => "FLOAT64_BE",
        }
    }

    /// Bytes one sample occupies in the interleaved buffer.
    ///
    /// 24-bit formats are stored in 32-bit containers.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S8 | Self::U8 => 1,
            Self::S16Le | Self::S16Be | Self::U16Le | Self::U16Be => 2,
            Self::S24Le
            | Self::S24Be
            | Self::U24Le
            | Self::U24Be
            | Self::S32Le
            | Self::S32Be
            | Self::U32Le
            | Self::U32Be
            | Self::FloatLe
            | Self::FloatBe => 4,
            Self::Float64Le | Self::Float64Be => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            Self::FloatLe | Self::FloatBe | Self::Float64Le | Self::Float64Be
        )
    }

    /// Space separated list of every supported name.
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| {
                CaptureError::config(
                    "format",
                    format!("{s:?} not supported; supported: {}", Self::supported_names()),
                )
            })
    }
}

impl TryFrom<String> for SampleFormat {
    type Error = CaptureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SampleFormat> for String {
    fn from(value: SampleFormat) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for format in SampleFormat::ALL {
            assert_eq!(format.name().parse::<SampleFormat>().unwrap(), format);
        }
    }

    #[test]
    fn physical_widths() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16Le.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::S24Le.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::FloatLe.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::Float64Be.bytes_per_sample(), 8);
    }

    #[test]
    fn unknown_format_lists_supported() {
        let err = "MU_LAW".parse::<SampleFormat>().unwrap_err();
        assert_eq!(err.field(), Some("format"));
        let message = err.to_string();
        assert!(message.contains("MU_LAW"));
        assert!(message.contains("S16_LE"));
        assert!(message.contains("FLOAT64_BE"));
    }

    #[test]
    fn default_is_s16_le() {
        assert_eq!(SampleFormat::default(), SampleFormat::S16Le);
        assert!(!SampleFormat::default().is_float());
    }

    #[test]
    fn serde_uses_alsa_names() {
        let json = serde_json::to_string(&SampleFormat::FloatLe).unwrap();
        assert_eq!(json, "\"FLOAT_LE\"");
        let parsed: SampleFormat = serde_json::from_str("\"S32_BE\"").unwrap();
        assert_eq!(parsed, SampleFormat::S32Be);
        assert!(serde_json::from_str::<SampleFormat>("\"A_LAW\"").is_err());
    }
}
