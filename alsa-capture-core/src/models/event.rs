use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One period of captured interleaved samples.
///
/// The bytes are owned by the buffer and cannot be mutated once captured.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    data: Vec<u8>,
}

impl AudioBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for AudioBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Event delivered to the consumer of a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// One period of captured samples.
    Audio(AudioBuffer),
    /// The device granted a different sample rate than requested.
    RateDeviating(u32),
    /// The device granted a different period size than requested.
    PeriodSizeDeviating(u64),
    /// Realized period duration.
    PeriodTime(Duration),
    /// The capture buffer overflowed and data was lost.
    Overrun,
    /// A read returned fewer frames than the period size.
    ShortRead(u64),
    /// A single read failed; streaming continues.
    ReadError(String),
    /// Fatal condition; the session is shutting down.
    Error(String),
    /// Terminal. The device has been released.
    Close,
}

impl CaptureEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Audio(_) => EventKind::Audio,
            Self::RateDeviating(_) => EventKind::RateDeviating,
            Self::PeriodSizeDeviating(_) => EventKind::PeriodSizeDeviating,
            Self::PeriodTime(_) => EventKind::PeriodTime,
            Self::Overrun => EventKind::Overrun,
            Self::ShortRead(_) => EventKind::ShortRead,
            Self::ReadError(_) => EventKind::ReadError,
            Self::Error(_) => EventKind::Error,
            Self::Close => EventKind::Close,
        }
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close)
    }
}

/// Discriminant of [`CaptureEvent`], used for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Audio,
    RateDeviating,
    PeriodSizeDeviating,
    PeriodTime,
    Overrun,
    ShortRead,
    ReadError,
    Error,
    Close,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        Self::Audio,
        Self::RateDeviating,
        Self::PeriodSizeDeviating,
        Self::PeriodTime,
        Self::Overrun,
        Self::ShortRead,
        Self::ReadError,
        Self::Error,
        Self::Close,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::RateDeviating => "rateDeviating",
            Self::PeriodSizeDeviating => "periodSizeDeviating",
            Self::PeriodTime => "periodTime",
            Self::Overrun => "overrun",
            Self::ShortRead => "shortRead",
            Self::ReadError => "readError",
            Self::Error => "error",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name matches no event kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event name: {0}")]
pub struct UnknownEventName(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownEventName(s.to_string()))
    }
}
