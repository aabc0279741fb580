use thiserror::Error;

/// Errors that can occur while configuring or running a capture session.
///
/// Only `Configuration` and `Unknown` are ever returned from
/// [`CaptureSession::open`](crate::CaptureSession::open). Everything that
/// happens after the session exists is reported as an event instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("invalid configuration: {field} {reason}")]
    Configuration { field: &'static str, reason: String },

    #[error("unable to open capture device: {0}")]
    EngineOpen(String),

    /// A single read failed. Reported as a `readError` event.
    #[error("read failed: {0}")]
    Read(String),

    /// The device failed for good. Reported as an `error` event.
    #[error("fatal device error: {0}")]
    Fatal(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }

    /// The offending configuration field, if this is a configuration error.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Configuration { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Outcome of a single failed period read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// The capture buffer overflowed and data was lost. The engine has
    /// already re-prepared the device.
    #[error("overrun occurred")]
    Overrun,

    /// A single read failed; the next read may succeed.
    #[error("{0}")]
    Transient(String),

    /// The device can no longer be read from.
    #[error("{0}")]
    Fatal(String),
}
