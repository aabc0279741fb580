//! Engine → session message feed.
//!
//! The engine thread pushes [`EngineMessage`]s into a single channel; the
//! session's dispatch thread is the only reader. The channel exists before
//! the engine thread starts, so nothing the engine sends can be missed.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use crate::models::event::EventKind;
use crate::models::negotiated::NegotiatedParameters;

/// Scalar payload of a status notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    Integer(u64),
    Duration(Duration),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Duration(d) => write!(f, "{}us", d.as_micros()),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A tagged notification carrying a scalar value, a binary payload, or neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub tag: Cow<'static, str>,
    pub scalar: Option<ScalarValue>,
    pub binary: Option<Vec<u8>>,
}

impl Notification {
    pub fn binary(kind: EventKind, data: Vec<u8>) -> Self {
        Self {
            tag: Cow::Borrowed(kind.as_str()),
            scalar: None,
            binary: Some(data),
        }
    }

    pub fn scalar(kind: EventKind, value: ScalarValue) -> Self {
        Self {
            tag: Cow::Borrowed(kind.as_str()),
            scalar: Some(value),
            binary: None,
        }
    }

    pub fn bare(kind: EventKind) -> Self {
        Self {
            tag: Cow::Borrowed(kind.as_str()),
            scalar: None,
            binary: None,
        }
    }
}

/// Everything the engine side can tell the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    /// The device is open and parameters are negotiated.
    Opened(NegotiatedParameters),
    /// Status value or audio period.
    Notification(Notification),
    /// Fatal condition. The engine is shutting down.
    Error(String),
    /// The device handle has been released. Always the last message.
    Closed,
}

/// Stop request shared by the session and the engine thread.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns `true` only for the call that raised it.
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sending half held by the engine thread.
pub struct EngineFeed {
    tx: Sender<EngineMessage>,
    stop: StopSignal,
}

impl EngineFeed {
    pub fn new(tx: Sender<EngineMessage>, stop: StopSignal) -> Self {
        Self { tx, stop }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_raised()
    }

    pub fn opened(&self, params: NegotiatedParameters) {
        self.send(EngineMessage::Opened(params));
    }

    pub fn notify(&self, notification: Notification) {
        self.send(EngineMessage::Notification(notification));
    }

    pub fn audio(&self, data: Vec<u8>) {
        self.notify(Notification::binary(EventKind::Audio, data));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(EngineMessage::Error(message.into()));
    }

    /// Confirm the device is released. Consumes the feed so nothing can follow.
    pub fn closed(self) {
        self.send(EngineMessage::Closed);
    }

    fn send(&self, message: EngineMessage) {
        if self.tx.send(message).is_err() {
            log::trace!("session dispatcher gone, dropping engine message");
        }
    }
}
