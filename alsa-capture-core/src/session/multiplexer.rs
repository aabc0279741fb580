//! Translation of engine notifications into consumer events.
//!
//! A notification carries a tag plus either a binary payload or a scalar.
//! If a binary payload is present it is forwarded verbatim and any scalar is
//! ignored; otherwise the scalar is forwarded. Notifications whose tag is
//! unknown, or whose payload does not fit the tag, are dropped with a warning.

use std::time::Duration;

use crate::engine::feed::{Notification, ScalarValue};
use crate::models::event::{AudioBuffer, CaptureEvent, EventKind};

/// Payload actually selected from a notification.
enum Payload {
    Binary(Vec<u8>),
    Scalar(ScalarValue),
    None,
}

pub fn demultiplex(notification: Notification) -> Option<CaptureEvent> {
    let kind = match notification.tag.parse::<EventKind>() {
        Ok(kind) => kind,
        Err(e) => {
            log::warn!("dropping notification: {}", e);
            return None;
        }
    };

    let payload = match (notification.binary, notification.scalar) {
        (Some(binary), _) => Payload::Binary(binary),
        (None, Some(scalar)) => Payload::Scalar(scalar),
        (None, None) => Payload::None,
    };

    let event = match (kind, payload) {
        (EventKind::Audio, Payload::Binary(data)) => CaptureEvent::Audio(AudioBuffer::new(data)),
        (EventKind::RateDeviating, Payload::Scalar(ScalarValue::Integer(rate))) => {
            CaptureEvent::RateDeviating(u32::try_from(rate).ok()?)
        }
        (EventKind::PeriodSizeDeviating, Payload::Scalar(ScalarValue::Integer(frames))) => {
            CaptureEvent::PeriodSizeDeviating(frames)
        }
        (EventKind::PeriodTime, Payload::Scalar(ScalarValue::Duration(time))) => {
            CaptureEvent::PeriodTime(time)
        }
        (EventKind::PeriodTime, Payload::Scalar(ScalarValue::Integer(micros))) => {
            CaptureEvent::PeriodTime(Duration::from_micros(micros))
        }
        (EventKind::Overrun, Payload::Scalar(_) | Payload::None) => CaptureEvent::Overrun,
        (EventKind::ShortRead, Payload::Scalar(ScalarValue::Integer(frames))) => {
            CaptureEvent::ShortRead(frames)
        }
        (EventKind::ReadError, Payload::Scalar(value)) => CaptureEvent::ReadError(value.to_string()),
        (EventKind::Error, Payload::Scalar(value)) => CaptureEvent::Error(value.to_string()),
        (EventKind::Close, _) => {
            log::warn!("dropping close notification; close is confirmed only by the engine shutdown");
            return None;
        }
        (kind, _) => {
            log::warn!("dropping {} notification with mismatched payload", kind);
            return None;
        }
    };

    Some(event)
}
