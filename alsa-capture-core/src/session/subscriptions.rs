use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::models::event::{CaptureEvent, EventKind};
use crate::traits::capture_delegate::CaptureDelegate;

type Handler = Box<dyn FnMut(&CaptureEvent) + Send + 'static>;

/// Handlers registered per event kind.
///
/// ```
/// use alsa_capture_core::{CaptureEvent, EventKind, Subscriptions};
///
/// let subscriptions = Subscriptions::new()
///     .on(EventKind::Audio, |event| {
///         if let CaptureEvent::Audio(buffer) = event {
///             println!("{} bytes", buffer.len());
///         }
///     })
///     .on_named("rateDeviating", |event| println!("{:?}", event))
///     .on_named("volume", |_| unreachable!());
/// assert_eq!(subscriptions.handler_count(), 2);
/// ```
#[derive(Default)]
pub struct Subscriptions {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: FnMut(&CaptureEvent) + Send + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
        self
    }

    /// Subscribe by event name. An unrecognized name registers nothing.
    pub fn on_named<F>(self, name: &str, handler: F) -> Self
    where
        F: FnMut(&CaptureEvent) + Send + 'static,
    {
        match name.parse::<EventKind>() {
            Ok(kind) => self.on(kind, handler),
            Err(e) => {
                log::debug!("subscription never fires: {}", e);
                self
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn emit(&mut self, event: &CaptureEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }
}

impl CaptureDelegate for Subscriptions {
    fn on_event(&mut self, event: CaptureEvent) {
        self.emit(&event);
    }
}

/// Receiving end of a session opened with
/// [`CaptureSession::open_with_channel`](crate::CaptureSession::open_with_channel).
///
/// Yields events in dispatch order and ends after `CaptureEvent::Close`.
pub struct CaptureEvents {
    rx: Receiver<CaptureEvent>,
}

impl CaptureEvents {
    pub(crate) fn new(rx: Receiver<CaptureEvent>) -> Self {
        Self { rx }
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `None` on timeout or once the session has closed.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CaptureEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking poll.
    pub fn try_recv(&self) -> Option<CaptureEvent> {
        self.rx.try_recv().ok()
    }

    /// Feed every remaining event to `subscriptions`, returning after close.
    pub fn dispatch(self, mut subscriptions: Subscriptions) {
        for event in self {
            subscriptions.emit(&event);
        }
    }
}

impl Iterator for CaptureEvents {
    type Item = CaptureEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::models::event::AudioBuffer;

    #[test]
    fn routes_by_kind() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let audio_seen = Arc::clone(&seen);
        let rate_seen = Arc::clone(&seen);

        let mut subscriptions = Subscriptions::new()
            .on(EventKind::Audio, move |e| {
                audio_seen.lock().push(e.kind().as_str());
            })
            .on_named("rateDeviating", move |e| {
                rate_seen.lock().push(e.kind().as_str());
            });

        subscriptions.emit(&CaptureEvent::Overrun);
        subscriptions.emit(&CaptureEvent::RateDeviating(44100));
        subscriptions.emit(&CaptureEvent::Audio(AudioBuffer::new(vec![0; 4])));

        assert_eq!(*seen.lock(), ["rateDeviating", "audio"]);
    }

    #[test]
    fn multiple_handlers_fire_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&seen);
        let second = Arc::clone(&seen);
        let mut subscriptions = Subscriptions::new()
            .on(EventKind::Close, move |_| first.lock().push(1))
            .on(EventKind::Close, move |_| second.lock().push(2));
        subscriptions.on_event(CaptureEvent::Close);
        assert_eq!(*seen.lock(), [1, 2]);
    }

    #[test]
    fn unknown_name_is_a_no_op() {
        let subscriptions = Subscriptions::new().on_named("data", |_| panic!("must not fire"));
        assert_eq!(subscriptions.handler_count(), 0);
    }

    #[test]
    fn events_iterate_until_sender_drops() {
        let (tx, rx) = mpsc::channel();
        tx.send(CaptureEvent::Overrun).unwrap();
        tx.send(CaptureEvent::Close).unwrap();
        drop(tx);

        let events: Vec<_> = CaptureEvents::new(rx).collect();
        assert_eq!(events, [CaptureEvent::Overrun, CaptureEvent::Close]);
    }

    #[test]
    fn recv_timeout_returns_none_when_idle() {
        let (_tx, rx) = mpsc::channel::<CaptureEvent>();
        let events = CaptureEvents::new(rx);
        assert_eq!(events.recv_timeout(Duration::from_millis(5)), None);
        assert_eq!(events.try_recv(), None);
    }

    #[test]
    fn dispatch_drives_subscriptions() {
        let (tx, rx) = mpsc::channel();
        tx.send(CaptureEvent::ShortRead(3)).unwrap();
        tx.send(CaptureEvent::Close).unwrap();
        drop(tx);

        let closed = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&closed);
        CaptureEvents::new(rx).dispatch(
            Subscriptions::new().on(EventKind::Close, move |_| *flag.lock() = true),
        );
        assert!(*closed.lock());
    }
}
