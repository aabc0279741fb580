use std::sync::mpsc::Sender;

use crate::models::event::CaptureEvent;

/// Receiver of capture session events.
///
/// Called on the session's dispatch thread, one event at a time, in the order
/// the engine produced them. `CaptureEvent::Close` is always the last call.
/// Implementations should hand work off quickly; a slow delegate delays
/// delivery but never blocks the device read loop.
pub trait CaptureDelegate: Send + 'static {
    fn on_event(&mut self, event: CaptureEvent);
}

impl CaptureDelegate for Sender<CaptureEvent> {
    fn on_event(&mut self, event: CaptureEvent) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.send(event);
    }
}
