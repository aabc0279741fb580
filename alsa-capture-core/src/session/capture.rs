use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use log::Level;
use parking_lot::Mutex;
use serde::Serialize;

use crate::engine::feed::{EngineFeed, EngineMessage, StopSignal};
use crate::engine::worker::{diagnostics_level, run_engine};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::event::CaptureEvent;
use crate::models::negotiated::NegotiatedParameters;
use crate::models::state::SessionState;
use crate::session::multiplexer::demultiplex;
use crate::session::subscriptions::CaptureEvents;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_engine::CaptureEngine;

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionDiagnostics {
    pub audio_buffers: u64,
    pub bytes_captured: u64,
    pub overruns: u64,
    pub short_reads: u64,
    pub read_errors: u64,
    /// Notifications discarded after a fatal error.
    pub dropped_after_error: u64,
}

impl SessionDiagnostics {
    fn record(&mut self, event: &CaptureEvent) {
        match event {
            CaptureEvent::Audio(buffer) => {
                self.audio_buffers += 1;
                self.bytes_captured += buffer.len() as u64;
            }
            CaptureEvent::Overrun => self.overruns += 1,
            CaptureEvent::ShortRead(_) => self.short_reads += 1,
            CaptureEvent::ReadError(_) => self.read_errors += 1,
            _ => {}
        }
    }
}

/// Session state shared by the consumer handle and the dispatch thread.
struct SharedState {
    state: SessionState,
    negotiated: Option<NegotiatedParameters>,
    fatal_reported: bool,
    diagnostics: SessionDiagnostics,
}

impl SharedState {
    fn new() -> Self {
        Self {
            state: SessionState::Opening,
            negotiated: None,
            fatal_reported: false,
            diagnostics: SessionDiagnostics::default(),
        }
    }

    /// Move forward to `next`. Returns `false` if that would go backwards.
    fn advance(&mut self, next: SessionState) -> bool {
        if !self.state.can_advance_to(next) {
            return false;
        }
        log::debug!("capture session {:?} -> {:?}", self.state, next);
        self.state = next;
        true
    }
}

/// A capture session wrapping one engine.
///
/// The engine runs on its own thread and pushes notifications into a channel.
/// A dispatch thread drains that channel in order, drives the state machine
/// and hands events to the delegate:
/// ```text
/// [capture-engine] → EngineMessage channel → [capture-dispatch] → CaptureDelegate
/// ```
/// `CaptureEvent::Close` is delivered exactly once, after the engine has
/// released the device, and nothing is delivered after it.
pub struct CaptureSession {
    config: CaptureConfiguration,
    shared: Arc<Mutex<SharedState>>,
    stop: StopSignal,
    level: Level,
    engine_handle: Option<thread::JoinHandle<()>>,
    dispatch_handle: Option<thread::JoinHandle<()>>,
}

impl CaptureSession {
    /// Validate `config` and start opening the device.
    ///
    /// Returns as soon as the threads are running; the session is observable
    /// in `Opening` and moves to `Streaming` once the engine has negotiated.
    /// Only configuration problems and thread spawn failures are returned
    /// here. A device that cannot be opened is reported as an `Error` event
    /// followed by `Close`.
    pub fn open<E, D>(config: CaptureConfiguration, engine: E, delegate: D) -> Result<Self, CaptureError>
    where
        E: CaptureEngine,
        D: CaptureDelegate,
    {
        config.validate()?;

        let level = diagnostics_level(&config);
        let (tx, rx) = mpsc::channel();
        let stop = StopSignal::new();
        let shared = Arc::new(Mutex::new(SharedState::new()));

        let engine_handle = {
            let feed = EngineFeed::new(tx, stop.clone());
            let config = config.clone();
            thread::Builder::new()
                .name("capture-engine".into())
                .spawn(move || run_engine(engine, config, feed))
                .map_err(|e| CaptureError::Unknown(format!("failed to spawn engine thread: {}", e)))?
        };

        let dispatcher = Dispatcher {
            rx,
            shared: Arc::clone(&shared),
            stop: stop.clone(),
            delegate,
            level,
        };
        let dispatch_handle = match thread::Builder::new()
            .name("capture-dispatch".into())
            .spawn(move || dispatcher.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                stop.raise();
                return Err(CaptureError::Unknown(format!(
                    "failed to spawn dispatch thread: {}",
                    e
                )));
            }
        };

        log::log!(level, "capture session opening {:?}", config.device);

        Ok(Self {
            config,
            shared,
            stop,
            level,
            engine_handle: Some(engine_handle),
            dispatch_handle: Some(dispatch_handle),
        })
    }

    /// Open a session whose events are delivered through a channel.
    pub fn open_with_channel<E>(
        config: CaptureConfiguration,
        engine: E,
    ) -> Result<(Self, CaptureEvents), CaptureError>
    where
        E: CaptureEngine,
    {
        let (tx, rx) = mpsc::channel();
        let session = Self::open(config, engine, tx)?;
        Ok((session, CaptureEvents::new(rx)))
    }

    /// Request shutdown.
    ///
    /// The state is `Closing` when this returns. The engine stops after the
    /// read in flight and `CaptureEvent::Close` follows once the device is
    /// released. Calling this again, or after the session has started
    /// shutting down on its own, does nothing.
    pub fn close(&self) {
        {
            let mut shared = self.shared.lock();
            if shared.state.is_shutting_down() {
                return;
            }
            shared.advance(SessionState::Closing);
        }
        if self.stop.raise() {
            log::log!(self.level, "close requested for {:?}", self.config.device);
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// Parameters granted by the device, once negotiation has completed.
    pub fn negotiated(&self) -> Option<NegotiatedParameters> {
        self.shared.lock().negotiated
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn diagnostics(&self) -> SessionDiagnostics {
        self.shared.lock().diagnostics.clone()
    }

    /// Block until the engine and dispatch threads have exited.
    ///
    /// Does not request shutdown by itself; call [`close`](Self::close) first
    /// unless the session is already ending. There is no timeout.
    pub fn join(mut self) -> Result<(), CaptureError> {
        let mut result = Ok(());
        for (name, handle) in [
            ("engine", self.engine_handle.take()),
            ("dispatch", self.dispatch_handle.take()),
        ] {
            if let Some(handle) = handle {
                if handle.join().is_err() && result.is_ok() {
                    result = Err(CaptureError::Unknown(format!("{} thread panicked", name)));
                }
            }
        }
        result
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drains engine messages on the dispatch thread.
struct Dispatcher<D: CaptureDelegate> {
    rx: Receiver<EngineMessage>,
    shared: Arc<Mutex<SharedState>>,
    stop: StopSignal,
    delegate: D,
    level: Level,
}

impl<D: CaptureDelegate> Dispatcher<D> {
    fn run(mut self) {
        loop {
            let message = match self.rx.recv() {
                Ok(message) => message,
                Err(_) => {
                    log::error!("capture engine stopped without releasing the device");
                    self.handle(EngineMessage::Error(
                        "capture engine terminated unexpectedly".into(),
                    ));
                    EngineMessage::Closed
                }
            };
            if !self.handle(message) {
                return;
            }
        }
    }

    /// Apply one engine message. Returns `false` after the terminal close.
    fn handle(&mut self, message: EngineMessage) -> bool {
        // Decide under the lock, deliver outside it, so a delegate may call
        // back into the session.
        let (event, keep_running) = {
            let mut shared = self.shared.lock();
            match message {
                EngineMessage::Opened(params) => {
                    shared.negotiated = Some(params);
                    shared.advance(SessionState::Streaming);
                    (None, true)
                }
                EngineMessage::Notification(notification) => {
                    if shared.fatal_reported {
                        shared.diagnostics.dropped_after_error += 1;
                        log::debug!("dropping {} after fatal error", notification.tag);
                        (None, true)
                    } else {
                        let event = demultiplex(notification);
                        if let Some(event) = &event {
                            shared.diagnostics.record(event);
                        }
                        (event, true)
                    }
                }
                EngineMessage::Error(message) => {
                    shared.fatal_reported = true;
                    if shared.advance(SessionState::Closing) {
                        self.stop.raise();
                    }
                    (Some(CaptureEvent::Error(message)), true)
                }
                EngineMessage::Closed => {
                    shared.advance(SessionState::Closed);
                    (Some(CaptureEvent::Close), false)
                }
            }
        };

        if let Some(event) = event {
            self.deliver(event);
        }
        keep_running
    }

    fn deliver(&mut self, event: CaptureEvent) {
        match &event {
            CaptureEvent::Audio(_) => log::trace!("audio {:?}", event),
            CaptureEvent::Overrun => log::warn!("capture overrun"),
            CaptureEvent::ShortRead(frames) => log::warn!("capture short read: only {} frames", frames),
            CaptureEvent::ReadError(message) => log::warn!("capture read error: {}", message),
            CaptureEvent::RateDeviating(rate) => {
                log::warn!("device rate deviates from requested rate; actual rate {}", rate)
            }
            CaptureEvent::PeriodSizeDeviating(frames) => log::warn!(
                "device period size deviates from requested period size; actual {}",
                frames
            ),
            CaptureEvent::Close => log::log!(self.level, "capture session closed"),
            _ => log::log!(self.level, "capture event {:?}", event),
        }
        self.delegate.on_event(event);
    }
}
