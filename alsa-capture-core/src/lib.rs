//! # alsa-capture-core
//!
//! Platform-agnostic audio capture session.
//!
//! Wraps one capture engine (ALSA on Linux, or a mock) behind a session that
//! validates configuration, negotiates parameters, and delivers audio periods
//! and status events to a single consumer in order. Platform backends
//! implement the `CaptureEngine` trait and plug into `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! alsa-capture-core (this crate)
//! ├── traits/    ← CaptureEngine, CaptureDelegate
//! ├── models/    ← CaptureConfiguration, SampleFormat, CaptureError, CaptureEvent, SessionState, ...
//! ├── engine/    ← engine message feed, read loop, MockEngine
//! └── session/   ← CaptureSession (state machine + dispatch), multiplexer, Subscriptions
//! ```
//!
//! ## Usage
//! ```
//! use alsa_capture_core::{CaptureConfiguration, CaptureEvent, CaptureSession, MockEngine};
//!
//! let (session, events) =
//!     CaptureSession::open_with_channel(CaptureConfiguration::default(), MockEngine::new())?;
//! for event in events {
//!     match event {
//!         CaptureEvent::Audio(buffer) => {
//!             assert_eq!(buffer.len(), 128);
//!             session.close();
//!         }
//!         CaptureEvent::Close => break,
//!         _ => {}
//!     }
//! }
//! # Ok::<(), alsa_capture_core::CaptureError>(())
//! ```

pub mod engine;
pub mod models;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use engine::feed::{EngineFeed, EngineMessage, Notification, ScalarValue, StopSignal};
pub use engine::mock::{MockEngine, MockRead};
pub use models::config::{CaptureConfiguration, PeriodRequest};
pub use models::error::{CaptureError, ReadFailure};
pub use models::event::{AudioBuffer, CaptureEvent, EventKind, UnknownEventName};
pub use models::format::SampleFormat;
pub use models::negotiated::NegotiatedParameters;
pub use models::state::SessionState;
pub use session::capture::{CaptureSession, SessionDiagnostics};
pub use session::subscriptions::{CaptureEvents, Subscriptions};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_engine::CaptureEngine;
