//! # alsa-capture-linux
//!
//! Linux ALSA backend for alsa-capture-core.
//!
//! Provides:
//! - `AlsaCaptureEngine`: interleaved PCM capture from an ALSA device name
//!   (`default`, `hw:1,0`, `plughw:...`) with rate and period negotiation
//! - `read_errors`: mapping of ALSA read errno values to read outcomes
//!
//! ## Platform Requirements
//! - alsa-lib development headers (`libasound2-dev` / `alsa-lib-devel`)
//!
//! ## Usage
//! ```ignore
//! use alsa_capture_core::{CaptureConfiguration, CaptureSession};
//! use alsa_capture_linux::AlsaCaptureEngine;
//!
//! let (session, events) =
//!     CaptureSession::open_with_channel(CaptureConfiguration::default(), AlsaCaptureEngine::new())?;
//! ```

pub mod read_errors;

#[cfg(target_os = "linux")]
pub mod alsa_engine;

#[cfg(target_os = "linux")]
pub use alsa_engine::AlsaCaptureEngine;
