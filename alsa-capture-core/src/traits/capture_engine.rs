use crate::models::config::CaptureConfiguration;
use crate::models::error::{CaptureError, ReadFailure};
use crate::models::negotiated::NegotiatedParameters;

/// Interface for platform-specific capture devices.
///
/// Implemented by:
/// - `AlsaCaptureEngine` (Linux, in `alsa-capture-linux`)
/// - [`MockEngine`](crate::engine::mock::MockEngine) for tests
///
/// All three methods are called from the session's dedicated engine thread,
/// never concurrently.
pub trait CaptureEngine: Send + 'static {
    /// Open the device named by `config.device` and negotiate parameters.
    ///
    /// The engine applies the requested rate and period as "nearest" values
    /// and returns what the hardware actually granted.
    fn open(&mut self, config: &CaptureConfiguration) -> Result<NegotiatedParameters, CaptureError>;

    /// Blocking read of one period into `buffer`.
    ///
    /// `buffer` is exactly one period long. Returns the number of frames read.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, ReadFailure>;

    /// Drain and release the device handle.
    fn close(&mut self) -> Result<(), CaptureError>;
}
