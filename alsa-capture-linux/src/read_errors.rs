//! Classification of failed `snd_pcm_readi` calls.

use alsa_capture_core::ReadFailure;

const ENODEV: i32 = 19;
const EPIPE: i32 = 32;
const EBADFD: i32 = 77;
const ESTRPIPE: i32 = 86;

/// Whether the device must be re-prepared before the next read.
///
/// `EPIPE` is an overrun, `ESTRPIPE` a suspend.
pub fn needs_prepare(errno: i32) -> bool {
    matches!(errno.abs(), EPIPE | ESTRPIPE)
}

/// Map an ALSA errno (either sign) and its message to a read outcome.
pub fn classify(errno: i32, message: String) -> ReadFailure {
    match errno.abs() {
        EPIPE => ReadFailure::Overrun,
        ENODEV | EBADFD => ReadFailure::Fatal(message),
        _ => ReadFailure::Transient(message),
    }
}
