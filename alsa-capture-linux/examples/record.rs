//! Capture from an ALSA device for ten seconds, logging every event.
//!
//! ```text
//! RUST_LOG=info cargo run -p alsa-capture-linux --example record -- '{"device":"hw:1,0","rate":48000}'
//! ```

#[cfg(target_os = "linux")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::thread;
    use std::time::Duration;

    use alsa_capture_core::{CaptureConfiguration, CaptureEvent, CaptureSession, EventKind, Subscriptions};
    use alsa_capture_linux::AlsaCaptureEngine;

    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(json) => CaptureConfiguration::from_json(&json)?,
        None => CaptureConfiguration::default(),
    };

    let subscriptions = Subscriptions::new()
        .on(EventKind::Audio, |event| {
            if let CaptureEvent::Audio(buffer) = event {
                log::info!("audio: {} bytes", buffer.len());
            }
        })
        .on(EventKind::RateDeviating, |event| {
            log::warn!("sound card rate deviates from requested rate: {:?}", event);
        })
        .on(EventKind::PeriodSizeDeviating, |event| {
            log::warn!("sound card period size deviates from requested period size: {:?}", event);
        })
        .on(EventKind::PeriodTime, |event| log::info!("{:?}", event))
        .on(EventKind::Error, |event| log::error!("{:?}", event))
        .on(EventKind::Overrun, |_| log::warn!("overrun"))
        .on(EventKind::ShortRead, |event| log::warn!("{:?}", event))
        .on(EventKind::ReadError, |event| log::warn!("{:?}", event))
        .on(EventKind::Close, |_| log::info!("capture closed"));

    let (session, events) = CaptureSession::open_with_channel(config, AlsaCaptureEngine::new())?;
    let consumer = thread::spawn(move || events.dispatch(subscriptions));

    thread::sleep(Duration::from_secs(10));
    session.close();
    let diagnostics = session.diagnostics();
    session.join()?;
    if consumer.join().is_err() {
        log::error!("event consumer panicked");
    }
    log::info!("{:?}", diagnostics);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("ALSA capture is only available on Linux");
}
