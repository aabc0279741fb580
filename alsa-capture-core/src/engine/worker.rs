//! Engine read loop, run on the session's dedicated engine thread.
//!
//! Sequence:
//! 1. Open the device and negotiate
//! 2. Report granted parameters and any deviation from the request
//! 3. Read one period at a time until stop is requested or the device fails
//! 4. Close and drop the engine, then confirm shutdown

use log::Level;

use crate::engine::feed::{EngineFeed, Notification, ScalarValue};
use crate::models::config::CaptureConfiguration;
use crate::models::error::{CaptureError, ReadFailure};
use crate::models::event::EventKind;
use crate::traits::capture_engine::CaptureEngine;

pub(crate) fn diagnostics_level(config: &CaptureConfiguration) -> Level {
    if config.debug {
        Level::Info
    } else {
        Level::Debug
    }
}

pub fn run_engine<E: CaptureEngine>(mut engine: E, config: CaptureConfiguration, feed: EngineFeed) {
    let level = diagnostics_level(&config);

    log::log!(level, "opening capture device {:?}", config.device);
    let params = match engine.open(&config) {
        Ok(params) => params,
        Err(e) => {
            log::error!("capture device {:?} failed to open: {}", config.device, e);
            feed.error(e.to_string());
            drop(engine);
            feed.closed();
            return;
        }
    };

    log::log!(
        level,
        "negotiated rate {} Hz (requested {}), period {} frames, {} us",
        params.rate,
        config.rate,
        params.period_size,
        params.period_time.as_micros()
    );

    let Some(buffer_len) = params.buffer_len(&config) else {
        let e = CaptureError::EngineOpen(format!(
            "granted period of {} frames is too large to buffer",
            params.period_size
        ));
        log::error!("capture device {:?}: {}", config.device, e);
        feed.error(e.to_string());
        release(engine, &config, level);
        feed.closed();
        return;
    };
    feed.opened(params);

    if let Some(rate) = params.rate_deviation(&config) {
        feed.notify(Notification::scalar(
            EventKind::RateDeviating,
            ScalarValue::Integer(u64::from(rate)),
        ));
    }
    if let Some(frames) = params.period_size_deviation(&config) {
        feed.notify(Notification::scalar(
            EventKind::PeriodSizeDeviating,
            ScalarValue::Integer(frames),
        ));
    }
    feed.notify(Notification::scalar(
        EventKind::PeriodTime,
        ScalarValue::Duration(params.period_time),
    ));

    let frame_bytes = config.bytes_per_frame();
    let period_frames = params.period_size as usize;
    let mut buffer = vec![0u8; buffer_len];
    log::log!(level, "capture buffer size {} bytes", buffer.len());

    while !feed.stop_requested() {
        match engine.read(&mut buffer) {
            Ok(frames) if frames >= period_frames => feed.audio(buffer.clone()),
            Ok(frames) => {
                log::log!(level, "short read, {} of {} frames", frames, period_frames);
                feed.notify(Notification::scalar(
                    EventKind::ShortRead,
                    ScalarValue::Integer(frames as u64),
                ));
                buffer[frames * frame_bytes..].fill(0);
                feed.audio(buffer.clone());
            }
            Err(ReadFailure::Overrun) => {
                log::log!(level, "overrun occurred");
                feed.notify(Notification::bare(EventKind::Overrun));
            }
            Err(ReadFailure::Transient(message)) => {
                log::log!(level, "{}", CaptureError::Read(message.clone()));
                feed.notify(Notification::scalar(
                    EventKind::ReadError,
                    ScalarValue::Text(message),
                ));
            }
            Err(ReadFailure::Fatal(message)) => {
                let e = CaptureError::Fatal(message);
                log::error!("capture device {:?}: {}", config.device, e);
                feed.error(e.to_string());
                break;
            }
        }
    }

    release(engine, &config, level);
    feed.closed();
}

fn release<E: CaptureEngine>(mut engine: E, config: &CaptureConfiguration, level: Level) {
    if let Err(e) = engine.close() {
        log::warn!("error while closing capture device: {}", e);
    }
    drop(engine);
    log::log!(level, "capture device {:?} released", config.device);
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::engine::feed::{EngineMessage, StopSignal};
    use crate::engine::mock::{MockEngine, MockRead};

    fn run(engine: MockEngine, config: CaptureConfiguration) -> Vec<EngineMessage> {
        let (tx, rx) = mpsc::channel();
        run_engine(engine, config, EngineFeed::new(tx, StopSignal::new()));
        rx.iter().collect()
    }

    fn tags(messages: &[EngineMessage]) -> Vec<String> {
        messages
            .iter()
            .map(|m| match m {
                EngineMessage::Opened(_) => "opened".to_string(),
                EngineMessage::Notification(n) => n.tag.to_string(),
                EngineMessage::Error(_) => "error".to_string(),
                EngineMessage::Closed => "closed".to_string(),
            })
            .collect()
    }

    #[test]
    fn open_failure_reports_error_then_closed() {
        let engine = MockEngine::new().fail_open("no such device");
        let messages = run(engine, CaptureConfiguration::default());
        assert_eq!(tags(&messages), ["error", "closed"]);
        assert!(matches!(&messages[0], EngineMessage::Error(m) if m.contains("no such device")));
    }

    #[test]
    fn fatal_read_stops_loop_without_stop_signal() {
        let engine = MockEngine::new()
            .with_reads([MockRead::Full(1), MockRead::Fatal("device unplugged".into())]);
        let released = engine.released_flag();
        let messages = run(engine, CaptureConfiguration::default());
        assert_eq!(
            tags(&messages),
            ["opened", "periodTime", "audio", "error", "closed"]
        );
        assert_eq!(
            messages[3],
            EngineMessage::Error("fatal device error: device unplugged".into())
        );
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn deviations_precede_first_audio() {
        let config = CaptureConfiguration {
            rate: 48000,
            period_size: Some(64),
            ..Default::default()
        };
        let engine = MockEngine::new()
            .grant(44100, 32)
            .with_reads([MockRead::Full(0), MockRead::Fatal("done".into())]);
        let messages = run(engine, config);
        assert_eq!(
            tags(&messages),
            ["opened", "rateDeviating", "periodSizeDeviating", "periodTime", "audio", "error", "closed"]
        );
        assert_eq!(
            messages[1],
            EngineMessage::Notification(Notification::scalar(
                EventKind::RateDeviating,
                ScalarValue::Integer(44100)
            ))
        );
    }

    #[test]
    fn short_read_zero_fills_tail() {
        let engine = MockEngine::new()
            .with_reads([MockRead::Short(8, 0xAB), MockRead::Fatal("done".into())]);
        let messages = run(engine, CaptureConfiguration::default());
        assert_eq!(
            tags(&messages),
            ["opened", "periodTime", "shortRead", "audio", "error", "closed"]
        );
        let EngineMessage::Notification(audio) = &messages[3] else {
            panic!("expected audio notification");
        };
        let data = audio.binary.as_ref().unwrap();
        assert_eq!(data.len(), 128);
        assert!(data[..32].iter().all(|&b| b == 0xAB));
        assert!(data[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn non_fatal_failures_keep_reading() {
        let engine = MockEngine::new().with_reads([
            MockRead::Overrun,
            MockRead::Transient("Input/output error".into()),
            MockRead::Full(3),
            MockRead::Fatal("done".into()),
        ]);
        let messages = run(engine, CaptureConfiguration::default());
        assert_eq!(
            tags(&messages),
            ["opened", "periodTime", "overrun", "readError", "audio", "error", "closed"]
        );
    }

    #[test]
    fn oversized_grant_reports_error_and_releases_device() {
        let engine = MockEngine::new().grant(44100, 1 << 62);
        let released = engine.released_flag();
        let messages = run(engine, CaptureConfiguration::default());
        assert_eq!(tags(&messages), ["error", "closed"]);
        assert!(matches!(&messages[0], EngineMessage::Error(m) if m.contains("too large")));
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn debug_flag_raises_diagnostics_to_info() {
        let quiet = CaptureConfiguration::default();
        assert_eq!(diagnostics_level(&quiet), Level::Debug);

        let verbose = CaptureConfiguration {
            debug: true,
            ..Default::default()
        };
        assert_eq!(diagnostics_level(&verbose), Level::Info);
    }

    #[test]
    fn stop_signal_ends_idle_stream() {
        let (tx, rx) = mpsc::channel();
        let stop = StopSignal::new();
        let feed = EngineFeed::new(tx, stop.clone());
        let engine = MockEngine::new().pace(Duration::from_millis(1));
        let handle = std::thread::spawn(move || {
            run_engine(engine, CaptureConfiguration::default(), feed);
        });

        // Wait for some audio, then stop.
        let mut audio = 0;
        while audio < 3 {
            if let EngineMessage::Notification(n) = rx.recv().unwrap() {
                if n.binary.is_some() {
                    audio += 1;
                }
            }
        }
        stop.raise();
        handle.join().unwrap();
        let rest: Vec<_> = rx.iter().collect();
        assert_eq!(rest.last(), Some(&EngineMessage::Closed));
    }
}
