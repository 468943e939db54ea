use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aprskiss_ax25::Frame;
use aprskiss_session::TncSession;

use crate::cmd::{install_ctrlc_handler, parse_duration, BeaconArgs};
use crate::exit::{ax25_error, session_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Longest uninterrupted sleep between stop-flag checks.
const STOP_POLL: Duration = Duration::from_millis(100);

pub fn run(args: BeaconArgs, _format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let frames = args
        .frames
        .iter()
        .map(|text| Frame::parse_tnc2(text))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ax25_error("invalid frame", err))?;

    let link = args.link.link_config()?;
    let config = args.link.session_config()?;
    let session =
        TncSession::open(&link, config).map_err(|err| session_error("open failed", err))?;

    let stop = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&stop))?;

    let mut rounds = 0usize;
    while !stop.load(Ordering::SeqCst) {
        for frame in &frames {
            session
                .write_frame(frame)
                .map_err(|err| session_error("send failed", err))?;
            tracing::info!(frame = %frame, round = rounds + 1, "beacon sent");
        }
        rounds = rounds.saturating_add(1);
        if args.count.is_some_and(|count| rounds >= count) {
            break;
        }
        wait(interval, &stop);
    }

    tracing::info!(rounds, "beacon stopped");
    session
        .close()
        .map_err(|err| session_error("close failed", err))?;
    Ok(SUCCESS)
}

fn wait(interval: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(STOP_POLL));
    }
}
