//! Beacon a position through a TCP KISS TNC, such as Direwolf's KISS port.
//!
//! Run with:
//!   cargo run --example tcp-beacon -- 127.0.0.1:8001 N0CALL
//!
//! Sends three beacons a minute apart, then closes the session.

use std::time::Duration;

use aprskiss::ax25::{format_latitude, format_longitude, Callsign, Frame};
use aprskiss::session::{SessionConfig, TncSession};
use aprskiss::transport::LinkConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let endpoint = args.next().unwrap_or_else(|| "127.0.0.1:8001".to_string());
    let mycall = args.next().unwrap_or_else(|| "N0CALL".to_string());

    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or("expected HOST:PORT")?;
    let link = LinkConfig::tcp(host, port.parse()?);
    let session = TncSession::open(&link, SessionConfig::default())?;
    eprintln!("Connected to {}", session.endpoint());

    let position = format!(
        "!{}/{}-aprskiss beacon",
        format_latitude(49.0583)?,
        format_longitude(-72.0292)?
    );
    let frame = Frame::new(
        mycall.parse::<Callsign>()?,
        Callsign::new("APRS", 0)?,
        vec!["WIDE1-1".parse::<Callsign>()?],
        position.into_bytes(),
    );

    for round in 1..=3 {
        session.write_frame(&frame)?;
        eprintln!("Beacon {round}: {frame}");
        if round < 3 {
            std::thread::sleep(Duration::from_secs(60));
        }
    }

    session.close()?;
    Ok(())
}
