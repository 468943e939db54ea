//! Print APRS-IS traffic within 50 km of a point.
//!
//! Run with:
//!   cargo run --example aprs-is-monitor -- N0CALL 40.7 -74.0

use std::ops::ControlFlow;

use aprskiss::aprsis::{AprsIsClient, ClientConfig, Credentials};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let user = args.next().unwrap_or_else(|| "N0CALL".to_string());
    let lat = args.next().unwrap_or_else(|| "40.7".to_string());
    let lon = args.next().unwrap_or_else(|| "-74.0".to_string());

    let mut client = AprsIsClient::new(ClientConfig::new(Credentials::new(user)));
    let filter = format!("r/{lat}/{lon}/50");
    client.connect(None, None, Some(&filter))?;
    eprintln!("Logged in with filter {filter}");

    let mut seen = 0;
    client.receive(|line| {
        println!("{line}");
        seen += 1;
        if seen >= 20 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;

    client.close()?;
    Ok(())
}
