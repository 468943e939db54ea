use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use aprskiss_ax25::Frame;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: &'static str,
    source: String,
    destination: String,
    path: Vec<String>,
    payload_size: usize,
    payload: String,
    tnc2: String,
    endpoint: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct PayloadOutput<'a> {
    kind: &'static str,
    payload_size: usize,
    payload_hex: String,
    endpoint: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct LineOutput<'a> {
    kind: &'static str,
    line: &'a str,
    source: Option<String>,
    server: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct SubmitOutput<'a> {
    kind: &'static str,
    protocol: String,
    accepted: bool,
    tnc2: &'a str,
}

/// A decoded frame heard on a TNC link.
pub fn print_frame(frame: &Frame, endpoint: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind: "frame",
                source: frame.source.to_string(),
                destination: frame.destination.to_string(),
                path: frame.path.iter().map(|hop| hop.hop_display()).collect(),
                payload_size: frame.payload.len(),
                payload: payload_preview(frame.payload.as_ref()),
                tnc2: frame.to_tnc2(),
                endpoint,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let path = frame
                .path
                .iter()
                .map(|hop| hop.hop_display())
                .collect::<Vec<_>>()
                .join(",");
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "DEST", "PATH", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    frame.source.to_string(),
                    frame.destination.to_string(),
                    path,
                    frame.payload.len().to_string(),
                    payload_preview(frame.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} -> {} via [{}] size={} endpoint={} payload={}",
                frame.source,
                frame.destination,
                frame
                    .path
                    .iter()
                    .map(|hop| hop.hop_display())
                    .collect::<Vec<_>>()
                    .join(","),
                frame.payload.len(),
                endpoint,
                payload_preview(frame.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            let mut line = frame.to_tnc2_bytes();
            line.push(b'\n');
            print_raw(&line);
        }
    }
}

/// A KISS payload that did not decode as an AX.25 UI frame.
pub fn print_payload(payload: &[u8], endpoint: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&PayloadOutput {
            kind: "kiss",
            payload_size: payload.len(),
            payload_hex: hex(payload),
            endpoint,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("undecoded size={} payload={}", payload.len(), hex(payload));
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

/// A station line received from APRS-IS.
pub fn print_line(line: &str, server: &str, format: OutputFormat) {
    let source = line.split_once('>').map(|(source, _)| source.to_string());
    match format {
        OutputFormat::Json => print_json(&LineOutput {
            kind: "aprs-is",
            line,
            source,
            server,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOURCE", "SERVER", "LINE"])
                .add_row(vec![
                    source.unwrap_or_default(),
                    server.to_string(),
                    line.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("[{server}] {line}"),
        OutputFormat::Raw => println!("{line}"),
    }
}

/// Outcome of an APRS-IS submission.
pub fn print_submit(protocol: &str, accepted: bool, tnc2: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SubmitOutput {
            kind: "aprs-is-submit",
            protocol: protocol.to_string(),
            accepted,
            tnc2,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["PROTOCOL", "ACCEPTED", "FRAME"])
                .add_row(vec![protocol.to_string(), accepted.to_string(), tnc2.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("protocol={protocol} accepted={accepted} frame={tnc2}"),
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_pairs() {
        assert_eq!(hex(&[0xC0, 0x00, 0x0A]), "c0000a");
    }

    #[test]
    fn binary_payload_preview() {
        assert_eq!(payload_preview(b"!hello"), "!hello");
        assert_eq!(payload_preview(&[0xFF, 0xFE]), "<binary 2 bytes>");
    }
}
