use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aprskiss_aprsis::{ClientConfig, Credentials, RetryPolicy, DEFAULT_FILTER_PORT, DEFAULT_SERVER};
use aprskiss_session::{KissSettings, ModeInit, SessionConfig};
use aprskiss_transport::LinkConfig;
use clap::{Args, Subcommand};

use crate::exit::{session_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod beacon;
pub mod is_listen;
pub mod is_send;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print frames heard by a TNC.
    Listen(ListenArgs),
    /// Transmit one frame through a TNC.
    Send(SendArgs),
    /// Transmit frames through a TNC at a fixed interval until interrupted.
    Beacon(BeaconArgs),
    /// Submit one frame to APRS-IS.
    IsSend(IsSendArgs),
    /// Log in to APRS-IS and print received lines.
    IsListen(IsListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Beacon(args) => beacon::run(args, format),
        Command::IsSend(args) => is_send::run(args, format),
        Command::IsListen(args) => is_listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// How to reach the TNC.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device of the TNC (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, value_name = "PATH", required_unless_present = "tcp")]
    pub serial: Option<String>,
    /// Serial baud rate.
    #[arg(long, default_value = "38400")]
    pub baud: u32,
    /// TCP KISS endpoint of the TNC.
    #[arg(long, value_name = "HOST:PORT", conflicts_with = "serial")]
    pub tcp: Option<String>,
    /// Sequence that switches the TNC into KISS mode: none, w8ded or linknord.
    #[arg(long, default_value = "none")]
    pub mode_init: String,
    /// Apply the Xastir channel-access defaults (TXDELAY 40, P 63,
    /// SLOTTIME 20, TXTAIL 30, half duplex).
    #[arg(long)]
    pub kiss_defaults: bool,
    /// Keyup delay in 10 ms units.
    #[arg(long)]
    pub tx_delay: Option<u8>,
    /// CSMA persistence (p = (value + 1) / 256).
    #[arg(long)]
    pub persistence: Option<u8>,
    /// CSMA slot interval in 10 ms units.
    #[arg(long)]
    pub slot_time: Option<u8>,
    /// Transmitter hold after a frame, 10 ms units.
    #[arg(long)]
    pub tx_tail: Option<u8>,
    /// Full duplex: 0 off, nonzero on.
    #[arg(long)]
    pub full_duplex: Option<u8>,
}

impl LinkArgs {
    pub fn link_config(&self) -> CliResult<LinkConfig> {
        match (&self.serial, &self.tcp) {
            (Some(path), None) => Ok(LinkConfig::serial(path.as_str(), self.baud)),
            (None, Some(endpoint)) => {
                let (host, port) = parse_host_port(endpoint)?;
                Ok(LinkConfig::tcp(host, port))
            }
            _ => Err(CliError::usage("exactly one of --serial or --tcp is required")),
        }
    }

    pub fn session_config(&self) -> CliResult<SessionConfig> {
        let mode_init: ModeInit = self
            .mode_init
            .parse()
            .map_err(|err| session_error("invalid --mode-init", err))?;

        let mut settings = if self.kiss_defaults {
            KissSettings::xastir()
        } else {
            KissSettings::default()
        };
        settings.tx_delay = self.tx_delay.or(settings.tx_delay);
        settings.persistence = self.persistence.or(settings.persistence);
        settings.slot_time = self.slot_time.or(settings.slot_time);
        settings.tx_tail = self.tx_tail.or(settings.tx_tail);
        settings.full_duplex = self.full_duplex.or(settings.full_duplex);

        Ok(SessionConfig {
            mode_init,
            settings,
            ..SessionConfig::default()
        })
    }
}

/// APRS-IS login and server selection.
#[derive(Args, Debug)]
pub struct IsArgs {
    /// Login callsign.
    #[arg(long, env = "APRSIS_USER")]
    pub user: String,
    /// APRS-IS passcode; -1 logs in receive-only.
    #[arg(long, env = "APRSIS_PASSCODE", default_value = "-1", hide_env_values = true)]
    pub passcode: String,
    /// Server host.
    #[arg(long, env = "APRSIS_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,
    /// Server TCP port.
    #[arg(long, default_value_t = DEFAULT_FILTER_PORT)]
    pub port: u16,
    /// Total TCP send attempts when the connection drops (1 disables reconnect).
    #[arg(long, default_value = "5")]
    pub attempts: u32,
}

impl IsArgs {
    pub fn client_config(&self) -> ClientConfig {
        let credentials = Credentials::new(self.user.as_str()).with_passcode(self.passcode.as_str());
        let mut config = ClientConfig::new(credentials);
        config.server = self.server.clone();
        config.port = self.port;
        config.retry = RetryPolicy {
            max_attempts: self.attempts.max(1),
            ..RetryPolicy::default()
        };
        config
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Also print KISS payloads that are not AX.25 UI frames.
    #[arg(long)]
    pub raw_kiss: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Frame in TNC2 form, e.g. "N0CALL>APRS,WIDE1-1:!4903.50N/07201.75W-".
    pub frame: String,
}

#[derive(Args, Debug)]
pub struct BeaconArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Frames in TNC2 form, sent in order every interval.
    #[arg(required = true)]
    pub frames: Vec<String>,
    /// Time between rounds (e.g. 10m, 30s, 500ms).
    #[arg(long, default_value = "10m")]
    pub interval: String,
    /// Stop after N rounds.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct IsSendArgs {
    #[command(flatten)]
    pub is: IsArgs,
    /// Frame in TNC2 form.
    pub frame: String,
    /// Submission protocol: tcp, http or udp.
    #[arg(long, default_value = "tcp")]
    pub protocol: String,
    /// Server UDP port.
    #[arg(long)]
    pub udp_port: Option<u16>,
    /// HTTP submission URL.
    #[arg(long)]
    pub http_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct IsListenArgs {
    #[command(flatten)]
    pub is: IsArgs,
    /// Server-side filter (default: p/<user>).
    #[arg(long)]
    pub filter: Option<String>,
    /// Exit after printing N lines.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_host_port(input: &str) -> CliResult<(String, u16)> {
    let (host, port) = input
        .rsplit_once(':')
        .ok_or_else(|| CliError::usage(format!("expected HOST:PORT, got {input:?}")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(CliError::usage(format!("missing host in {input:?}")));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| CliError::usage(format!("invalid port in {input:?}")))?;
    Ok((host.to_string(), port))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Err(CliError::usage(format!("unsupported duration unit: {unit}"))),
    }
}

/// Route Ctrl-C to `stop`. A second install in the same process is ignored.
pub fn install_ctrlc_handler(stop: Arc<AtomicBool>) -> CliResult<()> {
    match ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    }) {
        Ok(()) | Err(ctrlc::Error::MultipleHandlers) => Ok(()),
        Err(err) => Err(CliError::new(
            INTERNAL,
            format!("signal handler setup failed: {err}"),
        )),
    }
}
