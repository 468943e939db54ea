//! Serial port links.
//!
//! Hardware TNCs (TNC-X, Kantronics, TAPR TNC-2 clones running W8DED or
//! LINK>.<NORD firmware) present as serial devices. Most run at 9600 or
//! 38400 baud, 8N1, without flow control.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::Link;

/// Serial line configuration.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. Default: 38400.
    pub baud_rate: u32,
    /// Data bits per character. Default: eight.
    pub data_bits: DataBits,
    /// Parity checking. Default: none.
    pub parity: Parity,
    /// Stop bits per character. Default: one.
    pub stop_bits: StopBits,
    /// Flow control. Default: none.
    pub flow_control: FlowControl,
    /// Read timeout. A timed-out read is reported as `ErrorKind::TimedOut`.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 38_400,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(100),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Open a serial device with the given line settings (blocking).
pub fn open_serial(path: &str, config: &SerialConfig) -> Result<Link> {
    debug!(port = %path, baud = config.baud_rate, "opening serial port");

    let port = serialport::new(path, config.baud_rate)
        .data_bits(config.data_bits.into())
        .parity(config.parity.into())
        .stop_bits(config.stop_bits.into())
        .flow_control(config.flow_control.into())
        .timeout(config.timeout)
        .open()
        .map_err(|source| TransportError::Serial {
            port: path.to_string(),
            source,
        })?;

    info!(port = %path, baud = config.baud_rate, "serial port opened");
    Ok(Link::from_serial(port))
}
