//! Serial port transport.

use std::io::{self, Read, Write};
use std::time::Duration;

use hitl_core::{Transport, TransportError};
use log::{debug, info, warn};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

/// Largest chunk pulled from the OS in one read.
const READ_CHUNK: usize = 1024;

/// Serial link settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    /// Timeout of a single read or write on an open link.
    pub io_timeout: Duration,
    /// Per-byte read timeout while probing a port.
    pub probe_timeout: Duration,
    /// Bytes read from a port before giving up on it.
    pub probe_max_bytes: usize,
    /// Time between automatic scans while disconnected.
    pub rescan_interval: Duration,
    pub auto_scan: bool,
}

impl Default for SerialSettings {
    fn default() -> Self {
        DEFAULT_SERIAL_SETTINGS
    }
}

/// Default serial settings: 115200 8N1, automatic scanning every 2 s.
pub const DEFAULT_SERIAL_SETTINGS: SerialSettings = SerialSettings {
    baud_rate: 115_200,
    io_timeout: Duration::from_millis(100),
    probe_timeout: Duration::from_millis(50),
    probe_max_bytes: 512,
    rescan_interval: Duration::from_secs(2),
    auto_scan: true,
};

/// Error type for opening and enumerating ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// The port does not exist or is busy.
    NoDevice,
    /// The port rejected the requested settings.
    InvalidInput,
    /// Read or write failed.
    Io,
    /// Read or write timed out.
    Timeout,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoDevice => write!(f, "device not available"),
            Self::InvalidInput => write!(f, "invalid port settings"),
            Self::Io => write!(f, "I/O error"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

impl From<serialport::Error> for SerialError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => Self::NoDevice,
            serialport::ErrorKind::InvalidInput => Self::InvalidInput,
            serialport::ErrorKind::Io(io::ErrorKind::TimedOut) => Self::Timeout,
            serialport::ErrorKind::Io(_) | serialport::ErrorKind::Unknown => Self::Io,
        }
    }
}

impl From<io::Error> for SerialError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::NotFound => Self::NoDevice,
            _ => Self::Io,
        }
    }
}

impl From<SerialError> for TransportError {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::Timeout => Self::Timeout,
            _ => Self::Io,
        }
    }
}

/// Names of the serial ports present on this machine.
///
/// # Errors
///
/// Returns an error if the OS port enumeration fails.
pub fn list_ports() -> Result<Vec<String>, SerialError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Open `name` with the link settings: 8N1, no flow control, DTR set, RTS
/// cleared.
pub(crate) fn open_port(
    name: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn SerialPort>, SerialError> {
    let mut port = serialport::new(name, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(timeout)
        .open()?;
    port.write_request_to_send(false)?;
    port.write_data_terminal_ready(true)?;
    Ok(port)
}

/// [`Transport`] over an open serial port.
///
/// Reads are batched: [`Transport::available`] pulls whatever the OS has
/// buffered in one call and `read_byte` serves from that chunk.
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    rx: Vec<u8>,
    pos: usize,
}

impl SerialTransport {
    /// Open `name` for the bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened or configured.
    pub fn open(name: &str, settings: &SerialSettings) -> Result<Self, SerialError> {
        let port = open_port(name, settings.baud_rate, settings.io_timeout)?;
        info!("opened {name} at {} baud", settings.baud_rate);
        Ok(Self::from_port(name, port))
    }

    /// Wrap an already configured port.
    pub fn from_port(name: &str, port: Box<dyn SerialPort>) -> Self {
        Self {
            name: name.to_string(),
            port: Some(port),
            rx: Vec::with_capacity(READ_CHUNK),
            pos: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for SerialTransport {
    fn available(&mut self) -> Result<usize, TransportError> {
        if self.pos < self.rx.len() {
            return Ok(self.rx.len() - self.pos);
        }
        self.rx.clear();
        self.pos = 0;

        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        let ready = port.bytes_to_read().map_err(SerialError::from)? as usize;
        if ready == 0 {
            return Ok(0);
        }
        self.rx.resize(ready.min(READ_CHUNK), 0);
        let n = match port.read(&mut self.rx) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => 0,
            Err(e) => {
                warn!("{}: read failed: {e}", self.name);
                self.rx.clear();
                return Err(TransportError::Io);
            }
        };
        self.rx.truncate(n);
        Ok(n)
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        if self.port.is_none() {
            return Err(TransportError::Closed);
        }
        let byte = *self.rx.get(self.pos).ok_or(TransportError::Io)?;
        self.pos += 1;
        Ok(byte)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port()?;
        port.write_all(bytes).map_err(SerialError::from)?;
        port.flush().map_err(SerialError::from)?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("closed {}", self.name);
        }
        self.rx.clear();
        self.pos = 0;
    }
}

impl core::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}
