//! Serial port handling
//!
//! The sniffer only ever reads from the bus. Bytes are pulled one at a time
//! through [`ByteSource`], which lets the session loop run against a real
//! port or a scripted stream in tests.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::{self, Read};
use std::time::Duration;

use super::{ProtocolError, DEFAULT_BAUD_RATE, POLL_INTERVAL_MS};

/// A stream of bus bytes
pub trait ByteSource {
    /// Wait up to `timeout` for the next byte
    ///
    /// `Ok(None)` means nothing arrived in time.
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, ProtocolError>;
}

/// [`ByteSource`] backed by a serial port
pub struct SerialByteSource {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialByteSource {
    /// Wrap an open port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        let timeout = port.timeout();
        Self { port, timeout }
    }

    /// Name of the underlying port, if the driver reports one
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl ByteSource for SerialByteSource {
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, ProtocolError> {
        if timeout != self.timeout {
            self.port
                .set_timeout(timeout)
                .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
            self.timeout = timeout;
        }

        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(ProtocolError::IoError(e)),
        }
    }
}

impl Drop for SerialByteSource {
    fn drop(&mut self) {
        tracing::debug!(port = ?self.port.name(), "closing serial port");
    }
}

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let product = match info.port_type {
            SerialPortType::UsbPort(usb_info) => usb_info.product,
            _ => None,
        };

        Self {
            name: info.port_name,
            product,
        }
    }
}

/// Device prefixes used by USB serial adapters
const USB_PREFIXES: [&str; 2] = ["ttyACM", "ttyUSB"];

/// Sort key placing ttyACM*, ttyUSB*, then ttyS*, then everything else, numerically
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in USB_PREFIXES.iter().chain(["ttyS"].iter()).enumerate() {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank as u8, num, basename.to_string());
        }
    }
    (3, 0, basename.to_string())
}

/// List available serial ports in a stable order
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // USB adapters sometimes go unreported by the enumeration API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if USB_PREFIXES.iter().any(|prefix| fname.starts_with(prefix)) {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone()).or_insert_with(|| PortInfo {
                        name: full,
                        product: None,
                    });
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Open a port for passive capture (8N1, no flow control)
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<SerialByteSource, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

    let port = serialport::new(name, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(POLL_INTERVAL_MS))
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(name.to_string()),
            serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
                ProtocolError::PortNotFound(name.to_string())
            }
            _ => ProtocolError::SerialError(e.to_string()),
        })?;

    tracing::info!(port = name, baud, "opened serial port");
    Ok(SerialByteSource::new(port))
}
