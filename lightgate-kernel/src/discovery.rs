//! Serial port discovery
//!
//! Enumerates the serial ports the OS knows about and picks the first one
//! whose description contains a device signature ("Arduino", "CH340", ...).
//! Enumeration order is platform-dependent, so with several matching boards
//! the pick is not deterministic.

use crate::error::GateError;
use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, info, warn};

/// One enumerated serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    /// OS identifier passed to `serialport::new` ("/dev/ttyUSB0", "COM3").
    pub device: String,
    /// Human-readable name; "n/a" when the OS has none.
    pub description: String,
}

impl PortCandidate {
    pub fn new(device: impl Into<String>, description: impl Into<String>) -> Self {
        Self { device: device.into(), description: description.into() }
    }

    fn matches(&self, signatures: &[String]) -> bool {
        signatures.iter().any(|sig| self.description.contains(sig.as_str()))
    }
}

impl From<&SerialPortInfo> for PortCandidate {
    fn from(info: &SerialPortInfo) -> Self {
        let description = match &info.port_type {
            SerialPortType::UsbPort(usb) => usb
                .product
                .clone()
                .or_else(|| usb.manufacturer.clone())
                .unwrap_or_else(|| "n/a".to_string()),
            _ => "n/a".to_string(),
        };
        Self::new(info.port_name.clone(), description)
    }
}

/// First port whose description contains one of `signatures`.
pub fn find_device_port<'a>(
    ports: &'a [PortCandidate],
    signatures: &[String],
) -> Option<&'a PortCandidate> {
    ports.iter().find(|p| p.matches(signatures))
}

pub fn list_ports() -> Result<Vec<PortCandidate>, GateError> {
    let ports = serialport::available_ports().map_err(GateError::Enumerate)?;
    Ok(ports.iter().map(PortCandidate::from).collect())
}

/// Enumerates and selects. Enumeration failures count as "not found".
pub fn discover(signatures: &[String]) -> Result<PortCandidate, GateError> {
    let ports = match list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!(error = %e, "serial enumeration failed");
            Vec::new()
        }
    };
    for p in &ports {
        debug!(device = %p.device, description = %p.description, "serial port");
    }

    match find_device_port(&ports, signatures) {
        Some(port) => {
            info!(device = %port.device, description = %port.description, "device port found");
            Ok(port.clone())
        }
        None => Err(GateError::DeviceNotFound(signatures.to_vec())),
    }
}
