/// Errors raised by the serial side of the gate.
///
/// None of these ever reach an HTTP client: the worst visible outcome is a
/// status light that stays "not ready".
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("no serial port matches signatures {0:?}")]
    DeviceNotFound(Vec<String>),

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("failed to open {device} at {baud_rate} baud: {source}")]
    Open {
        device: String,
        baud_rate: u32,
        #[source]
        source: serialport::Error,
    },

    #[error("serial read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("frame is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("serial link closed by device")]
    Disconnected,
}

impl GateError {
    /// True when the link cannot deliver anything anymore.
    pub fn is_link_lost(&self) -> bool {
        matches!(self, GateError::Disconnected)
    }
}
