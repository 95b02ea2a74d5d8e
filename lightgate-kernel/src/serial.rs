/**
 * SERIAL CONNECTOR - Opening the status-light board
 *
 * Finds the board through `discovery`, opens it at the configured baud rate
 * with a bounded read timeout, then waits for the board to finish its reset
 * before any line is trusted.
 *
 * The board prints one word per line. `SerialLineReader` hands back one
 * newline-terminated frame per call, or the partial bytes received before
 * the read timeout (often empty). End of stream or a broken pipe means the
 * board is gone.
 *
 * Absence or open failure is logged and reported as `None`; the server still
 * starts and the light simply stays "not ready".
 */

use crate::config::SerialConf;
use crate::discovery::{self, PortCandidate};
use crate::error::GateError;
use serialport::SerialPort;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use tracing::{error, info};

/// Source of raw line frames for the status monitor.
pub trait LineSource: Send + 'static {
    /// Blocks for at most the read timeout.
    fn read_frame(&mut self) -> Result<Vec<u8>, GateError>;
}

pub struct SerialLineReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

/// The open connection to the board.
pub type SerialLink = SerialLineReader<Box<dyn SerialPort>>;

impl<R: Read> SerialLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }
}

impl<R: Read + Send + 'static> LineSource for SerialLineReader<R> {
    fn read_frame(&mut self) -> Result<Vec<u8>, GateError> {
        // read_until keeps what it consumed in `pending` even when it errors
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Err(GateError::Disconnected),
            Ok(_) => Ok(std::mem::take(&mut self.pending)),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Ok(std::mem::take(&mut self.pending))
            }
            // an unplugged tty reads as EPIPE / ENOTCONN, never as EOF
            Err(e) if is_unplugged(&e) => {
                self.pending.clear();
                Err(GateError::Disconnected)
            }
            Err(e) => {
                self.pending.clear();
                Err(GateError::Read(e))
            }
        }
    }
}

fn is_unplugged(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe | ErrorKind::NotConnected | ErrorKind::UnexpectedEof
    )
}

pub fn open_link(port: &PortCandidate, conf: &SerialConf) -> Result<SerialLink, GateError> {
    let handle = serialport::new(&port.device, conf.baud_rate)
        .timeout(conf.read_timeout())
        .open()
        .map_err(|source| GateError::Open {
            device: port.device.clone(),
            baud_rate: conf.baud_rate,
            source,
        })?;

    std::thread::sleep(conf.settle_delay());
    Ok(SerialLineReader::new(handle))
}

/// Discover + open. Blocking; call it from `spawn_blocking` inside tokio.
pub fn connect(conf: &SerialConf) -> Option<(PortCandidate, SerialLink)> {
    let port = match discovery::discover(&conf.signatures) {
        Ok(port) => port,
        Err(e) => {
            error!(error = %e, "status light device not found");
            return None;
        }
    };

    match open_link(&port, conf) {
        Ok(link) => {
            info!(device = %port.device, baud = conf.baud_rate, "connected to status light");
            Some((port, link))
        }
        Err(e) => {
            error!(error = %e, "serial connection failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, Cursor};

    /// Replays chunks (data or errors), then end of stream.
    struct ChunkedReader {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ChunkedReader {
        fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
            Self { chunks: chunks.into() }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.chunks.push_front(Ok(data[n..].to_vec()));
                    }
                    Ok(n)
                }
            }
        }
    }

    fn timeout() -> io::Error {
        io::Error::new(ErrorKind::TimedOut, "Operation timed out")
    }

    #[test]
    fn test_frames_split_on_newline() {
        let mut reader = SerialLineReader::new(Cursor::new(b"GREEN\r\nRED\n".to_vec()));
        assert_eq!(reader.read_frame().unwrap(), b"GREEN\r\n");
        assert_eq!(reader.read_frame().unwrap(), b"RED\n");
        assert!(reader.read_frame().unwrap_err().is_link_lost());
    }

    #[test]
    fn test_timeout_returns_what_arrived() {
        let mut reader = SerialLineReader::new(ChunkedReader::new(vec![
            Err(timeout()),
            Ok(b"GRE".to_vec()),
            Err(timeout()),
            Ok(b"EN\n".to_vec()),
        ]));
        assert_eq!(reader.read_frame().unwrap(), b"");
        assert_eq!(reader.read_frame().unwrap(), b"GRE");
        assert_eq!(reader.read_frame().unwrap(), b"EN\n");
    }

    #[test]
    fn test_trailing_bytes_before_eof() {
        let mut reader = SerialLineReader::new(Cursor::new(b"RED".to_vec()));
        assert_eq!(reader.read_frame().unwrap(), b"RED");
        assert!(matches!(reader.read_frame(), Err(GateError::Disconnected)));
    }

    #[test]
    fn test_io_error_is_read_failure() {
        let mut reader = SerialLineReader::new(ChunkedReader::new(vec![
            Ok(b"GR".to_vec()),
            Err(io::Error::new(ErrorKind::Other, "Input/output error")),
            Ok(b"RED\n".to_vec()),
        ]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, GateError::Read(_)));
        assert!(!err.is_link_lost());
        // the half frame before the error is dropped
        assert_eq!(reader.read_frame().unwrap(), b"RED\n");
    }

    #[test]
    fn test_unplugged_device_is_link_lost() {
        let mut reader = SerialLineReader::new(ChunkedReader::new(vec![
            Ok(b"GREEN\n".to_vec()),
            Ok(b"RE".to_vec()),
            Err(io::Error::new(ErrorKind::BrokenPipe, "Input/output error")),
        ]));
        assert_eq!(reader.read_frame().unwrap(), b"GREEN\n");
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, GateError::Disconnected));
        assert!(err.is_link_lost());

        let mut reader = SerialLineReader::new(ChunkedReader::new(vec![Err(io::Error::new(
            ErrorKind::NotConnected,
            "Transport endpoint is not connected",
        ))]));
        assert!(reader.read_frame().unwrap_err().is_link_lost());
    }

    #[test]
    fn test_open_missing_device_fails() {
        let port = PortCandidate::new("/dev/lightgate-does-not-exist", "Arduino Uno");
        let conf = SerialConf { settle_ms: 0, ..SerialConf::default() };
        match open_link(&port, &conf) {
            Err(GateError::Open { device, baud_rate, .. }) => {
                assert_eq!(device, "/dev/lightgate-does-not-exist");
                assert_eq!(baud_rate, 9600);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opened a port that does not exist"),
        }
    }
}
