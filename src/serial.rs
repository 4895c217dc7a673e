use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};
use serialport::{ClearBuffer, SerialPort};

use crate::LineTransport;

/// Error opening the serial device. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

/// Error sending to or receiving from an open link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("serial I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("serial link is closed")]
    Closed,
}

/// Serial connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    /// How long [`SerialLink::read_line`] waits for a full line.
    pub timeout: Duration,
    /// Wait after opening; most boards reset when the port opens.
    pub settle_delay: Duration,
    /// Pause after each write. Some USB-serial adapters coalesce back-to-back writes.
    pub write_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::from("/dev/ttyACM0"),
            baud_rate: 115_200,
            timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            write_delay: Duration::from_millis(20),
        }
    }
}

/// Byte stream underneath a [`SerialLink`].
///
/// Implemented for real serial ports and for in-memory ports in tests.
pub trait Port: Read + Write {
    /// Upper bound for a single blocking read.
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Drop any bytes received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl Port for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_timeout(timeout).map_err(io::Error::from)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Newline-delimited text link to the board controller.
pub struct SerialLink<P = Box<dyn SerialPort>> {
    port: Option<P>,
    timeout: Duration,
    write_delay: Duration,
    /// Bytes read past the end of the last returned line.
    pending: Vec<u8>,
}

impl SerialLink {
    /// Open the configured device and wait for it to settle.
    pub fn open(config: &SerialConfig) -> Result<Self, ConnectionError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| ConnectionError::Open {
                port: config.port.clone(),
                source,
            })?;
        debug!("opened {} at {} baud", config.port, config.baud_rate);
        Ok(Self::from_port(port, config))
    }
}

impl<P: Port> SerialLink<P> {
    /// Wrap an already open port.
    ///
    /// Sleeps for the settle delay, then discards anything the device sent
    /// while booting. A failed discard is only logged.
    pub fn from_port(mut port: P, config: &SerialConfig) -> Self {
        if !config.settle_delay.is_zero() {
            thread::sleep(config.settle_delay);
        }
        if let Err(e) = port.discard_input() {
            debug!("could not discard serial input: {e}");
        }
        Self {
            port: Some(port),
            timeout: config.timeout,
            write_delay: config.write_delay,
            pending: Vec::new(),
        }
    }

    /// Borrow the underlying port, if still open.
    #[inline]
    pub fn get_ref(&self) -> Option<&P> {
        self.port.as_ref()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Write `line`, newline-terminated, and flush.
    pub fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        if !line.ends_with('\n') {
            bytes.push(b'\n');
        }
        port.write_all(&bytes)?;
        port.flush()?;
        trace!("sent {:?}", line.trim_end());

        if !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }
        Ok(())
    }

    /// Read one line using the configured timeout.
    #[inline]
    pub fn read_line(&mut self) -> Result<String, TransportError> {
        self.read_line_timeout(self.timeout)
    }

    /// Read one line, waiting at most `timeout`.
    ///
    /// Returns the trimmed text. On timeout, whatever arrived so far is
    /// returned, which is the empty string when the device stayed silent.
    /// Bytes that are not valid UTF-8 are dropped.
    pub fn read_line_timeout(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; 64];

        loop {
            if let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=end).collect();
                return Ok(decode(&line));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            port.set_read_timeout(remaining)?;

            match port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let partial = std::mem::take(&mut self.pending);
        Ok(decode(&partial))
    }

    /// Release the port. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                debug!("flush on close failed: {e}");
            }
            debug!("serial link closed");
        }
        self.pending.clear();
    }
}

impl<P: Port> LineTransport for SerialLink<P> {
    type Error = TransportError;

    #[inline]
    fn send_line(&mut self, line: &str) -> Result<(), Self::Error> {
        SerialLink::send_line(self, line)
    }

    #[inline]
    fn read_line(&mut self) -> Result<String, Self::Error> {
        SerialLink::read_line(self)
    }
}

impl<P> std::fmt::Debug for SerialLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("open", &self.port.is_some())
            .field("timeout", &self.timeout)
            .field("write_delay", &self.write_delay)
            .field("pending", &self.pending.len())
            .finish()
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .replace(char::REPLACEMENT_CHARACTER, "")
        .trim()
        .to_owned()
}
