pub mod config;
pub mod feedback;
pub mod fen;
pub mod mock;
pub mod opponent;
pub mod peripheral;
pub mod rules;
pub mod selection;
pub mod serial;
pub mod session;
pub mod terminal;

/// Trait for a line-oriented link to the board controller.
///
/// Abstracts over the serial port and in-memory transports, providing a
/// uniform interface for [`peripheral::Peripheral`]. One line is one
/// message; implementations add and strip the newline themselves.
pub trait LineTransport {
    /// Error type for send/receive failures after the link is open.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Send one line, newline-terminated on the wire.
    fn send_line(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Read one line without its terminator.
    ///
    /// Returns an empty string when nothing arrived in time.
    fn read_line(&mut self) -> Result<String, Self::Error>;
}
