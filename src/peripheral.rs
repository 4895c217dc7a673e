use std::fmt;

use log::debug;
use shakmaty::{Bitboard, Square};

use crate::LineTransport;

/// One line of the board controller protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Full FEN of the position to light up.
    Position(String),
    /// Mark squares, e.g. the legal targets of a selected piece.
    Highlight(Vec<Square>),
    /// Remove all marks.
    ClearHighlight,
}

impl Command {
    /// Highlight every square in `squares`, a1 first.
    pub fn highlight(squares: Bitboard) -> Self {
        Command::Highlight(squares.into_iter().collect())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Position(fen) => f.write_str(fen),
            Command::Highlight(squares) => {
                f.write_str("HIGHLIGHT:")?;
                for (i, square) in squares.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{square}")?;
                }
                Ok(())
            }
            Command::ClearHighlight => f.write_str("CLEARHIGHLIGHT"),
        }
    }
}

/// The LED board on the other end of a [`LineTransport`].
///
/// Replies are opaque diagnostics ("OK", "ERR ...") and are never
/// interpreted.
#[derive(Debug)]
pub struct Peripheral<T> {
    transport: T,
}

impl<T: LineTransport> Peripheral<T> {
    #[inline]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send one command without waiting for a reply.
    pub fn send(&mut self, command: &Command) -> Result<(), T::Error> {
        let line = command.to_string();
        debug!("-> {line}");
        self.transport.send_line(&line)
    }

    /// Read the device's reply to the last command, if it sent one.
    pub fn reply(&mut self) -> Result<Option<String>, T::Error> {
        let line = self.transport.read_line()?;
        Ok(if line.is_empty() { None } else { Some(line) })
    }

    /// Send a position and collect the reply.
    pub fn show_position(&mut self, fen: &str) -> Result<Option<String>, T::Error> {
        self.send(&Command::Position(fen.to_owned()))?;
        self.reply()
    }
}
