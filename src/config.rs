use std::time::Duration;

use clap::Parser;

use crate::serial::SerialConfig;
use crate::session::Mode;

/// Mirror a chess game onto an LED chessboard over a serial line.
#[derive(Debug, Clone, Parser)]
#[command(name = "fen-link", version, about)]
pub struct Config {
    /// Serial device of the board controller, e.g. /dev/ttyACM0 or COM3
    #[arg(short, long)]
    pub port: String,

    #[arg(short, long, default_value_t = 115_200)]
    pub baud: u32,

    /// How long to wait for the board's reply line
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Wait after opening the port while the controller resets
    #[arg(long, default_value_t = 2000)]
    pub settle_ms: u64,

    /// Pause after each line written
    #[arg(long, default_value_t = 20)]
    pub write_delay_ms: u64,

    #[arg(short, long, value_enum, default_value_t = Mode::TwoPlayer)]
    pub mode: Mode,

    /// Also send HIGHLIGHT/CLEARHIGHLIGHT lines for the selected piece
    #[arg(long)]
    pub highlights: bool,

    /// Start from this position instead of the standard one
    #[arg(long)]
    pub fen: Option<String>,

    /// Seed for the computer opponent
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Config {
    /// Serial settings for [`crate::serial::SerialLink::open`].
    pub fn serial(&self) -> SerialConfig {
        SerialConfig {
            port: self.port.clone(),
            baud_rate: self.baud,
            timeout: Duration::from_millis(self.timeout_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            write_delay: Duration::from_millis(self.write_delay_ms),
        }
    }
}
