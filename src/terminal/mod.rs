mod display;
mod repl;

pub use display::{DisplayError, render_board};
pub use repl::{run_interactive_terminal, run_with};
