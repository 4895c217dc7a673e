use std::io::{self, BufRead, Write};

use clap::ValueEnum;
use shakmaty::{Chess, Move, Square};

use super::display::{DisplayError, render_board};
use crate::LineTransport;
use crate::fen;
use crate::opponent::Opponent;
use crate::rules::Rules;
use crate::session::{Event, Mode, Session};

const HELP: &str = "Commands: <square> (click) | move <uci|san> | mode <two-player|computer> | \
                    load <fen|startpos> | r (reset) | p (refresh) | q (quit)";

/// Clears the screen and moves cursor to top-left.
#[inline]
fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    write!(w, "\x1B[2J\x1B[H")
}

/// Runs the interactive board on stdin/stdout.
///
/// Typing a square name is the same as clicking it on a board.
pub fn run_interactive_terminal<T, O>(session: &mut Session<Chess, T, O>) -> Result<(), DisplayError>
where
    T: LineTransport,
    O: Opponent,
{
    let stdin = io::stdin();
    run_with(session, stdin.lock(), &mut io::stdout())
}

/// Command loop over arbitrary input and output.
pub fn run_with<T, O>(
    session: &mut Session<Chess, T, O>,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<(), DisplayError>
where
    T: LineTransport,
    O: Opponent,
{
    if let Some(mv) = session.start() {
        writeln!(output, "Computer played {}", describe(&mv))?;
    }
    draw_interface(output, session)?;

    for line in input.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        let message = match command {
            "q" | "quit" => break,
            "p" => None,
            "r" => {
                let reply = session.reset();
                Some(with_reply("Reset to the start position".to_owned(), reply))
            }
            "move" => match parts.next() {
                Some(text) => Some(match session.play_notation(text) {
                    Ok(turn) => report_turn(turn.played, turn.reply, session),
                    Err(e) => format!("Rejected: {e}"),
                }),
                None => Some("Usage: move <uci|san>".to_owned()),
            },
            "mode" => match parts.next().map(|m| Mode::from_str(m, true)) {
                Some(Ok(mode)) => {
                    let reply = session.set_mode(mode);
                    Some(with_reply(format!("Mode: {mode:?}"), reply))
                }
                Some(Err(e)) => Some(format!("Invalid mode: {e}")),
                None => Some("Usage: mode <two-player|computer>".to_owned()),
            },
            "load" => {
                let rest = line.trim_start()[command.len()..].trim();
                let text = if rest == "startpos" {
                    fen::encode(&Chess::default())
                } else {
                    rest.to_owned()
                };
                Some(match fen::load(&text) {
                    Ok(position) => {
                        let reply = session.load(position);
                        with_reply("Position loaded from FEN".to_owned(), reply)
                    }
                    Err(e) => format!("Could not load: {e}"),
                })
            }
            other => match other.parse::<Square>() {
                Ok(square) => click(session, square),
                Err(_) => Some(format!("Unknown command '{other}'")),
            },
        };

        clear_screen(output)?;
        draw_interface(output, session)?;
        if let Some(message) = message {
            writeln!(output, "{message}")?;
        }
        output.flush()?;
    }
    Ok(())
}

fn click<T, O>(session: &mut Session<Chess, T, O>, square: Square) -> Option<String>
where
    T: LineTransport,
    O: Opponent,
{
    match session.click(square) {
        Event::Ignored if session.is_computer_turn() => Some("Waiting for the computer".to_owned()),
        Event::Ignored if session.result().is_some() => Some("The game is over".to_owned()),
        Event::Ignored | Event::Selected | Event::Deselected => None,
        Event::Cancelled => Some("Selection cleared".to_owned()),
        Event::Played(turn) => Some(report_turn(turn.played, turn.reply, session)),
    }
}

fn report_turn<T, O>(played: Move, reply: Option<Move>, session: &Session<Chess, T, O>) -> String
where
    T: LineTransport,
    O: Opponent,
{
    let mut message = format!("Played {}", describe(&played));
    if let Some(reply) = reply {
        message.push_str(&format!(", computer answered {}", describe(&reply)));
    }
    if let Some(result) = session.result() {
        message.push_str(&format!("\nGame over: {result}"));
    }
    message
}

fn with_reply(message: String, reply: Option<Move>) -> String {
    match reply {
        Some(mv) => format!("{message}, computer played {}", describe(&mv)),
        None => message,
    }
}

fn describe(mv: &Move) -> String {
    mv.to_uci(shakmaty::CastlingMode::Standard).to_string()
}

/// Draws help text, the board and the game status.
fn draw_interface<T, O>(w: &mut impl Write, session: &Session<Chess, T, O>) -> Result<(), DisplayError>
where
    T: LineTransport,
    O: Opponent,
{
    writeln!(w, "♟️  FEN Link")?;
    writeln!(w)?;
    writeln!(w, "{HELP}")?;
    writeln!(w)?;
    render_board(w, session.position(), &session.feedback())?;
    writeln!(
        w,
        "Mode: {:?} | To move: {:?} | FEN: {}",
        session.mode(),
        session.position().turn(),
        session.position().fen()
    )?;
    Ok(())
}
