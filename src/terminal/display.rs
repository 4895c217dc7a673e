use std::io::{self, Write};

use shakmaty::{Color, File, Piece, Rank, Role, Square};

use crate::feedback::{BoardFeedback, SquareFeedback};
use crate::rules::Rules;

/// Error type for terminal display operations.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

/// Render the position as an 8×8 grid, White at the bottom, with the
/// selection highlights as ANSI backgrounds.
pub fn render_board(
    w: &mut impl Write,
    position: &impl Rules,
    feedback: &BoardFeedback,
) -> Result<(), DisplayError> {
    writeln!(w, "    a  b  c  d  e  f  g  h")?;
    for rank in Rank::ALL.iter().rev() {
        write!(w, " {} ", rank.char())?;
        for file in File::ALL {
            let square = Square::from_coords(file, *rank);
            let symbol = piece_symbol(position.piece_at(square));
            match background(feedback.get(square)) {
                Some(color) => write!(w, "{color} {symbol} \x1b[0m")?,
                None => write!(w, " {symbol} ")?,
            }
        }
        writeln!(w, " {}", rank.char())?;
    }
    writeln!(w, "    a  b  c  d  e  f  g  h")?;
    w.flush()?;
    Ok(())
}

/// Map a feedback variant to an ANSI background escape.
fn background(feedback: Option<SquareFeedback>) -> Option<&'static str> {
    match feedback? {
        SquareFeedback::Selected => Some("\x1b[44m"),
        SquareFeedback::Destination => Some("\x1b[42m"),
        SquareFeedback::Capture => Some("\x1b[43m"),
        SquareFeedback::Unavailable => Some("\x1b[41m"),
    }
}

fn piece_symbol(piece: Option<Piece>) -> char {
    let Some(piece) = piece else {
        return '·';
    };
    match (piece.role, piece.color) {
        (Role::Pawn, Color::White) => '♙',
        (Role::Knight, Color::White) => '♘',
        (Role::Bishop, Color::White) => '♗',
        (Role::Rook, Color::White) => '♖',
        (Role::Queen, Color::White) => '♕',
        (Role::King, Color::White) => '♔',
        (Role::Pawn, Color::Black) => '♟',
        (Role::Knight, Color::Black) => '♞',
        (Role::Bishop, Color::Black) => '♝',
        (Role::Rook, Color::Black) => '♜',
        (Role::Queen, Color::Black) => '♛',
        (Role::King, Color::Black) => '♚',
    }
}
