use shakmaty::Square;

use crate::selection::Selection;

/// Highlight for an individual square while a piece is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquareFeedback {
    /// The selected piece
    Selected,
    /// Legal quiet move destination
    Destination,
    /// Moving here captures an opponent piece
    Capture,
    /// Not reachable by the selected piece
    Unavailable,
}

/// Highlights for the whole board.
///
/// `BoardFeedback` is computed by [`compute_feedback`] from the current
/// [`Selection`] and consumed by the terminal renderer. It is the only
/// thing the presentation layer needs from move entry. With nothing
/// selected the board shows no highlights at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardFeedback {
    squares: Vec<(Square, SquareFeedback)>,
}

impl BoardFeedback {
    /// Create empty feedback (no highlights)
    #[inline]
    pub const fn new() -> Self {
        Self {
            squares: Vec::new(),
        }
    }

    #[inline]
    pub fn squares(&self) -> &[(Square, SquareFeedback)] {
        &self.squares
    }

    /// Get feedback for a specific square, if any
    #[inline]
    pub fn get(&self, square: Square) -> Option<SquareFeedback> {
        self.squares
            .iter()
            .find(|(sq, _)| *sq == square)
            .map(|(_, feedback)| *feedback)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}

impl From<Vec<(Square, SquareFeedback)>> for BoardFeedback {
    fn from(squares: Vec<(Square, SquareFeedback)>) -> Self {
        Self { squares }
    }
}

/// Compute highlights for the current selection.
///
/// Capture beats destination, so a square that is both only shows as a
/// capture. Every square the selected piece cannot reach is marked
/// unavailable.
pub fn compute_feedback(selection: &Selection) -> BoardFeedback {
    let Selection::Selecting {
        square: selected,
        legal_targets,
        capture_targets,
    } = selection
    else {
        return BoardFeedback::new();
    };

    Square::ALL
        .into_iter()
        .map(|square| {
            let feedback = if square == *selected {
                SquareFeedback::Selected
            } else if capture_targets.contains(square) {
                SquareFeedback::Capture
            } else if legal_targets.contains(square) {
                SquareFeedback::Destination
            } else {
                SquareFeedback::Unavailable
            };
            (square, feedback)
        })
        .collect::<Vec<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::load;
    use crate::selection::MoveEntry;
    use shakmaty::{Bitboard, Chess};

    fn selecting(position: &Chess, square: Square) -> Selection {
        let mut entry = MoveEntry::new();
        entry.click(position, square);
        entry.selection().clone()
    }

    #[test]
    fn no_feedback_when_idle() {
        let feedback = compute_feedback(&Selection::Idle);

        assert!(feedback.is_empty());
        assert_eq!(feedback.get(Square::E2), None);
    }

    #[test]
    fn selected_pawn_shows_destinations() {
        let feedback = compute_feedback(&selecting(&Chess::default(), Square::E2));

        assert_eq!(feedback.get(Square::E2), Some(SquareFeedback::Selected));
        assert_eq!(feedback.get(Square::E3), Some(SquareFeedback::Destination));
        assert_eq!(feedback.get(Square::E4), Some(SquareFeedback::Destination));
        assert_eq!(feedback.get(Square::D2), Some(SquareFeedback::Unavailable));
        assert_eq!(feedback.get(Square::E5), Some(SquareFeedback::Unavailable));
        assert_eq!(feedback.squares().len(), 64);
    }

    #[test]
    fn capture_takes_precedence() {
        let pos = load("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1")
            .expect("valid position");

        let feedback = compute_feedback(&selecting(&pos, Square::E4));

        assert_eq!(feedback.get(Square::E4), Some(SquareFeedback::Selected));
        assert_eq!(feedback.get(Square::D5), Some(SquareFeedback::Capture));
        assert_eq!(feedback.get(Square::E5), Some(SquareFeedback::Destination));
    }

    #[test]
    fn handcrafted_selection() {
        let selection = Selection::Selecting {
            square: Square::A1,
            legal_targets: Bitboard::from(Square::A2) | Bitboard::from(Square::B1),
            capture_targets: Bitboard::from(Square::B1),
        };

        let feedback = compute_feedback(&selection);

        assert_eq!(feedback.get(Square::A1), Some(SquareFeedback::Selected));
        assert_eq!(feedback.get(Square::A2), Some(SquareFeedback::Destination));
        assert_eq!(feedback.get(Square::B1), Some(SquareFeedback::Capture));
        assert_eq!(feedback.get(Square::H8), Some(SquareFeedback::Unavailable));
    }
}
