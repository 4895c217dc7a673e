use log::debug;
use shakmaty::{Bitboard, CastlingMode, Color, Move, Rank, Role, Square, uci::UciMove};

use crate::rules::Rules;

/// Current move-entry selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Nothing selected.
    #[default]
    Idle,
    /// One of our pieces is selected.
    ///
    /// `capture_targets` is always a subset of `legal_targets`.
    Selecting {
        square: Square,
        legal_targets: Bitboard,
        capture_targets: Bitboard,
    },
}

impl Selection {
    /// The selected square, if any.
    #[inline]
    pub fn square(&self) -> Option<Square> {
        match self {
            Selection::Idle => None,
            Selection::Selecting { square, .. } => Some(*square),
        }
    }

    #[inline]
    pub fn legal_targets(&self) -> Bitboard {
        match self {
            Selection::Idle => Bitboard::EMPTY,
            Selection::Selecting { legal_targets, .. } => *legal_targets,
        }
    }

    #[inline]
    pub fn capture_targets(&self) -> Bitboard {
        match self {
            Selection::Idle => Bitboard::EMPTY,
            Selection::Selecting {
                capture_targets, ..
            } => *capture_targets,
        }
    }
}

/// Result of feeding one square click into [`MoveEntry`].
#[derive(Debug, Clone)]
pub enum Click<P> {
    /// Empty square or opponent piece while idle. Nothing changed.
    Ignored,
    /// A piece was selected.
    Selected,
    /// The selected square was clicked again.
    Deselected,
    /// The second click did not form a legal move. Selection dropped.
    Cancelled,
    /// A move was applied, producing the new position.
    Moved { mv: Move, position: P },
}

/// Two-click move entry: click a piece, then click where it goes.
#[derive(Debug, Clone, Default)]
pub struct MoveEntry {
    selection: Selection,
}

impl MoveEntry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Drop any selection.
    #[inline]
    pub fn reset(&mut self) {
        self.selection = Selection::Idle;
    }

    /// Process a click on `square` against `position`.
    ///
    /// The position itself is never modified; an applied move is returned
    /// in [`Click::Moved`] for the caller to adopt.
    pub fn click<P: Rules>(&mut self, position: &P, square: Square) -> Click<P> {
        match std::mem::take(&mut self.selection) {
            Selection::Idle => self.select(position, square),
            Selection::Selecting { square: from, .. } if from == square => {
                debug!("deselected {square}");
                Click::Deselected
            }
            Selection::Selecting { square: from, .. } => {
                match find_move(position, from, square).and_then(|mv| {
                    position.play(mv).map(|after| (mv, after))
                }) {
                    Some((mv, after)) => {
                        debug!("applied {from}{square}");
                        Click::Moved {
                            mv,
                            position: after,
                        }
                    }
                    None => {
                        debug!("{from}{square} is not legal, selection dropped");
                        Click::Cancelled
                    }
                }
            }
        }
    }

    fn select<P: Rules>(&mut self, position: &P, square: Square) -> Click<P> {
        match position.piece_at(square) {
            Some(piece) if piece.color == position.turn() => {}
            _ => return Click::Ignored,
        }

        let mut legal_targets = Bitboard::EMPTY;
        let mut capture_targets = Bitboard::EMPTY;
        for mv in position.legal_moves() {
            if mv.from() != Some(square) {
                continue;
            }
            let to = destination(&mv);
            legal_targets.add(to);
            if mv.is_capture() {
                capture_targets.add(to);
            }
        }

        debug!("selected {square}, {} targets", legal_targets.count());
        self.selection = Selection::Selecting {
            square,
            legal_targets,
            capture_targets,
        };
        Click::Selected
    }
}

/// Square the player clicks to make `mv`.
///
/// Castling is entered by clicking the king's destination, not the rook.
fn destination(mv: &Move) -> Square {
    match mv.to_uci(CastlingMode::Standard) {
        UciMove::Normal { to, .. } => to,
        _ => mv.to(),
    }
}

/// Find the legal move for a `from` → `to` click pair.
///
/// A pawn reaching its last rank always promotes to a queen. Castling also
/// accepts the rook's square as the second click.
fn find_move<P: Rules>(position: &P, from: Square, to: Square) -> Option<Move> {
    let moves = position.legal_moves();
    let matching = |promotion: Option<Role>| {
        moves
            .iter()
            .find(|mv| {
                mv.from() == Some(from)
                    && (destination(mv) == to || (mv.is_castle() && mv.to() == to))
                    && mv.promotion() == promotion
            })
            .copied()
    };

    matching(None).or_else(|| {
        if is_promotion_square(position, from, to) {
            matching(Some(Role::Queen))
        } else {
            None
        }
    })
}

fn is_promotion_square<P: Rules>(position: &P, from: Square, to: Square) -> bool {
    let Some(piece) = position.piece_at(from) else {
        return false;
    };
    let last_rank = match piece.color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    };
    piece.role == Role::Pawn && to.rank() == last_rank
}
