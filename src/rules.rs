use std::fmt;

use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, Color, EnPassantMode, Move, Piece, Position, Square};

use crate::fen;

/// Halfmove clock value at which the seventy-five-move rule ends the game.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game.
const FIVEFOLD: usize = 5;

/// The capability set the game needs from a chess rules engine.
///
/// Everything above this trait (move entry, session flow, opponent) only
/// talks to the position through these operations, so a scripted stub can
/// stand in for [`Chess`] in tests.
pub trait Rules: Clone + Default {
    /// Side to move.
    fn turn(&self) -> Color;

    /// Piece standing on `square`, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// All legal moves in the position.
    fn legal_moves(&self) -> Vec<Move>;

    /// Returns the position after `mv`, or `None` if `mv` is not legal here.
    fn play(&self, mv: Move) -> Option<Self>;

    /// Final result, if the game has ended.
    fn result(&self) -> Option<GameResult>;

    /// Six-field FEN of the position.
    fn fen(&self) -> String;

    /// Hash identifying the position for repetition counting.
    ///
    /// Equal keys mean same placement, side to move, castling rights and
    /// legal en passant square.
    fn position_key(&self) -> u64;

    #[inline]
    fn is_game_over(&self) -> bool {
        self.result().is_some()
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::SeventyFiveMoves => "seventy-five-move rule",
            Termination::FivefoldRepetition => "fivefold repetition",
        })
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameResult {
    /// `None` for a draw.
    pub winner: Option<Color>,
    pub termination: Termination,
}

impl GameResult {
    /// Score in PGN notation.
    pub fn score(&self) -> &'static str {
        match self.winner {
            Some(Color::White) => "1-0",
            Some(Color::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.score(), self.termination)
    }
}

/// Positions reached since the last irreversible move.
///
/// A position only tracks its own halfmove clock, so repetition has to be
/// counted by whoever plays the moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    keys: Vec<u64>,
}

impl History {
    /// History holding only `position`.
    pub fn new<P: Rules>(position: &P) -> Self {
        Self {
            keys: vec![position.position_key()],
        }
    }

    /// Record `position`, reached by playing `mv`.
    pub fn push<P: Rules>(&mut self, mv: Move, position: &P) {
        // Pawn moves and captures can never be undone
        if mv.is_zeroing() {
            self.keys.clear();
        }
        self.keys.push(position.position_key());
    }

    /// Times the current position has occurred.
    pub fn repetitions(&self) -> usize {
        match self.keys.last() {
            Some(current) => self.keys.iter().filter(|key| *key == current).count(),
            None => 0,
        }
    }

    /// Draw by fivefold repetition, if the current position reached it.
    pub fn result(&self) -> Option<GameResult> {
        (self.repetitions() >= FIVEFOLD).then_some(GameResult {
            winner: None,
            termination: Termination::FivefoldRepetition,
        })
    }
}

impl Rules for Chess {
    #[inline]
    fn turn(&self) -> Color {
        Position::turn(self)
    }

    #[inline]
    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board().piece_at(square)
    }

    fn legal_moves(&self) -> Vec<Move> {
        Position::legal_moves(self).into_iter().collect()
    }

    fn play(&self, mv: Move) -> Option<Self> {
        if !Position::legal_moves(self).contains(&mv) {
            return None;
        }
        let mut after = self.clone();
        after.play_unchecked(mv);
        Some(after)
    }

    fn result(&self) -> Option<GameResult> {
        let termination = if self.is_checkmate() {
            Termination::Checkmate
        } else if self.is_stalemate() {
            Termination::Stalemate
        } else if self.is_insufficient_material() {
            Termination::InsufficientMaterial
        } else if self.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
            Termination::SeventyFiveMoves
        } else {
            return None;
        };

        let winner = match termination {
            // The side to move is the one that got mated
            Termination::Checkmate => Some(!Position::turn(self)),
            _ => None,
        };
        Some(GameResult {
            winner,
            termination,
        })
    }

    #[inline]
    fn fen(&self) -> String {
        fen::encode(self)
    }

    #[inline]
    fn position_key(&self) -> u64 {
        self.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
    }
}
