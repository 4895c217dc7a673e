//! In-memory stand-ins for the serial device and the rules engine.

use std::collections::VecDeque;

use shakmaty::{Color, Move, Piece, Role, Square};
use thiserror::Error;

use crate::LineTransport;
use crate::rules::{GameResult, Rules};

/// Error injected by [`RecordingTransport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("simulated transport failure")]
pub struct SimulatedFailure;

/// Transport that records every sent line and replays scripted replies.
///
/// An exhausted reply queue behaves like a silent device: `read_line`
/// returns an empty string.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Vec<String>,
    replies: VecDeque<String>,
    fail_sends: bool,
    fail_reads: bool,
}

impl RecordingTransport {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines sent so far, without their newline.
    #[inline]
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Queue a reply for a later `read_line`.
    pub fn push_reply(&mut self, reply: &str) {
        self.replies.push_back(reply.to_owned());
    }

    /// Make subsequent sends fail.
    #[inline]
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Make subsequent reads fail.
    #[inline]
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Forget recorded lines.
    #[inline]
    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl LineTransport for RecordingTransport {
    type Error = SimulatedFailure;

    fn send_line(&mut self, line: &str) -> Result<(), Self::Error> {
        if self.fail_sends {
            return Err(SimulatedFailure);
        }
        self.sent.push(line.trim_end_matches('\n').to_owned());
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, Self::Error> {
        if self.fail_reads {
            return Err(SimulatedFailure);
        }
        Ok(self.replies.pop_front().unwrap_or_default())
    }
}

/// Fixed position with a scripted legal-move set.
///
/// Playing a legal move records it and flips the side to move; the pieces
/// stay where they are. Every position reached counts as new, so scripted
/// games never end by repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRules {
    pieces: Vec<(Square, Piece)>,
    turn: Color,
    moves: Vec<Move>,
    played: Vec<Move>,
    result: Option<GameResult>,
}

impl ScriptedRules {
    pub fn new(turn: Color) -> Self {
        Self {
            pieces: Vec::new(),
            turn,
            moves: Vec::new(),
            played: Vec::new(),
            result: None,
        }
    }

    pub fn with_piece(mut self, square: Square, role: Role, color: Color) -> Self {
        self.pieces.push((square, Piece { role, color }));
        self
    }

    pub fn with_move(mut self, mv: Move) -> Self {
        self.moves.push(mv);
        self
    }

    pub fn with_result(mut self, result: GameResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Moves played to reach this position.
    #[inline]
    pub fn played(&self) -> &[Move] {
        &self.played
    }
}

impl Default for ScriptedRules {
    fn default() -> Self {
        Self::new(Color::White)
    }
}

impl Rules for ScriptedRules {
    #[inline]
    fn turn(&self) -> Color {
        self.turn
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces
            .iter()
            .find(|(sq, _)| *sq == square)
            .map(|(_, piece)| *piece)
    }

    fn legal_moves(&self) -> Vec<Move> {
        if self.result.is_some() {
            return Vec::new();
        }
        self.moves.clone()
    }

    fn play(&self, mv: Move) -> Option<Self> {
        if !self.legal_moves().contains(&mv) {
            return None;
        }
        let mut after = self.clone();
        after.played.push(mv);
        after.turn = !self.turn;
        Some(after)
    }

    #[inline]
    fn result(&self) -> Option<GameResult> {
        self.result
    }

    fn fen(&self) -> String {
        format!("scripted {} {}", self.turn.char(), self.played.len())
    }

    #[inline]
    fn position_key(&self) -> u64 {
        self.played.len() as u64
    }
}
