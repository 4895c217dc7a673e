use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shakmaty::Move;

use crate::rules::Rules;

/// Picks moves for the computer side.
pub trait Opponent {
    /// Choose a move in `position`.
    ///
    /// Returns `None` only when there is no legal move.
    fn choose_move<P: Rules>(&mut self, position: &P) -> Option<Move>;
}

/// Plays a uniformly random legal move.
#[derive(Debug, Clone)]
pub struct RandomOpponent<R = ThreadRng> {
    rng: R,
}

impl RandomOpponent {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomOpponent {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomOpponent<StdRng> {
    /// Reproducible opponent.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> Opponent for RandomOpponent<R> {
    fn choose_move<P: Rules>(&mut self, position: &P) -> Option<Move> {
        position.legal_moves().choose(&mut self.rng).copied()
    }
}
