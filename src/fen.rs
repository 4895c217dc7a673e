use shakmaty::{CastlingMode, Chess, EnPassantMode, fen::Fen, fen::ParseFenError};

/// Error when loading a position from FEN text.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid FEN: {0}")]
    Parse(#[from] ParseFenError),

    #[error("illegal position: {0}")]
    Setup(String),
}

/// Encode a position as a six-field FEN line.
///
/// The en passant square is only written when an en passant capture is
/// actually legal, so a double pawn push with no enemy pawn beside it
/// still yields `-`.
pub fn encode(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// Parse FEN text into a playable position.
pub fn load(text: &str) -> Result<Chess, LoadError> {
    text.trim()
        .parse::<Fen>()?
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| LoadError::Setup(e.to_string()))
}
