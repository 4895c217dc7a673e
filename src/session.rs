use log::{debug, info, warn};
use shakmaty::{Chess, Color, Move, Square, san::San, uci::UciMove};

use crate::LineTransport;
use crate::feedback::{BoardFeedback, compute_feedback};
use crate::opponent::Opponent;
use crate::peripheral::{Command, Peripheral};
use crate::rules::{GameResult, History, Rules};
use crate::selection::{Click, MoveEntry, Selection};

/// The computer always takes Black; the human plays White.
pub const COMPUTER_COLOR: Color = Color::Black;

/// Who plays the moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Mode {
    /// Both sides are entered by hand.
    #[default]
    TwoPlayer,
    /// Human plays White against the computer.
    Computer,
}

/// A completed human move and what followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub played: Move,
    /// Computer answer, in [`Mode::Computer`].
    pub reply: Option<Move>,
    /// Set once the game has ended.
    pub result: Option<GameResult>,
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Ignored,
    Selected,
    Deselected,
    Cancelled,
    Played(Turn),
}

/// Error for moves typed as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("'{0}' is neither UCI nor SAN")]
    Unparseable(String),

    #[error("'{0}' is not legal here")]
    Illegal(String),

    #[error("the game is over")]
    GameOver,

    #[error("waiting for the computer")]
    NotYourTurn,
}

/// One game mirrored to the LED board.
///
/// Owns the position, the move entry state and the device link. Every
/// applied move, human or computer, sends exactly one FEN line. Transport
/// failures are logged and never stop the game.
#[derive(Debug)]
pub struct Session<P, T, O> {
    position: P,
    history: History,
    entry: MoveEntry,
    mode: Mode,
    peripheral: Peripheral<T>,
    opponent: O,
    highlights: bool,
    highlighted: bool,
}

impl<P, T, O> Session<P, T, O>
where
    P: Rules,
    T: LineTransport,
    O: Opponent,
{
    /// Create a session. Nothing is sent until [`Session::start`].
    pub fn new(position: P, transport: T, opponent: O) -> Self {
        Self {
            history: History::new(&position),
            position,
            entry: MoveEntry::new(),
            mode: Mode::default(),
            peripheral: Peripheral::new(transport),
            opponent,
            highlights: false,
            highlighted: false,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Also send `HIGHLIGHT` lines for the selected piece.
    pub fn with_highlights(mut self, enabled: bool) -> Self {
        self.highlights = enabled;
        self
    }

    #[inline]
    pub fn position(&self) -> &P {
        &self.position
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        self.entry.selection()
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn peripheral(&self) -> &Peripheral<T> {
        &self.peripheral
    }

    #[inline]
    pub fn peripheral_mut(&mut self) -> &mut Peripheral<T> {
        &mut self.peripheral
    }

    /// Final result, including draws by fivefold repetition.
    pub fn result(&self) -> Option<GameResult> {
        self.position.result().or_else(|| self.history.result())
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.result().is_some()
    }

    /// Highlights for the presentation layer.
    #[inline]
    pub fn feedback(&self) -> BoardFeedback {
        compute_feedback(self.entry.selection())
    }

    /// True while input is waiting on the computer.
    pub fn is_computer_turn(&self) -> bool {
        self.mode == Mode::Computer && self.position.turn() == COMPUTER_COLOR
    }

    /// Send the opening position. If the computer is to move, it moves.
    pub fn start(&mut self) -> Option<Move> {
        self.sync();
        self.computer_move()
    }

    /// Feed a square click from the player.
    pub fn click(&mut self, square: Square) -> Event {
        if self.is_game_over() || self.is_computer_turn() {
            return Event::Ignored;
        }

        match self.entry.click(&self.position, square) {
            Click::Ignored => Event::Ignored,
            Click::Selected => {
                if self.highlights {
                    let targets = self.entry.selection().legal_targets();
                    self.send(&Command::highlight(targets));
                    self.highlighted = true;
                }
                Event::Selected
            }
            Click::Deselected => {
                self.clear_highlights();
                Event::Deselected
            }
            Click::Cancelled => {
                self.clear_highlights();
                Event::Cancelled
            }
            Click::Moved { mv, position } => Event::Played(self.adopt(mv, position)),
        }
    }

    /// Switch game mode. Joining as the computer on its turn makes it move.
    pub fn set_mode(&mut self, mode: Mode) -> Option<Move> {
        self.mode = mode;
        self.entry.reset();
        self.clear_highlights();
        self.computer_move()
    }

    /// Start over from the standard start position.
    pub fn reset(&mut self) -> Option<Move> {
        info!("game reset");
        self.restart(P::default())
    }

    /// Replace the game with a new starting position.
    pub fn load(&mut self, position: P) -> Option<Move> {
        self.restart(position)
    }

    fn restart(&mut self, position: P) -> Option<Move> {
        self.history = History::new(&position);
        self.position = position;
        self.entry.reset();
        self.clear_highlights();
        self.sync();
        self.computer_move()
    }

    /// Take a human move that has already been applied to `position`.
    fn adopt(&mut self, played: Move, position: P) -> Turn {
        self.entry.reset();
        self.clear_highlights();
        self.history.push(played, &position);
        self.position = position;
        self.sync();

        let reply = match self.report_result() {
            Some(_) => None,
            None => self.computer_move(),
        };

        Turn {
            played,
            reply,
            result: self.result(),
        }
    }

    fn computer_move(&mut self) -> Option<Move> {
        if !self.is_computer_turn() || self.is_game_over() {
            return None;
        }

        let mv = self.opponent.choose_move(&self.position)?;
        let Some(after) = self.position.play(mv) else {
            warn!("opponent chose an illegal move {mv:?}");
            return None;
        };
        debug!("computer plays {mv:?}");
        self.history.push(mv, &after);
        self.position = after;
        self.sync();
        self.report_result();
        Some(mv)
    }

    fn report_result(&self) -> Option<GameResult> {
        let result = self.result();
        if let Some(result) = result {
            info!("game over: {result}");
        }
        result
    }

    /// Mirror the current position to the board and log its reply.
    fn sync(&mut self) {
        let fen = self.position.fen();
        match self.peripheral.show_position(&fen) {
            Ok(Some(reply)) => info!("board: {reply}"),
            Ok(None) => {}
            Err(e) => warn!("board not updated: {e}"),
        }
    }

    fn send(&mut self, command: &Command) {
        if let Err(e) = self.peripheral.send(command) {
            warn!("failed to send {command}: {e}");
        }
    }

    fn clear_highlights(&mut self) {
        if self.highlighted {
            self.send(&Command::ClearHighlight);
            self.highlighted = false;
        }
    }
}

impl<T, O> Session<Chess, T, O>
where
    T: LineTransport,
    O: Opponent,
{
    /// Play a move typed as UCI (`e2e4`, `e7e8q`) or SAN (`Nf3`, `O-O`).
    ///
    /// UCI is case-insensitive; SAN is not, since piece letters are
    /// upper-case.
    pub fn play_notation(&mut self, text: &str) -> Result<Turn, NotationError> {
        if self.is_game_over() {
            return Err(NotationError::GameOver);
        }
        if self.is_computer_turn() {
            return Err(NotationError::NotYourTurn);
        }

        let text = text.trim();
        let uci = text.to_ascii_lowercase().parse::<UciMove>();
        let mv = match (uci, text.parse::<San>()) {
            (Ok(uci), _) => uci
                .to_move(&self.position)
                .map_err(|_| NotationError::Illegal(text.to_owned()))?,
            (Err(_), Ok(san)) => san
                .to_move(&self.position)
                .map_err(|_| NotationError::Illegal(text.to_owned()))?,
            (Err(_), Err(_)) => return Err(NotationError::Unparseable(text.to_owned())),
        };

        let after = self
            .position
            .play(mv)
            .ok_or_else(|| NotationError::Illegal(text.to_owned()))?;
        Ok(self.adopt(mv, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::load;
    use crate::mock::{RecordingTransport, ScriptedRules};
    use crate::opponent::RandomOpponent;
    use crate::rules::Termination;
    use rand::rngs::StdRng;
    use shakmaty::Role;
    use test_case::test_case;

    type TestSession = Session<Chess, RecordingTransport, RandomOpponent<StdRng>>;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn session(position: Chess) -> TestSession {
        Session::new(position, RecordingTransport::new(), RandomOpponent::seeded(9))
    }

    fn sent(session: &TestSession) -> Vec<String> {
        session.peripheral().transport().sent().to_vec()
    }

    fn play(session: &mut TestSession, from: Square, to: Square) -> Turn {
        assert_eq!(session.click(from), Event::Selected);
        match session.click(to) {
            Event::Played(turn) => turn,
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn start_sends_initial_position() {
        let mut session = session(Chess::default());

        assert_eq!(session.start(), None);

        assert_eq!(sent(&session), [START]);
    }

    #[test]
    fn move_sends_exactly_one_fen() {
        let mut session = session(Chess::default());

        let turn = play(&mut session, Square::E2, Square::E4);

        assert_eq!(turn.reply, None);
        assert_eq!(turn.result, None);
        assert_eq!(sent(&session), [AFTER_E4]);
        assert_eq!(session.position().fen(), AFTER_E4);
    }

    #[test]
    fn selection_and_cancel_send_nothing_without_highlights() {
        let mut session = session(Chess::default());

        assert_eq!(session.click(Square::E2), Event::Selected);
        assert_eq!(session.click(Square::E5), Event::Cancelled);
        assert_eq!(session.click(Square::G1), Event::Selected);
        assert_eq!(session.click(Square::G1), Event::Deselected);

        assert!(sent(&session).is_empty());
        assert_eq!(session.position().fen(), START);
    }

    #[test]
    fn highlights_follow_selection() {
        let mut session = session(Chess::default()).with_highlights(true);

        session.click(Square::E2);
        session.click(Square::E2);
        play(&mut session, Square::G1, Square::F3);

        assert_eq!(
            sent(&session),
            [
                "HIGHLIGHT:e3,e4",
                "CLEARHIGHLIGHT",
                "HIGHLIGHT:f3,h3",
                "CLEARHIGHLIGHT",
                "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1",
            ]
        );
    }

    #[test]
    fn computer_answers_human_move() {
        let mut session = session(Chess::default()).with_mode(Mode::Computer);

        let turn = play(&mut session, Square::E2, Square::E4);

        let reply = turn.reply.expect("computer replies");
        let after_e4 = load(AFTER_E4).expect("valid position");
        assert!(Rules::legal_moves(&after_e4).contains(&reply));
        assert_eq!(Rules::turn(session.position()), Color::White);
        let lines = sent(&session);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], AFTER_E4);
        assert_eq!(lines[1], session.position().fen());
    }

    #[test]
    fn clicks_ignored_on_computer_turn() {
        let black_to_move = load(AFTER_E4).expect("valid position");
        let mut session = Session::new(
            black_to_move,
            RecordingTransport::new(),
            ScriptlessOpponent,
        )
        .with_mode(Mode::Computer);

        assert_eq!(session.click(Square::E7), Event::Ignored);
        assert_eq!(session.selection(), &Selection::Idle);
    }

    #[test]
    fn switching_to_computer_on_its_turn_triggers_reply() {
        let mut session = session(Chess::default());
        play(&mut session, Square::E2, Square::E4);

        let reply = session.set_mode(Mode::Computer);

        assert!(reply.is_some());
        assert_eq!(Rules::turn(session.position()), Color::White);
        assert_eq!(sent(&session).len(), 2);
    }

    #[test]
    fn game_over_reported_and_clicks_ignored() {
        // White to play Qxf7#
        let pos = load("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .expect("valid position");
        let mut session = session(pos).with_mode(Mode::Computer);

        let turn = play(&mut session, Square::H5, Square::F7);

        assert_eq!(turn.reply, None);
        assert_eq!(
            turn.result,
            Some(GameResult {
                winner: Some(Color::White),
                termination: Termination::Checkmate,
            })
        );
        assert_eq!(session.click(Square::E8), Event::Ignored);
    }

    #[test]
    fn transport_failure_does_not_stop_the_game() {
        let mut session = session(Chess::default());
        session.peripheral_mut().transport_mut().fail_sends(true);

        play(&mut session, Square::E2, Square::E4);
        session.peripheral_mut().transport_mut().fail_sends(false);
        play(&mut session, Square::E7, Square::E5);

        assert_eq!(
            sent(&session),
            ["rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"]
        );
    }

    #[test]
    fn read_failure_is_swallowed() {
        let mut session = session(Chess::default());
        session.peripheral_mut().transport_mut().fail_reads(true);

        let turn = play(&mut session, Square::E2, Square::E4);

        assert_eq!(turn.played.to(), Square::E4);
        assert_eq!(sent(&session), [AFTER_E4]);
    }

    #[test]
    fn reset_returns_to_start_and_resends() {
        let mut session = session(Chess::default());
        play(&mut session, Square::E2, Square::E4);
        session.click(Square::E7);

        session.reset();

        assert_eq!(session.selection(), &Selection::Idle);
        assert_eq!(session.position().fen(), START);
        assert_eq!(sent(&session), [AFTER_E4, START]);
    }

    #[test]
    fn reset_after_load_goes_to_standard_start() {
        let endgame = load("4k3/8/8/8/8/8/p7/4K3 b - - 0 1").expect("valid position");
        let mut session = session(endgame.clone());

        session.load(endgame);
        play(&mut session, Square::A2, Square::A1);
        session.reset();

        assert_eq!(session.position().fen(), START);
        assert_eq!(sent(&session).last().map(String::as_str), Some(START));
    }

    fn shuffle_knights(session: &mut TestSession) {
        play(session, Square::G1, Square::F3);
        play(session, Square::G8, Square::F6);
        play(session, Square::F3, Square::G1);
        play(session, Square::F6, Square::G8);
    }

    #[test]
    fn fivefold_repetition_ends_the_game() {
        let mut session = session(Chess::default());

        for _ in 0..3 {
            shuffle_knights(&mut session);
        }
        assert_eq!(session.result(), None);

        play(&mut session, Square::G1, Square::F3);
        play(&mut session, Square::G8, Square::F6);
        play(&mut session, Square::F3, Square::G1);
        let last = play(&mut session, Square::F6, Square::G8);

        let draw = Some(GameResult {
            winner: None,
            termination: Termination::FivefoldRepetition,
        });
        assert_eq!(last.result, draw);
        assert_eq!(session.result(), draw);
        assert_eq!(session.click(Square::E2), Event::Ignored);
        assert_eq!(session.play_notation("e4"), Err(NotationError::GameOver));
        assert_eq!(sent(&session).len(), 16);
    }

    #[test]
    fn computer_does_not_move_after_fivefold_repetition() {
        let mut session = session(Chess::default());
        play(&mut session, Square::E2, Square::E4);
        for _ in 0..4 {
            play(&mut session, Square::G8, Square::F6);
            play(&mut session, Square::G1, Square::F3);
            play(&mut session, Square::F6, Square::G8);
            play(&mut session, Square::F3, Square::G1);
        }
        assert!(session.is_game_over());
        let lines = sent(&session).len();

        assert_eq!(session.set_mode(Mode::Computer), None);

        assert_eq!(Rules::turn(session.position()), Color::Black);
        assert_eq!(sent(&session).len(), lines);
    }

    #[test]
    fn reset_clears_repetition_history() {
        let mut session = session(Chess::default());
        for _ in 0..4 {
            shuffle_knights(&mut session);
        }
        assert!(session.is_game_over());

        session.reset();

        assert_eq!(session.result(), None);
        assert_eq!(session.click(Square::E2), Event::Selected);
    }

    #[test_case("e2e4"; "uci")]
    #[test_case("E2E4"; "upper case uci")]
    #[test_case("e4"; "san")]
    fn text_moves(text: &str) {
        let mut session = session(Chess::default());

        let turn = session.play_notation(text).expect("legal move");

        assert_eq!(turn.played.to(), Square::E4);
        assert_eq!(sent(&session), [AFTER_E4]);
    }

    #[test]
    fn text_promotion_and_castling() {
        let mut session =
            session(load("r3k2r/pPpp1ppp/8/4pP2/8/8/1PPPP1PP/R3K2R w KQkq e6 0 1").expect("valid"));

        let turn = session.play_notation("b7b8n").expect("under-promotion by text");
        assert_eq!(turn.played.promotion(), Some(Role::Knight));

        let turn = session.play_notation("O-O").expect("black castles");
        assert!(turn.played.is_castle());
    }

    #[test_case("zz9", NotationError::Unparseable("zz9".into()); "garbage")]
    #[test_case("e2e5", NotationError::Illegal("e2e5".into()); "illegal uci")]
    #[test_case("Nf6", NotationError::Illegal("Nf6".into()); "illegal san")]
    fn text_move_errors(text: &str, expected: NotationError) {
        let mut session = session(Chess::default());

        assert_eq!(session.play_notation(text), Err(expected));
        assert!(sent(&session).is_empty());
    }

    #[test]
    fn scripted_rules_drive_the_session() {
        let mv = Move::Normal {
            role: Role::Rook,
            from: Square::A1,
            capture: None,
            to: Square::A8,
            promotion: None,
        };
        let pos = ScriptedRules::new(Color::White)
            .with_piece(Square::A1, Role::Rook, Color::White)
            .with_move(mv);
        let mut session = Session::new(pos, RecordingTransport::new(), ScriptlessOpponent);

        assert_eq!(session.click(Square::A1), Event::Selected);
        let event = session.click(Square::A8);

        assert!(matches!(event, Event::Played(Turn { played, .. }) if played == mv));
        assert_eq!(session.peripheral().transport().sent(), ["scripted b 1"]);
    }

    /// Opponent that never finds a move.
    struct ScriptlessOpponent;

    impl Opponent for ScriptlessOpponent {
        fn choose_move<P: Rules>(&mut self, _position: &P) -> Option<Move> {
            None
        }
    }
}
