//! Game engine: turn order, move validation, and lookup-driven AI replies.
//!
//! The engine owns one game's state. It starts in a selecting phase with no
//! AI mark assigned; `start` enters play and `reset` returns to selecting.
//! Every phase change bumps a generation counter so deferred AI callbacks
//! can detect that the game they were scheduled for no longer exists.

use crate::book::Playbook;
use crate::game::{rules, Board, Cell, GameStatus, Mark, Position};
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Errors
// ─────────────────────────────────────────────────────────────

/// Error that can occur when validating or applying a move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// No game is running; marks have not been assigned yet.
    #[display("Game has not started")]
    NotStarted,

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,

    /// It's not this mark's turn.
    #[display("It's not {:?}'s turn", _0)]
    NotYourTurn(Mark),

    /// The square at the position is already occupied.
    #[display("Square {_0} is already occupied")]
    SquareOccupied(Position),
}

impl std::error::Error for MoveError {}

// ─────────────────────────────────────────────────────────────
//  AI replies
// ─────────────────────────────────────────────────────────────

/// Outcome of asking the engine for an AI move.
///
/// A stall is a valid outcome, not an error: the turn was the AI's, but
/// the lookup tables could not produce a move. The board is untouched and
/// the turn stays with the AI, so a later attempt may still succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiReply {
    /// The AI placed its mark at this position.
    Played(Position),
    /// The AI could not move; state is unchanged.
    Stalled(StallReason),
}

/// Why an AI turn produced no move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum StallReason {
    /// The lookup tables have not finished loading.
    #[display("Lookup tables not loaded")]
    BookUnavailable,
    /// The current board has no entry in the AI's table.
    #[display("No entry for the current board")]
    NoEntry,
    /// The table named a square that is already occupied.
    #[display("Table entry points at occupied square {_0}")]
    TargetOccupied(Position),
}

// ─────────────────────────────────────────────────────────────
//  Engine
// ─────────────────────────────────────────────────────────────

/// State machine for a single tic-tac-toe game.
///
/// Invariants:
/// - Marks only accumulate; no move ever overwrites an occupied square.
/// - Status is re-evaluated after every placement, win checked before draw.
/// - Once terminal, the board is frozen until `start` or `reset`.
/// - The turn alternates between the two marks while play continues.
#[derive(Debug, Clone)]
pub struct Engine {
    board: Board,
    to_move: Mark,
    ai_mark: Option<Mark>,
    status: GameStatus,
    generation: u64,
}

impl Engine {
    /// Creates an engine in the selecting phase: empty board, no AI mark.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            to_move: Mark::X,
            ai_mark: None,
            status: GameStatus::InProgress,
            generation: 0,
        }
    }

    /// Starts a fresh game with the given AI mark and opening turn.
    ///
    /// Always succeeds, including mid-game: the board and status are wiped
    /// and the generation is bumped, orphaning any pending AI callback.
    #[instrument(skip(self))]
    pub fn start(&mut self, ai_mark: Mark, first_turn: Mark) {
        self.board = Board::new();
        self.to_move = first_turn;
        self.ai_mark = Some(ai_mark);
        self.status = GameStatus::InProgress;
        self.generation += 1;
    }

    /// Returns to the selecting phase: empty board, AI mark cleared.
    ///
    /// Idempotent; bumps the generation so pending AI callbacks expire.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.to_move = Mark::X;
        self.ai_mark = None;
        self.status = GameStatus::InProgress;
        self.generation += 1;
    }

    /// Applies a human move at the given position.
    ///
    /// Rejected moves leave the engine untouched.
    #[instrument(skip(self))]
    pub fn human_move(&mut self, position: Position) -> Result<(), MoveError> {
        let human = self.human_mark().ok_or(MoveError::NotStarted)?;
        if self.status.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if self.to_move != human {
            return Err(MoveError::NotYourTurn(human));
        }
        if !self.board.is_empty(position) {
            return Err(MoveError::SquareOccupied(position));
        }

        self.place(position, human);
        Ok(())
    }

    /// Asks the lookup tables for the AI's move and applies it.
    ///
    /// `Err` means the call itself was invalid (wrong phase or turn).
    /// `Ok(Stalled(_))` means the turn was valid but the tables had no
    /// usable answer; the engine logs the reason and changes nothing.
    #[instrument(skip(self, playbook))]
    pub fn ai_move(&mut self, playbook: Option<&Playbook>) -> Result<AiReply, MoveError> {
        let ai = self.ai_mark.ok_or(MoveError::NotStarted)?;
        if self.status.is_terminal() {
            return Err(MoveError::GameOver);
        }
        if self.to_move != ai {
            return Err(MoveError::NotYourTurn(ai));
        }

        let Some(playbook) = playbook else {
            return Ok(AiReply::Stalled(StallReason::BookUnavailable));
        };

        let key = self.board.key();
        let Some(position) = playbook.table_for(ai).best_move(&key) else {
            warn!(board = %key, mark = ?ai, "No table entry for board");
            return Ok(AiReply::Stalled(StallReason::NoEntry));
        };
        if !self.board.is_empty(position) {
            warn!(board = %key, ?position, "Table entry points at occupied square");
            return Ok(AiReply::Stalled(StallReason::TargetOccupied(position)));
        }

        self.place(position, ai);
        Ok(AiReply::Played(position))
    }

    /// Places a mark, re-evaluates status, and yields the turn if play goes on.
    fn place(&mut self, position: Position, mark: Mark) {
        self.board.set(position, Cell::Marked(mark));
        self.status = rules::evaluate(&self.board);
        if !self.status.is_terminal() {
            self.to_move = self.to_move.opponent();
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the mark whose turn it is.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Returns the game status.
    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    /// Returns the AI's mark, or `None` while selecting.
    pub fn ai_mark(&self) -> Option<Mark> {
        self.ai_mark
    }

    /// Returns the human's mark, or `None` while selecting.
    pub fn human_mark(&self) -> Option<Mark> {
        self.ai_mark.map(Mark::opponent)
    }

    /// Returns the current generation.
    ///
    /// Bumped by `start` and `reset`; a deferred callback that captured an
    /// older value must discard itself.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a game is running and the AI holds the turn.
    pub fn is_ai_turn(&self) -> bool {
        !self.status.is_terminal() && self.ai_mark == Some(self.to_move)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
