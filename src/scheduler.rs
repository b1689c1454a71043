//! Deferred AI turns.
//!
//! When a session leaves the AI on the move, the scheduler spawns a task
//! that waits a fixed delay and then replays the decision under the session
//! lock. The task carries the generation it was scheduled against; if the
//! game was reset or restarted in the meantime the numbers disagree and the
//! callback discards itself instead of marking a board it no longer knows.

use crate::book::BookStore;
use crate::engine::AiReply;
use crate::session::SessionManager;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Schedules delayed AI moves against live sessions.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    sessions: SessionManager,
    books: BookStore,
    delay: Duration,
}

impl TurnScheduler {
    /// Creates a scheduler over the given sessions and tables.
    pub fn new(sessions: SessionManager, books: BookStore, delay: Duration) -> Self {
        Self {
            sessions,
            books,
            delay,
        }
    }

    /// Schedules an AI move for the session if it is the AI's turn.
    ///
    /// Nothing is scheduled while the tables are still loading; a later
    /// `poke_all` after the load picks those sessions back up. Poking a
    /// session twice is harmless since the second callback fails the turn
    /// re-check once the first has moved.
    #[instrument(skip(self))]
    pub fn poke(&self, session_id: &str) {
        let Some(session) = self.sessions.get_session(session_id) else {
            debug!(session_id, "No such session; nothing to schedule");
            return;
        };
        if !session.engine.is_ai_turn() {
            debug!(session_id, "Not the AI's turn; nothing to schedule");
            return;
        }
        if !self.books.is_loaded() {
            debug!(session_id, "Tables not loaded; AI turn stalls until load");
            return;
        }

        let generation = session.engine.generation();
        debug!(session_id, generation, delay_ms = self.delay.as_millis() as u64, "Scheduling AI move");

        let scheduler = self.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            scheduler.fire(&session_id, generation).await;
        });
    }

    /// Re-examines every session, scheduling AI moves where due.
    ///
    /// Called after the tables finish loading so games that stalled on an
    /// AI turn resume without another request.
    #[instrument(skip(self))]
    pub fn poke_all(&self) {
        for id in self.sessions.list_sessions() {
            self.poke(&id);
        }
    }

    /// Waits out the delay, then applies the AI move if still current.
    #[instrument(skip(self))]
    async fn fire(&self, session_id: &str, scheduled_generation: u64) {
        sleep(self.delay).await;

        let playbook = self.books.snapshot();

        let applied = self.sessions.with_session(session_id, |session| {
            if session.engine.generation() != scheduled_generation {
                debug!(
                    session_id,
                    scheduled_generation,
                    current = session.engine.generation(),
                    "Discarding stale AI callback"
                );
                return;
            }
            if !session.engine.is_ai_turn() {
                debug!(session_id, "Turn moved on; discarding AI callback");
                return;
            }

            match session.engine.ai_move(playbook.as_deref()) {
                Ok(AiReply::Played(position)) => {
                    info!(session_id, ?position, status = ?session.engine.status(), "AI moved");
                }
                Ok(AiReply::Stalled(reason)) => {
                    warn!(session_id, %reason, "AI turn stalled");
                }
                Err(e) => {
                    warn!(session_id, error = %e, "AI move rejected");
                }
            }
        });

        if applied.is_none() {
            debug!(session_id, "Session gone before AI callback");
        }
    }
}
