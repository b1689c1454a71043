//! Game session management for the HTTP service.
//!
//! Each session owns one engine. The manager hands out cloned snapshots
//! for reads and runs closures under its lock for mutations, so a deferred
//! AI callback and a live request can never interleave inside one session.

use crate::engine::Engine;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// A game session: one board, one human, one AI.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Session ID.
    pub id: SessionId,
    /// The game state machine.
    pub engine: Engine,
}

impl GameSession {
    /// Creates a new game session in the selecting phase.
    #[instrument]
    pub fn new(id: SessionId) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            engine: Engine::new(),
        }
    }
}

/// Manages all game sessions.
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<SessionId, GameSession>>>,
    next_id: Arc<AtomicU64>,
}

impl SessionManager {
    /// Creates a new session manager.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session manager");
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Creates a new game session.
    ///
    /// With `None` an unused `session-{n}` ID is generated.
    #[instrument(skip(self))]
    pub fn create_session(&self, id: Option<SessionId>) -> Result<SessionId, String> {
        let mut sessions = self.sessions.lock().unwrap();

        let id = match id {
            Some(id) => {
                if sessions.contains_key(&id) {
                    warn!(session_id = %id, "Session already exists");
                    return Err("Session already exists".to_string());
                }
                id
            }
            None => loop {
                let candidate = format!("session-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        sessions.insert(id.clone(), GameSession::new(id.clone()));

        info!(session_id = %id, "Created new session");
        Ok(id)
    }

    /// Gets a snapshot of a session by ID.
    #[instrument(skip(self))]
    pub fn get_session(&self, id: &str) -> Option<GameSession> {
        let sessions = self.sessions.lock().unwrap();
        let session = sessions.get(id).cloned();

        if session.is_none() {
            debug!(session_id = id, "Session not found");
        }

        session
    }

    /// Runs a closure against a session while holding the manager's lock.
    ///
    /// Returns `None` when the session does not exist. All mutations go
    /// through here so check-then-act sequences stay atomic.
    #[instrument(skip(self, f))]
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut GameSession) -> T) -> Option<T> {
        let mut sessions = self.sessions.lock().unwrap();

        match sessions.get_mut(id) {
            Some(session) => Some(f(session)),
            None => {
                debug!(session_id = id, "Session not found");
                None
            }
        }
    }

    /// Lists all active session IDs.
    #[instrument(skip(self))]
    pub fn list_sessions(&self) -> Vec<SessionId> {
        let sessions = self.sessions.lock().unwrap();
        let ids: Vec<_> = sessions.keys().cloned().collect();
        info!(count = ids.len(), "Listed sessions");
        ids
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
