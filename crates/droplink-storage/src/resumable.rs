//! In-process registry for resumable upload sessions.
//!
//! Providers delegate session bookkeeping here and keep only the chunk
//! persistence to themselves. The registry tracks which destinations are
//! reserved; the on-store `.part` marker (written by the provider) makes
//! the same reservation visible to name checks even if the process that
//! opened the session is gone.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;
use droplink_core::traits::UploadSession;

/// Suffix of the reservation marker a session leaves at its destination.
pub const RESERVATION_SUFFIX: &str = ".part";

/// The marker path for a destination.
pub fn reservation_path(destination: &str) -> String {
    format!("{destination}{RESERVATION_SUFFIX}")
}

/// Temporary chunk path for a session.
pub fn chunk_path(session_id: Uuid, chunk_index: u32) -> String {
    format!("_sessions/{session_id}/{chunk_index:06}")
}

/// Tracked state of one open session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The session as exposed to callers.
    pub session: UploadSession,
    /// Number of chunks received (indexes 0..chunk_count).
    pub chunk_count: u32,
}

/// Concurrent map of open sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionState>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session reserving `destination`.
    ///
    /// Two live sessions may not target the same destination; the second
    /// caller gets a conflict.
    pub fn create(
        &self,
        destination: &str,
        expected_bytes: u64,
        expires_at: DateTime<Utc>,
    ) -> AppResult<UploadSession> {
        if self.reserved(destination) {
            return Err(AppError::conflict(format!(
                "An upload session already targets '{destination}'"
            )));
        }

        let session = UploadSession {
            id: Uuid::new_v4(),
            destination: destination.to_string(),
            expected_bytes,
            received_bytes: 0,
            expires_at,
        };
        self.sessions.insert(
            session.id,
            SessionState {
                session: session.clone(),
                chunk_count: 0,
            },
        );
        Ok(session)
    }

    /// Look up a live session.
    pub fn get(&self, session_id: Uuid) -> AppResult<SessionState> {
        let state = self
            .sessions
            .get(&session_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| AppError::not_found(format!("Upload session {session_id} not found")))?;

        if state.session.expires_at <= Utc::now() {
            return Err(AppError::not_found(format!(
                "Upload session {session_id} has expired"
            )));
        }
        Ok(state)
    }

    /// Record a received chunk and return the updated state.
    pub fn record_chunk(
        &self,
        session_id: Uuid,
        chunk_index: u32,
        len: u64,
    ) -> AppResult<SessionState> {
        let mut entry = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::not_found(format!("Upload session {session_id} not found")))?;

        if entry.session.expires_at <= Utc::now() {
            return Err(AppError::not_found(format!(
                "Upload session {session_id} has expired"
            )));
        }
        if chunk_index != entry.chunk_count {
            return Err(AppError::validation(format!(
                "Expected chunk {}, got chunk {chunk_index}",
                entry.chunk_count
            )));
        }

        entry.chunk_count += 1;
        entry.session.received_bytes += len;
        if entry.session.received_bytes > entry.session.expected_bytes {
            return Err(AppError::validation(format!(
                "Session overran its declared size ({} > {} bytes)",
                entry.session.received_bytes, entry.session.expected_bytes
            )));
        }
        Ok(entry.clone())
    }

    /// Drop a session, returning its last state if it was live.
    pub fn remove(&self, session_id: Uuid) -> Option<SessionState> {
        self.sessions.remove(&session_id).map(|(_, state)| state)
    }

    /// Whether any live session targets this destination.
    pub fn reserved(&self, destination: &str) -> bool {
        let now = Utc::now();
        self.sessions.iter().any(|entry| {
            entry.session.destination == destination && entry.session.expires_at > now
        })
    }

    /// Sessions past their expiry, for the sweep.
    pub fn expired(&self) -> Vec<SessionState> {
        let now = Utc::now();
        self.sessions
            .iter()
            .filter(|entry| entry.session.expires_at <= now)
            .map(|entry| entry.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn soon() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[test]
    fn test_destination_reserved_while_open() {
        let registry = SessionRegistry::new();
        let session = registry.create("uploads/a.bin", 100, soon()).unwrap();

        assert!(registry.reserved("uploads/a.bin"));
        assert!(!registry.reserved("uploads/b.bin"));
        assert!(registry.create("uploads/a.bin", 100, soon()).is_err());

        registry.remove(session.id);
        assert!(!registry.reserved("uploads/a.bin"));
    }

    #[test]
    fn test_chunks_must_arrive_in_order() {
        let registry = SessionRegistry::new();
        let session = registry.create("uploads/a.bin", 10, soon()).unwrap();

        registry.record_chunk(session.id, 0, 4).unwrap();
        assert!(registry.record_chunk(session.id, 2, 4).is_err());
        let state = registry.record_chunk(session.id, 1, 4).unwrap();
        assert_eq!(state.session.received_bytes, 8);
    }

    #[test]
    fn test_overrun_rejected() {
        let registry = SessionRegistry::new();
        let session = registry.create("uploads/a.bin", 5, soon()).unwrap();
        assert!(registry.record_chunk(session.id, 0, 6).is_err());
    }

    #[test]
    fn test_expired_session_not_usable_but_listed() {
        let registry = SessionRegistry::new();
        let past = Utc::now() - Duration::minutes(1);
        let session = registry.create("uploads/a.bin", 10, past).unwrap();

        assert!(registry.get(session.id).is_err());
        assert!(!registry.reserved("uploads/a.bin"));
        assert_eq!(registry.expired().len(), 1);
    }
}
