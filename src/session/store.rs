//! Session store trait and the in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::Session;
use crate::error::SessionError;
use crate::questionnaire::QuestionKey;

/// Backend-agnostic session storage.
///
/// Each call is atomic on its own. Callers that need read-modify-write
/// across several calls must serialize per user (see `dialogue::UserLocks`).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Return the user's session, creating an all-unanswered one if absent.
    /// Counts as activity for expiry.
    async fn get_or_create(&self, user_id: &str) -> Session;

    /// Return the user's session without creating it.
    async fn get(&self, user_id: &str) -> Option<Session>;

    /// Record one answer. Fails if the user has no session yet.
    async fn set_answer(
        &self,
        user_id: &str,
        key: QuestionKey,
        value: &str,
    ) -> Result<Session, SessionError>;

    /// Store the whole record, inserting it when the entry is gone (for
    /// example evicted since it was read). Stamps `updated_at`.
    async fn save(&self, session: Session) -> Session;

    /// Set every field back to unanswered, keeping (or creating) the entry.
    async fn reset(&self, user_id: &str) -> Session;

    /// Drop a session entirely. Returns whether one existed.
    async fn remove(&self, user_id: &str) -> bool;

    /// Evict sessions idle for longer than `ttl`. Returns how many went.
    async fn remove_expired(&self, ttl: chrono::Duration) -> usize;

    /// Number of stored sessions.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-lifetime store backed by a `HashMap`.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, user_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_insert_with(|| {
            debug!(user_id = %user_id, "Session created");
            Session::new(user_id)
        });
        session.touch();
        session.clone()
    }

    async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    async fn set_answer(
        &self,
        user_id: &str,
        key: QuestionKey,
        value: &str,
    ) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| SessionError::UnknownUser {
                user_id: user_id.to_string(),
            })?;

        session.set_answer(key, value);
        Ok(session.clone())
    }

    async fn save(&self, mut session: Session) -> Session {
        session.touch();
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&session.user_id) {
            debug!(user_id = %session.user_id, "Session re-inserted on save");
        }
        sessions.insert(session.user_id.clone(), session.clone());
        session
    }

    async fn reset(&self, user_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Session::new(user_id));
        session.reset();
        session.clone()
    }

    async fn remove(&self, user_id: &str) -> bool {
        self.sessions.write().await.remove(user_id).is_some()
    }

    async fn remove_expired(&self, ttl: chrono::Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(ttl, now));
        let removed = before - sessions.len();

        if removed > 0 {
            info!(count = removed, "Expired idle sessions");
        }
        removed
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn a background task that periodically evicts idle sessions.
pub fn spawn_expiry_task(
    store: Arc<dyn SessionStore>,
    ttl: chrono::Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.remove_expired(ttl).await;
        }
    })
}
