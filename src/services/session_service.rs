use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::services::wizard_service::WizardSession;

/// In-memory wizard sessions. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, WizardSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> WizardSession {
        let session = WizardSession::new();
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        info!(session = %session.id, "wizard session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<WizardSession> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Runs `f` against the session under the write lock. `f` must not block.
    pub async fn update<T, F>(&self, id: Uuid, f: F) -> Result<T>
    where
        F: FnOnce(&mut WizardSession) -> Result<T>,
    {
        let mut guard = self.sessions.write().await;
        let session = guard.get_mut(&id).ok_or_else(|| not_found(id))?;
        f(session)
    }

    /// Discards a session and hands back its last state.
    pub async fn remove(&self, id: Uuid) -> Result<WizardSession> {
        let mut guard = self.sessions.write().await;
        let submitting = guard
            .get(&id)
            .map(|s| s.submitting)
            .ok_or_else(|| not_found(id))?;
        if submitting {
            return Err(Error::Conflict(
                "Cannot discard a course while it is being saved".to_string(),
            ));
        }
        let removed = guard.remove(&id).ok_or_else(|| not_found(id))?;
        info!(session = %id, "wizard session discarded");
        Ok(removed)
    }

    /// Drops sessions untouched for longer than `ttl`. Sessions with a
    /// submission in flight are kept.
    /// Returns the purged sessions so their uploads can be cleaned up.
    pub async fn purge_idle(&self, ttl: Duration) -> Vec<WizardSession> {
        let cutoff = Utc::now() - ttl;
        let mut guard = self.sessions.write().await;
        let stale: Vec<Uuid> = guard
            .values()
            .filter(|s| !s.submitting && s.updated_at <= cutoff)
            .map(|s| s.id)
            .collect();
        stale.iter().filter_map(|id| guard.remove(id)).collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Wizard session {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_mutates_the_stored_session() {
        let store = SessionStore::new();
        let session = store.create().await;
        let selected = store
            .update(session.id, |s| {
                s.toggle_difficulty(crate::models::difficulty::Difficulty::Easy)
            })
            .await
            .unwrap();
        assert!(selected);
        let stored = store.get(session.id).await.unwrap();
        assert_eq!(stored.draft.difficulties.len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = SessionStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(store.remove(Uuid::new_v4()).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn purge_keeps_fresh_and_busy_sessions() {
        let store = SessionStore::new();
        let stale = store.create().await;
        let busy = store.create().await;
        let fresh = store.create().await;

        let long_ago = Utc::now() - Duration::hours(5);
        store
            .update(stale.id, |s| {
                s.updated_at = long_ago;
                Ok(())
            })
            .await
            .unwrap();
        store
            .update(busy.id, |s| {
                s.updated_at = long_ago;
                s.submitting = true;
                Ok(())
            })
            .await
            .unwrap();

        let purged = store.purge_idle(Duration::hours(2)).await;
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].id, stale.id);
        assert!(store.get(stale.id).await.is_err());
        assert!(store.get(busy.id).await.is_ok());
        assert!(store.get(fresh.id).await.is_ok());
    }
}
