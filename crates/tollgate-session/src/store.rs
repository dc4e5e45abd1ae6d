//! Session storage backends.

use crate::error::SessionError;
use crate::record::{SessionId, SessionRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Trait for session storage backends.
///
/// Writes are whole-record: a session either has a complete record or none.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a record, replacing any previous record for the id.
    async fn insert(&self, id: SessionId, record: SessionRecord) -> Result<(), SessionError>;

    /// Get a live record. Expired records are treated as absent.
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError>;

    /// Remove a record. Returns whether one existed.
    async fn remove(&self, id: &SessionId) -> Result<bool, SessionError>;

    /// Drop every expired record. Returns how many were dropped.
    async fn purge_expired(&self) -> Result<usize, SessionError>;

    /// Number of stored records, expired ones included.
    async fn session_count(&self) -> Result<usize, SessionError>;
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, id: SessionId, record: SessionRecord) -> Result<(), SessionError> {
        self.sessions.write().await.insert(id, record);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, SessionError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some(record) if !record.is_expired_at(now) => return Ok(Some(record.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it, unless it was replaced in the meantime.
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(record) if !record.is_expired_at(now) => Ok(Some(record.clone())),
            Some(_) => {
                sessions.remove(id);
                tracing::debug!(session = id.short(), "Dropped expired session");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        Ok(before - sessions.len())
    }

    async fn session_count(&self) -> Result<usize, SessionError> {
        Ok(self.sessions.read().await.len())
    }
}

/// Periodically purge expired sessions until the task is aborted.
pub fn spawn_purge_task(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(purged = n, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DelegatedCredential;

    fn record(ttl_secs: i64) -> SessionRecord {
        SessionRecord::new(
            DelegatedCredential::bearer("token"),
            chrono::Duration::seconds(ttl_secs),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();

        assert!(store.get(&id).await.unwrap().is_none());
        store.insert(id.clone(), record(60)).await.unwrap();

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.credential.access_token, "token");

        assert!(store.remove(&id).await.unwrap());
        assert!(!store.remove(&id).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_record_is_absent_and_dropped() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        store.insert(id.clone(), record(-1)).await.unwrap();

        assert_eq!(store.session_count().await.unwrap(), 1);
        assert!(store.get(&id).await.unwrap().is_none());
        assert_eq!(store.session_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemorySessionStore::new();
        store.insert(SessionId::generate(), record(-1)).await.unwrap();
        store.insert(SessionId::generate(), record(-1)).await.unwrap();
        store.insert(SessionId::generate(), record(60)).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.session_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sessions_do_not_interfere() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = SessionId::generate();
                let mut rec = record(60);
                rec.credential.access_token = format!("token-{i}");
                store.insert(id.clone(), rec).await.unwrap();
                let back = store.get(&id).await.unwrap().unwrap();
                assert_eq!(back.credential.access_token, format!("token-{i}"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.session_count().await.unwrap(), 32);
    }
}
