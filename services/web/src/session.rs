//! Session storage
//!
//! Sessions are server-side records keyed by an opaque token. The in-memory
//! backend lives as long as the process; the Redis backend lets several
//! instances share sessions and relies on key TTLs for expiry.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{
    cache::RedisPool,
    error::{DatabaseError, DatabaseResult},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::models::{Session, SessionToken};

/// Session store
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a new session for `user_id`
    async fn create(&self, user_id: Uuid) -> DatabaseResult<Session>;

    /// Look up a live session; expired sessions are reported as absent
    async fn get(&self, token: &SessionToken) -> DatabaseResult<Option<Session>>;

    /// Destroy a session; destroying an unknown session is not an error
    async fn destroy(&self, token: &SessionToken) -> DatabaseResult<()>;
}

fn new_session(user_id: Uuid, ttl: Duration) -> Session {
    Session {
        token: SessionToken::generate(),
        user_id,
        expires_at: Utc::now() + ttl,
    }
}

/// Process-local session store
#[derive(Clone)]
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Arc<Mutex<HashMap<SessionToken, Session>>>,
}

impl MemorySessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or(Duration::hours(24)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Uuid) -> DatabaseResult<Session> {
        let session = new_session(user_id, self.ttl);
        let now = Utc::now();

        let mut sessions = self.sessions.lock().await;
        // Sweep on write so abandoned sessions do not accumulate.
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());

        Ok(session)
    }

    async fn get(&self, token: &SessionToken) -> DatabaseResult<Option<Session>> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some(session) if session.is_expired(Utc::now()) => {
                sessions.remove(token);
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn destroy(&self, token: &SessionToken) -> DatabaseResult<()> {
        self.sessions.lock().await.remove(token);
        Ok(())
    }
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool, ttl: std::time::Duration) -> Self {
        Self {
            redis_pool,
            ttl: Duration::from_std(ttl).unwrap_or(Duration::hours(24)),
        }
    }

    fn session_key(token: &SessionToken) -> String {
        format!("session:{}", token.as_str())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, user_id: Uuid) -> DatabaseResult<Session> {
        info!("Creating session for user: {}", user_id);

        let session = new_session(user_id, self.ttl);
        let value =
            serde_json::to_string(&session).map_err(|e| DatabaseError::Corrupt(e.to_string()))?;
        let ttl_seconds = u64::try_from(self.ttl.num_seconds()).unwrap_or(1);

        self.redis_pool
            .set_ex(&Self::session_key(&session.token), &value, ttl_seconds)
            .await?;

        Ok(session)
    }

    async fn get(&self, token: &SessionToken) -> DatabaseResult<Option<Session>> {
        let Some(value) = self.redis_pool.get(&Self::session_key(token)).await? else {
            return Ok(None);
        };

        let session: Session =
            serde_json::from_str(&value).map_err(|e| DatabaseError::Corrupt(e.to_string()))?;

        if session.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn destroy(&self, token: &SessionToken) -> DatabaseResult<()> {
        self.redis_pool.delete(&Self::session_key(token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::cache::RedisConfig;

    #[tokio::test]
    async fn test_memory_session_lifecycle() {
        let store = MemorySessionStore::new(std::time::Duration::from_secs(60));
        let user_id = Uuid::new_v4();

        let session = store.create(user_id).await.unwrap();
        let found = store.get(&session.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);

        store.destroy(&session.token).await.unwrap();
        assert!(store.get(&session.token).await.unwrap().is_none());

        // Idempotent
        store.destroy(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_session_expires() {
        let store = MemorySessionStore::new(std::time::Duration::ZERO);
        let session = store.create(Uuid::new_v4()).await.unwrap();
        assert!(store.get(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let store = MemorySessionStore::new(std::time::Duration::from_secs(60));
        let token = SessionToken::from_client("not-a-session");
        assert!(store.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_redis_session_lifecycle() -> DatabaseResult<()> {
        let pool = RedisPool::new(&RedisConfig {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "qr-test".to_string(),
        })
        .await?;
        let store = RedisSessionStore::new(pool, std::time::Duration::from_secs(60));

        let user_id = Uuid::new_v4();
        let session = store.create(user_id).await?;
        assert_eq!(store.get(&session.token).await?.map(|s| s.user_id), Some(user_id));

        store.destroy(&session.token).await?;
        assert!(store.get(&session.token).await?.is_none());
        Ok(())
    }
}
