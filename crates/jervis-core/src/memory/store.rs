//! Session storage backends: an in-memory store for development/testing and
//! a Redis-backed store for production.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use redis::AsyncCommands;

use super::SessionContext;
use crate::error::{Error, Result};

/// Session store trait for abstracting storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session by key
    async fn get(&self, session_key: &str) -> Result<Option<SessionContext>>;

    /// Save a session
    async fn save(&self, session: &SessionContext) -> Result<()>;

    /// Delete a session
    async fn delete(&self, session_key: &str) -> Result<bool>;

    /// Check if a session exists
    async fn exists(&self, session_key: &str) -> Result<bool>;

    /// List all session keys (use with caution in production)
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Get session count
    async fn count(&self) -> Result<usize>;

    /// Cleanup expired sessions
    async fn cleanup_expired(&self) -> Result<usize>;
}

/// In-memory [`SessionStore`], for development and tests. Not shared across
/// processes; state is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SessionContext>>,
}

impl MemoryStore {
    /// Build an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, SessionContext>>> {
        self.sessions
            .read()
            .map_err(|_| Error::Memory("session store lock poisoned".to_string()))
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, SessionContext>>> {
        self.sessions
            .write()
            .map_err(|_| Error::Memory("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_key: &str) -> Result<Option<SessionContext>> {
        Ok(self.lock_read()?.get(session_key).cloned())
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        self.lock_write()?
            .insert(session.session_key.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_key: &str) -> Result<bool> {
        Ok(self.lock_write()?.remove(session_key).is_some())
    }

    async fn exists(&self, session_key: &str) -> Result<bool> {
        Ok(self.lock_read()?.contains_key(session_key))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.lock_read()?.keys().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.lock_read()?.len())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        // No expiry tracked in-memory; callers relying on TTL semantics
        // should use `RedisStore` instead.
        Ok(0)
    }
}

/// Redis-backed [`SessionStore`], for production. Sessions are serialized as
/// JSON under a configurable key prefix, with a TTL refreshed on every save.
pub struct RedisStore {
    client: redis::Client,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisStore {
    /// Connect to `redis_url`, namespacing keys under `key_prefix` and
    /// expiring sessions after `ttl_secs` of inactivity.
    pub fn new(redis_url: &str, key_prefix: impl Into<String>, ttl_secs: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Memory(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            ttl_secs,
        })
    }

    fn key(&self, session_key: &str) -> String {
        format!("{}:{}", self.key_prefix, session_key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Memory(format!("redis connection failed: {e}")))
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, session_key: &str) -> Result<Option<SessionContext>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.key(session_key))
            .await
            .map_err(|e| Error::Memory(format!("redis get failed: {e}")))?;
        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Error::Memory(format!("corrupt session record: {e}"))),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(session)
            .map_err(|e| Error::Memory(format!("failed to serialize session: {e}")))?;
        conn.set_ex::<_, _, ()>(self.key(&session.session_key), json, self.ttl_secs)
            .await
            .map_err(|e| Error::Memory(format!("redis set failed: {e}")))
    }

    async fn delete(&self, session_key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn
            .del(self.key(session_key))
            .await
            .map_err(|e| Error::Memory(format!("redis del failed: {e}")))?;
        Ok(removed > 0)
    }

    async fn exists(&self, session_key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.exists(self.key(session_key))
            .await
            .map_err(|e| Error::Memory(format!("redis exists failed: {e}")))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}:*", self.key_prefix);
        let keys: Vec<String> = conn
            .keys(pattern)
            .await
            .map_err(|e| Error::Memory(format!("redis keys failed: {e}")))?;
        let prefix = format!("{}:", self.key_prefix);
        Ok(keys
            .into_iter()
            .map(|k| k.trim_start_matches(&prefix).to_string())
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.list_keys().await?.len())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        // Redis expires keys on its own via the TTL set in `save`.
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_a_session() {
        let store = MemoryStore::new();
        let session = SessionContext::new("chan:1:user");
        store.save(&session).await.unwrap();

        assert!(store.exists("chan:1:user").await.unwrap());
        let fetched = store.get("chan:1:user").await.unwrap().unwrap();
        assert_eq!(fetched.session_key, session.session_key);
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.delete("chan:1:user").await.unwrap());
        assert!(!store.exists("chan:1:user").await.unwrap());
    }

    #[tokio::test]
    async fn memory_store_missing_session_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }
}
