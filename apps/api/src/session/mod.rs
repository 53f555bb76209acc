//! Session store: one canonical record per session identity.
//!
//! The store owns expiry. `set` replaces the previous record in a single step,
//! so a render after a submission never sees a half-updated record.
//!
//! `AppState` holds an `Arc<dyn SessionStore>`: Redis when `REDIS_URL` is
//! configured, the in-process store otherwise.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::fields::ResumeFields;
use crate::resume::{build_record, ResumeRecord};
use crate::validation::ValidationFailure;

/// Upper bound on any session TTL.
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

const REDIS_KEY_PREFIX: &str = "cvforge:session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("stored session record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("stored session record failed validation: {0}")]
    Invalid(#[from] ValidationFailure),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: Uuid) -> Result<Option<Arc<ResumeRecord>>, SessionError>;
    async fn set(&self, session: Uuid, record: Arc<ResumeRecord>) -> Result<(), SessionError>;
    async fn clear(&self, session: Uuid) -> Result<(), SessionError>;
}

fn ttl_duration(ttl_secs: u64) -> Duration {
    // bounded above, so the cast and the constructor cannot overflow
    Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64)
}

// ────────────────────────────────────────────────────────────────────────────
// In-process store
// ────────────────────────────────────────────────────────────────────────────

struct Entry {
    record: Arc<ResumeRecord>,
    expires_at: DateTime<Utc>,
}

/// In-process store with lazy expiry. Expired entries are dropped when read
/// and swept on every write.
pub struct MemorySessionStore {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, Entry>>,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: ttl_duration(ttl_secs),
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session: Uuid) -> Result<Option<Arc<ResumeRecord>>, SessionError> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(&session) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.record.clone())),
                Some(_) => {}
            }
        }
        // expired: evict under the write lock unless a newer set won the race
        let mut entries = self.entries.write().await;
        if entries.get(&session).is_some_and(|e| e.expires_at <= now) {
            entries.remove(&session);
            debug!(%session, "Session expired");
        }
        Ok(None)
    }

    async fn set(&self, session: Uuid, record: Arc<ResumeRecord>) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            session,
            Entry {
                record,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn clear(&self, session: Uuid) -> Result<(), SessionError> {
        self.entries.write().await.remove(&session);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis store
// ────────────────────────────────────────────────────────────────────────────

/// Serializes a record as the field map it was built from.
fn encode_record(record: &ResumeRecord) -> Result<String, SessionError> {
    Ok(serde_json::to_string(&record.to_fields())?)
}

/// Rebuilds a record from stored fields, re-applying every normalization and
/// validation rule, so nothing read back from the backend is trusted as-is.
fn decode_record(json: &str) -> Result<ResumeRecord, SessionError> {
    let fields: ResumeFields = serde_json::from_str(json)?;
    Ok(build_record(&fields)?)
}

/// Records stored as JSON field maps under `cvforge:session:{id}` with a Redis-side TTL.
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self {
            client,
            ttl_secs: ttl_secs.clamp(1, MAX_TTL_SECS),
        }
    }

    pub fn key(session: Uuid) -> String {
        format!("{REDIS_KEY_PREFIX}:{session}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session: Uuid) -> Result<Option<Arc<ResumeRecord>>, SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(session))
            .query_async(&mut conn)
            .await?;
        let record = raw.as_deref().map(decode_record).transpose()?;
        Ok(record.map(Arc::new))
    }

    async fn set(&self, session: Uuid, record: Arc<ResumeRecord>) -> Result<(), SessionError> {
        let json = encode_record(&record)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(session))
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn clear(&self, session: Uuid) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL")
            .arg(Self::key(session))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::{full_record, minimal_record};

    #[tokio::test]
    async fn test_set_get_clear() {
        let store = MemorySessionStore::new(3600);
        let session = Uuid::new_v4();

        assert!(store.get(session).await.unwrap().is_none());

        store.set(session, Arc::new(minimal_record())).await.unwrap();
        let got = store.get(session).await.unwrap().unwrap();
        assert_eq!(got.name(), "Jane Doe");

        store.clear(session).await.unwrap();
        assert!(store.get(session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_submission_replaces_previous() {
        let store = MemorySessionStore::new(3600);
        let session = Uuid::new_v4();
        store.set(session, Arc::new(minimal_record())).await.unwrap();
        store.set(session, Arc::new(full_record())).await.unwrap();

        let got = store.get(session).await.unwrap().unwrap();
        assert_eq!(got.as_ref(), &full_record());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemorySessionStore::new(3600);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.set(a, Arc::new(minimal_record())).await.unwrap();
        assert!(store.get(b).await.unwrap().is_none());
        store.clear(b).await.unwrap();
        assert!(store.get(a).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_records_are_evicted() {
        let store = MemorySessionStore::new(0);
        let session = Uuid::new_v4();
        store.set(session, Arc::new(minimal_record())).await.unwrap();
        assert!(store.get(session).await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_redis_key_layout() {
        let session = Uuid::nil();
        assert_eq!(
            RedisSessionStore::key(session),
            "cvforge:session:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_stored_record_rebuilds_equal() {
        for record in [minimal_record(), full_record()] {
            let json = encode_record(&record).unwrap();
            assert_eq!(decode_record(&json).unwrap(), record);
        }
    }

    #[test]
    fn test_tampered_record_is_rejected() {
        let json = r#"{"name":"Jane Doe","email":"jane@example.com","role":"Engineer","theme":"neon"}"#;
        assert!(matches!(decode_record(json), Err(SessionError::Invalid(_))));

        let json = r#"{"name":"","email":"jane@example.com","role":"Engineer"}"#;
        assert!(matches!(decode_record(json), Err(SessionError::Invalid(_))));

        assert!(matches!(decode_record("not json"), Err(SessionError::Corrupt(_))));
    }

    #[test]
    fn test_stored_markup_is_sanitized_on_load() {
        let json = r#"{"name":"Jane Doe","email":"jane@example.com","role":"Engineer","summary":"<script>alert(1)</script>Ships"}"#;
        let record = decode_record(json).unwrap();
        assert!(!record.summary().unwrap_or_default().contains('<'));
    }
}
