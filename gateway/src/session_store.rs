use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};
use tracing::{debug, warn};

/// Session store backed by the gateway's own SQLite database.
///
/// Rows live in the `sessions` table (created by the gateway migrations), so
/// login state survives restarts. Expired rows are reaped on first touch and
/// in bulk by [`SqliteSessionStore::sweep_expired`].
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Delete every row whose expiry has passed. Returns the number swept.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let swept = sqlx::query("DELETE FROM sessions WHERE expiry_date <= ?")
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(swept)
    }

    /// Background sweep every `period`. The first tick fires immediately,
    /// clearing anything left over from a previous run.
    pub async fn sweep_expired(self, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match self.delete_expired().await {
                Ok(swept) if swept > 0 => debug!(swept, "expired sessions removed"),
                Ok(_) => {}
                Err(e) => warn!("session sweep failed: {e}"),
            }
        }
    }

    async fn try_insert(&self, id: &Id, data: &str, expiry: i64) -> session_store::Result<bool> {
        let inserted = sqlx::query(
            "INSERT INTO sessions (id, data, expiry_date) VALUES (?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(id.to_string())
        .bind(data)
        .bind(expiry)
        .execute(&self.pool)
        .await
        .map_err(backend)?
        .rows_affected();
        Ok(inserted == 1)
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let data = encode(&record.data)?;
        let expiry = record.expiry_date.unix_timestamp();

        // Ids are random; a collision means the id belongs to a live session,
        // so mint a fresh one instead of overwriting that row.
        while !self.try_insert(&record.id, &data, expiry).await? {
            record.id = Id::default();
        }
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        sqlx::query("INSERT OR REPLACE INTO sessions (id, data, expiry_date) VALUES (?, ?, ?)")
            .bind(record.id.to_string())
            .bind(encode(&record.data)?)
            .bind(record.expiry_date.unix_timestamp())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT data, expiry_date FROM sessions WHERE id = ?")
                .bind(session_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        if row.expiry_date <= OffsetDateTime::now_utc().unix_timestamp() {
            // Reap on touch; the sweeper catches rows nobody asks for again.
            self.delete(session_id).await?;
            return Ok(None);
        }

        let expiry_date = OffsetDateTime::from_unix_timestamp(row.expiry_date)
            .map_err(|e| session_store::Error::Decode(e.to_string()))?;
        Ok(Some(Record {
            id: *session_id,
            data: decode(&row.data)?,
            expiry_date,
        }))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    data: String,
    expiry_date: i64,
}

fn encode(data: &HashMap<String, serde_json::Value>) -> session_store::Result<String> {
    serde_json::to_string(data).map_err(|e| session_store::Error::Encode(e.to_string()))
}

fn decode(data: &str) -> session_store::Result<HashMap<String, serde_json::Value>> {
    serde_json::from_str(data).map_err(|e| session_store::Error::Decode(e.to_string()))
}

fn backend(e: sqlx::Error) -> session_store::Error {
    session_store::Error::Backend(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::Duration;

    async fn test_store() -> (SqliteSessionStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/gateway.db", tmp.path().display());
        let pool = crate::db::connect(&url).await.unwrap();
        (SqliteSessionStore::new(pool), tmp)
    }

    fn record_expiring_in(seconds: i64) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + Duration::seconds(seconds),
        }
    }

    #[tokio::test]
    async fn create_load_roundtrip_preserves_data() {
        let (store, _tmp) = test_store().await;
        let mut record = record_expiring_in(3600);
        record.data.insert("user_id".into(), json!("u-123"));

        store.create(&mut record).await.unwrap();
        let loaded = store.load(&record.id).await.unwrap().unwrap();

        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.data["user_id"], json!("u-123"));
    }

    #[tokio::test]
    async fn create_mints_a_fresh_id_on_collision() {
        let (store, _tmp) = test_store().await;
        let mut first = record_expiring_in(3600);
        store.create(&mut first).await.unwrap();

        let mut second = record_expiring_in(3600);
        second.id = first.id;
        store.create(&mut second).await.unwrap();

        assert_ne!(second.id, first.id);
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn expired_rows_do_not_load_and_are_reaped() {
        let (store, _tmp) = test_store().await;
        let mut record = record_expiring_in(-60);
        store.create(&mut record).await.unwrap();

        assert!(store.load(&record.id).await.unwrap().is_none());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn delete_expired_spares_live_sessions() {
        let (store, _tmp) = test_store().await;
        let mut live = record_expiring_in(3600);
        let mut stale = record_expiring_in(-3600);
        store.create(&mut live).await.unwrap();
        store.create(&mut stale).await.unwrap();

        let swept = store.delete_expired().await.unwrap();
        assert_eq!(swept, 1);
        assert!(store.load(&live.id).await.unwrap().is_some());
    }
}
