//! SQLite storage backend for ChainScan.
//!
//! Persists checkpoints and extracted events to a single SQLite file.
//! Uses `sqlx` with WAL mode for concurrent read performance.
//!
//! # Usage
//! ```rust,no_run
//! use chainscan_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./scan.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use chainscan_core::checkpoint::{Checkpoint, CheckpointStore};
use chainscan_core::error::ScanError;
use chainscan_core::types::ExtractedEvent;

use crate::EventStore;

/// SQLite-backed storage for checkpoints and extracted events.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./scan.db"`) or a full
    /// SQLite URL (`"sqlite:./scan.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, ScanError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests.
    pub async fn in_memory() -> Result<Self, ScanError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), ScanError> {
        // WAL mode — better concurrent read throughput
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        // Checkpoint table — one row per chain
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                chain_id   TEXT    NOT NULL PRIMARY KEY,
                height     INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        // Extracted events — keyed so a retried height replaces its rows
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                chain_id     TEXT    NOT NULL,
                block_height INTEGER NOT NULL,
                event_index  INTEGER NOT NULL,
                block_hash   TEXT    NOT NULL,
                section      TEXT    NOT NULL,
                method       TEXT    NOT NULL,
                data_json    TEXT    NOT NULL,
                PRIMARY KEY (chain_id, block_height, event_index)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_events_section ON events (chain_id, section, method);",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        Ok(())
    }

    // ─── Event queries ───────────────────────────────────────────────────────────

    /// All events for a chain matching `section.method`, ordered by height
    /// then event index.
    pub async fn events_by_kind(
        &self,
        chain_id: &str,
        section: &str,
        method: &str,
    ) -> Result<Vec<ExtractedEvent>, ScanError> {
        let rows = sqlx::query(
            "SELECT chain_id, block_height, event_index, block_hash, section, method, data_json
             FROM events WHERE chain_id = ? AND section = ? AND method = ?
             ORDER BY block_height, event_index",
        )
        .bind(chain_id)
        .bind(section)
        .bind(method)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScanError::Other(e.to_string()))?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    /// All events extracted at one height of a chain.
    pub async fn events_at_height(
        &self,
        chain_id: &str,
        height: u64,
    ) -> Result<Vec<ExtractedEvent>, ScanError> {
        let rows = sqlx::query(
            "SELECT chain_id, block_height, event_index, block_hash, section, method, data_json
             FROM events WHERE chain_id = ? AND block_height = ?
             ORDER BY event_index",
        )
        .bind(chain_id)
        .bind(height as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScanError::Other(e.to_string()))?;

        Ok(rows.iter().map(row_to_event).collect())
    }

    /// Total number of stored events across all chains.
    pub async fn event_count(&self) -> Result<u64, ScanError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ScanError::Other(e.to_string()))?;

        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> ExtractedEvent {
    let data_str: String = row.get("data_json");
    let data: serde_json::Value =
        serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null);

    ExtractedEvent {
        chain_id: row.get("chain_id"),
        block_height: row.get::<i64, _>("block_height") as u64,
        block_hash: row.get("block_hash"),
        event_index: row.get::<i64, _>("event_index") as u32,
        section: row.get("section"),
        method: row.get("method"),
        data,
    }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

#[async_trait]
impl EventStore for SqliteStorage {
    async fn insert_event(&self, event: &ExtractedEvent) -> Result<(), ScanError> {
        let data = serde_json::to_string(&event.data).map_err(|e| ScanError::Sink {
            height: event.block_height,
            reason: e.to_string(),
        })?;

        sqlx::query(
            "INSERT OR REPLACE INTO events
             (chain_id, block_height, event_index, block_hash, section, method, data_json)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.chain_id)
        .bind(event.block_height as i64)
        .bind(event.event_index as i64)
        .bind(&event.block_hash)
        .bind(&event.section)
        .bind(&event.method)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::Sink {
            height: event.block_height,
            reason: e.to_string(),
        })?;

        debug!(
            chain = %event.chain_id,
            height = event.block_height,
            kind = %format!("{}.{}", event.section, event.method),
            "event stored"
        );
        Ok(())
    }
}

// ─── CheckpointStore impl ────────────────────────────────────────────────────

#[async_trait]
impl CheckpointStore for SqliteStorage {
    async fn load(&self, chain_id: &str) -> Result<Option<Checkpoint>, ScanError> {
        let row = sqlx::query(
            "SELECT chain_id, height, updated_at FROM checkpoints WHERE chain_id = ?",
        )
        .bind(chain_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        Ok(row.map(|r| Checkpoint {
            chain_id: r.get("chain_id"),
            height: r.get::<i64, _>("height") as u64,
            updated_at: r.get("updated_at"),
        }))
    }

    async fn save(&self, checkpoint: Checkpoint) -> Result<(), ScanError> {
        sqlx::query(
            "INSERT OR REPLACE INTO checkpoints (chain_id, height, updated_at)
             VALUES (?, ?, ?)",
        )
        .bind(&checkpoint.chain_id)
        .bind(checkpoint.height as i64)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        debug!(
            chain = %checkpoint.chain_id,
            height = checkpoint.height,
            "checkpoint saved"
        );
        Ok(())
    }

    async fn delete(&self, chain_id: &str) -> Result<(), ScanError> {
        sqlx::query("DELETE FROM checkpoints WHERE chain_id = ?")
            .bind(chain_id)
            .execute(&self.pool)
            .await
            .map_err(|e| ScanError::Checkpoint(e.to_string()))?;

        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(height: u64, index: u32) -> ExtractedEvent {
        ExtractedEvent {
            chain_id: "consensus".into(),
            block_height: height,
            block_hash: format!("0x{height:064x}"),
            event_index: index,
            section: "rewards".into(),
            method: "BlockReward".into(),
            data: serde_json::json!({
                "voter": "st1qxyz",
                "reward": height.to_string()
            }),
        }
    }

    // ── CheckpointStore ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn checkpoint_roundtrip() {
        let store = SqliteStorage::in_memory().await.unwrap();

        store.save(Checkpoint::now("consensus", 1_000)).await.unwrap();

        let loaded = store.load("consensus").await.unwrap().unwrap();
        assert_eq!(loaded.height, 1_000);
        assert_eq!(loaded.chain_id, "consensus");
    }

    #[tokio::test]
    async fn checkpoint_upsert_keeps_one_row_per_chain() {
        let store = SqliteStorage::in_memory().await.unwrap();

        store.save(Checkpoint::now("consensus", 100)).await.unwrap();
        store.save(Checkpoint::now("consensus", 200)).await.unwrap();

        let loaded = store.load("consensus").await.unwrap().unwrap();
        assert_eq!(loaded.height, 200);
    }

    #[tokio::test]
    async fn checkpoint_missing_returns_none() {
        let store = SqliteStorage::in_memory().await.unwrap();
        assert!(store.load("unknown-chain").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn checkpoint_delete() {
        let store = SqliteStorage::in_memory().await.unwrap();

        store.save(Checkpoint::now("domain", 500)).await.unwrap();
        assert!(store.load("domain").await.unwrap().is_some());

        store.delete("domain").await.unwrap();
        assert!(store.load("domain").await.unwrap().is_none());
    }

    // ── Event storage ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn event_insert_and_query() {
        let store = SqliteStorage::in_memory().await.unwrap();

        store.insert_event(&sample_event(100, 0)).await.unwrap();
        store.insert_event(&sample_event(100, 1)).await.unwrap();
        store.insert_event(&sample_event(101, 0)).await.unwrap();

        assert_eq!(store.event_count().await.unwrap(), 3);

        let rewards = store
            .events_by_kind("consensus", "rewards", "BlockReward")
            .await
            .unwrap();
        assert_eq!(rewards.len(), 3);
        assert_eq!(rewards[0].block_height, 100);
        assert_eq!(rewards[2].block_height, 101);

        let at_100 = store.events_at_height("consensus", 100).await.unwrap();
        assert_eq!(at_100.len(), 2);
    }

    #[tokio::test]
    async fn reprocessing_a_height_is_idempotent() {
        let store = SqliteStorage::in_memory().await.unwrap();

        store.insert_event(&sample_event(100, 0)).await.unwrap();
        store.insert_event(&sample_event(100, 1)).await.unwrap();

        // Simulated retry after partial failure: same height written again.
        store.insert_event(&sample_event(100, 0)).await.unwrap();
        store.insert_event(&sample_event(100, 1)).await.unwrap();

        assert_eq!(store.event_count().await.unwrap(), 2);
        let at_100 = store.events_at_height("consensus", 100).await.unwrap();
        assert_eq!(at_100.len(), 2);
        assert_eq!(at_100[0], sample_event(100, 0));
    }

    #[tokio::test]
    async fn event_data_json_roundtrip() {
        let store = SqliteStorage::in_memory().await.unwrap();
        store.insert_event(&sample_event(999, 0)).await.unwrap();

        let loaded = store.events_at_height("consensus", 999).await.unwrap();
        assert_eq!(loaded[0].data["reward"], "999");
        assert_eq!(loaded[0].data["voter"], "st1qxyz");
    }

    #[tokio::test]
    async fn chains_are_isolated() {
        let store = SqliteStorage::in_memory().await.unwrap();

        let mut domain_ev = sample_event(100, 0);
        domain_ev.chain_id = "domain".into();

        store.insert_event(&sample_event(100, 0)).await.unwrap();
        store.insert_event(&domain_ev).await.unwrap();

        assert_eq!(store.events_at_height("consensus", 100).await.unwrap().len(), 1);
        assert_eq!(store.events_at_height("domain", 100).await.unwrap().len(), 1);
    }
}
