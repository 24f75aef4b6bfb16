//! Metadata store trait and implementations.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{ChunkRepo, FileRepo, ReceiptRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: ChunkRepo + FileRepo + ReceiptRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and apply the schema.
    ///
    /// Pass `:memory:` as the path for a private in-memory database.
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: Option<u64>) -> MetadataResult<Self> {
        let path = path.as_ref();
        let in_memory = path.as_os_str() == ":memory:";
        let busy_timeout = Duration::from_secs(busy_timeout_secs.unwrap_or(30));

        if !in_memory && let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        let mut pool_options = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // serializes writers inside the process.
            .max_connections(1);
        if in_memory {
            // The database lives only as long as its connection.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(opts).await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "opened sqlite metadata store");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use crate::repos::ChunkStats;
    use time::OffsetDateTime;

    #[async_trait]
    impl ChunkRepo for SqliteStore {
        async fn get_chunk_by_hash(&self, chunk_hash: &str) -> MetadataResult<Option<ChunkRow>> {
            let row = sqlx::query_as::<_, ChunkRow>(
                "SELECT chunk_id, chunk_hash, size_bytes, created_at FROM chunks WHERE chunk_hash = ?",
            )
            .bind(chunk_hash)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn chunk_exists(&self, chunk_hash: &str) -> MetadataResult<bool> {
            let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM chunks WHERE chunk_hash = ?")
                .bind(chunk_hash)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row.is_some())
        }

        async fn insert_chunk_or_get(
            &self,
            chunk_hash: &str,
            size_bytes: i64,
        ) -> MetadataResult<(ChunkRow, bool)> {
            let inserted = sqlx::query_as::<_, ChunkRow>(
                r#"
                INSERT INTO chunks (chunk_hash, size_bytes, created_at)
                VALUES (?, ?, ?)
                ON CONFLICT(chunk_hash) DO NOTHING
                RETURNING chunk_id, chunk_hash, size_bytes, created_at
                "#,
            )
            .bind(chunk_hash)
            .bind(size_bytes)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = inserted {
                return Ok((row, true));
            }

            // Lost the race (or the chunk was already known): the row exists.
            let existing = self.get_chunk_by_hash(chunk_hash).await?.ok_or_else(|| {
                MetadataError::Internal(format!(
                    "chunk {chunk_hash} conflicted on insert but could not be read back"
                ))
            })?;
            Ok((existing, false))
        }

        async fn get_stats(&self) -> MetadataResult<ChunkStats> {
            let chunks: (i64, i64) =
                sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM chunks")
                    .fetch_one(&self.pool)
                    .await?;

            let files: (i64, i64) =
                sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_size), 0) FROM files")
                    .fetch_one(&self.pool)
                    .await?;

            let links: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM file_chunks")
                .fetch_one(&self.pool)
                .await?;

            Ok(ChunkStats {
                chunk_count: chunks.0 as u64,
                stored_bytes: chunks.1 as u64,
                file_count: files.0 as u64,
                logical_bytes: files.1 as u64,
                chunk_references: links.0 as u64,
            })
        }
    }

    #[async_trait]
    impl FileRepo for SqliteStore {
        async fn get_file_by_cid(&self, cid: &str) -> MetadataResult<Option<FileRow>> {
            let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE cid = ?")
                .bind(cid)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn create_file_with_chunks(
            &self,
            file: &NewFile,
            chunk_ids: &[i64],
        ) -> MetadataResult<(FileRow, bool)> {
            if chunk_ids.is_empty() {
                return Err(MetadataError::Constraint(format!(
                    "file {} must reference at least one chunk",
                    file.cid
                )));
            }
            if chunk_ids.len() as i64 != file.chunk_count {
                return Err(MetadataError::Constraint(format!(
                    "file {} declares {} chunks but {} links were supplied",
                    file.cid,
                    file.chunk_count,
                    chunk_ids.len()
                )));
            }

            // The file row and all of its links are committed together, or
            // neither is. Dropping `tx` on an error path rolls back.
            let mut tx = self.pool.begin().await?;

            let inserted = sqlx::query_as::<_, FileRow>(
                r#"
                INSERT INTO files (cid, filename, mime_type, uploader, total_size, chunk_count, merkle_root, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(cid) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(&file.cid)
            .bind(&file.filename)
            .bind(&file.mime_type)
            .bind(&file.uploader)
            .bind(file.total_size)
            .bind(file.chunk_count)
            .bind(&file.merkle_root)
            .bind(file.created_at)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(row) = inserted else {
                let existing = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE cid = ?")
                    .bind(&file.cid)
                    .fetch_one(&mut *tx)
                    .await?;
                tx.commit().await?;
                return Ok((existing, false));
            };

            for (position, chunk_id) in chunk_ids.iter().enumerate() {
                sqlx::query("INSERT INTO file_chunks (file_id, chunk_id, position) VALUES (?, ?, ?)")
                    .bind(row.file_id)
                    .bind(*chunk_id)
                    .bind(position as i64)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok((row, true))
        }

        async fn get_file_chunks(&self, file_id: i64) -> MetadataResult<Vec<FileChunkRow>> {
            let rows = sqlx::query_as::<_, FileChunkRow>(
                r#"
                SELECT fc.position, fc.chunk_id, c.chunk_hash, c.size_bytes
                FROM file_chunks fc
                JOIN chunks c ON c.chunk_id = fc.chunk_id
                WHERE fc.file_id = ?
                ORDER BY fc.position ASC
                "#,
            )
            .bind(file_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl ReceiptRepo for SqliteStore {
        async fn create_receipt(&self, receipt: &NewReceipt) -> MetadataResult<ReceiptRow> {
            let row = sqlx::query_as::<_, ReceiptRow>(
                r#"
                INSERT INTO receipts (file_id, receipt_type, payload, signature, created_at)
                VALUES (?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(receipt.file_id)
            .bind(&receipt.receipt_type)
            .bind(&receipt.payload)
            .bind(&receipt.signature)
            .bind(receipt.created_at)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn list_receipts(&self, file_id: i64) -> MetadataResult<Vec<ReceiptRow>> {
            let rows = sqlx::query_as::<_, ReceiptRow>(
                "SELECT * FROM receipts WHERE file_id = ? ORDER BY receipt_id ASC",
            )
            .bind(file_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Unique chunks, one row per content hash
CREATE TABLE IF NOT EXISTS chunks (
    chunk_id INTEGER PRIMARY KEY AUTOINCREMENT,
    chunk_hash TEXT NOT NULL UNIQUE,
    size_bytes INTEGER NOT NULL CHECK (size_bytes >= 0),
    created_at TEXT NOT NULL
);

-- Files, addressed by CID
CREATE TABLE IF NOT EXISTS files (
    file_id INTEGER PRIMARY KEY AUTOINCREMENT,
    cid TEXT NOT NULL UNIQUE,
    filename TEXT,
    mime_type TEXT,
    uploader TEXT,
    total_size INTEGER NOT NULL CHECK (total_size >= 0),
    chunk_count INTEGER NOT NULL CHECK (chunk_count >= 1),
    merkle_root TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Ordered file-to-chunk links
CREATE TABLE IF NOT EXISTS file_chunks (
    file_id INTEGER NOT NULL REFERENCES files(file_id),
    chunk_id INTEGER NOT NULL REFERENCES chunks(chunk_id),
    position INTEGER NOT NULL CHECK (position >= 0),
    PRIMARY KEY (file_id, position)
);
CREATE INDEX IF NOT EXISTS idx_file_chunks_chunk ON file_chunks(chunk_id);

-- Append-only receipts
CREATE TABLE IF NOT EXISTS receipts (
    receipt_id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(file_id),
    receipt_type TEXT NOT NULL CHECK (receipt_type IN ('ingest', 'retrieve')),
    payload TEXT NOT NULL,
    signature TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_receipts_file ON receipts(file_id, receipt_id);
"#;
