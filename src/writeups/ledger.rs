// src/writeups/ledger.rs
//! Local record of writeups already attached to Mixto entries.
//!
//! One SQLite table keyed by entry id. It only answers "did this machine
//! already commit a writeup for that entry"; Mixto stays authoritative.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{MixtoError, Result};

/// `~/.mixto/ctftime.sqlite`
pub fn default_ledger_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mixto").join("ctftime.sqlite"))
}

/// One imported writeup
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImportedWriteup {
    pub entry_id: String,
    pub workspace_id: String,
    pub commit_id: String,
    pub writeup: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

pub struct ImportLedger {
    pool: SqlitePool,
}

impl ImportLedger {
    /// Open (or create) the ledger file at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        debug!("Opened writeup ledger at {}", path.display());
        Ok(ledger)
    }

    /// Ledger that lives only as long as the process
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS imported_writeups (
                entry_id TEXT PRIMARY KEY,
                workspace_id TEXT NOT NULL,
                commit_id TEXT NOT NULL,
                writeup TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn has_imported(&self, entry_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM imported_writeups WHERE entry_id = ?")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Write every row of a run in one transaction. An existing row for the
    /// same entry is replaced.
    pub async fn record_imported(&self, rows: &[ImportedWriteup]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO imported_writeups
                    (entry_id, workspace_id, commit_id, writeup, title, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.entry_id)
            .bind(&row.workspace_id)
            .bind(&row.commit_id)
            .bind(&row.writeup)
            .bind(&row.title)
            .bind(row.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Recorded {} imported writeups", rows.len());
        Ok(())
    }

    /// Every recorded row, oldest first
    pub async fn imported(&self) -> Result<Vec<ImportedWriteup>> {
        let rows = sqlx::query(
            r#"
            SELECT entry_id, workspace_id, commit_id, writeup, title, created_at
            FROM imported_writeups
            ORDER BY created_at, entry_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<ImportedWriteup> {
                let created_at: String = row.try_get("created_at")?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| {
                        MixtoError::Validation(format!("bad timestamp {:?} in ledger: {}", created_at, e))
                    })?
                    .with_timezone(&Utc);

                Ok(ImportedWriteup {
                    entry_id: row.try_get("entry_id")?,
                    workspace_id: row.try_get("workspace_id")?,
                    commit_id: row.try_get("commit_id")?,
                    writeup: row.try_get("writeup")?,
                    title: row.try_get("title")?,
                    created_at,
                })
            })
            .collect()
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
