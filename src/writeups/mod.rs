// src/writeups/mod.rs
//! Writeup import: attach public writeups to the Mixto entries they solve.
//!
//! Entries are matched to a writeup source's task names by title, the
//! original writeup link is committed as a `url` commit, and each success is
//! remembered in the local ledger so later runs skip it.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::client::{MixtoClient, NewCommit};
use crate::error::Result;
use crate::progress::ProgressIndicator;
use crate::types::CommitType;

pub mod ctftime;
pub mod ledger;

pub use ctftime::CtftimeClient;
pub use ledger::{default_ledger_path, ImportLedger, ImportedWriteup};

/// Site that lists tasks of an event and writeups for each task
#[async_trait]
pub trait WriteupSource: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercased task name -> task path, for tasks that have writeups
    async fn event_tasks(&self, event_id: &str) -> Result<HashMap<String, String>>;

    /// Path of the first writeup listed for a task
    async fn task_writeup(&self, task_path: &str) -> Result<Option<String>>;

    /// External URL the writeup page points at
    async fn original_writeup(&self, writeup_path: &str) -> Result<Option<String>>;
}

/// A Mixto entry whose title matched a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteupMatch {
    pub entry_id: String,
    pub title: String,
    pub task_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteupStatus {
    Imported,
    DryRun,
    NoWriteup,
}

/// Per-entry result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteupResult {
    pub entry_id: String,
    pub title: String,
    pub task_path: String,
    pub writeup: Option<String>,
    pub commit_id: Option<String>,
    pub status: WriteupStatus,
}

pub struct WriteupImporter<'a> {
    client: &'a MixtoClient,
    source: &'a dyn WriteupSource,
    ledger: &'a ImportLedger,
    event_id: String,
    workspace: Option<String>,
}

impl<'a> WriteupImporter<'a> {
    pub fn new(
        client: &'a MixtoClient,
        source: &'a dyn WriteupSource,
        ledger: &'a ImportLedger,
        event_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source,
            ledger,
            event_id: event_id.into(),
            workspace: None,
        }
    }

    pub fn workspace(mut self, workspace: Option<String>) -> Self {
        self.workspace = workspace;
        self
    }

    /// Workspace entries whose title names a task of the event.
    ///
    /// Entries already in the ledger are left out unless `force` is set.
    pub async fn match_mixto_entries(&self, force: bool) -> Result<Vec<WriteupMatch>> {
        let entries = self
            .client
            .list_entries(self.workspace.as_deref(), false)
            .await?;
        let tasks = self.source.event_tasks(&self.event_id).await?;

        let mut matches = Vec::new();
        for entry in entries {
            let Some(task_path) = tasks.get(&entry.title.to_lowercase()) else {
                continue;
            };
            if !force && self.ledger.has_imported(&entry.entry_id).await? {
                info!("Skipping {} ({}), writeup already imported", entry.title, entry.entry_id);
                continue;
            }
            matches.push(WriteupMatch {
                entry_id: entry.entry_id,
                title: entry.title,
                task_path: task_path.clone(),
            });
        }

        info!(
            "{} Mixto entries match {} tasks",
            matches.len(),
            self.source.name()
        );
        Ok(matches)
    }

    /// Resolve and commit a writeup for every matched entry.
    ///
    /// The ledger is written once at the end of the run with every commit
    /// that went through, also when a later match fails.
    pub async fn run(
        &self,
        dry_run: bool,
        force: bool,
        progress: &ProgressIndicator,
    ) -> Result<Vec<WriteupResult>> {
        let workspace = self
            .client
            .config()
            .require_workspace(self.workspace.as_deref())?;
        let matches = self.match_mixto_entries(force).await?;

        let mut results = Vec::with_capacity(matches.len());
        let mut imported = Vec::new();

        let outcome = self
            .import_matches(matches, &workspace, dry_run, progress, &mut results, &mut imported)
            .await;
        progress.finish();

        self.ledger.record_imported(&imported).await?;
        info!("Imported {} writeups", imported.len());

        outcome?;
        Ok(results)
    }

    async fn import_matches(
        &self,
        matches: Vec<WriteupMatch>,
        workspace: &str,
        dry_run: bool,
        progress: &ProgressIndicator,
        results: &mut Vec<WriteupResult>,
        imported: &mut Vec<ImportedWriteup>,
    ) -> Result<()> {
        for (i, m) in matches.into_iter().enumerate() {
            progress.set_message(format!("[{}] {}", i + 1, m.title));

            let writeup = match self.source.task_writeup(&m.task_path).await? {
                Some(path) => self.source.original_writeup(&path).await?,
                None => None,
            };

            let Some(url) = writeup else {
                progress.suspend(|| warn!("No original writeup link for {}", m.title));
                results.push(WriteupResult {
                    entry_id: m.entry_id,
                    title: m.title,
                    task_path: m.task_path,
                    writeup: None,
                    commit_id: None,
                    status: WriteupStatus::NoWriteup,
                });
                continue;
            };

            if dry_run {
                results.push(WriteupResult {
                    entry_id: m.entry_id,
                    title: m.title,
                    task_path: m.task_path,
                    writeup: Some(url),
                    commit_id: None,
                    status: WriteupStatus::DryRun,
                });
                continue;
            }

            let commit = self
                .client
                .add_commit(
                    Some(&m.entry_id),
                    NewCommit::new(url.clone())
                        .title(m.title.clone())
                        .commit_type(CommitType::Url)
                        .field("documentation", Value::Bool(true)),
                )
                .await?;

            imported.push(ImportedWriteup {
                entry_id: m.entry_id.clone(),
                workspace_id: workspace.to_string(),
                commit_id: commit.commit_id.clone(),
                writeup: url.clone(),
                title: m.title.clone(),
                created_at: Utc::now(),
            });
            results.push(WriteupResult {
                entry_id: m.entry_id,
                title: m.title,
                task_path: m.task_path,
                writeup: Some(url),
                commit_id: Some(commit.commit_id),
                status: WriteupStatus::Imported,
            });
        }
        Ok(())
    }
}
