// src/output/mod.rs
//! Output of command results: human, JSON Lines or CSV on stdout.
//!
//! Logs go to stderr, so whatever a handler writes can be piped.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Commit, Entry, NewEntry, Note, Workspace};
use crate::writeups::WriteupResult;

pub mod csv;
pub mod human;
pub mod json;

/// One result row
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Workspace(&'a Workspace),
    Entry(&'a Entry),
    Commit(&'a Commit),
    Note(&'a Note),
    /// Entry that a dry-run import would create
    Planned(&'a NewEntry),
    Writeup(&'a WriteupResult),
}

impl Record<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Workspace(_) => "workspace",
            Record::Entry(_) => "entry",
            Record::Commit(_) => "commit",
            Record::Note(_) => "note",
            Record::Planned(_) => "planned_entry",
            Record::Writeup(_) => "writeup",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Record::Workspace(w) => serde_json::to_value(w),
            Record::Entry(e) => serde_json::to_value(e),
            Record::Commit(c) => serde_json::to_value(c),
            Record::Note(n) => serde_json::to_value(n),
            Record::Planned(p) => serde_json::to_value(p),
            Record::Writeup(w) => serde_json::to_value(w),
        }
    }

    /// Column names for CSV output
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Record::Workspace(_) => &["workspace_id", "workspace_name", "entries_count"],
            Record::Entry(_) => &["entry_id", "title", "category", "commits"],
            Record::Commit(_) => &["commit_id", "entry_id", "commit_type", "title", "data"],
            Record::Note(_) => &["note_id", "entry_id", "title", "data"],
            Record::Planned(_) => &["title", "category"],
            Record::Writeup(_) => &["entry_id", "title", "status", "writeup", "commit_id"],
        }
    }

    /// Field values in `columns()` order
    pub fn values(&self) -> Vec<String> {
        match self {
            Record::Workspace(w) => vec![
                w.workspace_id.clone(),
                w.workspace_name.clone(),
                w.entries_count.map(|c| c.to_string()).unwrap_or_default(),
            ],
            Record::Entry(e) => vec![
                e.entry_id.clone(),
                e.title.clone(),
                e.category.clone(),
                e.commits
                    .as_ref()
                    .map(|c| c.len().to_string())
                    .unwrap_or_default(),
            ],
            Record::Commit(c) => vec![
                c.commit_id.clone(),
                c.entry_id.clone(),
                c.commit_type.clone(),
                c.title.clone(),
                c.data.clone(),
            ],
            Record::Note(n) => vec![
                n.note_id.clone(),
                n.entry_id.clone(),
                n.title.clone(),
                n.data.clone(),
            ],
            Record::Planned(p) => vec![p.title.clone(), p.category.clone()],
            Record::Writeup(w) => vec![
                w.entry_id.clone(),
                w.title.clone(),
                writeup_status(w).to_string(),
                w.writeup.clone().unwrap_or_default(),
                w.commit_id.clone().unwrap_or_default(),
            ],
        }
    }
}

pub(crate) fn writeup_status(result: &WriteupResult) -> &'static str {
    use crate::writeups::WriteupStatus;
    match result.status {
        WriteupStatus::Imported => "imported",
        WriteupStatus::DryRun => "dry_run",
        WriteupStatus::NoWriteup => "no_writeup",
    }
}

/// Destination for command results
#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn emit(&self, record: Record<'_>) -> anyhow::Result<()>;

    /// Free-form status line; machine formats ignore it
    async fn message(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Csv,
}

impl OutputFormat {
    /// Handler writing this format to stdout
    pub fn handler(&self) -> Box<dyn OutputHandler> {
        match self {
            OutputFormat::Human => Box::new(self::human::HumanOutput::new()),
            OutputFormat::Json => Box::new(self::json::JsonOutput::new()),
            OutputFormat::Csv => Box::new(self::csv::CsvOutput::new()),
        }
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("output writer lock poisoned")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_match_values() {
        let entry = Entry {
            entry_id: "e1".to_string(),
            title: "Baby ROP".to_string(),
            category: "pwn".to_string(),
            workspace: "ws".to_string(),
            commits: Some(vec![]),
        };
        let planned = NewEntry::new("a", "web");
        for record in [Record::Entry(&entry), Record::Planned(&planned)] {
            assert_eq!(record.columns().len(), record.values().len());
        }
        assert_eq!(Record::Entry(&entry).values()[3], "0");
    }

    #[test]
    fn test_json_of_planned_entry() {
        let planned = NewEntry::new("a", "web");
        assert_eq!(
            Record::Planned(&planned).to_json().unwrap(),
            serde_json::json!({"title": "a", "category": "web"})
        );
    }
}
