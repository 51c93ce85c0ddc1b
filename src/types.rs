// src/types.rs
//! Records exchanged with the Mixto service.
//!
//! The client only models these in transit; identity is always assigned by
//! the remote side. Older Mixto releases used `workspace` / `type` where newer
//! ones use `workspace_id` / `commit_type`, so both spellings are accepted
//! when decoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of artifact attached to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Tool,
    Url,
    Script,
    Documentation,
    Stdout,
    Dump,
}

impl CommitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Tool => "tool",
            CommitType::Url => "url",
            CommitType::Script => "script",
            CommitType::Documentation => "documentation",
            CommitType::Stdout => "stdout",
            CommitType::Dump => "dump",
        }
    }
}

impl Default for CommitType {
    fn default() -> Self {
        CommitType::Tool
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of tracked work, e.g. a single CTF challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryWire")]
pub struct Entry {
    pub entry_id: String,

    pub title: String,

    #[serde(default)]
    pub category: String,

    pub workspace: String,

    /// Only present when commits were requested while listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<Vec<Commit>>,
}

#[derive(Deserialize)]
struct EntryWire {
    entry_id: String,
    title: String,
    #[serde(default)]
    category: String,
    workspace_id: Option<String>,
    workspace: Option<String>,
    #[serde(default)]
    commits: Option<Vec<Commit>>,
}

impl From<EntryWire> for Entry {
    fn from(wire: EntryWire) -> Self {
        Entry {
            entry_id: wire.entry_id,
            title: wire.title,
            category: wire.category,
            workspace: wire.workspace_id.or(wire.workspace).unwrap_or_default(),
            commits: wire.commits,
        }
    }
}

/// An immutable artifact attached to an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CommitWire")]
pub struct Commit {
    pub commit_id: String,
    pub entry_id: String,
    pub commit_type: String,
    pub title: String,
    pub data: String,
    pub meta: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct CommitWire {
    commit_id: String,
    #[serde(default)]
    entry_id: String,
    commit_type: Option<String>,
    #[serde(rename = "type")]
    legacy_type: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    meta: serde_json::Map<String, serde_json::Value>,
}

impl From<CommitWire> for Commit {
    fn from(wire: CommitWire) -> Self {
        Commit {
            commit_id: wire.commit_id,
            entry_id: wire.entry_id,
            commit_type: wire.commit_type.or(wire.legacy_type).unwrap_or_default(),
            title: wire.title,
            data: wire.data,
            meta: wire.meta,
        }
    }
}

/// Free-text annotation on an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: String,

    #[serde(default)]
    pub entry_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkspaceWire")]
pub struct Workspace {
    pub workspace_id: String,
    pub workspace_name: String,
    pub entries_count: Option<u64>,
}

#[derive(Deserialize)]
struct WorkspaceWire {
    workspace_id: Option<String>,
    workspace: Option<String>,
    #[serde(default)]
    workspace_name: String,
    #[serde(default)]
    entries_count: Option<u64>,
}

impl TryFrom<WorkspaceWire> for Workspace {
    type Error = String;

    fn try_from(wire: WorkspaceWire) -> Result<Self, Self::Error> {
        let workspace_id = wire
            .workspace_id
            .or(wire.workspace)
            .ok_or_else(|| "missing field `workspace_id`".to_string())?;
        Ok(Workspace {
            workspace_id,
            workspace_name: wire.workspace_name,
            entries_count: wire.entries_count,
        })
    }
}

/// An entry to be created by batch import
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewEntry {
    pub title: String,
    pub category: String,
}

impl NewEntry {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_accepts_both_workspace_spellings() {
        let a: Entry = serde_json::from_value(serde_json::json!({
            "entry_id": "e1",
            "title": "baby-pwn",
            "category": "pwn",
            "workspace": "ctf"
        }))
        .unwrap();
        let b: Entry = serde_json::from_value(serde_json::json!({
            "entry_id": "e1",
            "title": "baby-pwn",
            "category": "pwn",
            "workspace_id": "ctf"
        }))
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.workspace, "ctf");
        assert!(a.commits.is_none());
    }

    #[test]
    fn test_commit_accepts_legacy_type_field() {
        let commit: Commit = serde_json::from_value(serde_json::json!({
            "commit_id": "c1",
            "type": "url",
            "title": "writeup"
        }))
        .unwrap();

        assert_eq!(commit.commit_type, "url");
        assert!(commit.data.is_empty());
        assert!(commit.meta.is_empty());
    }

    #[test]
    fn test_both_spellings_in_one_record() {
        let entry: Entry = serde_json::from_value(serde_json::json!({
            "entry_id": "e1",
            "title": "t",
            "workspace": "old",
            "workspace_id": "new"
        }))
        .unwrap();
        assert_eq!(entry.workspace, "new");

        let commit: Commit = serde_json::from_value(serde_json::json!({
            "commit_id": "c1",
            "type": "tool",
            "commit_type": "url"
        }))
        .unwrap();
        assert_eq!(commit.commit_type, "url");

        let workspace: Workspace = serde_json::from_value(serde_json::json!({
            "workspace": "ws-1",
            "workspace_id": "ws-1",
            "workspace_name": "ctf"
        }))
        .unwrap();
        assert_eq!(workspace.workspace_id, "ws-1");
        assert!(serde_json::from_value::<Workspace>(serde_json::json!({"workspace_name": "x"})).is_err());
    }

    #[test]
    fn test_commit_type_wire_names() {
        assert_eq!(serde_json::to_string(&CommitType::Stdout).unwrap(), "\"stdout\"");
        assert_eq!(CommitType::Documentation.to_string(), "documentation");
        assert_eq!(CommitType::default(), CommitType::Tool);
    }
}
