// src/client.rs
//! Mixto API client: authenticated request dispatch plus the entry, commit,
//! note and GraphQL operations every integration builds on.

use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info};
use url::Url;

use crate::config::MixtoConfig;
use crate::error::{MixtoError, Result};
use crate::prompt::Prompter;
use crate::types::{Commit, CommitType, Entry, NewEntry, Note, Workspace};

pub const USER_AGENT: &str = concat!("mixto-lite-rs/", env!("CARGO_PKG_VERSION"));
pub const API_KEY_HEADER: &str = "x-api-key";

/// Anything above 300 is a failure, redirects included
pub fn is_failure_status(status: u16) -> bool {
    status > 300
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// Parsed body of a successful request
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    pub fn into_json(self) -> Result<Value> {
        match self {
            ApiResponse::Json(v) => Ok(v),
            ApiResponse::Text(t) => Ok(serde_json::from_str(&t)?),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ApiResponse::Json(v) => v.to_string(),
            ApiResponse::Text(t) => t,
        }
    }
}

/// A commit to be attached to an entry
#[derive(Debug, Clone, Default)]
pub struct NewCommit {
    pub title: String,
    pub data: String,
    pub commit_type: CommitType,
    pub meta: Map<String, Value>,
    /// Extra top-level body fields, merged last
    pub fields: Map<String, Value>,
}

impl NewCommit {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn commit_type(mut self, commit_type: CommitType) -> Self {
        self.commit_type = commit_type;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

#[derive(Deserialize)]
struct EntriesEnvelope {
    data: EntriesData,
}

#[derive(Deserialize)]
struct EntriesData {
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Deserialize)]
struct WorkspacesEnvelope {
    #[serde(default)]
    data: Vec<Workspace>,
}

#[derive(Deserialize)]
struct WorkspaceStats {
    #[serde(default)]
    entries_count: u64,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

const NOTES_QUERY: &str = r#"query q($entry_id: String!) {
  notes: mixto_notes(where: {entry_id: {_eq: $entry_id}}) {
    note_id
    entry_id
    title
    data
  }
}"#;

const CREATE_NOTE_MUTATION: &str = r#"mutation m(
  $data: String!
  $workspace_id: uuid!
  $entry_id: String!
  $title: String!
) {
  note: insert_mixto_notes_one(
    object: {
      data: $data
      title: $title
      entry_id: $entry_id
      markdown: true
      workspace_id: $workspace_id
    }
  ) {
    note_id
  }
}"#;

const UPDATE_NOTE_MUTATION: &str = r#"mutation m($note_id: uuid!, $data: String!) {
  note: update_mixto_notes_by_pk(pk_columns: {note_id: $note_id}, _set: {data: $data}) {
    note_id
  }
}"#;

const COMMIT_DATA_QUERY: &str = r#"query q($commit_id: uuid!) {
  commit: mixto_commits_by_pk(commit_id: $commit_id) {
    data
  }
}"#;

const WORKSPACE_NAME_QUERY: &str = r#"query q($workspace_id: uuid!) {
  workspace: mixto_workspaces_by_pk(workspace_id: $workspace_id) {
    workspace_name
  }
}"#;

/// Client bound to one resolved configuration
pub struct MixtoClient {
    config: MixtoConfig,
    http: reqwest::Client,
}

impl MixtoClient {
    /// Create a new client. Redirects are never followed.
    pub fn new(config: MixtoConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &MixtoConfig {
        &self.config
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.config.host.join(path).map_err(|e| {
            MixtoError::Configuration(format!("cannot join {} onto host: {}", path, e))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    /// Issue a request and hand back the raw status and body
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String)> {
        let url = self.endpoint(path, query)?;
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(USER_AGENT_HEADER, USER_AGENT);

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Mixto answered {} ({} bytes)", status.as_u16(), text.len());

        Ok((status, text))
    }

    /// Generic request against any Mixto endpoint
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
        format: ResponseFormat,
    ) -> Result<ApiResponse> {
        let (status, text) = self.send(method, path, body, query).await?;

        if is_failure_status(status.as_u16()) {
            return Err(MixtoError::BadResponse {
                status: status.as_u16(),
                body: text,
            });
        }

        match format {
            ResponseFormat::Json => Ok(ApiResponse::Json(serde_json::from_str(&text)?)),
            ResponseFormat::Text => Ok(ApiResponse::Text(text)),
        }
    }

    /// JSON request decoded straight into `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let value = self
            .request(method, path, body, &[], ResponseFormat::Json)
            .await?
            .into_json()?;
        Ok(serde_json::from_value(value)?)
    }

    /// All workspaces visible to the api key
    pub async fn get_workspaces(&self) -> Result<Vec<Workspace>> {
        let envelope: WorkspacesEnvelope = self
            .request_json(Method::GET, "/api/v1/workspace", None)
            .await?;
        Ok(envelope.data)
    }

    /// All entries of a workspace, optionally with their commits
    pub async fn list_entries(
        &self,
        workspace: Option<&str>,
        include_commits: bool,
    ) -> Result<Vec<Entry>> {
        let workspace = self.config.require_workspace(workspace)?;
        let body = json!({
            "workspace_id": workspace,
            "include_commits": include_commits,
        });

        let envelope: EntriesEnvelope = self
            .request_json(Method::POST, "/api/v1/workspace", Some(&body))
            .await?;

        debug!(
            "Workspace {} has {} entries",
            workspace,
            envelope.data.entries.len()
        );
        Ok(envelope.data.entries)
    }

    /// Entry id for a commit: `MIXTO_ENTRY_ID` first, then the explicit one
    pub fn resolve_entry_id(&self, entry_id: Option<&str>) -> Result<String> {
        self.config
            .default_entry_id
            .as_deref()
            .or(entry_id)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(MixtoError::MissingEntryId)
    }

    /// Attach an artifact to an entry
    pub async fn add_commit(&self, entry_id: Option<&str>, commit: NewCommit) -> Result<Commit> {
        let entry_id = self.resolve_entry_id(entry_id)?;

        let mut body = Map::new();
        body.insert("data".into(), Value::String(commit.data));
        body.insert(
            "workspace_id".into(),
            self.config
                .workspace
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        body.insert("entry_id".into(), Value::String(entry_id.clone()));
        body.insert(
            "commit_type".into(),
            Value::String(commit.commit_type.as_str().to_string()),
        );
        body.insert("title".into(), Value::String(commit.title));
        body.insert("meta".into(), Value::Object(commit.meta));
        for (key, value) in commit.fields {
            body.insert(key, value);
        }

        let mut added: Commit = self
            .request_json(Method::POST, "/api/v1/commit", Some(&Value::Object(body)))
            .await?;
        if added.entry_id.is_empty() {
            added.entry_id = entry_id;
        }

        info!("Added commit {} to entry {}", added.commit_id, added.entry_id);
        Ok(added)
    }

    /// Execute a GraphQL query or mutation and return its `data`
    pub async fn graphql(&self, query: &str, variables: Option<Value>) -> Result<Value> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }

        let response: GraphQlResponse = self
            .request_json(Method::POST, "/api/v1/gql", Some(&body))
            .await?;

        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e["message"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect();
            return Err(MixtoError::GraphQl(messages.join("; ")));
        }

        match response.data {
            Some(Value::Null) | None => Err(MixtoError::GraphQl("response has no data".into())),
            Some(data) => Ok(data),
        }
    }

    pub async fn get_commit_data(&self, commit_id: &str) -> Result<String> {
        let data = self
            .graphql(COMMIT_DATA_QUERY, Some(json!({ "commit_id": commit_id })))
            .await?;

        data["commit"]["data"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MixtoError::GraphQl(format!("commit data not found for {}", commit_id)))
    }

    pub async fn get_workspace_name(&self, workspace: Option<&str>) -> Result<String> {
        let workspace = self.config.require_workspace(workspace)?;
        let data = self
            .graphql(WORKSPACE_NAME_QUERY, Some(json!({ "workspace_id": workspace })))
            .await?;

        data["workspace"]["workspace_name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MixtoError::GraphQl(format!("workspace {} not found", workspace)))
    }

    pub async fn get_notes(&self, entry_id: &str) -> Result<Vec<Note>> {
        if entry_id.is_empty() {
            return Err(MixtoError::Validation("entry id is empty".into()));
        }
        let data = self
            .graphql(NOTES_QUERY, Some(json!({ "entry_id": entry_id })))
            .await?;

        let notes = data.get("notes").cloned().unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(notes)?)
    }

    /// Create a markdown note on an entry, returning the new note id
    pub async fn create_note(&self, entry_id: &str, title: &str, data: &str) -> Result<String> {
        if entry_id.is_empty() || data.is_empty() {
            return Err(MixtoError::Validation(
                "entry id and note data are required".into(),
            ));
        }
        let workspace = self.config.require_workspace(None)?;
        let variables = json!({
            "entry_id": entry_id,
            "workspace_id": workspace,
            "data": data,
            "title": if title.is_empty() { "Untitled" } else { title },
        });

        let result = self.graphql(CREATE_NOTE_MUTATION, Some(variables)).await?;
        note_id_from(&result)
    }

    /// Replace the text of an existing note
    pub async fn update_note(&self, note_id: &str, data: &str) -> Result<String> {
        if note_id.is_empty() || data.is_empty() {
            return Err(MixtoError::Validation(
                "note id and note data are required".into(),
            ));
        }
        let variables = json!({ "note_id": note_id, "data": data });

        let result = self.graphql(UPDATE_NOTE_MUTATION, Some(variables)).await?;
        note_id_from(&result)
    }

    /// Number of entries already present in a workspace
    pub async fn workspace_entry_count(&self, workspace: &str) -> Result<u64> {
        let path = format!("/api/workspace/{}", workspace);
        let stats: WorkspaceStats = self.request_json(Method::GET, &path, None).await?;
        Ok(stats.entries_count)
    }

    /// Create entries in bulk after operator confirmation.
    ///
    /// A non-empty workspace costs one extra confirmation. Declining either
    /// prompt aborts before anything is created.
    pub async fn batch_create_entries(
        &self,
        workspace: Option<&str>,
        entries: &[NewEntry],
        prompter: &mut dyn Prompter,
    ) -> Result<Vec<Entry>> {
        if entries.is_empty() {
            return Err(MixtoError::Validation("no entries to create".into()));
        }
        let workspace = self.config.require_workspace(workspace)?;

        if self.workspace_entry_count(&workspace).await? > 0
            && !prompter.confirm(&format!(
                "The workspace \"{}\" already has entries. Do you want to add to them?",
                workspace
            ))?
        {
            return Err(MixtoError::Aborted);
        }

        if !prompter.confirm(&format!(
            "Do you want to add {} entries to {}?",
            entries.len(),
            workspace
        ))? {
            return Err(MixtoError::Aborted);
        }

        let body = serde_json::to_value(entries)?;
        let path = format!("/api/entry/{}", workspace);
        let (status, text) = self.send(Method::PUT, &path, Some(&body), &[]).await?;

        if status != StatusCode::OK {
            return Err(MixtoError::BatchImport {
                status: status.as_u16(),
                body: text,
            });
        }

        let created: Vec<Entry> = serde_json::from_str(&text)?;
        for entry in &created {
            info!("Added {} {}", entry.category, entry.title);
        }
        info!("Entries added: {}", created.len());

        Ok(created)
    }
}

fn note_id_from(data: &Value) -> Result<String> {
    data["note"]["note_id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MixtoError::GraphQl("note id missing from response".into()))
}
