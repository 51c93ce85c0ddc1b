// src/platforms/import.rs
//! Challenge import: platform challenge list -> Mixto entries

use tracing::info;

use super::PlatformAdapter;
use crate::client::MixtoClient;
use crate::error::{MixtoError, Result};
use crate::prompt::Prompter;
use crate::types::{Entry, NewEntry};

/// What an import run produced
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Entries that would have been created
    DryRun(Vec<NewEntry>),
    /// Entries created by Mixto, with their assigned ids
    Created(Vec<Entry>),
}

impl ImportOutcome {
    pub fn len(&self) -> usize {
        match self {
            ImportOutcome::DryRun(entries) => entries.len(),
            ImportOutcome::Created(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs one adapter against one Mixto workspace
pub struct ChallengeImporter<'a> {
    client: &'a MixtoClient,
    workspace: Option<String>,
    dry_run: bool,
}

impl<'a> ChallengeImporter<'a> {
    pub fn new(client: &'a MixtoClient) -> Self {
        Self {
            client,
            workspace: None,
            dry_run: false,
        }
    }

    /// Target workspace, overriding the configured one
    pub fn workspace(mut self, workspace: Option<String>) -> Self {
        self.workspace = workspace;
        self
    }

    /// Map challenges but never contact Mixto
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(
        &self,
        adapter: &dyn PlatformAdapter,
        prompter: &mut dyn Prompter,
    ) -> Result<ImportOutcome> {
        info!("Importing challenges from {}", adapter.name());

        let credentials = adapter.authenticate(prompter)?;
        let challenges = adapter.fetch_challenges(&credentials).await?;
        if challenges.is_empty() {
            return Err(MixtoError::Validation("no challenges found".to_string()));
        }

        let entries = adapter.to_entries(&challenges, &self.client.config().categories);
        info!(
            "Mapped {} challenges from {}",
            entries.len(),
            adapter.name()
        );

        if self.dry_run {
            info!("Dry run: not adding entries to Mixto");
            return Ok(ImportOutcome::DryRun(entries));
        }

        let created = self
            .client
            .batch_create_entries(self.workspace.as_deref(), &entries, prompter)
            .await?;
        Ok(ImportOutcome::Created(created))
    }
}
