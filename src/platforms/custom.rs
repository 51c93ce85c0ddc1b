// src/platforms/custom.rs
//! Challenge list supplied as a local JSON file

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use super::{Challenge, Credentials, PlatformAdapter};
use crate::error::{MixtoError, Result};
use crate::prompt::Prompter;

/// One element of the custom file: `[{"title": ..., "category": ...}]`
#[derive(Debug, Deserialize)]
struct CustomChallenge {
    title: String,
    #[serde(default)]
    category: String,
}

/// Reads challenges from a JSON file instead of a scoring platform
pub struct CustomJson {
    path: PathBuf,
}

impl CustomJson {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PlatformAdapter for CustomJson {
    fn name(&self) -> &str {
        "Custom"
    }

    fn authenticate(&self, _prompter: &mut dyn Prompter) -> Result<Credentials> {
        Ok(Credentials::none())
    }

    async fn fetch_challenges(&self, _credentials: &Credentials) -> Result<Vec<Challenge>> {
        info!("Reading challenges from {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path).await?;
        let parsed: Vec<CustomChallenge> = serde_json::from_str(&content).map_err(|e| {
            MixtoError::Validation(format!(
                "{} is not a list of {{title, category}} objects: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(parsed
            .into_iter()
            .map(|c| Challenge::new(c.title, c.category))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "baby heap", "category": "Pwn"}}, {{"title": "notes"}}]"#
        )
        .unwrap();

        let adapter = CustomJson::new(file.path().to_path_buf());
        // no prompts are consumed
        let creds = adapter.authenticate(&mut ScriptedPrompter::new()).unwrap();
        let challenges = adapter.fetch_challenges(&creds).await.unwrap();
        let entries = adapter.to_entries(&challenges, &["pwn".to_string()]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, "pwn");
        assert_eq!(entries[1].title, "notes");
        assert_eq!(entries[1].category, "other");
    }

    #[tokio::test]
    async fn test_rejects_wrong_shape() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "not a list"}}"#).unwrap();

        let adapter = CustomJson::new(file.path().to_path_buf());
        let err = adapter
            .fetch_challenges(&Credentials::none())
            .await
            .unwrap_err();
        assert!(matches!(err, MixtoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let adapter = CustomJson::new(PathBuf::from("/nonexistent/challenges.json"));
        let err = adapter
            .fetch_challenges(&Credentials::none())
            .await
            .unwrap_err();
        assert!(matches!(err, MixtoError::Io(_)));
    }
}
