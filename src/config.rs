// src/config.rs
//! Mixto configuration resolution.
//!
//! Precedence per field: explicit value > environment variable > the JSON
//! config file in the user's home directory. The result is resolved once at
//! start-up and handed to the client by value.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::error::{MixtoError, Result};

pub const CONFIG_FILE_NAME: &str = ".mixto.json";

pub const ENV_HOST: &str = "MIXTO_HOST";
pub const ENV_API_KEY: &str = "MIXTO_API_KEY";
pub const ENV_ENTRY_ID: &str = "MIXTO_ENTRY_ID";
pub const ENV_WORKSPACE: &str = "MIXTO_WORKSPACE";

/// On-disk shape of `~/.mixto.json`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default, alias = "workspace_id")]
    pub workspace: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MixtoError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            MixtoError::Configuration(format!("cannot parse {}: {}", path.display(), e))
        })
    }
}

/// Default location of the config file, if a home directory exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Fully resolved configuration for one process
#[derive(Clone)]
pub struct MixtoConfig {
    pub host: Url,
    pub api_key: String,
    pub workspace: Option<String>,
    pub categories: Vec<String>,
    /// `MIXTO_ENTRY_ID`, which wins over any entry id passed to a commit
    pub default_entry_id: Option<String>,
}

impl MixtoConfig {
    pub fn new(host: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            host: parse_host(host)?,
            api_key: api_key.into(),
            workspace: None,
            categories: Vec::new(),
            default_entry_id: None,
        })
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.default_entry_id = Some(entry_id.into());
        self
    }

    /// Workspace for operations that need one; an override wins over config
    pub fn require_workspace(&self, override_workspace: Option<&str>) -> Result<String> {
        override_workspace
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .or_else(|| self.workspace.clone())
            .ok_or_else(|| {
                MixtoError::Configuration(
                    "workspace is missing; pass --workspace, set MIXTO_WORKSPACE or add \"workspace_id\" to the config file"
                        .to_string(),
                )
            })
    }
}

impl fmt::Debug for MixtoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixtoConfig")
            .field("host", &self.host.as_str())
            .field("api_key", &"<redacted>")
            .field("workspace", &self.workspace)
            .field("categories", &self.categories)
            .field("default_entry_id", &self.default_entry_id)
            .finish()
    }
}

fn parse_host(host: &str) -> Result<Url> {
    Url::parse(host)
        .map_err(|e| MixtoError::Configuration(format!("invalid Mixto host {:?}: {}", host, e)))
}

/// Collects the configuration sources and resolves them into a MixtoConfig
#[derive(Debug, Default, Clone)]
pub struct ConfigResolver {
    host: Option<String>,
    api_key: Option<String>,
    workspace: Option<String>,
    config_path: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl ConfigResolver {
    /// Resolver with no environment; useful for tests
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the Mixto variables of the current process environment
    pub fn from_process_env() -> Self {
        let env = [ENV_HOST, ENV_API_KEY, ENV_ENTRY_ID, ENV_WORKSPACE]
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();

        Self {
            env,
            ..Self::default()
        }
    }

    pub fn with_env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.insert(key.to_string(), value.into());
        self
    }

    pub fn host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn workspace(mut self, workspace: Option<String>) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn load_file(&self) -> Result<(Option<ConfigFile>, Option<PathBuf>)> {
        let path = match self.config_path.clone().or_else(default_config_path) {
            Some(p) => p,
            None => return Ok((None, None)),
        };

        if !path.exists() {
            debug!("Mixto config file {} not found", path.display());
            return Ok((None, Some(path)));
        }

        debug!("Reading Mixto config from {}", path.display());
        let file = ConfigFile::from_file(&path)?;
        Ok((Some(file), Some(path)))
    }

    pub fn resolve(&self) -> Result<MixtoConfig> {
        let (file, path) = self.load_file()?;
        let file = file.unwrap_or_default();
        let location = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());

        let host = self
            .host
            .clone()
            .filter(|h| !h.is_empty())
            .or_else(|| self.env_var(ENV_HOST))
            .or(file.host)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                MixtoError::Configuration(format!(
                    "Mixto host is missing; set {} or add \"host\" to {}",
                    ENV_HOST, location
                ))
            })?;

        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| self.env_var(ENV_API_KEY))
            .or(file.api_key)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                MixtoError::Configuration(format!(
                    "Mixto api key is missing; set {} or add \"api_key\" to {}",
                    ENV_API_KEY, location
                ))
            })?;

        let workspace = self
            .workspace
            .clone()
            .filter(|w| !w.is_empty())
            .or_else(|| self.env_var(ENV_WORKSPACE))
            .or(file.workspace)
            .filter(|w| !w.is_empty());

        Ok(MixtoConfig {
            host: parse_host(&host)?,
            api_key,
            workspace,
            categories: file.categories,
            default_entry_id: self.env_var(ENV_ENTRY_ID),
        })
    }
}
