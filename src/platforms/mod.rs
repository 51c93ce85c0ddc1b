// src/platforms/mod.rs
//! CTF scoring platform integrations that turn a platform's challenge list
//! into Mixto entries

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::path::PathBuf;
use url::Url;

use crate::error::{MixtoError, Result};
use crate::prompt::Prompter;
use crate::types::NewEntry;

pub mod ctfd;
pub mod custom;
pub mod htb;
pub mod import;
pub mod pico;
pub mod rctf;

pub use ctfd::CtfdAPI;
pub use custom::CustomJson;
pub use htb::HtbAPI;
pub use import::ChallengeImporter;
pub use pico::PicoAPI;
pub use rctf::RctfAPI;

/// Category used when a platform category is not one of the configured ones
pub const FALLBACK_CATEGORY: &str = "other";

/// Scoring platforms block non-browser agents, so adapters pose as one
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// A challenge as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub name: String,
    /// Platform-native category name
    pub category: String,
}

impl Challenge {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// Credentials gathered by `authenticate`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub cookies: Vec<(String, String)>,
    pub bearer_token: Option<String>,
    /// Platform-specific values such as an event id
    pub params: Vec<(String, String)>,
}

impl Credentials {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Cookies rendered as a single `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Scoring platform adapter
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Platform name (e.g. "CTFd", "PicoCTF")
    fn name(&self) -> &str;

    /// Collect whatever the platform needs to authorise requests
    fn authenticate(&self, prompter: &mut dyn Prompter) -> Result<Credentials>;

    /// Fetch every challenge visible with the given credentials
    async fn fetch_challenges(&self, credentials: &Credentials) -> Result<Vec<Challenge>>;

    /// Map challenges onto the caller's configured categories
    fn to_entries(&self, challenges: &[Challenge], categories: &[String]) -> Vec<NewEntry> {
        challenges
            .iter()
            .map(|c| NewEntry::new(c.name.clone(), map_category(&c.category, categories)))
            .collect()
    }
}

/// Configured category matching `native` case-insensitively, else "other"
pub fn map_category(native: &str, categories: &[String]) -> String {
    let native = native.to_lowercase();
    categories
        .iter()
        .find(|c| c.to_lowercase() == native)
        .cloned()
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}

/// Default headers for platform requests
pub(crate) fn platform_http_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

/// Join an API path onto the platform host
pub(crate) fn platform_url(host: &Url, path: &str) -> Result<Url> {
    host.join(path)
        .map_err(|e| MixtoError::Validation(format!("cannot build platform url {}: {}", path, e)))
}

/// Parse the platform host given on the command line
pub fn parse_platform_host(host: &str) -> Result<Url> {
    Url::parse(host).map_err(|e| MixtoError::Validation(format!("invalid platform host {:?}: {}", host, e)))
}

/// Check a platform response, turning non-2xx into PlatformRequest
pub(crate) async fn check_platform_response(
    platform: &str,
    response: reqwest::Response,
) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(MixtoError::PlatformRequest {
            platform: platform.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Supported scoring platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    Ctfd,
    Htb,
    Pico,
    Rctf,
    Custom,
}

impl Platform {
    /// Build the adapter for this platform
    pub fn adapter(
        &self,
        host: Option<&str>,
        file: Option<PathBuf>,
    ) -> Result<Box<dyn PlatformAdapter>> {
        let require_host = || {
            host.ok_or_else(|| {
                MixtoError::Validation("a platform host is required (--host)".to_string())
            })
            .and_then(parse_platform_host)
        };

        let adapter: Box<dyn PlatformAdapter> = match self {
            Platform::Ctfd => Box::new(CtfdAPI::new(require_host()?)?),
            Platform::Htb => Box::new(HtbAPI::new(require_host()?)?),
            Platform::Pico => Box::new(PicoAPI::new(require_host()?)?),
            Platform::Rctf => Box::new(RctfAPI::new(require_host()?)?),
            Platform::Custom => {
                let file = file.ok_or_else(|| {
                    MixtoError::Validation("the custom platform needs --file".to_string())
                })?;
                Box::new(CustomJson::new(file))
            }
        };
        Ok(adapter)
    }
}
