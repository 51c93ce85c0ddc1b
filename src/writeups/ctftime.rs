// src/writeups/ctftime.rs
//! CTFtime scraping: event task list, task writeup list, original writeup link

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use super::WriteupSource;
use crate::error::{MixtoError, Result};
use crate::platforms::{check_platform_response, platform_http_client};

pub const CTFTIME_URL: &str = "https://ctftime.org";

static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("valid row regex"));

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#)
        .expect("valid anchor regex")
});

static CELL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<td\b[^>]*>\s*<a\b[^>]*?\bhref\s*=\s*["']([^"']+)["']"#)
        .expect("valid cell link regex")
});

static WELL_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\bclass\s*=\s*["']well["'][^>]*>(.*?)</div>"#)
        .expect("valid well regex")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

/// Event ids are plain digits
pub fn validate_event_id(event_id: &str) -> Result<()> {
    if event_id.is_empty() || !event_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(MixtoError::Validation(format!(
            "{:?} is not a valid event id, it should be only digits",
            event_id
        )));
    }
    Ok(())
}

/// Tasks that have writeups, as lowercased task name -> task path.
///
/// Only rows with exactly two links count: the task itself and its event.
pub fn parse_event_tasks(html: &str) -> HashMap<String, String> {
    TABLE_ROW
        .captures_iter(html)
        .filter_map(|row| {
            let anchors: Vec<_> = ANCHOR.captures_iter(&row[1]).collect();
            if anchors.len() != 2 {
                return None;
            }
            let name = anchor_text(&anchors[0][2]);
            if name.is_empty() {
                return None;
            }
            Some((name.to_lowercase(), anchors[0][1].to_string()))
        })
        .collect()
}

/// First writeup link in the task page's writeup table
pub fn parse_task_writeup(html: &str) -> Option<String> {
    CELL_LINK.captures(html).map(|c| c[1].to_string())
}

/// Original writeup link, found in the page's `well` block
pub fn parse_original_writeup(html: &str) -> Option<String> {
    let block = WELL_BLOCK.captures(html)?;
    ANCHOR
        .captures(&block[1])
        .map(|c| decode_entities(&c[1]))
        .filter(|href| !href.is_empty())
}

fn anchor_text(inner: &str) -> String {
    decode_entities(TAG.replace_all(inner, "").trim())
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// CTFtime client
pub struct CtftimeClient {
    client: reqwest::Client,
    base: Url,
}

impl CtftimeClient {
    pub fn new() -> Result<Self> {
        let base = Url::parse(CTFTIME_URL)
            .map_err(|e| MixtoError::Configuration(format!("bad CTFtime url: {}", e)))?;
        Self::with_base_url(base)
    }

    /// Client against another CTFtime-compatible host
    pub fn with_base_url(base: Url) -> Result<Self> {
        Ok(Self {
            client: platform_http_client()?,
            base,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| MixtoError::Validation(format!("bad CTFtime path {:?}: {}", path, e)))
    }

    async fn get_page(&self, path: &str) -> Result<String> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        check_platform_response(self.name(), self.client.get(url).send().await?).await
    }
}

#[async_trait]
impl WriteupSource for CtftimeClient {
    fn name(&self) -> &str {
        "CTFtime"
    }

    async fn event_tasks(&self, event_id: &str) -> Result<HashMap<String, String>> {
        validate_event_id(event_id)?;

        let html = self.get_page(&format!("/event/{}/tasks/", event_id)).await?;
        let tasks = parse_event_tasks(&html);

        info!("CTFtime event {} has {} tasks with writeups", event_id, tasks.len());
        Ok(tasks)
    }

    async fn task_writeup(&self, task_path: &str) -> Result<Option<String>> {
        let html = self.get_page(task_path).await?;
        Ok(parse_task_writeup(&html))
    }

    async fn original_writeup(&self, writeup_path: &str) -> Result<Option<String>> {
        let html = self.get_page(writeup_path).await?;
        Ok(parse_original_writeup(&html))
    }
}
