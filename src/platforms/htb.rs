// src/platforms/htb.rs
//! HackTheBox CTF integration

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::{
    check_platform_response, platform_http_client, platform_url, Challenge, Credentials,
    PlatformAdapter, FALLBACK_CATEGORY,
};
use crate::error::{MixtoError, Result};
use crate::prompt::{require_non_empty, Prompter};

/// HTB reports categories as numeric ids
pub fn htb_category_name(id: u32) -> &'static str {
    match id {
        2 => "web",
        3 => "pwn",
        4 => "crypto",
        5 => "reversing",
        7 => "forensics",
        8 => "misc",
        13 => "osint",
        15 => "hardware",
        _ => FALLBACK_CATEGORY,
    }
}

#[derive(Debug, Deserialize)]
struct HtbChallenge {
    name: String,
    challenge_category_id: u32,
}

#[derive(Debug, Deserialize)]
struct HtbResponse {
    #[serde(default)]
    challenges: Vec<HtbChallenge>,
}

/// HackTheBox CTF API client
pub struct HtbAPI {
    client: reqwest::Client,
    host: Url,
}

impl HtbAPI {
    pub fn new(host: Url) -> Result<Self> {
        Ok(Self {
            client: platform_http_client()?,
            host,
        })
    }
}

#[async_trait]
impl PlatformAdapter for HtbAPI {
    fn name(&self) -> &str {
        "HackTheBox"
    }

    fn authenticate(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        let event_id = prompter.ask("Event ID")?;
        let token = prompter.ask("Bearer Token")?;
        require_non_empty(&[("event_id", &event_id), ("token", &token)])?;

        Ok(Credentials {
            bearer_token: Some(token),
            params: vec![("event_id".to_string(), event_id)],
            ..Credentials::default()
        })
    }

    async fn fetch_challenges(&self, credentials: &Credentials) -> Result<Vec<Challenge>> {
        let event_id = credentials
            .param("event_id")
            .ok_or_else(|| MixtoError::Validation("event_id is not provided".to_string()))?;
        info!("Fetching challenges for HTB event {}", event_id);

        let url = platform_url(&self.host, &format!("/api/ctf/{}", event_id))?;
        let mut request = self.client.get(url);
        if let Some(token) = &credentials.bearer_token {
            request = request.bearer_auth(token);
        }

        let body = check_platform_response(self.name(), request.send().await?).await?;
        let parsed: HtbResponse = serde_json::from_str(&body)?;

        let challenges: Vec<Challenge> = parsed
            .challenges
            .into_iter()
            .map(|c| {
                debug!("{} -> category id {}", c.name, c.challenge_category_id);
                Challenge::new(c.name, htb_category_name(c.challenge_category_id))
            })
            .collect();

        info!("Found {} challenges on HackTheBox", challenges.len());
        Ok(challenges)
    }
}
