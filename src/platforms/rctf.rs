// src/platforms/rctf.rs
//! rCTF integration

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use url::Url;

use super::{
    check_platform_response, platform_http_client, platform_url, Challenge, Credentials,
    PlatformAdapter,
};
use crate::error::Result;
use crate::prompt::{require_non_empty, Prompter};

#[derive(Debug, Deserialize)]
struct RctfChallenge {
    name: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct RctfResponse {
    #[serde(default)]
    data: Vec<RctfChallenge>,
}

/// rCTF API client
pub struct RctfAPI {
    client: reqwest::Client,
    host: Url,
}

impl RctfAPI {
    pub fn new(host: Url) -> Result<Self> {
        Ok(Self {
            client: platform_http_client()?,
            host,
        })
    }
}

#[async_trait]
impl PlatformAdapter for RctfAPI {
    fn name(&self) -> &str {
        "rCTF"
    }

    fn authenticate(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        let token = prompter.ask("Bearer Token")?;
        require_non_empty(&[("token", &token)])?;

        Ok(Credentials {
            bearer_token: Some(token),
            ..Credentials::default()
        })
    }

    async fn fetch_challenges(&self, credentials: &Credentials) -> Result<Vec<Challenge>> {
        info!("Fetching challenges from rCTF");

        let url = platform_url(&self.host, "/api/v1/challs")?;
        let mut request = self.client.get(url);
        if let Some(token) = &credentials.bearer_token {
            request = request.bearer_auth(token);
        }

        let body = check_platform_response(self.name(), request.send().await?).await?;
        let parsed: RctfResponse = serde_json::from_str(&body)?;

        let challenges: Vec<Challenge> = parsed
            .data
            .into_iter()
            .map(|c| Challenge::new(c.name, c.category))
            .collect();

        info!("Found {} challenges on rCTF", challenges.len());
        Ok(challenges)
    }
}
