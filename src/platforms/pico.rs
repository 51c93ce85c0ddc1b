// src/platforms/pico.rs
//! PicoCTF integration

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::Deserialize;
use tracing::info;
use url::Url;

use super::{
    check_platform_response, platform_http_client, platform_url, Challenge, Credentials,
    PlatformAdapter,
};
use crate::error::{MixtoError, Result};
use crate::prompt::{require_non_empty, Prompter};

/// PicoCTF pages challenges; one page this size covers any event so far
const PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct PicoCategory {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PicoChallenge {
    name: String,
    category: PicoCategory,
}

#[derive(Debug, Deserialize)]
struct PicoResponse {
    #[serde(default)]
    results: Vec<PicoChallenge>,
}

/// PicoCTF API client
pub struct PicoAPI {
    client: reqwest::Client,
    host: Url,
}

impl PicoAPI {
    pub fn new(host: Url) -> Result<Self> {
        Ok(Self {
            client: platform_http_client()?,
            host,
        })
    }
}

#[async_trait]
impl PlatformAdapter for PicoAPI {
    fn name(&self) -> &str {
        "PicoCTF"
    }

    fn authenticate(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        let session_id = prompter.ask("Value for sessionid cookie")?;
        let csrf_token = prompter.ask("Value for csrftoken cookie")?;
        let event = prompter.ask("Original event ID from URL")?;
        require_non_empty(&[
            ("sessionid", &session_id),
            ("csrftoken", &csrf_token),
            ("original_event", &event),
        ])?;

        Ok(Credentials {
            cookies: vec![
                ("csrftoken".to_string(), csrf_token),
                ("sessionid".to_string(), session_id),
            ],
            params: vec![("original_event".to_string(), event)],
            ..Credentials::default()
        })
    }

    async fn fetch_challenges(&self, credentials: &Credentials) -> Result<Vec<Challenge>> {
        let event = credentials
            .param("original_event")
            .ok_or_else(|| MixtoError::Validation("original_event is not provided".to_string()))?;
        info!("Fetching challenges for PicoCTF event {}", event);

        let mut url = platform_url(&self.host, "/api/challenges/")?;
        url.query_pairs_mut()
            .append_pair("original_event", event)
            .append_pair("page_size", PAGE_SIZE);

        let mut request = self.client.get(url);
        if let Some(cookie) = credentials.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let body = check_platform_response(self.name(), request.send().await?).await?;
        let parsed: PicoResponse = serde_json::from_str(&body)?;

        let challenges: Vec<Challenge> = parsed
            .results
            .into_iter()
            .map(|c| Challenge::new(c.name, c.category.name))
            .collect();

        info!("Found {} challenges on PicoCTF", challenges.len());
        Ok(challenges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_challenges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/challenges/"))
            .and(query_param("original_event", "7"))
            .and(query_param("page_size", "100"))
            .and(header("cookie", "csrftoken=csrf; sessionid=sess"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 2,
                "results": [
                    {"name": "Obedient Cat", "category": {"id": 1, "name": "General Skills"}},
                    {"name": "Mod 26", "category": {"id": 2, "name": "Cryptography"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = PicoAPI::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let mut prompter = ScriptedPrompter::new()
            .answer_with("sess")
            .answer_with("csrf")
            .answer_with("7");
        let creds = api.authenticate(&mut prompter).unwrap();

        let challenges = api.fetch_challenges(&creds).await.unwrap();
        let entries = api.to_entries(&challenges, &["cryptography".to_string()]);

        assert_eq!(entries[0].category, "other");
        assert_eq!(entries[1].title, "Mod 26");
        assert_eq!(entries[1].category, "cryptography");
    }

    #[test]
    fn test_authenticate_requires_event() {
        let api = PicoAPI::new(Url::parse("https://play.picoctf.org").unwrap()).unwrap();
        let mut prompter = ScriptedPrompter::new()
            .answer_with("sess")
            .answer_with("csrf")
            .answer_with("");

        let err = api.authenticate(&mut prompter).unwrap_err();
        assert!(err.to_string().contains("original_event"));
    }
}
