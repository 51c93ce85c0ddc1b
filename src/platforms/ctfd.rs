// src/platforms/ctfd.rs
//! CTFd integration: challenge list via the session cookie

use async_trait::async_trait;
use reqwest::header::COOKIE;
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
struct CtfdChallenge {
    name: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct CtfdResponse {
    #[serde(default)]
    data: Vec<CtfdChallenge>,
}

/// CTFd API client
pub struct CtfdAPI {
    client: reqwest::Client,
    host: Url,
}

impl CtfdAPI {
    /// Create new CTFd API client. `host` must not include `/api/v1`.
    pub fn new(host: Url) -> Result<Self> {
        Ok(Self {
            client: platform_http_client()?,
            host,
        })
    }
}

#[async_trait]
impl PlatformAdapter for CtfdAPI {
    fn name(&self) -> &str {
        "CTFd"
    }

    fn authenticate(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        let session = prompter.ask("Value for session cookie")?;
        require_non_empty(&[("session", &session)])?;

        Ok(Credentials {
            cookies: vec![("session".to_string(), session)],
            ..Credentials::default()
        })
    }

    async fn fetch_challenges(&self, credentials: &Credentials) -> Result<Vec<Challenge>> {
        info!("Fetching challenges from CTFd");

        let url = platform_url(&self.host, "/api/v1/challenges")?;
        let mut request = self.client.get(url);
        if let Some(cookie) = credentials.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let body = check_platform_response(self.name(), request.send().await?).await?;
        let parsed: CtfdResponse = serde_json::from_str(&body)?;

        let challenges: Vec<Challenge> = parsed
            .data
            .into_iter()
            .map(|c| Challenge::new(c.name, c.category))
            .collect();

        info!("Found {} challenges on CTFd", challenges.len());
        Ok(challenges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MixtoError;
    use crate::prompt::ScriptedPrompter;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_authenticate_rejects_empty_cookie() {
        let api = CtfdAPI::new(Url::parse("http://ctf.local").unwrap()).unwrap();
        let mut prompter = ScriptedPrompter::new().answer_with("");

        let err = api.authenticate(&mut prompter).unwrap_err();
        assert!(matches!(err, MixtoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_fetch_and_map_challenges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges"))
            .and(header("cookie", "session=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [
                    {"id": 1, "name": "Cookie Monster", "category": "Web"},
                    {"id": 2, "name": "Lost Keys", "category": "Reversing"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = CtfdAPI::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let mut prompter = ScriptedPrompter::new().answer_with("abc123");
        let creds = api.authenticate(&mut prompter).unwrap();

        let challenges = api.fetch_challenges(&creds).await.unwrap();
        let entries = api.to_entries(&challenges, &["web".to_string(), "pwn".to_string()]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Cookie Monster");
        assert_eq!(entries[0].category, "web");
        assert_eq!(entries[1].category, "other");
    }

    #[tokio::test]
    async fn test_error_status_is_platform_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/challenges"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let api = CtfdAPI::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let err = api.fetch_challenges(&Credentials::none()).await.unwrap_err();

        match err {
            MixtoError::PlatformRequest { platform, status, body } => {
                assert_eq!(platform, "CTFd");
                assert_eq!(status, 403);
                assert_eq!(body, "Forbidden");
            }
            other => panic!("expected PlatformRequest, got {:?}", other),
        }
    }
}
