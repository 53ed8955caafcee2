use std::time::Duration;

use async_trait::async_trait;
use postdeck_model::ShortenerCredentials;
use serde::Deserialize;
use url::Url;

use crate::error::{PostError, Result};
use crate::ports::LinkShortener;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the common `https://<domain>/api?api=<key>&url=<long>` link
/// shortener API.
#[derive(Debug, Clone)]
pub struct HttpShortener {
    http: reqwest::Client,
    scheme: &'static str,
}

impl Default for HttpShortener {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "shortenedUrl")]
    shortened_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ShortenResponse {
    fn into_short_url(self) -> Result<String> {
        match (self.status.as_deref(), self.shortened_url) {
            (Some("success"), Some(url)) if !url.trim().is_empty() => Ok(url),
            _ => Err(PostError::collaborator(
                "link shortening",
                self.message
                    .unwrap_or_else(|| "shortener reported no link".to_string()),
            )),
        }
    }
}

impl HttpShortener {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            scheme: "https",
        }
    }

    /// Plain-HTTP variant for local shortener instances.
    pub fn insecure() -> Self {
        Self {
            scheme: "http",
            ..Self::new()
        }
    }

    fn endpoint(&self, credentials: &ShortenerCredentials, long_url: &str) -> Result<Url> {
        let base = format!("{}://{}/api", self.scheme, credentials.domain);
        Url::parse_with_params(
            &base,
            &[("api", credentials.api_key.as_str()), ("url", long_url)],
        )
        .map_err(|e| PostError::collaborator("link shortening", e))
    }
}

#[async_trait]
impl LinkShortener for HttpShortener {
    async fn shorten(&self, credentials: &ShortenerCredentials, long_url: &str) -> Result<String> {
        let endpoint = self.endpoint(credentials, long_url)?;
        let response = self.http.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(PostError::collaborator(
                "link shortening",
                format!("shortener answered {}", response.status()),
            ));
        }
        response.json::<ShortenResponse>().await?.into_short_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ShortenerCredentials {
        ShortenerCredentials {
            api_key: "k3y".into(),
            domain: "short.example".into(),
        }
    }

    #[test]
    fn endpoint_encodes_the_long_url() {
        let url = HttpShortener::new()
            .endpoint(&credentials(), "https://t.me/deck_bot?start=Ab12Cd34")
            .unwrap();
        assert_eq!(url.host_str(), Some("short.example"));
        assert_eq!(url.path(), "/api");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("api".to_string(), "k3y".to_string()),
                (
                    "url".to_string(),
                    "https://t.me/deck_bot?start=Ab12Cd34".to_string()
                ),
            ]
        );
    }

    #[test]
    fn only_success_status_yields_a_link() {
        let ok: ShortenResponse =
            serde_json::from_str(r#"{"status":"success","shortenedUrl":"https://s.ex/x"}"#)
                .unwrap();
        assert_eq!(ok.into_short_url().unwrap(), "https://s.ex/x");

        let failed: ShortenResponse =
            serde_json::from_str(r#"{"status":"error","message":"bad key"}"#).unwrap();
        assert!(failed.into_short_url().is_err());
    }
}
