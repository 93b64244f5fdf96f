use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};

pub mod auth;
pub mod parse;
mod playlist;
mod search;
pub mod types;

pub use auth::BrowserCredentials;

/// Innertube endpoint root used by the YouTube Music web client.
const BASE_URL: &str = "https://music.youtube.com/youtubei/v1/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Continuation pages fetched at most per listing, so a misbehaving token loop ends.
const MAX_CONTINUATIONS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum InnertubeError {
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(#[from] reqwest::Error),
    #[error("{body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse response: {body}")]
    InvalidResponse { body: String },
    #[error("{body}")]
    Rejected { body: String },
    #[error("Could not sign request: no SAPISID cookie")]
    Unsigned,
}

/// Authenticated session against the innertube JSON API.
///
/// Docs (unofficial): https://ytmusicapi.readthedocs.io
#[derive(Debug, Clone)]
pub struct YtMusicSession {
    client: Client,
    credentials: BrowserCredentials,
}

fn client_context() -> Value {
    json!({
        "client": {
            "clientName": "WEB_REMIX",
            "clientVersion": format!("1.{}.01.00", chrono::Utc::now().format("%Y%m%d")),
            "hl": "en",
        },
        "user": {},
    })
}

impl YtMusicSession {
    pub fn new(credentials: BrowserCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    /// POST `body` (plus the client context) to an innertube endpoint and return the raw
    /// response text. Non-2xx responses keep their body in the error.
    async fn send(
        &self,
        endpoint: &str,
        mut body: Value,
        query: Option<&str>,
    ) -> Result<String, InnertubeError> {
        let mut url = format!("{}{}?alt=json&prettyPrint=false", BASE_URL, endpoint);
        if let Some(query) = query {
            url.push('&');
            url.push_str(query);
        }
        body["context"] = client_context();

        let authorization = self
            .credentials
            .authorization(chrono::Utc::now().timestamp())
            .ok_or(InnertubeError::Unsigned)?;

        let mut request = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", authorization)
            .header("X-Origin", auth::ORIGIN)
            .json(&body);
        for (name, value) in self.credentials.forwarded_headers() {
            request = request.header(name, value);
        }

        log::trace!("POST {}", url);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::debug!("{} returned {}: {}", endpoint, status, text);
            return Err(InnertubeError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    async fn post(
        &self,
        endpoint: &str,
        body: Value,
        query: Option<&str>,
    ) -> Result<Value, InnertubeError> {
        let text = self.send(endpoint, body, query).await?;
        serde_json::from_str(&text).map_err(|_| InnertubeError::InvalidResponse { body: text })
    }

    /// Fetch a browse page and follow its continuations, handing every page to `collect`.
    async fn browse_all<T>(
        &self,
        browse_id: &str,
        collect: impl Fn(&Value) -> Vec<T>,
    ) -> Result<Vec<T>, InnertubeError> {
        let first = self
            .post("browse", json!({ "browseId": browse_id }), None)
            .await?;
        let mut items = collect(&first);
        let mut token = parse::continuation_token(&first);

        for _ in 0..MAX_CONTINUATIONS {
            let Some(current) = token.take() else {
                break;
            };
            let query = format!(
                "ctoken={token}&continuation={token}&type=next",
                token = url::form_urlencoded::byte_serialize(current.as_bytes()).collect::<String>()
            );
            let page = self.post("browse", json!({}), Some(&query)).await?;
            let found = collect(&page);
            log::debug!("{}: continuation page with {} items", browse_id, found.len());
            items.extend(found);
            token = parse::continuation_token(&page);
        }

        Ok(items)
    }
}
