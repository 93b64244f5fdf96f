use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

pub const ORIGIN: &str = "https://music.youtube.com";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Cookies that carry the value signed into the Authorization header, in preference order.
const SAPISID_COOKIES: &[&str] = &["SAPISID", "__Secure-3PAPISID"];

/// Headers that are either recomputed per request or managed by the HTTP client.
const SKIPPED_HEADERS: &[&str] = &[
    "authorization",
    "content-length",
    "content-type",
    "host",
    "accept-encoding",
    "connection",
];

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential file not found: {0}. Run `playlist-importer setup` first")]
    Missing(PathBuf),
    #[error("Failed to read credential file {path}: {error}")]
    Unreadable { path: PathBuf, error: std::io::Error },
    #[error("Credential file {path} is not a JSON object of headers: {reason}")]
    Invalid { path: PathBuf, reason: String },
    #[error("No SAPISID cookie in the credentials. Copy the request headers again while logged in")]
    MissingSapisid,
    #[error("No request headers given")]
    Empty,
    #[error("Failed to write credential file {path}: {error}")]
    Unwritable { path: PathBuf, error: std::io::Error },
}

/// Request headers copied from a logged-in browser session (`browser.json`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCredentials {
    headers: BTreeMap<String, String>,
}

impl BrowserCredentials {
    /// Build credentials from a header map, validating the cookie and filling in defaults.
    pub fn from_headers(mut headers: BTreeMap<String, String>) -> Result<Self, CredentialError> {
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("origin")) {
            headers.insert("Origin".to_string(), ORIGIN.to_string());
        }
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
            log::warn!("No User-Agent in credentials, using a default");
            headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
        }

        let credentials = Self { headers };
        if credentials.sapisid().is_none() {
            return Err(CredentialError::MissingSapisid);
        }
        Ok(credentials)
    }

    /// Load a `browser.json` file. Null values become empty strings and other
    /// non-string values are stringified.
    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        if !path.exists() {
            return Err(CredentialError::Missing(path.to_path_buf()));
        }

        let contents =
            std::fs::read_to_string(path).map_err(|error| CredentialError::Unreadable {
                path: path.to_path_buf(),
                error,
            })?;
        let values: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| CredentialError::Invalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let headers = values
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();

        log::debug!("Loaded credentials from {}", path.display());
        Self::from_headers(headers)
    }

    /// Parse raw request headers as copied from the browser's network panel.
    ///
    /// Lines without a colon continue the previous cookie header.
    pub fn parse_request_headers(raw: &str) -> Result<Self, CredentialError> {
        let mut headers = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once(':') {
                // HTTP/2 pseudo headers (":authority: ...") are not forwarded
                Some(("", _)) => current = None,
                Some((key, value)) if !key.contains(' ') => {
                    let key = canonical_header_name(key.trim());
                    current = Some(key.to_ascii_lowercase());
                    headers.insert(key, value.trim().to_string());
                }
                _ => {
                    if current.as_deref() == Some("cookie") {
                        if let Some(cookie) = headers.get_mut("Cookie") {
                            cookie.push(' ');
                            cookie.push_str(line);
                        }
                    }
                }
            }
        }

        if headers.is_empty() {
            return Err(CredentialError::Empty);
        }
        Self::from_headers(headers)
    }

    /// Write the headers as a pretty-printed JSON object.
    pub fn save(&self, path: &Path) -> Result<(), CredentialError> {
        let unwritable = |error| CredentialError::Unwritable {
            path: path.to_path_buf(),
            error,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(unwritable)?;
        }
        let contents = serde_json::to_string_pretty(&self.headers)
            .map_err(|e| unwritable(std::io::Error::other(e)))?;
        std::fs::write(path, contents).map_err(unwritable)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn sapisid(&self) -> Option<&str> {
        let cookie = self.header("cookie")?;
        let cookies: Vec<(&str, &str)> = cookie
            .split(';')
            .filter_map(|part| part.trim().split_once('='))
            .collect();

        SAPISID_COOKIES.iter().find_map(|wanted| {
            cookies
                .iter()
                .find(|(name, value)| name == wanted && !value.is_empty())
                .map(|(_, value)| *value)
        })
    }

    /// `SAPISIDHASH <ts>_<sha1("<ts> <SAPISID> <origin>")>` for the given unix timestamp.
    pub fn authorization(&self, timestamp: i64) -> Option<String> {
        let sapisid = self.sapisid()?;
        let digest = Sha1::digest(format!("{} {} {}", timestamp, sapisid, ORIGIN).as_bytes());
        Some(format!("SAPISIDHASH {}_{:x}", timestamp, digest))
    }

    /// Headers to replay on every request.
    pub fn forwarded_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter(|(k, _)| !SKIPPED_HEADERS.contains(&k.to_ascii_lowercase().as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn canonical_header_name(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "user-agent" => "User-Agent".to_string(),
        "cookie" => "Cookie".to_string(),
        "x-goog-authuser" => "X-Goog-AuthUser".to_string(),
        "authorization" => "Authorization".to_string(),
        "x-goog-visitor-id" => "X-Goog-Visitor-Id".to_string(),
        _ => key.to_string(),
    }
}
