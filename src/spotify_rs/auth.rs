use std::time::Duration;

use crate::spotify_rs::types::SpotifyTokenResponse;

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

#[derive(Debug, thiserror::Error)]
pub enum ClientCredentialsError {
    #[error("Spotify rejected the client credentials: {reason}")]
    InvalidCredentials { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Obtain an app-only access token. Enough to read public playlists.
/// https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow
pub async fn request_client_credentials_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
) -> Result<SpotifyTokenResponse, ClientCredentialsError> {
    let response = client
        .post(SPOTIFY_TOKEN_URL)
        // Serialized as x-www-form-urlencoded, as required by spotify
        .form(&[("grant_type", "client_credentials")])
        .basic_auth(client_id, Some(client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(ClientCredentialsError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ClientCredentialsError::InvalidCredentials {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    let token_response: SpotifyTokenResponse = response
        .json()
        .await
        .map_err(ClientCredentialsError::FailedToParseResponse)?;

    log::debug!(
        "Obtained Spotify access token, expires in {}s",
        token_response.expires_in
    );
    Ok(token_response)
}
