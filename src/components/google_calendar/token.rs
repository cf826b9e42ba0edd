use crate::config::Config;
use crate::error::{auth_error, DigestResult};
use crate::pipeline::TokenSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Body of a successful refresh-token grant
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    scope: Option<String>,
}

/// Exchanges the configured refresh token for a fresh access token.
///
/// Nothing is cached; every call performs a new grant.
#[derive(Clone)]
pub struct TokenManager {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl TokenManager {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            token_url: config.endpoints.token_url.clone(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            refresh_token: config.google_refresh_token.clone(),
        }
    }

    /// Perform the refresh-token grant and return the access token
    pub async fn refresh_access_token(&self) -> DigestResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh access token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh access token: HTTP {} - {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        debug!(
            "Token response: type={:?} scope={:?} expires_in={:?}",
            token.token_type, token.scope, token.expires_in
        );

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?;

        info!("Obtained a fresh access token");
        Ok(access_token)
    }
}

#[async_trait]
impl TokenSource for TokenManager {
    async fn access_token(&self) -> DigestResult<String> {
        self.refresh_access_token().await
    }
}
