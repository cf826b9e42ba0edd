use super::models::{EmailPayload, ProviderError, SendResponse};
use crate::config::Config;
use crate::error::{delivery_error, DigestResult};
use crate::pipeline::Mailer;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info, warn};

/// Reported when the provider accepts a message without returning its id
pub const UNKNOWN_EMAIL_ID: &str = "-";

/// Sends email through the Resend HTTP API
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_base: config.endpoints.email_api_base.clone(),
            api_key: config.resend_api_key.clone(),
        }
    }

    /// Submit the email and return the provider's message id
    pub async fn send_email(&self, email: &EmailPayload) -> DigestResult<String> {
        let url = format!("{}/emails", self.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send email: {}", e);
                delivery_error(&format!("Failed to send email: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let provider_error = serde_json::from_str::<ProviderError>(&body).unwrap_or_else(|_| {
                ProviderError {
                    status_code: Some(status.as_u16()),
                    message: Some(body.clone()),
                    ..Default::default()
                }
            });
            error!("Email provider rejected the message: {}", provider_error);
            return Err(delivery_error(&format!("Failed to send email: {}", provider_error)));
        }

        // Any 2xx is a delivery; the id is best effort
        let id = match serde_json::from_str::<SendResponse>(&body) {
            Ok(SendResponse { id: Some(id) }) => id,
            _ => {
                warn!("Email accepted with HTTP {} but no message id in the response", status);
                UNKNOWN_EMAIL_ID.to_string()
            }
        };

        info!("Email {} accepted for {} recipient(s)", id, email.to.len());
        Ok(id)
    }
}

#[async_trait]
impl Mailer for ResendClient {
    async fn send(&self, email: &EmailPayload) -> DigestResult<String> {
        self.send_email(email).await
    }
}
