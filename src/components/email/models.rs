use serde::{Deserialize, Serialize};

/// Outgoing email, built once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Fixed envelope of the digest email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
}

impl EmailSettings {
    /// Wrap a rendered body into a payload
    pub fn payload(&self, html: String) -> EmailPayload {
        EmailPayload {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject.clone(),
            html,
        }
    }
}

/// Acknowledgement of an accepted email
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub id: Option<String>,
}

/// Error object returned by the email provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderError {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.name.as_deref().unwrap_or("unknown_error"),
            self.status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "no status".to_string()),
            self.message.as_deref().unwrap_or("no message")
        )
    }
}
