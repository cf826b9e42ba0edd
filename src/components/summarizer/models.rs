use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for the inference endpoint
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    pub messages: &'a [ChatMessage],
}

/// Pull the generated text out of an inference response.
///
/// The text sits in `response`, either at the top level or wrapped in the
/// REST envelope's `result` object.
pub fn response_text(body: &Value) -> Option<&str> {
    body.get("result")
        .and_then(|result| result.get("response"))
        .or_else(|| body.get("response"))
        .and_then(Value::as_str)
}
