mod client;
pub mod models;
pub mod prompt;

pub use client::InferenceClient;
pub use models::{ChatMessage, Role};
pub use prompt::{build_messages, join_descriptions};
