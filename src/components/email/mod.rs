mod client;
pub mod models;
pub mod template;

pub use client::{ResendClient, UNKNOWN_EMAIL_ID};
pub use models::{EmailPayload, EmailSettings};
pub use template::render_summary_email;
