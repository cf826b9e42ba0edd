mod client;
pub mod models;
pub mod token;

pub use client::CalendarClient;
pub use models::{CalendarEvent, ProjectedEvent};
pub use token::TokenManager;
