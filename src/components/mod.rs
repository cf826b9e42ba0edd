// Export components
pub mod email;
pub mod google_calendar;
pub mod summarizer;

pub use email::{EmailPayload, ResendClient};
pub use google_calendar::{CalendarClient, ProjectedEvent, TokenManager};
pub use summarizer::{ChatMessage, InferenceClient};
