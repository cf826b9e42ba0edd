use super::models::ChatMessage;
use crate::components::google_calendar::ProjectedEvent;

const SYSTEM_PROMPT: &str = "You are a friendly assistant";

const USER_PROMPT_TEMPLATE: &str = "Generate a playful summary of the user's week based on these event description:
{descriptions}. Please just write out the playful summary, nothing more!";

/// Join event descriptions one per line; an event without a description
/// contributes an empty line.
pub fn join_descriptions(events: &[ProjectedEvent]) -> String {
    events
        .iter()
        .map(|event| event.description.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the system and user messages for the week's events
pub fn build_messages(events: &[ProjectedEvent]) -> Vec<ChatMessage> {
    let user_prompt = USER_PROMPT_TEMPLATE.replace("{descriptions}", &join_descriptions(events));

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt)]
}
