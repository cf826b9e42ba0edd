use crate::error::DigestResult;
use askama::Template;

/// Link behind the "View Calendar" button
pub const CALENDAR_URL: &str = "https://calendar.google.com";
const FOOTER_URL: &str = "https://example.com";

#[derive(Template)]
#[template(path = "summary_email.html")]
struct SummaryEmail<'a> {
    meeting_summary: &'a str,
    calendar_url: &'a str,
    footer_url: &'a str,
}

/// Render the digest email body around the summary text.
///
/// The summary is HTML-escaped; line breaks survive through `pre-wrap`.
pub fn render_summary_email(summary: &str) -> DigestResult<String> {
    let email = SummaryEmail {
        meeting_summary: summary,
        calendar_url: CALENDAR_URL,
        footer_url: FOOTER_URL,
    };
    Ok(email.render()?)
}
