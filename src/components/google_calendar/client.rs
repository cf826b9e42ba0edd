use super::models::{EventsPage, ProjectedEvent};
use crate::config::Config;
use crate::error::{fetch_error, DigestResult};
use crate::pipeline::EventSource;
use crate::utils::time::TimeWindow;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

/// Reads events from the Google Calendar v3 events listing
#[derive(Clone)]
pub struct CalendarClient {
    client: Client,
    api_base: String,
    calendar_id: String,
    max_pages: u32,
}

impl CalendarClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_base: config.endpoints.calendar_api_base.clone(),
            calendar_id: config.google_calendar_id.clone(),
            max_pages: config.max_event_pages.max(1),
        }
    }

    /// Build the listing URL for one page of the window
    fn events_url(&self, window: &TimeWindow, page_token: Option<&str>) -> DigestResult<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| fetch_error(&format!("Failed to parse URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| fetch_error("Calendar API base cannot carry a path"))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("timeMin", &window.start_iso())
                .append_pair("timeMax", &window.end_iso())
                .append_pair("orderBy", "startTime")
                .append_pair("singleEvents", "true");
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        Ok(url)
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        window: &TimeWindow,
        page_token: Option<&str>,
    ) -> DigestResult<EventsPage> {
        let url = self.events_url(window, page_token)?;
        debug!("Requesting events page from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(fetch_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse events response: {}", e)))
    }

    /// List the events of the window in start-time order, projected down to
    /// title and description.
    ///
    /// Follows `nextPageToken` until the listing is exhausted or the page cap
    /// is reached.
    pub async fn list_events(
        &self,
        access_token: &str,
        window: &TimeWindow,
    ) -> DigestResult<Vec<ProjectedEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for page_number in 1..=self.max_pages {
            let page = self
                .fetch_page(access_token, window, page_token.as_deref())
                .await?;
            events.extend(page.items.into_iter().map(ProjectedEvent::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => {
                    info!(
                        "Fetched {} events between {} and {} ({} page(s))",
                        events.len(),
                        window.start_iso(),
                        window.end_iso(),
                        page_number
                    );
                    return Ok(events);
                }
            }
        }

        warn!(
            "Stopped after {} pages with more events remaining; summarizing {} events",
            self.max_pages,
            events.len()
        );
        Ok(events)
    }
}

#[async_trait]
impl EventSource for CalendarClient {
    async fn list_events(
        &self,
        access_token: &str,
        window: &TimeWindow,
    ) -> DigestResult<Vec<ProjectedEvent>> {
        CalendarClient::list_events(self, access_token, window).await
    }
}
