mod common;

use calendar_digest::components::email::{ResendClient, UNKNOWN_EMAIL_ID};
use calendar_digest::components::google_calendar::{CalendarClient, TokenManager};
use calendar_digest::components::summarizer::InferenceClient;
use calendar_digest::config::Config;
use calendar_digest::pipeline::{Pipeline, RetryingExecutor, RunState, Stage};
use common::{email_settings, test_config, test_window, MockServer, RecordedRequest, RECIPIENT};
use serde_json::json;
use std::sync::Arc;

const REPLY: &str = "A week of standups and spirited design debates.";

/// Google, Workers AI and Resend behind one local server
fn happy_path(request: &RecordedRequest) -> (u16, String) {
    match request.path.as_str() {
        "/token" => (200, json!({"access_token": "abc", "expires_in": 3599}).to_string()),
        path if path.ends_with("/events") => (
            200,
            json!({
                "items": [
                    {"id": "e1", "summary": "Standup", "description": "Standup notes"},
                    {"id": "e2", "summary": "Design review", "description": "Design review notes"}
                ]
            })
            .to_string(),
        ),
        path if path.starts_with("/ai/run/") => {
            let body = request.json();
            let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
            if prompt.contains("Standup notes\nDesign review notes") {
                (200, json!({"result": {"response": REPLY}, "success": true}).to_string())
            } else {
                (200, json!({"result": {"response": "unexpected prompt"}}).to_string())
            }
        }
        "/emails" => (200, json!({"id": "email-123"}).to_string()),
        _ => (404, json!({"error": "not found"}).to_string()),
    }
}

/// HTTP-backed stages with retries that do not sleep
fn pipeline_without_delays(config: &Config) -> Pipeline<RetryingExecutor> {
    let client = reqwest::Client::new();
    Pipeline::new(
        Arc::new(TokenManager::new(config, client.clone())),
        Arc::new(CalendarClient::new(config, client.clone())),
        Arc::new(InferenceClient::new(config, client.clone())),
        Arc::new(ResendClient::new(config, client)),
        email_settings(),
        RetryingExecutor::without_delays(),
    )
}

#[tokio::test]
async fn test_scenario_over_http() {
    let server = MockServer::start(happy_path);
    let config = test_config(&server.base_url);
    let pipeline = Pipeline::from_config(&config).unwrap();

    let report = pipeline.run(&test_window()).await;

    assert_eq!(report.state, RunState::Done, "error: {:?}", report.error);
    assert_eq!(report.summary.as_deref(), Some(REPLY));
    assert_eq!(report.email_id.as_deref(), Some("email-123"));

    let events = server.requests_to("/events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].header("authorization"), Some("Bearer abc"));
    assert_eq!(events[0].query_param("timeMin"), Some("2024-01-07T00:00:00Z"));
    assert_eq!(events[0].query_param("timeMax"), Some("2024-01-14T00:00:00Z"));

    let emails = server.requests_to("/emails");
    assert_eq!(emails.len(), 1);
    let email = emails[0].json();
    assert_eq!(email["to"], json!([RECIPIENT]));
    assert_eq!(email["subject"], "Weekly Summary");
    assert!(email["html"].as_str().unwrap().contains(REPLY));
}

#[tokio::test]
async fn test_token_endpoint_down_never_reaches_calendar() {
    let server = MockServer::start(|request| match request.path.as_str() {
        "/token" => (503, "unavailable".to_string()),
        _ => happy_path(request),
    });
    let config = test_config(&server.base_url);

    let report = pipeline_without_delays(&config).run(&test_window()).await;

    assert_eq!(report.state, RunState::Failed);
    assert_eq!(report.failed_stage, Some(Stage::Authenticate));
    assert_eq!(server.requests_to("/token").len(), 5);
    assert!(server.requests_to("/events").is_empty());
}

#[tokio::test]
async fn test_calendar_500_ends_run_before_inference() {
    let server = MockServer::start(|request| {
        if request.path.ends_with("/events") {
            (500, json!({"error": {"code": 500, "message": "Backend Error"}}).to_string())
        } else {
            happy_path(request)
        }
    });
    let config = test_config(&server.base_url);

    let report = pipeline_without_delays(&config).run(&test_window()).await;

    assert_eq!(report.state, RunState::Failed);
    assert_eq!(report.failed_stage, Some(Stage::FetchEvents));
    assert_eq!(server.requests_to("/events").len(), 3);
    assert!(server
        .requests()
        .iter()
        .all(|r| !r.path.starts_with("/ai/run/") && r.path != "/emails"));
}

#[tokio::test]
async fn test_email_rejection_fails_notify_stage() {
    let server = MockServer::start(|request| {
        if request.path == "/emails" {
            (
                403,
                json!({"statusCode": 403, "name": "validation_error", "message": "Domain not verified"})
                    .to_string(),
            )
        } else {
            happy_path(request)
        }
    });
    let config = test_config(&server.base_url);

    let report = pipeline_without_delays(&config).run(&test_window()).await;

    assert_eq!(report.state, RunState::Failed);
    assert_eq!(report.failed_stage, Some(Stage::Notify));
    assert_eq!(report.summary.as_deref(), Some(REPLY));
    assert_eq!(server.requests_to("/emails").len(), 3);
}

#[tokio::test]
async fn test_email_accepted_with_empty_body_is_not_resent() {
    let server = MockServer::start(|request| {
        if request.path == "/emails" {
            (202, String::new())
        } else {
            happy_path(request)
        }
    });
    let config = test_config(&server.base_url);

    let report = pipeline_without_delays(&config).run(&test_window()).await;

    assert_eq!(report.state, RunState::Done, "error: {:?}", report.error);
    assert_eq!(report.email_id.as_deref(), Some(UNKNOWN_EMAIL_ID));
    assert_eq!(server.requests_to("/emails").len(), 1);
}
