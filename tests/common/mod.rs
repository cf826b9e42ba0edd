#![allow(dead_code)]

use async_trait::async_trait;
use calendar_digest::components::email::{EmailPayload, EmailSettings};
use calendar_digest::components::google_calendar::ProjectedEvent;
use calendar_digest::components::summarizer::ChatMessage;
use calendar_digest::config::{Config, Endpoints};
use calendar_digest::error::{auth_error, fetch_error, summarization_error, DigestResult};
use calendar_digest::pipeline::{
    EventSource, Mailer, Pipeline, RetryingExecutor, TextGenerator, TokenSource,
};
use calendar_digest::utils::time::TimeWindow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use url::Url;

pub const RECIPIENT: &str = "me@example.com";
pub const SENDER: &str = "Calendar Digest <digest@example.com>";

/// A request captured by [`MockServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn form_param(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Local HTTP server answering every request through a handler closure
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start<H>(handler: H) -> Self
    where
        H: Fn(&RecordedRequest) -> (u16, String) + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);

                let url = Url::parse(&format!("http://localhost{}", request.url())).unwrap();
                let captured = RecordedRequest {
                    method: request.method().to_string(),
                    path: url.path().to_string(),
                    query: url.query_pairs().into_owned().collect(),
                    headers: request
                        .headers()
                        .iter()
                        .map(|h| (h.field.as_str().to_string(), h.value.as_str().to_string()))
                        .collect(),
                    body,
                };

                let (status, response_body) = handler(&captured);
                recorded.lock().unwrap().push(captured);

                let response = tiny_http::Response::from_string(response_body)
                    .with_status_code(status)
                    .with_header(
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path_suffix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(path_suffix))
            .collect()
    }
}

/// Configuration pointing every endpoint at `base`
pub fn test_config(base: &str) -> Config {
    Config {
        google_client_id: "test_client_id".to_string(),
        google_client_secret: "test_client_secret".to_string(),
        google_refresh_token: "test_refresh_token".to_string(),
        google_calendar_id: "primary".to_string(),
        ai_api_token: "test_ai_token".to_string(),
        ai_model: "@cf/meta/llama-3.1-70b-instruct".to_string(),
        resend_api_key: "re_test".to_string(),
        sender: SENDER.to_string(),
        recipients: vec![RECIPIENT.to_string()],
        subject: "Weekly Summary".to_string(),
        timezone: "UTC".to_string(),
        digest_weekday: "Sun".to_string(),
        digest_time: "18:00".to_string(),
        run_on_startup: false,
        max_event_pages: 10,
        http_timeout_secs: 5,
        endpoints: Endpoints {
            token_url: format!("{}/token", base),
            calendar_api_base: format!("{}/calendar/v3", base),
            ai_api_base: format!("{}/ai/run", base),
            email_api_base: base.to_string(),
        },
    }
}

pub fn test_window() -> TimeWindow {
    TimeWindow::parse("2024-01-07T00:00:00Z", "2024-01-14T00:00:00Z").unwrap()
}

pub fn email_settings() -> EmailSettings {
    EmailSettings {
        from: SENDER.to_string(),
        to: vec![RECIPIENT.to_string()],
        subject: "Weekly Summary".to_string(),
    }
}

pub fn event(title: &str, description: Option<&str>) -> ProjectedEvent {
    ProjectedEvent {
        title: Some(title.to_string()),
        description: description.map(str::to_string),
    }
}

/// Token source that either always succeeds with `abc` or always fails
#[derive(Default)]
pub struct FakeTokens {
    pub fail: bool,
    pub calls: AtomicU32,
}

#[async_trait]
impl TokenSource for FakeTokens {
    async fn access_token(&self) -> DigestResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(auth_error("Failed to refresh access token: HTTP 401"))
        } else {
            Ok("abc".to_string())
        }
    }
}

/// Event source returning a fixed list, or failing like an HTTP 500
#[derive(Default)]
pub struct FakeEvents {
    pub events: Vec<ProjectedEvent>,
    pub fail: bool,
    pub calls: AtomicU32,
    pub tokens_seen: Mutex<Vec<String>>,
}

#[async_trait]
impl EventSource for FakeEvents {
    async fn list_events(
        &self,
        access_token: &str,
        _window: &TimeWindow,
    ) -> DigestResult<Vec<ProjectedEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(access_token.to_string());
        if self.fail {
            Err(fetch_error("Failed to fetch events: HTTP 500"))
        } else {
            Ok(self.events.clone())
        }
    }
}

/// Generator that records prompts and answers with a fixed reply, or fails
#[derive(Default)]
pub struct FakeGenerator {
    pub reply: String,
    pub fail: bool,
    pub calls: AtomicU32,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> DigestResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(messages.to_vec());
        if self.fail {
            Err(summarization_error("Inference endpoint returned error: HTTP 503"))
        } else {
            Ok(self.reply.clone())
        }
    }
}

/// Mailer that keeps every email it is asked to send
#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<EmailPayload>>,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, email: &EmailPayload) -> DigestResult<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("email-{}", sent.len()))
    }
}

/// The four fakes plus a pipeline wired to them without retry delays
pub struct Fakes {
    pub tokens: Arc<FakeTokens>,
    pub events: Arc<FakeEvents>,
    pub generator: Arc<FakeGenerator>,
    pub mailer: Arc<FakeMailer>,
}

impl Fakes {
    pub fn new(tokens: FakeTokens, events: FakeEvents, generator: FakeGenerator) -> Self {
        Self {
            tokens: Arc::new(tokens),
            events: Arc::new(events),
            generator: Arc::new(generator),
            mailer: Arc::new(FakeMailer::default()),
        }
    }

    pub fn pipeline(&self) -> Pipeline<RetryingExecutor> {
        Pipeline::new(
            self.tokens.clone(),
            self.events.clone(),
            self.generator.clone(),
            self.mailer.clone(),
            email_settings(),
            RetryingExecutor::without_delays(),
        )
    }
}

pub fn calls(counter: &AtomicU32) -> u32 {
    counter.load(Ordering::SeqCst)
}
