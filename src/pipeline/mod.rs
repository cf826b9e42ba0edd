mod report;
mod step;

pub use report::{RunReport, RunState, Stage};
pub use step::{RetryPolicy, RetryingExecutor, StepExecutor};

use crate::components::email::{render_summary_email, EmailPayload, EmailSettings, ResendClient};
use crate::components::google_calendar::{CalendarClient, ProjectedEvent, TokenManager};
use crate::components::summarizer::{build_messages, ChatMessage, InferenceClient};
use crate::config::Config;
use crate::error::{DigestResult, Error};
use crate::utils::time::TimeWindow;
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Produces an access token for the calendar API
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> DigestResult<String>;
}

/// Lists the projected events of a window, in provider order
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn list_events(
        &self,
        access_token: &str,
        window: &TimeWindow,
    ) -> DigestResult<Vec<ProjectedEvent>>;
}

/// Turns a chat prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> DigestResult<String>;
}

/// Delivers an email and returns the provider's id for it
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &EmailPayload) -> DigestResult<String>;
}

/// The four-stage digest workflow.
///
/// Stages run strictly in order, each under its own retry policy. A stage
/// that exhausts its attempts ends the run; nothing after it executes.
pub struct Pipeline<X = RetryingExecutor> {
    tokens: Arc<dyn TokenSource>,
    events: Arc<dyn EventSource>,
    generator: Arc<dyn TextGenerator>,
    mailer: Arc<dyn Mailer>,
    email: EmailSettings,
    executor: X,
}

impl Pipeline<RetryingExecutor> {
    /// Wire the HTTP-backed stages from configuration
    pub fn from_config(config: &Config) -> DigestResult<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self::new(
            Arc::new(TokenManager::new(config, client.clone())),
            Arc::new(CalendarClient::new(config, client.clone())),
            Arc::new(InferenceClient::new(config, client.clone())),
            Arc::new(ResendClient::new(config, client)),
            EmailSettings {
                from: config.sender.clone(),
                to: config.recipients.clone(),
                subject: config.subject.clone(),
            },
            RetryingExecutor::new(),
        ))
    }
}

impl<X: StepExecutor> Pipeline<X> {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        events: Arc<dyn EventSource>,
        generator: Arc<dyn TextGenerator>,
        mailer: Arc<dyn Mailer>,
        email: EmailSettings,
        executor: X,
    ) -> Self {
        Self {
            tokens,
            events,
            generator,
            mailer,
            email,
            executor,
        }
    }

    /// Execute one run over the window and report how far it got
    pub async fn run(&self, window: &TimeWindow) -> RunReport {
        let mut report = RunReport::new(*window);
        info!(
            "Starting digest run {} for {} .. {}",
            report.run_id,
            window.start_iso(),
            window.end_iso()
        );

        match self.execute(window, &mut report).await {
            Ok(()) => {
                report.state = RunState::Done;
                info!("Digest run {} finished", report.run_id);
            }
            Err((stage, e)) => {
                error!("Digest run {} failed at {}: {}", report.run_id, stage, e);
                report.fail(stage, e);
            }
        }

        report
    }

    async fn execute(&self, window: &TimeWindow, report: &mut RunReport) -> Result<(), (Stage, Error)> {
        let access_token = self
            .step(Stage::Authenticate, || self.tokens.access_token())
            .await?;
        report.state = RunState::TokenAcquired;

        let events = self
            .step(Stage::FetchEvents, || self.events.list_events(&access_token, window))
            .await?;
        report.event_count = Some(events.len());
        report.state = RunState::EventsFetched;

        // An empty week still goes through the summarizer
        let messages = build_messages(&events);
        let summary = self
            .step(Stage::Summarize, || self.generator.generate(&messages))
            .await?;
        report.summary = Some(summary.clone());
        report.state = RunState::Summarized;

        let html = render_summary_email(&summary).map_err(|e| (Stage::Notify, e))?;
        let email = self.email.payload(html);
        let email_id = self.step(Stage::Notify, || self.mailer.send(&email)).await?;
        report.email_id = Some(email_id);
        report.state = RunState::Notified;

        Ok(())
    }

    async fn step<T, F, Fut>(&self, stage: Stage, action: F) -> Result<T, (Stage, Error)>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = DigestResult<T>> + Send,
    {
        info!("Running step {}", stage);
        self.executor
            .execute_step(stage.step_name(), stage.retry_policy(), action)
            .await
            .map_err(|e| (stage, e))
    }
}
