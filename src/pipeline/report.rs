use super::step::RetryPolicy;
use crate::error::Error;
use crate::utils::time::TimeWindow;
use std::fmt;
use uuid::Uuid;

/// The four pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    FetchEvents,
    Summarize,
    Notify,
}

impl Stage {
    /// Name the step is executed and logged under
    pub fn step_name(self) -> &'static str {
        match self {
            Stage::Authenticate => "getAccessToken",
            Stage::FetchEvents => "fetchMeetings",
            Stage::Summarize => "generateSummary",
            Stage::Notify => "sendEmail",
        }
    }

    pub fn retry_policy(self) -> RetryPolicy {
        match self {
            Stage::Authenticate => RetryPolicy::AUTHENTICATION,
            Stage::FetchEvents | Stage::Summarize | Stage::Notify => RetryPolicy::STANDARD,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step_name())
    }
}

/// Progress of a single run.
///
/// Moves strictly forward; any stage failure ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    TokenAcquired,
    EventsFetched,
    Summarized,
    Notified,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::NotStarted => "not started",
            RunState::TokenAcquired => "token acquired",
            RunState::EventsFetched => "events fetched",
            RunState::Summarized => "summarized",
            RunState::Notified => "notified",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one pipeline execution
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub window: TimeWindow,
    pub state: RunState,
    pub event_count: Option<usize>,
    pub summary: Option<String>,
    pub email_id: Option<String>,
    pub failed_stage: Option<Stage>,
    pub error: Option<Error>,
}

impl RunReport {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            window,
            state: RunState::NotStarted,
            event_count: None,
            summary: None,
            email_id: None,
            failed_stage: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    pub(crate) fn fail(&mut self, stage: Stage, error: Error) {
        self.state = RunState::Failed;
        self.failed_stage = Some(stage);
        self.error = Some(error);
    }
}
