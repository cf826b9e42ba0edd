use crate::error::{config_error, env_error, DigestResult};
use crate::utils::time::{parse_timezone, TriggerSchedule};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Path of the optional settings file for non-secret values
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_EMAIL_API_BASE: &str = "https://api.resend.com";
pub const DEFAULT_AI_MODEL: &str = "@cf/meta/llama-3.1-70b-instruct";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_SENDER: &str = "Calendar Digest <digest@example.com>";
pub const DEFAULT_SUBJECT: &str = "Weekly Summary";
pub const DEFAULT_WEEKDAY: &str = "Sun";
pub const DEFAULT_TIME: &str = "18:00";
pub const DEFAULT_MAX_EVENT_PAGES: u32 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Workers AI REST base for an account; the model id is appended to it
fn cloudflare_ai_base(account_id: &str) -> String {
    format!(
        "https://api.cloudflare.com/client/v4/accounts/{}/ai/run",
        account_id
    )
}

/// Base URLs of the external services the pipeline talks to
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// OAuth2 token endpoint
    pub token_url: String,
    /// Calendar API v3 base
    pub calendar_api_base: String,
    /// Inference base, the model identifier is appended as path
    pub ai_api_base: String,
    /// Transactional email API base
    pub email_api_base: String,
}

/// Main configuration structure for the digest service
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Long-lived refresh token exchanged for an access token on every run
    pub google_refresh_token: String,
    /// Calendar to summarize
    pub google_calendar_id: String,
    /// Bearer token for the inference endpoint
    pub ai_api_token: String,
    /// Model identifier passed to the inference endpoint
    pub ai_model: String,
    /// Email provider API key
    pub resend_api_key: String,
    /// Sender address of the digest email
    pub sender: String,
    /// Recipients of the digest email
    pub recipients: Vec<String>,
    /// Subject line of the digest email
    pub subject: String,
    /// Timezone for scheduling and for the reporting window
    pub timezone: String,
    /// Weekday the digest is sent on
    pub digest_weekday: String,
    /// Time of day (HH:MM) the digest is sent at
    pub digest_time: String,
    /// Fire one run immediately when the service starts
    pub run_on_startup: bool,
    /// Upper bound on calendar result pages fetched per run
    pub max_event_pages: u32,
    /// Per-request HTTP timeout
    pub http_timeout_secs: u64,
    pub endpoints: Endpoints,
}

/// Non-secret settings that may be kept in `config/digest.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub google_calendar_id: Option<String>,
    pub ai_model: Option<String>,
    pub sender: Option<String>,
    pub recipients: Option<Vec<String>>,
    pub subject: Option<String>,
    pub timezone: Option<String>,
    pub digest_weekday: Option<String>,
    pub digest_time: Option<String>,
    pub run_on_startup: Option<bool>,
    pub max_event_pages: Option<u32>,
    pub http_timeout_secs: Option<u64>,
}

impl FileSettings {
    /// Read the settings file, an absent file yields empty settings
    pub fn read(path: impl AsRef<Path>) -> DigestResult<Self> {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> DigestResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = FileSettings::read(DEFAULT_CONFIG_PATH)?;
        Self::from_sources(|key| env::var(key).ok(), file)
    }

    /// Build the configuration from a variable lookup and file settings.
    ///
    /// Variables take precedence over the file, the file over built-in defaults.
    pub fn from_sources<F>(lookup: F, file: FileSettings) -> DigestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| var(key).ok_or_else(|| env_error(key));
        let setting = |key: &str, file_value: Option<String>, default: &str| {
            var(key).or(file_value).unwrap_or_else(|| default.to_string())
        };

        // Required secrets
        let google_client_id = require("GOOGLE_CLIENT_ID")?;
        let google_client_secret = require("GOOGLE_CLIENT_SECRET")?;
        let google_refresh_token = require("GOOGLE_REFRESH_TOKEN")?;
        let ai_api_token = require("AI_API_TOKEN")?;
        let resend_api_key = require("RESEND_API_KEY")?;

        let recipients = match var("DIGEST_RECIPIENT") {
            Some(list) => split_list(&list),
            None => file.recipients.unwrap_or_default(),
        };
        if recipients.is_empty() {
            return Err(env_error("DIGEST_RECIPIENT"));
        }

        let ai_api_base = match var("AI_API_BASE") {
            Some(base) => base,
            None => cloudflare_ai_base(&require("CLOUDFLARE_ACCOUNT_ID")?),
        };

        let run_on_startup = match var("RUN_ON_STARTUP") {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| config_error(&format!("Invalid RUN_ON_STARTUP value: {}", value)))?,
            None => file.run_on_startup.unwrap_or(false),
        };

        let max_event_pages = match var("MAX_EVENT_PAGES") {
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| config_error("Invalid MAX_EVENT_PAGES format"))?,
            None => file.max_event_pages.unwrap_or(DEFAULT_MAX_EVENT_PAGES),
        };
        if max_event_pages == 0 {
            return Err(config_error("MAX_EVENT_PAGES must be at least 1"));
        }

        let http_timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|_| config_error("Invalid HTTP_TIMEOUT_SECS format"))?,
            None => file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        };
        if http_timeout_secs == 0 {
            return Err(config_error("HTTP_TIMEOUT_SECS must be at least 1"));
        }

        let endpoints = Endpoints {
            token_url: setting("GOOGLE_TOKEN_URL", None, DEFAULT_TOKEN_URL),
            calendar_api_base: setting("GOOGLE_CALENDAR_API_BASE", None, DEFAULT_CALENDAR_API_BASE),
            ai_api_base,
            email_api_base: setting("EMAIL_API_BASE", None, DEFAULT_EMAIL_API_BASE),
        };

        let config = Config {
            google_client_id,
            google_client_secret,
            google_refresh_token,
            google_calendar_id: setting("GOOGLE_CALENDAR_ID", file.google_calendar_id, DEFAULT_CALENDAR_ID),
            ai_api_token,
            ai_model: setting("AI_MODEL", file.ai_model, DEFAULT_AI_MODEL),
            resend_api_key,
            sender: setting("DIGEST_SENDER", file.sender, DEFAULT_SENDER),
            recipients,
            subject: setting("DIGEST_SUBJECT", file.subject, DEFAULT_SUBJECT),
            timezone: setting("TIMEZONE", file.timezone, "UTC"),
            digest_weekday: setting("DIGEST_WEEKDAY", file.digest_weekday, DEFAULT_WEEKDAY),
            digest_time: setting("DIGEST_TIME", file.digest_time, DEFAULT_TIME),
            run_on_startup,
            max_event_pages,
            http_timeout_secs,
            endpoints,
        };

        // Fail at startup rather than at the first trigger
        config.trigger_schedule()?;

        Ok(config)
    }

    /// Parsed timezone
    pub fn tz(&self) -> DigestResult<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Parsed weekly trigger
    pub fn trigger_schedule(&self) -> DigestResult<TriggerSchedule> {
        TriggerSchedule::parse(&self.digest_weekday, &self.digest_time, &self.timezone)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
