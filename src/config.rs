use crate::ai::DEFAULT_ENDPOINT;
use crate::persistence::get_data_dir;
use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Explicit data directory; otherwise discovered
    pub data_dir: Option<PathBuf>,

    // AI endpoint
    pub ai_endpoint: String,
    pub breakdown_timeout: Duration,
    pub insights_timeout: Duration,
    pub brain_dump_timeout: Duration,
    pub max_retries: u32,

    pub notifications: bool,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.map(|s| s.trim().to_lowercase()) {
        Some(s) if matches!(s.as_str(), "0" | "false" | "off" | "no") => false,
        Some(s) if matches!(s.as_str(), "1" | "true" | "on" | "yes") => true,
        _ => default,
    }
}

impl Settings {
    /// Read settings from the process environment, after loading `.env` if present
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset or unparsable values take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("HABIT_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let ai_endpoint = lookup("HABIT_AI_ENDPOINT")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let breakdown_timeout =
            Duration::from_secs(parse_or(lookup("HABIT_AI_BREAKDOWN_TIMEOUT_SECS"), 15));
        let insights_timeout =
            Duration::from_secs(parse_or(lookup("HABIT_AI_INSIGHTS_TIMEOUT_SECS"), 10));
        let brain_dump_timeout =
            Duration::from_secs(parse_or(lookup("HABIT_AI_BRAIN_DUMP_TIMEOUT_SECS"), 10));
        let max_retries = parse_or(lookup("HABIT_AI_MAX_RETRIES"), 3);

        let notifications = parse_flag(lookup("HABIT_NOTIFICATIONS"), true);
        let log_format = lookup("HABIT_LOG_FORMAT")
            .map(|s| LogFormat::parse(&s))
            .unwrap_or_default();

        Self {
            data_dir,
            ai_endpoint,
            breakdown_timeout,
            insights_timeout,
            brain_dump_timeout,
            max_retries,
            notifications,
            log_format,
        }
    }

    /// The configured data directory, or the discovered one
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_data_dir(),
        }
    }
}
