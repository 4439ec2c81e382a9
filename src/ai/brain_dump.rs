use super::client::{extract_array, ChatMessage};
use super::AiGateway;
use crate::domain::{Priority, TaskDraft, MAX_MINUTES};
use crate::error::GatewayError;
use crate::store::TaskStore;
use backoff::ExponentialBackoffBuilder;
use chrono::{DateTime, Local, NaiveDate};
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A task proposed by the model, ready to be added to the store
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSuggestion {
    pub title: String,
    pub description: String,
    pub estimated_minutes: Option<u32>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Local>>,
}

impl TaskSuggestion {
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            estimated_minutes: self.estimated_minutes,
            priority: self.priority,
            due_date: self.due_date,
            ai_generated: true,
            ..TaskDraft::default()
        }
    }

    /// Items without a usable title are dropped. An unreadable due date is
    /// ignored rather than rejecting the whole item.
    fn from_value(value: &Value) -> Option<Self> {
        let title = value.get("title")?.as_str()?.trim();
        if title.is_empty() {
            return None;
        }

        let due_date = value
            .get("dueDate")
            .and_then(Value::as_str)
            .and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
                Ok(date) => Some(date.with_timezone(&Local)),
                Err(e) => {
                    warn!(due_date = raw, error = %e, "Ignoring invalid due date");
                    None
                }
            });

        Some(Self {
            title: title.to_string(),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            estimated_minutes: value
                .get("estimatedMinutes")
                .and_then(Value::as_f64)
                .filter(|m| *m > 0.0)
                .map(|m| m.min(MAX_MINUTES as f64).round() as u32),
            priority: value
                .get("priority")
                .and_then(Value::as_str)
                .and_then(Priority::from_label),
            due_date,
        })
    }
}

pub fn brain_dump_system_prompt(today: NaiveDate) -> String {
    format!(
        "You are a task organization assistant. Analyze the user's brain dump and break it down into clear, actionable tasks.\n\
         Extract any date-related information and set due dates accordingly.\n\
         Look for keywords like \"tomorrow\", \"next week\", \"on Friday\", etc.\n\
         Convert relative dates to ISO date strings based on current date. Today is {}.",
        today.format("%Y-%m-%d")
    )
}

pub fn brain_dump_prompt(text: &str) -> String {
    format!(
        r#"Please analyze this brain dump and organize it into tasks. For each task, provide:
- A clear title
- Estimated time in minutes
- Priority (high, medium, low, or optional)
- Due date if mentioned (in ISO format)
- A more detailed description

{text}

Format your response as a JSON array of tasks:
[
  {{
    "title": "Task title",
    "description": "More detailed description",
    "estimatedMinutes": 30,
    "priority": "high",
    "dueDate": "2025-07-01T00:00:00.000Z"
  }}
]
Include "dueDate" only if a date is mentioned."#
    )
}

/// Parse the array in a completion into suggestions
pub fn parse_suggestions(completion: &str) -> Result<Vec<TaskSuggestion>, GatewayError> {
    let value = extract_array(completion)?;
    let items = value.as_array().ok_or(GatewayError::NoJson)?;
    Ok(items.iter().filter_map(TaskSuggestion::from_value).collect())
}

/// Add every suggestion to the store as an AI-generated task
pub fn add_suggestions(store: &mut TaskStore, suggestions: &[TaskSuggestion]) -> Vec<Uuid> {
    suggestions
        .iter()
        .map(|suggestion| store.add_task(suggestion.to_draft()))
        .collect()
}

impl AiGateway {
    /// Ask the model to organise `text` into tasks.
    ///
    /// Network failures, timeouts and error statuses are retried up to
    /// `max_retries` times with exponential backoff. A completion that cannot
    /// be parsed fails immediately.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn organize_brain_dump(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> Result<Vec<TaskSuggestion>, GatewayError> {
        let messages = [
            ChatMessage::system(brain_dump_system_prompt(today)),
            ChatMessage::user(brain_dump_prompt(text)),
        ];

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.options.retry_initial_interval)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build();

        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let client = &self.client;
        let messages = &messages;
        let timeout = self.options.brain_dump_timeout;
        let max_retries = self.options.max_retries;

        let completion = backoff::future::retry(policy, move || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            client.complete(messages, timeout).await.map_err(|e| {
                if e.is_transient() && attempt < max_retries {
                    warn!(attempt = attempt + 1, error = %e, "Brain dump request failed, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await?;

        let suggestions = parse_suggestions(&completion)?;
        info!(count = suggestions.len(), "Brain dump organised");
        Ok(suggestions)
    }
}
