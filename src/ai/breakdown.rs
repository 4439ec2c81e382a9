use super::client::{extract_object, ChatMessage};
use super::AiGateway;
use crate::domain::{GeneratedSubTask, Priority, TaskBreakdown, MAX_MINUTES};
use crate::error::GatewayError;
use serde_json::Value;
use tracing::{info, instrument, warn};

pub const BREAKDOWN_SYSTEM_PROMPT: &str = "You are a helpful task breakdown assistant. Break down tasks into smaller subtasks with time estimates and suggest a priority level.";

/// Keyword sets checked in this order; the first hit decides
const PRIORITY_KEYWORDS: [(Priority, &[&str]); 4] = [
    (Priority::High, &["urgent", "asap", "deadline", "important", "critical"]),
    (Priority::Medium, &["soon", "this week", "meeting", "report"]),
    (Priority::Low, &["when possible", "eventually", "routine", "regular"]),
    (Priority::Optional, &["optional", "if time", "nice to have", "consider"]),
];

pub fn breakdown_prompt(title: &str, description: &str) -> String {
    let description = if description.trim().is_empty() {
        "No description provided"
    } else {
        description
    };

    format!(
        r#"Break down this task into smaller subtasks:
Task: {title}
Description: {description}

Please provide a JSON response with:
1. A list of subtasks with titles and estimated time in minutes
2. A total estimated time for the entire task
3. A suggested priority level (high, medium, low, or optional)

Format your response as a valid JSON object with this structure:
{{
  "subTasks": [
    {{ "title": "Subtask 1", "estimatedMinutes": 30 }},
    {{ "title": "Subtask 2", "estimatedMinutes": 45 }}
  ],
  "totalEstimatedMinutes": 75,
  "suggestedPriority": "high"
}}"#
    )
}

/// Suggest a priority from keywords in the title and description
pub fn determine_priority(title: &str, description: &str) -> Priority {
    let text = format!("{} {}", title, description).to_lowercase();
    PRIORITY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(priority, _)| *priority)
        .unwrap_or_default()
}

/// Deterministic breakdown used whenever the endpoint cannot answer.
///
/// Complexity is the word count over ten, clamped to 1..=5. It picks 2 to 4
/// generic steps and a total of at least 30 minutes, split evenly.
pub fn fallback_breakdown(title: &str, description: &str) -> TaskBreakdown {
    let words = token_count(&format!("{} {}", title, description));
    let complexity = (words as f64 / 10.0).clamp(1.0, 5.0);

    let count = (complexity.floor() as u32 + 1).clamp(2, 4);
    let total = ((complexity * 20.0).floor() as u32).max(30);
    let per_task = total / count;

    let mut titles = vec!["Plan and organize"];
    if count >= 3 {
        titles.push("Research and gather information");
    }
    titles.push("Execute main task");
    if count >= 4 {
        titles.push("Review and finalize");
    }

    TaskBreakdown {
        sub_tasks: titles
            .into_iter()
            .map(|t| GeneratedSubTask::new(t, per_task))
            .collect(),
        total_estimated_minutes: total,
        suggested_priority: determine_priority(title, description),
    }
}

/// Pieces left after splitting on whitespace runs; empty edges count
fn token_count(text: &str) -> usize {
    let mut runs = 0;
    let mut in_space = false;
    for c in text.chars() {
        let space = c.is_whitespace();
        if space && !in_space {
            runs += 1;
        }
        in_space = space;
    }
    runs + 1
}

fn minutes(value: &Value) -> Option<u32> {
    value
        .as_f64()
        .map(|m| m.clamp(0.0, MAX_MINUTES as f64).round() as u32)
}

/// Validate a model answer. `subTasks` must be an array and
/// `totalEstimatedMinutes` a number; an unknown priority falls back to keywords.
pub fn parse_breakdown(value: &Value, title: &str, description: &str) -> Result<TaskBreakdown, GatewayError> {
    let items = value
        .get("subTasks")
        .and_then(Value::as_array)
        .ok_or(GatewayError::MissingFields("subTasks"))?;
    let total = value
        .get("totalEstimatedMinutes")
        .and_then(minutes)
        .ok_or(GatewayError::MissingFields("totalEstimatedMinutes"))?;

    let sub_tasks = items
        .iter()
        .map(|item| {
            let title = item
                .get("title")
                .and_then(Value::as_str)
                .ok_or(GatewayError::MissingFields("subTasks.title"))?;
            let estimate = item
                .get("estimatedMinutes")
                .and_then(minutes)
                .ok_or(GatewayError::MissingFields("subTasks.estimatedMinutes"))?;
            Ok(GeneratedSubTask::new(title, estimate))
        })
        .collect::<Result<Vec<_>, GatewayError>>()?;

    let suggested_priority = value
        .get("suggestedPriority")
        .and_then(Value::as_str)
        .and_then(Priority::from_label)
        .unwrap_or_else(|| determine_priority(title, description));

    Ok(TaskBreakdown {
        sub_tasks,
        total_estimated_minutes: total,
        suggested_priority,
    })
}

impl AiGateway {
    /// Break a task into subtasks. Never fails: any problem with the
    /// endpoint yields [`fallback_breakdown`].
    #[instrument(skip_all, fields(title = %title))]
    pub async fn generate_task_breakdown(&self, title: &str, description: &str) -> TaskBreakdown {
        match self.request_breakdown(title, description).await {
            Ok(breakdown) => {
                info!(sub_tasks = breakdown.sub_tasks.len(), "AI breakdown received");
                breakdown
            }
            Err(e) => {
                warn!(error = %e, "AI breakdown unavailable, using fallback");
                fallback_breakdown(title, description)
            }
        }
    }

    async fn request_breakdown(&self, title: &str, description: &str) -> Result<TaskBreakdown, GatewayError> {
        let messages = [
            ChatMessage::system(BREAKDOWN_SYSTEM_PROMPT),
            ChatMessage::user(breakdown_prompt(title, description)),
        ];
        let completion = self
            .client
            .complete(&messages, self.options.breakdown_timeout)
            .await?;
        let value = extract_object(&completion)?;
        parse_breakdown(&value, title, description)
    }
}
