use super::client::ChatMessage;
use super::AiGateway;
use std::collections::BTreeMap;
use tracing::{instrument, warn};

pub const INSIGHTS_SYSTEM_PROMPT: &str =
    "You are a productivity coach providing brief, actionable insights.";

fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

pub fn insights_prompt(
    completed: usize,
    total: usize,
    score: u8,
    time_by_category: &BTreeMap<String, u32>,
) -> String {
    let categories = if time_by_category.is_empty() {
        "No category data available".to_string()
    } else {
        time_by_category
            .iter()
            .map(|(category, minutes)| format!("{}: {} minutes", category, minutes))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "I'm looking for productivity insights based on my recent activity. Here's my data:\n\
         - Completed {completed} out of {total} tasks ({rate:.1}% completion rate)\n\
         - Productivity score: {score}%\n\
         - Time spent by category: {categories}\n\n\
         Please provide a concise analysis (2-3 sentences) of my productivity and one actionable suggestion to improve it.",
        rate = completion_rate(completed, total),
    )
}

/// Canned insight keyed on the completion rate
pub fn default_insights(completed: usize, total: usize) -> &'static str {
    if total == 0 {
        return "Add tasks to get personalized productivity insights.";
    }

    let rate = completion_rate(completed, total);
    if rate >= 80.0 {
        "Great job completing most of your tasks! Consider challenging yourself with more complex tasks to further develop your skills."
    } else if rate >= 50.0 {
        "You're making good progress. Try breaking down your remaining tasks into smaller, more manageable subtasks to increase completion rate."
    } else {
        "Your task completion rate is lower than ideal. Focus on prioritizing essential tasks and consider using the Pomodoro technique to improve focus."
    }
}

impl AiGateway {
    /// Short coaching text for the given activity. Falls back to
    /// [`default_insights`] on any endpoint failure.
    #[instrument(skip(self, time_by_category))]
    pub async fn productivity_insights(
        &self,
        completed: usize,
        total: usize,
        score: u8,
        time_by_category: &BTreeMap<String, u32>,
    ) -> String {
        let messages = [
            ChatMessage::system(INSIGHTS_SYSTEM_PROMPT),
            ChatMessage::user(insights_prompt(completed, total, score, time_by_category)),
        ];

        match self
            .client
            .complete(&messages, self.options.insights_timeout)
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "AI insights unavailable, using default");
                default_insights(completed, total).to_string()
            }
        }
    }
}
