use crate::domain::{tasks_for_date, DailyStats, Task};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};
use std::collections::BTreeMap;

/// Weighting of completion ratio against time efficiency
const COMPLETION_WEIGHT: f64 = 0.7;
const EFFICIENCY_WEIGHT: f64 = 0.3;
/// Efficiency ratio stops rewarding beyond finishing in half the estimate
const MAX_EFFICIENCY_RATIO: f64 = 2.0;

/// Percent complete, 0-100.
///
/// A task without subtasks is all or nothing; otherwise the share of
/// completed subtasks, rounded.
pub fn task_progress(task: &Task) -> u8 {
    if task.sub_tasks.is_empty() {
        return if task.completed { 100 } else { 0 };
    }
    let done = task.completed_sub_task_count() as f64;
    let total = task.sub_tasks.len() as f64;
    (100.0 * done / total).round() as u8
}

/// Blend of completion ratio (70%) and time efficiency (30%), 0-100
pub fn productivity_score(completed: u32, total: u32, time_spent_min: u32, estimated_min: u32) -> u8 {
    if total == 0 || estimated_min == 0 {
        return 0;
    }

    let completion = completed as f64 / total as f64;
    let efficiency = (estimated_min as f64 / time_spent_min.max(1) as f64).min(MAX_EFFICIENCY_RATIO);
    let score = 100.0 * (COMPLETION_WEIGHT * completion + EFFICIENCY_WEIGHT * efficiency / MAX_EFFICIENCY_RATIO);

    score.round().clamp(0.0, 100.0) as u8
}

/// Productivity score per day of a Monday-start week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyStats {
    pub dates: Vec<NaiveDate>,
    /// Short weekday names, Mon..Sun
    pub labels: Vec<String>,
    pub data: Vec<u8>,
}

impl WeeklyStats {
    pub fn average(&self) -> u8 {
        if self.data.is_empty() {
            return 0;
        }
        let sum: u32 = self.data.iter().map(|v| *v as u32).sum();
        (sum as f64 / self.data.len() as f64).round() as u8
    }
}

/// The seven dates of the Monday-start week containing `day`
pub fn week_dates(day: NaiveDate) -> Vec<NaiveDate> {
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (0..7).map(|offset| monday + Duration::days(offset)).collect()
}

/// Scores for the week containing `today`; 0 for days without an entry
pub fn weekly_stats(daily_stats: &[DailyStats], today: NaiveDate) -> WeeklyStats {
    let dates = week_dates(today);
    let labels = dates.iter().map(|d| d.format("%a").to_string()).collect();
    let data = dates
        .iter()
        .map(|date| {
            daily_stats
                .iter()
                .find(|s| s.date == *date)
                .map(|s| s.productivity_score)
                .unwrap_or(0)
        })
        .collect();

    WeeklyStats { dates, labels, data }
}

/// Actual minutes per category for tasks created within `[start, end]`
pub fn time_by_category(tasks: &[Task], start: DateTime<Local>, end: DateTime<Local>) -> BTreeMap<String, u32> {
    let mut result = BTreeMap::new();
    for task in tasks {
        if task.created_at < start || task.created_at > end {
            continue;
        }
        if let Some(category) = &task.category {
            let minutes = result.entry(category.clone()).or_insert(0u32);
            *minutes = minutes.saturating_add(task.actual_minutes.unwrap_or(0));
        }
    }
    result
}

/// Heuristic estimate in minutes from the wording of a task
pub fn estimate_task_time(title: &str, description: &str) -> u32 {
    let title_lower = title.to_lowercase();
    let description_lower = description.to_lowercase();
    let mentions = |word: &str| title_lower.contains(word) || description_lower.contains(word);

    let mut minutes = 30;
    if mentions("research") {
        minutes += 60;
    }
    if mentions("meeting") {
        minutes += 30;
    }

    let words = title.split_whitespace().count() + description.split_whitespace().count();
    minutes + (words as u32 / 10) * 5
}

/// Daily statistics computed from the tasks scheduled on `date`
pub fn summarize_day(tasks: &[Task], date: NaiveDate) -> DailyStats {
    let day_tasks = tasks_for_date(tasks, date);
    let completed = day_tasks.iter().filter(|t| t.completed).count() as u32;
    let time_spent = day_tasks
        .iter()
        .filter_map(|t| t.actual_minutes)
        .fold(0u32, u32::saturating_add);
    let estimated = day_tasks
        .iter()
        .map(|t| t.estimated_minutes)
        .fold(0u32, u32::saturating_add);

    let mut time_by_category = BTreeMap::new();
    for task in &day_tasks {
        if let Some(category) = &task.category {
            let minutes = time_by_category.entry(category.clone()).or_insert(0u32);
            *minutes = minutes.saturating_add(task.actual_minutes.unwrap_or(0));
        }
    }

    DailyStats {
        date,
        total_tasks_completed: completed,
        total_time_spent: time_spent,
        productivity_score: productivity_score(completed, day_tasks.len() as u32, time_spent, estimated),
        time_by_category,
    }
}

/// "45m", "1h 30m"
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {}m", hours, mins)
    }
}
