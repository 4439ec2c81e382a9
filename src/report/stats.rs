use crate::domain::{compute_totals, Priority, Task};
use std::collections::BTreeMap;

/// Totals across a set of tasks
#[derive(Debug, Default, PartialEq)]
pub struct GlobalStats {
    pub total_tasks: usize,
    pub active_count: usize,
    pub completed_count: usize,
    pub ai_generated_count: usize,
    pub sub_task_count: usize,
    pub sub_tasks_done: usize,
    /// Minutes, counting subtasks in place of their parent
    pub total_estimate: u32,
    pub total_actual: u32,
    pub by_priority: BTreeMap<Priority, usize>,
}

/// Estimate against recorded time for completed work
#[derive(Debug, Default, PartialEq)]
pub struct EstimationStats {
    pub over_estimate_count: usize,
    pub over_estimate_minutes: u32,
    pub under_estimate_count: usize,
    pub under_estimate_minutes: u32,
    pub perfect_count: usize,
    pub avg_accuracy_percent: f64,
}

/// Per-category statistics
#[derive(Debug, Default, PartialEq)]
pub struct CategoryStats {
    pub task_count: usize,
    pub done_count: usize,
    pub active_count: usize,
    pub estimate: u32,
    pub actual: u32,
    pub accuracy_percent: f64,
}

/// 100% for a perfect estimate, falling off in both directions
fn accuracy_percent(actual: u32, estimate: u32) -> f64 {
    if estimate == 0 {
        return 0.0;
    }
    let ratio = actual as f64 / estimate as f64;
    if ratio > 1.0 {
        100.0 / ratio
    } else {
        ratio * 100.0
    }
}

pub fn calculate_global_stats(tasks: &[Task]) -> GlobalStats {
    let (total_estimate, total_actual) = compute_totals(tasks);
    let mut by_priority = BTreeMap::new();
    for task in tasks {
        *by_priority.entry(task.priority).or_insert(0) += 1;
    }

    GlobalStats {
        total_tasks: tasks.len(),
        active_count: tasks.iter().filter(|t| !t.completed).count(),
        completed_count: tasks.iter().filter(|t| t.completed).count(),
        ai_generated_count: tasks.iter().filter(|t| t.ai_generated).count(),
        sub_task_count: tasks.iter().map(|t| t.sub_tasks.len()).sum(),
        sub_tasks_done: tasks.iter().map(|t| t.completed_sub_task_count()).sum(),
        total_estimate,
        total_actual,
        by_priority,
    }
}

/// Accuracy over completed tasks that have recorded time
pub fn calculate_estimation_stats(tasks: &[Task]) -> EstimationStats {
    let mut stats = EstimationStats::default();
    let mut accuracy_sum = 0.0;
    let mut accuracy_count = 0;

    for task in tasks.iter().filter(|t| t.completed) {
        let Some(actual) = task.actual_minutes else {
            continue;
        };
        let estimate = task.estimated_minutes;

        if actual > estimate {
            stats.over_estimate_count += 1;
            stats.over_estimate_minutes = stats.over_estimate_minutes.saturating_add(actual - estimate);
        } else if actual < estimate {
            stats.under_estimate_count += 1;
            stats.under_estimate_minutes = stats.under_estimate_minutes.saturating_add(estimate - actual);
        } else {
            stats.perfect_count += 1;
        }

        if estimate > 0 {
            accuracy_sum += accuracy_percent(actual, estimate);
            accuracy_count += 1;
        }
    }

    if accuracy_count > 0 {
        stats.avg_accuracy_percent = accuracy_sum / accuracy_count as f64;
    }
    stats
}

/// Group tasks by category; uncategorised tasks are skipped
pub fn calculate_category_stats(tasks: &[Task]) -> BTreeMap<String, CategoryStats> {
    let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();

    for task in tasks {
        let Some(category) = &task.category else {
            continue;
        };
        let entry = categories.entry(category.clone()).or_default();
        entry.task_count += 1;
        entry.estimate = entry.estimate.saturating_add(task.estimated_minutes);
        entry.actual = entry.actual.saturating_add(task.actual_minutes.unwrap_or(0));
        if task.completed {
            entry.done_count += 1;
        } else {
            entry.active_count += 1;
        }
    }

    for stats in categories.values_mut() {
        stats.accuracy_percent = accuracy_percent(stats.actual, stats.estimate);
    }
    categories
}
