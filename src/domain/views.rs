use super::enums::{Priority, TaskFilter};
use super::task::Task;
use chrono::NaiveDate;

/// Filter the task list the way the list screen tabs do
pub fn filter_tasks(tasks: &[Task], filter: TaskFilter) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| match filter {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        })
        .collect()
}

/// Tasks shown on a calendar day: due date if set, otherwise creation date
pub fn tasks_for_date(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.due_date.unwrap_or(task.created_at).date_naive() == date)
        .collect()
}

/// First `limit` incomplete high-priority tasks, in store order
pub fn high_priority_focus(tasks: &[Task], limit: usize) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.priority == Priority::High && !task.completed)
        .take(limit)
        .collect()
}

/// Incomplete tasks, newest first (timer screen task picker)
pub fn active_newest_first(tasks: &[Task]) -> Vec<&Task> {
    let mut active: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    active
}

/// Compute total estimated and actual minutes for a set of tasks.
/// A task with subtasks counts its subtasks instead of itself.
pub fn compute_totals(tasks: &[Task]) -> (u32, u32) {
    let mut total_estimate: u32 = 0;
    let mut total_actual: u32 = 0;

    for task in tasks {
        let (estimate, actual) = if task.sub_tasks.is_empty() {
            (task.estimated_minutes, task.actual_minutes.unwrap_or(0))
        } else {
            (task.sub_task_total_estimate(), task.sub_task_total_actual())
        };
        total_estimate = total_estimate.saturating_add(estimate);
        total_actual = total_actual.saturating_add(actual);
    }

    (total_estimate, total_actual)
}

/// Status badge for list output
pub fn status_badge(task: &Task) -> &'static str {
    if task.completed {
        "[x]"
    } else if task.completed_sub_task_count() > 0 {
        "[~]"
    } else {
        "[ ]"
    }
}
