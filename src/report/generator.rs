use crate::domain::{tasks_for_date, Priority, Task};
use crate::persistence::{atomic_write, ensure_dir};
use crate::report::metrics::{format_minutes, task_progress, weekly_stats};
use crate::report::stats::{calculate_category_stats, calculate_estimation_stats, calculate_global_stats};
use crate::store::StoreState;
use anyhow::Result;
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Format percentage with 1 decimal place
fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn ratio_percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn category_suffix(task: &Task) -> String {
    task.category
        .as_ref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default()
}

/// Render the markdown analytics report for `date`
pub fn render_report(state: &StoreState, date: NaiveDate) -> String {
    let tasks = &state.tasks;
    let global = calculate_global_stats(tasks);
    let estimation = calculate_estimation_stats(tasks);
    let categories = calculate_category_stats(tasks);
    let weekly = weekly_stats(&state.daily_stats, date);
    let day_stats = state.daily_stats.iter().find(|s| s.date == date);

    let mut report = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(report, "# Productivity Report - {}\n", date);

    report.push_str("## Summary\n\n");
    let _ = writeln!(
        report,
        "- **Total Tasks:** {} (Active: {}, Completed: {}, AI-assisted: {})",
        global.total_tasks, global.active_count, global.completed_count, global.ai_generated_count
    );
    let _ = writeln!(
        report,
        "- **Subtasks:** {}/{} done",
        global.sub_tasks_done, global.sub_task_count
    );
    let _ = writeln!(
        report,
        "- **Time:** {} spent / {} estimated ({})",
        format_minutes(global.total_actual),
        format_minutes(global.total_estimate),
        format_percent(ratio_percent(global.total_actual, global.total_estimate))
    );
    let completion = ratio_percent(global.completed_count as u32, global.total_tasks as u32);
    let _ = writeln!(report, "- **Completion Rate:** {}\n", format_percent(completion));

    report.push_str("## Today\n\n");
    match day_stats {
        Some(stats) => {
            let _ = writeln!(report, "- **Tasks Completed:** {}", stats.total_tasks_completed);
            let _ = writeln!(report, "- **Time Spent:** {}", format_minutes(stats.total_time_spent));
            let _ = writeln!(report, "- **Productivity Score:** {}%\n", stats.productivity_score);
        }
        None => report.push_str("- No statistics recorded\n\n"),
    }

    report.push_str("## Weekly Overview\n\n");
    report.push_str("| Day | Date | Score |\n|-----|------|-------|\n");
    for ((label, day), score) in weekly.labels.iter().zip(&weekly.dates).zip(&weekly.data) {
        let _ = writeln!(report, "| {} | {} | {} |", label, day, score);
    }
    let _ = writeln!(report, "\n- **Weekly Average:** {}\n", weekly.average());

    report.push_str("## Priorities\n\n");
    for priority in Priority::all() {
        let count = global.by_priority.get(priority).copied().unwrap_or(0);
        let _ = writeln!(report, "- **{}:** {}", priority, count);
    }
    report.push('\n');

    report.push_str("## Estimation Accuracy\n\n");
    let _ = writeln!(
        report,
        "- **Tasks Over Estimate:** {} ({} over)",
        estimation.over_estimate_count,
        format_minutes(estimation.over_estimate_minutes)
    );
    let _ = writeln!(
        report,
        "- **Tasks Under Estimate:** {} ({} saved)",
        estimation.under_estimate_count,
        format_minutes(estimation.under_estimate_minutes)
    );
    let _ = writeln!(report, "- **Perfect Estimates:** {}", estimation.perfect_count);
    let _ = writeln!(
        report,
        "- **Average Accuracy:** {}\n",
        format_percent(estimation.avg_accuracy_percent)
    );

    if !categories.is_empty() {
        report.push_str("## Categories\n\n");
        let mut sorted: Vec<_> = categories.iter().collect();
        sorted.sort_by(|a, b| b.1.actual.cmp(&a.1.actual));

        for (name, stats) in sorted {
            let _ = writeln!(report, "### {}\n", name);
            let _ = writeln!(
                report,
                "- **Tasks:** {} (Done: {}, Active: {})",
                stats.task_count, stats.done_count, stats.active_count
            );
            let _ = writeln!(
                report,
                "- **Time:** {} / {} estimated",
                format_minutes(stats.actual),
                format_minutes(stats.estimate)
            );
            let _ = writeln!(
                report,
                "- **Estimation Accuracy:** {}\n",
                format_percent(stats.accuracy_percent)
            );
        }
    }

    let scheduled = tasks_for_date(tasks, date);
    report.push_str("## Scheduled Tasks\n\n");
    if scheduled.is_empty() {
        report.push_str("- Nothing scheduled\n");
    }
    for task in scheduled {
        let mark = if task.completed { "x" } else { " " };
        let _ = writeln!(
            report,
            "- [{}] **{}**{} [{}] {}%",
            mark,
            task.title,
            category_suffix(task),
            task.priority,
            task_progress(task)
        );
        let _ = writeln!(
            report,
            "  - Time: {} / {} estimated",
            format_minutes(task.actual_minutes.unwrap_or(0)),
            format_minutes(task.estimated_minutes)
        );
        for sub_task in &task.sub_tasks {
            let sub_mark = if sub_task.completed { "x" } else { " " };
            let _ = writeln!(
                report,
                "    - [{}] {} ({} / {})",
                sub_mark,
                sub_task.title,
                format_minutes(sub_task.actual_minutes.unwrap_or(0)),
                format_minutes(sub_task.estimated_minutes)
            );
        }
    }

    report
}

/// `report-<date>.md` in the data directory
pub fn default_report_path(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(format!("report-{}.md", date))
}

/// Generate the report for `date` and write it to `output`
pub fn generate_report(state: &StoreState, date: NaiveDate, output: PathBuf) -> Result<PathBuf> {
    let report = render_report(state, date);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    atomic_write(&output, &report)?;
    Ok(output)
}
