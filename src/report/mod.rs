pub mod generator;
pub mod metrics;
pub mod stats;

pub use generator::{default_report_path, generate_report, render_report};
pub use metrics::{
    estimate_task_time, format_minutes, productivity_score, summarize_day, task_progress,
    time_by_category, week_dates, weekly_stats, WeeklyStats,
};
