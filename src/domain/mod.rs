pub mod enums;
pub mod stats;
pub mod task;
pub mod views;

pub use enums::{Priority, Stage, TaskFilter};
pub use stats::{DailyStats, PomodoroSettings};
pub use task::{
    GeneratedSubTask, SubTask, SubTaskDraft, SubTaskUpdate, Task, TaskBreakdown, TaskDraft,
    TaskUpdate, DEFAULT_SUBTASK_MINUTES, DEFAULT_TASK_MINUTES, MAX_MINUTES,
};
pub use views::{
    active_newest_first, compute_totals, filter_tasks, high_priority_focus, status_badge,
    tasks_for_date,
};
