use super::enums::Priority;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default estimate for a new task, in minutes
pub const DEFAULT_TASK_MINUTES: u32 = 30;
/// Default estimate for a new subtask, in minutes
pub const DEFAULT_SUBTASK_MINUTES: u32 = 15;
/// Largest minute value accepted from user or model input: one day
pub const MAX_MINUTES: u32 = 24 * 60;

/// A child work item of a task; the unit a Pomodoro session targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub estimated_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<u32>,
}

impl SubTask {
    pub fn new(title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
            estimated_minutes,
            actual_minutes: None,
        }
    }

    /// Build from a draft, filling the subtask defaults
    pub fn from_draft(draft: SubTaskDraft) -> Self {
        let estimate = draft
            .estimated_minutes
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_SUBTASK_MINUTES);
        Self::new(draft.title.unwrap_or_default(), estimate)
    }
}

/// A top-level unit of work with optional subtasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Local>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub estimated_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<u32>,
    /// Subtasks in display and session order
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub order: u32,
}

impl Task {
    /// Create a task from a draft. `order` is assigned by the store.
    pub fn from_draft(draft: TaskDraft, order: u32) -> Self {
        let estimated_minutes = draft
            .estimated_minutes
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_TASK_MINUTES);

        Self {
            id: Uuid::new_v4(),
            title: draft.title.unwrap_or_default(),
            description: draft.description.unwrap_or_default(),
            created_at: Local::now(),
            due_date: draft.due_date,
            completed: false,
            category: draft.category,
            estimated_minutes,
            actual_minutes: None,
            sub_tasks: Vec::new(),
            ai_generated: draft.ai_generated,
            priority: draft.priority.unwrap_or_default(),
            order,
        }
    }

    pub fn sub_task(&self, sub_task_id: Uuid) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|st| st.id == sub_task_id)
    }

    pub fn sub_task_mut(&mut self, sub_task_id: Uuid) -> Option<&mut SubTask> {
        self.sub_tasks.iter_mut().find(|st| st.id == sub_task_id)
    }

    pub fn completed_sub_task_count(&self) -> usize {
        self.sub_tasks.iter().filter(|st| st.completed).count()
    }

    /// Sum of subtask estimates in minutes
    pub fn sub_task_total_estimate(&self) -> u32 {
        self.sub_tasks
            .iter()
            .map(|st| st.estimated_minutes)
            .fold(0, u32::saturating_add)
    }

    /// Sum of recorded subtask minutes
    pub fn sub_task_total_actual(&self) -> u32 {
        self.sub_tasks
            .iter()
            .filter_map(|st| st.actual_minutes)
            .fold(0, u32::saturating_add)
    }
}

/// Fields for creating a task. Absent fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub estimated_minutes: Option<u32>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Local>>,
    pub ai_generated: bool,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Shallow merge into a task. Every field: absent = unchanged.
///
/// Nullable task fields take `Some(None)` to clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<DateTime<Local>>>,
    pub completed: Option<bool>,
    pub category: Option<Option<String>>,
    pub estimated_minutes: Option<u32>,
    pub actual_minutes: Option<Option<u32>>,
    pub ai_generated: Option<bool>,
    pub priority: Option<Priority>,
}

impl TaskUpdate {
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(minutes) = self.estimated_minutes {
            task.estimated_minutes = minutes;
        }
        if let Some(actual) = self.actual_minutes {
            task.actual_minutes = actual;
        }
        if let Some(ai_generated) = self.ai_generated {
            task.ai_generated = ai_generated;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

/// Fields for creating a subtask
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTaskDraft {
    pub title: Option<String>,
    pub estimated_minutes: Option<u32>,
}

impl SubTaskDraft {
    pub fn new(title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            title: Some(title.into()),
            estimated_minutes: Some(estimated_minutes),
        }
    }
}

/// Shallow merge into a subtask. Every field: absent = unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubTaskUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub estimated_minutes: Option<u32>,
    pub actual_minutes: Option<Option<u32>>,
}

impl SubTaskUpdate {
    pub fn apply_to(self, sub_task: &mut SubTask) {
        if let Some(title) = self.title {
            sub_task.title = title;
        }
        if let Some(completed) = self.completed {
            sub_task.completed = completed;
        }
        if let Some(minutes) = self.estimated_minutes {
            sub_task.estimated_minutes = minutes;
        }
        if let Some(actual) = self.actual_minutes {
            sub_task.actual_minutes = actual;
        }
    }
}

/// A subtask proposed by the AI breakdown (or its fallback)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSubTask {
    pub title: String,
    pub estimated_minutes: u32,
}

impl GeneratedSubTask {
    pub fn new(title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            title: title.into(),
            estimated_minutes,
        }
    }
}

/// Structured result of breaking a task into subtasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBreakdown {
    pub sub_tasks: Vec<GeneratedSubTask>,
    pub total_estimated_minutes: u32,
    pub suggested_priority: Priority,
}
