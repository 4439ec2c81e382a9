use crate::domain::{
    DailyStats, GeneratedSubTask, PomodoroSettings, Priority, SubTask, SubTaskDraft,
    SubTaskUpdate, Task, TaskBreakdown, TaskDraft, TaskUpdate,
};
use crate::persistence::{load_state, save_state, KeyValueStore};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything the store owns; persisted as one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub daily_stats: Vec<DailyStats>,
    #[serde(default)]
    pub pomodoro_settings: PomodoroSettings,
}

/// Called after every successful mutation
pub type ChangeListener = Box<dyn Fn(&StoreState)>;

/// Single owner of tasks, daily statistics and Pomodoro settings.
///
/// Each mutation completes, then the whole state is written through the
/// key-value store and every listener is called. Unknown ids are a silent
/// no-op: nothing is persisted and nobody is notified.
pub struct TaskStore {
    state: StoreState,
    kv: Option<Box<dyn KeyValueStore>>,
    listeners: Vec<ChangeListener>,
}

impl TaskStore {
    /// Open the store backed by `kv`, loading any previously persisted state
    pub fn open(kv: Box<dyn KeyValueStore>) -> Result<Self> {
        let state = match load_state(kv.as_ref())? {
            Some(state) => {
                info!(
                    tasks = state.tasks.len(),
                    daily_stats = state.daily_stats.len(),
                    "Loaded task store"
                );
                state
            }
            None => {
                info!("No persisted task store, starting empty");
                StoreState::default()
            }
        };

        Ok(Self {
            state,
            kv: Some(kv),
            listeners: Vec::new(),
        })
    }

    /// A store that never persists
    pub fn in_memory() -> Self {
        Self::from_state(StoreState::default())
    }

    /// An unpersisted store seeded with `state`
    pub fn from_state(state: StoreState) -> Self {
        Self {
            state,
            kv: None,
            listeners: Vec::new(),
        }
    }

    /// Register a callback invoked with the new state after each mutation
    pub fn subscribe(&mut self, listener: impl Fn(&StoreState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.state.tasks.iter().find(|t| t.id == id)
    }

    pub fn daily_stats(&self) -> &[DailyStats] {
        &self.state.daily_stats
    }

    pub fn pomodoro_settings(&self) -> PomodoroSettings {
        self.state.pomodoro_settings
    }

    pub fn is_empty(&self) -> bool {
        self.state.tasks.is_empty()
    }

    /// Tasks whose id starts with `prefix` (ids as shown in listings)
    pub fn tasks_matching_prefix(&self, prefix: &str) -> Vec<&Task> {
        let prefix = prefix.trim().to_lowercase();
        self.state
            .tasks
            .iter()
            .filter(|t| t.id.to_string().starts_with(&prefix))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Tasks
    // ---------------------------------------------------------------------

    /// Append a new task built from `draft`; returns its id
    pub fn add_task(&mut self, draft: TaskDraft) -> Uuid {
        let order = self.state.tasks.len() as u32 + 1;
        let task = Task::from_draft(draft, order);
        let id = task.id;
        debug!(task_id = %id, title = %task.title, "Adding task");

        self.state.tasks.push(task);
        self.commit();
        id
    }

    pub fn complete_task(&mut self, id: Uuid, completed: bool) -> bool {
        self.with_task(id, |task| task.completed = completed)
    }

    /// Remove a task together with its subtasks
    pub fn delete_task(&mut self, id: Uuid) -> bool {
        let before = self.state.tasks.len();
        self.state.tasks.retain(|t| t.id != id);
        if self.state.tasks.len() == before {
            return false;
        }
        debug!(task_id = %id, "Deleted task");
        self.commit();
        true
    }

    /// Shallow-merge `update` into the task. Values are not validated.
    pub fn update_task(&mut self, id: Uuid, update: TaskUpdate) -> bool {
        self.with_task(id, |task| update.apply_to(task))
    }

    pub fn assign_priority(&mut self, id: Uuid, priority: Priority) -> bool {
        self.with_task(id, |task| task.priority = priority)
    }

    /// Reorder the whole collection: priority weight descending, incomplete
    /// before completed, newest first. The sort is stable, so re-applying it
    /// leaves the order unchanged.
    pub fn auto_assign_priorities(&mut self) {
        self.state.tasks.sort_by(|a, b| {
            b.priority
                .weight()
                .cmp(&a.priority.weight())
                .then(a.completed.cmp(&b.completed))
                .then(b.created_at.cmp(&a.created_at))
        });
        debug!(tasks = self.state.tasks.len(), "Reordered tasks by priority");
        self.commit();
    }

    /// Remove every task and daily stats entry; settings are kept
    pub fn clear_all(&mut self) {
        self.state.tasks.clear();
        self.state.daily_stats.clear();
        info!("Cleared all tasks and statistics");
        self.commit();
    }

    // ---------------------------------------------------------------------
    // Subtasks
    // ---------------------------------------------------------------------

    /// Append a subtask; returns its id, or None when the task is absent
    pub fn add_sub_task(&mut self, task_id: Uuid, draft: SubTaskDraft) -> Option<Uuid> {
        let sub_task = SubTask::from_draft(draft);
        let sub_task_id = sub_task.id;
        self.with_task(task_id, |task| task.sub_tasks.push(sub_task))
            .then_some(sub_task_id)
    }

    pub fn complete_sub_task(&mut self, task_id: Uuid, sub_task_id: Uuid, completed: bool) -> bool {
        self.with_sub_task(task_id, sub_task_id, |st| st.completed = completed)
    }

    pub fn update_sub_task(&mut self, task_id: Uuid, sub_task_id: Uuid, update: SubTaskUpdate) -> bool {
        self.with_sub_task(task_id, sub_task_id, |st| update.apply_to(st))
    }

    pub fn delete_sub_task(&mut self, task_id: Uuid, sub_task_id: Uuid) -> bool {
        let Some(task) = self.task_mut(task_id) else {
            return false;
        };
        let before = task.sub_tasks.len();
        task.sub_tasks.retain(|st| st.id != sub_task_id);
        if task.sub_tasks.len() == before {
            return false;
        }
        self.commit();
        true
    }

    pub fn delete_all_sub_tasks(&mut self, task_id: Uuid) -> bool {
        self.with_task(task_id, |task| task.sub_tasks.clear())
    }

    /// Append a generated batch; all of it lands or, for an absent task, none
    pub fn add_ai_generated_sub_tasks(&mut self, task_id: Uuid, sub_tasks: &[GeneratedSubTask]) -> bool {
        let batch: Vec<SubTask> = sub_tasks
            .iter()
            .map(|st| SubTask::new(st.title.clone(), st.estimated_minutes))
            .collect();
        debug!(task_id = %task_id, count = batch.len(), "Appending generated subtasks");
        self.with_task(task_id, |task| task.sub_tasks.extend(batch))
    }

    /// Record a breakdown on a task: its total becomes the task estimate,
    /// the task is flagged AI-generated, and the subtasks are appended.
    pub fn apply_breakdown(&mut self, task_id: Uuid, breakdown: &TaskBreakdown) -> bool {
        let batch: Vec<SubTask> = breakdown
            .sub_tasks
            .iter()
            .map(|st| SubTask::new(st.title.clone(), st.estimated_minutes))
            .collect();
        let total = breakdown.total_estimated_minutes;
        self.with_task(task_id, |task| {
            task.estimated_minutes = total;
            task.ai_generated = true;
            task.sub_tasks.extend(batch);
        })
    }

    // ---------------------------------------------------------------------
    // Stats and settings
    // ---------------------------------------------------------------------

    /// Insert the stats for a date, replacing an existing entry for that date in place
    pub fn add_daily_stats(&mut self, stats: DailyStats) {
        match self.state.daily_stats.iter_mut().find(|s| s.date == stats.date) {
            Some(existing) => {
                debug!(date = %stats.date, "Replacing daily stats");
                *existing = stats;
            }
            None => {
                debug!(date = %stats.date, "Adding daily stats");
                self.state.daily_stats.push(stats);
            }
        }
        self.commit();
    }

    pub fn update_pomodoro_settings(&mut self, settings: PomodoroSettings) {
        self.state.pomodoro_settings = settings;
        self.commit();
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.state.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Apply `f` to the task and commit; false (and no commit) when absent
    fn with_task(&mut self, id: Uuid, f: impl FnOnce(&mut Task)) -> bool {
        match self.task_mut(id) {
            Some(task) => {
                f(task);
                self.commit();
                true
            }
            None => false,
        }
    }

    fn with_sub_task(&mut self, task_id: Uuid, sub_task_id: Uuid, f: impl FnOnce(&mut SubTask)) -> bool {
        let Some(sub_task) = self
            .task_mut(task_id)
            .and_then(|task| task.sub_task_mut(sub_task_id))
        else {
            return false;
        };
        f(sub_task);
        self.commit();
        true
    }

    /// Persist (fire-and-forget) and notify listeners
    fn commit(&self) {
        if let Some(kv) = &self.kv {
            if let Err(e) = save_state(kv.as_ref(), &self.state) {
                warn!(error = %e, "Failed to persist task store");
            }
        }
        for listener in &self.listeners {
            listener(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryKeyValueStore, STORE_KEY};
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn draft(title: &str, priority: Priority) -> TaskDraft {
        TaskDraft {
            title: Some(title.to_string()),
            priority: Some(priority),
            ..TaskDraft::default()
        }
    }

    fn titles(store: &TaskStore) -> Vec<String> {
        store.tasks().iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_add_task_fills_defaults() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("X"));

        let task = store.task(id).unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.title, "X");
        assert_eq!(task.description, "");
        assert_eq!(task.estimated_minutes, 30);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert!(task.sub_tasks.is_empty());
        assert!(!task.ai_generated);
        assert_eq!(task.order, 1);
    }

    #[test]
    fn test_add_task_assigns_increasing_order() {
        let mut store = TaskStore::in_memory();
        store.add_task(TaskDraft::titled("a"));
        store.add_task(TaskDraft::titled("b"));
        let id = store.add_task(TaskDraft::default());

        assert_eq!(store.task(id).unwrap().order, 3);
        assert_eq!(store.task(id).unwrap().title, "");
    }

    #[test]
    fn test_complete_and_delete_task() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("Finish"));

        assert!(store.complete_task(id, true));
        assert!(store.task(id).unwrap().completed);

        assert!(store.delete_task(id));
        assert!(store.task(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_absent_ids_are_silent_no_ops() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("Keep"));
        let sub_id = store.add_sub_task(id, SubTaskDraft::new("step", 10)).unwrap();
        let before = store.state().clone();
        let missing = Uuid::new_v4();

        assert!(!store.complete_task(missing, true));
        assert!(!store.delete_task(missing));
        assert!(!store.update_task(missing, TaskUpdate::default()));
        assert!(!store.assign_priority(missing, Priority::High));
        assert!(store.add_sub_task(missing, SubTaskDraft::default()).is_none());
        assert!(!store.complete_sub_task(missing, sub_id, true));
        assert!(!store.complete_sub_task(id, missing, true));
        assert!(!store.update_sub_task(id, missing, SubTaskUpdate::default()));
        assert!(!store.delete_sub_task(id, missing));
        assert!(!store.delete_all_sub_tasks(missing));
        assert!(!store.add_ai_generated_sub_tasks(missing, &[GeneratedSubTask::new("x", 5)]));

        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_update_task_merges_without_validation() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft {
            title: Some("Draft".to_string()),
            category: Some("Work".to_string()),
            ..TaskDraft::default()
        });

        store.update_task(
            id,
            TaskUpdate {
                title: Some("Final".to_string()),
                estimated_minutes: Some(0),
                ..TaskUpdate::default()
            },
        );

        let task = store.task(id).unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.estimated_minutes, 0);
        assert_eq!(task.category.as_deref(), Some("Work"));
    }

    #[test]
    fn test_sub_task_lifecycle() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("Parent"));
        let first = store.add_sub_task(id, SubTaskDraft::new("one", 20)).unwrap();
        let second = store.add_sub_task(id, SubTaskDraft::default()).unwrap();

        let task = store.task(id).unwrap();
        assert_eq!(task.sub_tasks.len(), 2);
        assert_eq!(task.sub_tasks[1].estimated_minutes, 15);

        assert!(store.complete_sub_task(id, first, true));
        assert!(store.update_sub_task(
            id,
            second,
            SubTaskUpdate {
                title: Some("two".to_string()),
                actual_minutes: Some(Some(7)),
                ..SubTaskUpdate::default()
            }
        ));
        let task = store.task(id).unwrap();
        assert!(task.sub_task(first).unwrap().completed);
        assert_eq!(task.sub_task(second).unwrap().title, "two");
        assert_eq!(task.sub_task(second).unwrap().actual_minutes, Some(7));

        assert!(store.delete_sub_task(id, first));
        assert_eq!(store.task(id).unwrap().sub_tasks.len(), 1);
    }

    #[test]
    fn test_delete_all_then_add_yields_fresh_id() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("Parent"));
        let old_ids: Vec<Uuid> = (0..3)
            .filter_map(|i| store.add_sub_task(id, SubTaskDraft::new(format!("st {}", i), 5)))
            .collect();

        assert!(store.delete_all_sub_tasks(id));
        let new_id = store.add_sub_task(id, SubTaskDraft::new("again", 5)).unwrap();

        let task = store.task(id).unwrap();
        assert_eq!(task.sub_tasks.len(), 1);
        assert_eq!(task.sub_tasks[0].id, new_id);
        assert!(!old_ids.contains(&new_id));
    }

    #[test]
    fn test_add_ai_generated_sub_tasks_appends_batch() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("Parent"));
        store.add_sub_task(id, SubTaskDraft::new("existing", 10));

        let batch = vec![
            GeneratedSubTask::new("Plan and organize", 15),
            GeneratedSubTask::new("Execute main task", 15),
        ];
        assert!(store.add_ai_generated_sub_tasks(id, &batch));

        let task = store.task(id).unwrap();
        let sub_titles: Vec<&str> = task.sub_tasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(sub_titles, vec!["existing", "Plan and organize", "Execute main task"]);
        assert!(task.sub_tasks.iter().all(|s| !s.completed));
        assert_ne!(task.sub_tasks[1].id, task.sub_tasks[2].id);
    }

    #[test]
    fn test_apply_breakdown() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("Big job"));
        let breakdown = TaskBreakdown {
            sub_tasks: vec![GeneratedSubTask::new("a", 20), GeneratedSubTask::new("b", 25)],
            total_estimated_minutes: 45,
            suggested_priority: Priority::High,
        };

        assert!(store.apply_breakdown(id, &breakdown));
        let task = store.task(id).unwrap();
        assert_eq!(task.estimated_minutes, 45);
        assert!(task.ai_generated);
        assert_eq!(task.sub_tasks.len(), 2);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_auto_assign_priorities_order() {
        let mut store = TaskStore::in_memory();
        let low = store.add_task(draft("low", Priority::Low));
        let high_done = store.add_task(draft("high done", Priority::High));
        let high_old = store.add_task(draft("high old", Priority::High));
        let high_new = store.add_task(draft("high new", Priority::High));
        store.add_task(draft("optional", Priority::Optional));
        store.add_task(draft("medium", Priority::Medium));
        store.complete_task(high_done, true);

        // Make creation times distinct and ordered
        let base = chrono::Local::now();
        for (id, offset) in [(low, 5), (high_done, 4), (high_old, 3), (high_new, 1)] {
            if let Some(task) = store.state.tasks.iter_mut().find(|t| t.id == id) {
                task.created_at = base - Duration::minutes(offset);
            }
        }

        store.auto_assign_priorities();

        assert_eq!(
            titles(&store),
            vec!["high new", "high old", "high done", "medium", "low", "optional"]
        );
    }

    #[test]
    fn test_auto_assign_priorities_is_idempotent() {
        let mut store = TaskStore::in_memory();
        for (i, priority) in [Priority::Low, Priority::High, Priority::Medium, Priority::High]
            .into_iter()
            .enumerate()
        {
            let id = store.add_task(draft(&format!("t{}", i), priority));
            if i % 2 == 0 {
                store.complete_task(id, true);
            }
        }

        store.auto_assign_priorities();
        let once = titles(&store);
        store.auto_assign_priorities();
        assert_eq!(titles(&store), once);
    }

    #[test]
    fn test_add_daily_stats_upserts_by_date() {
        let mut store = TaskStore::in_memory();
        let date = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let other = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();

        let mut first = DailyStats::new(date);
        first.productivity_score = 40;
        store.add_daily_stats(first);
        store.add_daily_stats(DailyStats::new(other));

        let mut replacement = DailyStats::new(date);
        replacement.productivity_score = 90;
        store.add_daily_stats(replacement);

        assert_eq!(store.daily_stats().len(), 2);
        assert_eq!(store.daily_stats()[0].date, date);
        assert_eq!(store.daily_stats()[0].productivity_score, 90);
    }

    #[test]
    fn test_update_pomodoro_settings_replaces() {
        let mut store = TaskStore::in_memory();
        let settings = PomodoroSettings::with_fallbacks(45, 10, 20, 3);
        store.update_pomodoro_settings(settings);
        assert_eq!(store.pomodoro_settings(), settings);
    }

    #[test]
    fn test_clear_all_keeps_settings() {
        let mut store = TaskStore::in_memory();
        store.add_task(TaskDraft::titled("gone"));
        store.add_daily_stats(DailyStats::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        let settings = PomodoroSettings::with_fallbacks(30, 5, 15, 4);
        store.update_pomodoro_settings(settings);

        store.clear_all();

        assert!(store.is_empty());
        assert!(store.daily_stats().is_empty());
        assert_eq!(store.pomodoro_settings(), settings);
    }

    #[test]
    fn test_persists_after_each_mutation() {
        let kv = MemoryKeyValueStore::new();
        let mut store = TaskStore::open(Box::new(kv.clone())).unwrap();
        assert!(kv.get(STORE_KEY).unwrap().is_none());

        let id = store.add_task(TaskDraft::titled("Saved"));
        store.add_sub_task(id, SubTaskDraft::new("child", 5));

        let reopened = TaskStore::open(Box::new(kv)).unwrap();
        assert_eq!(reopened.state(), store.state());
        assert_eq!(reopened.task(id).unwrap().sub_tasks.len(), 1);
    }

    #[test]
    fn test_no_op_does_not_persist() {
        let kv = MemoryKeyValueStore::new();
        let mut store = TaskStore::open(Box::new(kv.clone())).unwrap();

        store.complete_task(Uuid::new_v4(), true);

        assert!(kv.get(STORE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_listeners_notified_on_change_only() {
        let mut store = TaskStore::in_memory();
        let calls = Rc::new(Cell::new(0));
        let seen_tasks = Rc::new(Cell::new(0));
        {
            let calls = Rc::clone(&calls);
            let seen_tasks = Rc::clone(&seen_tasks);
            store.subscribe(move |state| {
                calls.set(calls.get() + 1);
                seen_tasks.set(state.tasks.len());
            });
        }

        let id = store.add_task(TaskDraft::titled("one"));
        store.complete_task(id, true);
        store.delete_task(Uuid::new_v4());

        assert_eq!(calls.get(), 2);
        assert_eq!(seen_tasks.get(), 1);
    }

    #[test]
    fn test_tasks_matching_prefix() {
        let mut store = TaskStore::in_memory();
        let id = store.add_task(TaskDraft::titled("find me"));
        store.add_task(TaskDraft::titled("other"));

        let prefix = &id.to_string()[..8];
        let matches = store.tasks_matching_prefix(prefix);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, id);
        assert_eq!(store.tasks_matching_prefix(&prefix.to_uppercase()).len(), 1);
    }
}
