use crate::domain::{PomodoroSettings, Stage, SubTaskUpdate, MAX_MINUTES};
use crate::store::TaskStore;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("invalid time '{0}': enter a positive whole number of minutes")]
    InvalidMinutes(String),
}

/// One work session targeting a single subtask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroSession {
    pub sub_task_id: Uuid,
    pub title: String,
    pub duration_secs: u32,
    /// Completed by this engine during the current cycle
    pub completed: bool,
}

/// Stage transitions reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    /// A work stage ended; `sub_task` is None when the queue was empty
    WorkCompleted {
        sub_task: Option<String>,
        actual_minutes: Option<u32>,
        next_stage: Stage,
    },
    /// A break ended and the next session is loaded
    BreakCompleted { next_index: usize },
    /// The last break of the queue ended; back at the first session, stopped
    CycleFinished,
}

/// Session engine bound to one task. Each incomplete subtask is a work
/// session; sessions alternate with short or long breaks. The caller drives
/// it with [`PomodoroEngine::tick`] once per elapsed second.
#[derive(Debug, Clone)]
pub struct PomodoroEngine {
    task_id: Uuid,
    settings: PomodoroSettings,
    sessions: Vec<PomodoroSession>,
    index: usize,
    stage: Stage,
    remaining_secs: u32,
    running: bool,
    completed_sessions: u32,
    total_elapsed_secs: u32,
}

impl PomodoroEngine {
    /// Build an engine for `task_id`: first session, work stage, stopped
    pub fn new(store: &TaskStore, task_id: Uuid) -> Self {
        let settings = store.pomodoro_settings();
        let sessions = derive_sessions(store, task_id, &[]);
        let mut engine = Self {
            task_id,
            settings,
            sessions,
            index: 0,
            stage: Stage::Work,
            remaining_secs: 0,
            running: false,
            completed_sessions: 0,
            total_elapsed_secs: 0,
        };
        engine.remaining_secs = engine.first_session_secs();
        engine
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }

    /// Advance by one elapsed second. A stage that reaches zero completes
    /// within the same tick.
    pub fn tick(&mut self, store: &mut TaskStore) -> Option<StageEvent> {
        if !self.running {
            return None;
        }

        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            self.total_elapsed_secs = self.total_elapsed_secs.saturating_add(1);
        }

        if self.remaining_secs == 0 {
            return Some(self.complete_stage(store));
        }
        None
    }

    /// Finish the current work session early, or skip the current break.
    ///
    /// In the work stage with no session queued this does nothing.
    pub fn mark_done(&mut self, store: &mut TaskStore) -> Option<StageEvent> {
        if self.stage == Stage::Work && self.current_session().is_none() {
            return None;
        }
        self.running = false;
        Some(self.complete_stage(store))
    }

    /// End the current break now; None outside a break
    pub fn skip_break(&mut self, store: &TaskStore) -> Option<StageEvent> {
        if !self.stage.is_break() {
            return None;
        }
        Some(self.complete_break(store))
    }

    /// Step back one session, leaving any break: work stage, stopped, full
    /// duration. Refused at the first session.
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.jump_to(self.index - 1);
        true
    }

    /// Step forward one session, leaving any break. Refused at the last session.
    pub fn next(&mut self) -> bool {
        if self.index + 1 >= self.sessions.len() {
            return false;
        }
        self.jump_to(self.index + 1);
        true
    }

    /// Back to the first session with counters zeroed. Completions already
    /// written to the store stay.
    pub fn reset(&mut self, store: &TaskStore) {
        self.settings = store.pomodoro_settings();
        self.sessions = derive_sessions(store, self.task_id, &[]);
        self.index = 0;
        self.stage = Stage::Work;
        self.running = false;
        self.completed_sessions = 0;
        self.total_elapsed_secs = 0;
        self.remaining_secs = self.first_session_secs();
        debug!(task_id = %self.task_id, sessions = self.sessions.len(), "Pomodoro reset");
    }

    /// Override the time remaining in the current stage
    pub fn set_minutes(&mut self, input: &str) -> Result<(), TimerError> {
        let invalid = || TimerError::InvalidMinutes(input.to_string());
        let minutes: u32 = input.trim().parse().map_err(|_| invalid())?;
        if minutes == 0 || minutes > MAX_MINUTES {
            return Err(invalid());
        }
        self.remaining_secs = minutes * 60;
        Ok(())
    }

    /// Re-derive the queue after the task changed outside the engine.
    ///
    /// Sessions this engine completed during the current cycle stay in the
    /// queue. A position that fell out of range is clamped to the last
    /// session, in the work stage, stopped.
    pub fn sync(&mut self, store: &TaskStore) {
        let keep: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|s| s.completed)
            .map(|s| s.sub_task_id)
            .collect();
        self.settings = store.pomodoro_settings();
        self.sessions = derive_sessions(store, self.task_id, &keep);

        if self.index >= self.sessions.len() {
            self.index = self.sessions.len().saturating_sub(1);
            self.stage = Stage::Work;
            self.running = false;
            self.remaining_secs = self
                .sessions
                .get(self.index)
                .map(|s| s.duration_secs)
                .unwrap_or_else(|| self.settings.work_secs());
            debug!(task_id = %self.task_id, index = self.index, "Pomodoro position clamped");
        }
    }

    // ---------------------------------------------------------------------
    // Readers
    // ---------------------------------------------------------------------

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn sessions(&self) -> &[PomodoroSession] {
        &self.sessions
    }

    pub fn current_session(&self) -> Option<&PomodoroSession> {
        self.sessions.get(self.index)
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn total_elapsed_secs(&self) -> u32 {
        self.total_elapsed_secs
    }

    /// "Working on: <subtask>" during work, the stage name otherwise
    pub fn stage_label(&self) -> String {
        match (self.stage, self.current_session()) {
            (Stage::Work, Some(session)) => format!("Working on: {}", session.title),
            (stage, _) => stage.name().to_string(),
        }
    }

    pub fn format_clock(&self) -> String {
        format_clock(self.remaining_secs)
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    fn complete_stage(&mut self, store: &mut TaskStore) -> StageEvent {
        match self.stage {
            Stage::Work => self.complete_work(store),
            Stage::ShortBreak | Stage::LongBreak => self.complete_break(store),
        }
    }

    fn complete_work(&mut self, store: &mut TaskStore) -> StageEvent {
        let task_id = self.task_id;
        let remaining = self.remaining_secs;

        let (sub_task, actual_minutes) = match self.sessions.get_mut(self.index) {
            Some(session) => {
                let actual = actual_minutes(session.duration_secs, remaining);
                store.update_sub_task(
                    task_id,
                    session.sub_task_id,
                    SubTaskUpdate {
                        completed: Some(true),
                        actual_minutes: Some(Some(actual)),
                        ..SubTaskUpdate::default()
                    },
                );
                session.completed = true;
                (Some(session.title.clone()), Some(actual))
            }
            None => (None, None),
        };

        let long_break = self.settings.is_long_break_after(self.completed_sessions);
        self.completed_sessions += 1;
        let (stage, secs) = if long_break {
            (Stage::LongBreak, self.settings.long_break_secs())
        } else {
            (Stage::ShortBreak, self.settings.short_break_secs())
        };
        self.stage = stage;
        self.remaining_secs = secs;
        self.running = true;

        debug!(
            task_id = %task_id,
            completed_sessions = self.completed_sessions,
            stage = stage.name(),
            "Work session completed"
        );

        StageEvent::WorkCompleted {
            sub_task,
            actual_minutes,
            next_stage: stage,
        }
    }

    fn complete_break(&mut self, store: &TaskStore) -> StageEvent {
        let next = self.index + 1;
        if let Some(session) = self.sessions.get(next) {
            self.index = next;
            self.stage = Stage::Work;
            self.remaining_secs = session.duration_secs;
            debug!(task_id = %self.task_id, index = next, "Break over, next session");
            return StageEvent::BreakCompleted { next_index: next };
        }

        self.settings = store.pomodoro_settings();
        self.sessions = derive_sessions(store, self.task_id, &[]);
        self.index = 0;
        self.stage = Stage::Work;
        self.running = false;
        self.remaining_secs = self.first_session_secs();
        debug!(task_id = %self.task_id, "Pomodoro cycle finished");
        StageEvent::CycleFinished
    }

    fn jump_to(&mut self, index: usize) {
        self.index = index;
        self.stage = Stage::Work;
        self.running = false;
        self.remaining_secs = self.sessions[index].duration_secs;
    }

    fn first_session_secs(&self) -> u32 {
        self.sessions
            .first()
            .map(|s| s.duration_secs)
            .unwrap_or_else(|| self.settings.work_secs())
    }
}

/// Minutes actually spent on a session, rounded up
pub fn actual_minutes(duration_secs: u32, remaining_secs: u32) -> u32 {
    duration_secs.saturating_sub(remaining_secs).div_ceil(60)
}

/// `M:SS`
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Incomplete subtasks of the task in stored order, plus any listed in `keep`
fn derive_sessions(store: &TaskStore, task_id: Uuid, keep: &[Uuid]) -> Vec<PomodoroSession> {
    let Some(task) = store.task(task_id) else {
        return Vec::new();
    };
    task.sub_tasks
        .iter()
        .filter(|st| !st.completed || keep.contains(&st.id))
        .map(|st| PomodoroSession {
            sub_task_id: st.id,
            title: st.title.clone(),
            duration_secs: st.estimated_minutes.saturating_mul(60),
            completed: st.completed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeneratedSubTask, SubTaskDraft, TaskDraft};
    use pretty_assertions::assert_eq;

    fn store_with(minutes: &[u32]) -> (TaskStore, Uuid, Vec<Uuid>) {
        let mut store = TaskStore::in_memory();
        let task_id = store.add_task(TaskDraft::titled("Focus"));
        let ids = minutes
            .iter()
            .enumerate()
            .filter_map(|(i, m)| store.add_sub_task(task_id, SubTaskDraft::new(format!("step {}", i + 1), *m)))
            .collect();
        (store, task_id, ids)
    }

    fn run_ticks(engine: &mut PomodoroEngine, store: &mut TaskStore, n: u32) -> Option<StageEvent> {
        let mut last = None;
        for _ in 0..n {
            if let Some(event) = engine.tick(store) {
                last = Some(event);
            }
        }
        last
    }

    #[test]
    fn test_new_engine_starts_on_first_session() {
        let (store, task_id, _) = store_with(&[25, 10]);
        let engine = PomodoroEngine::new(&store, task_id);

        assert_eq!(engine.stage(), Stage::Work);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(!engine.is_running());
        assert_eq!(engine.session_count(), 2);
        assert_eq!(engine.stage_label(), "Working on: step 1");
        assert_eq!(engine.format_clock(), "25:00");
    }

    #[test]
    fn test_empty_queue_uses_work_duration() {
        let (store, task_id, _) = store_with(&[]);
        let engine = PomodoroEngine::new(&store, task_id);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert_eq!(engine.stage_label(), "Work Time");
    }

    #[test]
    fn test_ticks_ignored_while_stopped() {
        let (mut store, task_id, _) = store_with(&[25]);
        let mut engine = PomodoroEngine::new(&store, task_id);

        assert!(engine.tick(&mut store).is_none());
        assert_eq!(engine.remaining_secs(), 1500);

        engine.start();
        engine.tick(&mut store);
        engine.pause();
        engine.tick(&mut store);
        assert_eq!(engine.remaining_secs(), 1499);
        assert_eq!(engine.total_elapsed_secs(), 1);
    }

    #[test]
    fn test_full_cycle_scenario() {
        let (mut store, task_id, ids) = store_with(&[25, 10]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.start();
        assert_eq!(engine.remaining_secs(), 1500);

        // First work session runs out
        let event = run_ticks(&mut engine, &mut store, 1500);
        assert_eq!(
            event,
            Some(StageEvent::WorkCompleted {
                sub_task: Some("step 1".to_string()),
                actual_minutes: Some(25),
                next_stage: Stage::ShortBreak,
            })
        );
        let first = store.task(task_id).unwrap().sub_task(ids[0]).unwrap();
        assert!(first.completed);
        assert_eq!(first.actual_minutes, Some(25));
        assert_eq!(engine.completed_sessions(), 1);
        assert_eq!(engine.stage(), Stage::ShortBreak);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(engine.is_running());

        // Short break runs out
        let event = run_ticks(&mut engine, &mut store, 300);
        assert_eq!(event, Some(StageEvent::BreakCompleted { next_index: 1 }));
        assert_eq!(engine.stage(), Stage::Work);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.remaining_secs(), 600);
        assert_eq!(engine.current_session().unwrap().sub_task_id, ids[1]);

        // Finish the second session early, 550s in
        run_ticks(&mut engine, &mut store, 550);
        assert_eq!(engine.remaining_secs(), 50);
        let event = engine.mark_done(&mut store);
        assert!(matches!(
            event,
            Some(StageEvent::WorkCompleted { actual_minutes: Some(10), .. })
        ));
        let second = store.task(task_id).unwrap().sub_task(ids[1]).unwrap();
        assert!(second.completed);
        assert_eq!(second.actual_minutes, Some(10));
        assert_eq!(engine.stage(), Stage::ShortBreak);

        // Nothing left after the break
        assert_eq!(engine.skip_break(&store), Some(StageEvent::CycleFinished));
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stage(), Stage::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.session_count(), 0);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.completed_sessions(), 2);
        assert_eq!(engine.total_elapsed_secs(), 1500 + 300 + 550);
    }

    #[test]
    fn test_long_break_after_cycle_length() {
        let (mut store, task_id, _) = store_with(&[1, 1, 1]);
        store.update_pomodoro_settings(PomodoroSettings::with_fallbacks(25, 5, 15, 2));
        let mut engine = PomodoroEngine::new(&store, task_id);

        engine.mark_done(&mut store);
        assert_eq!(engine.stage(), Stage::ShortBreak);
        engine.skip_break(&store);

        engine.mark_done(&mut store);
        assert_eq!(engine.stage(), Stage::LongBreak);
        assert_eq!(engine.remaining_secs(), 900);
    }

    #[test]
    fn test_mark_done_immediately_records_zero_minutes() {
        let (mut store, task_id, ids) = store_with(&[10]);
        let mut engine = PomodoroEngine::new(&store, task_id);

        engine.mark_done(&mut store);

        let st = store.task(task_id).unwrap().sub_task(ids[0]).unwrap();
        assert!(st.completed);
        assert_eq!(st.actual_minutes, Some(0));
        assert!(engine.is_running());
    }

    #[test]
    fn test_mark_done_without_sessions_is_ignored() {
        let (mut store, task_id, _) = store_with(&[]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        assert!(engine.mark_done(&mut store).is_none());
        assert_eq!(engine.stage(), Stage::Work);
    }

    #[test]
    fn test_previous_and_next() {
        let (mut store, task_id, _) = store_with(&[25, 10, 5]);
        let mut engine = PomodoroEngine::new(&store, task_id);

        assert!(!engine.previous());
        engine.start();
        assert!(engine.next());
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.remaining_secs(), 600);
        assert!(!engine.is_running());

        assert!(engine.next());
        assert!(!engine.next());
        assert!(engine.previous());
        assert_eq!(engine.current_index(), 1);

        engine.mark_done(&mut store);
        assert_eq!(engine.stage(), Stage::ShortBreak);
        assert!(engine.next());
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.stage(), Stage::Work);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_navigation_leaves_a_break() {
        let (mut store, task_id, _) = store_with(&[25, 10, 5]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.start();

        engine.mark_done(&mut store);
        assert_eq!(engine.stage(), Stage::ShortBreak);
        assert!(!engine.previous());

        assert!(engine.next());
        engine.mark_done(&mut store);
        assert!(engine.stage().is_break());

        assert!(engine.previous());
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stage(), Stage::Work);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_huge_estimate_does_not_overflow() {
        let mut store = TaskStore::in_memory();
        let task_id = store.add_task(TaskDraft::titled("Focus"));
        store.add_ai_generated_sub_tasks(task_id, &[GeneratedSubTask::new("huge", 80_000_000)]);

        let mut engine = PomodoroEngine::new(&store, task_id);
        assert_eq!(engine.remaining_secs(), u32::MAX);

        engine.start();
        run_ticks(&mut engine, &mut store, 3);
        assert_eq!(engine.remaining_secs(), u32::MAX - 3);
        assert_eq!(engine.total_elapsed_secs(), 3);
    }

    #[test]
    fn test_reset_zeroes_counters_and_keeps_completions() {
        let (mut store, task_id, ids) = store_with(&[25, 10]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.start();
        run_ticks(&mut engine, &mut store, 1500);

        engine.reset(&store);

        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.stage(), Stage::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_sessions(), 0);
        assert_eq!(engine.total_elapsed_secs(), 0);
        assert_eq!(engine.session_count(), 1);
        assert_eq!(engine.remaining_secs(), 600);
        assert!(store.task(task_id).unwrap().sub_task(ids[0]).unwrap().completed);
    }

    #[test]
    fn test_set_minutes_validation() {
        let (store, task_id, _) = store_with(&[25]);
        let mut engine = PomodoroEngine::new(&store, task_id);

        assert_eq!(engine.set_minutes(" 12 "), Ok(()));
        assert_eq!(engine.remaining_secs(), 720);

        for bad in ["0", "-3", "abc", "", "1441", "80000000"] {
            assert_eq!(
                engine.set_minutes(bad),
                Err(TimerError::InvalidMinutes(bad.to_string()))
            );
        }
        assert_eq!(engine.remaining_secs(), 720);
    }

    #[test]
    fn test_time_edit_beyond_duration_saturates_actual() {
        let (mut store, task_id, ids) = store_with(&[5]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.set_minutes("30").unwrap();

        engine.mark_done(&mut store);

        let st = store.task(task_id).unwrap().sub_task(ids[0]).unwrap();
        assert_eq!(st.actual_minutes, Some(0));
    }

    #[test]
    fn test_sync_picks_up_added_sub_task() {
        let (mut store, task_id, _) = store_with(&[25]);
        let mut engine = PomodoroEngine::new(&store, task_id);

        store.add_sub_task(task_id, SubTaskDraft::new("late", 5));
        engine.sync(&store);

        assert_eq!(engine.session_count(), 2);
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn test_sync_clamps_out_of_range_position() {
        let (mut store, task_id, ids) = store_with(&[25, 10, 5]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.next();
        engine.next();
        engine.start();
        assert_eq!(engine.current_index(), 2);

        store.delete_sub_task(task_id, ids[2]);
        engine.sync(&store);

        assert_eq!(engine.session_count(), 2);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.stage(), Stage::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_secs(), 600);
    }

    #[test]
    fn test_sync_after_task_deleted_empties_queue() {
        let (mut store, task_id, _) = store_with(&[25, 10]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.next();

        store.delete_task(task_id);
        engine.sync(&store);

        assert_eq!(engine.session_count(), 0);
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn test_sync_keeps_sessions_completed_this_cycle() {
        let (mut store, task_id, ids) = store_with(&[25, 10]);
        let mut engine = PomodoroEngine::new(&store, task_id);
        engine.mark_done(&mut store);
        engine.skip_break(&store);

        engine.sync(&store);

        assert_eq!(engine.session_count(), 2);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.current_session().unwrap().sub_task_id, ids[1]);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(1500), "25:00");
    }

    #[test]
    fn test_actual_minutes_rounds_up() {
        assert_eq!(actual_minutes(1500, 0), 25);
        assert_eq!(actual_minutes(600, 50), 10);
        assert_eq!(actual_minutes(600, 599), 1);
        assert_eq!(actual_minutes(600, 600), 0);
    }
}
