use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Productivity summary for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Calendar date key, serialized as YYYY-MM-DD
    pub date: NaiveDate,
    pub total_tasks_completed: u32,
    /// Minutes
    pub total_time_spent: u32,
    /// 0-100
    pub productivity_score: u8,
    /// Category label -> minutes
    #[serde(default)]
    pub time_by_category: BTreeMap<String, u32>,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            total_tasks_completed: 0,
            total_time_spent: 0,
            productivity_score: 0,
            time_by_category: BTreeMap::new(),
        }
    }
}

/// Process-wide Pomodoro timer configuration (minutes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettings {
    pub work_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    pub sessions_before_long_break: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            sessions_before_long_break: 4,
        }
    }
}

impl PomodoroSettings {
    pub fn work_secs(&self) -> u32 {
        self.work_duration.saturating_mul(60)
    }

    pub fn short_break_secs(&self) -> u32 {
        self.short_break_duration.saturating_mul(60)
    }

    pub fn long_break_secs(&self) -> u32 {
        self.long_break_duration.saturating_mul(60)
    }

    /// Whether the break after `completed_before + 1` sessions is a long one
    pub fn is_long_break_after(&self, completed_before: u32) -> bool {
        // A zero cycle length would divide by zero; treat it as "never long"
        if self.sessions_before_long_break == 0 {
            return false;
        }
        (completed_before + 1) % self.sessions_before_long_break == 0
    }

    /// Build settings from user input, replacing zeros with the defaults
    pub fn with_fallbacks(work: u32, short_break: u32, long_break: u32, sessions: u32) -> Self {
        let defaults = Self::default();
        let pick = |value: u32, fallback: u32| if value > 0 { value } else { fallback };
        Self {
            work_duration: pick(work, defaults.work_duration),
            short_break_duration: pick(short_break, defaults.short_break_duration),
            long_break_duration: pick(long_break, defaults.long_break_duration),
            sessions_before_long_break: pick(sessions, defaults.sessions_before_long_break),
        }
    }
}
