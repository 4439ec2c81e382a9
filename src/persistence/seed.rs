use crate::domain::{DailyStats, Priority, SubTaskDraft, SubTaskUpdate, TaskDraft, TaskUpdate};
use crate::store::TaskStore;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::info;

struct SampleSubTask {
    title: &'static str,
    estimate: u32,
    /// Set for finished subtasks
    actual: Option<u32>,
    done: bool,
}

struct SampleTask {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    estimate: u32,
    actual: Option<u32>,
    priority: Priority,
    completed: bool,
    ai_generated: bool,
    sub_tasks: &'static [SampleSubTask],
}

const fn done(title: &'static str, estimate: u32, actual: u32) -> SampleSubTask {
    SampleSubTask { title, estimate, actual: Some(actual), done: true }
}

const fn open(title: &'static str, estimate: u32) -> SampleSubTask {
    SampleSubTask { title, estimate, actual: None, done: false }
}

const SAMPLE_TASKS: [SampleTask; 5] = [
    SampleTask {
        title: "Create project proposal",
        description: "Draft a comprehensive project proposal for the new client",
        category: "Work",
        estimate: 120,
        actual: Some(135),
        priority: Priority::High,
        completed: true,
        ai_generated: true,
        sub_tasks: &[
            done("Research client background", 30, 35),
            done("Outline project scope", 45, 50),
            done("Create budget estimate", 45, 50),
        ],
    },
    SampleTask {
        title: "Weekly grocery shopping",
        description: "Buy groceries for the week",
        category: "Personal",
        estimate: 60,
        actual: Some(75),
        priority: Priority::Medium,
        completed: true,
        ai_generated: false,
        sub_tasks: &[
            done("Make shopping list", 15, 10),
            done("Go to supermarket", 30, 45),
            done("Unpack groceries", 15, 20),
        ],
    },
    SampleTask {
        title: "Prepare for presentation",
        description: "Create slides and practice for the team meeting",
        category: "Work",
        estimate: 90,
        actual: None,
        priority: Priority::High,
        completed: false,
        ai_generated: true,
        sub_tasks: &[
            SampleSubTask { title: "Gather data and statistics", estimate: 30, actual: None, done: true },
            open("Design presentation slides", 45),
            open("Practice delivery", 15),
        ],
    },
    SampleTask {
        title: "Morning workout routine",
        description: "Complete 30-minute exercise session",
        category: "Health",
        estimate: 30,
        actual: None,
        priority: Priority::Low,
        completed: false,
        ai_generated: false,
        sub_tasks: &[
            open("Warm-up stretches", 5),
            open("Cardio session", 15),
            open("Cool down", 10),
        ],
    },
    SampleTask {
        title: "Read a book chapter",
        description: "Continue reading the current book",
        category: "Personal",
        estimate: 45,
        actual: None,
        priority: Priority::Optional,
        completed: false,
        ai_generated: false,
        sub_tasks: &[],
    },
];

/// (tasks completed, hours spent, score, work, personal, health) per day,
/// oldest first
const SAMPLE_DAYS: [(u32, u32, u8, u32, u32, u32); 7] = [
    (3, 2, 72, 95, 40, 20),
    (4, 3, 81, 140, 55, 30),
    (2, 1, 64, 70, 35, 15),
    (5, 4, 93, 170, 60, 40),
    (3, 3, 77, 120, 45, 25),
    (1, 2, 60, 65, 80, 35),
    (4, 5, 88, 175, 70, 40),
];

fn add_sample_tasks(store: &mut TaskStore) -> usize {
    for sample in &SAMPLE_TASKS {
        let id = store.add_task(TaskDraft {
            title: Some(sample.title.to_string()),
            description: Some(sample.description.to_string()),
            category: Some(sample.category.to_string()),
            estimated_minutes: Some(sample.estimate),
            priority: Some(sample.priority),
            ai_generated: sample.ai_generated,
            ..TaskDraft::default()
        });

        for sub in sample.sub_tasks {
            let Some(sub_id) = store.add_sub_task(id, SubTaskDraft::new(sub.title, sub.estimate)) else {
                continue;
            };
            if sub.done {
                store.update_sub_task(
                    id,
                    sub_id,
                    SubTaskUpdate {
                        completed: Some(true),
                        actual_minutes: Some(sub.actual),
                        ..SubTaskUpdate::default()
                    },
                );
            }
        }

        if sample.completed {
            store.update_task(
                id,
                TaskUpdate {
                    completed: Some(true),
                    actual_minutes: Some(sample.actual),
                    ..TaskUpdate::default()
                },
            );
        }
    }
    SAMPLE_TASKS.len()
}

/// Seven days of fixed sample stats ending on `today`
pub fn sample_stats(today: NaiveDate) -> Vec<DailyStats> {
    SAMPLE_DAYS
        .iter()
        .enumerate()
        .map(|(i, &(completed, hours, score, work, personal, health))| {
            let days_back = (SAMPLE_DAYS.len() - 1 - i) as i64;
            DailyStats {
                date: today - Duration::days(days_back),
                total_tasks_completed: completed,
                total_time_spent: hours * 60,
                productivity_score: score,
                time_by_category: BTreeMap::from([
                    ("Work".to_string(), work),
                    ("Personal".to_string(), personal),
                    ("Health".to_string(), health),
                ]),
            }
        })
        .collect()
}

/// Fill an empty store with sample tasks and an empty stats history with a
/// sample week. Returns how many tasks and stats entries were added.
pub fn bootstrap(store: &mut TaskStore, today: NaiveDate) -> (usize, usize) {
    let tasks_added = if store.tasks().is_empty() {
        add_sample_tasks(store)
    } else {
        0
    };

    let stats_added = if store.daily_stats().is_empty() {
        let stats = sample_stats(today);
        let count = stats.len();
        for entry in stats {
            store.add_daily_stats(entry);
        }
        count
    } else {
        0
    };

    if tasks_added > 0 || stats_added > 0 {
        info!(tasks_added, stats_added, "Seeded sample data");
    }
    (tasks_added, stats_added)
}
