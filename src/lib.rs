pub mod ai;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod persistence;
pub mod pomodoro;
pub mod report;
pub mod store;
pub mod ticker;

pub use error::GatewayError;
pub use pomodoro::{PomodoroEngine, StageEvent, TimerError};
pub use store::{StoreState, TaskStore};
