use std::time::Duration;

/// Pomodoro countdown resolution in milliseconds
pub const TICK_MS: u64 = 1000;

/// Interval between engine ticks
pub fn tick_duration() -> Duration {
    Duration::from_millis(TICK_MS)
}

/// One-second interval; missed ticks are skipped, not replayed in a burst
pub fn interval() -> tokio::time::Interval {
    let mut interval = tokio::time::interval(tick_duration());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}
