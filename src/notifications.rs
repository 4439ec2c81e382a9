/// Desktop notifications for timer stage changes
/// Currently only implements macOS notifications

#[cfg(target_os = "macos")]
use std::process::Command;

fn display(title: &str, message: &str) {
    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            message.replace('"', "\\\""),
            title.replace('"', "\\\"")
        );

        if let Err(e) = Command::new("osascript").arg("-e").arg(&script).output() {
            tracing::debug!(error = %e, "Notification failed");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        // No-op on other platforms
        let _ = (title, message);
    }
}

/// A work session ended; `sub_task` is the subtask it was spent on
pub fn notify_work_complete(sub_task: Option<&str>) {
    let message = match sub_task {
        Some(title) => format!("Finished: {}. Time for a break.", title),
        None => "Work session finished. Time for a break.".to_string(),
    };
    display("Habit Builder - Work Complete", &message);
}

pub fn notify_break_over() {
    display("Habit Builder - Break Over", "Back to work!");
}

pub fn notify_cycle_finished() {
    display("Habit Builder - All Done", "Every subtask has had its session.");
}
