use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use habit_builder::ai::{add_suggestions, AiGateway};
use habit_builder::config::Settings;
use habit_builder::domain::{
    active_newest_first, compute_totals, filter_tasks, high_priority_focus, status_badge,
    tasks_for_date, PomodoroSettings, Priority, SubTaskDraft, SubTaskUpdate, Task, TaskDraft,
    TaskFilter, TaskUpdate, MAX_MINUTES,
};
use habit_builder::persistence::{
    backup_file, bootstrap, ensure_dir, init_local_data_dir, FileKeyValueStore, STORE_KEY,
};
use habit_builder::pomodoro::{format_clock, PomodoroEngine, StageEvent};
use habit_builder::report::stats::calculate_global_stats;
use habit_builder::report::{
    default_report_path, estimate_task_time, format_minutes, generate_report, productivity_score,
    summarize_day, task_progress, time_by_category, weekly_stats,
};
use habit_builder::store::TaskStore;
use habit_builder::{logging, notifications, ticker};
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "habit")]
#[command(about = "Tasks with subtasks, a Pomodoro focus timer and AI task breakdown", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .habit-builder directory in the current directory
    Init,
    /// Add a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Estimated minutes. Guessed from the wording when omitted.
        #[arg(short, long, value_parser = parse_minutes)]
        minutes: Option<u32>,
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks
    List {
        /// all, active or completed
        #[arg(short, long, default_value = "active")]
        filter: TaskFilter,
    },
    /// Show a task with its subtasks
    Show { id: String },
    /// Mark a task complete (or incomplete with --undo)
    Done {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    Delete { id: String },
    /// Edit task fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, value_parser = parse_minutes)]
        minutes: Option<u32>,
        /// Actual minutes spent
        #[arg(long, value_parser = parse_minutes)]
        actual: Option<u32>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Set a task's priority
    #[command(name = "priority")]
    SetPriority { id: String, level: Priority },
    /// Reorder tasks by priority, open tasks first, newest first
    Sort,
    /// Manage subtasks
    Sub {
        #[command(subcommand)]
        action: SubCommand,
    },
    /// Break a task into subtasks with the AI assistant
    Breakdown {
        id: String,
        /// Remove existing subtasks first
        #[arg(long)]
        replace: bool,
    },
    /// Turn free-form text into tasks
    Dump {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Tasks scheduled on a day
    Calendar {
        /// Date (YYYY-MM-DD). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Productivity statistics
    Stats {
        /// Save today's summary into the daily history
        #[arg(long)]
        record: bool,
    },
    /// Productivity insights from the AI coach
    Insights,
    /// Generate a markdown report
    Report {
        /// Date to generate report for (YYYY-MM-DD format). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        /// Output file path. Defaults to <data dir>/report-YYYY-MM-DD.md
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show or change Pomodoro durations (minutes)
    #[command(name = "settings")]
    Timing {
        #[arg(long, value_parser = parse_minutes)]
        work: Option<u32>,
        #[arg(long, value_parser = parse_minutes)]
        short_break: Option<u32>,
        #[arg(long, value_parser = parse_minutes)]
        long_break: Option<u32>,
        /// Work sessions before a long break
        #[arg(long, value_parser = parse_minutes)]
        sessions: Option<u32>,
    },
    /// Run the Pomodoro timer for a task (newest open task if omitted)
    Timer { id: Option<String> },
    /// Add sample tasks and statistics to an empty store
    Seed,
    /// Delete every task and statistic (settings are kept)
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SubCommand {
    /// Add a subtask
    Add {
        task: String,
        title: String,
        #[arg(short, long, value_parser = parse_minutes)]
        minutes: Option<u32>,
    },
    /// Mark a subtask complete (or incomplete with --undo)
    Done {
        task: String,
        /// Subtask number (1-based) or id prefix
        sub: String,
        #[arg(long)]
        undo: bool,
    },
    /// Edit a subtask
    Edit {
        task: String,
        sub: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, value_parser = parse_minutes)]
        minutes: Option<u32>,
        #[arg(long, value_parser = parse_minutes)]
        actual: Option<u32>,
    },
    /// Delete a subtask
    Delete { task: String, sub: String },
    /// Delete every subtask of a task
    Clear { task: String },
}

fn parse_minutes(s: &str) -> std::result::Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(m) if (1..=MAX_MINUTES).contains(&m) => Ok(m),
        _ => Err(format!("'{}' is not a number of minutes between 1 and {}", s, MAX_MINUTES)),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD: {}", e))
}

fn parse_due(s: &str) -> Result<DateTime<Local>> {
    let date = parse_date(s)?;
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .with_context(|| format!("{} has no local midnight", date))
}

fn require_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Title cannot be empty");
    }
    Ok(title.to_string())
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn resolve_task(store: &TaskStore, prefix: &str) -> Result<Uuid> {
    match store.tasks_matching_prefix(prefix).as_slice() {
        [task] => Ok(task.id),
        [] => bail!("No task matches '{}'", prefix),
        matches => bail!("'{}' matches {} tasks; use a longer id", prefix, matches.len()),
    }
}

/// A subtask by 1-based position, or by id prefix
fn resolve_sub_task(task: &Task, key: &str) -> Result<Uuid> {
    if let Ok(n) = key.trim().parse::<usize>() {
        if let Some(sub) = n.checked_sub(1).and_then(|i| task.sub_tasks.get(i)) {
            return Ok(sub.id);
        }
    }

    let key = key.trim().to_lowercase();
    let matches: Vec<_> = task
        .sub_tasks
        .iter()
        .filter(|s| s.id.to_string().starts_with(&key))
        .collect();
    match matches.as_slice() {
        [sub] => Ok(sub.id),
        [] => bail!("No subtask of '{}' matches '{}'", task.title, key),
        _ => bail!("'{}' matches several subtasks; use a longer id", key),
    }
}

fn find_task(store: &TaskStore, prefix: &str) -> Result<Task> {
    let id = resolve_task(store, prefix)?;
    store
        .task(id)
        .cloned()
        .with_context(|| format!("Task {} disappeared", id))
}

fn open_store(settings: &Settings) -> Result<(TaskStore, PathBuf)> {
    let data_dir = settings.resolve_data_dir()?;
    ensure_dir(&data_dir)?;
    let store = TaskStore::open(Box::new(FileKeyValueStore::new(&data_dir)))
        .with_context(|| format!("Failed to open task store in {}", data_dir.display()))?;
    Ok((store, data_dir))
}

fn print_task_line(task: &Task) {
    let category = task
        .category
        .as_deref()
        .map(|c| format!(" #{}", c))
        .unwrap_or_default();
    let due = task
        .due_date
        .map(|d| format!(" due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!(
        "{} {} {:<8} {}{}{} ({}, {}%)",
        status_badge(task),
        short_id(task.id),
        task.priority.label(),
        task.title,
        category,
        due,
        format_minutes(task.estimated_minutes),
        task_progress(task)
    );
}

fn print_task_details(task: &Task) {
    println!("{}", task.title);
    println!("  id:        {}", task.id);
    if !task.description.is_empty() {
        println!("  about:     {}", task.description);
    }
    println!("  status:    {}", if task.completed { "completed" } else { "open" });
    println!("  priority:  {}", task.priority);
    if let Some(category) = &task.category {
        println!("  category:  {}", category);
    }
    if let Some(due) = task.due_date {
        println!("  due:       {}", due.format("%Y-%m-%d"));
    }
    println!("  estimate:  {}", format_minutes(task.estimated_minutes));
    if let Some(actual) = task.actual_minutes {
        println!("  actual:    {}", format_minutes(actual));
    }
    println!("  progress:  {}%", task_progress(task));
    if task.ai_generated {
        println!("  source:    AI assisted");
    }

    if !task.sub_tasks.is_empty() {
        println!();
        for (i, sub) in task.sub_tasks.iter().enumerate() {
            let actual = sub
                .actual_minutes
                .map(|m| format!(" / {}", format_minutes(m)))
                .unwrap_or_default();
            println!(
                "  {:>2}. {} {} {} ({}{})",
                i + 1,
                if sub.completed { "[x]" } else { "[ ]" },
                short_id(sub.id),
                sub.title,
                format_minutes(sub.estimated_minutes),
                actual
            );
        }
    }
}

fn print_home(store: &TaskStore, today: NaiveDate) {
    println!("{}", today.format("%A, %B %-d"));

    let focus = high_priority_focus(store.tasks(), 3);
    println!();
    println!("Focus");
    if focus.is_empty() {
        println!("  Nothing urgent. Add a task with `habit add`.");
    }
    for task in focus {
        print!("  ");
        print_task_line(task);
    }

    let week = weekly_stats(store.daily_stats(), today);
    println!();
    println!("This week");
    for (label, score) in week.labels.iter().zip(&week.data) {
        println!("  {} {:>3}% {}", label, score, "#".repeat(*score as usize / 5));
    }
    println!("  average {}%", week.average());
}

fn cmd_stats(store: &mut TaskStore, today: NaiveDate, record: bool) {
    let summary = summarize_day(store.tasks(), today);
    let global = calculate_global_stats(store.tasks());

    println!("Today ({})", today);
    println!("  completed:    {}", summary.total_tasks_completed);
    println!("  time spent:   {}", format_minutes(summary.total_time_spent));
    println!("  productivity: {}%", summary.productivity_score);
    for (category, minutes) in &summary.time_by_category {
        println!("  {:<12}  {}", category, format_minutes(*minutes));
    }

    println!();
    println!("All tasks");
    println!(
        "  {} total, {} active, {} completed, {} AI assisted",
        global.total_tasks, global.active_count, global.completed_count, global.ai_generated_count
    );
    println!(
        "  subtasks {}/{} done, {} estimated, {} recorded",
        global.sub_tasks_done,
        global.sub_task_count,
        format_minutes(global.total_estimate),
        format_minutes(global.total_actual)
    );
    for (priority, count) in &global.by_priority {
        println!("  {:<8} {}", priority.label(), count);
    }

    let week = weekly_stats(store.daily_stats(), today);
    println!();
    let days: Vec<String> = week
        .labels
        .iter()
        .zip(&week.data)
        .map(|(label, score)| format!("{} {}%", label, score))
        .collect();
    println!("Week: {}", days.join("  "));

    if record {
        store.add_daily_stats(summary);
        println!();
        println!("Recorded stats for {}", today);
    }
}

async fn cmd_insights(store: &TaskStore, gateway: &AiGateway, today: NaiveDate) {
    let tasks = store.tasks();
    let completed = tasks.iter().filter(|t| t.completed).count();
    let (estimated, spent) = compute_totals(tasks);
    let score = productivity_score(completed as u32, tasks.len() as u32, spent, estimated);

    let end = Local::now();
    let start = (today - Duration::days(6))
        .and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .unwrap_or(end);
    let by_category = time_by_category(tasks, start, end);

    let text = gateway
        .productivity_insights(completed, tasks.len(), score, &by_category)
        .await;
    println!("{}", text);
}

async fn cmd_breakdown(store: &mut TaskStore, gateway: &AiGateway, prefix: &str, replace: bool) -> Result<()> {
    let task = find_task(store, prefix)?;
    println!("Breaking down '{}'...", task.title);

    let breakdown = gateway
        .generate_task_breakdown(&task.title, &task.description)
        .await;

    if replace {
        store.delete_all_sub_tasks(task.id);
    }
    store.apply_breakdown(task.id, &breakdown);

    for (i, sub) in breakdown.sub_tasks.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, sub.title, format_minutes(sub.estimated_minutes));
    }
    println!(
        "Total {}, suggested priority {}",
        format_minutes(breakdown.total_estimated_minutes),
        breakdown.suggested_priority
    );
    Ok(())
}

async fn cmd_dump(store: &mut TaskStore, gateway: &AiGateway, text: &str, today: NaiveDate) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Nothing to organise");
    }

    let suggestions = gateway
        .organize_brain_dump(text, today)
        .await
        .context("Could not organise your thoughts. Please try again")?;

    let ids = add_suggestions(store, &suggestions);
    println!("Added {} task(s):", ids.len());
    for id in ids {
        if let Some(task) = store.task(id) {
            print!("  ");
            print_task_line(task);
        }
    }
    Ok(())
}

fn cmd_sub(store: &mut TaskStore, action: SubCommand) -> Result<()> {
    match action {
        SubCommand::Add { task, title, minutes } => {
            let task = find_task(store, &task)?;
            let draft = SubTaskDraft {
                title: Some(require_title(&title)?),
                estimated_minutes: minutes,
            };
            if let Some(id) = store.add_sub_task(task.id, draft) {
                println!("Added subtask {} to '{}'", short_id(id), task.title);
            }
        }
        SubCommand::Done { task, sub, undo } => {
            let task = find_task(store, &task)?;
            let sub_id = resolve_sub_task(&task, &sub)?;
            store.complete_sub_task(task.id, sub_id, !undo);
        }
        SubCommand::Edit { task, sub, title, minutes, actual } => {
            let task = find_task(store, &task)?;
            let sub_id = resolve_sub_task(&task, &sub)?;
            let update = SubTaskUpdate {
                title: title.as_deref().map(require_title).transpose()?,
                estimated_minutes: minutes,
                actual_minutes: actual.map(Some),
                ..SubTaskUpdate::default()
            };
            store.update_sub_task(task.id, sub_id, update);
        }
        SubCommand::Delete { task, sub } => {
            let task = find_task(store, &task)?;
            let sub_id = resolve_sub_task(&task, &sub)?;
            store.delete_sub_task(task.id, sub_id);
        }
        SubCommand::Clear { task } => {
            let task = find_task(store, &task)?;
            store.delete_all_sub_tasks(task.id);
            println!("Removed all subtasks from '{}'", task.title);
        }
    }
    Ok(())
}

const TIMER_HELP: &str =
    "[enter] start/pause  d done  s skip break  n next  b back  r reset  m <min> set time  q quit";

fn render_timer(engine: &PomodoroEngine) {
    let position = if engine.session_count() > 0 {
        format!("[{}/{}] ", engine.current_index() + 1, engine.session_count())
    } else {
        String::new()
    };
    let state = if engine.is_running() { "" } else { " (paused)" };
    print!(
        "\r{}{:<40} {}{}   ",
        position,
        engine.stage_label(),
        engine.format_clock(),
        state
    );
    let _ = std::io::stdout().flush();
}

fn announce(event: &StageEvent, engine: &PomodoroEngine, notify: bool) {
    println!();
    match event {
        StageEvent::WorkCompleted { sub_task, actual_minutes, next_stage } => {
            match (sub_task, actual_minutes) {
                (Some(title), Some(minutes)) => {
                    println!("Finished '{}' in {}", title, format_minutes(*minutes))
                }
                _ => println!("Work session finished"),
            }
            println!("{} for {}", next_stage.name(), format_clock(engine.remaining_secs()));
            if notify {
                notifications::notify_work_complete(sub_task.as_deref());
            }
        }
        StageEvent::BreakCompleted { .. } => {
            println!("Break over. {}", engine.stage_label());
            if notify {
                notifications::notify_break_over();
            }
        }
        StageEvent::CycleFinished => {
            println!("Every session is done. The timer is back at the start.");
            if notify {
                notifications::notify_cycle_finished();
            }
        }
    }
}

/// Apply one line of timer input. Returns false to leave the timer.
fn handle_timer_input(line: &str, engine: &mut PomodoroEngine, store: &mut TaskStore, notify: bool) -> bool {
    let mut parts = line.split_whitespace();
    let event = match parts.next().unwrap_or("") {
        "" | "p" => {
            engine.toggle();
            None
        }
        "d" => engine.mark_done(store),
        "s" => engine.skip_break(store),
        "n" => {
            if !engine.next() {
                println!("\nCannot move forward now");
            }
            None
        }
        "b" => {
            if !engine.previous() {
                println!("\nCannot move back now");
            }
            None
        }
        "r" => {
            engine.reset(store);
            None
        }
        "m" => {
            let input = parts.next().unwrap_or("");
            if let Err(e) = engine.set_minutes(input) {
                println!("\n{}", e);
            }
            None
        }
        "q" => return false,
        _ => {
            println!("\n{}", TIMER_HELP);
            None
        }
    };

    if let Some(event) = event {
        announce(&event, engine, notify);
    }
    true
}

async fn run_timer(store: &mut TaskStore, task_id: Uuid, notify: bool) -> Result<()> {
    let mut engine = PomodoroEngine::new(store, task_id);
    if let Some(task) = store.task(task_id) {
        println!("{}", task.title);
    }
    if engine.session_count() == 0 {
        println!("No open subtasks. Add some with `habit sub add` or `habit breakdown`.");
    }
    println!("{}", TIMER_HELP);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut stdin_open = true;
    let mut interval = ticker::interval();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    engine.start();
    render_timer(&engine);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(event) = engine.tick(store) {
                    announce(&event, &engine, notify);
                }
                render_timer(&engine);
            }
            line = rx.recv(), if stdin_open => {
                match line {
                    Some(line) => {
                        if !handle_timer_input(&line, &mut engine, store, notify) {
                            break;
                        }
                        engine.sync(store);
                        render_timer(&engine);
                    }
                    None => stdin_open = false,
                }
            }
            _ = &mut ctrl_c => break,
        }
    }

    println!();
    println!(
        "{} session(s) completed, {} on the clock",
        engine.completed_sessions(),
        format_minutes(engine.total_elapsed_secs() / 60)
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env();
    logging::init_logging(settings.log_format);

    let cli = Cli::parse();
    let today = Local::now().date_naive();

    if let Some(Commands::Init) = cli.command {
        let data_dir = init_local_data_dir()?;
        println!("Initialized data directory: {}", data_dir.display());
        println!();
        println!("Habit Builder will now use this local directory for task storage.");
        println!("Run 'habit seed' to load sample tasks.");
        return Ok(());
    }

    let (mut store, data_dir) = open_store(&settings)?;

    match cli.command {
        None => print_home(&store, today),
        Some(Commands::Init) => {}
        Some(Commands::Add { title, description, category, minutes, priority, due }) => {
            let title = require_title(&title)?;
            let description = description.unwrap_or_default();
            let estimated = minutes.unwrap_or_else(|| estimate_task_time(&title, &description));
            let draft = TaskDraft {
                title: Some(title),
                description: Some(description),
                category: category.filter(|c| !c.trim().is_empty()),
                estimated_minutes: Some(estimated),
                priority,
                due_date: due.as_deref().map(parse_due).transpose()?,
                ai_generated: false,
            };
            let id = store.add_task(draft);
            println!("Added task {}", short_id(id));
        }
        Some(Commands::List { filter }) => {
            let tasks = filter_tasks(store.tasks(), filter);
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in &tasks {
                print_task_line(task);
            }
            let owned: Vec<Task> = tasks.into_iter().cloned().collect();
            let (estimate, actual) = compute_totals(&owned);
            println!();
            println!("{} estimated, {} recorded", format_minutes(estimate), format_minutes(actual));
        }
        Some(Commands::Show { id }) => print_task_details(&find_task(&store, &id)?),
        Some(Commands::Done { id, undo }) => {
            let task = find_task(&store, &id)?;
            store.complete_task(task.id, !undo);
            println!("{} '{}'", if undo { "Reopened" } else { "Completed" }, task.title);
        }
        Some(Commands::Delete { id }) => {
            let task = find_task(&store, &id)?;
            store.delete_task(task.id);
            println!("Deleted '{}'", task.title);
        }
        Some(Commands::Edit { id, title, description, category, minutes, actual, due, clear_due }) => {
            let task_id = resolve_task(&store, &id)?;
            let due_date = match (due, clear_due) {
                (_, true) => Some(None),
                (Some(due), false) => Some(Some(parse_due(&due)?)),
                (None, false) => None,
            };
            let update = TaskUpdate {
                title: title.as_deref().map(require_title).transpose()?,
                description,
                due_date,
                category: category.map(|c| Some(c).filter(|c| !c.trim().is_empty())),
                estimated_minutes: minutes,
                actual_minutes: actual.map(Some),
                ..TaskUpdate::default()
            };
            store.update_task(task_id, update);
        }
        Some(Commands::SetPriority { id, level }) => {
            let task_id = resolve_task(&store, &id)?;
            store.assign_priority(task_id, level);
        }
        Some(Commands::Sort) => {
            store.auto_assign_priorities();
            for task in store.tasks() {
                print_task_line(task);
            }
        }
        Some(Commands::Sub { action }) => cmd_sub(&mut store, action)?,
        Some(Commands::Breakdown { id, replace }) => {
            let gateway = AiGateway::from_settings(&settings)?;
            cmd_breakdown(&mut store, &gateway, &id, replace).await?;
        }
        Some(Commands::Dump { text }) => {
            let gateway = AiGateway::from_settings(&settings)?;
            cmd_dump(&mut store, &gateway, &text.join(" "), today).await?;
        }
        Some(Commands::Calendar { date }) => {
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
            let tasks = tasks_for_date(store.tasks(), date);
            println!("{}", date.format("%A, %B %-d, %Y"));
            if tasks.is_empty() {
                println!("  No tasks for this day");
            }
            for task in tasks {
                print!("  ");
                print_task_line(task);
            }
        }
        Some(Commands::Stats { record }) => cmd_stats(&mut store, today, record),
        Some(Commands::Insights) => {
            let gateway = AiGateway::from_settings(&settings)?;
            cmd_insights(&store, &gateway, today).await;
        }
        Some(Commands::Report { date, output }) => {
            let report_date = date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
            let output_path = output
                .map(PathBuf::from)
                .unwrap_or_else(|| default_report_path(&data_dir, report_date));

            println!("Generating report for {}...", report_date);
            let report_path = generate_report(store.state(), report_date, output_path)?;
            println!("Report generated: {}", report_path.display());
        }
        Some(Commands::Timing { work, short_break, long_break, sessions }) => {
            let current = store.pomodoro_settings();
            if work.is_some() || short_break.is_some() || long_break.is_some() || sessions.is_some() {
                store.update_pomodoro_settings(PomodoroSettings::with_fallbacks(
                    work.unwrap_or(current.work_duration),
                    short_break.unwrap_or(current.short_break_duration),
                    long_break.unwrap_or(current.long_break_duration),
                    sessions.unwrap_or(current.sessions_before_long_break),
                ));
            }
            let s = store.pomodoro_settings();
            println!("work        {}m", s.work_duration);
            println!("short break {}m", s.short_break_duration);
            println!("long break  {}m", s.long_break_duration);
            println!("long break after {} sessions", s.sessions_before_long_break);
        }
        Some(Commands::Timer { id }) => {
            let task_id = match id {
                Some(id) => resolve_task(&store, &id)?,
                None => match active_newest_first(store.tasks()).first() {
                    Some(task) => task.id,
                    None => bail!("No open tasks to focus on"),
                },
            };
            run_timer(&mut store, task_id, settings.notifications).await?;
        }
        Some(Commands::Seed) => {
            let (tasks, stats) = bootstrap(&mut store, today);
            println!("Added {} sample task(s) and {} day(s) of stats", tasks, stats);
        }
        Some(Commands::Clear { yes }) => {
            if !yes {
                bail!("This deletes every task and statistic. Re-run with --yes to confirm");
            }
            let kv = FileKeyValueStore::new(&data_dir);
            let backup = backup_file(kv.path_for(STORE_KEY))?;
            store.clear_all();
            println!("Cleared all tasks. Previous data saved to {}", backup.display());
        }
    }

    Ok(())
}
