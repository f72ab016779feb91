mod analyzer;
mod cli;
mod config;
mod db;
mod model;
mod notification;
mod repository;
mod scheduler;
mod store;
mod viewmodel;

use crate::analyzer::range::{DateRange, PlatformFilter};
use crate::analyzer::report::{render_daily_analysis, render_heatmap, render_platform_analytics};
use crate::cli::onboard::{confirm_wipe, run_onboarding};
use crate::cli::render::{
    render_journal_list, render_journal_note, render_reminders, render_today, render_todo_list,
    render_todos,
};
use crate::cli::{
    AnalysisCommands, Cli, Commands, ConfigCommands, JournalCommands, NotifyCommands,
    ReminderCommands, TodoCommands,
};
use crate::config::Config;
use crate::db::Database;
use crate::model::{
    Platform, PlatformCounts, local_midnight, parse_count, saturating_sum, today,
};
use crate::notification::{Channel, DesktopNotifier};
use crate::scheduler::DailySummaryScheduler;
use crate::scheduler::alarm::delay_until;
use crate::store::Store;
use crate::viewmodel::AppContext;
use crate::viewmodel::analysis::{AnalysisViewMode, AnalysisViewModel};
use crate::viewmodel::profile::ProfileViewModel;
use crate::viewmodel::reminder::{ReminderDraft, ReminderViewModel};
use crate::viewmodel::today::TodayViewModel;
use crate::viewmodel::todo::{TodoViewMode, TodoViewModel};
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status().await,
        Commands::Doctor => handle_doctor(),
        Commands::Today { date, watch, reset } => handle_today(date, watch, reset).await,
        Commands::Log {
            platform,
            count,
            date,
        } => handle_log(&platform, &count, date).await,
        Commands::Target {
            leetcode,
            codeforces,
            codechef,
            geeksforgeeks,
            date,
        } => {
            let requested = [
                (Platform::LeetCode, leetcode),
                (Platform::Codeforces, codeforces),
                (Platform::CodeChef, codechef),
                (Platform::GeeksforGeeks, geeksforgeeks),
            ];
            handle_target(requested, date).await
        }
        Commands::Todo { command } => handle_todo_command(command).await,
        Commands::Journal { command } => handle_journal_command(command).await,
        Commands::Reminder { command } => handle_reminder_command(command).await,
        Commands::Analysis { command } => handle_analysis_command(command).await,
        Commands::Notify { command } => handle_notify_command(command).await,
        Commands::Wipe { yes } => handle_wipe(yes).await,
        Commands::Service => {
            let config = load_config()?;
            run_service(config).await
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_create()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

async fn handle_status() -> Result<()> {
    let config = load_config()?;
    let app = open_app(config)?;
    let repos = &app.repos;
    let date = today();

    let entry = repos.daily_entries.daily_entry(date).await?;
    let week = repos
        .daily_entries
        .daily_entries_between_live(date - chrono::Duration::days(6), date)
        .fetch()
        .await?;
    let active_days = repos.daily_entries.entries_with_activity().await?.len();
    let reminders = repos.reminders.active_reminders().await?;
    let now = Local::now();

    println!("GrindLog status");
    println!("- db_path: {}", app.config.db_path.display());
    println!(
        "- solved_today: {} / {}",
        entry.as_ref().map_or(0, |entry| entry.counts.total()),
        entry.as_ref().map_or(0, |entry| entry.targets.total())
    );
    println!(
        "- solved_last_7_days: {}",
        saturating_sum(week.iter().map(|entry| entry.counts.total()))
    );
    println!("- active_days: {active_days}");
    println!("- active_reminders: {}", reminders.len());
    println!(
        "- next_reminder: {}",
        reminders
            .iter()
            .find(|reminder| reminder.date_time > now)
            .map(|reminder| format!(
                "{} ({})",
                reminder.title,
                reminder.date_time.format("%Y-%m-%d %H:%M")
            ))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "- daily_summary: {}",
        if app.config.daily_summary_enabled {
            app.config.summary_time.clone()
        } else {
            "disabled".to_string()
        }
    );

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = Config::load_or_create()?;

    match Database::open(&config.db_path) {
        Ok(_) => println!("[OK] SQLite reachable: {}", config.db_path.display()),
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    if let Err(error) = config.parse_summary_time() {
        println!("[WARN] invalid summary_time setting: {error}");
        issues.push("invalid summary_time".to_string());
    } else {
        println!("[OK] summary_time format valid: {}", config.summary_time);
    }

    let notifier = DesktopNotifier::new(config.notifications_enabled);
    if !config.notifications_enabled {
        println!("[OK] desktop notifications disabled");
    } else if notifier.is_available() {
        println!("[OK] desktop notification tool available");
    } else {
        println!("[WARN] desktop notification tool not found (notify-send or osascript)");
        issues.push("notification tool missing".to_string());
    }

    for channel in Channel::ALL {
        println!(
            "[OK] channel {} ({:?}): {}",
            channel.id(),
            channel.importance(),
            channel.description()
        );
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

async fn handle_today(date: Option<String>, watch: bool, reset: bool) -> Result<()> {
    let app = open_app(Config::load_or_create()?)?;
    let date = parse_optional_date(date)?;

    if reset {
        let removed = app.repos.daily_entries.delete(date).await?;
        println!("Removed {removed} entry for {date}");
        return Ok(());
    }

    let view_model = TodayViewModel::for_date(&app, date).await?;
    let time_left = || (date == today()).then(|| view_model.time_left_in_day());
    println!("{}", render_today(&view_model.snapshot(), time_left()));

    if !watch {
        return Ok(());
    }

    let mut state = view_model.subscribe();
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                println!("{}", render_today(&snapshot, time_left()));
            }
            _ = signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn handle_log(platform: &str, count: &str, date: Option<String>) -> Result<()> {
    let platform = platform.parse::<Platform>()?;
    let count = parse_count(count);
    let app = open_app(Config::load_or_create()?)?;
    let date = parse_optional_date(date)?;

    let view_model = TodayViewModel::for_date(&app, date).await?;
    view_model.update_platform_count(platform, count).await?;

    println!("Logged {count} {platform} problem(s) for {date}");
    Ok(())
}

async fn handle_target(
    requested: [(Platform, Option<String>); 4],
    date: Option<String>,
) -> Result<()> {
    if requested.iter().all(|(_, value)| value.is_none()) {
        bail!("Pass at least one of --leetcode, --codeforces, --codechef, --geeksforgeeks");
    }

    let app = open_app(Config::load_or_create()?)?;
    let date = parse_optional_date(date)?;

    let mut targets = app
        .repos
        .daily_entries
        .daily_entry(date)
        .await?
        .map_or(app.config.default_targets, |entry| entry.targets);
    for (platform, value) in &requested {
        if let Some(raw) = value {
            targets.set(*platform, parse_count(raw));
        }
    }

    let view_model = TodayViewModel::for_date(&app, date).await?;
    view_model.update_all_targets(targets).await?;

    println!("Targets for {date}: {}", describe_counts(&targets));
    Ok(())
}

async fn handle_todo_command(command: TodoCommands) -> Result<()> {
    let app = open_app(Config::load_or_create()?)?;

    match command {
        TodoCommands::Add { title, description } => {
            let view_model = TodoViewModel::new(&app).await?;
            let id = view_model
                .save_todo(&title, &description)
                .await?
                .context("Todo title must not be blank")?;
            println!("Todo added: #{id}");
        }
        TodoCommands::List { all, from, to } => {
            if let (Some(from), Some(to)) = (from, to) {
                let start = parse_date(&from)?;
                let end = parse_date(&to)?;
                let todos = app.repos.todos.todos_between(start, end).await?;
                println!("{}", render_todo_list(&format!("Todos {start} to {end}"), &todos));
                return Ok(());
            }

            let view_model = TodoViewModel::new(&app).await?;
            if all {
                view_model.update_view_mode(TodoViewMode::All);
            }
            println!("{}", render_todos(&view_model.snapshot()));
        }
        TodoCommands::Done { id } => {
            let view_model = TodoViewModel::new(&app).await?;
            let todo = view_model.toggle_todo_completion(id).await?;
            let state = if todo.is_completed { "done" } else { "open" };
            println!("Todo #{id} marked {state}");
        }
        TodoCommands::Delete { id } => {
            let view_model = TodoViewModel::new(&app).await?;
            if !view_model.delete_todo(id).await? {
                bail!("Todo not found: {id}");
            }
            println!("Todo #{id} deleted");
        }
    }

    Ok(())
}

async fn handle_journal_command(command: JournalCommands) -> Result<()> {
    let app = open_app(Config::load_or_create()?)?;

    match command {
        JournalCommands::Add {
            title,
            content,
            date,
        } => {
            let date = parse_optional_date(date)?;
            let view_model = TodayViewModel::for_date(&app, date).await?;
            let id = view_model
                .save_journal_note(&title, &content)
                .await?
                .context("Journal title and content must not be blank")?;
            println!("Journal note saved: #{id}");
        }
        JournalCommands::List { from, to } => {
            let notes = if let (Some(from), Some(to)) = (from, to) {
                app.repos
                    .journal_notes
                    .journal_notes_between(parse_date(&from)?, parse_date(&to)?)
                    .await?
            } else {
                ProfileViewModel::new(&app)
                    .await?
                    .filtered_journal_notes()
                    .await?
            };
            println!("{}", render_journal_list(&notes));
        }
        JournalCommands::Search { query } => {
            let view_model = ProfileViewModel::new(&app).await?;
            view_model.update_search_query(&query);
            println!("{}", render_journal_list(&view_model.filtered_journal_notes().await?));
        }
        JournalCommands::Show { id } => {
            let view_model = ProfileViewModel::new(&app).await?;
            let note = view_model
                .journal_note(id)
                .await?
                .with_context(|| format!("Journal note not found: {id}"))?;
            println!("{}", render_journal_note(&note));
        }
        JournalCommands::Edit { id, title, content } => {
            let mut note = app
                .repos
                .journal_notes
                .journal_note_by_id(id)
                .await?
                .with_context(|| format!("Journal note not found: {id}"))?;

            if let Some(title) = title.filter(|title| !title.trim().is_empty()) {
                note.title = title.trim().to_string();
            }
            if let Some(content) = content.filter(|content| !content.trim().is_empty()) {
                note.content = content;
            }
            app.repos.journal_notes.update(note).await?;
            println!("Journal note #{id} updated");
        }
        JournalCommands::Delete { id } => {
            let view_model = ProfileViewModel::new(&app).await?;
            if !view_model.delete_journal_note(id).await? {
                bail!("Journal note not found: {id}");
            }
            println!("Journal note #{id} deleted");
        }
    }

    Ok(())
}

async fn handle_reminder_command(command: ReminderCommands) -> Result<()> {
    let app = open_app(Config::load_or_create()?)?;
    let view_model = ReminderViewModel::new(&app).await?;

    match command {
        ReminderCommands::Add {
            title,
            date,
            time,
            description,
            contest,
            platform,
            notify_before,
        } => {
            let draft = ReminderDraft {
                title,
                description,
                date: parse_date(&date)?,
                time,
                is_contest_reminder: contest,
                platform,
                notify_before_minutes: notify_before
                    .unwrap_or(app.config.default_notify_before_minutes),
            };
            let saved = view_model
                .save_reminder(draft)
                .await?
                .context("Reminder title must not be blank")?;

            println!("Reminder added: #{}", saved.id);
            if !saved.scheduled {
                println!("Notification time already passed; no alarm set");
            }
        }
        ReminderCommands::List { upcoming } => {
            let state = view_model.snapshot();
            if upcoming {
                println!("{}", render_reminders("Upcoming reminders", &state.upcoming));
            } else {
                println!("{}", render_reminders("Reminders", &state.reminders));
            }
        }
        ReminderCommands::Toggle { id } => {
            let reminder = view_model.toggle_reminder_active(id).await?;
            let state = if reminder.is_active { "on" } else { "off" };
            println!("Reminder #{id} turned {state}");
        }
        ReminderCommands::Delete { id } => {
            if !view_model.delete_reminder(id).await? {
                bail!("Reminder not found: {id}");
            }
            println!("Reminder #{id} deleted");
        }
    }

    Ok(())
}

async fn handle_analysis_command(command: AnalysisCommands) -> Result<()> {
    let app = open_app(Config::load_or_create()?)?;
    let view_model = AnalysisViewModel::new(&app).await?;

    match command {
        AnalysisCommands::Range { range, platform } => {
            let range = range.parse::<DateRange>()?;
            let filter = platform.parse::<PlatformFilter>()?;
            view_model.update_view_mode(AnalysisViewMode::DateRange);
            view_model.update_date_range(range);
            view_model.update_platform_filter(filter);

            let analytics = view_model.platform_analytics();
            println!("{}", render_platform_analytics(range, filter, &analytics));
        }
        AnalysisCommands::Date { date } => {
            let date = parse_date(&date)?;
            view_model.update_view_mode(AnalysisViewMode::SpecificDate);
            view_model.update_specific_date(local_midnight(date));

            let analysis = view_model
                .specific_date_analysis()
                .await?
                .unwrap_or_default();
            println!("{}", render_daily_analysis(date, &analysis));
        }
        AnalysisCommands::Heatmap { days } => {
            println!("{}", render_heatmap(&view_model.heatmap(days)));
        }
    }

    Ok(())
}

async fn handle_notify_command(command: NotifyCommands) -> Result<()> {
    let app = open_app(Config::load_or_create()?)?;
    let view_model = ProfileViewModel::new(&app).await?;

    match command {
        NotifyCommands::TestReminder => {
            view_model.test_reminder_notification().await;
        }
        NotifyCommands::TestContest => {
            view_model.test_contest_notification().await;
        }
        NotifyCommands::TestSummary => {
            view_model.test_daily_summary_notification().await;
        }
        NotifyCommands::ScheduleTest => {
            let trigger_at = view_model.schedule_test_reminder();
            println!("Waiting until {} ...", trigger_at.format("%H:%M:%S"));

            tokio::select! {
                _ = tokio::time::sleep(delay_until(trigger_at) + Duration::from_secs(2)) => {}
                _ = signal::ctrl_c() => warn!("interrupted before the test reminder fired"),
            }
        }
    }

    for line in view_model.debug_log() {
        println!("{line}");
    }

    Ok(())
}

async fn handle_wipe(yes: bool) -> Result<()> {
    if !confirm_wipe(yes)? {
        println!("Nothing deleted");
        return Ok(());
    }

    let app = open_app(Config::load_or_create()?)?;
    let view_model = ProfileViewModel::new(&app).await?;
    let wipe = view_model.delete_all_data().await?;

    println!(
        "Deleted {} entries, {} todos, {} reminders, {} journal notes",
        wipe.daily_entries, wipe.todos, wipe.reminders, wipe.journal_notes
    );
    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    let fallback = config.clone();
    let reconcile_every = Duration::from_secs(config.reconcile_seconds);
    let app = open_app(config)?;

    let mut summary_schedule = None;
    apply_summary_schedule(&app.summary_scheduler, &fallback, &mut summary_schedule);

    info!("GrindLog service started");

    let mut interval = tokio::time::interval(reconcile_every);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let runtime_config = Config::load().unwrap_or_else(|_| fallback.clone());
                apply_summary_schedule(
                    &app.summary_scheduler,
                    &runtime_config,
                    &mut summary_schedule,
                );

                match app.reminder_scheduler.reconcile().await {
                    Ok(outcome) if outcome.scheduled + outcome.cancelled > 0 => {
                        info!(
                            scheduled = outcome.scheduled,
                            cancelled = outcome.cancelled,
                            "reminder alarms reconciled"
                        );
                    }
                    Ok(_) => {}
                    Err(error) => error!(error = %error, "failed to reconcile reminder alarms"),
                }
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    app.alarms.cancel_all();
    Ok(())
}

/// Re-arms the daily summary when its configured time or switch changed.
fn apply_summary_schedule(
    scheduler: &DailySummaryScheduler,
    config: &Config,
    current: &mut Option<NaiveTime>,
) {
    let wanted = if config.daily_summary_enabled {
        match config.parse_summary_time() {
            Ok(time) => Some(time),
            Err(error) => {
                error!(error = %error, "invalid summary_time; keeping previous schedule");
                return;
            }
        }
    } else {
        None
    };

    if wanted == *current {
        return;
    }

    match wanted {
        Some(time) => match scheduler.schedule_daily_summary(time) {
            Ok(_) => *current = Some(time),
            Err(error) => error!(error = %error, "failed to schedule daily summary"),
        },
        None => {
            scheduler.cancel_daily_summary();
            info!("daily summary disabled");
            *current = None;
        }
    }
}

fn open_app(config: Config) -> Result<AppContext> {
    config.ensure_bootstrap_files()?;
    let store = Store::open(&config.db_path)?;
    let notifier = Arc::new(DesktopNotifier::new(config.notifications_enabled));

    Ok(AppContext::new(store, notifier, config))
}

fn describe_counts(counts: &PlatformCounts) -> String {
    Platform::ALL
        .iter()
        .map(|platform| format!("{platform} {}", counts.get(*platform)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {input}. Example: 2026-02-18"))
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    input
        .as_deref()
        .map(parse_date)
        .transpose()
        .map(|date| date.unwrap_or_else(today))
}

fn load_config() -> Result<Config> {
    Config::load()
        .with_context(|| "Config file not found. Run `grindlog onboard` first.".to_string())
}
