use crate::analyzer::DailyAnalysis;
use crate::analyzer::report::summary_message;
use crate::model::Reminder;
use anyhow::{Result, bail};
use serde::Serialize;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tokio::task;
use tracing::{error, info, warn};

pub const APP_NAME: &str = "GrindLog";
pub const DAILY_SUMMARY_NOTIFICATION_ID: i64 = 1001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Importance {
    High,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    Reminders,
    Contests,
    DailySummary,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Reminders, Channel::Contests, Channel::DailySummary];

    pub fn id(self) -> &'static str {
        match self {
            Channel::Reminders => "reminder_channel",
            Channel::Contests => "contest_channel",
            Channel::DailySummary => "daily_summary_channel",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Reminders => "Reminders",
            Channel::Contests => "Contest Alerts",
            Channel::DailySummary => "Daily Summary",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Channel::Reminders => "Notifications for custom reminders",
            Channel::Contests => "Notifications for upcoming contests",
            Channel::DailySummary => "Daily progress summary notifications",
        }
    }

    pub fn importance(self) -> Importance {
        match self {
            Channel::Reminders | Channel::Contests => Importance::High,
            Channel::DailySummary => Importance::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub channel: Channel,
    pub title: String,
    pub body: String,
}

pub trait Notifier: Send + Sync {
    fn show(&self, notification: &Notification) -> Result<()>;
}

/// Shows notifications through the desktop's notification tool.
#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_available(&self) -> bool {
        self.enabled && desktop_tool_available()
    }
}

impl Notifier for DesktopNotifier {
    fn show(&self, notification: &Notification) -> Result<()> {
        if !self.enabled {
            bail!("notifications are disabled in config");
        }

        send_desktop_notification(notification)
    }
}

/// Best-effort delivery: failures are logged and dropped.
pub fn dispatch(notifier: &dyn Notifier, notification: &Notification) -> bool {
    match notifier.show(notification) {
        Ok(()) => {
            info!(
                id = notification.id,
                channel = notification.channel.id(),
                title = %notification.title,
                "notification sent"
            );
            true
        }
        Err(error) => {
            warn!(
                error = %error,
                id = notification.id,
                channel = notification.channel.id(),
                "failed to send notification"
            );
            false
        }
    }
}

/// Runs [`dispatch`] on the blocking pool. A panicking notifier is logged and
/// counts as a failed send.
pub async fn dispatch_blocking(notifier: Arc<dyn Notifier>, notification: Notification) -> bool {
    let id = notification.id;
    match task::spawn_blocking(move || dispatch(notifier.as_ref(), &notification)).await {
        Ok(sent) => sent,
        Err(join_error) => {
            error!(error = %join_error, id, "notification task failed");
            false
        }
    }
}

pub fn reminder_notification(reminder: &Reminder, minutes_before: u32) -> Notification {
    if reminder.is_contest_reminder {
        let platform = reminder.platform.as_deref().unwrap_or("Upcoming");
        Notification {
            id: reminder.id,
            channel: Channel::Contests,
            title: "Contest Starting Soon!".to_string(),
            body: format!(
                "{platform} contest starts in {}. Get ready!",
                format_lead_time(minutes_before)
            ),
        }
    } else {
        let body = if reminder.description.trim().is_empty() {
            format!("Reminder: {}", reminder.title)
        } else {
            reminder.description.clone()
        };

        Notification {
            id: reminder.id,
            channel: Channel::Reminders,
            title: reminder.title.clone(),
            body,
        }
    }
}

pub fn daily_summary_notification(analysis: &DailyAnalysis) -> Notification {
    Notification {
        id: DAILY_SUMMARY_NOTIFICATION_ID,
        channel: Channel::DailySummary,
        title: "Daily Summary".to_string(),
        body: summary_message(analysis),
    }
}

pub fn format_lead_time(minutes: u32) -> String {
    match minutes {
        0..=59 => format!("{minutes} minutes"),
        60 => "1 hour".to_string(),
        61..=1439 => format!("{} hours", minutes / 60),
        _ => format!("{} days", minutes / 1440),
    }
}

#[cfg(target_os = "linux")]
fn send_desktop_notification(notification: &Notification) -> Result<()> {
    let urgency = match notification.channel.importance() {
        Importance::High => "critical",
        Importance::Default => "normal",
    };

    run_quiet(
        Command::new("notify-send")
            .arg("--app-name")
            .arg(APP_NAME)
            .arg("--urgency")
            .arg(urgency)
            .arg("--category")
            .arg(notification.channel.id())
            .arg(&notification.title)
            .arg(&notification.body),
    )
}

#[cfg(target_os = "macos")]
fn send_desktop_notification(notification: &Notification) -> Result<()> {
    let notified = run_quiet(
        Command::new("terminal-notifier")
            .args(["-title", APP_NAME, "-group"])
            .arg(notification.id.to_string())
            .arg("-subtitle")
            .arg(&notification.title)
            .arg("-message")
            .arg(&notification.body),
    );

    if notified.is_ok() {
        return Ok(());
    }

    let script = r#"
on run argv
    display notification (item 2 of argv) with title (item 1 of argv) subtitle (item 3 of argv)
end run
"#;

    run_quiet(
        Command::new("osascript")
            .arg("-e")
            .arg(script)
            .arg(APP_NAME)
            .arg(&notification.body)
            .arg(&notification.title),
    )
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn send_desktop_notification(_notification: &Notification) -> Result<()> {
    bail!("desktop notifications are only supported on Linux and macOS");
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn run_quiet(command: &mut Command) -> Result<()> {
    use anyhow::Context;

    let program = command.get_program().to_string_lossy().to_string();
    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("Failed to execute {program}"))?;

    if !status.success() {
        bail!("{program} exited with {status}");
    }

    Ok(())
}

fn desktop_tool_available() -> bool {
    let tool = if cfg!(target_os = "macos") {
        "osascript"
    } else if cfg!(target_os = "linux") {
        "notify-send"
    } else {
        return false;
    };

    Command::new("which")
        .arg(tool)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
