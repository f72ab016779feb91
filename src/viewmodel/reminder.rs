use crate::model::{Reminder, ReminderInput};
use crate::repository::ReminderRepository;
use crate::scheduler::ReminderScheduler;
use crate::store::combine_latest;
use crate::viewmodel::AppContext;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use tokio::sync::watch;
use tracing::info;

const FALLBACK_HOUR: u32 = 9;

/// Fields of the "add reminder" form.
#[derive(Debug, Clone)]
pub struct ReminderDraft {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    /// `HH:MM`; unreadable parts fall back to 09:00.
    pub time: String,
    pub is_contest_reminder: bool,
    pub platform: String,
    pub notify_before_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedReminder {
    pub id: i64,
    pub scheduled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderState {
    pub reminders: Vec<Reminder>,
    pub upcoming: Vec<Reminder>,
}

pub struct ReminderViewModel {
    reminders: ReminderRepository,
    scheduler: ReminderScheduler,
    state: watch::Receiver<ReminderState>,
}

impl ReminderViewModel {
    pub async fn new(context: &AppContext) -> Result<Self> {
        let reminders = context.repos.reminders.clone();
        let state = combine_latest(
            reminders.all_reminders_live(),
            reminders.upcoming_reminders_live(Local::now()),
            |all: &Vec<Reminder>, upcoming: &Vec<Reminder>| ReminderState {
                reminders: all.clone(),
                upcoming: upcoming.clone(),
            },
        )
        .await?;

        Ok(Self {
            reminders,
            scheduler: context.reminder_scheduler.clone(),
            state,
        })
    }

    pub fn snapshot(&self) -> ReminderState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReminderState> {
        self.state.clone()
    }

    /// Stores the reminder and schedules its alarm. Returns `None` when the
    /// title is blank.
    pub async fn save_reminder(&self, draft: ReminderDraft) -> Result<Option<SavedReminder>> {
        if draft.title.trim().is_empty() {
            return Ok(None);
        }

        let platform = draft
            .is_contest_reminder
            .then(|| draft.platform.trim().to_string())
            .filter(|platform| !platform.is_empty());

        let input = ReminderInput {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            date_time: combine_date_time(draft.date, &draft.time),
            is_contest_reminder: draft.is_contest_reminder,
            platform,
            notify_before_minutes: draft.notify_before_minutes,
        };
        let id = self.reminders.insert(input).await?;

        let reminder = self
            .reminders
            .reminder_by_id(id)
            .await?
            .with_context(|| format!("Reminder disappeared after insert: {id}"))?;
        let scheduled = if reminder.is_contest_reminder {
            self.scheduler.schedule_contest_reminder(&reminder)
        } else {
            self.scheduler.schedule_reminder(&reminder)
        };

        info!(id, scheduled, date_time = %reminder.date_time, "reminder saved");
        Ok(Some(SavedReminder { id, scheduled }))
    }

    /// Deletes the row first, then cancels the alarm.
    pub async fn delete_reminder(&self, id: i64) -> Result<bool> {
        let deleted = self.reminders.delete(id).await? > 0;
        self.scheduler.cancel_reminder(id);

        if deleted {
            info!(id, "reminder deleted");
        }
        Ok(deleted)
    }

    pub async fn toggle_reminder_active(&self, id: i64) -> Result<Reminder> {
        let mut reminder = self
            .reminders
            .reminder_by_id(id)
            .await?
            .with_context(|| format!("Reminder not found: {id}"))?;

        reminder.is_active = !reminder.is_active;
        self.reminders.update(reminder.clone()).await?;

        if reminder.is_active {
            self.scheduler.schedule_reminder(&reminder);
        } else {
            self.scheduler.cancel_reminder(id);
        }

        info!(id, active = reminder.is_active, "reminder toggled");
        Ok(reminder)
    }

    pub fn is_scheduled(&self, id: i64) -> bool {
        self.scheduler.is_scheduled(id)
    }
}

/// Joins a date with an `HH:MM` string at second zero.
pub fn combine_date_time(date: NaiveDate, time: &str) -> DateTime<Local> {
    let mut parts = time.split(':');
    let hour = parts
        .next()
        .and_then(|part| part.trim().parse::<u32>().ok())
        .unwrap_or(FALLBACK_HOUR);
    let minute = parts
        .next()
        .and_then(|part| part.trim().parse::<u32>().ok())
        .unwrap_or(0);

    let clock = NaiveTime::from_hms_opt(hour, minute, 0)
        .or_else(|| NaiveTime::from_hms_opt(FALLBACK_HOUR, 0, 0))
        .unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(clock);

    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}
