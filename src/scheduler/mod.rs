pub mod alarm;

use crate::analyzer::{DailyAnalysis, daily_analysis};
use crate::model::{Reminder, local_midnight, today};
use crate::notification::{
    Notifier, daily_summary_notification, dispatch_blocking, reminder_notification,
};
use crate::repository::{DailyEntryRepository, ReminderRepository, TodoRepository};
use alarm::{AlarmKey, AlarmManager};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveTime};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Instant at which a reminder's notification should fire.
pub fn reminder_trigger_time(reminder: &Reminder, minutes_before: u32) -> DateTime<Local> {
    reminder.date_time - Duration::minutes(i64::from(minutes_before))
}

/// Last millisecond of the local day containing `now`.
pub fn end_of_day(now: DateTime<Local>) -> DateTime<Local> {
    let tomorrow = now.date_naive() + Duration::days(1);
    local_midnight(tomorrow) - Duration::milliseconds(1)
}

pub fn time_left_in_day(now: DateTime<Local>) -> Duration {
    end_of_day(now) - now
}

/// The moment one minute is left in the day containing `now`.
pub fn day_end_threshold(now: DateTime<Local>) -> DateTime<Local> {
    end_of_day(now) - Duration::minutes(1)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub scheduled: usize,
    pub cancelled: usize,
}

/// Keeps one alarm per active reminder.
#[derive(Clone)]
pub struct ReminderScheduler {
    alarms: AlarmManager,
    reminders: ReminderRepository,
    notifier: Arc<dyn Notifier>,
}

impl ReminderScheduler {
    pub fn new(
        alarms: AlarmManager,
        reminders: ReminderRepository,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            alarms,
            reminders,
            notifier,
        }
    }

    pub fn schedule_reminder(&self, reminder: &Reminder) -> bool {
        self.schedule_reminder_with_delay(reminder, reminder.notify_before_minutes)
    }

    pub fn schedule_contest_reminder(&self, reminder: &Reminder) -> bool {
        self.schedule_reminder_with_delay(reminder, reminder.notify_before_minutes)
    }

    /// Registers a one-shot alarm `minutes_before` ahead of the reminder.
    /// Returns false, without registering anything, when that moment has passed.
    pub fn schedule_reminder_with_delay(&self, reminder: &Reminder, minutes_before: u32) -> bool {
        let trigger_at = reminder_trigger_time(reminder, minutes_before);

        if trigger_at <= Local::now() {
            debug!(
                id = reminder.id,
                trigger_at = %trigger_at,
                "reminder trigger time already passed; not scheduled"
            );
            return false;
        }

        let id = reminder.id;
        let reminders = self.reminders.clone();
        let notifier = Arc::clone(&self.notifier);

        self.alarms.set_exact(AlarmKey::Reminder(id), trigger_at, move || {
            fire_reminder(reminders, notifier, id, minutes_before)
        });

        info!(id, trigger_at = %trigger_at, minutes_before, "reminder scheduled");
        true
    }

    pub fn cancel_reminder(&self, id: i64) {
        if self.alarms.cancel(AlarmKey::Reminder(id)) {
            info!(id, "reminder alarm cancelled");
        }
    }

    pub fn is_scheduled(&self, id: i64) -> bool {
        self.alarms.is_pending(AlarmKey::Reminder(id))
    }

    pub fn cancel_all(&self) -> usize {
        self.alarms
            .pending_keys()
            .into_iter()
            .filter(|key| matches!(key, AlarmKey::Reminder(_)))
            .filter(|key| self.alarms.cancel(*key))
            .count()
    }

    /// Brings pending alarms in line with the stored reminders, which other
    /// processes may have changed.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let active = self.reminders.active_reminders().await?;
        let active_ids = active.iter().map(|reminder| reminder.id).collect::<HashSet<_>>();

        let cancelled = self
            .alarms
            .pending_keys()
            .into_iter()
            .filter(|key| matches!(key, AlarmKey::Reminder(id) if !active_ids.contains(id)))
            .filter(|key| self.alarms.cancel(*key))
            .count();

        let now = Local::now();
        let scheduled = active
            .iter()
            .filter(|reminder| !self.is_scheduled(reminder.id))
            .filter(|reminder| {
                reminder_trigger_time(reminder, reminder.notify_before_minutes) > now
            })
            .filter(|reminder| self.schedule_reminder(reminder))
            .count();

        Ok(ReconcileOutcome {
            scheduled,
            cancelled,
        })
    }
}

async fn fire_reminder(
    reminders: ReminderRepository,
    notifier: Arc<dyn Notifier>,
    id: i64,
    minutes_before: u32,
) {
    let reminder = match reminders.reminder_by_id(id).await {
        Ok(Some(reminder)) if reminder.is_active => reminder,
        Ok(_) => {
            info!(id, "reminder removed or inactive; notification skipped");
            return;
        }
        Err(error) => {
            error!(error = %error, id, "failed to load reminder for alarm");
            return;
        }
    };

    let notification = reminder_notification(&reminder, minutes_before);
    if !dispatch_blocking(notifier, notification).await {
        warn!(id, "reminder notification was not delivered");
    }
}

/// Daily summary delivery: a repeating wall-clock alarm plus the day-end
/// threshold alarm used while the Today screen is open.
#[derive(Clone)]
pub struct DailySummaryScheduler {
    alarms: AlarmManager,
    daily_entries: DailyEntryRepository,
    todos: TodoRepository,
    notifier: Arc<dyn Notifier>,
}

impl DailySummaryScheduler {
    pub fn new(
        alarms: AlarmManager,
        daily_entries: DailyEntryRepository,
        todos: TodoRepository,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            alarms,
            daily_entries,
            todos,
            notifier,
        }
    }

    /// Fires every day at `time`; tomorrow first if today's slot has passed.
    pub fn schedule_daily_summary(&self, time: NaiveTime) -> Result<DateTime<Local>> {
        let this = self.clone();
        let first = self
            .alarms
            .set_daily(AlarmKey::DailySummary, time, move || {
                let this = this.clone();
                async move { this.fire().await }
            })
            .context("Failed to schedule daily summary")?;

        info!(first_run = %first, time = %time.format("%H:%M"), "daily summary scheduled");
        Ok(first)
    }

    pub fn cancel_daily_summary(&self) {
        self.alarms.cancel(AlarmKey::DailySummary);
    }

    pub fn next_daily_summary(&self) -> Option<DateTime<Local>> {
        self.alarms.next_trigger(AlarmKey::DailySummary)
    }

    /// One-shot alarm for the moment one minute is left today.
    pub fn schedule_day_end_threshold(&self) -> Option<DateTime<Local>> {
        let now = Local::now();
        let trigger_at = day_end_threshold(now);
        if trigger_at <= now {
            return None;
        }

        let this = self.clone();
        self.alarms
            .set_exact(AlarmKey::DayEndThreshold, trigger_at, move || async move {
                this.fire().await
            });

        debug!(trigger_at = %trigger_at, "day-end summary alarm armed");
        Some(trigger_at)
    }

    pub fn cancel_day_end_threshold(&self) {
        self.alarms.cancel(AlarmKey::DayEndThreshold);
    }

    /// Reads today's data fresh from the store.
    pub async fn summarize_today(&self) -> Result<DailyAnalysis> {
        let date = today();
        let entry = self.daily_entries.daily_entry(date).await?;
        let todos = self.todos.todos_for_date(date).await?;

        Ok(daily_analysis(entry.as_ref(), &todos))
    }

    pub async fn show_daily_summary_notification(&self, analysis: &DailyAnalysis) -> bool {
        dispatch_blocking(Arc::clone(&self.notifier), daily_summary_notification(analysis)).await
    }

    async fn fire(&self) {
        match self.summarize_today().await {
            Ok(analysis) => {
                self.show_daily_summary_notification(&analysis).await;
            }
            Err(error) => error!(error = %error, "failed to build daily summary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DailySummaryScheduler, ReminderScheduler, day_end_threshold, end_of_day,
        reminder_trigger_time, time_left_in_day,
    };
    use crate::model::{DailyEntry, Platform, Reminder, ReminderInput, TodoInput, today};
    use crate::notification::Channel;
    use crate::notification::testing::RecordingNotifier;
    use crate::repository::Repositories;
    use crate::scheduler::alarm::AlarmManager;
    use crate::store::Store;
    use chrono::{Duration, Local, Timelike};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Harness {
        repos: Repositories,
        alarms: AlarmManager,
        notifier: Arc<RecordingNotifier>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::open(&dir.path().join("grindlog.db")).expect("store opens");

        Harness {
            repos: Repositories::new(store),
            alarms: AlarmManager::default(),
            notifier: Arc::new(RecordingNotifier::default()),
            _dir: dir,
        }
    }

    impl Harness {
        fn reminders(&self) -> ReminderScheduler {
            ReminderScheduler::new(
                self.alarms.clone(),
                self.repos.reminders.clone(),
                self.notifier.clone(),
            )
        }

        fn summaries(&self) -> DailySummaryScheduler {
            DailySummaryScheduler::new(
                self.alarms.clone(),
                self.repos.daily_entries.clone(),
                self.repos.todos.clone(),
                self.notifier.clone(),
            )
        }

        async fn insert_reminder(&self, offset: Duration, notify_before_minutes: u32) -> Reminder {
            let id = self
                .repos
                .reminders
                .insert(ReminderInput {
                    title: "Weekly contest".to_string(),
                    description: String::new(),
                    date_time: Local::now() + offset,
                    is_contest_reminder: false,
                    platform: None,
                    notify_before_minutes,
                })
                .await
                .expect("insert");

            self.repos
                .reminders
                .reminder_by_id(id)
                .await
                .expect("query")
                .expect("exists")
        }
    }

    #[tokio::test]
    async fn future_trigger_is_registered() {
        let harness = harness();
        let scheduler = harness.reminders();
        let reminder = harness.insert_reminder(Duration::hours(2), 60).await;

        let expected = reminder.date_time - Duration::hours(1);
        assert_eq!(reminder_trigger_time(&reminder, 60), expected);

        assert!(scheduler.schedule_reminder_with_delay(&reminder, 60));
        assert!(scheduler.is_scheduled(reminder.id));
    }

    #[tokio::test]
    async fn past_trigger_is_skipped() {
        let harness = harness();
        let scheduler = harness.reminders();
        let reminder = harness.insert_reminder(Duration::hours(2), 60).await;

        assert!(!scheduler.schedule_reminder_with_delay(&reminder, 180));
        assert!(!scheduler.is_scheduled(reminder.id));
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let harness = harness();
        let scheduler = harness.reminders();
        let reminder = harness.insert_reminder(Duration::hours(2), 60).await;
        scheduler.schedule_reminder(&reminder);

        scheduler.cancel_reminder(reminder.id);
        scheduler.cancel_reminder(reminder.id);
        assert!(!scheduler.is_scheduled(reminder.id));
    }

    #[tokio::test]
    async fn firing_rereads_reminder_and_notifies() {
        let harness = harness();
        let scheduler = harness.reminders();
        let reminder = harness.insert_reminder(Duration::milliseconds(300), 0).await;

        assert!(scheduler.schedule_reminder(&reminder));
        for _ in 0..40 {
            if !harness.notifier.sent().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        let sent = harness.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, Channel::Reminders);
        assert_eq!(sent[0].body, "Reminder: Weekly contest");
        assert!(!scheduler.is_scheduled(reminder.id));
    }

    #[tokio::test]
    async fn deleted_reminder_does_not_notify() {
        let harness = harness();
        let scheduler = harness.reminders();
        let reminder = harness.insert_reminder(Duration::milliseconds(200), 0).await;
        assert!(scheduler.schedule_reminder(&reminder));

        harness.repos.reminders.delete(reminder.id).await.expect("delete");
        tokio::time::sleep(std::time::Duration::from_millis(600)).await;

        assert!(harness.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn reconcile_schedules_and_cancels() {
        let harness = harness();
        let scheduler = harness.reminders();
        let kept = harness.insert_reminder(Duration::hours(3), 60).await;
        let removed = harness.insert_reminder(Duration::hours(4), 60).await;
        let expired = harness.insert_reminder(Duration::minutes(-5), 60).await;

        scheduler.schedule_reminder(&removed);
        harness.repos.reminders.delete(removed.id).await.expect("delete");

        let outcome = scheduler.reconcile().await.expect("reconcile");
        assert_eq!(outcome.scheduled, 1);
        assert_eq!(outcome.cancelled, 1);
        assert!(scheduler.is_scheduled(kept.id));
        assert!(!scheduler.is_scheduled(removed.id));
        assert!(!scheduler.is_scheduled(expired.id));

        let again = scheduler.reconcile().await.expect("reconcile");
        assert_eq!(again.scheduled, 0);
        assert_eq!(again.cancelled, 0);
    }

    #[tokio::test]
    async fn summary_rereads_store() {
        let harness = harness();
        let summaries = harness.summaries();

        let mut entry = DailyEntry::empty(today());
        entry.counts.set(Platform::LeetCode, 3);
        entry.targets.set(Platform::LeetCode, 4);
        harness
            .repos
            .daily_entries
            .insert_or_update(entry)
            .await
            .expect("upsert");
        harness
            .repos
            .todos
            .insert(TodoInput {
                title: "review".to_string(),
                description: String::new(),
                date: today(),
            })
            .await
            .expect("todo");

        let analysis = summaries.summarize_today().await.expect("summary");
        assert_eq!(analysis.total_problems, 3);
        assert_eq!(analysis.total_todos, 1);

        assert!(summaries.show_daily_summary_notification(&analysis).await);
        let sent = harness.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, Channel::DailySummary);
        assert!(sent[0].body.contains("Problems solved: 3 (75% of target)"));
    }

    #[tokio::test]
    async fn daily_summary_alarm_is_pending_until_cancelled() {
        let harness = harness();
        let summaries = harness.summaries();
        let time = chrono::NaiveTime::from_hms_opt(23, 55, 0).expect("valid time");

        let first = summaries.schedule_daily_summary(time).expect("scheduled");
        assert!(first > Local::now());
        assert_eq!((first.hour(), first.minute()), (23, 55));
        assert_eq!(summaries.next_daily_summary(), Some(first));

        summaries.cancel_daily_summary();
        assert_eq!(summaries.next_daily_summary(), None);
    }

    #[test]
    fn day_boundaries() {
        let now = Local::now();
        let end = end_of_day(now);

        assert_eq!(end.date_naive(), now.date_naive());
        assert!(time_left_in_day(now) > Duration::zero());
        assert_eq!(end - day_end_threshold(now), Duration::minutes(1));
    }
}
