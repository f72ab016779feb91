use crate::analyzer::{DailyAnalysis, daily_analysis};
use crate::model::{DailyEntry, JournalNote, Platform, Todo, today};
use crate::notification::{Channel, Notification, Notifier, dispatch_blocking};
use crate::repository::Repositories;
use crate::scheduler::alarm::{AlarmKey, AlarmManager};
use crate::scheduler::{DailySummaryScheduler, ReminderScheduler};
use crate::store::follow;
use crate::viewmodel::AppContext;
use anyhow::Result;
use chrono::{DateTime, Duration, Local};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

const TEST_REMINDER_ID: i64 = 9999;
const TEST_CONTEST_ID: i64 = 9998;
const SCHEDULED_TEST_ID: i64 = 9997;
const SCHEDULED_TEST_DELAY_SECONDS: i64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataWipe {
    pub daily_entries: usize,
    pub todos: usize,
    pub reminders: usize,
    pub journal_notes: usize,
    pub cancelled_alarms: usize,
}

/// Journal browsing, data management and notification diagnostics.
pub struct ProfileViewModel {
    repos: Repositories,
    alarms: AlarmManager,
    reminder_scheduler: ReminderScheduler,
    summary_scheduler: DailySummaryScheduler,
    notifier: Arc<dyn Notifier>,
    notes: watch::Receiver<Vec<JournalNote>>,
    search_query: watch::Sender<String>,
    debug_log: watch::Sender<Vec<String>>,
}

impl ProfileViewModel {
    pub async fn new(context: &AppContext) -> Result<Self> {
        let notes = follow(context.repos.journal_notes.all_journal_notes_live()).await?;

        Ok(Self {
            repos: context.repos.clone(),
            alarms: context.alarms.clone(),
            reminder_scheduler: context.reminder_scheduler.clone(),
            summary_scheduler: context.summary_scheduler.clone(),
            notifier: Arc::clone(&context.notifier),
            notes,
            search_query: watch::channel(String::new()).0,
            debug_log: watch::channel(Vec::new()).0,
        })
    }

    pub fn update_search_query(&self, query: &str) {
        self.search_query.send_replace(query.to_string());
    }

    /// All notes when the query is blank, otherwise a title/content match.
    pub async fn filtered_journal_notes(&self) -> Result<Vec<JournalNote>> {
        let query = self.search_query.borrow().trim().to_string();
        if query.is_empty() {
            return Ok(self.notes.borrow().clone());
        }

        self.repos.journal_notes.search_live(query).fetch().await
    }

    pub async fn journal_note(&self, id: i64) -> Result<Option<JournalNote>> {
        self.repos.journal_notes.journal_note_by_id(id).await
    }

    pub async fn delete_journal_note(&self, id: i64) -> Result<bool> {
        let deleted = self.repos.journal_notes.delete(id).await? > 0;
        if deleted {
            info!(id, "journal note deleted");
        }
        Ok(deleted)
    }

    /// Empties all four tables and cancels every reminder alarm.
    pub async fn delete_all_data(&self) -> Result<DataWipe> {
        let wipe = DataWipe {
            daily_entries: self.repos.daily_entries.delete_all().await?,
            journal_notes: self.repos.journal_notes.delete_all().await?,
            reminders: self.repos.reminders.delete_all().await?,
            todos: self.repos.todos.delete_all().await?,
            cancelled_alarms: self.reminder_scheduler.cancel_all(),
        };

        info!(
            daily_entries = wipe.daily_entries,
            todos = wipe.todos,
            reminders = wipe.reminders,
            journal_notes = wipe.journal_notes,
            "all data deleted"
        );
        Ok(wipe)
    }

    pub fn debug_log(&self) -> Vec<String> {
        self.debug_log.borrow().clone()
    }

    pub fn clear_debug_log(&self) {
        self.debug_log.send_replace(Vec::new());
    }

    pub async fn test_reminder_notification(&self) -> bool {
        self.add_debug_log("Testing reminder notification...");
        let notification = Notification {
            id: TEST_REMINDER_ID,
            channel: Channel::Reminders,
            title: "Test Reminder".to_string(),
            body: "This is a test reminder notification. If you see this, reminders are working!"
                .to_string(),
        };

        let sent = self.send(notification).await;
        self.log_outcome("Reminder notification", sent);
        sent
    }

    pub async fn test_contest_notification(&self) -> bool {
        self.add_debug_log("Testing contest notification...");
        let notification = Notification {
            id: TEST_CONTEST_ID,
            channel: Channel::Contests,
            title: "Contest Starting Soon!".to_string(),
            body: "LeetCode Weekly Contest starts in 1 hour. Get ready to code!".to_string(),
        };

        let sent = self.send(notification).await;
        self.log_outcome("Contest notification", sent);
        sent
    }

    pub async fn test_daily_summary_notification(&self) -> bool {
        self.add_debug_log("Testing daily summary notification...");

        let sent = self
            .summary_scheduler
            .show_daily_summary_notification(&sample_analysis())
            .await;
        self.log_outcome("Daily summary notification", sent);
        sent
    }

    /// Shows a reminder notification ten seconds from now. Returns the
    /// trigger instant.
    pub fn schedule_test_reminder(&self) -> DateTime<Local> {
        self.add_debug_log("Scheduling test reminder for 10 seconds...");

        let trigger_at = Local::now() + Duration::seconds(SCHEDULED_TEST_DELAY_SECONDS);
        let notifier = Arc::clone(&self.notifier);
        let notification = Notification {
            id: SCHEDULED_TEST_ID,
            channel: Channel::Reminders,
            title: "Scheduled Test Reminder".to_string(),
            body: "This reminder was scheduled 10 seconds ago for testing purposes".to_string(),
        };

        self.alarms
            .set_exact(AlarmKey::TestReminder, trigger_at, move || async move {
                dispatch_blocking(notifier, notification).await;
            });

        self.add_debug_log("Test reminder scheduled successfully");
        trigger_at
    }

    pub fn test_reminder_pending(&self) -> bool {
        self.alarms.is_pending(AlarmKey::TestReminder)
    }

    async fn send(&self, notification: Notification) -> bool {
        dispatch_blocking(Arc::clone(&self.notifier), notification).await
    }

    fn log_outcome(&self, what: &str, sent: bool) {
        if sent {
            self.add_debug_log(&format!("{what} sent successfully"));
        } else {
            self.add_debug_log(&format!("{what} failed"));
        }
    }

    fn add_debug_log(&self, message: &str) {
        let line = format!("[{}] {message}", Local::now().format("%H:%M:%S"));
        self.debug_log.send_modify(|lines| lines.push(line));
    }
}

/// LeetCode 3/4, Codeforces 2/4, four of six todos done.
fn sample_analysis() -> DailyAnalysis {
    let date = today();
    let mut entry = DailyEntry::empty(date);
    entry.counts.set(Platform::LeetCode, 3);
    entry.targets.set(Platform::LeetCode, 4);
    entry.counts.set(Platform::Codeforces, 2);
    entry.targets.set(Platform::Codeforces, 4);

    let todos = (0..6)
        .map(|index| Todo {
            id: index,
            title: format!("Sample todo {}", index + 1),
            description: String::new(),
            date,
            is_completed: index < 4,
            created_at: Local::now(),
        })
        .collect::<Vec<_>>();

    daily_analysis(Some(&entry), &todos)
}

#[cfg(test)]
mod tests {
    use super::{ProfileViewModel, sample_analysis};
    use crate::config::Config;
    use crate::model::{JournalNoteInput, ReminderInput, today};
    use crate::notification::Channel;
    use crate::viewmodel::reminder::{ReminderDraft, ReminderViewModel};
    use crate::viewmodel::testing::test_app;
    use chrono::{Duration, Local};
    use std::time::Duration as StdDuration;

    #[test]
    fn sample_analysis_matches_reference_day() {
        let analysis = sample_analysis();
        assert_eq!(analysis.total_problems, 5);
        assert_eq!(analysis.total_targets, 8);
        assert!((analysis.overall_completion_percentage - 62.5).abs() < 1e-4);
        assert_eq!(analysis.todos_completed, 4);
        assert_eq!(analysis.total_todos, 6);
    }

    #[tokio::test]
    async fn search_filters_journal_notes() {
        let app = test_app(Config::default());
        let journal = &app.context.repos.journal_notes;
        for (title, content) in [("Graphs", "Dijkstra with a heap"), ("DP", "Knapsack variants")] {
            journal
                .insert(JournalNoteInput {
                    title: title.to_string(),
                    content: content.to_string(),
                    date: today(),
                })
                .await
                .expect("insert");
        }

        let view_model = ProfileViewModel::new(&app.context).await.expect("view model");
        assert_eq!(view_model.filtered_journal_notes().await.expect("notes").len(), 2);

        view_model.update_search_query("knapsack");
        let found = view_model.filtered_journal_notes().await.expect("notes");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "DP");

        view_model.update_search_query("   ");
        assert_eq!(view_model.filtered_journal_notes().await.expect("notes").len(), 2);
    }

    #[tokio::test]
    async fn delete_all_data_clears_tables_and_alarms() {
        let app = test_app(Config::default());
        let reminders = ReminderViewModel::new(&app.context).await.expect("reminders");
        let at = Local::now() + Duration::hours(4);
        let saved = reminders
            .save_reminder(ReminderDraft {
                title: "Contest".to_string(),
                description: String::new(),
                date: at.date_naive(),
                time: at.format("%H:%M").to_string(),
                is_contest_reminder: false,
                platform: String::new(),
                notify_before_minutes: 60,
            })
            .await
            .expect("save")
            .expect("saved");
        app.context
            .repos
            .reminders
            .insert(ReminderInput {
                title: "Old".to_string(),
                description: String::new(),
                date_time: Local::now() - Duration::days(1),
                is_contest_reminder: false,
                platform: None,
                notify_before_minutes: 60,
            })
            .await
            .expect("insert");

        let view_model = ProfileViewModel::new(&app.context).await.expect("view model");
        let wipe = view_model.delete_all_data().await.expect("wipe");

        assert_eq!(wipe.reminders, 2);
        assert_eq!(wipe.cancelled_alarms, 1);
        assert!(!reminders.is_scheduled(saved.id));
        assert!(
            app.context
                .repos
                .reminders
                .active_reminders()
                .await
                .expect("query")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn notification_tests_use_their_channels() {
        let app = test_app(Config::default());
        let view_model = ProfileViewModel::new(&app.context).await.expect("view model");

        assert!(view_model.test_reminder_notification().await);
        assert!(view_model.test_contest_notification().await);
        assert!(view_model.test_daily_summary_notification().await);

        let channels = app
            .notifier
            .sent()
            .into_iter()
            .map(|notification| notification.channel)
            .collect::<Vec<_>>();
        assert_eq!(
            channels,
            vec![Channel::Reminders, Channel::Contests, Channel::DailySummary]
        );

        let log = view_model.debug_log();
        assert_eq!(log.len(), 6);
        assert!(log[1].ends_with("Reminder notification sent successfully"));

        view_model.clear_debug_log();
        assert!(view_model.debug_log().is_empty());
    }

    #[tokio::test]
    async fn scheduled_test_reminder_is_pending() {
        let app = test_app(Config::default());
        let view_model = ProfileViewModel::new(&app.context).await.expect("view model");

        let trigger_at = view_model.schedule_test_reminder();
        assert!(trigger_at > Local::now());
        assert!(view_model.test_reminder_pending());

        tokio::time::sleep(StdDuration::from_millis(100)).await;
        assert!(app.notifier.sent().is_empty());
        assert!(view_model.debug_log()[1].ends_with("Test reminder scheduled successfully"));
    }
}
