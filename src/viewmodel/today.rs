use crate::analyzer::{DailyAnalysis, daily_analysis};
use crate::model::{
    DailyEntry, JournalNoteInput, Platform, PlatformCounts, Todo, today,
};
use crate::repository::{DailyEntryRepository, JournalNoteRepository};
use crate::scheduler::{DailySummaryScheduler, time_left_in_day};
use crate::store::combine_latest;
use crate::viewmodel::AppContext;
use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct TodayState {
    pub date: NaiveDate,
    pub entry: Option<DailyEntry>,
    pub todos: Vec<Todo>,
    pub analysis: DailyAnalysis,
}

/// Daily logging screen: one date's counts, targets and todos.
pub struct TodayViewModel {
    date: NaiveDate,
    daily_entries: DailyEntryRepository,
    journal_notes: JournalNoteRepository,
    summaries: DailySummaryScheduler,
    default_targets: PlatformCounts,
    state: watch::Receiver<TodayState>,
    day_end_armed: bool,
}

impl TodayViewModel {
    pub async fn new(context: &AppContext) -> Result<Self> {
        Self::for_date(context, today()).await
    }

    /// The day-end summary alarm is only armed when `date` is today.
    pub async fn for_date(context: &AppContext, date: NaiveDate) -> Result<Self> {
        let repos = &context.repos;
        let state = combine_latest(
            repos.daily_entries.daily_entry_live(date),
            repos.todos.todos_for_date_live(date),
            move |entry: &Option<DailyEntry>, todos: &Vec<Todo>| TodayState {
                date,
                entry: entry.clone(),
                todos: todos.clone(),
                analysis: daily_analysis(entry.as_ref(), todos),
            },
        )
        .await?;

        let day_end_armed = date == today()
            && context
                .summary_scheduler
                .schedule_day_end_threshold()
                .is_some();

        Ok(Self {
            date,
            daily_entries: repos.daily_entries.clone(),
            journal_notes: repos.journal_notes.clone(),
            summaries: context.summary_scheduler.clone(),
            default_targets: context.config.default_targets,
            state,
            day_end_armed,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn snapshot(&self) -> TodayState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TodayState> {
        self.state.clone()
    }

    pub async fn update_platform_count(&self, platform: Platform, count: u32) -> Result<()> {
        let mut entry = self.current_entry().await?;
        entry.counts.set(platform, count);
        self.daily_entries.insert_or_update(entry).await?;

        info!(date = %self.date, platform = platform.key(), count, "platform count updated");
        Ok(())
    }

    pub async fn update_all_targets(&self, targets: PlatformCounts) -> Result<()> {
        let mut entry = self.current_entry().await?;
        entry.targets = targets;
        self.daily_entries.insert_or_update(entry).await?;

        info!(date = %self.date, total = targets.total(), "targets updated");
        Ok(())
    }

    /// Returns the new note id, or `None` when title or content is blank.
    pub async fn save_journal_note(&self, title: &str, content: &str) -> Result<Option<i64>> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Ok(None);
        }

        let id = self
            .journal_notes
            .insert(JournalNoteInput {
                title: title.trim().to_string(),
                content: content.to_string(),
                date: self.date,
            })
            .await?;

        info!(id, date = %self.date, "journal note saved");
        Ok(Some(id))
    }

    pub fn time_left_in_day(&self) -> Duration {
        time_left_in_day(Local::now())
    }

    pub fn day_end_armed(&self) -> bool {
        self.day_end_armed
    }

    /// Stored entry for the date, or a fresh one carrying the default targets.
    async fn current_entry(&self) -> Result<DailyEntry> {
        Ok(self
            .daily_entries
            .daily_entry(self.date)
            .await?
            .unwrap_or_else(|| DailyEntry {
                targets: self.default_targets,
                ..DailyEntry::empty(self.date)
            }))
    }
}

impl Drop for TodayViewModel {
    fn drop(&mut self) {
        if self.day_end_armed {
            self.summaries.cancel_day_end_threshold();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TodayViewModel;
    use crate::config::Config;
    use crate::model::{Platform, PlatformCounts, TodoInput, today};
    use crate::scheduler::alarm::AlarmKey;
    use crate::viewmodel::testing::test_app;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn count_update_flows_into_analysis() {
        let app = test_app(Config::default());
        let view_model = TodayViewModel::new(&app.context).await.expect("view model");
        let mut state = view_model.subscribe();
        assert_eq!(view_model.snapshot().analysis.total_problems, 0);

        view_model
            .update_platform_count(Platform::LeetCode, 3)
            .await
            .expect("update");

        timeout(Duration::from_secs(2), state.changed())
            .await
            .expect("changes in time")
            .expect("sender alive");
        let snapshot = view_model.snapshot();
        assert_eq!(snapshot.analysis.total_problems, 3);
        assert_eq!(snapshot.entry.map(|entry| entry.count(Platform::LeetCode)), Some(3));
    }

    #[tokio::test]
    async fn new_entry_starts_from_default_targets() {
        let mut config = Config::default();
        config.default_targets.set(Platform::Codeforces, 2);
        let app = test_app(config);
        let view_model = TodayViewModel::new(&app.context).await.expect("view model");

        view_model
            .update_platform_count(Platform::Codeforces, 1)
            .await
            .expect("update");

        let stored = app
            .context
            .repos
            .daily_entries
            .daily_entry(today())
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(stored.target(Platform::Codeforces), 2);
        assert_eq!(stored.count(Platform::Codeforces), 1);
    }

    #[tokio::test]
    async fn targets_replace_without_touching_counts() {
        let app = test_app(Config::default());
        let view_model = TodayViewModel::new(&app.context).await.expect("view model");
        view_model
            .update_platform_count(Platform::CodeChef, 4)
            .await
            .expect("count");

        let mut targets = PlatformCounts::default();
        targets.set(Platform::CodeChef, 5);
        view_model.update_all_targets(targets).await.expect("targets");

        let stored = app
            .context
            .repos
            .daily_entries
            .daily_entry(today())
            .await
            .expect("query")
            .expect("exists");
        assert_eq!(stored.count(Platform::CodeChef), 4);
        assert_eq!(stored.targets, targets);
    }

    #[tokio::test]
    async fn todos_for_the_day_are_counted() {
        let app = test_app(Config::default());
        let view_model = TodayViewModel::new(&app.context).await.expect("view model");
        let mut state = view_model.subscribe();

        app.context
            .repos
            .todos
            .insert(TodoInput {
                title: "binary search".to_string(),
                description: String::new(),
                date: today(),
            })
            .await
            .expect("todo");

        timeout(Duration::from_secs(2), state.changed())
            .await
            .expect("changes in time")
            .expect("sender alive");
        assert_eq!(view_model.snapshot().analysis.total_todos, 1);
    }

    #[tokio::test]
    async fn blank_journal_note_is_ignored() {
        let app = test_app(Config::default());
        let view_model = TodayViewModel::new(&app.context).await.expect("view model");

        assert_eq!(view_model.save_journal_note("  ", "body").await.expect("save"), None);
        assert_eq!(view_model.save_journal_note("title", "").await.expect("save"), None);
        assert!(
            view_model
                .save_journal_note("Two pointers", "Sliding window recap")
                .await
                .expect("save")
                .is_some()
        );
    }

    #[tokio::test]
    async fn day_end_alarm_lives_with_the_view_model() {
        let app = test_app(Config::default());
        let view_model = TodayViewModel::new(&app.context).await.expect("view model");

        let pending = app.context.alarms.is_pending(AlarmKey::DayEndThreshold);
        assert_eq!(pending, view_model.day_end_armed());
        assert!(view_model.time_left_in_day() > chrono::Duration::zero());

        drop(view_model);
        assert!(!app.context.alarms.is_pending(AlarmKey::DayEndThreshold));
    }

    #[tokio::test]
    async fn past_date_does_not_arm_day_end_alarm() {
        let app = test_app(Config::default());
        let past = NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date");
        let view_model = TodayViewModel::for_date(&app.context, past)
            .await
            .expect("view model");

        assert!(!view_model.day_end_armed());
        assert_eq!(view_model.date(), past);
    }
}
