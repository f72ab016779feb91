//! Presentation state. Each view-model publishes immutable snapshots through
//! a `watch` channel and turns user intents into repository calls.

pub mod analysis;
pub mod profile;
pub mod reminder;
pub mod today;
pub mod todo;

use crate::config::Config;
use crate::notification::Notifier;
use crate::repository::Repositories;
use crate::scheduler::alarm::AlarmManager;
use crate::scheduler::{DailySummaryScheduler, ReminderScheduler};
use crate::store::Store;
use std::sync::Arc;

/// Everything a view-model may depend on, built once per process.
#[derive(Clone)]
pub struct AppContext {
    pub repos: Repositories,
    pub alarms: AlarmManager,
    pub reminder_scheduler: ReminderScheduler,
    pub summary_scheduler: DailySummaryScheduler,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let repos = Repositories::new(store);
        let alarms = AlarmManager::default();

        let reminder_scheduler = ReminderScheduler::new(
            alarms.clone(),
            repos.reminders.clone(),
            Arc::clone(&notifier),
        );
        let summary_scheduler = DailySummaryScheduler::new(
            alarms.clone(),
            repos.daily_entries.clone(),
            repos.todos.clone(),
            Arc::clone(&notifier),
        );

        Self {
            repos,
            alarms,
            reminder_scheduler,
            summary_scheduler,
            notifier,
            config: Arc::new(config),
        }
    }
}
