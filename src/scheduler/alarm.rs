use anyhow::{Context, Result};
use chrono::{
    DateTime, Duration as ChronoDuration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, error};

/// Identity of a pending alarm. Reminder ids and the fixed summary alarms
/// live in separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlarmKey {
    Reminder(i64),
    DailySummary,
    DayEndThreshold,
    TestReminder,
}

struct PendingAlarm {
    handle: JoinHandle<()>,
    trigger_at: DateTime<Local>,
    generation: u64,
}

#[derive(Default)]
struct AlarmTable {
    alarms: Mutex<HashMap<AlarmKey, PendingAlarm>>,
    generation: AtomicU64,
}

/// In-process alarm clock. At most one alarm is pending per key; setting a
/// key again replaces the earlier alarm.
#[derive(Clone, Default)]
pub struct AlarmManager {
    table: Arc<AlarmTable>,
}

impl AlarmManager {
    /// One-shot alarm. A trigger time in the past fires immediately.
    pub fn set_exact<F, Fut>(&self, key: AlarmKey, trigger_at: DateTime<Local>, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut alarms = self.lock();
        let generation = self.table.generation.fetch_add(1, Ordering::Relaxed);
        let table = Arc::clone(&self.table);

        let handle = tokio::spawn(async move {
            sleep(delay_until(trigger_at)).await;
            release(&table, key, generation);
            debug!(?key, "alarm fired");
            job().await;
        });

        let replaced = alarms.insert(
            key,
            PendingAlarm {
                handle,
                trigger_at,
                generation,
            },
        );
        if let Some(previous) = replaced {
            previous.handle.abort();
        }
    }

    /// Repeating alarm at `time` every local day. Returns the first trigger.
    pub fn set_daily<F, Fut>(
        &self,
        key: AlarmKey,
        time: NaiveTime,
        job: F,
    ) -> Result<DateTime<Local>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let first = next_occurrence(time, Local::now())?;

        let mut alarms = self.lock();
        let generation = self.table.generation.fetch_add(1, Ordering::Relaxed);
        let table = Arc::clone(&self.table);

        let handle = tokio::spawn(async move {
            let mut next_run = first;

            loop {
                sleep(delay_until(next_run)).await;
                debug!(?key, "daily alarm fired");
                job().await;

                let after = Local::now().max(next_run);
                next_run = match next_occurrence(time, after) {
                    Ok(value) => value,
                    Err(error) => {
                        error!(error = %error, ?key, "failed to compute next daily alarm");
                        release(&table, key, generation);
                        break;
                    }
                };

                let still_current = {
                    let mut alarms = lock_table(&table);
                    match alarms.get_mut(&key) {
                        Some(pending) if pending.generation == generation => {
                            pending.trigger_at = next_run;
                            true
                        }
                        _ => false,
                    }
                };
                if !still_current {
                    break;
                }
            }
        });

        let replaced = alarms.insert(
            key,
            PendingAlarm {
                handle,
                trigger_at: first,
                generation,
            },
        );
        if let Some(previous) = replaced {
            previous.handle.abort();
        }

        Ok(first)
    }

    /// Returns whether an alarm was pending. Cancelling twice is harmless.
    pub fn cancel(&self, key: AlarmKey) -> bool {
        match self.lock().remove(&key) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: AlarmKey) -> bool {
        self.lock().contains_key(&key)
    }

    pub fn next_trigger(&self, key: AlarmKey) -> Option<DateTime<Local>> {
        self.lock().get(&key).map(|pending| pending.trigger_at)
    }

    pub fn pending_keys(&self) -> Vec<AlarmKey> {
        let mut keys = self.lock().keys().copied().collect::<Vec<_>>();
        keys.sort();
        keys
    }

    pub fn cancel_all(&self) {
        for (_, pending) in self.lock().drain() {
            pending.handle.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AlarmKey, PendingAlarm>> {
        lock_table(&self.table)
    }
}

fn lock_table(table: &AlarmTable) -> MutexGuard<'_, HashMap<AlarmKey, PendingAlarm>> {
    table.alarms.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drops the table entry of a fired one-shot alarm unless it was replaced.
fn release(table: &AlarmTable, key: AlarmKey, generation: u64) {
    let mut alarms = lock_table(table);
    if alarms
        .get(&key)
        .is_some_and(|pending| pending.generation == generation)
    {
        alarms.remove(&key);
    }
}

pub fn delay_until(trigger_at: DateTime<Local>) -> Duration {
    (trigger_at - Local::now()).to_std().unwrap_or(Duration::ZERO)
}

/// First local instant at `time` strictly after `after`.
pub fn next_occurrence(time: NaiveTime, after: DateTime<Local>) -> Result<DateTime<Local>> {
    let today = after.date_naive();
    let candidate_today = resolve_local(today, time)?;

    if candidate_today > after {
        return Ok(candidate_today);
    }

    let tomorrow = today + ChronoDuration::days(1);
    resolve_local(tomorrow, time)
}

fn resolve_local(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Local>> {
    let naive = date.and_time(time);

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(datetime) => Ok(datetime),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Local
            .from_local_datetime(&(naive + ChronoDuration::hours(1)))
            .earliest()
            .context("Failed to convert schedule time"),
    }
}

#[cfg(test)]
mod tests {
    use super::{AlarmKey, AlarmManager, next_occurrence};
    use chrono::{Duration, Local, NaiveDate, NaiveTime, TimeZone};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn at(day: u32, hour: u32, minute: u32) -> chrono::DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2026, 7, day)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time");
        Local
            .from_local_datetime(&naive)
            .earliest()
            .expect("local time")
    }

    fn summary_time() -> NaiveTime {
        NaiveTime::from_hms_opt(23, 55, 0).expect("valid time")
    }

    #[test]
    fn next_occurrence_later_today() {
        let next = next_occurrence(summary_time(), at(10, 9, 0)).expect("next");
        assert_eq!(next, at(10, 23, 55));
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow() {
        let next = next_occurrence(summary_time(), at(10, 23, 56)).expect("next");
        assert_eq!(next, at(11, 23, 55));

        let exact = next_occurrence(summary_time(), at(10, 23, 55)).expect("next");
        assert_eq!(exact, at(11, 23, 55));
    }

    #[tokio::test]
    async fn one_shot_fires_and_releases_key() {
        let alarms = AlarmManager::default();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);

        alarms.set_exact(
            AlarmKey::Reminder(7),
            Local::now() + Duration::milliseconds(50),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert!(alarms.is_pending(AlarmKey::Reminder(7)));

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!alarms.is_pending(AlarmKey::Reminder(7)));
    }

    #[tokio::test]
    async fn replacing_a_key_aborts_the_earlier_alarm() {
        let alarms = AlarmManager::default();
        let fired = Arc::new(AtomicU32::new(0));

        for value in [1, 10] {
            let counter = Arc::clone(&fired);
            alarms.set_exact(
                AlarmKey::DayEndThreshold,
                Local::now() + Duration::milliseconds(50),
                move || async move {
                    counter.fetch_add(value, Ordering::SeqCst);
                },
            );
        }

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn cancelled_alarm_never_fires() {
        let alarms = AlarmManager::default();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);

        alarms.set_exact(
            AlarmKey::Reminder(3),
            Local::now() + Duration::milliseconds(100),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert!(alarms.cancel(AlarmKey::Reminder(3)));
        assert!(!alarms.cancel(AlarmKey::Reminder(3)));

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn keys_are_namespaced() {
        let alarms = AlarmManager::default();
        let later = Local::now() + Duration::hours(1);

        alarms.set_exact(AlarmKey::Reminder(1001), later, || async {});
        alarms
            .set_daily(AlarmKey::DailySummary, summary_time(), || async {})
            .expect("daily");

        assert_eq!(
            alarms.pending_keys(),
            vec![AlarmKey::Reminder(1001), AlarmKey::DailySummary]
        );

        alarms.cancel_all();
        assert!(alarms.pending_keys().is_empty());
    }
}
