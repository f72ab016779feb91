//! Shared SQLite store with push-based change notification.
//!
//! Every write bumps a per-table revision. Live queries wait on that revision
//! and re-run their SQL, so a subscriber always sees the latest committed
//! state (intermediate states may be skipped). Commits made by other
//! processes are picked up by polling SQLite's `data_version` and bump every
//! table.

use crate::db::Database;
use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task;
use tracing::{debug, warn};

const EXTERNAL_CHANGE_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    DailyEntries,
    Todos,
    Reminders,
    JournalNotes,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::DailyEntries,
        Table::Todos,
        Table::Reminders,
        Table::JournalNotes,
    ];

    fn index(self) -> usize {
        match self {
            Table::DailyEntries => 0,
            Table::Todos => 1,
            Table::Reminders => 2,
            Table::JournalNotes => 3,
        }
    }
}

type QueryFn<T> = Arc<dyn Fn(&Database) -> Result<T> + Send + Sync>;

pub struct Store {
    database: Arc<Mutex<Database>>,
    revisions: [watch::Sender<u64>; 4],
}

impl Store {
    /// Opens the database. Inside a tokio runtime this also starts watching
    /// for commits from other connections; the watcher ends with the store.
    pub fn open(path: &Path) -> Result<Arc<Self>> {
        let database = Database::open(path)?;
        let baseline = database.data_version()?;

        let store = Arc::new(Self {
            database: Arc::new(Mutex::new(database)),
            revisions: std::array::from_fn(|_| watch::channel(0).0),
        });

        if let Ok(handle) = Handle::try_current() {
            handle.spawn(watch_external_changes(Arc::downgrade(&store), baseline));
        }

        Ok(store)
    }

    /// Runs `operation` on the blocking pool with exclusive access to the connection.
    pub async fn read<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let database = Arc::clone(&self.database);

        task::spawn_blocking(move || {
            let guard = database
                .lock()
                .map_err(|_| anyhow!("Database connection lock poisoned"))?;
            operation(&guard)
        })
        .await
        .context("Store task panicked")?
    }

    pub async fn write<T, F>(&self, table: Table, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let result = self.read(operation).await?;
        self.notify(table);
        Ok(result)
    }

    pub fn notify(&self, table: Table) {
        self.revisions[table.index()].send_modify(|revision| *revision += 1);
    }

    pub fn notify_all(&self) {
        Table::ALL.iter().for_each(|table| self.notify(*table));
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.revisions[table.index()].subscribe()
    }

    pub fn watch<T, F>(self: &Arc<Self>, table: Table, query: F) -> LiveQuery<T>
    where
        T: Send + 'static,
        F: Fn(&Database) -> Result<T> + Send + Sync + 'static,
    {
        LiveQuery {
            store: Arc::clone(self),
            changes: self.subscribe(table),
            query: Arc::new(query),
            primed: false,
        }
    }
}

/// Polls `data_version` and wakes every table when another connection has
/// committed. Own writes leave `data_version` unchanged.
async fn watch_external_changes(store: Weak<Store>, mut seen: i64) {
    let mut interval = tokio::time::interval(EXTERNAL_CHANGE_POLL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let Some(store) = store.upgrade() else {
            break;
        };

        match store.read(|database| database.data_version()).await {
            Ok(version) if version != seen => {
                debug!(version, "external database change detected");
                seen = version;
                store.notify_all();
            }
            Ok(_) => {}
            Err(error) => warn!(error = %error, "failed to poll database changes"),
        }
    }
}

/// A query that re-runs whenever its table changes.
pub struct LiveQuery<T> {
    store: Arc<Store>,
    changes: watch::Receiver<u64>,
    query: QueryFn<T>,
    primed: bool,
}

impl<T: Send + 'static> LiveQuery<T> {
    /// Returns the current result on the first call, then waits for the next
    /// change. `None` once the store is gone.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if !self.changed().await {
            return Ok(None);
        }

        self.fetch().await.map(Some)
    }

    /// Waits until the table changed since the last call. Cancel-safe.
    pub async fn changed(&mut self) -> bool {
        if !self.primed {
            self.primed = true;
            self.changes.borrow_and_update();
            return true;
        }

        self.changes.changed().await.is_ok()
    }

    pub async fn fetch(&self) -> Result<T> {
        let query = Arc::clone(&self.query);
        self.store.read(move |database| query(database)).await
    }
}

/// Keeps a watch channel filled with the latest result of `query`. The
/// background task stops when the returned receiver is dropped.
pub async fn follow<T>(mut query: LiveQuery<T>) -> Result<watch::Receiver<T>>
where
    T: Send + Sync + 'static,
{
    let initial = query
        .next()
        .await?
        .context("Store closed before first result")?;
    let (sender, receiver) = watch::channel(initial);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sender.closed() => break,
                changed = query.changed() => {
                    if !changed {
                        break;
                    }
                    match query.fetch().await {
                        Ok(value) => {
                            sender.send_replace(value);
                        }
                        Err(error) => warn!(error = %error, "live query refresh failed"),
                    }
                }
            }
        }
    });

    Ok(receiver)
}

/// Re-derives an output from the latest values of two live queries whenever
/// either of them changes. Updates to the two inputs are not observed
/// atomically together.
pub async fn combine_latest<A, B, O, F>(
    mut left: LiveQuery<A>,
    mut right: LiveQuery<B>,
    derive: F,
) -> Result<watch::Receiver<O>>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + Sync + 'static,
    F: Fn(&A, &B) -> O + Send + 'static,
{
    let mut latest_left = left
        .next()
        .await?
        .context("Store closed before first result")?;
    let mut latest_right = right
        .next()
        .await?
        .context("Store closed before first result")?;
    let (sender, receiver) = watch::channel(derive(&latest_left, &latest_right));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sender.closed() => break,
                changed = left.changed() => {
                    if !changed {
                        break;
                    }
                    match left.fetch().await {
                        Ok(value) => latest_left = value,
                        Err(error) => {
                            warn!(error = %error, "combined query refresh failed");
                            continue;
                        }
                    }
                }
                changed = right.changed() => {
                    if !changed {
                        break;
                    }
                    match right.fetch().await {
                        Ok(value) => latest_right = value,
                        Err(error) => {
                            warn!(error = %error, "combined query refresh failed");
                            continue;
                        }
                    }
                }
            }

            sender.send_replace(derive(&latest_left, &latest_right));
        }
    });

    Ok(receiver)
}
