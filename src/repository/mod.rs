//! Per-entity facades over the shared store.

use crate::model::{
    DailyEntry, JournalNote, JournalNoteInput, Reminder, ReminderInput, Todo, TodoInput,
};
use crate::store::{LiveQuery, Store, Table};
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;

#[derive(Clone)]
pub struct DailyEntryRepository {
    store: Arc<Store>,
}

impl DailyEntryRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn daily_entry(&self, date: NaiveDate) -> Result<Option<DailyEntry>> {
        self.store.read(move |db| db.daily_entry(date)).await
    }

    pub fn daily_entry_live(&self, date: NaiveDate) -> LiveQuery<Option<DailyEntry>> {
        self.store
            .watch(Table::DailyEntries, move |db| db.daily_entry(date))
    }

    pub async fn all_daily_entries(&self) -> Result<Vec<DailyEntry>> {
        self.store.read(|db| db.all_daily_entries()).await
    }

    pub fn all_daily_entries_live(&self) -> LiveQuery<Vec<DailyEntry>> {
        self.store
            .watch(Table::DailyEntries, |db| db.all_daily_entries())
    }

    pub fn daily_entries_between_live(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LiveQuery<Vec<DailyEntry>> {
        self.store.watch(Table::DailyEntries, move |db| {
            db.daily_entries_between(start, end)
        })
    }

    pub async fn entries_with_activity(&self) -> Result<Vec<DailyEntry>> {
        self.store.read(|db| db.entries_with_activity()).await
    }

    pub async fn insert_or_update(&self, entry: DailyEntry) -> Result<()> {
        self.store
            .write(Table::DailyEntries, move |db| db.upsert_daily_entry(&entry))
            .await
    }

    pub async fn update(&self, entry: DailyEntry) -> Result<usize> {
        self.store
            .write(Table::DailyEntries, move |db| db.update_daily_entry(&entry))
            .await
    }

    pub async fn delete(&self, date: NaiveDate) -> Result<usize> {
        self.store
            .write(Table::DailyEntries, move |db| db.delete_daily_entry(date))
            .await
    }

    pub async fn delete_all(&self) -> Result<usize> {
        self.store
            .write(Table::DailyEntries, |db| db.delete_all_daily_entries())
            .await
    }
}

#[derive(Clone)]
pub struct TodoRepository {
    store: Arc<Store>,
}

impl TodoRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn todos_for_date(&self, date: NaiveDate) -> Result<Vec<Todo>> {
        self.store.read(move |db| db.todos_for_date(date)).await
    }

    pub fn todos_for_date_live(&self, date: NaiveDate) -> LiveQuery<Vec<Todo>> {
        self.store
            .watch(Table::Todos, move |db| db.todos_for_date(date))
    }

    pub fn all_todos_live(&self) -> LiveQuery<Vec<Todo>> {
        self.store.watch(Table::Todos, |db| db.all_todos())
    }

    pub async fn todos_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Todo>> {
        self.store
            .read(move |db| db.todos_between(start, end))
            .await
    }

    pub async fn todo_by_id(&self, id: i64) -> Result<Option<Todo>> {
        self.store.read(move |db| db.todo_by_id(id)).await
    }

    pub async fn insert(&self, todo: TodoInput) -> Result<i64> {
        self.store
            .write(Table::Todos, move |db| db.insert_todo(&todo))
            .await
    }

    pub async fn update(&self, todo: Todo) -> Result<usize> {
        self.store
            .write(Table::Todos, move |db| db.update_todo(&todo))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<usize> {
        self.store
            .write(Table::Todos, move |db| db.delete_todo(id))
            .await
    }

    pub async fn delete_all(&self) -> Result<usize> {
        self.store
            .write(Table::Todos, |db| db.delete_all_todos())
            .await
    }
}

#[derive(Clone)]
pub struct ReminderRepository {
    store: Arc<Store>,
}

impl ReminderRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn active_reminders(&self) -> Result<Vec<Reminder>> {
        self.store.read(|db| db.active_reminders()).await
    }

    pub fn all_reminders_live(&self) -> LiveQuery<Vec<Reminder>> {
        self.store.watch(Table::Reminders, |db| db.all_reminders())
    }

    pub fn upcoming_reminders_live(&self, from: DateTime<Local>) -> LiveQuery<Vec<Reminder>> {
        self.store
            .watch(Table::Reminders, move |db| db.upcoming_reminders(from))
    }

    pub async fn reminder_by_id(&self, id: i64) -> Result<Option<Reminder>> {
        self.store.read(move |db| db.reminder_by_id(id)).await
    }

    pub async fn insert(&self, reminder: ReminderInput) -> Result<i64> {
        self.store
            .write(Table::Reminders, move |db| db.insert_reminder(&reminder))
            .await
    }

    pub async fn update(&self, reminder: Reminder) -> Result<usize> {
        self.store
            .write(Table::Reminders, move |db| db.update_reminder(&reminder))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<usize> {
        self.store
            .write(Table::Reminders, move |db| db.delete_reminder(id))
            .await
    }

    pub async fn delete_all(&self) -> Result<usize> {
        self.store
            .write(Table::Reminders, |db| db.delete_all_reminders())
            .await
    }
}

#[derive(Clone)]
pub struct JournalNoteRepository {
    store: Arc<Store>,
}

impl JournalNoteRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn all_journal_notes_live(&self) -> LiveQuery<Vec<JournalNote>> {
        self.store
            .watch(Table::JournalNotes, |db| db.all_journal_notes())
    }

    pub async fn journal_notes_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalNote>> {
        self.store
            .read(move |db| db.journal_notes_between(start, end))
            .await
    }

    pub fn search_live(&self, query: String) -> LiveQuery<Vec<JournalNote>> {
        self.store
            .watch(Table::JournalNotes, move |db| db.search_journal_notes(&query))
    }

    pub async fn journal_note_by_id(&self, id: i64) -> Result<Option<JournalNote>> {
        self.store.read(move |db| db.journal_note_by_id(id)).await
    }

    pub async fn insert(&self, note: JournalNoteInput) -> Result<i64> {
        self.store
            .write(Table::JournalNotes, move |db| db.insert_journal_note(&note))
            .await
    }

    pub async fn update(&self, note: JournalNote) -> Result<usize> {
        self.store
            .write(Table::JournalNotes, move |db| db.update_journal_note(&note))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<usize> {
        self.store
            .write(Table::JournalNotes, move |db| db.delete_journal_note(id))
            .await
    }

    pub async fn delete_all(&self) -> Result<usize> {
        self.store
            .write(Table::JournalNotes, |db| db.delete_all_journal_notes())
            .await
    }
}

/// All four repositories over one store.
#[derive(Clone)]
pub struct Repositories {
    pub daily_entries: DailyEntryRepository,
    pub todos: TodoRepository,
    pub reminders: ReminderRepository,
    pub journal_notes: JournalNoteRepository,
}

impl Repositories {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            daily_entries: DailyEntryRepository::new(Arc::clone(&store)),
            todos: TodoRepository::new(Arc::clone(&store)),
            reminders: ReminderRepository::new(Arc::clone(&store)),
            journal_notes: JournalNoteRepository::new(store),
        }
    }
}
