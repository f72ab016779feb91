pub mod queries;

use crate::model::{
    DailyEntry, JournalNote, JournalNoteInput, PlatformCounts, Reminder, ReminderInput, Todo,
    TodoInput, local_midnight,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use queries::{DAILY_ENTRY_COLUMNS, JOURNAL_NOTE_COLUMNS, REMINDER_COLUMNS, TODO_COLUMNS};
use rusqlite::{Connection, OptionalExtension, Params, Row, params};
use std::fs;
use std::path::Path;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    /// Changes whenever another connection commits to the database file.
    pub fn data_version(&self) -> Result<i64> {
        self.conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))
            .context("Failed to read data_version")
    }

    pub fn daily_entry(&self, date: NaiveDate) -> Result<Option<DailyEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {DAILY_ENTRY_COLUMNS} FROM daily_entries WHERE date = ?1"),
                params![date_key(date)],
                daily_entry_from_row,
            )
            .optional()
            .context("Failed to query daily entry")?;

        Ok(entry)
    }

    pub fn all_daily_entries(&self) -> Result<Vec<DailyEntry>> {
        self.query_list(
            &format!("SELECT {DAILY_ENTRY_COLUMNS} FROM daily_entries ORDER BY date DESC"),
            [],
            daily_entry_from_row,
            "daily entries",
        )
    }

    pub fn daily_entries_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyEntry>> {
        self.query_list(
            &format!(
                "SELECT {DAILY_ENTRY_COLUMNS} FROM daily_entries
                 WHERE date BETWEEN ?1 AND ?2
                 ORDER BY date DESC"
            ),
            params![date_key(start), date_key(end)],
            daily_entry_from_row,
            "daily entries",
        )
    }

    pub fn entries_with_activity(&self) -> Result<Vec<DailyEntry>> {
        self.query_list(
            &format!(
                "SELECT {DAILY_ENTRY_COLUMNS} FROM daily_entries
                 WHERE leetcode_count > 0 OR codeforces_count > 0
                    OR codechef_count > 0 OR geeksforgeeks_count > 0
                 ORDER BY date DESC"
            ),
            [],
            daily_entry_from_row,
            "active daily entries",
        )
    }

    pub fn upsert_daily_entry(&self, entry: &DailyEntry) -> Result<()> {
        let (counts, targets) = (&entry.counts, &entry.targets);
        self.conn
            .execute(
                &format!(
                    "INSERT OR REPLACE INTO daily_entries ({DAILY_ENTRY_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    date_key(entry.date),
                    counts.leetcode,
                    counts.codeforces,
                    counts.codechef,
                    counts.geeksforgeeks,
                    targets.leetcode,
                    targets.codeforces,
                    targets.codechef,
                    targets.geeksforgeeks
                ],
            )
            .context("Failed to upsert daily entry")?;

        Ok(())
    }

    pub fn update_daily_entry(&self, entry: &DailyEntry) -> Result<usize> {
        let (counts, targets) = (&entry.counts, &entry.targets);
        self.conn
            .execute(
                "UPDATE daily_entries
                 SET leetcode_count = ?2, codeforces_count = ?3,
                     codechef_count = ?4, geeksforgeeks_count = ?5,
                     leetcode_target = ?6, codeforces_target = ?7,
                     codechef_target = ?8, geeksforgeeks_target = ?9
                 WHERE date = ?1",
                params![
                    date_key(entry.date),
                    counts.leetcode,
                    counts.codeforces,
                    counts.codechef,
                    counts.geeksforgeeks,
                    targets.leetcode,
                    targets.codeforces,
                    targets.codechef,
                    targets.geeksforgeeks
                ],
            )
            .context("Failed to update daily entry")
    }

    pub fn delete_daily_entry(&self, date: NaiveDate) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM daily_entries WHERE date = ?1",
                params![date_key(date)],
            )
            .context("Failed to delete daily entry")
    }

    pub fn delete_all_daily_entries(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM daily_entries", [])
            .context("Failed to delete daily entries")
    }

    pub fn todos_for_date(&self, date: NaiveDate) -> Result<Vec<Todo>> {
        self.query_list(
            &format!(
                "SELECT {TODO_COLUMNS} FROM todos
                 WHERE date = ?1
                 ORDER BY created_at DESC, id DESC"
            ),
            params![date_key(date)],
            todo_from_row,
            "todos",
        )
    }

    pub fn all_todos(&self) -> Result<Vec<Todo>> {
        self.query_list(
            &format!(
                "SELECT {TODO_COLUMNS} FROM todos
                 ORDER BY date DESC, created_at DESC, id DESC"
            ),
            [],
            todo_from_row,
            "todos",
        )
    }

    pub fn todos_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Todo>> {
        self.query_list(
            &format!(
                "SELECT {TODO_COLUMNS} FROM todos
                 WHERE date BETWEEN ?1 AND ?2
                 ORDER BY date DESC, created_at DESC"
            ),
            params![date_key(start), date_key(end)],
            todo_from_row,
            "todos",
        )
    }

    pub fn todo_by_id(&self, id: i64) -> Result<Option<Todo>> {
        let todo = self
            .conn
            .query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                params![id],
                todo_from_row,
            )
            .optional()
            .context("Failed to query todo")?;

        Ok(todo)
    }

    pub fn insert_todo(&self, todo: &TodoInput) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO todos (title, description, date, is_completed, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![
                    &todo.title,
                    &todo.description,
                    date_key(todo.date),
                    Local::now().timestamp_millis()
                ],
            )
            .context("Failed to insert todo")?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_todo(&self, todo: &Todo) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE todos
                 SET title = ?2, description = ?3, date = ?4, is_completed = ?5
                 WHERE id = ?1",
                params![
                    todo.id,
                    &todo.title,
                    &todo.description,
                    date_key(todo.date),
                    todo.is_completed
                ],
            )
            .context("Failed to update todo")
    }

    pub fn delete_todo(&self, id: i64) -> Result<usize> {
        self.conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])
            .context("Failed to delete todo")
    }

    pub fn delete_all_todos(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM todos", [])
            .context("Failed to delete todos")
    }

    pub fn active_reminders(&self) -> Result<Vec<Reminder>> {
        self.query_list(
            &format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE is_active = 1
                 ORDER BY date_time ASC"
            ),
            [],
            reminder_from_row,
            "active reminders",
        )
    }

    pub fn all_reminders(&self) -> Result<Vec<Reminder>> {
        self.query_list(
            &format!("SELECT {REMINDER_COLUMNS} FROM reminders ORDER BY date_time DESC"),
            [],
            reminder_from_row,
            "reminders",
        )
    }

    pub fn upcoming_reminders(&self, from: DateTime<Local>) -> Result<Vec<Reminder>> {
        self.query_list(
            &format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE date_time >= ?1 AND is_active = 1
                 ORDER BY date_time ASC"
            ),
            params![from.timestamp_millis()],
            reminder_from_row,
            "upcoming reminders",
        )
    }

    pub fn reminder_by_id(&self, id: i64) -> Result<Option<Reminder>> {
        let reminder = self
            .conn
            .query_row(
                &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?1"),
                params![id],
                reminder_from_row,
            )
            .optional()
            .context("Failed to query reminder")?;

        Ok(reminder)
    }

    pub fn insert_reminder(&self, reminder: &ReminderInput) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO reminders (title, description, date_time, is_contest_reminder,
                                        platform, is_active, notify_before_minutes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)",
                params![
                    &reminder.title,
                    &reminder.description,
                    reminder.date_time.timestamp_millis(),
                    reminder.is_contest_reminder,
                    &reminder.platform,
                    reminder.notify_before_minutes,
                    Local::now().timestamp_millis()
                ],
            )
            .context("Failed to insert reminder")?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_reminder(&self, reminder: &Reminder) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE reminders
                 SET title = ?2, description = ?3, date_time = ?4, is_contest_reminder = ?5,
                     platform = ?6, is_active = ?7, notify_before_minutes = ?8
                 WHERE id = ?1",
                params![
                    reminder.id,
                    &reminder.title,
                    &reminder.description,
                    reminder.date_time.timestamp_millis(),
                    reminder.is_contest_reminder,
                    &reminder.platform,
                    reminder.is_active,
                    reminder.notify_before_minutes
                ],
            )
            .context("Failed to update reminder")
    }

    pub fn delete_reminder(&self, id: i64) -> Result<usize> {
        self.conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])
            .context("Failed to delete reminder")
    }

    pub fn delete_all_reminders(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM reminders", [])
            .context("Failed to delete reminders")
    }

    pub fn all_journal_notes(&self) -> Result<Vec<JournalNote>> {
        self.query_list(
            &format!(
                "SELECT {JOURNAL_NOTE_COLUMNS} FROM journal_notes
                 ORDER BY date DESC, created_at DESC, id DESC"
            ),
            [],
            journal_note_from_row,
            "journal notes",
        )
    }

    pub fn journal_notes_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JournalNote>> {
        self.query_list(
            &format!(
                "SELECT {JOURNAL_NOTE_COLUMNS} FROM journal_notes
                 WHERE date BETWEEN ?1 AND ?2
                 ORDER BY date DESC"
            ),
            params![date_key(start), date_key(end)],
            journal_note_from_row,
            "journal notes",
        )
    }

    pub fn search_journal_notes(&self, query: &str) -> Result<Vec<JournalNote>> {
        self.query_list(
            &format!(
                "SELECT {JOURNAL_NOTE_COLUMNS} FROM journal_notes
                 WHERE title LIKE '%' || ?1 || '%' OR content LIKE '%' || ?1 || '%'
                 ORDER BY date DESC"
            ),
            params![query],
            journal_note_from_row,
            "journal notes",
        )
    }

    pub fn journal_note_by_id(&self, id: i64) -> Result<Option<JournalNote>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {JOURNAL_NOTE_COLUMNS} FROM journal_notes WHERE id = ?1"),
                params![id],
                journal_note_from_row,
            )
            .optional()
            .context("Failed to query journal note")?;

        Ok(note)
    }

    pub fn insert_journal_note(&self, note: &JournalNoteInput) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO journal_notes (title, content, date, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    &note.title,
                    &note.content,
                    date_key(note.date),
                    Local::now().timestamp_millis()
                ],
            )
            .context("Failed to insert journal note")?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_journal_note(&self, note: &JournalNote) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE journal_notes SET title = ?2, content = ?3, date = ?4 WHERE id = ?1",
                params![note.id, &note.title, &note.content, date_key(note.date)],
            )
            .context("Failed to update journal note")
    }

    pub fn delete_journal_note(&self, id: i64) -> Result<usize> {
        self.conn
            .execute("DELETE FROM journal_notes WHERE id = ?1", params![id])
            .context("Failed to delete journal note")
    }

    pub fn delete_all_journal_notes(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM journal_notes", [])
            .context("Failed to delete journal notes")
    }

    fn query_list<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
        what: &str,
    ) -> Result<Vec<T>> {
        let mut statement = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare {what} query"))?;

        let rows = statement
            .query_map(params, map)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to query {what}"))?;

        Ok(rows)
    }
}

/// Dates are stored as the epoch-millisecond value of local midnight.
pub fn date_key(date: NaiveDate) -> i64 {
    local_midnight(date).timestamp_millis()
}

fn instant_from_millis(index: usize, millis: i64) -> rusqlite::Result<DateTime<Local>> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(index, millis))
}

fn date_from_millis(index: usize, millis: i64) -> rusqlite::Result<NaiveDate> {
    instant_from_millis(index, millis).map(|instant| instant.date_naive())
}

fn daily_entry_from_row(row: &Row<'_>) -> rusqlite::Result<DailyEntry> {
    Ok(DailyEntry {
        date: date_from_millis(0, row.get(0)?)?,
        counts: PlatformCounts {
            leetcode: row.get(1)?,
            codeforces: row.get(2)?,
            codechef: row.get(3)?,
            geeksforgeeks: row.get(4)?,
        },
        targets: PlatformCounts {
            leetcode: row.get(5)?,
            codeforces: row.get(6)?,
            codechef: row.get(7)?,
            geeksforgeeks: row.get(8)?,
        },
    })
}

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: date_from_millis(3, row.get(3)?)?,
        is_completed: row.get(4)?,
        created_at: instant_from_millis(5, row.get(5)?)?,
    })
}

fn reminder_from_row(row: &Row<'_>) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date_time: instant_from_millis(3, row.get(3)?)?,
        is_contest_reminder: row.get(4)?,
        platform: row.get(5)?,
        is_active: row.get(6)?,
        notify_before_minutes: row.get(7)?,
        created_at: instant_from_millis(8, row.get(8)?)?,
    })
}

fn journal_note_from_row(row: &Row<'_>) -> rusqlite::Result<JournalNote> {
    Ok(JournalNote {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        date: date_from_millis(3, row.get(3)?)?,
        created_at: instant_from_millis(4, row.get(4)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::model::{DailyEntry, JournalNoteInput, Platform, ReminderInput, TodoInput};
    use chrono::{Duration, Local, NaiveDate};
    use tempfile::TempDir;

    fn open_temp() -> (Database, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let database =
            Database::open(&dir.path().join("db").join("grindlog.db")).expect("db opens");
        (database, dir)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, day).expect("valid date")
    }

    #[test]
    fn daily_entry_upsert_replaces_existing_row() {
        let (database, _dir) = open_temp();
        let mut entry = DailyEntry::empty(date(3));
        entry.counts.set(Platform::LeetCode, 2);
        database.upsert_daily_entry(&entry).expect("insert");

        entry.counts.set(Platform::LeetCode, 5);
        entry.targets.set(Platform::Codeforces, 3);
        database.upsert_daily_entry(&entry).expect("replace");

        let stored = database.daily_entry(date(3)).expect("query").expect("entry exists");
        assert_eq!(stored, entry);
        assert_eq!(database.all_daily_entries().expect("all").len(), 1);
        assert!(database.daily_entry(date(4)).expect("query").is_none());
    }

    #[test]
    fn daily_entries_between_is_inclusive_and_descending() {
        let (database, _dir) = open_temp();
        for day in 1..=5 {
            database
                .upsert_daily_entry(&DailyEntry::empty(date(day)))
                .expect("insert");
        }

        let entries = database.daily_entries_between(date(2), date(4)).expect("range");
        let days = entries.iter().map(|entry| entry.date).collect::<Vec<_>>();
        assert_eq!(days, vec![date(4), date(3), date(2)]);
    }

    #[test]
    fn entries_with_activity_skips_zero_rows() {
        let (database, _dir) = open_temp();
        database.upsert_daily_entry(&DailyEntry::empty(date(1))).expect("insert");
        let mut active = DailyEntry::empty(date(2));
        active.counts.set(Platform::GeeksforGeeks, 1);
        database.upsert_daily_entry(&active).expect("insert");

        let entries = database.entries_with_activity().expect("query");
        assert_eq!(entries, vec![active]);
    }

    #[test]
    fn todo_lifecycle() {
        let (database, _dir) = open_temp();
        let id = database
            .insert_todo(&TodoInput {
                title: "Two pointers".to_string(),
                description: "Practice set".to_string(),
                date: date(7),
            })
            .expect("insert");

        let mut todo = database.todo_by_id(id).expect("query").expect("todo exists");
        assert!(!todo.is_completed);

        todo.is_completed = true;
        assert_eq!(database.update_todo(&todo).expect("update"), 1);
        let todos = database.todos_for_date(date(7)).expect("by date");
        assert_eq!(todos.len(), 1);
        assert!(todos[0].is_completed);

        assert_eq!(database.delete_todo(id).expect("delete"), 1);
        assert!(database.all_todos().expect("all").is_empty());
    }

    #[test]
    fn reminder_queries_respect_active_flag() {
        let (database, _dir) = open_temp();
        let now = Local::now();
        let input = |title: &str, offset_hours: i64| ReminderInput {
            title: title.to_string(),
            description: String::new(),
            date_time: now + Duration::hours(offset_hours),
            is_contest_reminder: false,
            platform: None,
            notify_before_minutes: 60,
        };

        let past = database.insert_reminder(&input("past", -2)).expect("insert");
        let soon = database.insert_reminder(&input("soon", 1)).expect("insert");
        let later = database.insert_reminder(&input("later", 5)).expect("insert");

        let mut paused = database.reminder_by_id(later).expect("query").expect("exists");
        paused.is_active = false;
        database.update_reminder(&paused).expect("update");

        let active = database.active_reminders().expect("active");
        assert_eq!(active.iter().map(|r| r.id).collect::<Vec<_>>(), vec![past, soon]);

        let upcoming = database.upcoming_reminders(now).expect("upcoming");
        assert_eq!(upcoming.iter().map(|r| r.id).collect::<Vec<_>>(), vec![soon]);

        assert_eq!(database.delete_all_reminders().expect("wipe"), 3);
    }

    #[test]
    fn journal_search_matches_title_or_content() {
        let (database, _dir) = open_temp();
        let note = |title: &str, content: &str| JournalNoteInput {
            title: title.to_string(),
            content: content.to_string(),
            date: date(9),
        };

        database.insert_journal_note(&note("Graphs", "Dijkstra again")).expect("insert");
        database.insert_journal_note(&note("DP day", "knapsack variants")).expect("insert");

        assert_eq!(database.search_journal_notes("dijkstra").expect("search").len(), 1);
        assert_eq!(database.search_journal_notes("DP").expect("search").len(), 1);
        assert_eq!(database.search_journal_notes("").expect("search").len(), 2);
        assert!(database.search_journal_notes("segment").expect("search").is_empty());
    }
}
