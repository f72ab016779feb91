pub const CREATE_DAILY_ENTRIES: &str = r#"
CREATE TABLE IF NOT EXISTS daily_entries (
  date                 INTEGER PRIMARY KEY,
  leetcode_count       INTEGER NOT NULL DEFAULT 0,
  codeforces_count     INTEGER NOT NULL DEFAULT 0,
  codechef_count       INTEGER NOT NULL DEFAULT 0,
  geeksforgeeks_count  INTEGER NOT NULL DEFAULT 0,
  leetcode_target      INTEGER NOT NULL DEFAULT 0,
  codeforces_target    INTEGER NOT NULL DEFAULT 0,
  codechef_target      INTEGER NOT NULL DEFAULT 0,
  geeksforgeeks_target INTEGER NOT NULL DEFAULT 0
);
"#;

pub const CREATE_TODOS: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
  id           INTEGER PRIMARY KEY AUTOINCREMENT,
  title        TEXT NOT NULL,
  description  TEXT NOT NULL DEFAULT '',
  date         INTEGER NOT NULL,
  is_completed INTEGER NOT NULL DEFAULT 0,
  created_at   INTEGER NOT NULL
);
"#;

pub const CREATE_REMINDERS: &str = r#"
CREATE TABLE IF NOT EXISTS reminders (
  id                    INTEGER PRIMARY KEY AUTOINCREMENT,
  title                 TEXT NOT NULL,
  description           TEXT NOT NULL DEFAULT '',
  date_time             INTEGER NOT NULL,
  is_contest_reminder   INTEGER NOT NULL DEFAULT 0,
  platform              TEXT,
  is_active             INTEGER NOT NULL DEFAULT 1,
  notify_before_minutes INTEGER NOT NULL DEFAULT 60,
  created_at            INTEGER NOT NULL
);
"#;

pub const CREATE_JOURNAL_NOTES: &str = r#"
CREATE TABLE IF NOT EXISTS journal_notes (
  id         INTEGER PRIMARY KEY AUTOINCREMENT,
  title      TEXT NOT NULL,
  content    TEXT NOT NULL,
  date       INTEGER NOT NULL,
  created_at INTEGER NOT NULL
);
"#;

pub const INDEX_TODOS_DATE: &str = "CREATE INDEX IF NOT EXISTS idx_todos_date ON todos(date);";

pub const INDEX_REMINDERS_DATE_TIME: &str =
    "CREATE INDEX IF NOT EXISTS idx_reminders_date_time ON reminders(date_time);";

pub const INDEX_JOURNAL_NOTES_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_journal_notes_date ON journal_notes(date);";

pub const DAILY_ENTRY_COLUMNS: &str = "date, \
    leetcode_count, codeforces_count, codechef_count, geeksforgeeks_count, \
    leetcode_target, codeforces_target, codechef_target, geeksforgeeks_target";

pub const TODO_COLUMNS: &str = "id, title, description, date, is_completed, created_at";

pub const REMINDER_COLUMNS: &str = "id, title, description, date_time, \
    is_contest_reminder, platform, is_active, notify_before_minutes, created_at";

pub const JOURNAL_NOTE_COLUMNS: &str = "id, title, content, date, created_at";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_DAILY_ENTRIES,
        CREATE_TODOS,
        CREATE_REMINDERS,
        CREATE_JOURNAL_NOTES,
        INDEX_TODOS_DATE,
        INDEX_REMINDERS_DATE_TIME,
        INDEX_JOURNAL_NOTES_DATE,
    ]
}
