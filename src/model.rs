use anyhow::{Result, bail};
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    LeetCode,
    Codeforces,
    CodeChef,
    GeeksforGeeks,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::LeetCode,
        Platform::Codeforces,
        Platform::CodeChef,
        Platform::GeeksforGeeks,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::LeetCode => "LeetCode",
            Platform::Codeforces => "Codeforces",
            Platform::CodeChef => "CodeChef",
            Platform::GeeksforGeeks => "GeeksforGeeks",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Platform::LeetCode => "leetcode",
            Platform::Codeforces => "codeforces",
            Platform::CodeChef => "codechef",
            Platform::GeeksforGeeks => "geeksforgeeks",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "leetcode" | "lc" => Ok(Platform::LeetCode),
            "codeforces" | "cf" => Ok(Platform::Codeforces),
            "codechef" | "cc" => Ok(Platform::CodeChef),
            "geeksforgeeks" | "gfg" => Ok(Platform::GeeksforGeeks),
            _ => bail!(
                "Unknown platform: {value}. \
                 Supported: leetcode, codeforces, codechef, geeksforgeeks"
            ),
        }
    }
}

/// One number per tracked platform. Used for both solved counts and targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformCounts {
    pub leetcode: u32,
    pub codeforces: u32,
    pub codechef: u32,
    pub geeksforgeeks: u32,
}

impl PlatformCounts {
    pub fn get(&self, platform: Platform) -> u32 {
        match platform {
            Platform::LeetCode => self.leetcode,
            Platform::Codeforces => self.codeforces,
            Platform::CodeChef => self.codechef,
            Platform::GeeksforGeeks => self.geeksforgeeks,
        }
    }

    pub fn set(&mut self, platform: Platform, value: u32) {
        match platform {
            Platform::LeetCode => self.leetcode = value,
            Platform::Codeforces => self.codeforces = value,
            Platform::CodeChef => self.codechef = value,
            Platform::GeeksforGeeks => self.geeksforgeeks = value,
        }
    }

    pub fn total(&self) -> u32 {
        saturating_sum(Platform::ALL.iter().map(|platform| self.get(*platform)))
    }

    pub fn has_activity(&self) -> bool {
        self.total() > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub counts: PlatformCounts,
    pub targets: PlatformCounts,
}

impl DailyEntry {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            counts: PlatformCounts::default(),
            targets: PlatformCounts::default(),
        }
    }

    pub fn count(&self, platform: Platform) -> u32 {
        self.counts.get(platform)
    }

    pub fn target(&self, platform: Platform) -> u32 {
        self.targets.get(platform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub is_completed: bool,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct TodoInput {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date_time: DateTime<Local>,
    pub is_contest_reminder: bool,
    pub platform: Option<String>,
    pub is_active: bool,
    pub notify_before_minutes: u32,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct ReminderInput {
    pub title: String,
    pub description: String,
    pub date_time: DateTime<Local>,
    pub is_contest_reminder: bool,
    pub platform: Option<String>,
    pub notify_before_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalNote {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct JournalNoteInput {
    pub title: String,
    pub content: String,
    pub date: NaiveDate,
}

/// Start of `date` in local time. Falls back to the earliest valid instant
/// when midnight is skipped or repeated by a DST transition.
pub fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let naive = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(value) => value,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a count or target typed by the user. Anything that is not a
/// non-negative integer becomes 0.
pub fn parse_count(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

/// Sums counts, clamping at `u32::MAX` instead of overflowing.
pub fn saturating_sum(values: impl IntoIterator<Item = u32>) -> u32 {
    values.into_iter().fold(0, u32::saturating_add)
}
