pub mod onboard;
pub mod render;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "grindlog",
    about = "Daily coding-practice tracker for LeetCode, Codeforces, CodeChef and GeeksforGeeks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Onboard,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Status,
    Doctor,
    /// Show a day's counts, targets and todos.
    Today {
        #[arg(long)]
        date: Option<String>,
        /// Keep printing as the data changes until Ctrl+C.
        #[arg(long, default_value_t = false)]
        watch: bool,
        /// Delete the day's entry.
        #[arg(long, default_value_t = false, conflicts_with = "watch")]
        reset: bool,
    },
    /// Record how many problems were solved on a platform.
    Log {
        platform: String,
        count: String,
        #[arg(long)]
        date: Option<String>,
    },
    /// Set daily targets. Platforms left out keep their current target.
    Target {
        #[arg(long)]
        leetcode: Option<String>,
        #[arg(long)]
        codeforces: Option<String>,
        #[arg(long)]
        codechef: Option<String>,
        #[arg(long)]
        geeksforgeeks: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    Analysis {
        #[command(subcommand)]
        command: AnalysisCommands,
    },
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },
    /// Delete every entry, todo, reminder and journal note.
    Wipe {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Run reminder and daily summary alarms in the foreground.
    Service,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Debug, Subcommand)]
pub enum TodoCommands {
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List {
        #[arg(long, default_value_t = false)]
        all: bool,
        #[arg(long, requires = "to")]
        from: Option<String>,
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    Done {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum JournalCommands {
    Add {
        title: String,
        content: String,
        #[arg(long)]
        date: Option<String>,
    },
    List {
        #[arg(long, requires = "to")]
        from: Option<String>,
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    Search {
        query: String,
    },
    Show {
        id: i64,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReminderCommands {
    Add {
        title: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "09:00")]
        time: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = false)]
        contest: bool,
        #[arg(long, default_value = "")]
        platform: String,
        /// Minutes before the reminder time to notify. Defaults to config.
        #[arg(long)]
        notify_before: Option<u32>,
    },
    List {
        #[arg(long, default_value_t = false)]
        upcoming: bool,
    },
    Toggle {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum AnalysisCommands {
    Range {
        #[arg(long, default_value = "week")]
        range: String,
        #[arg(long, default_value = "All")]
        platform: String,
    },
    Date {
        date: String,
    },
    Heatmap {
        #[arg(long, default_value_t = 84)]
        days: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum NotifyCommands {
    TestReminder,
    TestContest,
    TestSummary,
    /// Fire a test reminder ten seconds from now and wait for it.
    ScheduleTest,
}
