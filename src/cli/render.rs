use crate::analyzer::report::render_daily_analysis;
use crate::model::{JournalNote, Reminder, Todo};
use crate::viewmodel::today::TodayState;
use crate::viewmodel::todo::TodoState;
use chrono::Duration;

pub fn render_today(state: &TodayState, time_left: Option<Duration>) -> String {
    let mut output = render_daily_analysis(state.date, &state.analysis);

    if let Some(left) = time_left {
        output.push_str(&format!(
            "\nTime left today: {}h {:02}m\n",
            left.num_hours(),
            left.num_minutes() % 60
        ));
    }

    if !state.todos.is_empty() {
        output.push_str("\n## Todos\n");
        output.push_str(&todo_lines(&state.todos));
        output.push('\n');
    }

    output
}

pub fn render_todos(state: &TodoState) -> String {
    let todos = state.visible();
    let body = if todos.is_empty() {
        "- No todos".to_string()
    } else {
        todo_lines(todos)
    };

    format!(
        "# Todos ({})\n\n{}\n\nToday: {}/{} completed ({:.0}%)\n",
        state.view_mode,
        body,
        state.stats.completed,
        state.stats.total,
        state.stats.completion_rate
    )
}

pub fn render_todo_list(title: &str, todos: &[Todo]) -> String {
    let body = if todos.is_empty() {
        "- No todos".to_string()
    } else {
        todo_lines(todos)
    };

    format!("# {title}\n\n{body}\n")
}

fn todo_lines(todos: &[Todo]) -> String {
    todos
        .iter()
        .map(|todo| {
            let mark = if todo.is_completed { "x" } else { " " };
            let mut line = format!("- [{mark}] #{} {} ({})", todo.id, todo.title, todo.date);
            if !todo.description.is_empty() {
                line.push_str(&format!(": {}", todo.description));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_reminders(title: &str, reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return format!("# {title}\n\n- No reminders\n");
    }

    let rows = reminders
        .iter()
        .map(|reminder| {
            let kind = match (reminder.is_contest_reminder, reminder.platform.as_deref()) {
                (true, Some(platform)) => format!("contest ({platform})"),
                (true, None) => "contest".to_string(),
                (false, _) => "reminder".to_string(),
            };

            format!(
                "| {} | {} | {} | {} | {}m | {} |",
                reminder.id,
                reminder.date_time.format("%Y-%m-%d %H:%M"),
                reminder.title,
                kind,
                reminder.notify_before_minutes,
                if reminder.is_active { "on" } else { "off" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# {title}\n\n\
         | Id | When | Title | Kind | Notify | Active |\n\
         |----|------|-------|------|--------|--------|\n{rows}\n"
    )
}

pub fn render_journal_list(notes: &[JournalNote]) -> String {
    if notes.is_empty() {
        return "- No journal notes".to_string();
    }

    notes
        .iter()
        .map(|note| format!("- #{} {} {}", note.id, note.date.format("%Y-%m-%d"), note.title))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_journal_note(note: &JournalNote) -> String {
    format!(
        "# {}\n{} (written {})\n\n{}\n",
        note.title,
        note.date.format("%Y-%m-%d"),
        note.created_at.format("%Y-%m-%d %H:%M"),
        note.content
    )
}
