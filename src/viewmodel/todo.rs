use crate::analyzer::{TodoStats, todo_stats};
use crate::model::{Todo, TodoInput, today};
use crate::repository::TodoRepository;
use crate::store::combine_latest;
use crate::viewmodel::AppContext;
use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoViewMode {
    #[default]
    Today,
    All,
}

impl fmt::Display for TodoViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoViewMode::Today => f.write_str("Today"),
            TodoViewMode::All => f.write_str("All"),
        }
    }
}

impl FromStr for TodoViewMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "today" => Ok(TodoViewMode::Today),
            "all" => Ok(TodoViewMode::All),
            _ => anyhow::bail!("Unknown todo view: {value}. Supported: today, all"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoLists {
    pub today: Vec<Todo>,
    pub all: Vec<Todo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoState {
    pub lists: TodoLists,
    /// Completion over today's todos.
    pub stats: TodoStats,
    pub view_mode: TodoViewMode,
}

impl TodoState {
    pub fn visible(&self) -> &[Todo] {
        match self.view_mode {
            TodoViewMode::Today => &self.lists.today,
            TodoViewMode::All => &self.lists.all,
        }
    }
}

pub struct TodoViewModel {
    todos: TodoRepository,
    lists: watch::Receiver<TodoLists>,
    view_mode: watch::Sender<TodoViewMode>,
}

impl TodoViewModel {
    pub async fn new(context: &AppContext) -> Result<Self> {
        let todos = context.repos.todos.clone();
        let lists = combine_latest(
            todos.todos_for_date_live(today()),
            todos.all_todos_live(),
            |todays: &Vec<Todo>, all: &Vec<Todo>| TodoLists {
                today: todays.clone(),
                all: all.clone(),
            },
        )
        .await?;

        Ok(Self {
            todos,
            lists,
            view_mode: watch::channel(TodoViewMode::default()).0,
        })
    }

    pub fn snapshot(&self) -> TodoState {
        let lists = self.lists.borrow().clone();

        TodoState {
            stats: todo_stats(&lists.today),
            lists,
            view_mode: *self.view_mode.borrow(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoLists> {
        self.lists.clone()
    }

    pub fn update_view_mode(&self, view_mode: TodoViewMode) {
        self.view_mode.send_replace(view_mode);
    }

    /// Adds a todo for today. Returns `None` when the title is blank.
    pub async fn save_todo(&self, title: &str, description: &str) -> Result<Option<i64>> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let id = self
            .todos
            .insert(TodoInput {
                title: title.trim().to_string(),
                description: description.trim().to_string(),
                date: today(),
            })
            .await?;

        info!(id, "todo added");
        Ok(Some(id))
    }

    pub async fn toggle_todo_completion(&self, id: i64) -> Result<Todo> {
        let mut todo = self
            .todos
            .todo_by_id(id)
            .await?
            .with_context(|| format!("Todo not found: {id}"))?;

        todo.is_completed = !todo.is_completed;
        self.todos.update(todo.clone()).await?;

        info!(id, completed = todo.is_completed, "todo toggled");
        Ok(todo)
    }

    pub async fn delete_todo(&self, id: i64) -> Result<bool> {
        let deleted = self.todos.delete(id).await? > 0;
        if deleted {
            info!(id, "todo deleted");
        }
        Ok(deleted)
    }
}
