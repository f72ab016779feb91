pub mod range;
pub mod report;

use crate::model::{DailyEntry, Platform, Todo, saturating_sum};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStats {
    pub platform: Platform,
    pub count: u32,
    pub target: u32,
    pub completion_percentage: f32,
}

impl PlatformStats {
    pub fn is_target_met(&self) -> bool {
        self.count >= self.target
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAnalysis {
    pub total_problems: u32,
    pub total_targets: u32,
    pub overall_completion_percentage: f32,
    pub platform_stats: Vec<PlatformStats>,
    pub todos_completed: u32,
    pub total_todos: u32,
    pub todo_completion_percentage: f32,
}

impl Default for DailyAnalysis {
    fn default() -> Self {
        daily_analysis(None, &[])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TodoStats {
    pub completed: u32,
    pub total: u32,
    pub completion_rate: f32,
}

/// Progress snapshot for one day. A missing entry is the valid "nothing
/// logged yet" state and reports zeros everywhere.
pub fn daily_analysis(entry: Option<&DailyEntry>, todos: &[Todo]) -> DailyAnalysis {
    let platform_stats = Platform::ALL
        .iter()
        .map(|platform| {
            let (count, target) = entry
                .map(|entry| (entry.count(*platform), entry.target(*platform)))
                .unwrap_or_default();

            PlatformStats {
                platform: *platform,
                count,
                target,
                completion_percentage: percentage(count, target),
            }
        })
        .collect::<Vec<_>>();

    let total_problems = saturating_sum(platform_stats.iter().map(|stats| stats.count));
    let total_targets = saturating_sum(platform_stats.iter().map(|stats| stats.target));
    let todo_stats = todo_stats(todos);

    DailyAnalysis {
        total_problems,
        total_targets,
        overall_completion_percentage: percentage(total_problems, total_targets),
        platform_stats,
        todos_completed: todo_stats.completed,
        total_todos: todo_stats.total,
        todo_completion_percentage: todo_stats.completion_rate,
    }
}

pub fn todo_stats(todos: &[Todo]) -> TodoStats {
    let completed = todos.iter().filter(|todo| todo.is_completed).count() as u32;
    let total = todos.len() as u32;

    TodoStats {
        completed,
        total,
        completion_rate: percentage(completed, total),
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32 * 100.0
    }
}
