use crate::analyzer::DailyAnalysis;
use crate::analyzer::range::{DateRange, HeatmapDay, PlatformAnalytics, PlatformFilter};
use chrono::NaiveDate;

/// Body of the daily summary notification.
pub fn summary_message(analysis: &DailyAnalysis) -> String {
    let completion_rate = analysis.overall_completion_percentage as u32;

    let mut lines = Vec::with_capacity(3);
    if analysis.total_targets > 0 {
        lines.push(format!(
            "Problems solved: {} ({}% of target)",
            analysis.total_problems, completion_rate
        ));
    } else {
        lines.push(format!("Problems solved: {}", analysis.total_problems));
    }
    lines.push(format!(
        "Todos: {}/{} completed",
        analysis.todos_completed, analysis.total_todos
    ));
    lines.push(encouragement(completion_rate, analysis.total_problems).to_string());

    lines.join("\n")
}

fn encouragement(completion_rate: u32, total_problems: u32) -> &'static str {
    match completion_rate {
        100.. => "Amazing! You hit all your targets!",
        75..=99 => "Great progress today!",
        50..=74 => "Good effort! Keep it up!",
        _ if total_problems > 0 => "Every step counts!",
        _ => "Tomorrow is a new opportunity!",
    }
}

pub fn render_daily_analysis(date: NaiveDate, analysis: &DailyAnalysis) -> String {
    let platform_rows = analysis
        .platform_stats
        .iter()
        .map(|stats| {
            format!(
                "| {} | {} | {} | {:.0}% | {} |",
                stats.platform,
                stats.count,
                stats.target,
                stats.completion_percentage,
                if stats.target > 0 && stats.is_target_met() {
                    "yes"
                } else {
                    "-"
                }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# Daily Progress - {}\n\n## Summary\n\
         - Problems solved: {} / {} ({:.1}%)\n\
         - Todos completed: {} / {} ({:.1}%)\n\n\
         ## Platforms\n\
         | Platform | Solved | Target | Progress | Met |\n\
         |----------|--------|--------|----------|-----|\n{}\n",
        date.format("%Y-%m-%d"),
        analysis.total_problems,
        analysis.total_targets,
        analysis.overall_completion_percentage,
        analysis.todos_completed,
        analysis.total_todos,
        analysis.todo_completion_percentage,
        platform_rows
    )
}

pub fn render_platform_analytics(
    range: DateRange,
    filter: PlatformFilter,
    analytics: &[PlatformAnalytics],
) -> String {
    let rows = if analytics.is_empty() {
        "- No data".to_string()
    } else {
        analytics
            .iter()
            .map(|stats| {
                format!(
                    "| {} | {} | {} | {:.2} | {:.0}% | {} |",
                    stats.platform,
                    stats.total_solved,
                    stats.total_targets,
                    stats.average_daily,
                    stats.target_achievement_rate,
                    stats.active_days
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# Platform Analytics - last {} ({})\n\n\
         | Platform | Solved | Targets | Avg/day | Achieved | Active days |\n\
         |----------|--------|---------|---------|----------|-------------|\n{}\n",
        range.display_name().to_lowercase(),
        filter,
        rows
    )
}

pub fn render_heatmap(cells: &[HeatmapDay]) -> String {
    if cells.is_empty() {
        return "- No data".to_string();
    }

    let weeks = cells
        .chunks(7)
        .map(|week| {
            let row = week
                .iter()
                .map(|cell| heat_symbol(cell.total))
                .collect::<String>();
            format!("{} {}", week[0].date.format("%m-%d"), row)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{weeks}\n\nLegend: . 0  - 1-2  + 3-5  * 6-9  # 10+")
}

fn heat_symbol(total: u32) -> char {
    match total {
        0 => '.',
        1..=2 => '-',
        3..=5 => '+',
        6..=9 => '*',
        _ => '#',
    }
}
