use crate::analyzer::percentage;
use crate::model::{DailyEntry, Platform, local_midnight, saturating_sum};
use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Local, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DateRange {
    #[default]
    Week,
    Month,
    Year,
}

impl DateRange {
    pub fn display_name(self) -> &'static str {
        match self {
            DateRange::Week => "Week",
            DateRange::Month => "Month",
            DateRange::Year => "Year",
        }
    }

    /// Calendar-aware start of the window ending at `now`. Month and year
    /// subtraction clamp to the last day of a shorter month.
    pub fn window_start(self, now: DateTime<Local>) -> DateTime<Local> {
        match self {
            DateRange::Week => now - Duration::weeks(1),
            DateRange::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now - Duration::days(30)),
            DateRange::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now - Duration::days(365)),
        }
    }
}

impl FromStr for DateRange {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "week" | "7d" => Ok(DateRange::Week),
            "month" | "30d" => Ok(DateRange::Month),
            "year" | "365d" => Ok(DateRange::Year),
            _ => bail!("Unknown date range: {value}. Supported: week, month, year"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformFilter {
    #[default]
    All,
    Only(Platform),
}

impl PlatformFilter {
    pub fn includes(self, platform: Platform) -> bool {
        match self {
            PlatformFilter::All => true,
            PlatformFilter::Only(selected) => selected == platform,
        }
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFilter::All => f.write_str("All"),
            PlatformFilter::Only(platform) => write!(f, "{platform}"),
        }
    }
}

impl FromStr for PlatformFilter {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(PlatformFilter::All);
        }

        value.parse::<Platform>().map(PlatformFilter::Only)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformAnalytics {
    pub platform: Platform,
    pub total_solved: u32,
    pub total_targets: u32,
    pub average_daily: f32,
    pub target_achievement_rate: f32,
    pub active_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub total: u32,
}

/// Entries whose day falls inside `[range.window_start(now), now]`.
pub fn entries_in_window(
    entries: &[DailyEntry],
    range: DateRange,
    now: DateTime<Local>,
) -> Vec<&DailyEntry> {
    let start = range.window_start(now);

    entries
        .iter()
        .filter(|entry| {
            let day = local_midnight(entry.date);
            day >= start && day <= now
        })
        .collect()
}

/// Per-platform totals over a rolling window, in fixed platform order.
pub fn platform_analytics(
    entries: &[DailyEntry],
    range: DateRange,
    filter: PlatformFilter,
    now: DateTime<Local>,
) -> Vec<PlatformAnalytics> {
    let window = entries_in_window(entries, range, now);
    let entry_count = window.len() as u32;

    Platform::ALL
        .iter()
        .copied()
        .filter(|platform| filter.includes(*platform))
        .map(|platform| {
            let total_solved = saturating_sum(window.iter().map(|entry| entry.count(platform)));
            let total_targets = saturating_sum(window.iter().map(|entry| entry.target(platform)));
            let active_days = window
                .iter()
                .filter(|entry| entry.count(platform) > 0)
                .count() as u32;
            let average_daily = if entry_count == 0 {
                0.0
            } else {
                total_solved as f32 / entry_count as f32
            };

            PlatformAnalytics {
                platform,
                total_solved,
                total_targets,
                average_daily,
                target_achievement_rate: percentage(total_solved, total_targets),
                active_days,
            }
        })
        .collect()
}

/// One cell per day for the `days` days ending at `end`, oldest first.
pub fn heatmap(entries: &[DailyEntry], end: NaiveDate, days: u32) -> Vec<HeatmapDay> {
    let totals = entries
        .iter()
        .map(|entry| (entry.date, entry.counts.total()))
        .collect::<HashMap<_, _>>();

    (0..days)
        .rev()
        .filter_map(|offset| end.checked_sub_days(chrono::Days::new(u64::from(offset))))
        .map(|date| HeatmapDay {
            date,
            total: totals.get(&date).copied().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{DateRange, PlatformFilter, heatmap, platform_analytics};
    use crate::model::{DailyEntry, Platform, local_midnight, parse_count};
    use chrono::{DateTime, Duration, Local, NaiveDate};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
    }

    fn entry(date: NaiveDate, leetcode: (u32, u32), codeforces: (u32, u32)) -> DailyEntry {
        let mut entry = DailyEntry::empty(date);
        entry.counts.set(Platform::LeetCode, leetcode.0);
        entry.targets.set(Platform::LeetCode, leetcode.1);
        entry.counts.set(Platform::Codeforces, codeforces.0);
        entry.targets.set(Platform::Codeforces, codeforces.1);
        entry
    }

    fn noon(date: NaiveDate) -> DateTime<Local> {
        local_midnight(date) + Duration::hours(12)
    }

    #[test]
    fn empty_window_is_all_zero() {
        let entries = vec![entry(date(1, 1), (5, 5), (1, 1))];
        let analytics =
            platform_analytics(&entries, DateRange::Week, PlatformFilter::All, noon(date(1, 20)));

        assert_eq!(analytics.len(), 4);
        for stats in analytics {
            assert_eq!(stats.total_solved, 0);
            assert_eq!(stats.average_daily, 0.0);
            assert_eq!(stats.target_achievement_rate, 0.0);
            assert_eq!(stats.active_days, 0);
        }
    }

    #[test]
    fn week_totals_and_active_days() {
        let entries = vec![
            entry(date(1, 14), (2, 4), (0, 2)),
            entry(date(1, 15), (0, 4), (3, 2)),
            entry(date(1, 16), (4, 4), (1, 2)),
            entry(date(1, 2), (9, 1), (9, 1)),
        ];

        let analytics =
            platform_analytics(&entries, DateRange::Week, PlatformFilter::All, noon(date(1, 16)));
        let leetcode = &analytics[0];
        let codeforces = &analytics[1];

        assert_eq!(leetcode.total_solved, 6);
        assert_eq!(leetcode.total_targets, 12);
        assert!((leetcode.average_daily - 2.0).abs() < 1e-4);
        assert!((leetcode.target_achievement_rate - 50.0).abs() < 1e-4);
        assert_eq!(leetcode.active_days, 2);

        assert_eq!(codeforces.total_solved, 4);
        assert_eq!(codeforces.active_days, 2);
        assert_eq!(analytics[2].active_days, 0);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = local_midnight(date(1, 22));
        let entries = vec![
            entry(date(1, 15), (1, 0), (0, 0)),
            entry(date(1, 22), (1, 0), (0, 0)),
            entry(date(1, 14), (1, 0), (0, 0)),
        ];

        let analytics = platform_analytics(
            &entries,
            DateRange::Week,
            PlatformFilter::Only(Platform::LeetCode),
            now,
        );

        assert_eq!(analytics.len(), 1);
        assert_eq!(analytics[0].platform, Platform::LeetCode);
        assert_eq!(analytics[0].active_days, 2);
        assert_eq!(analytics[0].total_solved, 2);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let entries = vec![
            entry(date(1, 15), (parse_count("4294967295"), u32::MAX), (0, 0)),
            entry(date(1, 16), (1, 1), (0, 0)),
        ];

        let analytics =
            platform_analytics(&entries, DateRange::Week, PlatformFilter::All, noon(date(1, 16)));
        let leetcode = &analytics[0];

        assert_eq!(leetcode.total_solved, u32::MAX);
        assert_eq!(leetcode.total_targets, u32::MAX);
        assert_eq!(leetcode.active_days, 2);
        assert!((leetcode.target_achievement_rate - 100.0).abs() < 1e-3);
    }

    #[test]
    fn month_window_is_calendar_aware() {
        let now = noon(date(3, 31));
        let start = DateRange::Month.window_start(now);
        assert_eq!(start.date_naive(), date(2, 28));

        let year_start = DateRange::Year.window_start(now);
        assert_eq!(
            year_start.date_naive(),
            NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date")
        );
    }

    #[test]
    fn filter_parses_all_and_platforms() {
        assert_eq!("All".parse::<PlatformFilter>().unwrap(), PlatformFilter::All);
        assert_eq!(
            "Codeforces".parse::<PlatformFilter>().unwrap(),
            PlatformFilter::Only(Platform::Codeforces)
        );
        assert!("everything".parse::<PlatformFilter>().is_err());
    }

    #[test]
    fn heatmap_zero_fills_missing_days() {
        let entries = vec![entry(date(2, 3), (2, 0), (1, 0))];
        let cells = heatmap(&entries, date(2, 4), 3);

        assert_eq!(
            cells.iter().map(|cell| (cell.date, cell.total)).collect::<Vec<_>>(),
            vec![(date(2, 2), 0), (date(2, 3), 3), (date(2, 4), 0)]
        );
    }
}
