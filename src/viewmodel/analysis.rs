use crate::analyzer::range::{
    DateRange, HeatmapDay, PlatformAnalytics, PlatformFilter, heatmap, platform_analytics,
};
use crate::analyzer::{DailyAnalysis, daily_analysis};
use crate::model::{DailyEntry, today};
use crate::repository::{DailyEntryRepository, TodoRepository};
use crate::store::follow;
use crate::viewmodel::AppContext;
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisViewMode {
    #[default]
    DateRange,
    SpecificDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisSelection {
    pub view_mode: AnalysisViewMode,
    pub range: DateRange,
    pub filter: PlatformFilter,
    pub specific_date: Option<NaiveDate>,
}

pub struct AnalysisViewModel {
    daily_entries: DailyEntryRepository,
    todos: TodoRepository,
    entries: watch::Receiver<Vec<DailyEntry>>,
    selection: watch::Sender<AnalysisSelection>,
}

impl AnalysisViewModel {
    pub async fn new(context: &AppContext) -> Result<Self> {
        let daily_entries = context.repos.daily_entries.clone();
        let entries = follow(daily_entries.all_daily_entries_live()).await?;

        Ok(Self {
            daily_entries,
            todos: context.repos.todos.clone(),
            entries,
            selection: watch::channel(AnalysisSelection::default()).0,
        })
    }

    pub fn selection(&self) -> AnalysisSelection {
        *self.selection.borrow()
    }

    pub fn update_view_mode(&self, view_mode: AnalysisViewMode) {
        self.selection.send_modify(|selection| selection.view_mode = view_mode);
    }

    pub fn update_date_range(&self, range: DateRange) {
        self.selection.send_modify(|selection| selection.range = range);
    }

    pub fn update_platform_filter(&self, filter: PlatformFilter) {
        self.selection.send_modify(|selection| selection.filter = filter);
    }

    /// Any instant during the wanted day; only its local date is kept.
    pub fn update_specific_date(&self, at: DateTime<Local>) {
        let date = at.date_naive();
        self.selection
            .send_modify(|selection| selection.specific_date = Some(date));
    }

    /// Empty unless the range view is selected.
    pub fn platform_analytics(&self) -> Vec<PlatformAnalytics> {
        let selection = self.selection();
        if selection.view_mode != AnalysisViewMode::DateRange {
            return Vec::new();
        }

        platform_analytics(
            &self.entries.borrow(),
            selection.range,
            selection.filter,
            Local::now(),
        )
    }

    /// `None` unless the specific-date view is selected with a date.
    pub async fn specific_date_analysis(&self) -> Result<Option<DailyAnalysis>> {
        let selection = self.selection();
        let date = match (selection.view_mode, selection.specific_date) {
            (AnalysisViewMode::SpecificDate, Some(date)) => date,
            _ => return Ok(None),
        };

        let entry = self.daily_entries.daily_entry(date).await?;
        let todos = self.todos.todos_for_date(date).await?;

        Ok(Some(daily_analysis(entry.as_ref(), &todos)))
    }

    /// Activity grid for the `days` days ending today.
    pub fn heatmap(&self, days: u32) -> Vec<HeatmapDay> {
        heatmap(&self.entries.borrow(), today(), days)
    }
}
