use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::raw::RawItem;
use crate::stability::{analyze, ReportState};
use crate::summary::{FailureDetail, RunSummary};
use crate::window::{window, DEFAULT_WINDOW_DAYS};

#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    pub window_days: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Parallel, chart-ready series derived from a report history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<DateTime<Utc>>,
    pub passed: Vec<usize>,
    pub failed: Vec<usize>,
    /// Time axis bounds (first run, latest run).
    pub domain: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl ChartSeries {
    pub fn from_history(history: &[RunSummary]) -> Self {
        let domain = history
            .first()
            .zip(history.last())
            .map(|(first, last)| (first.when, last.when));

        Self {
            labels: history.iter().map(|s| s.when).collect(),
            passed: history.iter().map(|s| s.passed).collect(),
            failed: history.iter().map(|s| s.failed).collect(),
            domain,
        }
    }
}

/// Presentation-ready view of one monitored item. Never mutated in place;
/// rebuilt from raw data on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportViewModel {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub history: Vec<RunSummary>,
    pub state: ReportState,
    pub is_failing: bool,
    pub stability_label: String,
    pub stable_since: Option<DateTime<Utc>>,
    pub chart: ChartSeries,
}

impl ReportViewModel {
    pub fn latest(&self) -> Option<&RunSummary> {
        self.history.last()
    }

    /// Failures of the latest run, listed on failing cards.
    pub fn latest_failures(&self) -> &[FailureDetail] {
        self.latest()
            .map(|latest| latest.errors.as_slice())
            .unwrap_or_default()
    }
}

pub fn build_report(
    item: &RawItem,
    settings: &ReportSettings,
    now: DateTime<Utc>,
) -> ReportViewModel {
    let history = item
        .runs
        .as_deref()
        .map(|runs| window(runs, settings.window_days))
        .unwrap_or_default();

    debug!(
        "Built report {} with {} of {} runs in window",
        item.id,
        history.len(),
        item.runs.as_ref().map_or(0, Vec::len)
    );

    let stability = analyze(&history, now);
    let chart = ChartSeries::from_history(&history);

    ReportViewModel {
        id: item.id.clone(),
        title: format!("{} ({})", item.pipeline, item.stage),
        subtitle: item.job.clone(),
        is_failing: stability.is_failing(),
        state: stability.state,
        stability_label: stability.label,
        stable_since: stability.stable_since,
        history,
        chart,
    }
}
