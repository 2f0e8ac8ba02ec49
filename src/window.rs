use crate::raw::RawRun;
use crate::summary::{summarize, RunSummary};

/// Days of history kept behind the most recent run.
pub const DEFAULT_WINDOW_DAYS: u32 = 20;

/// Sorts runs chronologically, keeps those within `window_days` whole days of
/// the latest run, and summarizes each one. Output is ascending by `when`.
pub fn window(raw_runs: &[RawRun], window_days: u32) -> Vec<RunSummary> {
    let mut sorted: Vec<&RawRun> = raw_runs.iter().collect();
    sorted.sort_by_key(|run| run.timestamp);

    let Some(latest) = sorted.last().map(|run| run.timestamp) else {
        return vec![];
    };

    sorted
        .into_iter()
        // Partial days are truncated, so a run 20.5 days back is still inside a 20-day window.
        .filter(|run| (latest - run.timestamp).num_days() <= i64::from(window_days))
        .map(summarize)
        .collect()
}
