use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::humanize::human_elapsed;
use crate::summary::RunSummary;

pub const SUPER_STABLE_LABEL: &str = "Super stable!";
pub const NO_DATA_LABEL: &str = "Not enough data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    /// No run survived windowing, or the item has never reported.
    NoData,
    Failing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityReport {
    pub state: ReportState,
    /// First passing run after the most recent failure in the window.
    pub stable_since: Option<DateTime<Utc>>,
    pub label: String,
}

impl StabilityReport {
    pub fn is_failing(&self) -> bool {
        self.state == ReportState::Failing
    }
}

/// Derives the current state of an ascending run history and, when passing,
/// how long it has stayed that way relative to `now`.
pub fn analyze(history: &[RunSummary], now: DateTime<Utc>) -> StabilityReport {
    let Some(latest) = history.last() else {
        return StabilityReport {
            state: ReportState::NoData,
            stable_since: None,
            label: NO_DATA_LABEL.to_string(),
        };
    };

    if latest.is_failing() {
        return StabilityReport {
            state: ReportState::Failing,
            stable_since: None,
            label: String::new(),
        };
    }

    let recovery = history
        .iter()
        .rposition(RunSummary::is_failing)
        .and_then(|idx| history.get(idx + 1));

    match recovery {
        Some(recovery) => StabilityReport {
            state: ReportState::Stable,
            stable_since: Some(recovery.when),
            label: format!("Stable for {}", human_elapsed(now - recovery.when)),
        },
        None => StabilityReport {
            state: ReportState::Stable,
            stable_since: None,
            label: SUPER_STABLE_LABEL.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use crate::summary::tests::run_with;
    use chrono::Duration;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn history(runs: &[(i64, usize)]) -> Vec<RunSummary> {
        runs.iter()
            .map(|&(millis, failed)| summarize(&run_with(millis, 1, failed)))
            .collect()
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_empty_history_is_no_data() {
        let report = analyze(&[], at(0));

        assert_eq!(report.state, ReportState::NoData);
        assert!(!report.is_failing());
        assert_eq!(report.label, NO_DATA_LABEL);
    }

    #[test]
    fn test_failing_latest_run() {
        let report = analyze(&history(&[(0, 0), (DAY_MS, 2)]), at(2 * DAY_MS));

        assert!(report.is_failing());
        assert!(report.stable_since.is_none());
        assert!(report.label.is_empty());
    }

    #[test]
    fn test_super_stable_when_no_failure_in_window() {
        let report = analyze(&history(&[(0, 0), (DAY_MS, 0)]), at(2 * DAY_MS));

        assert_eq!(report.state, ReportState::Stable);
        assert_eq!(report.label, SUPER_STABLE_LABEL);
        assert!(report.stable_since.is_none());
    }

    #[test]
    fn test_stable_since_first_pass_after_last_failure() {
        let runs = history(&[
            (0, 1),
            (DAY_MS, 0),
            (2 * DAY_MS, 3),
            (3 * DAY_MS, 0),
            (4 * DAY_MS, 0),
        ]);

        let report = analyze(&runs, at(6 * DAY_MS));

        assert_eq!(report.state, ReportState::Stable);
        assert_eq!(report.stable_since, Some(at(3 * DAY_MS)));
        assert_eq!(report.label, "Stable for 3 days");
    }

    #[test]
    fn test_recovered_history_label() {
        let runs = history(&[(0, 2), (1, 0)]);
        let now = at(1) + Duration::days(2);

        let report = analyze(&runs, now);

        assert!(!report.is_failing());
        assert_eq!(
            report.label,
            format!("Stable for {}", human_elapsed(now - at(1)))
        );
        assert!(report.label.starts_with("Stable for "));
    }

    #[test]
    fn test_recovery_in_future_does_not_go_negative() {
        let runs = history(&[(0, 1), (DAY_MS, 0)]);

        let report = analyze(&runs, at(0));

        assert_eq!(report.label, "Stable for a few seconds");
    }
}
