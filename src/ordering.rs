use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::report::ReportViewModel;

fn latest_when(report: &ReportViewModel) -> Option<DateTime<Utc>> {
    report.latest().map(|latest| latest.when)
}

/// Failing reports first, then most recent latest run first. Reports without
/// history sort after everything else.
pub fn compare_reports(a: &ReportViewModel, b: &ReportViewModel) -> Ordering {
    b.is_failing
        .cmp(&a.is_failing)
        .then_with(|| latest_when(b).cmp(&latest_when(a)))
}

pub fn order(mut reports: Vec<ReportViewModel>) -> Vec<ReportViewModel> {
    reports.sort_by(compare_reports);
    reports
}
