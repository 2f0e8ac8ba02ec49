use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::raw::RawRun;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    /// Name of the scenario the failing step belongs to.
    pub test: String,
    pub message: Option<String>,
}

/// Pass/fail counts for one CI run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errors: Vec<FailureDetail>,
    pub when: DateTime<Utc>,
}

impl RunSummary {
    pub fn is_failing(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// Flattens a feature/scenario/step tree into counts. Every step that did not
/// report `passed` is a failure and yields one `FailureDetail`.
pub fn summarize(run: &RawRun) -> RunSummary {
    let (passed, errors) = run
        .features
        .iter()
        .flat_map(|feature| feature.scenarios.iter())
        .flat_map(|scenario| scenario.steps.iter().map(move |step| (scenario, step)))
        .fold(
            (0, Vec::new()),
            |(mut passed, mut errors), (scenario, step)| {
                if step.result.is_passed() {
                    passed += 1;
                } else {
                    errors.push(FailureDetail {
                        test: scenario.display_name().to_string(),
                        message: step.error.clone(),
                    });
                }
                (passed, errors)
            },
        );

    RunSummary {
        passed,
        failed: errors.len(),
        errors,
        when: run.timestamp,
    }
}
