use chrono::Duration;

const SECONDS_THRESHOLD: f64 = 45.0;
const MINUTES_THRESHOLD: f64 = 45.0;
const HOURS_THRESHOLD: f64 = 22.0;
const DAYS_THRESHOLD: f64 = 26.0;
const MONTHS_THRESHOLD: f64 = 11.0;

const DAYS_PER_MONTH: f64 = 30.436_875;
const DAYS_PER_YEAR: f64 = 365.2425;

/// Renders an approximate, suffix-free duration such as "3 days" or "a month".
/// Negative durations are treated as zero.
#[allow(clippy::cast_precision_loss)]
pub fn human_elapsed(elapsed: Duration) -> String {
    let exact_seconds = elapsed.num_milliseconds().max(0) as f64 / 1000.0;

    let seconds = exact_seconds.round();
    let minutes = (exact_seconds / 60.0).round();
    let hours = (exact_seconds / 3_600.0).round();
    let days = (exact_seconds / 86_400.0).round();
    let months = (exact_seconds / 86_400.0 / DAYS_PER_MONTH).round();
    let years = (exact_seconds / 86_400.0 / DAYS_PER_YEAR).round();

    if seconds < SECONDS_THRESHOLD {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < MINUTES_THRESHOLD {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < HOURS_THRESHOLD {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < DAYS_THRESHOLD {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < MONTHS_THRESHOLD {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}
