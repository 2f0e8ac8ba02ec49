use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Result, TestboardError};

/// One monitored item as delivered by the collector in a `tests:updated` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub pipeline: String,
    pub stage: String,
    pub job: String,
    /// Cucumber run history; absent for items the collector has not sampled yet.
    #[serde(default, rename = "cucumber")]
    pub runs: Option<Vec<RawRun>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRun {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub features: Vec<RawFeature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub scenarios: Vec<RawScenario>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawScenario {
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

impl RawScenario {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    #[serde(default)]
    pub result: StepResult,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub error: Option<String>,
}

/// Only the literal `"passed"` passes. Skipped, pending, undefined, `null`,
/// missing or non-string results all count as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<Value>")]
pub enum StepResult {
    Passed,
    #[default]
    NotPassed,
}

impl StepResult {
    pub fn is_passed(self) -> bool {
        self == Self::Passed
    }
}

impl From<Option<Value>> for StepResult {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(s)) if s == "passed" => Self::Passed,
            _ => Self::NotPassed,
        }
    }
}

/// Text fields the reporter fills loosely: strings pass through, `null` is
/// absent, anything else is kept in its JSON form.
fn deserialize_lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Text(DateTime<Utc>),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms).ok_or_else(|| {
            serde::de::Error::custom(format!("timestamp {ms} is out of range"))
        }),
        WireTimestamp::Text(ts) => Ok(ts),
    }
}

impl RawItem {
    /// Decodes a single item, reporting its id (when one can be found) on failure.
    pub fn from_value(value: Value) -> Result<Self> {
        let id = value
            .get("_id")
            .or_else(|| value.get("id"))
            .map_or_else(|| "<unknown>".to_string(), |id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        serde_json::from_value(value).map_err(|e| TestboardError::MalformedItem {
            id,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_item_with_millis_timestamp() {
        let item = RawItem::from_value(json!({
            "_id": "a1",
            "pipeline": "web",
            "stage": "test",
            "job": "cucumber",
            "cucumber": [{
                "timestamp": 1_476_000_000_000_i64,
                "features": [{ "scenarios": [{ "name": "Login", "steps": [
                    { "result": "passed" },
                    { "result": "failed", "error": "boom" }
                ]}]}]
            }]
        }))
        .unwrap();

        assert_eq!(item.id, "a1");
        let runs = item.runs.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].timestamp.timestamp_millis(), 1_476_000_000_000);
        let steps = &runs[0].features[0].scenarios[0].steps;
        assert_eq!(steps[0].result, StepResult::Passed);
        assert_eq!(steps[1].result, StepResult::NotPassed);
        assert_eq!(steps[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_decode_rfc3339_timestamp() {
        let run: RawRun = serde_json::from_value(json!({
            "timestamp": "2016-10-09T08:00:00Z",
            "features": []
        }))
        .unwrap();

        assert_eq!(run.timestamp.to_rfc3339(), "2016-10-09T08:00:00+00:00");
    }

    #[test]
    fn test_missing_history_decodes_as_none() {
        let item = RawItem::from_value(json!({
            "id": "b2", "pipeline": "api", "stage": "qa", "job": "smoke"
        }))
        .unwrap();

        assert_eq!(item.id, "b2");
        assert!(item.runs.is_none());
    }

    #[test]
    fn test_unknown_step_result_is_not_passed() {
        let step: RawStep = serde_json::from_value(json!({ "result": "skipped" })).unwrap();

        assert_eq!(step.result, StepResult::NotPassed);
        assert!(step.error.is_none());
    }

    #[test]
    fn test_missing_step_result_is_not_passed() {
        let step: RawStep = serde_json::from_value(json!({})).unwrap();

        assert!(!step.result.is_passed());
    }

    #[test]
    fn test_null_or_non_string_step_result_is_not_passed() {
        let null_result: RawStep =
            serde_json::from_value(json!({ "result": null, "error": "boom" })).unwrap();
        let numeric_result: RawStep = serde_json::from_value(json!({ "result": 1 })).unwrap();
        let object_result: RawStep =
            serde_json::from_value(json!({ "result": { "status": "passed" } })).unwrap();

        assert_eq!(null_result.result, StepResult::NotPassed);
        assert_eq!(null_result.error.as_deref(), Some("boom"));
        assert_eq!(numeric_result.result, StepResult::NotPassed);
        assert_eq!(object_result.result, StepResult::NotPassed);
    }

    #[test]
    fn test_loose_text_fields_do_not_reject_item() {
        let item = RawItem::from_value(json!({
            "_id": "d4", "pipeline": "web", "stage": "test", "job": "j",
            "cucumber": [{
                "timestamp": 0,
                "features": [{ "scenarios": [
                    { "name": null, "steps": [{ "result": "failed", "error": 42 }] },
                    { "name": 7, "steps": [{ "result": "failed", "error": null }] }
                ]}]
            }]
        }))
        .unwrap();

        let runs = item.runs.unwrap();
        let scenarios = &runs[0].features[0].scenarios;
        assert_eq!(scenarios[0].display_name(), "");
        assert_eq!(scenarios[0].steps[0].error.as_deref(), Some("42"));
        assert_eq!(scenarios[1].display_name(), "7");
        assert!(scenarios[1].steps[0].error.is_none());
    }

    #[test]
    fn test_malformed_item_reports_id() {
        let err = RawItem::from_value(json!({
            "_id": "c3", "pipeline": "web", "stage": "test", "job": "j",
            "cucumber": "not a list"
        }))
        .unwrap_err();

        match err {
            TestboardError::MalformedItem { id, .. } => assert_eq!(id, "c3"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_item_without_id() {
        let err = RawItem::from_value(json!({ "pipeline": 3 })).unwrap_err();

        assert!(err.to_string().contains("<unknown>"));
    }
}
