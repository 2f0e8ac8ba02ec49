use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notifications pushed by the collector.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum InboundEvent {
    /// Full snapshot of every monitored item. Items stay undecoded so one bad
    /// entry cannot reject the whole batch.
    #[serde(rename = "tests:updated")]
    ReportsUpdated(Vec<Value>),
    #[serde(rename = "pipelines:names")]
    PipelineNames(Vec<String>),
    #[serde(rename = "tests:message")]
    Message(String),
}

/// Requests sent back to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum OutboundEvent {
    #[serde(rename = "tests:get")]
    Get,
    #[serde(rename = "tests:add")]
    Add(String),
    #[serde(rename = "tests:remove")]
    Remove(String),
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReportsUpdated(_) => "tests:updated",
            Self::PipelineNames(_) => "pipelines:names",
            Self::Message(_) => "tests:message",
        }
    }
}
