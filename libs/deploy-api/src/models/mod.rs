//! API models

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Application process request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProcessRequest {
    pub application: String,
    pub application_process: String,
    pub description: String,
    pub environment: String,
    pub only_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(default)]
    pub versions: Vec<RequestedVersion>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A single component version requested for deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedVersion {
    pub component: String,
    pub version: String,
}

/// Response to an application process request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequestResponse {
    pub request_id: Uuid,
}

/// Status of an application process request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRequestStatus {
    /// Execution status, e.g. "EXECUTING" or "CLOSED"
    #[serde(default)]
    pub status: String,

    /// Result, e.g. "NONE", "SUCCEEDED" or "FAULTED"
    #[serde(default)]
    pub result: String,
}

/// Request property definition of an application process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub required: bool,
    #[serde(default)]
    pub label: Option<String>,
}

/// Snapshot creation body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSnapshotRequest {
    pub name: String,
    pub description: String,
    pub application: String,

    /// One `{component: version}` object per version
    #[serde(default)]
    pub versions: Vec<BTreeMap<String, String>>,
}

/// A component and the versions a snapshot currently holds for it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotComponent {
    pub name: String,
    #[serde(default)]
    pub desired_versions: Vec<SnapshotVersion>,
}

/// A version held by a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVersion {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

/// Application listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub name: String,
}

/// Application detail, trimmed to the fields used for property lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub prop_sheet: PropSheetRef,
}

/// Reference to the current version of a property sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropSheetRef {
    #[serde(deserialize_with = "string_or_number")]
    pub version_count: String,
}

/// Property sheet payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertySheet {
    #[serde(default)]
    pub properties: Vec<PropertyValue>,
}

/// A property on a property sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub secure: bool,
}

/// Application process creation body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProcessRequest {
    pub application: String,
    pub name: String,
    pub description: String,
    pub component: String,
}

/// The server reports some flags as JSON booleans and others as strings
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid boolean: {}", other))),
        },
        serde_json::Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid boolean: {}", other))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
