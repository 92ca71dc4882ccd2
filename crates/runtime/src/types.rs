//! Request and response types of the Glia Functions API

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::environment::Environment;

/// Environment variables attached to a function version
pub type EnvironmentVariables = Map<String, Value>;

/// API key pair plus the sites the token should be scoped to
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// API key identifier
    pub api_key_id: String,
    /// API key secret
    pub api_key_secret: String,
    /// Sites the issued token may act on
    pub site_ids: Vec<String>,
}

impl Credentials {
    /// Key id shortened for display
    pub fn masked_key_id(&self) -> String {
        mask_key_id(&self.api_key_id)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_id", &self.masked_key_id())
            .field("api_key_secret", &"*****")
            .field("site_ids", &self.site_ids)
            .finish()
    }
}

/// First eight characters of a key id followed by an ellipsis
pub fn mask_key_id(key_id: &str) -> String {
    let prefix: String = key_id.chars().take(8).collect();
    format!("{prefix}...")
}

/// An authenticated session bound to one environment
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// Environment the token was issued by
    pub environment: Environment,
    /// Sites the token is scoped to
    pub site_ids: Vec<String>,
}

impl Session {
    /// Base URL every call made with this session goes to
    pub const fn base_url(&self) -> &'static str {
        self.environment.base_url()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("environment", &self.environment)
            .field("site_ids", &self.site_ids)
            .finish()
    }
}

/// Body of the token request
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    /// Secret
    pub api_key_secret: &'a str,
    /// Key id
    pub api_key_id: &'a str,
    /// Sites to scope the token to
    pub site_ids: &'a [String],
}

/// A function as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSummary {
    /// Function id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Free text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Currently deployed version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version_id: Option<String>,
    /// Owning site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    /// Any other fields the API returns
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the function listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionList {
    /// Functions visible to the token
    #[serde(default)]
    pub functions: Vec<FunctionSummary>,
}

/// Body of the create function request
#[derive(Debug, Serialize)]
pub struct CreateFunctionRequest<'a> {
    /// Site the function belongs to
    pub site_id: &'a str,
    /// Display name
    pub name: &'a str,
    /// Description
    pub description: &'a str,
}

/// Body of the create version request
#[derive(Debug, Clone, Serialize)]
pub struct VersionRequest {
    /// Bundled JavaScript
    pub code: String,
    /// Environment variables for the version
    pub environment_variables: EnvironmentVariables,
    /// Runtime compatibility date
    pub compatibility_date: String,
}

/// A function version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Version id
    pub id: String,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Compatibility date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_date: Option<String>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<Value>,
    /// Any other fields the API returns
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the version listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionList {
    /// Versions, newest first unless asked otherwise
    #[serde(default)]
    pub versions: Vec<Version>,
}

/// Sort order for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl SortOrder {
    /// Query string value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = crate::error::GliaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(crate::error::GliaError::validation(format!(
                "Invalid order '{other}', expected 'asc' or 'desc'"
            ))),
        }
    }
}

/// Paging options for the version listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionQuery {
    /// Page size
    pub per_page: u32,
    /// Sort order on `created_at`
    pub order: SortOrder,
}

impl Default for VersionQuery {
    fn default() -> Self {
        Self {
            per_page: crate::config::DEFAULT_VERSIONS_PER_PAGE,
            order: SortOrder::Desc,
        }
    }
}

/// Status of a deployment task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Still running
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Any other value, including a missing status
    Other(String),
}

impl TaskStatus {
    /// Interpret the raw status field
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("processing") => Self::Processing,
            Some("completed") => Self::Completed,
            Some("failed") => Self::Failed,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other("unknown".to_string()),
        }
    }

    /// True while the task has not reached a terminal state
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }

    /// Status as text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deployment task document
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentTask {
    /// Parsed status
    pub status: TaskStatus,
    /// The document as returned by the API
    pub raw: Value,
}

impl DeploymentTask {
    /// Wrap a raw task document
    pub fn from_value(raw: Value) -> Self {
        let status = TaskStatus::from_raw(raw.get("status").and_then(Value::as_str));
        Self { status, raw }
    }

    /// Id of the version the task produced
    pub fn version_id(&self) -> Option<String> {
        self.raw
            .get("entity")
            .and_then(|entity| entity.get("id"))
            .and_then(|id| match id {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Error detail reported by a failed task
    pub fn error_detail(&self) -> String {
        ["error", "message", "reason"]
            .iter()
            .find_map(|key| self.raw.get(*key))
            .map_or_else(
                || "no error detail reported".to_string(),
                |detail| match detail {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            )
    }
}

/// Task reference taken from the `self` field of a create-version response
pub fn task_reference(response: &Value) -> Option<String> {
    response
        .get("self")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalized time window for log queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRange {
    /// Inclusive start, `YYYY-MM-DDTHH:MM:SSZ` or passthrough ISO
    pub start: Option<String>,
    /// Inclusive end
    pub end: Option<String>,
}

/// One page of function logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsPage {
    /// Log entries
    #[serde(default)]
    pub logs: Vec<Value>,
    /// Opaque cursor for the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<Value>,
}

/// Daily invocation count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInvocations {
    /// Day
    #[serde(default)]
    pub date: String,
    /// Invocations that day
    #[serde(default)]
    pub count: u64,
}

/// Invocation statistics for one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionStats {
    /// Function id
    #[serde(default)]
    pub function_id: String,
    /// Per day counts
    #[serde(default)]
    pub invocations: Vec<DailyInvocations>,
}

impl FunctionStats {
    /// Sum of all daily counts
    pub fn total_invocations(&self) -> u64 {
        self.invocations.iter().map(|day| day.count).sum()
    }
}

/// Response of the statistics endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// One entry per function
    #[serde(default)]
    pub statistics: Vec<FunctionStats>,
}

/// Partial update of function metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataUpdate {
    /// New name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MetadataUpdate {
    /// True when nothing would change
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Kind of key-value operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KvOp {
    /// Write a value
    Set,
    /// Read a value
    Get,
    /// Remove a value
    Delete,
}

/// A single key-value operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvOperation {
    /// Operation
    pub op: KvOp,
    /// Key
    pub key: String,
    /// Value, only for `set`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl KvOperation {
    /// A `set` operation
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        Self {
            op: KvOp::Set,
            key: key.into(),
            value: Some(value),
        }
    }

    /// A `get` operation
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            op: KvOp::Get,
            key: key.into(),
            value: None,
        }
    }

    /// A `delete` operation
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            op: KvOp::Delete,
            key: key.into(),
            value: None,
        }
    }
}

/// A stored key-value pair or the result of one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvItem {
    /// Key, present in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Value
    #[serde(default)]
    pub value: Value,
    /// Expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<Value>,
}

/// Response of a bulk key-value request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvBulkResponse {
    /// One result per operation, in order
    #[serde(default)]
    pub results: Vec<KvItem>,
}

/// Response of a key-value listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KvListResponse {
    /// Pairs in the namespace
    #[serde(default)]
    pub items: Vec<KvItem>,
}
