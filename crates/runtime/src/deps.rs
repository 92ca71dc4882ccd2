//! Dependency injection traits for testability
//!
//! This module provides trait abstractions for all external dependencies,
//! allowing for easy mocking and testing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::environment::Environment;
use crate::error::Result;
use crate::types::{
    Credentials, DeploymentTask, FunctionList, KvBulkResponse, KvListResponse, KvOperation,
    LogRange, LogsPage, MetadataUpdate, Session, StatsResponse, VersionList, VersionQuery,
    VersionRequest,
};

/// Exchanges an API key pair for a session token
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Request a token from the given environment
    async fn authenticate(
        &self,
        credentials: &Credentials,
        environment: Environment,
    ) -> Result<Session>;
}

/// Glia Functions management API operations
///
/// Every call is routed to the environment of the session it is given.
#[async_trait]
pub trait FunctionsApi: Send + Sync {
    /// Create a function
    async fn create_function(
        &self,
        session: &Session,
        site_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Value>;

    /// Upload a new version; the response carries the task reference in `self`
    async fn create_version(
        &self,
        session: &Session,
        function_id: &str,
        request: &VersionRequest,
    ) -> Result<Value>;

    /// Fetch a task by the reference returned from `create_version`
    async fn get_task(&self, session: &Session, reference: &str) -> Result<DeploymentTask>;

    /// Fetch a task by id
    async fn get_function_task(
        &self,
        session: &Session,
        function_id: &str,
        task_id: &str,
    ) -> Result<Value>;

    /// Make a version the current one
    async fn deploy_version(
        &self,
        session: &Session,
        function_id: &str,
        version_id: &str,
    ) -> Result<Value>;

    /// Fetch function details
    async fn get_function(&self, session: &Session, function_id: &str) -> Result<Value>;

    /// Fetch version details
    async fn get_version(
        &self,
        session: &Session,
        function_id: &str,
        version_id: &str,
    ) -> Result<Value>;

    /// Fetch the source of a version
    async fn get_version_code(
        &self,
        session: &Session,
        function_id: &str,
        version_id: &str,
    ) -> Result<String>;

    /// Fetch function logs within a window
    async fn get_logs(
        &self,
        session: &Session,
        function_id: &str,
        range: &LogRange,
    ) -> Result<LogsPage>;

    /// List functions of the given sites
    async fn list_functions(&self, session: &Session, site_ids: &[String]) -> Result<FunctionList>;

    /// List versions of a function
    async fn list_versions(
        &self,
        session: &Session,
        function_id: &str,
        query: &VersionQuery,
    ) -> Result<VersionList>;

    /// Invocation statistics, optionally filtered to some functions
    async fn get_stats(&self, session: &Session, function_ids: &[String])
    -> Result<StatsResponse>;

    /// Change name or description
    async fn update_metadata(
        &self,
        session: &Session,
        function_id: &str,
        update: &MetadataUpdate,
    ) -> Result<Value>;

    /// Invoke a deployed function through its invocation endpoint
    async fn invoke(&self, session: &Session, endpoint: &str, payload: &Value) -> Result<Value>;

    /// Run key-value operations against a namespace
    async fn kv_bulk(
        &self,
        session: &Session,
        namespace: &str,
        operations: &[KvOperation],
    ) -> Result<KvBulkResponse>;

    /// List pairs stored in a namespace
    async fn kv_list(
        &self,
        session: &Session,
        namespace: &str,
        max_page_size: u32,
    ) -> Result<KvListResponse>;
}

/// Time/clock operations
pub trait Clock: Send + Sync {
    /// Get current wall clock time
    fn utc_now(&self) -> DateTime<Utc>;

    /// Create duration from milliseconds
    fn duration_from_millis(&self, millis: u64) -> Duration;

    /// Create duration from seconds
    fn duration_from_secs(&self, secs: u64) -> Duration;
}

/// Process environment lookups
pub trait EnvVars: Send + Sync {
    /// Value of a variable; empty values count as unset
    fn var(&self, name: &str) -> Option<String>;
}

/// User interface operations
pub trait UserInterface: Send + Sync {
    /// Create a spinner progress indicator
    fn create_spinner(&self) -> Box<dyn ProgressIndicator>;

    /// Print a message
    fn print(&self, message: &str);

    /// Print a styled message
    fn print_styled(&self, message: &str, style: MessageStyle);

    /// Check if running in interactive mode
    fn is_interactive(&self) -> bool;

    /// Prompt for text input. An empty answer is accepted and yields the
    /// default, or an empty string when there is none.
    fn prompt_input(&self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Prompt for hidden input; an empty answer is accepted
    fn prompt_password(&self, prompt: &str) -> Result<String>;

    /// Prompt for selection
    fn prompt_select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize>;
}

/// Progress indicator trait
pub trait ProgressIndicator: Send + Sync {
    /// Set the message
    fn set_message(&self, message: &str);

    /// Finish and clear the progress
    fn finish_and_clear(&self);

    /// Enable steady tick
    fn enable_steady_tick(&self, duration: Duration);

    /// Finish with a message
    fn finish_with_message(&self, message: String);
}

/// Message styling options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    /// Bold text style
    Bold,
    /// Cyan colored text
    Cyan,
    /// Green colored text
    Green,
    /// Red colored text
    Red,
    /// Yellow colored text
    Yellow,
    /// Dimmed text
    Dim,
    /// Warning style (typically yellow)
    Warning,
    /// Error style (typically red)
    Error,
    /// Success style (typically green)
    Success,
}

/// Async runtime operations
#[async_trait]
pub trait AsyncRuntime: Send + Sync {
    /// Sleep for a duration
    async fn sleep(&self, duration: Duration);
}

// Production implementations

/// Production clock implementation
pub struct RealClock;

impl Clock for RealClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn duration_from_millis(&self, millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn duration_from_secs(&self, secs: u64) -> Duration {
        Duration::from_secs(secs)
    }
}

/// Production async runtime implementation
pub struct RealAsyncRuntime;

#[async_trait]
impl AsyncRuntime for RealAsyncRuntime {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Reads the real process environment
pub struct RealEnvVars;

impl EnvVars for RealEnvVars {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

/// Fixed set of variables, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticEnvVars {
    vars: std::collections::HashMap<String, String>,
}

impl StaticEnvVars {
    /// Build from name/value pairs
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvVars for StaticEnvVars {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|value| !value.is_empty()).cloned()
    }
}
