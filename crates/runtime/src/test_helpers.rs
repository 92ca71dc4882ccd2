//! Mock implementations for runtime tests

use std::sync::Mutex;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use crate::deployment::{DeploymentObserver, DeploymentProgress};
use crate::deps::{AsyncRuntime, FunctionsApi};
use crate::environment::Environment;
use crate::error::Result;
use crate::types::{
    DeploymentTask, FunctionList, KvBulkResponse, KvListResponse, KvOperation, LogRange,
    LogsPage, MetadataUpdate, Session, StatsResponse, VersionList, VersionQuery, VersionRequest,
};

mock! {
    pub FunctionsApiMock {}

    #[async_trait]
    impl FunctionsApi for FunctionsApiMock {
        async fn create_function(&self, session: &Session, site_id: &str, name: &str, description: &str) -> Result<Value>;
        async fn create_version(&self, session: &Session, function_id: &str, request: &VersionRequest) -> Result<Value>;
        async fn get_task(&self, session: &Session, reference: &str) -> Result<DeploymentTask>;
        async fn get_function_task(&self, session: &Session, function_id: &str, task_id: &str) -> Result<Value>;
        async fn deploy_version(&self, session: &Session, function_id: &str, version_id: &str) -> Result<Value>;
        async fn get_function(&self, session: &Session, function_id: &str) -> Result<Value>;
        async fn get_version(&self, session: &Session, function_id: &str, version_id: &str) -> Result<Value>;
        async fn get_version_code(&self, session: &Session, function_id: &str, version_id: &str) -> Result<String>;
        async fn get_logs(&self, session: &Session, function_id: &str, range: &LogRange) -> Result<LogsPage>;
        async fn list_functions(&self, session: &Session, site_ids: &[String]) -> Result<FunctionList>;
        async fn list_versions(&self, session: &Session, function_id: &str, query: &VersionQuery) -> Result<VersionList>;
        async fn get_stats(&self, session: &Session, function_ids: &[String]) -> Result<StatsResponse>;
        async fn update_metadata(&self, session: &Session, function_id: &str, update: &MetadataUpdate) -> Result<Value>;
        async fn invoke(&self, session: &Session, endpoint: &str, payload: &Value) -> Result<Value>;
        async fn kv_bulk(&self, session: &Session, namespace: &str, operations: &[KvOperation]) -> Result<KvBulkResponse>;
        async fn kv_list(&self, session: &Session, namespace: &str, max_page_size: u32) -> Result<KvListResponse>;
    }
}

mock! {
    pub AsyncRuntimeMock {}

    #[async_trait]
    impl AsyncRuntime for AsyncRuntimeMock {
        async fn sleep(&self, duration: std::time::Duration);
    }
}

/// Session for the given environment
pub fn test_session(environment: Environment) -> Session {
    Session {
        token: "test-token".to_string(),
        environment,
        site_ids: vec!["site-1".to_string()],
    }
}

/// Task document with the given status
pub fn task(status: &str) -> DeploymentTask {
    DeploymentTask::from_value(serde_json::json!({ "status": status }))
}

/// Completed task carrying a version id
pub fn completed_task(version_id: &str) -> DeploymentTask {
    DeploymentTask::from_value(serde_json::json!({
        "status": "completed",
        "entity": { "id": version_id }
    }))
}

/// Observer recording every notification
#[derive(Default)]
pub struct RecordingObserver {
    /// Notifications in order
    pub events: Mutex<Vec<DeploymentProgress>>,
}

impl RecordingObserver {
    /// Snapshot of the recorded notifications
    pub fn events(&self) -> Vec<DeploymentProgress> {
        self.events.lock().unwrap().clone()
    }
}

impl DeploymentObserver for RecordingObserver {
    fn on_progress(&self, progress: &DeploymentProgress) {
        self.events.lock().unwrap().push(progress.clone());
    }
}
