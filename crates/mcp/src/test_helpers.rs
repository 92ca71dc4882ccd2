//! Mocks and a fixture for tool tests

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use glia_runtime::deps::{AsyncRuntime, Authenticator, Clock, EnvVars, FunctionsApi, StaticEnvVars};
use glia_runtime::environment::Environment;
use glia_runtime::error::Result;
use glia_runtime::settings::ConfigStore;
use glia_runtime::types::{
    Credentials, DeploymentTask, FunctionList, KvBulkResponse, KvListResponse, KvOperation,
    LogRange, LogsPage, MetadataUpdate, Session, StatsResponse, VersionList, VersionQuery,
    VersionRequest,
};

use crate::tools::{GliaTools, ToolContext};

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
    pub AuthenticatorMock {}

    #[async_trait]
    impl Authenticator for AuthenticatorMock {
        async fn authenticate(&self, credentials: &Credentials, environment: Environment) -> Result<Session>;
    }
}

mock! {
    pub ClockMock {}

    impl Clock for ClockMock {
        fn utc_now(&self) -> chrono::DateTime<chrono::Utc>;
        fn duration_from_millis(&self, millis: u64) -> std::time::Duration;
        fn duration_from_secs(&self, secs: u64) -> std::time::Duration;
    }
}

mock! {
    pub AsyncRuntimeMock {}

    #[async_trait]
    impl AsyncRuntime for AsyncRuntimeMock {
        async fn sleep(&self, duration: std::time::Duration);
    }
}

/// Mocks plus a private config directory for one tool test
pub struct ToolFixture {
    /// API mock
    pub api: MockFunctionsApiMock,
    /// Authenticator mock
    pub authenticator: MockAuthenticatorMock,
    /// Clock mock; durations pass through
    pub clock: MockClockMock,
    /// Runtime mock
    pub async_runtime: MockAsyncRuntimeMock,
    /// Process environment
    pub env: StaticEnvVars,
    /// Holds the config file
    pub dir: TempDir,
}

impl ToolFixture {
    /// Fixture with an empty config
    pub fn new() -> Self {
        let mut clock = MockClockMock::new();
        clock
            .expect_duration_from_secs()
            .returning(std::time::Duration::from_secs);

        Self {
            api: MockFunctionsApiMock::new(),
            authenticator: MockAuthenticatorMock::new(),
            clock,
            async_runtime: MockAsyncRuntimeMock::new(),
            env: StaticEnvVars::default(),
            dir: TempDir::new().unwrap(),
        }
    }

    /// Fixture with credentials, a site and the beta environment stored
    pub fn configured() -> Self {
        let fixture = Self::new();
        fixture.write_config(&serde_json::json!({
            "api_key_id": "test-key-id",
            "api_key_secret": "test-key-secret",
            "site_id": "site-1",
            "environment": "beta"
        }));
        fixture
    }

    /// Config store inside the fixture directory
    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(self.dir.path().join("config.json"))
    }

    /// Overwrite the config file
    pub fn write_config(&self, config: &Value) {
        std::fs::write(
            self.dir.path().join("config.json"),
            serde_json::to_string_pretty(config).unwrap(),
        )
        .unwrap();
    }

    /// Accept any authentication and echo the requested environment back
    pub fn expect_login(&mut self) {
        self.authenticator
            .expect_authenticate()
            .returning(|credentials, environment| {
                Ok(Session {
                    token: "test-token".to_string(),
                    environment,
                    site_ids: credentials.site_ids.clone(),
                })
            });
    }

    /// Build the handler; the returned directory must outlive it
    pub fn into_tools(self) -> (GliaTools, TempDir) {
        let store = self.store();
        let ctx = ToolContext {
            api: Arc::new(self.api) as Arc<dyn FunctionsApi>,
            authenticator: Arc::new(self.authenticator) as Arc<dyn Authenticator>,
            clock: Arc::new(self.clock) as Arc<dyn Clock>,
            async_runtime: Arc::new(self.async_runtime) as Arc<dyn AsyncRuntime>,
            env: Arc::new(self.env) as Arc<dyn EnvVars>,
            store,
            cancel: CancellationToken::new(),
        };
        (GliaTools::new(ctx), self.dir)
    }
}
