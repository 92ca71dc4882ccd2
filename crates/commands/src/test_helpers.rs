//! Test helper utilities and mock implementations for glia-commands

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use glia_runtime::deps::*;
use glia_runtime::environment::Environment;
use glia_runtime::error::Result;
use glia_runtime::settings::ConfigStore;
use glia_runtime::types::{
    Credentials, DeploymentTask, FunctionList, KvBulkResponse, KvListResponse, KvOperation,
    LogRange, LogsPage, MetadataUpdate, Session, StatsResponse, VersionList, VersionQuery,
    VersionRequest,
};

use crate::context::{CommandDependencies, GlobalArgs};

/// Test implementation of the `UserInterface` trait that captures all output.
pub use glia_common::ui::TestUserInterface;

// Mock implementation of the FunctionsApi trait.
//
// # Example
//
// ```rust
// let mut api = MockFunctionsApiMock::new();
// api.expect_get_function()
//     .withf(|_, id| id == "fn-1")
//     .times(1)
//     .returning(|_, _| Ok(serde_json::json!({"id": "fn-1"})));
// ```
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

// Mock implementation of the Authenticator trait.
mock! {
    pub AuthenticatorMock {}

    #[async_trait]
    impl Authenticator for AuthenticatorMock {
        async fn authenticate(&self, credentials: &Credentials, environment: Environment) -> Result<Session>;
    }
}

// Mock implementation of the Clock trait for controlling time in tests.
mock! {
    pub ClockMock {}

    impl Clock for ClockMock {
        fn utc_now(&self) -> chrono::DateTime<chrono::Utc>;
        fn duration_from_millis(&self, millis: u64) -> std::time::Duration;
        fn duration_from_secs(&self, secs: u64) -> std::time::Duration;
    }
}

// Mock implementation of the AsyncRuntime trait for testing polling loops.
mock! {
    pub AsyncRuntimeMock {}

    #[async_trait]
    impl AsyncRuntime for AsyncRuntimeMock {
        async fn sleep(&self, duration: std::time::Duration);
    }
}

/// Mocks plus a private config directory for one command test
pub struct TestFixture {
    /// API mock
    pub api: MockFunctionsApiMock,
    /// Authenticator mock
    pub authenticator: MockAuthenticatorMock,
    /// Clock mock; durations pass through by default
    pub clock: MockClockMock,
    /// Runtime mock
    pub async_runtime: MockAsyncRuntimeMock,
    /// Captured UI
    pub ui: Arc<TestUserInterface>,
    /// Process environment seen by the command
    pub env: StaticEnvVars,
    /// Global flags
    pub global: GlobalArgs,
    /// Cancellation token handed to the command
    pub cancel: CancellationToken,
    /// Holds the config file
    pub dir: TempDir,
}

impl TestFixture {
    /// Fixture with an empty config
    pub fn new() -> Self {
        let mut clock = MockClockMock::new();
        clock
            .expect_duration_from_secs()
            .returning(std::time::Duration::from_secs);
        clock
            .expect_duration_from_millis()
            .returning(std::time::Duration::from_millis);

        Self {
            api: MockFunctionsApiMock::new(),
            authenticator: MockAuthenticatorMock::new(),
            clock,
            async_runtime: MockAsyncRuntimeMock::new(),
            ui: Arc::new(TestUserInterface::new()),
            env: StaticEnvVars::default(),
            global: GlobalArgs::default(),
            cancel: CancellationToken::new(),
            dir: TempDir::new().unwrap(),
        }
    }

    /// Fixture whose config holds credentials, a site and an environment
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

    /// Replace the UI
    #[must_use]
    pub fn with_ui(mut self, ui: TestUserInterface) -> Self {
        self.ui = Arc::new(ui);
        self
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

    /// Write a file in the fixture directory and return its path
    pub fn write_file(&self, name: &str, content: &str) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
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

    /// Build the dependencies; the returned directory must outlive them
    #[allow(clippy::wrong_self_convention)]
    pub fn to_deps(self) -> (Arc<CommandDependencies>, TempDir) {
        let store = self.store();
        let deps = Arc::new(CommandDependencies {
            ui: self.ui as Arc<dyn UserInterface>,
            api: Arc::new(self.api) as Arc<dyn FunctionsApi>,
            authenticator: Arc::new(self.authenticator) as Arc<dyn Authenticator>,
            clock: Arc::new(self.clock) as Arc<dyn Clock>,
            async_runtime: Arc::new(self.async_runtime) as Arc<dyn AsyncRuntime>,
            env: Arc::new(self.env) as Arc<dyn EnvVars>,
            store,
            global: self.global,
            cancel: self.cancel,
        });
        (deps, self.dir)
    }
}

/// A function listing entry
pub fn function_json(id: &str, name: &str, version: Option<&str>) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "current_version_id": version,
        "site_id": "site-1"
    })
}
