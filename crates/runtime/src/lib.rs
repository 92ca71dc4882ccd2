//! Core functionality for the Glia Functions CLI
//!
//! This crate contains the foundational types and services used across the
//! CLI and the tool server: environment routing, credential resolution, the
//! persisted function context, the HTTP API client and the deployment
//! orchestrator, plus the dependency injection interfaces they are built on.

/// HTTP client for the functions API
pub mod api_client;
/// Token exchange
pub mod auth;
/// Configuration constants
pub mod config;
/// Date normalization for log queries
pub mod dates;
/// Create-version, poll, deploy
pub mod deployment;
/// Dependency injection traits and implementations
pub mod deps;
/// Environments and base URLs
pub mod environment;
/// Error type
pub mod error;
/// Config file, function context and credential resolution
pub mod settings;
/// API request and response types
pub mod types;

#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used types at the crate root
pub use api_client::{HttpFunctionsApi, build_http_client};
pub use auth::HttpAuthenticator;
pub use deployment::{
    DeploymentObserver, DeploymentOrchestrator, DeploymentOutcome, DeploymentProgress,
    DeploymentRequest, NoopObserver, PollPolicy, TaskOutcome,
};
pub use deps::{
    AsyncRuntime, Authenticator, Clock, EnvVars, FunctionsApi, MessageStyle, ProgressIndicator,
    RealAsyncRuntime, RealClock, RealEnvVars, StaticEnvVars, UserInterface,
};
pub use environment::{Environment, resolve_base_url};
pub use error::{GliaError, Result};
pub use settings::{
    ConfigStore, FunctionContext, Overrides, ResolvedSettings, StoredConfig, resolve_function_id,
    resolve_settings,
};
pub use types::{Credentials, Session};
