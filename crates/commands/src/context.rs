//! Per-invocation dependencies and resolved settings shared by every command

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use glia_runtime::deps::{
    AsyncRuntime, Authenticator, Clock, EnvVars, FunctionsApi, MessageStyle, UserInterface,
};
use glia_runtime::environment::Environment;
use glia_runtime::settings::{
    ConfigStore, FunctionContext, Overrides, ResolvedSettings, function_label, resolve_function_id,
    resolve_settings,
};
use glia_runtime::types::Session;

/// Flags accepted by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Environment override
    pub environment: Option<Environment>,
    /// Site override
    pub site_id: Option<String>,
    /// Print extra detail
    pub verbose: bool,
}

impl GlobalArgs {
    /// Settings overrides carried by the flags
    pub fn overrides(&self) -> Overrides {
        Overrides {
            environment: self.environment,
            site_id: self.site_id.clone(),
        }
    }
}

/// Dependencies for all commands
pub struct CommandDependencies {
    /// User interface for output
    pub ui: Arc<dyn UserInterface>,
    /// Functions API client
    pub api: Arc<dyn FunctionsApi>,
    /// Token exchange
    pub authenticator: Arc<dyn Authenticator>,
    /// Clock for time operations
    pub clock: Arc<dyn Clock>,
    /// Async runtime for sleeping between polls
    pub async_runtime: Arc<dyn AsyncRuntime>,
    /// Process environment
    pub env: Arc<dyn EnvVars>,
    /// Config file
    pub store: ConfigStore,
    /// Global flags
    pub global: GlobalArgs,
    /// Fires on Ctrl-C
    pub cancel: CancellationToken,
}

impl CommandDependencies {
    /// Production dependencies
    pub fn real(global: GlobalArgs, cancel: CancellationToken) -> Result<Arc<Self>> {
        use glia_common::RealUserInterface;
        use glia_runtime::api_client::{HttpFunctionsApi, build_http_client};
        use glia_runtime::auth::HttpAuthenticator;
        use glia_runtime::deps::{RealAsyncRuntime, RealClock, RealEnvVars};

        let env: Arc<dyn EnvVars> = Arc::new(RealEnvVars);
        let store = ConfigStore::from_env(env.as_ref())?;
        let http = build_http_client()?;

        Ok(Arc::new(Self {
            ui: Arc::new(RealUserInterface),
            api: Arc::new(HttpFunctionsApi::new(http.clone())),
            authenticator: Arc::new(HttpAuthenticator::new(http)),
            clock: Arc::new(RealClock),
            async_runtime: Arc::new(RealAsyncRuntime),
            env,
            store,
            global,
            cancel,
        }))
    }

    /// Settings layered from flags, the config file and the environment
    pub fn settings(&self) -> Result<ResolvedSettings> {
        let stored = self.store.load()?;
        Ok(resolve_settings(
            &stored,
            &self.global.overrides(),
            self.env.as_ref(),
        ))
    }

    /// Authenticate against the resolved environment
    pub async fn session(&self) -> Result<(Session, ResolvedSettings)> {
        let settings = self.settings()?;
        let credentials = settings.require_credentials()?;

        if self.global.verbose {
            self.ui.print_styled(
                &format!("Using environment: {}", settings.environment),
                MessageStyle::Dim,
            );
            if let Some(site_id) = &settings.site_id {
                self.ui
                    .print_styled(&format!("Using site ID: {site_id}"), MessageStyle::Dim);
            }
        }

        debug!(environment = %settings.environment, "exchanging API key for a session token");
        let session = self
            .authenticator
            .authenticate(credentials, settings.environment)
            .await?;
        Ok((session, settings))
    }

    /// Authenticate for a site scoped operation, checking the site first
    pub async fn site_session(&self) -> Result<(Session, String)> {
        let site_id = self.settings()?.require_site_id()?.to_string();
        let (session, _) = self.session().await?;
        Ok((session, site_id))
    }

    /// The selected function, if any
    pub fn current_function(&self) -> Result<Option<FunctionContext>> {
        Ok(self.store.current_function()?)
    }

    /// The function to operate on plus a display label
    pub fn target_function(&self, explicit: Option<&str>) -> Result<(String, String)> {
        let current = self.current_function()?;
        let id = resolve_function_id(explicit, current.as_ref())?;
        let label = function_label(&id, explicit, current.as_ref());
        Ok((id, label))
    }

    /// Pretty print a JSON value
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to format response")?;
        self.ui.print(&text);
        Ok(())
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        self.ui.print_styled(&format!("✓ {message}"), MessageStyle::Success);
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        self.ui.print_styled(message, MessageStyle::Cyan);
    }
}
