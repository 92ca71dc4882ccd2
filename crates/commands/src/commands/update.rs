//! Upload new code, wait for the build task and deploy the result

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use tracing::{debug, info};

use glia_runtime::config::DEFAULT_POLL_INTERVAL_SECS;
use glia_runtime::deployment::{
    DeploymentObserver, DeploymentOrchestrator, DeploymentProgress, DeploymentRequest, PollPolicy,
};
use glia_runtime::deps::{MessageStyle, ProgressIndicator, UserInterface};
use glia_runtime::error::GliaError;
use glia_runtime::types::EnvironmentVariables;

use crate::context::CommandDependencies;

/// Update command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Bundled JavaScript file
    pub code: PathBuf,
    /// JSON object of environment variables
    pub env_file: PathBuf,
    /// Build the version without deploying it
    pub no_deploy: bool,
    /// Stop polling after this many attempts
    pub max_polls: Option<u32>,
}

/// Read a JSON object of environment variables
pub fn read_env_file(path: &Path) -> Result<EnvironmentVariables> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read env file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in env file {}", path.display()))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(anyhow!(
            "Env file {} must contain a JSON object",
            path.display()
        )),
    }
}

struct SpinnerObserver {
    spinner: Box<dyn ProgressIndicator>,
    ui: Arc<dyn UserInterface>,
    verbose: bool,
}

impl DeploymentObserver for SpinnerObserver {
    fn on_progress(&self, progress: &DeploymentProgress) {
        match progress {
            DeploymentProgress::Submitted { .. } => {
                self.spinner.set_message("Processing update...");
            }
            DeploymentProgress::Polled { attempt, status } => {
                self.spinner
                    .set_message(&format!("Processing update... status: {status}"));
                if self.verbose {
                    self.ui.print_styled(
                        &format!("  Poll {attempt}: {status}"),
                        MessageStyle::Dim,
                    );
                }
            }
            DeploymentProgress::Deploying { version_id } => {
                self.spinner
                    .set_message(&format!("Deploying version {version_id}..."));
            }
        }
    }
}

/// Execute the update command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: UpdateArgs) -> Result<()> {
    let (function_id, label) = deps.target_function(args.function_id.as_deref())?;

    let code = std::fs::read_to_string(&args.code)
        .with_context(|| format!("Failed to read code file {}", args.code.display()))?;
    let environment_variables = read_env_file(&args.env_file)?;

    let (session, _) = deps.session().await?;

    deps.info(&format!("Updating function {label}..."));

    let policy = PollPolicy {
        interval: deps.clock.duration_from_secs(DEFAULT_POLL_INTERVAL_SECS),
        max_attempts: args.max_polls,
    };
    let orchestrator =
        DeploymentOrchestrator::new(deps.api.clone(), deps.async_runtime.clone(), policy);

    let spinner = deps.ui.create_spinner();
    spinner.enable_steady_tick(deps.clock.duration_from_millis(100));
    spinner.set_message("Uploading version...");
    let observer = SpinnerObserver {
        spinner,
        ui: deps.ui.clone(),
        verbose: deps.global.verbose,
    };

    let request = DeploymentRequest {
        function_id,
        code,
        environment_variables,
        deploy: !args.no_deploy,
    };
    let result = orchestrator
        .run(&session, &request, &deps.cancel, &observer)
        .await;
    observer.spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(GliaError::Cancelled) => {
            info!("Update of {} cancelled", request.function_id);
            deps.ui
                .print_styled("✗ Operation cancelled by user", MessageStyle::Error);
            return Err(GliaError::Cancelled.into());
        }
        Err(e) => return Err(e.into()),
    };

    debug!(
        "Task {} produced version {} after {} status checks",
        outcome.task_reference, outcome.version_id, outcome.polls
    );
    match &outcome.deployment {
        Some(deployment) => {
            deps.success(&format!(
                "Function updated and version {} deployed",
                outcome.version_id
            ));
            deps.print_json(deployment)
        }
        None => {
            deps.success(&format!(
                "Version {} built (not deployed)",
                outcome.version_id
            ));
            deps.ui.print(&format!(
                "Deploy it with: glia deploy --function-id {} --version-id {}",
                request.function_id, outcome.version_id
            ));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
