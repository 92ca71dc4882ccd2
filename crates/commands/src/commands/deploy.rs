//! Deploy an existing version

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::debug;

use crate::context::CommandDependencies;

/// Deploy command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct DeployArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Version to deploy
    pub version_id: String,
}

/// Execute the deploy command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: DeployArgs) -> Result<()> {
    if args.version_id.trim().is_empty() {
        bail!("Version ID is required (--version-id)");
    }
    let (function_id, label) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;
    debug!("Deploying version {} of {}", args.version_id, function_id);

    deps.info(&format!(
        "Deploying version {} of function {label}...",
        args.version_id
    ));
    let deployment = deps
        .api
        .deploy_version(&session, &function_id, &args.version_id)
        .await?;

    deps.success("Deployment successful");
    deps.print_json(&deployment)
}
