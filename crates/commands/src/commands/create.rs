//! Create a new function in the resolved site

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::debug;

use crate::context::CommandDependencies;

/// Create command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Function name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Execute the create command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: CreateArgs) -> Result<()> {
    if args.name.trim().is_empty() {
        bail!("Function name is required (--name)");
    }

    let (session, site_id) = deps.site_session().await?;
    debug!("Creating function {} in site {}", args.name, site_id);

    deps.info(&format!("Creating function '{}'...", args.name));
    let created = deps
        .api
        .create_function(
            &session,
            &site_id,
            &args.name,
            args.description.as_deref().unwrap_or_default(),
        )
        .await?;

    deps.success("Function created successfully");
    deps.print_json(&created)
}
