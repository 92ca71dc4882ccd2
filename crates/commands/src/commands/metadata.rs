//! Rename a function or change its description

use std::sync::Arc;

use anyhow::Result;

use glia_runtime::error::GliaError;
use glia_runtime::types::MetadataUpdate;

use crate::context::CommandDependencies;

/// Update-metadata command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct MetadataArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
}

/// Execute the update-metadata command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: MetadataArgs) -> Result<()> {
    let update = MetadataUpdate {
        name: args.name.filter(|n| !n.is_empty()),
        description: args.description.filter(|d| !d.is_empty()),
    };
    if update.is_empty() {
        return Err(GliaError::validation("Either name or description must be provided").into());
    }
    let (function_id, label) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;

    deps.info(&format!("Updating metadata of function {label}..."));
    let updated = deps
        .api
        .update_metadata(&session, &function_id, &update)
        .await?;

    deps.success("Function metadata updated");
    deps.print_json(&updated)
}
