//! Read-only lookups: function details, a version, its code and build tasks

use std::sync::Arc;

use anyhow::{Result, bail};

use crate::context::CommandDependencies;

/// Get-info command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct InfoArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
}

/// Get-version and get-code command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct VersionArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Version to fetch
    pub version_id: String,
}

/// Task-status command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct TaskStatusArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Task identifier
    pub task_id: String,
}

fn require(value: &str, what: &str, flag: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{what} is required ({flag})");
    }
    Ok(())
}

/// Execute the get-info command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: InfoArgs) -> Result<()> {
    let (function_id, _) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;

    let info = deps.api.get_function(&session, &function_id).await?;
    deps.print_json(&info)
}

/// Execute the get-version command with injected dependencies
pub async fn execute_version(deps: &Arc<CommandDependencies>, args: VersionArgs) -> Result<()> {
    require(&args.version_id, "Version ID", "--version-id")?;
    let (function_id, _) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;

    let version = deps
        .api
        .get_version(&session, &function_id, &args.version_id)
        .await?;
    deps.print_json(&version)
}

/// Execute the get-code command with injected dependencies
pub async fn execute_code(deps: &Arc<CommandDependencies>, args: VersionArgs) -> Result<()> {
    require(&args.version_id, "Version ID", "--version-id")?;
    let (function_id, _) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;

    let code = deps
        .api
        .get_version_code(&session, &function_id, &args.version_id)
        .await?;
    deps.ui.print(&code);
    Ok(())
}

/// Execute the task-status command with injected dependencies
pub async fn execute_task_status(
    deps: &Arc<CommandDependencies>,
    args: TaskStatusArgs,
) -> Result<()> {
    require(&args.task_id, "Task ID", "--task-id")?;
    let (function_id, _) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;

    let task = deps
        .api
        .get_function_task(&session, &function_id, &args.task_id)
        .await?;
    deps.print_json(&task)
}
