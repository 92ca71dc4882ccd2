//! List functions in a site and versions of a function

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use glia_runtime::config::DEFAULT_VERSIONS_PER_PAGE;
use glia_runtime::types::{SortOrder, VersionQuery};

use crate::context::CommandDependencies;

/// List command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct ListArgs {}

/// List-versions command arguments (matches CLI parser)
#[derive(Debug, Clone)]
pub struct ListVersionsArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Page size
    pub per_page: u32,
    /// Sort by creation time
    pub order: SortOrder,
}

impl Default for ListVersionsArgs {
    fn default() -> Self {
        Self {
            function_id: None,
            per_page: DEFAULT_VERSIONS_PER_PAGE,
            order: SortOrder::Desc,
        }
    }
}

fn env_var_count(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Object(map)) => map.len(),
        Some(Value::Array(items)) => items.len(),
        _ => 0,
    }
}

/// Execute the list command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, _args: ListArgs) -> Result<()> {
    let (session, site_id) = deps.site_session().await?;

    deps.info(&format!("Listing functions for site {site_id}..."));
    let list = deps.api.list_functions(&session, &[site_id]).await?;

    if list.functions.is_empty() {
        deps.ui.print("No functions found");
        return Ok(());
    }

    deps.success(&format!("Found {} function(s):", list.functions.len()));
    for function in &list.functions {
        let status = if function.current_version_id.is_some() {
            "Deployed"
        } else {
            "Not deployed"
        };
        deps.ui
            .print(&format!("  • {} ({}) - {status}", function.name, function.id));
        if let Some(description) = function.description.as_deref().filter(|d| !d.is_empty()) {
            deps.ui.print(&format!("    Description: {description}"));
        }
        if let Some(version) = &function.current_version_id {
            deps.ui.print(&format!("    Current version: {version}"));
        }
    }
    Ok(())
}

/// Execute the list-versions command with injected dependencies
pub async fn execute_versions(
    deps: &Arc<CommandDependencies>,
    args: ListVersionsArgs,
) -> Result<()> {
    let (function_id, label) = deps.target_function(args.function_id.as_deref())?;
    let (session, _) = deps.session().await?;

    deps.info(&format!("Listing versions for function {label}..."));
    let query = VersionQuery {
        per_page: args.per_page,
        order: args.order,
    };
    let list = deps.api.list_versions(&session, &function_id, &query).await?;

    if list.versions.is_empty() {
        deps.ui.print("No versions found");
        return Ok(());
    }

    deps.success(&format!("Found {} version(s):", list.versions.len()));
    for version in &list.versions {
        deps.ui.print(&format!("  • Version {}", version.id));
        deps.ui.print(&format!(
            "    Created: {}",
            version.created_at.as_deref().unwrap_or("Unknown")
        ));
        deps.ui.print(&format!(
            "    Compatibility: {}",
            version.compatibility_date.as_deref().unwrap_or("Unknown")
        ));
        let count = env_var_count(version.environment_variables.as_ref());
        if count > 0 {
            deps.ui.print(&format!("    Env vars: {count} defined"));
        }
    }
    Ok(())
}
