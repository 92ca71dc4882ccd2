//! Select, show and clear the current working function

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use chrono::Local;
use tracing::debug;

use glia_runtime::deps::MessageStyle;
use glia_runtime::types::FunctionSummary;

use crate::context::CommandDependencies;

/// Select command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct SelectArgs {
    /// Select this function directly instead of prompting
    pub function_id: Option<String>,
}

/// Current command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct CurrentArgs {}

/// Clear command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct ClearArgs {}

fn deployment_status(function: &FunctionSummary) -> &'static str {
    if function.current_version_id.is_some() {
        "deployed"
    } else {
        "not deployed"
    }
}

fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("{prefix}...")
}

/// Execute the select command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: SelectArgs) -> Result<()> {
    let function = if let Some(function_id) = args.function_id.as_deref() {
        let (session, _) = deps.session().await?;
        let raw = deps.api.get_function(&session, function_id).await?;
        serde_json::from_value::<FunctionSummary>(raw)
            .context("Function details are missing an id")?
    } else {
        if !deps.ui.is_interactive() {
            bail!("Interactive selection needs a terminal. Pass --function-id instead");
        }
        let (session, site_id) = deps.site_session().await?;

        let spinner = deps.ui.create_spinner();
        spinner.enable_steady_tick(deps.clock.duration_from_millis(100));
        spinner.set_message("Loading available functions...");
        let list = deps.api.list_functions(&session, &[site_id.clone()]).await;
        spinner.finish_and_clear();
        let mut functions = list?.functions;

        if functions.is_empty() {
            bail!("No functions found in site {site_id}");
        }

        let labels: Vec<String> = functions
            .iter()
            .map(|f| format!("{} ({}) - {}", f.name, short_id(&f.id), deployment_status(f)))
            .chain(std::iter::once("Cancel".to_string()))
            .collect();
        let items: Vec<&str> = labels.iter().map(String::as_str).collect();

        let choice = deps.ui.prompt_select(
            &format!("Select a function ({} found)", functions.len()),
            &items,
            0,
        )?;
        if choice >= functions.len() {
            deps.ui.print("Selection cancelled");
            return Ok(());
        }
        functions.swap_remove(choice)
    };

    let context = deps
        .store
        .set_current_function(&function, deps.clock.utc_now())?;
    debug!("Selected function {} ({})", context.name, context.id);

    deps.ui.print_styled(
        &format!("✓ Now working on: {} ({})", context.name, context.id),
        MessageStyle::Success,
    );
    deps.ui.print("Commands that take --function-id now default to it, e.g.:");
    deps.ui.print("  glia get-info");
    deps.ui.print("  glia list-versions");
    deps.ui.print("  glia update --code function.js --env-file env.json");
    Ok(())
}

/// Execute the current command with injected dependencies
pub fn execute_current(deps: &Arc<CommandDependencies>, _args: CurrentArgs) -> Result<()> {
    match deps.current_function()? {
        Some(function) => {
            deps.ui
                .print_styled("Currently working on:", MessageStyle::Bold);
            deps.ui
                .print(&format!("  Function: {} ({})", function.name, function.id));
            if let Some(description) = function.description.as_deref().filter(|d| !d.is_empty()) {
                deps.ui.print(&format!("  Description: {description}"));
            }
            if let Some(version) = &function.current_version_id {
                deps.ui.print(&format!("  Current version: {version}"));
            }
            deps.ui.print(&format!(
                "  Selected: {}",
                function
                    .selected_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
            ));
        }
        None => {
            deps.ui.print("No function currently selected");
            deps.ui
                .print_styled("Use 'glia select' to choose one", MessageStyle::Dim);
        }
    }
    Ok(())
}

/// Execute the clear command with injected dependencies
pub fn execute_clear(deps: &Arc<CommandDependencies>, _args: ClearArgs) -> Result<()> {
    if deps.store.clear_current_function()? {
        deps.ui.print_styled(
            "✓ Cleared current function selection",
            MessageStyle::Success,
        );
    } else {
        deps.ui.print("No function was selected");
    }
    Ok(())
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
