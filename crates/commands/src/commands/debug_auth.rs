//! Step-by-step check of credentials, token exchange and a first API call

use std::sync::Arc;

use anyhow::Result;

use glia_runtime::deps::MessageStyle;

use crate::context::CommandDependencies;

/// Debug-auth command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct DebugAuthArgs {}

/// Execute the debug-auth command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, _args: DebugAuthArgs) -> Result<()> {
    let settings = deps.settings()?;

    deps.ui
        .print_styled("Debugging authentication", MessageStyle::Bold);
    deps.ui.print(&format!(
        "  Environment: {} ({})",
        settings.environment,
        settings.environment.base_url()
    ));

    let credentials = match settings.require_credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            deps.ui.print_styled("✗ No credentials found", MessageStyle::Error);
            return Err(e.into());
        }
    };
    deps.ui
        .print(&format!("  API Key ID: {}", credentials.masked_key_id()));
    deps.ui.print("  API Key Secret: present");
    deps.ui
        .print(&format!("  Site IDs: {:?}", credentials.site_ids));
    deps.ui.print("");

    deps.ui.print_styled("Testing token exchange...", MessageStyle::Cyan);
    let session = deps
        .authenticator
        .authenticate(credentials, settings.environment)
        .await?;
    deps.ui.print_styled(
        &format!("✓ Token obtained ({} characters)", session.token.len()),
        MessageStyle::Success,
    );

    if credentials.site_ids.is_empty() {
        deps.ui.print_styled(
            "No site configured, skipping the list functions check",
            MessageStyle::Warning,
        );
        return Ok(());
    }

    deps.ui
        .print_styled("Testing API call (list functions)...", MessageStyle::Cyan);
    let list = deps
        .api
        .list_functions(&session, &credentials.site_ids)
        .await?;
    deps.ui.print_styled(
        &format!("✓ API call succeeded, {} function(s) visible", list.functions.len()),
        MessageStyle::Success,
    );
    Ok(())
}
