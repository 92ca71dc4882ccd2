//! Interactive setup of credentials, default site and environment

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::debug;

use glia_runtime::deps::MessageStyle;
use glia_runtime::environment::Environment;
use glia_runtime::types::{Credentials, mask_key_id};

use crate::context::CommandDependencies;

/// Configure command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct ConfigureArgs {}

/// Execute the configure command with injected dependencies
pub fn execute_with_deps(deps: &Arc<CommandDependencies>, _args: ConfigureArgs) -> Result<()> {
    if !deps.ui.is_interactive() {
        bail!(
            "configure needs an interactive terminal. Set api_key_id, api_key_secret, site_id and GLIA_ENV instead"
        );
    }

    let stored = deps.store.load()?;

    deps.ui
        .print_styled("→ Glia Functions CLI setup", MessageStyle::Cyan);
    deps.ui.print("");

    let key_prompt = stored.api_key_id.as_deref().map_or_else(
        || "API Key ID".to_string(),
        |id| format!("API Key ID (current: {}, Enter to keep)", mask_key_id(id)),
    );
    let api_key_id = match deps.ui.prompt_input(&key_prompt, None)?.trim() {
        "" => stored
            .api_key_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("API Key ID is required"))?,
        entered => entered.to_string(),
    };

    let secret_prompt = if stored.api_key_secret.is_some() {
        "API Key Secret (current: *****, Enter to keep)"
    } else {
        "API Key Secret"
    };
    let api_key_secret = match deps.ui.prompt_password(secret_prompt)?.trim() {
        "" => stored
            .api_key_secret
            .clone()
            .ok_or_else(|| anyhow::anyhow!("API Key Secret is required"))?,
        entered => entered.to_string(),
    };

    let site_id = deps
        .ui
        .prompt_input("Default Site ID (optional)", stored.site_id.as_deref())?
        .trim()
        .to_string();
    let site_id = if site_id.is_empty() {
        None
    } else {
        Some(site_id)
    };

    let current_env = Environment::resolve(stored.environment.as_deref());
    let labels: Vec<String> = Environment::ALL
        .iter()
        .map(|env| format!("{} - {}", env.label(), env.base_url()))
        .collect();
    let items: Vec<&str> = labels.iter().map(String::as_str).collect();
    let default = Environment::ALL
        .iter()
        .position(|env| *env == current_env)
        .unwrap_or(0);
    let choice = deps.ui.prompt_select("Environment", &items, default)?;
    let environment = Environment::ALL
        .get(choice)
        .copied()
        .unwrap_or(current_env);

    let credentials = Credentials {
        api_key_id,
        api_key_secret,
        site_ids: site_id.iter().cloned().collect(),
    };
    deps.store
        .save_settings(&credentials, site_id.as_deref(), environment)?;
    debug!("Saved configuration to {}", deps.store.path().display());

    deps.ui.print("");
    deps.ui.print_styled(
        &format!("✓ Configuration saved to {}", deps.store.path().display()),
        MessageStyle::Success,
    );
    deps.ui.print(&format!("  Environment: {environment}"));
    Ok(())
}

#[cfg(test)]
#[path = "configure_tests.rs"]
mod tests;
