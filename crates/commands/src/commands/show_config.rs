//! Print the stored configuration with secrets masked

use std::sync::Arc;

use anyhow::Result;

use glia_runtime::deps::MessageStyle;
use glia_runtime::settings::redacted_view;

use crate::context::CommandDependencies;

/// Show-config command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct ShowConfigArgs {}

/// Execute the show-config command with injected dependencies
pub fn execute_with_deps(deps: &Arc<CommandDependencies>, _args: ShowConfigArgs) -> Result<()> {
    let stored = deps.store.load()?;

    deps.ui
        .print_styled("Current configuration:", MessageStyle::Bold);
    for (label, value) in redacted_view(&stored) {
        deps.ui.print(&format!("  {label}: {value}"));
    }
    deps.ui
        .print(&format!("  Config file: {}", deps.store.path().display()));
    deps.ui.print("");

    match &stored.current_function {
        Some(function) => {
            deps.ui
                .print_styled("Current working function:", MessageStyle::Bold);
            deps.ui.print(&format!("  Function ID: {}", function.id));
            deps.ui.print(&format!("  Name: {}", function.name));
            if let Some(description) = function.description.as_deref().filter(|d| !d.is_empty()) {
                deps.ui.print(&format!("  Description: {description}"));
            }
            if let Some(version) = &function.current_version_id {
                deps.ui.print(&format!("  Current version: {version}"));
            }
        }
        None => deps.ui.print_styled(
            "Current working function: none (use 'glia select' to choose)",
            MessageStyle::Dim,
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestFixture;

    #[test]
    fn test_show_config_masks_secrets() {
        let fixture = TestFixture::configured();
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_with_deps(&deps, ShowConfigArgs::default()).unwrap();

        assert!(ui.output_contains("API Key ID: test-key..."));
        assert!(ui.output_contains("API Key Secret: *****"));
        assert!(!ui.output_contains("test-key-secret"));
        assert!(ui.output_contains("Environment: beta"));
        assert!(ui.output_contains("Current working function: none"));
    }

    #[test]
    fn test_show_config_lists_current_function() {
        let fixture = TestFixture::configured();
        fixture.write_config(&serde_json::json!({
            "api_key_id": "abc",
            "current_function": {
                "id": "fn-1",
                "name": "Greeter",
                "description": "",
                "current_version_id": "v-3",
                "selected_at": "2024-05-01T09:30:00Z"
            }
        }));
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_with_deps(&deps, ShowConfigArgs::default()).unwrap();

        assert!(ui.output_contains("Function ID: fn-1"));
        assert!(ui.output_contains("Current version: v-3"));
        assert!(!ui.output_contains("Description"));
    }
}
