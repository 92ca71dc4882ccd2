//! Unit tests for the configure command

use crate::commands::configure::*;
use crate::test_helpers::*;
use glia_runtime::environment::Environment;
use pretty_assertions::assert_eq;

#[test]
fn test_configure_saves_entered_values() {
    let fixture = TestFixture::new().with_ui(TestUserInterface::scripted(
        &["key-id-12345", "secret-value", "site-9"],
        &[2],
    ));
    let ui = fixture.ui.clone();
    let store = fixture.store();
    let (deps, _dir) = fixture.to_deps();

    execute_with_deps(&deps, ConfigureArgs::default()).unwrap();

    let config = store.load().unwrap();
    assert_eq!(config.api_key_id.as_deref(), Some("key-id-12345"));
    assert_eq!(config.api_key_secret.as_deref(), Some("secret-value"));
    assert_eq!(config.site_id.as_deref(), Some("site-9"));
    assert_eq!(
        config.environment.as_deref(),
        Some(Environment::ProductionEu.name())
    );
    assert!(ui.output_contains("Configuration saved"));
}

#[test]
fn test_configure_keeps_existing_values_on_empty_input() {
    let fixture = TestFixture::configured()
        .with_ui(TestUserInterface::scripted(&["", "", ""], &[]));
    let store = fixture.store();
    let (deps, _dir) = fixture.to_deps();

    execute_with_deps(&deps, ConfigureArgs::default()).unwrap();

    let config = store.load().unwrap();
    assert_eq!(config.api_key_id.as_deref(), Some("test-key-id"));
    assert_eq!(config.api_key_secret.as_deref(), Some("test-key-secret"));
    assert_eq!(config.site_id.as_deref(), Some("site-1"));
    assert_eq!(config.environment.as_deref(), Some("beta"));
}

#[test]
fn test_configure_site_id_can_be_skipped() {
    let fixture =
        TestFixture::new().with_ui(TestUserInterface::scripted(&["key-id", "secret", ""], &[]));
    let store = fixture.store();
    let (deps, _dir) = fixture.to_deps();

    execute_with_deps(&deps, ConfigureArgs::default()).unwrap();

    let config = store.load().unwrap();
    assert_eq!(config.api_key_id.as_deref(), Some("key-id"));
    assert_eq!(config.api_key_secret.as_deref(), Some("secret"));
    assert_eq!(config.site_id, None);
}

#[test]
fn test_configure_requires_key_id_on_first_run() {
    let fixture = TestFixture::new().with_ui(TestUserInterface::scripted(&[""], &[]));
    let store = fixture.store();
    let (deps, _dir) = fixture.to_deps();

    let err = execute_with_deps(&deps, ConfigureArgs::default()).unwrap_err();
    assert!(err.to_string().contains("API Key ID is required"));
    assert_eq!(store.load().unwrap().api_key_id, None);
}

#[test]
fn test_configure_refuses_non_interactive_terminal() {
    let fixture = TestFixture::new();
    let (deps, _dir) = fixture.to_deps();

    let err = execute_with_deps(&deps, ConfigureArgs::default()).unwrap_err();
    assert!(err.to_string().contains("interactive terminal"));
}
