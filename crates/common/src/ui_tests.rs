//! Tests for UI implementations

use super::*;
use glia_runtime::deps::MessageStyle;
use pretty_assertions::assert_eq;

#[test]
fn test_real_user_interface_print() {
    let ui = RealUserInterface;

    // These will print to stdout, but we're testing they don't panic
    ui.print("Hello, world!");
    ui.print("");
    ui.print("Multi\nline\ntext");
}

#[test]
fn test_real_user_interface_print_styled() {
    let ui = RealUserInterface;

    for style in [
        MessageStyle::Bold,
        MessageStyle::Cyan,
        MessageStyle::Green,
        MessageStyle::Red,
        MessageStyle::Yellow,
        MessageStyle::Dim,
        MessageStyle::Warning,
        MessageStyle::Error,
        MessageStyle::Success,
    ] {
        ui.print_styled("styled text", style);
    }
}

#[test]
fn test_real_progress_indicator() {
    let ui = RealUserInterface;
    let spinner = ui.create_spinner();
    spinner.set_message("Polling task...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.finish_and_clear();

    let spinner = ui.create_spinner();
    spinner.finish_with_message("Deployed".to_string());
}

#[test]
fn test_user_interface_captures_output() {
    let ui = TestUserInterface::new();
    ui.print("plain");
    ui.print_styled("done", MessageStyle::Success);

    assert_eq!(ui.get_output(), vec!["plain", "done"]);
    assert_eq!(
        ui.get_styled_output(),
        vec![("done".to_string(), MessageStyle::Success)]
    );
    assert!(ui.output_contains("pla"));
    assert!(!ui.is_interactive());
}

#[test]
fn test_user_interface_answers_from_script() {
    let ui = TestUserInterface::scripted(&["key-id", "", "secret"], &[2]);

    assert!(ui.is_interactive());
    assert_eq!(ui.prompt_input("API Key ID", None).unwrap(), "key-id");
    assert_eq!(ui.prompt_input("Site ID", Some("site-1")).unwrap(), "site-1");
    assert_eq!(ui.prompt_password("API Key Secret").unwrap(), "secret");
    assert_eq!(ui.prompt_select("Environment", &["a", "b", "c"], 0).unwrap(), 2);
    assert_eq!(ui.prompt_select("Again", &["a", "b"], 1).unwrap(), 1);

    assert_eq!(ui.prompts.lock().unwrap().len(), 5);
}

#[test]
fn test_empty_answers_are_accepted() {
    let ui = TestUserInterface::scripted(&["", ""], &[]);

    assert_eq!(ui.prompt_input("Default Site ID (optional)", None).unwrap(), "");
    assert_eq!(ui.prompt_password("API Key Secret").unwrap(), "");
    assert_eq!(ui.prompts.lock().unwrap().len(), 2);
}

#[test]
fn test_spinner_messages_are_recorded() {
    let ui = TestUserInterface::new();
    let spinner = ui.create_spinner();
    spinner.set_message("Status: processing");
    spinner.finish_with_message("finished".to_string());
    assert_eq!(
        ui.get_spinner_messages(),
        vec!["Status: processing", "finished"]
    );
}
