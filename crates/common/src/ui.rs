//! User interface implementations

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use console::{Term, style};
use dialoguer::{Input, Password, Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};

use glia_runtime::deps::{MessageStyle, ProgressIndicator, UserInterface};
use glia_runtime::error::{GliaError, Result};

fn prompt_error(what: &str, err: &dialoguer::Error) -> GliaError {
    GliaError::Io(std::io::Error::other(format!("Failed to get {what}: {err}")))
}

/// Production UI implementation using indicatif and dialoguer
pub struct RealUserInterface;

impl UserInterface for RealUserInterface {
    fn create_spinner(&self) -> Box<dyn ProgressIndicator> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Box::new(RealProgressIndicator { pb })
    }

    fn print(&self, message: &str) {
        println!("{message}");
    }

    fn print_styled(&self, message: &str, msg_style: MessageStyle) {
        let styled = match msg_style {
            MessageStyle::Bold => style(message).bold().to_string(),
            MessageStyle::Cyan => style(message).cyan().to_string(),
            MessageStyle::Green => style(message).green().to_string(),
            MessageStyle::Red => style(message).red().to_string(),
            MessageStyle::Yellow => style(message).yellow().to_string(),
            MessageStyle::Dim => style(message).dim().to_string(),
            MessageStyle::Warning => style(message).yellow().bold().to_string(),
            MessageStyle::Error => style(message).red().bold().to_string(),
            MessageStyle::Success => style(message).green().bold().to_string(),
        };
        println!("{styled}");
    }

    fn is_interactive(&self) -> bool {
        Term::stdout().is_term() && Term::stderr().is_term()
    }

    fn prompt_input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let theme = ColorfulTheme::default();
        // Empty answers mean "keep" to callers, so dialoguer must not re-prompt on them
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);

        if let Some(default_val) = default {
            input = input.default(default_val.to_string());
        }

        input
            .interact_text()
            .map_err(|e| prompt_error("input", &e))
    }

    fn prompt_password(&self, prompt: &str) -> Result<String> {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| prompt_error("input", &e))
    }

    fn prompt_select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()
            .map_err(|e| prompt_error("selection", &e))
    }
}

struct RealProgressIndicator {
    pb: ProgressBar,
}

impl ProgressIndicator for RealProgressIndicator {
    fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }

    fn enable_steady_tick(&self, duration: Duration) {
        self.pb.enable_steady_tick(duration);
    }

    fn finish_with_message(&self, message: String) {
        self.pb.finish_with_message(message);
    }
}

// Test implementations for mocking

/// Test UI implementation that captures output and answers prompts from a script
#[derive(Default)]
pub struct TestUserInterface {
    /// Everything printed, styled or not
    pub output: Arc<Mutex<Vec<String>>>,
    /// Styled prints with their style
    pub styled_output: Arc<Mutex<Vec<(String, MessageStyle)>>>,
    /// Spinner messages
    pub spinner_messages: Arc<Mutex<Vec<String>>>,
    /// Prompts shown, in order
    pub prompts: Arc<Mutex<Vec<String>>>,
    inputs: Mutex<VecDeque<String>>,
    selections: Mutex<VecDeque<usize>>,
    interactive: bool,
}

impl TestUserInterface {
    /// Non-interactive UI with no scripted answers
    pub fn new() -> Self {
        Self::default()
    }

    /// Interactive UI answering text prompts and selections from the given scripts
    pub fn scripted(inputs: &[&str], selections: &[usize]) -> Self {
        Self {
            inputs: Mutex::new(inputs.iter().map(|s| (*s).to_string()).collect()),
            selections: Mutex::new(selections.iter().copied().collect()),
            interactive: true,
            ..Self::default()
        }
    }

    /// Captured output lines
    pub fn get_output(&self) -> Vec<String> {
        self.output.lock().unwrap().clone()
    }

    /// Captured styled output
    pub fn get_styled_output(&self) -> Vec<(String, MessageStyle)> {
        self.styled_output.lock().unwrap().clone()
    }

    /// Captured spinner messages
    pub fn get_spinner_messages(&self) -> Vec<String> {
        self.spinner_messages.lock().unwrap().clone()
    }

    /// True when some output line contains `needle`
    pub fn output_contains(&self, needle: &str) -> bool {
        self.get_output().iter().any(|line| line.contains(needle))
    }

    fn next_input(&self, prompt: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.inputs.lock().unwrap().pop_front()
    }
}

impl UserInterface for TestUserInterface {
    fn create_spinner(&self) -> Box<dyn ProgressIndicator> {
        Box::new(TestProgressIndicator {
            messages: Arc::clone(&self.spinner_messages),
        })
    }

    fn print(&self, message: &str) {
        self.output.lock().unwrap().push(message.to_string());
    }

    fn print_styled(&self, message: &str, style: MessageStyle) {
        // Add to both styled output and regular output for easier testing
        self.styled_output
            .lock()
            .unwrap()
            .push((message.to_string(), style));
        self.output.lock().unwrap().push(message.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn prompt_input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        Ok(self
            .next_input(prompt)
            .filter(|answer| !answer.is_empty())
            .or_else(|| default.map(str::to_string))
            .unwrap_or_default())
    }

    fn prompt_password(&self, prompt: &str) -> Result<String> {
        Ok(self.next_input(prompt).unwrap_or_default())
    }

    fn prompt_select(&self, prompt: &str, _items: &[&str], default: usize) -> Result<usize> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .selections
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(default))
    }
}

struct TestProgressIndicator {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ProgressIndicator for TestProgressIndicator {
    fn set_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn finish_and_clear(&self) {}

    fn enable_steady_tick(&self, _duration: Duration) {}

    fn finish_with_message(&self, message: String) {
        self.messages.lock().unwrap().push(message);
    }
}

#[cfg(test)]
#[path = "ui_tests.rs"]
mod tests;
