//! Fetch function logs for an explicit range or a trailing window

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use glia_runtime::dates::recent_window;
use glia_runtime::types::{LogRange, LogsPage};

use crate::context::CommandDependencies;

/// Get-logs command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct LogsArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Range start
    pub start_date: String,
    /// Range end
    pub end_date: String,
}

/// Recent-logs command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct RecentLogsArgs {
    /// Target function; defaults to the current one
    pub function_id: Option<String>,
    /// Window in hours
    pub hours: Option<u32>,
    /// Window in minutes, used when no hours are given
    pub minutes: Option<u32>,
}

fn render_entry(entry: &Value) -> String {
    match entry {
        Value::String(line) => line.clone(),
        other => other.to_string(),
    }
}

fn print_page(deps: &CommandDependencies, page: &LogsPage, empty_message: &str) {
    if page.logs.is_empty() {
        deps.ui.print(empty_message);
        return;
    }
    deps.success(&format!("Found {} log entries:", page.logs.len()));
    for entry in &page.logs {
        deps.ui.print(&render_entry(entry));
    }
    if page.next_page.as_ref().is_some_and(|p| !p.is_null()) {
        deps.info("More logs available (narrow the range to see them)");
    }
}

/// Execute the get-logs command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: LogsArgs) -> Result<()> {
    let (function_id, label) = deps.target_function(args.function_id.as_deref())?;
    let range = LogRange::between(Some(&args.start_date), Some(&args.end_date))?;
    let (session, _) = deps.session().await?;

    deps.info(&format!("Fetching logs for function {label}..."));
    let page = deps.api.get_logs(&session, &function_id, &range).await?;
    print_page(deps, &page, "No logs found for the specified time range");
    Ok(())
}

/// Execute the recent-logs command with injected dependencies
pub async fn execute_recent(deps: &Arc<CommandDependencies>, args: RecentLogsArgs) -> Result<()> {
    let (function_id, label) = deps.target_function(args.function_id.as_deref())?;
    let (window, description) = recent_window(args.hours, args.minutes);
    let range = LogRange::trailing(deps.clock.utc_now(), window)?;
    let (session, _) = deps.session().await?;

    deps.info(&format!(
        "Fetching logs for function {label} ({description})..."
    ));
    let page = deps.api.get_logs(&session, &function_id, &range).await?;
    print_page(deps, &page, &format!("No logs found for the {description}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestFixture;
    use chrono::{TimeZone, Utc};
    use glia_runtime::error::GliaError;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_logs_normalizes_date_only_bounds() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_get_logs()
            .withf(|_, id, range| {
                id == "fn-1"
                    && range.start.as_deref() == Some("2024-01-15T00:00:00Z")
                    && range.end.as_deref() == Some("2024-01-16T23:59:59Z")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(LogsPage {
                    logs: vec![json!("first line"), json!({"level": "info"})],
                    next_page: Some(json!("cursor-2")),
                })
            });
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_with_deps(
            &deps,
            LogsArgs {
                function_id: Some("fn-1".to_string()),
                start_date: "2024-01-15".to_string(),
                end_date: "2024-01-16".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(ui.output_contains("Found 2 log entries"));
        assert!(ui.output_contains("first line"));
        assert!(ui.output_contains(r#"{"level":"info"}"#));
        assert!(ui.output_contains("More logs available"));
    }

    #[tokio::test]
    async fn test_get_logs_rejects_bad_date_before_login() {
        let mut fixture = TestFixture::configured();
        fixture.authenticator.expect_authenticate().times(0);
        let (deps, _dir) = fixture.to_deps();

        let err = execute_with_deps(
            &deps,
            LogsArgs {
                function_id: Some("fn-1".to_string()),
                start_date: "yesterday".to_string(),
                end_date: "2024-01-16".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GliaError>(),
            Some(GliaError::DateParse { .. })
        ));
    }

    #[tokio::test]
    async fn test_recent_logs_uses_minutes_window() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .clock
            .expect_utc_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        fixture
            .api
            .expect_get_logs()
            .withf(|_, _, range| {
                range.start.as_deref() == Some("2024-03-01T11:30:00Z")
                    && range.end.as_deref() == Some("2024-03-01T12:00:00Z")
            })
            .times(1)
            .returning(|_, _, _| Ok(LogsPage::default()));
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_recent(
            &deps,
            RecentLogsArgs {
                function_id: Some("fn-1".to_string()),
                hours: None,
                minutes: Some(30),
            },
        )
        .await
        .unwrap();

        assert!(ui.output_contains("(last 30 minute(s))"));
        assert!(ui.output_contains("No logs found for the last 30 minute(s)"));
    }

    #[tokio::test]
    async fn test_recent_logs_rejects_oversized_window_before_login() {
        let mut fixture = TestFixture::configured();
        fixture.authenticator.expect_authenticate().times(0);
        fixture
            .clock
            .expect_utc_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        let (deps, _dir) = fixture.to_deps();

        let err = execute_recent(
            &deps,
            RecentLogsArgs {
                function_id: Some("fn-1".to_string()),
                hours: Some(u32::MAX),
                minutes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GliaError>(),
            Some(GliaError::Validation(_))
        ));
    }
}
