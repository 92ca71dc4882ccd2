//! Invocation statistics

use std::sync::Arc;

use anyhow::Result;

use crate::context::CommandDependencies;

/// Days of daily breakdown shown per function
const BREAKDOWN_DAYS: usize = 7;

/// Get-stats command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct StatsArgs {
    /// Restrict to these functions; empty means all
    pub function_ids: Vec<String>,
}

/// Execute the get-stats command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: StatsArgs) -> Result<()> {
    let (session, _) = deps.session().await?;

    deps.info("Fetching function statistics...");
    let response = deps.api.get_stats(&session, &args.function_ids).await?;

    if response.statistics.is_empty() {
        deps.ui.print("No statistics available");
        return Ok(());
    }

    deps.success("Function invocation statistics:");
    for stats in &response.statistics {
        deps.ui.print(&format!("  Function: {}", stats.function_id));
        deps.ui.print(&format!(
            "  Total invocations this month: {}",
            stats.total_invocations()
        ));
        if !stats.invocations.is_empty() {
            deps.ui.print("  Daily breakdown:");
            let skip = stats.invocations.len().saturating_sub(BREAKDOWN_DAYS);
            for day in stats.invocations.iter().skip(skip) {
                deps.ui
                    .print(&format!("    {}: {} invocations", day.date, day.count));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestFixture;
    use glia_runtime::types::StatsResponse;
    use serde_json::json;

    #[tokio::test]
    async fn test_stats_shows_total_and_last_seven_days() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_get_stats()
            .withf(|_, ids| ids == ["fn-1".to_string()])
            .times(1)
            .returning(|_, _| {
                let days: Vec<_> = (1..=9)
                    .map(|d| json!({"date": format!("2024-01-0{d}"), "count": d}))
                    .collect();
                Ok(serde_json::from_value::<StatsResponse>(json!({
                    "statistics": [{"function_id": "fn-1", "invocations": days}]
                }))
                .unwrap())
            });
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_with_deps(
            &deps,
            StatsArgs {
                function_ids: vec!["fn-1".to_string()],
            },
        )
        .await
        .unwrap();

        assert!(ui.output_contains("Total invocations this month: 45"));
        assert!(ui.output_contains("2024-01-09: 9 invocations"));
        assert!(ui.output_contains("2024-01-03: 3 invocations"));
        assert!(!ui.output_contains("2024-01-02: 2 invocations"));
    }

    #[tokio::test]
    async fn test_stats_empty_response() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_get_stats()
            .withf(|_, ids| ids.is_empty())
            .returning(|_, _| Ok(StatsResponse::default()));
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_with_deps(&deps, StatsArgs::default()).await.unwrap();
        assert!(ui.output_contains("No statistics available"));
    }
}
