//! Key-value store operations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde_json::Value;

use glia_runtime::config::DEFAULT_KV_PAGE_SIZE;
use glia_runtime::error::GliaError;
use glia_runtime::types::{KvBulkResponse, KvItem, KvOperation};

use crate::context::CommandDependencies;

/// Kv-set command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct KvSetArgs {
    /// Namespace
    pub namespace: String,
    /// Key
    pub key: String,
    /// Value, stored as a string
    pub value: String,
}

/// Kv-get and kv-delete command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct KvKeyArgs {
    /// Namespace
    pub namespace: String,
    /// Key
    pub key: String,
}

/// Kv-list command arguments (matches CLI parser)
#[derive(Debug, Clone)]
pub struct KvListArgs {
    /// Namespace
    pub namespace: String,
    /// Items per page
    pub max_page_size: u32,
}

impl Default for KvListArgs {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            max_page_size: DEFAULT_KV_PAGE_SIZE,
        }
    }
}

/// Kv-bulk command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct KvBulkArgs {
    /// Namespace
    pub namespace: String,
    /// JSON array of operations
    pub operations: PathBuf,
}

/// Render a stored value the way users typed it
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_expiry(item: &KvItem) -> String {
    item.expires
        .as_ref()
        .filter(|e| !e.is_null())
        .map_or_else(|| "Unknown".to_string(), display_value)
}

fn require_namespace(namespace: &str) -> Result<()> {
    if namespace.trim().is_empty() {
        return Err(GliaError::validation("Namespace is required (--namespace)").into());
    }
    Ok(())
}

/// Parse an operations file; it must hold a JSON array
pub fn read_operations(path: &Path) -> Result<Vec<KvOperation>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read operations file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in operations file {}", path.display()))?;
    if !value.is_array() {
        return Err(GliaError::validation("Operations file must contain a JSON array").into());
    }
    serde_json::from_value(value).context("Each operation needs 'op' (set, get or delete) and 'key'")
}

async fn single(
    deps: &CommandDependencies,
    namespace: &str,
    operation: KvOperation,
) -> Result<Option<KvItem>> {
    let (session, _) = deps.session().await?;
    let response = deps.api.kv_bulk(&session, namespace, &[operation]).await?;
    Ok(response.results.into_iter().next())
}

/// Execute the kv-set command with injected dependencies
pub async fn execute_set(deps: &Arc<CommandDependencies>, args: KvSetArgs) -> Result<()> {
    require_namespace(&args.namespace)?;
    deps.info(&format!(
        "Setting {} in namespace {}...",
        args.key, args.namespace
    ));
    let operation = KvOperation::set(args.key.clone(), Value::String(args.value));
    match single(deps, &args.namespace, operation).await? {
        Some(item) if !item.value.is_null() => {
            deps.success(&format!("Set {} = {}", args.key, display_value(&item.value)));
            deps.ui
                .print(&format!("   Expires: {}", display_expiry(&item)));
            Ok(())
        }
        _ => Err(anyhow::anyhow!("Failed to set value for {}", args.key)),
    }
}

/// Execute the kv-get command with injected dependencies
pub async fn execute_get(deps: &Arc<CommandDependencies>, args: KvKeyArgs) -> Result<()> {
    require_namespace(&args.namespace)?;
    deps.info(&format!(
        "Getting {} from namespace {}...",
        args.key, args.namespace
    ));
    match single(deps, &args.namespace, KvOperation::get(args.key.clone())).await? {
        Some(item) if !item.value.is_null() => {
            deps.success(&format!("{} = {}", args.key, display_value(&item.value)));
            deps.ui
                .print(&format!("   Expires: {}", display_expiry(&item)));
        }
        _ => deps.ui.print(&format!("Key '{}' not found", args.key)),
    }
    Ok(())
}

/// Execute the kv-delete command with injected dependencies
pub async fn execute_delete(deps: &Arc<CommandDependencies>, args: KvKeyArgs) -> Result<()> {
    require_namespace(&args.namespace)?;
    deps.info(&format!(
        "Deleting {} from namespace {}...",
        args.key, args.namespace
    ));
    let item = single(deps, &args.namespace, KvOperation::delete(args.key.clone())).await?;
    deps.success(&format!("Deleted {}", args.key));
    if let Some(previous) = item.filter(|i| !i.value.is_null()) {
        deps.ui.print(&format!(
            "   Previous value was: {}",
            display_value(&previous.value)
        ));
    }
    Ok(())
}

/// Execute the kv-list command with injected dependencies
pub async fn execute_list(deps: &Arc<CommandDependencies>, args: KvListArgs) -> Result<()> {
    require_namespace(&args.namespace)?;
    let (session, _) = deps.session().await?;

    deps.info(&format!("Listing pairs in namespace {}...", args.namespace));
    let response = deps
        .api
        .kv_list(&session, &args.namespace, args.max_page_size)
        .await?;

    if response.items.is_empty() {
        deps.ui.print("No items found in namespace");
        return Ok(());
    }
    deps.success(&format!("Found {} item(s):", response.items.len()));
    for item in &response.items {
        deps.ui.print(&format!(
            "  • {} = {}",
            item.key.as_deref().unwrap_or("?"),
            display_value(&item.value)
        ));
        deps.ui
            .print(&format!("    Expires: {}", display_expiry(item)));
    }
    Ok(())
}

/// Execute the kv-bulk command with injected dependencies
pub async fn execute_bulk(deps: &Arc<CommandDependencies>, args: KvBulkArgs) -> Result<()> {
    require_namespace(&args.namespace)?;
    let operations = read_operations(&args.operations)?;
    let (session, _) = deps.session().await?;

    deps.info(&format!(
        "Performing {} operation(s) in namespace {}...",
        operations.len(),
        args.namespace
    ));
    let KvBulkResponse { results } = deps
        .api
        .kv_bulk(&session, &args.namespace, &operations)
        .await?;

    if results.is_empty() {
        return Err(anyhow::anyhow!("No results returned"));
    }
    deps.success(&format!("Completed {} operation(s):", results.len()));
    for (index, (operation, item)) in operations.iter().zip(&results).enumerate() {
        let op = serde_json::to_value(operation.op)?;
        deps.ui.print(&format!(
            "  {}. {} {}: {}",
            index + 1,
            display_value(&op),
            operation.key,
            display_value(&item.value)
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestFixture;
    use glia_runtime::types::{KvListResponse, KvOp};
    use serde_json::json;

    fn bulk(results: Value) -> KvBulkResponse {
        serde_json::from_value(json!({ "results": results })).unwrap()
    }

    #[tokio::test]
    async fn test_kv_set_sends_single_operation() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_kv_bulk()
            .withf(|_, ns, ops| ns == "cache" && ops == [KvOperation::set("greeting", json!("hi"))])
            .times(1)
            .returning(|_, _, _| Ok(bulk(json!([{"value": "hi", "expires": "2025-01-01"}]))));
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_set(
            &deps,
            KvSetArgs {
                namespace: "cache".to_string(),
                key: "greeting".to_string(),
                value: "hi".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(ui.output_contains("Set greeting = hi"));
        assert!(ui.output_contains("Expires: 2025-01-01"));
    }

    #[tokio::test]
    async fn test_kv_get_missing_key() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_kv_bulk()
            .withf(|_, _, ops| ops.len() == 1 && ops[0].op == KvOp::Get)
            .returning(|_, _, _| Ok(bulk(json!([{"value": null}]))));
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_get(
            &deps,
            KvKeyArgs {
                namespace: "cache".to_string(),
                key: "nope".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(ui.output_contains("Key 'nope' not found"));
    }

    #[tokio::test]
    async fn test_kv_list_prints_items() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_kv_list()
            .withf(|_, ns, size| ns == "cache" && *size == 100)
            .returning(|_, _, _| {
                Ok(serde_json::from_value::<KvListResponse>(json!({
                    "items": [{"key": "a", "value": "1"}, {"key": "b", "value": {"n": 2}}]
                }))
                .unwrap())
            });
        let ui = fixture.ui.clone();
        let (deps, _dir) = fixture.to_deps();

        execute_list(
            &deps,
            KvListArgs {
                namespace: "cache".to_string(),
                ..KvListArgs::default()
            },
        )
        .await
        .unwrap();
        assert!(ui.output_contains("• a = 1"));
        assert!(ui.output_contains(r#"• b = {"n":2}"#));
        assert!(ui.output_contains("Expires: Unknown"));
    }

    #[tokio::test]
    async fn test_kv_bulk_reports_each_result() {
        let mut fixture = TestFixture::configured();
        fixture.expect_login();
        fixture
            .api
            .expect_kv_bulk()
            .withf(|_, _, ops| ops.len() == 2)
            .returning(|_, _, _| Ok(bulk(json!([{"value": "1"}, {"value": null}]))));
        let ui = fixture.ui.clone();
        let file = fixture.write_file(
            "ops.json",
            r#"[{"op": "set", "key": "a", "value": "1"}, {"op": "delete", "key": "b"}]"#,
        );
        let (deps, _dir) = fixture.to_deps();

        execute_bulk(
            &deps,
            KvBulkArgs {
                namespace: "cache".to_string(),
                operations: file,
            },
        )
        .await
        .unwrap();
        assert!(ui.output_contains("1. set a: 1"));
        assert!(ui.output_contains("2. delete b: null"));
    }

    #[tokio::test]
    async fn test_kv_bulk_requires_array() {
        let mut fixture = TestFixture::configured();
        fixture.authenticator.expect_authenticate().times(0);
        let file = fixture.write_file("ops.json", r#"{"op": "get", "key": "a"}"#);
        let (deps, _dir) = fixture.to_deps();

        let err = execute_bulk(
            &deps,
            KvBulkArgs {
                namespace: "cache".to_string(),
                operations: file,
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
