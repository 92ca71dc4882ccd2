//! Call a deployed function endpoint with a JSON payload

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};

use crate::context::CommandDependencies;

/// Invoke command arguments (matches CLI parser)
#[derive(Debug, Clone, Default)]
pub struct InvokeArgs {
    /// Invocation endpoint, relative to the environment or absolute
    pub endpoint: String,
    /// JSON payload file
    pub payload: PathBuf,
}

/// Execute the invoke command with injected dependencies
pub async fn execute_with_deps(deps: &Arc<CommandDependencies>, args: InvokeArgs) -> Result<()> {
    if args.endpoint.trim().is_empty() {
        bail!("Endpoint is required (--endpoint)");
    }
    let content = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("Failed to read payload file {}", args.payload.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in payload file {}", args.payload.display()))?;

    let (session, _) = deps.session().await?;

    deps.info(&format!("Invoking function at {}...", args.endpoint));
    let result = deps.api.invoke(&session, &args.endpoint, &payload).await?;

    deps.success("Function invoked successfully");
    deps.print_json(&result)
}
