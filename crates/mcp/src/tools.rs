//! Glia operations exposed as tools
//!
//! Each tool resolves settings the same way the CLI does, with the optional
//! `environment` and `site_id` arguments acting as per-call overrides. Nothing
//! here prompts; `configure` takes its values as arguments.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;

use glia_runtime::config::{DEFAULT_KV_PAGE_SIZE, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_VERSIONS_PER_PAGE};
use glia_runtime::dates::{format_utc, recent_window};
use glia_runtime::deployment::{DeploymentOrchestrator, DeploymentRequest, NoopObserver, PollPolicy};
use glia_runtime::deps::{AsyncRuntime, Authenticator, Clock, EnvVars, FunctionsApi};
use glia_runtime::environment::Environment;
use glia_runtime::error::{GliaError, Result};
use glia_runtime::settings::{
    ConfigStore, Overrides, ResolvedSettings, redacted_view, resolve_function_id, resolve_settings,
};
use glia_runtime::types::{
    Credentials, FunctionSummary, KvOperation, LogRange, MetadataUpdate, Session, SortOrder,
    VersionQuery,
};

use crate::server::ToolHandler;
use crate::types::{ToolError, ToolMetadata};

/// Collaborators shared by every tool call
pub struct ToolContext {
    /// Functions API client
    pub api: Arc<dyn FunctionsApi>,
    /// Token exchange
    pub authenticator: Arc<dyn Authenticator>,
    /// Clock
    pub clock: Arc<dyn Clock>,
    /// Sleeps between polls
    pub async_runtime: Arc<dyn AsyncRuntime>,
    /// Process environment
    pub env: Arc<dyn EnvVars>,
    /// Config file
    pub store: ConfigStore,
    /// Stops long running tools when the server shuts down
    pub cancel: CancellationToken,
}

impl ToolContext {
    /// Production collaborators
    pub fn real(cancel: CancellationToken) -> Result<Self> {
        use glia_runtime::api_client::{HttpFunctionsApi, build_http_client};
        use glia_runtime::auth::HttpAuthenticator;
        use glia_runtime::deps::{RealAsyncRuntime, RealClock, RealEnvVars};

        let env: Arc<dyn EnvVars> = Arc::new(RealEnvVars);
        let store = ConfigStore::from_env(env.as_ref())?;
        let http = build_http_client()?;
        Ok(Self {
            api: Arc::new(HttpFunctionsApi::new(http.clone())),
            authenticator: Arc::new(HttpAuthenticator::new(http)),
            clock: Arc::new(RealClock),
            async_runtime: Arc::new(RealAsyncRuntime),
            env,
            store,
            cancel,
        })
    }

    fn settings(&self, scope: &Scope) -> Result<ResolvedSettings> {
        let stored = self.store.load()?;
        let overrides = Overrides {
            environment: scope
                .environment
                .as_deref()
                .map(|name| Environment::resolve(Some(name))),
            site_id: scope.site_id.clone(),
        };
        Ok(resolve_settings(&stored, &overrides, self.env.as_ref()))
    }

    async fn session(&self, scope: &Scope) -> Result<(Session, ResolvedSettings)> {
        let settings = self.settings(scope)?;
        let credentials = settings.require_credentials()?;
        let session = self
            .authenticator
            .authenticate(credentials, settings.environment)
            .await?;
        Ok((session, settings))
    }

    async fn site_session(&self, scope: &Scope) -> Result<(Session, String)> {
        let site_id = self.settings(scope)?.require_site_id()?.to_string();
        let (session, _) = self.session(scope).await?;
        Ok((session, site_id))
    }

    fn function_id(&self, explicit: Option<&str>) -> Result<String> {
        let current = self.store.current_function()?;
        resolve_function_id(explicit, current.as_ref())
    }
}

/// Per-call overrides accepted by every tool
#[derive(Debug, Default, Deserialize)]
struct Scope {
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    site_id: Option<String>,
}

#[derive(Deserialize)]
struct ConfigureArgs {
    api_key_id: Option<String>,
    api_key_secret: Option<String>,
    site_id: Option<String>,
    environment: Option<String>,
}

#[derive(Deserialize)]
struct FunctionArgs {
    function_id: Option<String>,
}

#[derive(Deserialize)]
struct RequiredFunctionArgs {
    function_id: String,
}

#[derive(Deserialize)]
struct CreateArgs {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct UpdateArgs {
    function_id: Option<String>,
    code: String,
    #[serde(default)]
    environment_variables: Map<String, Value>,
    #[serde(default = "default_true")]
    deploy: bool,
    max_polls: Option<u32>,
}

const fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct VersionArgs {
    function_id: Option<String>,
    version_id: String,
}

#[derive(Deserialize)]
struct TaskArgs {
    function_id: Option<String>,
    task_id: String,
}

#[derive(Deserialize)]
struct InvokeArgs {
    endpoint: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct LogsArgs {
    function_id: Option<String>,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct RecentLogsArgs {
    function_id: Option<String>,
    hours: Option<u32>,
    minutes: Option<u32>,
}

#[derive(Deserialize)]
struct ListVersionsArgs {
    function_id: Option<String>,
    per_page: Option<u32>,
    order: Option<String>,
}

#[derive(Deserialize)]
struct StatsArgs {
    #[serde(default)]
    function_ids: Vec<String>,
}

#[derive(Deserialize)]
struct MetadataArgs {
    function_id: Option<String>,
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct KvKeyArgs {
    namespace: String,
    key: String,
}

#[derive(Deserialize)]
struct KvSetArgs {
    namespace: String,
    key: String,
    value: Value,
}

#[derive(Deserialize)]
struct KvListArgs {
    namespace: String,
    max_page_size: Option<u32>,
}

#[derive(Deserialize)]
struct KvBulkArgs {
    namespace: String,
    operations: Vec<KvOperation>,
}

fn parse<T: DeserializeOwned>(arguments: &Value) -> std::result::Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> std::result::Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Glia(e.into()))
}

fn tool(name: &str, description: &str, properties: Value, required: &[&str]) -> ToolMetadata {
    let mut properties = match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    properties.insert(
        "environment".to_string(),
        json!({
            "type": "string",
            "enum": Environment::ALL.iter().map(|env| env.name()).collect::<Vec<_>>(),
            "description": "Environment to use; defaults to the configured one"
        }),
    );
    ToolMetadata {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

fn function_id_prop() -> Value {
    json!({"type": "string", "description": "Function ID; defaults to the selected function"})
}

/// Everything the server offers
pub fn catalog() -> Vec<ToolMetadata> {
    let string = |description: &str| json!({"type": "string", "description": description});
    let integer = |description: &str| json!({"type": "integer", "minimum": 1, "description": description});

    vec![
        tool(
            "configure",
            "Save API credentials, default site and environment",
            json!({
                "api_key_id": string("API key ID; keeps the stored one when omitted"),
                "api_key_secret": string("API key secret; keeps the stored one when omitted"),
                "site_id": string("Default site ID"),
            }),
            &[],
        ),
        tool("show_config", "Show the configuration with secrets masked", json!({}), &[]),
        tool(
            "list_selectable_functions",
            "List functions in the default site that can be selected",
            json!({"site_id": string("Site ID; defaults to the configured one")}),
            &[],
        ),
        tool(
            "set_current_function",
            "Select the function other tools default to",
            json!({"function_id": string("Function ID")}),
            &["function_id"],
        ),
        tool("get_current_function", "Show the selected function", json!({}), &[]),
        tool("clear_current_function", "Forget the selected function", json!({}), &[]),
        tool(
            "create_function",
            "Create a function in a site",
            json!({
                "name": string("Function name"),
                "description": string("Description"),
                "site_id": string("Site ID; defaults to the configured one"),
            }),
            &["name"],
        ),
        tool(
            "update_function",
            "Upload new code, wait for the build and deploy it",
            json!({
                "function_id": function_id_prop(),
                "code": string("Bundled JavaScript source"),
                "environment_variables": {"type": "object", "description": "Environment variables for the version"},
                "deploy": {"type": "boolean", "default": true, "description": "Deploy the built version"},
                "max_polls": integer("Give up after this many status checks"),
            }),
            &["code"],
        ),
        tool(
            "deploy_function",
            "Deploy an existing version",
            json!({"function_id": function_id_prop(), "version_id": string("Version ID")}),
            &["version_id"],
        ),
        tool(
            "get_task_status",
            "Check a build task",
            json!({"function_id": function_id_prop(), "task_id": string("Task ID")}),
            &["task_id"],
        ),
        tool(
            "invoke_function",
            "Invoke a function endpoint with a JSON payload",
            json!({
                "endpoint": string("Invocation endpoint path or URL"),
                "payload": {"type": "object", "description": "JSON payload"},
            }),
            &["endpoint"],
        ),
        tool(
            "get_logs",
            "Fetch logs between two dates",
            json!({
                "function_id": function_id_prop(),
                "start_date": string("Start, e.g. 2024-01-15 or 2024-01-15T10:00:00Z"),
                "end_date": string("End, e.g. 2024-01-16"),
            }),
            &["start_date", "end_date"],
        ),
        tool(
            "get_recent_logs",
            "Fetch logs from the last hours or minutes (default one hour)",
            json!({
                "function_id": function_id_prop(),
                "hours": integer("Window in hours"),
                "minutes": integer("Window in minutes"),
            }),
            &[],
        ),
        tool(
            "get_function_info",
            "Get function details",
            json!({"function_id": function_id_prop()}),
            &[],
        ),
        tool(
            "get_function_version",
            "Get one version of a function",
            json!({"function_id": function_id_prop(), "version_id": string("Version ID")}),
            &["version_id"],
        ),
        tool(
            "get_function_code",
            "Get the source code of a version",
            json!({"function_id": function_id_prop(), "version_id": string("Version ID")}),
            &["version_id"],
        ),
        tool(
            "list_functions",
            "List functions in a site",
            json!({"site_id": string("Site ID; defaults to the configured one")}),
            &[],
        ),
        tool(
            "list_versions",
            "List versions of a function",
            json!({
                "function_id": function_id_prop(),
                "per_page": integer("Page size (default 20)"),
                "order": {"type": "string", "enum": ["asc", "desc"], "default": "desc"},
            }),
            &[],
        ),
        tool(
            "get_stats",
            "Invocation statistics",
            json!({"function_ids": {"type": "array", "items": {"type": "string"}}}),
            &[],
        ),
        tool(
            "update_metadata",
            "Change a function's name or description",
            json!({
                "function_id": function_id_prop(),
                "name": string("New name"),
                "description": string("New description"),
            }),
            &[],
        ),
        tool(
            "kv_set",
            "Set a key in a key-value namespace",
            json!({
                "namespace": string("Namespace"),
                "key": string("Key"),
                "value": {"description": "Value to store"},
            }),
            &["namespace", "key", "value"],
        ),
        tool(
            "kv_get",
            "Get a key from a key-value namespace",
            json!({"namespace": string("Namespace"), "key": string("Key")}),
            &["namespace", "key"],
        ),
        tool(
            "kv_delete",
            "Delete a key from a key-value namespace",
            json!({"namespace": string("Namespace"), "key": string("Key")}),
            &["namespace", "key"],
        ),
        tool(
            "kv_list",
            "List pairs in a key-value namespace",
            json!({
                "namespace": string("Namespace"),
                "max_page_size": integer("Items per page (default 100)"),
            }),
            &["namespace"],
        ),
        tool(
            "kv_bulk",
            "Run several key-value operations at once",
            json!({
                "namespace": string("Namespace"),
                "operations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "op": {"type": "string", "enum": ["set", "get", "delete"]},
                            "key": {"type": "string"},
                            "value": {}
                        },
                        "required": ["op", "key"]
                    }
                },
            }),
            &["namespace", "operations"],
        ),
    ]
}

/// Tool handler backed by the Glia API
pub struct GliaTools {
    ctx: ToolContext,
}

impl GliaTools {
    /// New handler
    pub const fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    fn configure(&self, args: ConfigureArgs) -> Result<Value> {
        let stored = self.ctx.store.load()?;
        let mut warnings = Vec::new();

        let pick = |given: Option<String>, current: Option<String>| {
            given.filter(|v| !v.trim().is_empty()).or(current)
        };
        let api_key_id = pick(args.api_key_id, stored.api_key_id.clone())
            .ok_or_else(|| GliaError::validation("api_key_id is required"))?;
        let api_key_secret = pick(args.api_key_secret, stored.api_key_secret.clone())
            .ok_or_else(|| GliaError::validation("api_key_secret is required"))?;
        let site_id = pick(args.site_id, stored.site_id.clone());

        let current = Environment::resolve(stored.environment.as_deref());
        let environment = match args.environment.as_deref() {
            None => current,
            Some(name) => Environment::parse(name.trim()).unwrap_or_else(|| {
                warnings.push(format!(
                    "Unknown environment '{name}', keeping '{current}'. Valid: {}",
                    Environment::valid_names()
                ));
                current
            }),
        };

        let credentials = Credentials {
            api_key_id,
            api_key_secret,
            site_ids: site_id.iter().cloned().collect(),
        };
        self.ctx
            .store
            .save_settings(&credentials, site_id.as_deref(), environment)?;

        Ok(json!({
            "success": true,
            "config_path": self.ctx.store.path().display().to_string(),
            "api_key_id": credentials.masked_key_id(),
            "site_id": site_id,
            "environment": environment.name(),
            "warnings": warnings,
        }))
    }

    fn show_config(&self) -> Result<Value> {
        let stored = self.ctx.store.load()?;
        let fields: Map<String, Value> = redacted_view(&stored)
            .into_iter()
            .map(|(label, value)| (label.to_string(), Value::String(value)))
            .collect();
        Ok(json!({
            "config": fields,
            "config_path": self.ctx.store.path().display().to_string(),
            "current_function": stored.current_function,
        }))
    }

    async fn dispatch(&self, name: &str, arguments: &Value) -> std::result::Result<Value, ToolError> {
        let scope: Scope = parse(arguments)?;
        let ctx = &self.ctx;

        let value = match name {
            "configure" => self.configure(parse(arguments)?)?,
            "show_config" => self.show_config()?,
            "get_current_function" => {
                let current = ctx.store.current_function()?;
                json!({"has_selection": current.is_some(), "current_function": current})
            }
            "clear_current_function" => {
                let cleared = ctx.store.clear_current_function()?;
                json!({
                    "success": true,
                    "cleared": cleared,
                    "message": if cleared { "Cleared current function selection" } else { "No function was selected" },
                })
            }
            "list_selectable_functions" => {
                let (session, site_id) = ctx.site_session(&scope).await?;
                let list = ctx.api.list_functions(&session, &[site_id]).await?;
                json!({
                    "available_functions": list.functions,
                    "message": "Use set_current_function with a function_id to select one",
                })
            }
            "set_current_function" => {
                let args: RequiredFunctionArgs = parse(arguments)?;
                let (session, _) = ctx.session(&scope).await?;
                let raw = ctx.api.get_function(&session, &args.function_id).await?;
                let summary: FunctionSummary = serde_json::from_value(raw).map_err(GliaError::from)?;
                let context = ctx.store.set_current_function(&summary, ctx.clock.utc_now())?;
                json!({
                    "success": true,
                    "message": format!("Set current function to: {}", context.name),
                    "function": context,
                })
            }
            "create_function" => {
                let args: CreateArgs = parse(arguments)?;
                if args.name.trim().is_empty() {
                    return Err(GliaError::validation("name is required").into());
                }
                let (session, site_id) = ctx.site_session(&scope).await?;
                ctx.api
                    .create_function(&session, &site_id, &args.name, &args.description)
                    .await?
            }
            "update_function" => self.update_function(&scope, parse(arguments)?).await?,
            "deploy_function" => {
                let args: VersionArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                ctx.api
                    .deploy_version(&session, &function_id, &args.version_id)
                    .await?
            }
            "get_task_status" => {
                let args: TaskArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                ctx.api
                    .get_function_task(&session, &function_id, &args.task_id)
                    .await?
            }
            "invoke_function" => {
                let args: InvokeArgs = parse(arguments)?;
                let payload = if args.payload.is_null() { json!({}) } else { args.payload };
                let (session, _) = ctx.session(&scope).await?;
                ctx.api.invoke(&session, &args.endpoint, &payload).await?
            }
            "get_logs" => {
                let args: LogsArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let range = LogRange::between(Some(&args.start_date), Some(&args.end_date))?;
                let (session, _) = ctx.session(&scope).await?;
                to_json(&ctx.api.get_logs(&session, &function_id, &range).await?)?
            }
            "get_recent_logs" => {
                let args: RecentLogsArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (window, description) = recent_window(args.hours, args.minutes);
                let now = ctx.clock.utc_now();
                let range = LogRange::trailing(now, window)?;
                let (session, _) = ctx.session(&scope).await?;
                let page = ctx.api.get_logs(&session, &function_id, &range).await?;
                json!({
                    "logs": page.logs,
                    "next_page": page.next_page,
                    "time_range": description,
                    "from": range.start,
                    "to": format_utc(now),
                })
            }
            "get_function_info" => {
                let args: FunctionArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                ctx.api.get_function(&session, &function_id).await?
            }
            "get_function_version" => {
                let args: VersionArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                ctx.api
                    .get_version(&session, &function_id, &args.version_id)
                    .await?
            }
            "get_function_code" => {
                let args: VersionArgs = parse(arguments)?;
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                let code = ctx
                    .api
                    .get_version_code(&session, &function_id, &args.version_id)
                    .await?;
                json!({"function_id": function_id, "version_id": args.version_id, "code": code})
            }
            "list_functions" => {
                let (session, site_id) = ctx.site_session(&scope).await?;
                to_json(&ctx.api.list_functions(&session, &[site_id]).await?)?
            }
            "list_versions" => {
                let args: ListVersionsArgs = parse(arguments)?;
                let order = args
                    .order
                    .as_deref()
                    .map(str::parse::<SortOrder>)
                    .transpose()?
                    .unwrap_or_default();
                let query = VersionQuery {
                    per_page: args.per_page.unwrap_or(DEFAULT_VERSIONS_PER_PAGE),
                    order,
                };
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                to_json(&ctx.api.list_versions(&session, &function_id, &query).await?)?
            }
            "get_stats" => {
                let args: StatsArgs = parse(arguments)?;
                let (session, _) = ctx.session(&scope).await?;
                to_json(&ctx.api.get_stats(&session, &args.function_ids).await?)?
            }
            "update_metadata" => {
                let args: MetadataArgs = parse(arguments)?;
                let update = MetadataUpdate {
                    name: args.name.filter(|n| !n.is_empty()),
                    description: args.description.filter(|d| !d.is_empty()),
                };
                if update.is_empty() {
                    return Err(
                        GliaError::validation("Either name or description must be provided").into(),
                    );
                }
                let function_id = ctx.function_id(args.function_id.as_deref())?;
                let (session, _) = ctx.session(&scope).await?;
                ctx.api
                    .update_metadata(&session, &function_id, &update)
                    .await?
            }
            "kv_set" => {
                let args: KvSetArgs = parse(arguments)?;
                let op = KvOperation::set(args.key, args.value);
                self.kv(&scope, &args.namespace, &[op]).await?
            }
            "kv_get" => {
                let args: KvKeyArgs = parse(arguments)?;
                self.kv(&scope, &args.namespace, &[KvOperation::get(args.key)])
                    .await?
            }
            "kv_delete" => {
                let args: KvKeyArgs = parse(arguments)?;
                self.kv(&scope, &args.namespace, &[KvOperation::delete(args.key)])
                    .await?
            }
            "kv_bulk" => {
                let args: KvBulkArgs = parse(arguments)?;
                self.kv(&scope, &args.namespace, &args.operations).await?
            }
            "kv_list" => {
                let args: KvListArgs = parse(arguments)?;
                let (session, _) = ctx.session(&scope).await?;
                let size = args.max_page_size.unwrap_or(DEFAULT_KV_PAGE_SIZE);
                to_json(&ctx.api.kv_list(&session, &args.namespace, size).await?)?
            }
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(value)
    }

    async fn kv(
        &self,
        scope: &Scope,
        namespace: &str,
        operations: &[KvOperation],
    ) -> std::result::Result<Value, ToolError> {
        let (session, _) = self.ctx.session(scope).await?;
        let response = self.ctx.api.kv_bulk(&session, namespace, operations).await?;
        to_json(&response)
    }

    async fn update_function(&self, scope: &Scope, args: UpdateArgs) -> Result<Value> {
        let ctx = &self.ctx;
        let function_id = ctx.function_id(args.function_id.as_deref())?;
        let (session, _) = ctx.session(scope).await?;

        let policy = PollPolicy {
            interval: ctx.clock.duration_from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: args.max_polls,
        };
        let orchestrator =
            DeploymentOrchestrator::new(ctx.api.clone(), ctx.async_runtime.clone(), policy);
        let request = DeploymentRequest {
            function_id,
            code: args.code,
            environment_variables: args.environment_variables,
            deploy: args.deploy,
        };
        let outcome = orchestrator
            .run(&session, &request, &ctx.cancel, &NoopObserver)
            .await?;

        Ok(json!({
            "function_id": request.function_id,
            "version_id": outcome.version_id,
            "task": outcome.task.raw,
            "polls": outcome.polls,
            "deployed": outcome.deployment.is_some(),
            "deployment": outcome.deployment,
        }))
    }
}

#[async_trait]
impl ToolHandler for GliaTools {
    fn list_tools(&self) -> Vec<ToolMetadata> {
        catalog()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<Value, ToolError> {
        self.dispatch(name, &arguments).await
    }
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
