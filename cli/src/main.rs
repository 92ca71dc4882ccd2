//! Glia Functions CLI - create, deploy and inspect Glia Functions

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use glia_commands::{
    CommandDependencies, GlobalArgs, configure, create, debug_auth, deploy, info, invoke, kv,
    list, logs, metadata, selection, show_config, stats, update,
};
use glia_runtime::config::{DEFAULT_KV_PAGE_SIZE, DEFAULT_VERSIONS_PER_PAGE, MAX_RECENT_LOG_HOURS};
use glia_runtime::environment::Environment;
use glia_runtime::error::GliaError;
use glia_runtime::types::SortOrder;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Environment: production, beta, production-eu or beta-eu
    #[arg(short, long, global = true, value_parser = parse_environment)]
    environment: Option<Environment>,
    /// Site ID, overrides the configured default
    #[arg(long, global = true)]
    site_id: Option<String>,
    /// Show more detail
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store API credentials, default site and environment
    Configure,
    /// Show the configuration with secrets masked
    ShowConfig,
    /// Check credentials and authentication step by step
    DebugAuth,
    /// Select the function other commands default to
    Select(SelectArgs),
    /// Show the selected function
    Current,
    /// Forget the selected function
    Clear,
    /// Create a function
    Create(CreateArgs),
    /// Upload new code, wait for the build and deploy it
    Update(UpdateArgs),
    /// Deploy an existing version
    Deploy(DeployArgs),
    /// Check a build task
    TaskStatus(TaskStatusArgs),
    /// Invoke a function endpoint
    Invoke(InvokeArgs),
    /// Fetch logs between two dates
    GetLogs(GetLogsArgs),
    /// Fetch logs from the last hours or minutes
    RecentLogs(RecentLogsArgs),
    /// Show function details
    GetInfo(FunctionArgs),
    /// Show one version
    GetVersion(VersionArgs),
    /// Print the source of a version
    GetCode(VersionArgs),
    /// List functions in the site
    List,
    /// List versions of a function
    ListVersions(ListVersionsArgs),
    /// Invocation statistics
    GetStats(StatsArgs),
    /// Change a function's name or description
    UpdateMetadata(MetadataArgs),
    /// Set a key in a key-value namespace
    KvSet(KvSetArgs),
    /// Get a key from a key-value namespace
    KvGet(KvKeyArgs),
    /// Delete a key from a key-value namespace
    KvDelete(KvKeyArgs),
    /// List pairs in a key-value namespace
    KvList(KvListArgs),
    /// Run key-value operations from a JSON file
    KvBulk(KvBulkArgs),
    /// Serve the tools over stdio for MCP clients
    Mcp,
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    value.parse::<Environment>().map_err(|e| e.to_string())
}

fn parse_order(value: &str) -> Result<SortOrder, String> {
    value.parse::<SortOrder>().map_err(|e| e.to_string())
}

#[derive(Debug, Args)]
struct FunctionArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
}

#[derive(Debug, Args)]
struct SelectArgs {
    /// Select this function instead of choosing interactively
    #[arg(long)]
    function_id: Option<String>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Function name
    #[arg(long)]
    name: String,
    /// Description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Bundled JavaScript file
    #[arg(long)]
    code: PathBuf,
    /// JSON object of environment variables
    #[arg(long)]
    env_file: PathBuf,
    /// Build the version without deploying it
    #[arg(long)]
    no_deploy: bool,
    /// Give up after this many status checks
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: Option<u32>,
}

#[derive(Debug, Args)]
struct DeployArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Version to deploy
    #[arg(long)]
    version_id: String,
}

#[derive(Debug, Args)]
struct TaskStatusArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Task ID
    #[arg(long)]
    task_id: String,
}

#[derive(Debug, Args)]
struct InvokeArgs {
    /// Invocation endpoint
    #[arg(long)]
    endpoint: String,
    /// JSON payload file
    #[arg(long)]
    payload: PathBuf,
}

#[derive(Debug, Args)]
struct GetLogsArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Start, e.g. 2024-01-15 or "2024-01-15 10:00:00"
    #[arg(long)]
    start_date: String,
    /// End, e.g. 2024-01-16
    #[arg(long)]
    end_date: String,
}

#[derive(Debug, Args)]
struct RecentLogsArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Window in hours
    #[arg(
        long,
        conflicts_with = "minutes",
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_RECENT_LOG_HOURS))
    )]
    hours: Option<u32>,
    /// Window in minutes
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_RECENT_LOG_HOURS) * 60)
    )]
    minutes: Option<u32>,
}

#[derive(Debug, Args)]
struct VersionArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Version ID
    #[arg(long)]
    version_id: String,
}

#[derive(Debug, Args)]
struct ListVersionsArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// Versions per page
    #[arg(long, default_value_t = DEFAULT_VERSIONS_PER_PAGE)]
    per_page: u32,
    /// Sort by creation time: asc or desc
    #[arg(long, default_value = "desc", value_parser = parse_order)]
    order: SortOrder,
}

#[derive(Debug, Args)]
struct StatsArgs {
    /// Only these functions
    #[arg(long, value_delimiter = ',')]
    function_ids: Vec<String>,
}

#[derive(Debug, Args)]
struct MetadataArgs {
    /// Function ID, defaults to the selected function
    #[arg(long)]
    function_id: Option<String>,
    /// New name
    #[arg(long)]
    name: Option<String>,
    /// New description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct KvSetArgs {
    /// Namespace
    #[arg(long)]
    namespace: String,
    /// Key
    #[arg(long)]
    key: String,
    /// Value
    #[arg(long)]
    value: String,
}

#[derive(Debug, Args)]
struct KvKeyArgs {
    /// Namespace
    #[arg(long)]
    namespace: String,
    /// Key
    #[arg(long)]
    key: String,
}

#[derive(Debug, Args)]
struct KvListArgs {
    /// Namespace
    #[arg(long)]
    namespace: String,
    /// Items per page
    #[arg(long, default_value_t = DEFAULT_KV_PAGE_SIZE)]
    max_page_size: u32,
}

#[derive(Debug, Args)]
struct KvBulkArgs {
    /// Namespace
    #[arg(long)]
    namespace: String,
    /// JSON array of operations
    #[arg(long)]
    operations: PathBuf,
}

// Conversion implementations

impl From<SelectArgs> for selection::SelectArgs {
    fn from(args: SelectArgs) -> Self {
        Self {
            function_id: args.function_id,
        }
    }
}

impl From<CreateArgs> for create::CreateArgs {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
        }
    }
}

impl From<UpdateArgs> for update::UpdateArgs {
    fn from(args: UpdateArgs) -> Self {
        Self {
            function_id: args.function_id,
            code: args.code,
            env_file: args.env_file,
            no_deploy: args.no_deploy,
            max_polls: args.max_polls,
        }
    }
}

impl From<DeployArgs> for deploy::DeployArgs {
    fn from(args: DeployArgs) -> Self {
        Self {
            function_id: args.function_id,
            version_id: args.version_id,
        }
    }
}

impl From<TaskStatusArgs> for info::TaskStatusArgs {
    fn from(args: TaskStatusArgs) -> Self {
        Self {
            function_id: args.function_id,
            task_id: args.task_id,
        }
    }
}

impl From<InvokeArgs> for invoke::InvokeArgs {
    fn from(args: InvokeArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            payload: args.payload,
        }
    }
}

impl From<GetLogsArgs> for logs::LogsArgs {
    fn from(args: GetLogsArgs) -> Self {
        Self {
            function_id: args.function_id,
            start_date: args.start_date,
            end_date: args.end_date,
        }
    }
}

impl From<RecentLogsArgs> for logs::RecentLogsArgs {
    fn from(args: RecentLogsArgs) -> Self {
        Self {
            function_id: args.function_id,
            hours: args.hours,
            minutes: args.minutes,
        }
    }
}

impl From<FunctionArgs> for info::InfoArgs {
    fn from(args: FunctionArgs) -> Self {
        Self {
            function_id: args.function_id,
        }
    }
}

impl From<VersionArgs> for info::VersionArgs {
    fn from(args: VersionArgs) -> Self {
        Self {
            function_id: args.function_id,
            version_id: args.version_id,
        }
    }
}

impl From<ListVersionsArgs> for list::ListVersionsArgs {
    fn from(args: ListVersionsArgs) -> Self {
        Self {
            function_id: args.function_id,
            per_page: args.per_page,
            order: args.order,
        }
    }
}

impl From<StatsArgs> for stats::StatsArgs {
    fn from(args: StatsArgs) -> Self {
        Self {
            function_ids: args.function_ids,
        }
    }
}

impl From<MetadataArgs> for metadata::MetadataArgs {
    fn from(args: MetadataArgs) -> Self {
        Self {
            function_id: args.function_id,
            name: args.name,
            description: args.description,
        }
    }
}

impl From<KvSetArgs> for kv::KvSetArgs {
    fn from(args: KvSetArgs) -> Self {
        Self {
            namespace: args.namespace,
            key: args.key,
            value: args.value,
        }
    }
}

impl From<KvKeyArgs> for kv::KvKeyArgs {
    fn from(args: KvKeyArgs) -> Self {
        Self {
            namespace: args.namespace,
            key: args.key,
        }
    }
}

impl From<KvListArgs> for kv::KvListArgs {
    fn from(args: KvListArgs) -> Self {
        Self {
            namespace: args.namespace,
            max_page_size: args.max_page_size,
        }
    }
}

impl From<KvBulkArgs> for kv::KvBulkArgs {
    fn from(args: KvBulkArgs) -> Self {
        Self {
            namespace: args.namespace,
            operations: args.operations,
        }
    }
}

async fn serve_tools(cancel: CancellationToken) -> Result<()> {
    let ctx = glia_mcp::ToolContext::real(cancel.clone())?;
    let tools = Arc::new(glia_mcp::GliaTools::new(ctx));
    tracing::info!("Serving Glia tools on stdio");
    glia_mcp::serve_stdio(tools, &cancel).await?;
    Ok(())
}

async fn run(command: Commands, deps: &Arc<CommandDependencies>) -> Result<()> {
    match command {
        Commands::Configure => configure::execute_with_deps(deps, configure::ConfigureArgs {}),
        Commands::ShowConfig => show_config::execute_with_deps(deps, show_config::ShowConfigArgs {}),
        Commands::DebugAuth => {
            debug_auth::execute_with_deps(deps, debug_auth::DebugAuthArgs {}).await
        }
        Commands::Select(args) => selection::execute_with_deps(deps, args.into()).await,
        Commands::Current => selection::execute_current(deps, selection::CurrentArgs {}),
        Commands::Clear => selection::execute_clear(deps, selection::ClearArgs {}),
        Commands::Create(args) => create::execute_with_deps(deps, args.into()).await,
        Commands::Update(args) => update::execute_with_deps(deps, args.into()).await,
        Commands::Deploy(args) => deploy::execute_with_deps(deps, args.into()).await,
        Commands::TaskStatus(args) => info::execute_task_status(deps, args.into()).await,
        Commands::Invoke(args) => invoke::execute_with_deps(deps, args.into()).await,
        Commands::GetLogs(args) => logs::execute_with_deps(deps, args.into()).await,
        Commands::RecentLogs(args) => logs::execute_recent(deps, args.into()).await,
        Commands::GetInfo(args) => info::execute_with_deps(deps, args.into()).await,
        Commands::GetVersion(args) => info::execute_version(deps, args.into()).await,
        Commands::GetCode(args) => info::execute_code(deps, args.into()).await,
        Commands::List => list::execute_with_deps(deps, list::ListArgs {}).await,
        Commands::ListVersions(args) => list::execute_versions(deps, args.into()).await,
        Commands::GetStats(args) => stats::execute_with_deps(deps, args.into()).await,
        Commands::UpdateMetadata(args) => metadata::execute_with_deps(deps, args.into()).await,
        Commands::KvSet(args) => kv::execute_set(deps, args.into()).await,
        Commands::KvGet(args) => kv::execute_get(deps, args.into()).await,
        Commands::KvDelete(args) => kv::execute_delete(deps, args.into()).await,
        Commands::KvList(args) => kv::execute_list(deps, args.into()).await,
        Commands::KvBulk(args) => kv::execute_bulk(deps, args.into()).await,
        Commands::Mcp => serve_tools(deps.cancel.clone()).await,
    }
}

/// Drive a command until it finishes or Ctrl-C fires, whichever comes first
async fn until_cancelled<F>(work: F, cancel: &CancellationToken) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        biased;
        result = work => result,
        () = cancel.cancelled() => {
            tracing::debug!("Command aborted by interrupt");
            Err(GliaError::Cancelled.into())
        }
    }
}

fn init_tracing(verbose: bool) {
    // stdout belongs to command output and the tool protocol
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupt received");
            on_signal.cancel();
        }
    });

    let global = GlobalArgs {
        environment: cli.environment,
        site_id: cli.site_id,
        verbose: cli.verbose,
    };
    let verbose = global.verbose;

    let result = match CommandDependencies::real(global, cancel.clone()) {
        // The tool server stops cleanly on its own when the token fires
        Ok(deps) if matches!(cli.command, Commands::Mcp) => run(cli.command, &deps).await,
        Ok(deps) => until_cancelled(run(cli.command, &deps), &cancel).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if verbose {
                eprintln!("Error: {e:?}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
