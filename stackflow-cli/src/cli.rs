use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stackflow")]
#[command(version)]
#[command(about = "Deploy and remove additional infrastructure stacks", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Service configuration document (YAML or JSON)
    #[arg(short, long, global = true, default_value = "serverless.yml")]
    pub config: PathBuf,

    /// Deployment stage, overriding provider.stage
    #[arg(short, long, global = true)]
    pub stage: Option<String>,

    /// Target region, overriding provider.region
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    /// Compile and write templates without touching any stack
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Skip every additional stack command
    #[arg(long = "skip-additionalstacks", global = true)]
    pub skip: bool,

    /// Give up waiting for a stack after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds between status queries
    #[arg(long, global = true, value_name = "SECS", default_value_t = 5)]
    pub poll_interval: u64,

    /// Directory compiled templates are written to
    #[arg(long, global = true, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    /// Provisioning gateway URL, overriding provider.endpoint
    #[arg(long, global = true, env = "STACKFLOW_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the provisioning gateway
    #[arg(long, global = true, env = "STACKFLOW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or update additional stacks
    Deploy(TargetArgs),

    /// Delete additional stacks, last declared first
    Remove(TargetArgs),

    /// Show the status of every additional stack
    Info,

    /// Run a deployment lifecycle hook
    #[command(subcommand)]
    Hook(HookCommand),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Act on every stack, regardless of its Deploy timing
    #[arg(long)]
    pub all: bool,

    /// Act on one stack by logical name
    #[arg(long, value_name = "NAME")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum HookCommand {
    /// Deploy the stacks that go before the primary stack
    BeforeDeploy,

    /// Deploy the stacks that go after the primary stack
    AfterDeploy,
}
