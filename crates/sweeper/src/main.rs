//! sweeper: deletes old Beanstalk versions, ECR images and ECS task
//! definition revisions past their retention limits.
//!
//! Meant to run from a scheduler. Every option has an environment variable
//! fallback so the binary can be configured without arguments.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sweeper::aws::classify_anyhow_error;
use sweeper::config::{AwsConfig, RetentionLimits, RuntimeFlags, SweepConfig};
use sweeper::run_sweep;
use sweeper_core::ResourceFamily;
use sweeper_core::defaults::{DEFAULT_BATCH_SIZE, DEFAULT_VERSIONS_LIMIT};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sweeper")]
#[command(about = "Retention-based cleanup of AWS deployment artifacts")]
#[command(version)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// AWS region (falls back to AWS_REGION)
    #[arg(long, env = "REGION", global = true)]
    region: Option<String>,

    /// AWS profile to use
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// ECR registry id (default: account of the current credentials)
    #[arg(long, env = "ECR_REGISTRY_ID", global = true)]
    registry_id: Option<String>,

    /// Application versions to keep per Beanstalk application
    #[arg(long, env = "VERSIONS_LIMIT", default_value_t = DEFAULT_VERSIONS_LIMIT, global = true)]
    versions_limit: usize,

    /// Tagged images to keep per ECR repository
    #[arg(long, env = "IMAGES_LIMIT", global = true)]
    images_limit: Option<usize>,

    /// Revisions to keep per ECS task definition family
    #[arg(long, env = "TASK_DEFINITION_REVISIONS_LIMIT", global = true)]
    task_definition_revisions_limit: Option<usize>,

    /// Upper bound on resources per delete call
    #[arg(long, env = "SWEEPER_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE, global = true)]
    batch_size: usize,

    /// Log what would be deleted without deleting anything
    #[arg(long, env = "SWEEPER_DRY_RUN", global = true)]
    dry_run: bool,

    /// Skip groups whose listing fails instead of aborting the run
    #[arg(long, env = "SWEEPER_SKIP_FAILED_GROUPS", global = true)]
    skip_failed_groups: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "SWEEPER_LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Delete old Elastic Beanstalk application versions
    Beanstalk,

    /// Delete old tagged and all untagged ECR images
    Ecr {
        /// Leave untagged images alone
        #[arg(long)]
        skip_untagged: bool,
    },

    /// Deregister old ECS task definition revisions
    Ecs,

    /// Run every cleanup
    All,
}

impl Command {
    fn families(self) -> Vec<ResourceFamily> {
        match self {
            Command::Beanstalk => vec![ResourceFamily::BeanstalkVersions],
            Command::Ecr { skip_untagged: true } => vec![ResourceFamily::EcrTaggedImages],
            Command::Ecr { skip_untagged: false } => vec![
                ResourceFamily::EcrTaggedImages,
                ResourceFamily::EcrUntaggedImages,
            ],
            Command::Ecs => vec![ResourceFamily::EcsTaskDefinitions],
            Command::All => ResourceFamily::ALL.to_vec(),
        }
    }
}

impl From<Args> for SweepConfig {
    fn from(args: Args) -> Self {
        let common = args.common;
        let region = common
            .region
            .or_else(|| std::env::var("AWS_REGION").ok())
            .unwrap_or_default();

        Self {
            aws: AwsConfig {
                region,
                aws_profile: common.aws_profile,
                registry_id: common.registry_id,
            },
            limits: RetentionLimits {
                versions: common.versions_limit,
                images: common.images_limit,
                task_definition_revisions: common.task_definition_revisions_limit,
            },
            flags: RuntimeFlags {
                batch_size: common.batch_size,
                dry_run: common.dry_run,
                skip_failed_groups: common.skip_failed_groups,
            },
            families: args.command.families(),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(hint) = classify_anyhow_error(e).and_then(|err| err.suggestion()) {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {hint}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

/// Used when RUST_LOG is unset. Keeps the AWS SDK quiet unless something
/// goes wrong.
const DEFAULT_LOG_DIRECTIVES: &str = "info,aws_config=warn,aws_smithy_runtime=warn,\
aws_sdk_ecr=warn,aws_sdk_ecs=warn,aws_sdk_elasticbeanstalk=warn";

/// RUST_LOG as given, or the defaults when it is unset or empty
fn log_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::new(DEFAULT_LOG_DIRECTIVES)),
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())?;

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.common.log_json)?;

    let config = SweepConfig::from(args);
    let summary = run_sweep(&config).await?;

    // Summary goes to stdout, logs to stderr
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
