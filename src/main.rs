use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use xferd::adapters::TransfertoolBuilder;
use xferd::core::{TransferRequest, Transfertool};
use xferd::logging::LogConfig;
use xferd::{config, context, db, logging};

#[derive(Parser)]
#[command(name = "xferd")]
#[command(about = "Transfer-tool adapter for bulk file movement", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Args, Serialize)]
struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    base_directory: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    database_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    sync_files: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    retention_days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long, global = true)]
    json_logs: Option<bool>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a JSON manifest of transfer requests as one job
    Submit(SubmitArgs),
    /// Query job outcomes, executing any not-yet-run transfers
    Query(QueryArgs),
    /// Acknowledge cancellation of jobs
    Cancel(JobIdArgs),
    /// Drop terminal jobs older than the retention window
    Prune,
}

#[derive(Args)]
struct SubmitArgs {
    /// Path to a JSON array of transfer requests
    manifest: PathBuf,
}

#[derive(Args)]
struct QueryArgs {
    job_ids: Vec<String>,

    /// Report one record per request instead of a flat job state
    #[arg(long)]
    details: bool,
}

#[derive(Args)]
struct JobIdArgs {
    job_ids: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::AppConfig::new(Some(&cli.overrides))?;
    logging::init(LogConfig {
        json: config.json_logs,
        verbose: config.verbose,
    });

    let db_conn = db::init(&config.database_path)
        .await
        .context("Failed to open descriptor store")?;
    let ctx = context::AppContext::new(config, db_conn);

    match cli.command {
        Commands::Submit(args) => run_submit(ctx, args).await,
        Commands::Query(args) => run_query(ctx, args).await,
        Commands::Cancel(args) => run_cancel(ctx, args).await,
        Commands::Prune => run_prune(ctx).await,
    }
}

async fn run_submit(ctx: context::AppContext, args: SubmitArgs) -> Result<()> {
    let manifest = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let requests: Vec<TransferRequest> =
        serde_json::from_str(&manifest).context("Manifest is not a JSON array of requests")?;

    let tool = TransfertoolBuilder::for_requests(&requests).build(ctx);
    for job in tool.group_into_submit_jobs(vec![requests]) {
        let job_id = tool.submit(&job.requests, &job.job_params).await?;
        println!("{job_id}");
    }
    Ok(())
}

async fn run_query(ctx: context::AppContext, args: QueryArgs) -> Result<()> {
    if args.job_ids.is_empty() {
        bail!("No job ids given");
    }

    let tool = TransfertoolBuilder::for_requests(&[]).build(ctx);
    let outcomes = tool.query(&args.job_ids, args.details).await?;
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}

async fn run_cancel(ctx: context::AppContext, args: JobIdArgs) -> Result<()> {
    let tool = TransfertoolBuilder::for_requests(&[]).build(ctx);
    let acknowledged = tool.cancel(&args.job_ids).await?;
    println!("cancelled: {acknowledged}");
    Ok(())
}

async fn run_prune(ctx: context::AppContext) -> Result<()> {
    let Some(days) = ctx.config.retention_days else {
        bail!("retention_days is not configured; refusing to prune");
    };

    let removed = db::outcomes::prune(&ctx.db, days).await?;
    println!("pruned {removed} job(s)");
    Ok(())
}
