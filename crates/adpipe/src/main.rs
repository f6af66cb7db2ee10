use std::path::{Path, PathBuf};
use std::sync::Arc;

use adpipe_bucket::{BucketStore, LocalBucketStore, S3BucketStore, S3Config};
use adpipe_core::{runner, stages, BusinessRules, DataFrame, StageStore};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ad campaign ETL pipeline", long_about = None)]
struct Cli {
    /// Use a local directory as the object store instead of S3
    #[arg(long, global = true)]
    local_dir: Option<PathBuf>,
    /// TOML file overriding the cost-per-click table and conversion value
    #[arg(long, global = true)]
    rules: Option<PathBuf>,
    /// Print the stage report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add cost data to a source export and store it as the raw dataset
    Extract(InputArgs),
    /// Deduplicate, validate and normalize the latest raw dataset
    Clean,
    /// Derive per-campaign metrics from the latest clean dataset
    Enrich,
    /// Build the summary tables from the latest enriched dataset
    Aggregate,
    /// Run every stage in order
    Run(InputArgs),
}

#[derive(Args, Debug, Default)]
struct InputArgs {
    /// Local source CSV; without it the newest `source/` object is used (extract) or the
    /// run starts from the newest raw dataset (run)
    #[arg(long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let store = open_store(cli.local_dir.as_deref()).await?;
    let rules = load_rules(cli.rules.as_deref())?;

    match cli.command {
        Command::Extract(args) => {
            let source = args.input.as_deref().map(read_source).transpose()?;
            let report = runner::run_extract(&store, &rules, source)
                .await
                .context("extract stage failed")?;
            emit(&report, cli.json)
        }
        Command::Clean => {
            let report = runner::run_clean(&store)
                .await
                .context("clean stage failed")?;
            emit(&report, cli.json)
        }
        Command::Enrich => {
            let report = runner::run_enrich(&store)
                .await
                .context("enrich stage failed")?;
            emit(&report, cli.json)
        }
        Command::Aggregate => {
            let report = runner::run_aggregate(&store)
                .await
                .context("aggregate stage failed")?;
            emit(&report, cli.json)
        }
        Command::Run(args) => {
            let source = args.input.as_deref().map(read_source).transpose()?;
            let report = runner::run_all(&store, &rules, source)
                .await
                .context("pipeline run failed")?;
            emit(&report, cli.json)
        }
    }
}

async fn open_store(local_dir: Option<&Path>) -> Result<StageStore> {
    let store: Arc<dyn BucketStore> = match local_dir {
        Some(dir) => {
            info!(root = %dir.display(), "using local directory store");
            Arc::new(LocalBucketStore::new(dir))
        }
        None => {
            let config = S3Config::from_env();
            info!(bucket = %config.bucket, region = %config.region, "using S3 store");
            Arc::new(
                S3BucketStore::new(config)
                    .await
                    .context("failed to configure S3 store")?,
            )
        }
    };
    Ok(StageStore::new(store))
}

fn load_rules(path: Option<&Path>) -> Result<BusinessRules> {
    match path {
        Some(path) => BusinessRules::from_path(path)
            .with_context(|| format!("failed to load business rules from {}", path.display())),
        None => Ok(BusinessRules::default()),
    }
}

fn read_source(path: &Path) -> Result<DataFrame> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let df = stages::decode_csv(&bytes)
        .with_context(|| format!("failed to parse {} as CSV", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "read source table");
    Ok(df)
}

fn emit<T: Serialize>(report: &T, json: bool) -> Result<()> {
    let rendered = serde_json::to_string_pretty(report).context("failed to render report")?;
    if json {
        println!("{rendered}");
    } else {
        info!(report = %rendered, "stage complete");
    }
    Ok(())
}
