//! Stage orchestration: `fetch latest -> transform -> persist`, one stage at a time.
//! Transforms stay synchronous; the store is only awaited at stage boundaries.

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::aggregator::{self, KeyInsights};
use crate::cleaner::{self, CleaningReport};
use crate::error::Result;
use crate::extract;
use crate::metrics::{self, DerivationReport};
use crate::rules::BusinessRules;
use crate::stages::{DatasetHandle, Stage, StageStore};
use crate::warnings::DegenerateWarning;

pub const RAW_DATASET: &str = "raw_campaigns";
pub const CLEAN_DATASET: &str = "clean_campaigns";
pub const ENRICHED_DATASET: &str = "enriched_campaigns";

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    /// `None` when the source table was supplied directly rather than read from the store.
    pub input: Option<DatasetHandle>,
    pub rows: usize,
    pub output: DatasetHandle,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub input: DatasetHandle,
    pub cleaning: CleaningReport,
    pub output: DatasetHandle,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichReport {
    pub input: DatasetHandle,
    pub derivation: DerivationReport,
    pub output: DatasetHandle,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub input: DatasetHandle,
    pub tables: Vec<DatasetHandle>,
    pub insights: KeyInsights,
    pub warnings: Vec<DegenerateWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub extract: Option<ExtractReport>,
    pub clean: CleanReport,
    pub enrich: EnrichReport,
    pub aggregate: AggregateReport,
}

/// Prices a source export and persists it as the raw dataset. Without a supplied table the
/// newest `source/` object is used.
pub async fn run_extract(
    store: &StageStore,
    rules: &BusinessRules,
    source: Option<DataFrame>,
) -> Result<ExtractReport> {
    let (input, source) = match source {
        Some(df) => (None, df),
        None => {
            let (handle, df) = store.fetch_latest(Stage::Source).await?;
            (Some(handle), df)
        }
    };

    let raw = extract::add_cost_data(&source, rules)?;
    let output = store.persist(Stage::Raw, RAW_DATASET, &raw).await?;

    Ok(ExtractReport {
        input,
        rows: raw.height(),
        output,
    })
}

pub async fn run_clean(store: &StageStore) -> Result<CleanReport> {
    let input = store.latest(Stage::Raw).await?;
    clean_dataset(store, input).await
}

pub async fn run_enrich(store: &StageStore) -> Result<EnrichReport> {
    let input = store.latest(Stage::Clean).await?;
    enrich_dataset(store, input).await
}

pub async fn run_aggregate(store: &StageStore) -> Result<AggregateReport> {
    let input = store.latest(Stage::Enriched).await?;
    aggregate_dataset(store, input).await
}

async fn clean_dataset(store: &StageStore, input: DatasetHandle) -> Result<CleanReport> {
    let raw = store.fetch(&input.key).await?;
    let (clean, cleaning) = cleaner::clean_frame(&raw)?;
    let output = store.persist(Stage::Clean, CLEAN_DATASET, &clean).await?;

    Ok(CleanReport {
        input,
        cleaning,
        output,
    })
}

async fn enrich_dataset(store: &StageStore, input: DatasetHandle) -> Result<EnrichReport> {
    let clean = store.fetch(&input.key).await?;
    let (enriched, derivation) = metrics::derive_frame(&clean)?;
    let output = store
        .persist(Stage::Enriched, ENRICHED_DATASET, &enriched)
        .await?;

    Ok(EnrichReport {
        input,
        derivation,
        output,
    })
}

/// Every summary table is built before the first one is persisted, so an aggregation
/// failure leaves the summary stage untouched.
async fn aggregate_dataset(store: &StageStore, input: DatasetHandle) -> Result<AggregateReport> {
    let enriched = store.fetch(&input.key).await?;
    let summary = aggregator::aggregate(&enriched)?;

    let mut tables = Vec::with_capacity(summary.len());
    for table in summary.iter() {
        tables.push(store.persist(Stage::Summary, table.name, &table.frame).await?);
    }

    Ok(AggregateReport {
        input,
        tables,
        insights: summary.insights,
        warnings: summary.warnings,
    })
}

/// Full run: optional extract, then clean, enrich and aggregate. Each stage reads the
/// dataset the previous stage just persisted; without a source table the run starts from
/// the newest raw dataset.
pub async fn run_all(
    store: &StageStore,
    rules: &BusinessRules,
    source: Option<DataFrame>,
) -> Result<RunReport> {
    let extract = match source {
        Some(df) => Some(run_extract(store, rules, Some(df)).await?),
        None => None,
    };
    let raw = match &extract {
        Some(report) => report.output.clone(),
        None => store.latest(Stage::Raw).await?,
    };
    let clean = clean_dataset(store, raw).await?;
    let enrich = enrich_dataset(store, clean.output.clone()).await?;
    let aggregate = aggregate_dataset(store, enrich.output.clone()).await?;

    info!(
        clean_rows = clean.cleaning.output_rows,
        dropped_rows = clean.cleaning.dropped_rows(),
        summary_tables = aggregate.tables.len(),
        warnings = aggregate.warnings.len() + enrich.derivation.warnings.len(),
        "pipeline run complete"
    );

    Ok(RunReport {
        extract,
        clean,
        enrich,
        aggregate,
    })
}
