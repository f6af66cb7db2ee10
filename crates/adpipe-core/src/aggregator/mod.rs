//! Summary roll-ups over the enriched table: one grouped table per dimension plus the
//! executive summary.

mod executive;
mod insights;
pub mod tables;

use polars::prelude::*;
use tracing::{info, warn};

use crate::categories::{BudgetRecommendation, DayOfWeek};
use crate::error::Result;
use crate::metrics::round_to;
use crate::schema;
use crate::warnings::DegenerateWarning;

pub use executive::{executive_summary, format_currency, format_percent, EXECUTIVE_METRICS};
pub use insights::{DayLeader, DimensionLeader, KeyInsights};
pub use tables::{
    dimension_tables, DimensionTable, RowOrder, AD_TYPE_PERFORMANCE,
    AGE_GROUP_PERFORMANCE, AVG_ROI, BUDGET_ALLOCATION, BUDGET_RECOMMENDATION,
    CATEGORY_PERFORMANCE, DAY_OF_WEEK_PERFORMANCE, DEVICE_PERFORMANCE, EXECUTIVE_SUMMARY,
    GENDER_PERFORMANCE, LOCATION_PERFORMANCE, PLATFORM_PERFORMANCE, SUMMARY_TABLE_NAMES,
};

const SUMMARY_DECIMALS: u32 = 2;
const ALLOCATION_DECIMALS: u32 = 1;

#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub name: &'static str,
    pub frame: DataFrame,
}

/// The nine summary tables in publication order, with the insights read off them and any
/// degenerate-aggregate warnings raised while building them.
#[derive(Debug, Clone)]
pub struct SummaryTables {
    tables: Vec<SummaryTable>,
    pub insights: KeyInsights,
    pub warnings: Vec<DegenerateWarning>,
}

impl SummaryTables {
    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .map(|table| &table.frame)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SummaryTable> {
        self.tables.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|table| table.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub fn aggregate(enriched: &DataFrame) -> Result<SummaryTables> {
    schema::require_columns(enriched, "enriched", &schema::enriched_columns())?;
    let enriched = schema::coerce_known_columns(enriched)?;

    let mut warnings = Vec::new();
    if enriched.height() == 0 {
        let warning = DegenerateWarning::EmptyInput {
            table: EXECUTIVE_SUMMARY,
        };
        warn!(%warning, "aggregating an empty table");
        warnings.push(warning);
    }

    let mut tables = Vec::with_capacity(SUMMARY_TABLE_NAMES.len());
    for spec in dimension_tables() {
        let mut frame = summarize(&enriched, spec)?;
        if spec.name == PLATFORM_PERFORMANCE {
            add_budget_columns(&mut frame, &mut warnings)?;
        }
        info!(table = spec.name, rows = frame.height(), "built summary table");
        tables.push(SummaryTable {
            name: spec.name,
            frame,
        });
    }

    let no_platforms = DataFrame::empty();
    let platforms = tables
        .iter()
        .find(|table| table.name == PLATFORM_PERFORMANCE)
        .map_or(&no_platforms, |table| &table.frame);
    let executive = executive_summary(&enriched, platforms, &mut warnings)?;
    let insights = KeyInsights::from_tables(&tables)?;

    tables.push(SummaryTable {
        name: EXECUTIVE_SUMMARY,
        frame: executive,
    });

    Ok(SummaryTables {
        tables,
        insights,
        warnings,
    })
}

/// Groups by the table key (null keys excluded), applies the metric columns, rounds, and
/// orders the rows.
pub fn summarize(enriched: &DataFrame, spec: &DimensionTable) -> PolarsResult<DataFrame> {
    let aggregations: Vec<Expr> = spec.columns.iter().map(|column| column.expr()).collect();

    let mut frame = enriched
        .clone()
        .lazy()
        .filter(col(spec.key).is_not_null())
        .group_by([col(spec.key)])
        .agg(aggregations)
        .sort([spec.key], SortMultipleOptions::default())
        .collect()?;

    round_float_columns(&mut frame, SUMMARY_DECIMALS)?;

    match spec.order {
        RowOrder::Key => Ok(frame),
        RowOrder::Calendar => order_by_calendar(&frame, spec.key),
    }
}

/// Index and value of the first maximum, skipping nulls.
fn first_max(values: &Float64Chunked) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in values.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        if best.map_or(true, |(_, current)| value > current) {
            best = Some((idx, value));
        }
    }
    best
}

fn round_float_columns(frame: &mut DataFrame, decimals: u32) -> PolarsResult<()> {
    let names: Vec<PlSmallStr> = frame
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::Float64)
        .map(|column| column.name().clone())
        .collect();

    for name in names {
        let rounded: Vec<Option<f64>> = frame
            .column(name.as_str())?
            .f64()?
            .into_iter()
            .map(|value| value.map(|v| round_to(v, decimals)))
            .collect();
        frame.with_column(Series::new(name, rounded))?;
    }
    Ok(())
}

fn order_by_calendar(frame: &DataFrame, key: &str) -> PolarsResult<DataFrame> {
    let labels = frame.column(key)?.str()?;
    let mut order: Vec<IdxSize> = (0..frame.height() as IdxSize).collect();
    order.sort_by(|a, b| {
        DayOfWeek::compare_labels(
            labels.get(*a as usize).unwrap_or_default(),
            labels.get(*b as usize).unwrap_or_default(),
        )
    });
    frame.take(&IdxCa::from_vec("order".into(), order))
}

/// Appends the budget recommendation and each platform's share of the total `avg_roi`.
/// Shares are left null when the total is not positive.
fn add_budget_columns(
    platforms: &mut DataFrame,
    warnings: &mut Vec<DegenerateWarning>,
) -> PolarsResult<()> {
    let avg_roi: Vec<Option<f64>> = platforms.column(AVG_ROI)?.f64()?.into_iter().collect();

    let recommendations: Vec<Option<&'static str>> = avg_roi
        .iter()
        .map(|roi| roi.map(|roi| BudgetRecommendation::from_avg_roi(roi).label()))
        .collect();

    let total: f64 = avg_roi.iter().flatten().sum();
    let allocation: Vec<Option<f64>> = if !avg_roi.is_empty() && total <= 0.0 {
        let warning = DegenerateWarning::NonPositiveRoiTotal { total };
        warn!(%warning, "skipping budget allocation");
        warnings.push(warning);
        vec![None; avg_roi.len()]
    } else {
        avg_roi
            .iter()
            .map(|roi| roi.map(|roi| round_to(roi / total * 100.0, ALLOCATION_DECIMALS)))
            .collect()
    };

    platforms.with_column(Series::new(BUDGET_RECOMMENDATION.into(), recommendations))?;
    platforms.with_column(Series::new(BUDGET_ALLOCATION.into(), allocation))?;
    Ok(())
}
