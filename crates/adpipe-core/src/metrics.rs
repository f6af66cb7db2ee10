use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use crate::categories::{AgeGroup, PerformanceCategory, RoiCategory, SpendingTier};
use crate::error::Result;
use crate::record::{self, CampaignRecord, EnrichedRecord};
use crate::schema::{AGE_GROUP, PERFORMANCE_CATEGORY, ROI_CATEGORY, SPENDING_TIER};
use crate::warnings::DegenerateWarning;

const CTR_WEIGHT: f64 = 0.3;
const CONVERSION_RATE_WEIGHT: f64 = 0.4;
const ENGAGEMENT_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivationReport {
    pub rows: usize,
    pub warnings: Vec<DegenerateWarning>,
}

/// Rounds half-to-even at `decimals` places: `round_to(0.125, 2) == 0.12`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// A zero denominator becomes 1 so zero-activity rows report 0 instead of a missing value.
fn guard_count(value: i64) -> f64 {
    if value == 0 {
        1.0
    } else {
        value as f64
    }
}

fn guard_amount(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

pub fn derive_record(record: &CampaignRecord) -> EnrichedRecord {
    let clicks = record.clicks as f64;
    let conversion = record.conversion as f64;

    let ctr = round_to(clicks / record.impressions as f64 * 100.0, 2);
    let conversion_rate = round_to(conversion / guard_count(record.clicks) * 100.0, 2);
    let cost_per_click = round_to(record.amount_spent / guard_count(record.clicks), 2);
    let cost_per_conversion = round_to(record.amount_spent / guard_count(record.conversion), 2);
    let roas = round_to(record.conversion_value / guard_amount(record.amount_spent), 2);
    let net = record.conversion_value - record.amount_spent;
    let roi_percentage = round_to(net / guard_amount(record.amount_spent) * 100.0, 2);
    let profit = round_to(net, 2);
    let quality_score = round_to(
        ctr * CTR_WEIGHT
            + conversion_rate * CONVERSION_RATE_WEIGHT
            + record.engagement_score * 100.0 * ENGAGEMENT_WEIGHT,
        2,
    );

    EnrichedRecord {
        record: record.clone(),
        ctr,
        conversion_rate,
        cost_per_click,
        cost_per_conversion,
        roas,
        roi_percentage,
        profit,
        quality_score,
        roi_category: RoiCategory::from_roi(roi_percentage),
        performance_category: PerformanceCategory::from_quality_score(quality_score),
        age_group: AgeGroup::from_age(record.age),
        spending_tier: SpendingTier::from_spend(record.amount_spent),
    }
}

pub fn derive_metrics(records: &[CampaignRecord]) -> (Vec<EnrichedRecord>, DerivationReport) {
    let enriched: Vec<EnrichedRecord> = records.iter().map(derive_record).collect();

    let unbucketed = [
        (
            ROI_CATEGORY,
            enriched.iter().filter(|r| r.roi_category.is_none()).count(),
        ),
        (
            PERFORMANCE_CATEGORY,
            enriched
                .iter()
                .filter(|r| r.performance_category.is_none())
                .count(),
        ),
        (
            AGE_GROUP,
            enriched.iter().filter(|r| r.age_group.is_none()).count(),
        ),
        (
            SPENDING_TIER,
            enriched.iter().filter(|r| r.spending_tier.is_none()).count(),
        ),
    ];

    let warnings: Vec<DegenerateWarning> = unbucketed
        .into_iter()
        .filter(|(_, rows)| *rows > 0)
        .map(|(column, rows)| DegenerateWarning::Unbucketed { column, rows })
        .collect();

    for warning in &warnings {
        warn!(%warning, "category left empty");
    }
    info!(rows = enriched.len(), "derived campaign metrics");

    let report = DerivationReport {
        rows: enriched.len(),
        warnings,
    };
    (enriched, report)
}

/// Frame-level entry point. Any table carrying the base columns is accepted; rows with
/// missing counters are skipped.
pub fn derive_frame(clean: &DataFrame) -> Result<(DataFrame, DerivationReport)> {
    let raw = record::raw_records_from_frame(clean)?;
    let records: Vec<CampaignRecord> = raw.iter().filter_map(|row| row.complete()).collect();

    let skipped = raw.len() - records.len();
    if skipped > 0 {
        warn!(skipped, "clean table contained incomplete rows; skipped");
    }

    let (enriched, report) = derive_metrics(&records);
    let df = record::enriched_records_to_frame(&enriched)?;
    Ok((df, report))
}
