use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::metrics::round_to;
use crate::rules::BusinessRules;
use crate::schema::{self, AD_PLATFORM, AMOUNT_SPENT, CLICKS, CONVERSION, CONVERSION_VALUE};

/// Prices a source export: `amount_spent` from clicks and the platform's cost per click,
/// `conversion_value` from conversions. Existing cost columns are overwritten; every other
/// column passes through untouched.
pub fn add_cost_data(source: &DataFrame, rules: &BusinessRules) -> Result<DataFrame> {
    schema::require_columns(source, "source", &schema::SOURCE_COLUMNS)?;
    let source = schema::coerce_known_columns(source)?;

    let platforms = source.column(AD_PLATFORM)?.str()?;
    let clicks = source.column(CLICKS)?.i64()?;
    let conversions = source.column(CONVERSION)?.i64()?;

    let amount_spent: Vec<Option<f64>> = (0..source.height())
        .map(|idx| {
            let clicks = clicks.get(idx)?;
            let rate = platforms
                .get(idx)
                .map(|platform| rules.cpc_for(platform))
                .unwrap_or(rules.default_cpc);
            Some(round_to(clicks as f64 * rate, 2))
        })
        .collect();

    let conversion_value: Vec<Option<f64>> = conversions
        .into_iter()
        .map(|conversion| conversion.map(|count| count as f64 * rules.conversion_value))
        .collect();

    let mut output = source.clone();
    output.with_column(Series::new(AMOUNT_SPENT.into(), amount_spent))?;
    output.with_column(Series::new(CONVERSION_VALUE.into(), conversion_value))?;

    info!(rows = output.height(), "added cost data");

    Ok(output)
}
