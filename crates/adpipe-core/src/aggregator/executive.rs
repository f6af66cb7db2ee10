use polars::prelude::*;
use tracing::warn;

use super::tables::{AVG_ROI, BUDGET_RECOMMENDATION};
use crate::schema::{
    AD_PLATFORM, AMOUNT_SPENT, CONVERSION, CONVERSION_RATE, CONVERSION_VALUE,
    COST_PER_CONVERSION, CTR, PROFIT, ROI_PERCENTAGE,
};
use crate::warnings::DegenerateWarning;

const NOT_AVAILABLE: &str = "N/A";

/// Row labels of the executive summary, in order.
pub const EXECUTIVE_METRICS: [&str; 11] = [
    "Total Campaigns",
    "Total Ad Spend",
    "Total Revenue",
    "Total Profit",
    "Overall ROI %",
    "Average CTR %",
    "Average Conversion Rate %",
    "Total Conversions",
    "Cost Per Conversion",
    "Best Performing Platform",
    "Recommended Action",
];

/// Two-column `metric`/`value` table of headline KPIs, every value rendered as text.
pub fn executive_summary(
    enriched: &DataFrame,
    platforms: &DataFrame,
    warnings: &mut Vec<DegenerateWarning>,
) -> PolarsResult<DataFrame> {
    let spend = enriched.column(AMOUNT_SPENT)?.f64()?.sum().unwrap_or(0.0);
    let revenue = enriched.column(CONVERSION_VALUE)?.f64()?.sum().unwrap_or(0.0);
    let profit = enriched.column(PROFIT)?.f64()?.sum().unwrap_or(0.0);
    let conversions = enriched.column(CONVERSION)?.i64()?.sum().unwrap_or(0);

    let roi = enriched.column(ROI_PERCENTAGE)?.f64()?.mean();
    let ctr = enriched.column(CTR)?.f64()?.mean();
    let conversion_rate = enriched.column(CONVERSION_RATE)?.f64()?.mean();
    let cost_per_conversion = enriched.column(COST_PER_CONVERSION)?.f64()?.mean();

    let (best_platform, recommendation) = match best_platform(platforms)? {
        Some(best) => best,
        None => {
            let warning = DegenerateWarning::NoPlatforms;
            warn!(%warning, "executive summary without a best platform");
            warnings.push(warning);
            (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string())
        }
    };

    let values: Vec<String> = vec![
        enriched.height().to_string(),
        format_currency(spend),
        format_currency(revenue),
        format_currency(profit),
        roi.map_or_else(not_available, format_percent),
        ctr.map_or_else(not_available, format_percent),
        conversion_rate.map_or_else(not_available, format_percent),
        conversions.to_string(),
        cost_per_conversion.map_or_else(not_available, format_plain_currency),
        best_platform,
        recommendation,
    ];

    df!(
        "metric" => EXECUTIVE_METRICS.to_vec(),
        "value" => values
    )
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// First platform row holding the maximum `avg_roi`, with its recommendation.
fn best_platform(platforms: &DataFrame) -> PolarsResult<Option<(String, String)>> {
    if platforms.height() == 0 {
        return Ok(None);
    }

    let names = platforms.column(AD_PLATFORM)?.str()?;
    let avg_roi = platforms.column(AVG_ROI)?.f64()?;
    let recommendations = platforms.column(BUDGET_RECOMMENDATION)?.str()?;

    Ok(super::first_max(avg_roi).map(|(idx, _)| {
        (
            names.get(idx).unwrap_or(NOT_AVAILABLE).to_string(),
            recommendations.get(idx).unwrap_or(NOT_AVAILABLE).to_string(),
        )
    }))
}

/// `$1,234.56`; negative amounts keep the sign after the symbol, `$-12.00`. NaN and
/// infinite amounts render as `N/A`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return not_available();
    }
    let fixed = format!("{value:.2}");
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("${sign}{grouped}.{fraction}")
}

pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return not_available();
    }
    format!("{value:.2}%")
}

/// `$1234.56`, without thousands separators.
fn format_plain_currency(value: f64) -> String {
    if !value.is_finite() {
        return not_available();
    }
    format!("${value:.2}")
}
