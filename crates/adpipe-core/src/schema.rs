use polars::prelude::*;
use thiserror::Error;

pub const USER_ID: &str = "user_id";
pub const AD_ID: &str = "ad_id";
pub const AD_PLATFORM: &str = "ad_platform";
pub const AD_TYPE: &str = "ad_type";
pub const AD_CATEGORY: &str = "ad_category";
pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const LOCATION: &str = "location";
pub const DEVICE_TYPE: &str = "device_type";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const IMPRESSIONS: &str = "impressions";
pub const CLICKS: &str = "clicks";
pub const CONVERSION: &str = "conversion";
pub const ENGAGEMENT_SCORE: &str = "engagement_score";
pub const AMOUNT_SPENT: &str = "amount_spent";
pub const CONVERSION_VALUE: &str = "conversion_value";

pub const CTR: &str = "ctr";
pub const CONVERSION_RATE: &str = "conversion_rate";
pub const COST_PER_CLICK: &str = "cost_per_click";
pub const COST_PER_CONVERSION: &str = "cost_per_conversion";
pub const ROAS: &str = "roas";
pub const ROI_PERCENTAGE: &str = "roi_percentage";
pub const PROFIT: &str = "profit";
pub const QUALITY_SCORE: &str = "quality_score";
pub const ROI_CATEGORY: &str = "roi_category";
pub const PERFORMANCE_CATEGORY: &str = "performance_category";
pub const AGE_GROUP: &str = "age_group";
pub const SPENDING_TIER: &str = "spending_tier";

/// Columns a source export must carry for cost data to be derived.
pub const SOURCE_COLUMNS: [&str; 3] = [AD_PLATFORM, CLICKS, CONVERSION];

/// Base campaign record columns, in the order every stage writes them.
pub const RAW_COLUMNS: [&str; 16] = [
    USER_ID,
    AD_ID,
    AD_PLATFORM,
    AD_TYPE,
    AD_CATEGORY,
    AGE,
    GENDER,
    LOCATION,
    DEVICE_TYPE,
    DAY_OF_WEEK,
    IMPRESSIONS,
    CLICKS,
    CONVERSION,
    ENGAGEMENT_SCORE,
    AMOUNT_SPENT,
    CONVERSION_VALUE,
];

pub const DERIVED_COLUMNS: [&str; 12] = [
    CTR,
    CONVERSION_RATE,
    COST_PER_CLICK,
    COST_PER_CONVERSION,
    ROAS,
    ROI_PERCENTAGE,
    PROFIT,
    QUALITY_SCORE,
    ROI_CATEGORY,
    PERFORMANCE_CATEGORY,
    AGE_GROUP,
    SPENDING_TIER,
];

const STRING_COLUMNS: [&str; 14] = [
    USER_ID,
    AD_ID,
    AD_PLATFORM,
    AD_TYPE,
    AD_CATEGORY,
    GENDER,
    LOCATION,
    DEVICE_TYPE,
    DAY_OF_WEEK,
    ROI_CATEGORY,
    PERFORMANCE_CATEGORY,
    AGE_GROUP,
    SPENDING_TIER,
    "budget_recommendation",
];

const INTEGER_COLUMNS: [&str; 4] = [AGE, IMPRESSIONS, CLICKS, CONVERSION];

const FLOAT_COLUMNS: [&str; 11] = [
    ENGAGEMENT_SCORE,
    AMOUNT_SPENT,
    CONVERSION_VALUE,
    CTR,
    CONVERSION_RATE,
    COST_PER_CLICK,
    COST_PER_CONVERSION,
    ROAS,
    ROI_PERCENTAGE,
    PROFIT,
    QUALITY_SCORE,
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{table} table is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        table: &'static str,
        missing: Vec<String>,
    },
    #[error("column {column} could not be read as {expected}: {reason}")]
    InvalidColumn {
        column: String,
        expected: &'static str,
        reason: String,
    },
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

pub fn enriched_columns() -> Vec<&'static str> {
    RAW_COLUMNS
        .iter()
        .chain(DERIVED_COLUMNS.iter())
        .copied()
        .collect()
}

/// Fails with every missing name at once rather than the first one found.
pub fn require_columns(
    df: &DataFrame,
    table: &'static str,
    required: &[&str],
) -> Result<(), SchemaError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns { table, missing })
    }
}

/// Canonical dtype of a known campaign column.
pub fn canonical_dtype(name: &str) -> Option<DataType> {
    if STRING_COLUMNS.contains(&name) {
        Some(DataType::String)
    } else if INTEGER_COLUMNS.contains(&name) {
        Some(DataType::Int64)
    } else if FLOAT_COLUMNS.contains(&name) {
        Some(DataType::Float64)
    } else {
        None
    }
}

/// Schema pinning the known columns among `names`; unknown names are left out so the
/// reader still infers them.
pub fn canonical_schema<'a>(names: impl IntoIterator<Item = &'a str>) -> Schema {
    names
        .into_iter()
        .filter_map(|name| canonical_dtype(name).map(|dtype| (PlSmallStr::from(name), dtype)))
        .collect()
}

fn expected_label(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::String => "string",
        DataType::Int64 => "integer",
        _ => "float",
    }
}

/// Casts every known column present in `df` to its canonical dtype. A header-only CSV
/// reads every column as String; downstream code relies on the canonical types.
pub fn coerce_known_columns(df: &DataFrame) -> Result<DataFrame, SchemaError> {
    let mut output = df.clone();

    for column in df.get_columns() {
        let Some(dtype) = canonical_dtype(column.name().as_str()) else {
            continue;
        };
        if column.dtype() == &dtype {
            continue;
        }

        let cast = column
            .strict_cast(&dtype)
            .map_err(|err| SchemaError::InvalidColumn {
                column: column.name().to_string(),
                expected: expected_label(&dtype),
                reason: err.to_string(),
            })?;
        output.with_column(cast)?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_are_all_reported() {
        let df = df!(USER_ID => &["u1"], AD_ID => &["a1"]).unwrap();
        let err = require_columns(&df, "raw", &[USER_ID, AGE, CLICKS]).unwrap_err();
        match err {
            SchemaError::MissingColumns { table, missing } => {
                assert_eq!(table, "raw");
                assert_eq!(missing, vec!["age".to_string(), "clicks".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn integer_ids_and_whole_spend_are_coerced() {
        let df = df!(
            USER_ID => &[1i64, 2],
            AMOUNT_SPENT => &[10i64, 0],
            AGE => &[30i64, 40],
        )
        .unwrap();

        let coerced = coerce_known_columns(&df).unwrap();
        assert_eq!(coerced.column(USER_ID).unwrap().dtype(), &DataType::String);
        assert_eq!(
            coerced.column(AMOUNT_SPENT).unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(coerced.column(AGE).unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn canonical_schema_skips_unknown_columns() {
        let schema = canonical_schema([USER_ID, "campaign_note", AMOUNT_SPENT, CLICKS]);

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.get(USER_ID), Some(&DataType::String));
        assert_eq!(schema.get(AMOUNT_SPENT), Some(&DataType::Float64));
        assert_eq!(schema.get(CLICKS), Some(&DataType::Int64));
        assert_eq!(schema.get("campaign_note"), None);
    }

    #[test]
    fn unparseable_numbers_are_rejected() {
        let df = df!(IMPRESSIONS => &["many"]).unwrap();
        let err = coerce_known_columns(&df).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidColumn { ref column, .. } if column == IMPRESSIONS));
    }
}
