use once_cell::sync::Lazy;
use polars::prelude::*;

use crate::schema::*;

pub const PLATFORM_PERFORMANCE: &str = "platform_performance";
pub const AGE_GROUP_PERFORMANCE: &str = "age_group_performance";
pub const GENDER_PERFORMANCE: &str = "gender_performance";
pub const LOCATION_PERFORMANCE: &str = "location_performance";
pub const DEVICE_PERFORMANCE: &str = "device_performance";
pub const DAY_OF_WEEK_PERFORMANCE: &str = "day_of_week_performance";
pub const CATEGORY_PERFORMANCE: &str = "category_performance";
pub const AD_TYPE_PERFORMANCE: &str = "ad_type_performance";
pub const EXECUTIVE_SUMMARY: &str = "executive_summary";

/// Every summary table name, in publication order. Dashboards key off these names.
pub const SUMMARY_TABLE_NAMES: [&str; 9] = [
    PLATFORM_PERFORMANCE,
    AGE_GROUP_PERFORMANCE,
    GENDER_PERFORMANCE,
    LOCATION_PERFORMANCE,
    DEVICE_PERFORMANCE,
    DAY_OF_WEEK_PERFORMANCE,
    CATEGORY_PERFORMANCE,
    AD_TYPE_PERFORMANCE,
    EXECUTIVE_SUMMARY,
];

pub const BUDGET_RECOMMENDATION: &str = "budget_recommendation";
pub const BUDGET_ALLOCATION: &str = "suggested_budget_allocation_%";
pub const AVG_ROI: &str = "avg_roi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Count,
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricColumn {
    pub source: &'static str,
    pub aggregation: Aggregation,
    pub alias: &'static str,
}

impl MetricColumn {
    const fn new(source: &'static str, aggregation: Aggregation, alias: &'static str) -> Self {
        Self {
            source,
            aggregation,
            alias,
        }
    }

    pub fn expr(&self) -> Expr {
        match self.aggregation {
            Aggregation::Count => col(self.source)
                .count()
                .cast(DataType::Int64)
                .alias(self.alias),
            Aggregation::Sum => col(self.source).sum().alias(self.alias),
            Aggregation::Mean => col(self.source).mean().alias(self.alias),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Ascending by group key.
    Key,
    /// Monday through Sunday, unrecognized labels last.
    Calendar,
}

#[derive(Debug, Clone)]
pub struct DimensionTable {
    pub name: &'static str,
    pub key: &'static str,
    pub columns: Vec<MetricColumn>,
    pub order: RowOrder,
}

use Aggregation::{Count, Mean, Sum};

static DIMENSION_TABLES: Lazy<Vec<DimensionTable>> = Lazy::new(|| {
    vec![
        DimensionTable {
            name: PLATFORM_PERFORMANCE,
            key: AD_PLATFORM,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "total_campaigns"),
                MetricColumn::new(IMPRESSIONS, Sum, "total_impressions"),
                MetricColumn::new(CLICKS, Sum, "total_clicks"),
                MetricColumn::new(CONVERSION, Sum, "total_conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "total_spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "total_revenue"),
                MetricColumn::new(CTR, Mean, "avg_ctr"),
                MetricColumn::new(CONVERSION_RATE, Mean, "avg_conversion_rate"),
                MetricColumn::new(COST_PER_CLICK, Mean, "avg_cpc"),
                MetricColumn::new(COST_PER_CONVERSION, Mean, "avg_cpa"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
                MetricColumn::new(ROAS, Mean, "avg_roas"),
                MetricColumn::new(PROFIT, Sum, "total_profit"),
                MetricColumn::new(ENGAGEMENT_SCORE, Mean, "avg_engagement"),
                MetricColumn::new(QUALITY_SCORE, Mean, "avg_quality_score"),
            ],
            order: RowOrder::Key,
        },
        DimensionTable {
            name: AGE_GROUP_PERFORMANCE,
            key: AGE_GROUP,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CONVERSION, Sum, "conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "revenue"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
                MetricColumn::new(CONVERSION_RATE, Mean, "avg_conversion_rate"),
            ],
            order: RowOrder::Key,
        },
        DimensionTable {
            name: GENDER_PERFORMANCE,
            key: GENDER,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CONVERSION, Sum, "conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "revenue"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
                MetricColumn::new(ENGAGEMENT_SCORE, Mean, "avg_engagement"),
            ],
            order: RowOrder::Key,
        },
        DimensionTable {
            name: LOCATION_PERFORMANCE,
            key: LOCATION,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CONVERSION, Sum, "conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "revenue"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
            ],
            order: RowOrder::Key,
        },
        DimensionTable {
            name: DEVICE_PERFORMANCE,
            key: DEVICE_TYPE,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CLICKS, Sum, "total_clicks"),
                MetricColumn::new(CONVERSION, Sum, "total_conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "total_spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "total_revenue"),
                MetricColumn::new(CTR, Mean, "avg_ctr"),
                MetricColumn::new(CONVERSION_RATE, Mean, "avg_conversion_rate"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
            ],
            order: RowOrder::Key,
        },
        DimensionTable {
            name: DAY_OF_WEEK_PERFORMANCE,
            key: DAY_OF_WEEK,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CLICKS, Sum, "total_clicks"),
                MetricColumn::new(CONVERSION, Sum, "total_conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "total_spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "total_revenue"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
                MetricColumn::new(ENGAGEMENT_SCORE, Mean, "avg_engagement"),
            ],
            order: RowOrder::Calendar,
        },
        DimensionTable {
            name: CATEGORY_PERFORMANCE,
            key: AD_CATEGORY,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CONVERSION, Sum, "conversions"),
                MetricColumn::new(AMOUNT_SPENT, Sum, "spend"),
                MetricColumn::new(CONVERSION_VALUE, Sum, "revenue"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
                MetricColumn::new(QUALITY_SCORE, Mean, "avg_quality_score"),
            ],
            order: RowOrder::Key,
        },
        DimensionTable {
            name: AD_TYPE_PERFORMANCE,
            key: AD_TYPE,
            columns: vec![
                MetricColumn::new(USER_ID, Count, "campaigns"),
                MetricColumn::new(CLICKS, Sum, "total_clicks"),
                MetricColumn::new(CONVERSION, Sum, "total_conversions"),
                MetricColumn::new(CTR, Mean, "avg_ctr"),
                MetricColumn::new(CONVERSION_RATE, Mean, "avg_conversion_rate"),
                MetricColumn::new(ROI_PERCENTAGE, Mean, AVG_ROI),
            ],
            order: RowOrder::Key,
        },
    ]
});

pub fn dimension_tables() -> &'static [DimensionTable] {
    DIMENSION_TABLES.as_slice()
}

impl DimensionTable {
    /// Output column names in order: the key, then each metric alias.
    pub fn column_names(&self) -> Vec<&'static str> {
        std::iter::once(self.key)
            .chain(self.columns.iter().map(|column| column.alias))
            .collect()
    }
}
