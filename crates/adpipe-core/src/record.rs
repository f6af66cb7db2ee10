use polars::prelude::*;

use crate::categories::{AgeGroup, PerformanceCategory, RoiCategory, SpendingTier};
use crate::schema::{self, *};

/// A row as read from the raw stage: any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub user_id: Option<String>,
    pub ad_id: Option<String>,
    pub ad_platform: Option<String>,
    pub ad_type: Option<String>,
    pub ad_category: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub device_type: Option<String>,
    pub day_of_week: Option<String>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
    pub conversion: Option<i64>,
    pub engagement_score: Option<f64>,
    pub amount_spent: Option<f64>,
    pub conversion_value: Option<f64>,
}

/// A validated record. Counters are always present; descriptive dimensions may still be
/// missing and are simply left out of the roll-ups that group on them.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRecord {
    pub user_id: String,
    pub ad_id: String,
    pub ad_platform: Option<String>,
    pub ad_type: Option<String>,
    pub ad_category: Option<String>,
    pub age: i64,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub device_type: Option<String>,
    pub day_of_week: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub conversion: i64,
    pub engagement_score: f64,
    pub amount_spent: f64,
    pub conversion_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: CampaignRecord,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub cost_per_click: f64,
    pub cost_per_conversion: f64,
    pub roas: f64,
    pub roi_percentage: f64,
    pub profit: f64,
    pub quality_score: f64,
    pub roi_category: Option<RoiCategory>,
    pub performance_category: Option<PerformanceCategory>,
    pub age_group: Option<AgeGroup>,
    pub spending_tier: Option<SpendingTier>,
}

impl RawRecord {
    /// The typed record, if every identifier and counter is present.
    pub fn complete(&self) -> Option<CampaignRecord> {
        Some(CampaignRecord {
            user_id: self.user_id.clone()?,
            ad_id: self.ad_id.clone()?,
            ad_platform: self.ad_platform.clone(),
            ad_type: self.ad_type.clone(),
            ad_category: self.ad_category.clone(),
            age: self.age?,
            gender: self.gender.clone(),
            location: self.location.clone(),
            device_type: self.device_type.clone(),
            day_of_week: self.day_of_week.clone(),
            impressions: self.impressions?,
            clicks: self.clicks?,
            conversion: self.conversion?,
            engagement_score: self.engagement_score.filter(|score| !score.is_nan())?,
            amount_spent: self.amount_spent.filter(|spent| !spent.is_nan())?,
            conversion_value: self.conversion_value.filter(|value| !value.is_nan())?,
        })
    }
}

impl From<&CampaignRecord> for RawRecord {
    fn from(record: &CampaignRecord) -> Self {
        Self {
            user_id: Some(record.user_id.clone()),
            ad_id: Some(record.ad_id.clone()),
            ad_platform: record.ad_platform.clone(),
            ad_type: record.ad_type.clone(),
            ad_category: record.ad_category.clone(),
            age: Some(record.age),
            gender: record.gender.clone(),
            location: record.location.clone(),
            device_type: record.device_type.clone(),
            day_of_week: record.day_of_week.clone(),
            impressions: Some(record.impressions),
            clicks: Some(record.clicks),
            conversion: Some(record.conversion),
            engagement_score: Some(record.engagement_score),
            amount_spent: Some(record.amount_spent),
            conversion_value: Some(record.conversion_value),
        }
    }
}

/// Reads raw rows after checking that every base column is present.
pub fn raw_records_from_frame(df: &DataFrame) -> Result<Vec<RawRecord>, SchemaError> {
    schema::require_columns(df, "raw", &RAW_COLUMNS)?;
    let df = schema::coerce_known_columns(df)?;

    let user_id = df.column(USER_ID)?.str()?;
    let ad_id = df.column(AD_ID)?.str()?;
    let ad_platform = df.column(AD_PLATFORM)?.str()?;
    let ad_type = df.column(AD_TYPE)?.str()?;
    let ad_category = df.column(AD_CATEGORY)?.str()?;
    let age = df.column(AGE)?.i64()?;
    let gender = df.column(GENDER)?.str()?;
    let location = df.column(LOCATION)?.str()?;
    let device_type = df.column(DEVICE_TYPE)?.str()?;
    let day_of_week = df.column(DAY_OF_WEEK)?.str()?;
    let impressions = df.column(IMPRESSIONS)?.i64()?;
    let clicks = df.column(CLICKS)?.i64()?;
    let conversion = df.column(CONVERSION)?.i64()?;
    let engagement_score = df.column(ENGAGEMENT_SCORE)?.f64()?;
    let amount_spent = df.column(AMOUNT_SPENT)?.f64()?;
    let conversion_value = df.column(CONVERSION_VALUE)?.f64()?;

    let owned = |value: Option<&str>| value.map(str::to_string);

    Ok((0..df.height())
        .map(|idx| RawRecord {
            user_id: owned(user_id.get(idx)),
            ad_id: owned(ad_id.get(idx)),
            ad_platform: owned(ad_platform.get(idx)),
            ad_type: owned(ad_type.get(idx)),
            ad_category: owned(ad_category.get(idx)),
            age: age.get(idx),
            gender: owned(gender.get(idx)),
            location: owned(location.get(idx)),
            device_type: owned(device_type.get(idx)),
            day_of_week: owned(day_of_week.get(idx)),
            impressions: impressions.get(idx),
            clicks: clicks.get(idx),
            conversion: conversion.get(idx),
            engagement_score: engagement_score.get(idx),
            amount_spent: amount_spent.get(idx),
            conversion_value: conversion_value.get(idx),
        })
        .collect())
}

pub fn raw_records_to_frame(records: &[RawRecord]) -> PolarsResult<DataFrame> {
    let text = |f: fn(&RawRecord) -> &Option<String>| -> Vec<Option<String>> {
        records.iter().map(|r| f(r).clone()).collect()
    };

    df!(
        USER_ID => text(|r| &r.user_id),
        AD_ID => text(|r| &r.ad_id),
        AD_PLATFORM => text(|r| &r.ad_platform),
        AD_TYPE => text(|r| &r.ad_type),
        AD_CATEGORY => text(|r| &r.ad_category),
        AGE => records.iter().map(|r| r.age).collect::<Vec<_>>(),
        GENDER => text(|r| &r.gender),
        LOCATION => text(|r| &r.location),
        DEVICE_TYPE => text(|r| &r.device_type),
        DAY_OF_WEEK => text(|r| &r.day_of_week),
        IMPRESSIONS => records.iter().map(|r| r.impressions).collect::<Vec<_>>(),
        CLICKS => records.iter().map(|r| r.clicks).collect::<Vec<_>>(),
        CONVERSION => records.iter().map(|r| r.conversion).collect::<Vec<_>>(),
        ENGAGEMENT_SCORE => records.iter().map(|r| r.engagement_score).collect::<Vec<_>>(),
        AMOUNT_SPENT => records.iter().map(|r| r.amount_spent).collect::<Vec<_>>(),
        CONVERSION_VALUE => records.iter().map(|r| r.conversion_value).collect::<Vec<_>>(),
    )
}

pub fn campaign_records_to_frame(records: &[CampaignRecord]) -> PolarsResult<DataFrame> {
    let raw: Vec<RawRecord> = records.iter().map(RawRecord::from).collect();
    raw_records_to_frame(&raw)
}

pub fn enriched_records_to_frame(records: &[EnrichedRecord]) -> PolarsResult<DataFrame> {
    let base: Vec<RawRecord> = records
        .iter()
        .map(|enriched| RawRecord::from(&enriched.record))
        .collect();
    let mut df = raw_records_to_frame(&base)?;

    let metric = |f: fn(&EnrichedRecord) -> f64| -> Vec<f64> { records.iter().map(f).collect() };
    let label = |f: fn(&EnrichedRecord) -> Option<&'static str>| -> Vec<Option<&'static str>> {
        records.iter().map(f).collect()
    };

    let derived = df!(
        CTR => metric(|r| r.ctr),
        CONVERSION_RATE => metric(|r| r.conversion_rate),
        COST_PER_CLICK => metric(|r| r.cost_per_click),
        COST_PER_CONVERSION => metric(|r| r.cost_per_conversion),
        ROAS => metric(|r| r.roas),
        ROI_PERCENTAGE => metric(|r| r.roi_percentage),
        PROFIT => metric(|r| r.profit),
        QUALITY_SCORE => metric(|r| r.quality_score),
        ROI_CATEGORY => label(|r| r.roi_category.map(RoiCategory::label)),
        PERFORMANCE_CATEGORY => label(|r| r.performance_category.map(PerformanceCategory::label)),
        AGE_GROUP => label(|r| r.age_group.map(AgeGroup::label)),
        SPENDING_TIER => label(|r| r.spending_tier.map(SpendingTier::label)),
    )?;

    df.hstack_mut(derived.get_columns())?;
    Ok(df)
}
