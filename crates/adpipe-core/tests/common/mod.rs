#![allow(dead_code)]

use adpipe_core::record::{self, RawRecord};
use adpipe_core::{clean_frame, derive_frame, DataFrame, Result};

/// A valid record; tests override the fields they care about.
pub fn campaign(user_id: &str, ad_id: &str) -> RawRecord {
    RawRecord {
        user_id: Some(user_id.to_string()),
        ad_id: Some(ad_id.to_string()),
        ad_platform: Some("Facebook".to_string()),
        ad_type: Some("Video".to_string()),
        ad_category: Some("Fashion".to_string()),
        age: Some(30),
        gender: Some("F".to_string()),
        location: Some("New York".to_string()),
        device_type: Some("Mobile".to_string()),
        day_of_week: Some("Monday".to_string()),
        impressions: Some(1000),
        clicks: Some(50),
        conversion: Some(5),
        engagement_score: Some(0.5),
        amount_spent: Some(10.0),
        conversion_value: Some(250.0),
    }
}

pub fn with_costs(
    record: RawRecord,
    impressions: i64,
    clicks: i64,
    conversion: i64,
    amount_spent: f64,
    conversion_value: f64,
) -> RawRecord {
    RawRecord {
        impressions: Some(impressions),
        clicks: Some(clicks),
        conversion: Some(conversion),
        amount_spent: Some(amount_spent),
        conversion_value: Some(conversion_value),
        ..record
    }
}

pub fn on_platform(record: RawRecord, platform: &str) -> RawRecord {
    RawRecord {
        ad_platform: Some(platform.to_string()),
        ..record
    }
}

pub fn on_day(record: RawRecord, day: &str) -> RawRecord {
    RawRecord {
        day_of_week: Some(day.to_string()),
        ..record
    }
}

pub fn raw_frame(records: &[RawRecord]) -> Result<DataFrame> {
    Ok(record::raw_records_to_frame(records)?)
}

/// Raw rows through cleaning and metric derivation.
pub fn enriched_frame(records: &[RawRecord]) -> Result<DataFrame> {
    let (clean, _) = clean_frame(&raw_frame(records)?)?;
    let (enriched, _) = derive_frame(&clean)?;
    Ok(enriched)
}

/// The three-campaign fixture: two rows on platform A (one with no activity) and one on B.
pub fn three_campaigns() -> Vec<RawRecord> {
    vec![
        on_day(
            on_platform(with_costs(campaign("u1", "a1"), 100, 10, 2, 20.0, 100.0), "A"),
            "Wednesday",
        ),
        on_day(
            on_platform(with_costs(campaign("u2", "a2"), 200, 0, 0, 0.0, 0.0), "A"),
            "Monday",
        ),
        on_day(
            on_platform(with_costs(campaign("u3", "a3"), 50, 5, 1, 10.0, 50.0), "B"),
            "Friday",
        ),
    ]
}
