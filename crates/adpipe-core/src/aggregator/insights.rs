use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use super::tables::{
    AGE_GROUP_PERFORMANCE, AVG_ROI, DAY_OF_WEEK_PERFORMANCE, GENDER_PERFORMANCE,
    LOCATION_PERFORMANCE,
};
use super::SummaryTable;
use crate::schema::{AGE_GROUP, DAY_OF_WEEK, GENDER, LOCATION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionLeader {
    pub label: String,
    pub avg_roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLeader {
    pub day: String,
    pub avg_roi: f64,
    pub conversions: i64,
}

/// Highest-ROI group of each audience dimension and the best day to run ads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyInsights {
    pub best_age_group: Option<DimensionLeader>,
    pub best_gender: Option<DimensionLeader>,
    pub best_location: Option<DimensionLeader>,
    pub best_day: Option<DayLeader>,
}

impl KeyInsights {
    pub(super) fn from_tables(tables: &[SummaryTable]) -> PolarsResult<Self> {
        let find = |name: &str| tables.iter().find(|table| table.name == name);

        let leader_of = |name: &str, key: &str| -> PolarsResult<Option<DimensionLeader>> {
            let Some(table) = find(name) else {
                return Ok(None);
            };
            Ok(leader(&table.frame, key)?.map(|(_, leader)| leader))
        };

        let best_day = match find(DAY_OF_WEEK_PERFORMANCE) {
            Some(table) => match leader(&table.frame, DAY_OF_WEEK)? {
                Some((idx, leader)) => Some(DayLeader {
                    day: leader.label,
                    avg_roi: leader.avg_roi,
                    conversions: table
                        .frame
                        .column("total_conversions")?
                        .i64()?
                        .get(idx)
                        .unwrap_or(0),
                }),
                None => None,
            },
            None => None,
        };

        let insights = Self {
            best_age_group: leader_of(AGE_GROUP_PERFORMANCE, AGE_GROUP)?,
            best_gender: leader_of(GENDER_PERFORMANCE, GENDER)?,
            best_location: leader_of(LOCATION_PERFORMANCE, LOCATION)?,
            best_day,
        };

        info!(
            best_age_group = insights.best_age_group.as_ref().map(|l| l.label.as_str()),
            best_gender = insights.best_gender.as_ref().map(|l| l.label.as_str()),
            best_location = insights.best_location.as_ref().map(|l| l.label.as_str()),
            best_day = insights.best_day.as_ref().map(|l| l.day.as_str()),
            "key insights"
        );

        Ok(insights)
    }
}

/// Row index and label of the first row holding the maximum `avg_roi`.
fn leader(frame: &DataFrame, key: &str) -> PolarsResult<Option<(usize, DimensionLeader)>> {
    if frame.height() == 0 {
        return Ok(None);
    }

    let labels = frame.column(key)?.str()?;
    let avg_roi = frame.column(AVG_ROI)?.f64()?;

    Ok(super::first_max(avg_roi).and_then(|(idx, avg_roi)| {
        labels.get(idx).map(|label| {
            (
                idx,
                DimensionLeader {
                    label: label.to_string(),
                    avg_roi,
                },
            )
        })
    }))
}
