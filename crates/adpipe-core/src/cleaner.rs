use std::collections::HashSet;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::record::{self, CampaignRecord, RawRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub duplicate_rows: usize,
    /// Rows missing a value the typed record cannot do without: an identifier, a
    /// counter, the engagement score or a cost column.
    pub incomplete_rows: usize,
    /// Complete rows that break a range invariant.
    pub invalid_rows: usize,
    pub output_rows: usize,
}

impl CleaningReport {
    pub fn dropped_rows(&self) -> usize {
        self.duplicate_rows + self.incomplete_rows + self.invalid_rows
    }
}

enum Verdict {
    Keep(CampaignRecord),
    Incomplete,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub records: Vec<CampaignRecord>,
    pub report: CleaningReport,
}

/// Deduplicates on `(user_id, ad_id)` keeping the first occurrence, drops rows that break
/// a record invariant, then normalizes the text dimensions. Dropping is never an error;
/// an empty result is a valid clean table.
///
/// Rows with a null identifier, counter, engagement score or cost are dropped too and
/// counted apart as `incomplete_rows`. Null text dimensions are kept.
pub fn clean(raw: &[RawRecord]) -> CleanOutput {
    let mut seen: HashSet<(Option<&str>, Option<&str>)> = HashSet::with_capacity(raw.len());
    let mut duplicate_rows = 0;
    let mut incomplete_rows = 0;
    let mut invalid_rows = 0;
    let mut records = Vec::with_capacity(raw.len());

    for row in raw {
        if !seen.insert((row.user_id.as_deref(), row.ad_id.as_deref())) {
            duplicate_rows += 1;
            continue;
        }

        match validate(row) {
            Verdict::Keep(record) => records.push(normalize(record)),
            Verdict::Incomplete => incomplete_rows += 1,
            Verdict::Invalid => invalid_rows += 1,
        }
    }

    let report = CleaningReport {
        input_rows: raw.len(),
        duplicate_rows,
        incomplete_rows,
        invalid_rows,
        output_rows: records.len(),
    };

    info!(
        input_rows = report.input_rows,
        duplicate_rows = report.duplicate_rows,
        incomplete_rows = report.incomplete_rows,
        invalid_rows = report.invalid_rows,
        output_rows = report.output_rows,
        "cleaned campaign records"
    );

    CleanOutput { records, report }
}

/// Frame-level entry point: validates the raw schema, cleans, and returns the clean table.
pub fn clean_frame(raw: &DataFrame) -> Result<(DataFrame, CleaningReport)> {
    let rows = record::raw_records_from_frame(raw)?;
    let output = clean(&rows);
    let df = record::campaign_records_to_frame(&output.records)?;
    Ok((df, output.report))
}

fn validate(row: &RawRecord) -> Verdict {
    let Some(record) = row.complete() else {
        return Verdict::Incomplete;
    };
    let valid = (18..=100).contains(&record.age)
        && record.impressions > 0
        && record.clicks <= record.impressions
        && record.amount_spent >= 0.0;
    if valid {
        Verdict::Keep(record)
    } else {
        Verdict::Invalid
    }
}

fn normalize(mut record: CampaignRecord) -> CampaignRecord {
    record.gender = record.gender.map(|gender| gender.to_uppercase());
    record.location = record.location.as_deref().map(title_case);
    record.ad_platform = record.ad_platform.as_deref().map(title_case);
    record
}

/// Uppercases the first letter of every alphabetic run and lowercases the rest, so
/// `"new YORK"` becomes `"New York"` and `"linkedin"` becomes `"Linkedin"`.
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_alphabetic = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_alphabetic {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            output.push(ch);
            previous_alphabetic = false;
        }
    }
    output
}
