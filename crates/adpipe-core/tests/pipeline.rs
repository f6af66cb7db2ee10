mod common;

use std::sync::Arc;

use adpipe_bucket::{BucketStore, LocalBucketStore, MemoryBucketStore};
use adpipe_core::aggregator::{EXECUTIVE_SUMMARY, PLATFORM_PERFORMANCE, SUMMARY_TABLE_NAMES};
use adpipe_core::record::RawRecord;
use adpipe_core::schema::{AMOUNT_SPENT, CONVERSION_VALUE, RAW_COLUMNS, SPENDING_TIER, USER_ID};
use adpipe_core::stages::{self, Stage, StageStore};
use adpipe_core::{
    run_aggregate, run_all, run_clean, run_enrich, run_extract, BusinessRules, DataFrame,
    DegenerateWarning, PipelineError, Result,
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use polars::prelude::DataType;
use common::{campaign, raw_frame, three_campaigns, with_costs};

fn memory_store() -> (Arc<MemoryBucketStore>, StageStore) {
    let memory = Arc::new(MemoryBucketStore::new());
    let store = StageStore::new(memory.clone());
    (memory, store)
}

/// A source export: the raw columns without the cost data the extractor adds.
fn source_frame() -> Result<DataFrame> {
    let raw = raw_frame(&three_campaigns())?;
    Ok(raw.drop(AMOUNT_SPENT)?.drop(CONVERSION_VALUE)?)
}

/// 100 rows with numeric ids and whole-dollar spend, then one with an alphanumeric id
/// and fractional spend.
fn late_fractional_spend_csv() -> Bytes {
    let mut csv = RAW_COLUMNS.join(",");
    csv.push('\n');
    for idx in 0..100 {
        let spend = if idx % 2 == 0 { "10" } else { "0" };
        csv.push_str(&format!(
            "{idx},a1,Facebook,Video,Fashion,30,F,New York,Mobile,Monday,1000,50,5,0.5,{spend},250\n"
        ));
    }
    csv.push_str("u101,a1,Facebook,Video,Fashion,30,F,New York,Mobile,Monday,1000,50,5,0.5,12.5,250\n");
    Bytes::from(csv)
}

fn keys_under(memory: &MemoryBucketStore, prefix: &str) -> Vec<String> {
    memory
        .keys()
        .into_iter()
        .filter(|key| key.starts_with(prefix))
        .collect()
}

#[tokio::test]
async fn full_run_persists_every_stage() -> Result<()> {
    let (memory, store) = memory_store();

    let report = run_all(&store, &BusinessRules::default(), Some(source_frame()?)).await?;

    let extract = report.extract.as_ref().expect("extract report");
    assert!(extract.input.is_none());
    assert_eq!(extract.rows, 3);
    assert_eq!(report.clean.input, extract.output);
    assert_eq!(report.clean.cleaning.output_rows, 3);
    assert_eq!(report.enrich.input, report.clean.output);
    assert_eq!(report.aggregate.input, report.enrich.output);
    assert_eq!(report.aggregate.tables.len(), SUMMARY_TABLE_NAMES.len());

    assert_eq!(keys_under(&memory, "raw/").len(), 1);
    assert_eq!(keys_under(&memory, "clean/").len(), 1);
    assert_eq!(keys_under(&memory, "enriched/").len(), 1);
    assert_eq!(keys_under(&memory, "summary/").len(), SUMMARY_TABLE_NAMES.len());

    for name in SUMMARY_TABLE_NAMES {
        assert_eq!(
            keys_under(&memory, &format!("summary/{name}/")).len(),
            1,
            "one object for {name}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn persisted_summaries_read_back_with_priced_costs() -> Result<()> {
    let (_, store) = memory_store();

    let report = run_all(&store, &BusinessRules::default(), Some(source_frame()?)).await?;
    let platform = report
        .aggregate
        .tables
        .iter()
        .find(|handle| handle.key.starts_with(&format!("summary/{PLATFORM_PERFORMANCE}/")))
        .expect("platform handle");

    let table = store.fetch(&platform.key).await?;

    // clicks priced at the default rate: A has 10 + 0 clicks, B has 5.
    let spend = table.column("total_spend")?.f64()?;
    assert_eq!(spend.get(0), Some(15.0));
    assert_eq!(spend.get(1), Some(7.5));
    let revenue = table.column("total_revenue")?.f64()?;
    assert_eq!(revenue.get(0), Some(100.0));
    assert_eq!(revenue.get(1), Some(50.0));
    Ok(())
}

#[tokio::test]
async fn stages_can_run_one_at_a_time() -> Result<()> {
    let (memory, store) = memory_store();
    let source = stages::encode_csv(&source_frame()?)?;
    memory
        .put_object("source/export.csv", source, "text/csv")
        .await?;

    let extract = run_extract(&store, &BusinessRules::default(), None).await?;
    assert_eq!(
        extract.input.as_ref().map(|handle| handle.key.as_str()),
        Some("source/export.csv")
    );

    let clean = run_clean(&store).await?;
    assert_eq!(clean.input, extract.output);

    let enrich = run_enrich(&store).await?;
    assert_eq!(enrich.input, clean.output);
    // the zero-click row costs nothing and so has no spending tier
    assert_eq!(
        enrich.derivation.warnings,
        vec![DegenerateWarning::Unbucketed {
            column: SPENDING_TIER,
            rows: 1,
        }]
    );

    let aggregate = run_aggregate(&store).await?;
    assert_eq!(aggregate.input, enrich.output);
    assert_eq!(
        aggregate
            .insights
            .best_age_group
            .as_ref()
            .map(|leader| leader.label.as_str()),
        Some("26-35")
    );
    Ok(())
}

#[tokio::test]
async fn fetch_latest_picks_the_newest_csv() -> Result<()> {
    let (memory, store) = memory_store();
    let older = stages::encode_csv(&raw_frame(&[campaign("old", "a1")])?)?;
    let newer = stages::encode_csv(&raw_frame(&[campaign("new", "a1")])?)?;

    memory.insert_at(
        "raw/b.csv",
        newer,
        Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
    );
    memory.insert_at(
        "raw/c.csv",
        older,
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    );
    memory.insert_at(
        "raw/manifest.json",
        Bytes::from_static(b"{}"),
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    );

    let (handle, df) = store.fetch_latest(Stage::Raw).await?;

    assert_eq!(handle.key, "raw/b.csv");
    assert_eq!(df.column("user_id")?.str()?.get(0), Some("new"));
    Ok(())
}

#[tokio::test]
async fn missing_stage_input_is_reported() {
    let (_, store) = memory_store();

    match run_clean(&store).await {
        Err(PipelineError::NoDataset { stage }) => assert_eq!(stage, Stage::Raw),
        other => panic!("expected no dataset, got {other:?}"),
    }
    match run_aggregate(&store).await {
        Err(PipelineError::NoDataset { stage }) => assert_eq!(stage, Stage::Enriched),
        other => panic!("expected no dataset, got {other:?}"),
    }
}

#[tokio::test]
async fn aggregation_failure_leaves_summary_untouched() -> Result<()> {
    let (memory, store) = memory_store();
    let not_enriched = stages::encode_csv(&raw_frame(&[campaign("u1", "a1")])?)?;
    memory
        .put_object("enriched/partial.csv", not_enriched, "text/csv")
        .await?;

    let result = run_aggregate(&store).await;

    assert!(matches!(result, Err(PipelineError::Schema(_))));
    assert!(keys_under(&memory, "summary/").is_empty());
    Ok(())
}

#[tokio::test]
async fn dirty_rows_are_counted_not_fatal() -> Result<()> {
    let (_, store) = memory_store();
    let mut rows = three_campaigns();
    rows.push(rows[0].clone());
    rows.push(with_costs(campaign("u9", "a9"), 10, 50, 0, 1.0, 0.0));

    store
        .persist(Stage::Raw, "raw_campaigns", &raw_frame(&rows)?)
        .await?;
    let report = run_all(&store, &BusinessRules::default(), None).await?;

    assert!(report.extract.is_none());
    assert_eq!(report.clean.cleaning.input_rows, 5);
    assert_eq!(report.clean.cleaning.duplicate_rows, 1);
    assert_eq!(report.clean.cleaning.invalid_rows, 1);
    assert_eq!(report.clean.cleaning.output_rows, 3);
    Ok(())
}

#[tokio::test]
async fn local_directory_store_runs_end_to_end() -> Result<()> {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = StageStore::new(Arc::new(LocalBucketStore::new(dir.path())));

    let report = run_all(&store, &BusinessRules::default(), Some(source_frame()?)).await?;

    assert!(dir.path().join(&report.clean.output.key).is_file());
    assert!(dir.path().join(&report.enrich.output.key).is_file());
    for handle in &report.aggregate.tables {
        assert!(dir.path().join(&handle.key).is_file(), "{}", handle.key);
    }
    Ok(())
}

#[test]
fn late_rows_do_not_break_column_types() -> Result<()> {
    let df = stages::decode_csv(&late_fractional_spend_csv())?;

    assert_eq!(df.height(), 101);
    let ids = df.column(USER_ID)?;
    assert_eq!(ids.dtype(), &DataType::String);
    assert_eq!(ids.str()?.get(0), Some("0"));
    assert_eq!(ids.str()?.get(100), Some("u101"));

    let spend = df.column(AMOUNT_SPENT)?.f64()?;
    assert_eq!(spend.get(0), Some(10.0));
    assert_eq!(spend.get(100), Some(12.5));
    Ok(())
}

#[tokio::test]
async fn stored_raw_csv_with_late_fractional_spend_runs() -> Result<()> {
    let (memory, store) = memory_store();
    memory
        .put_object("raw/export.csv", late_fractional_spend_csv(), "text/csv")
        .await?;

    let report = run_all(&store, &BusinessRules::default(), None).await?;

    assert_eq!(report.clean.cleaning.input_rows, 101);
    assert_eq!(report.clean.cleaning.output_rows, 101);
    assert_eq!(report.aggregate.tables.len(), SUMMARY_TABLE_NAMES.len());
    Ok(())
}

#[tokio::test]
async fn fully_filtered_raw_table_still_produces_summaries() -> Result<()> {
    let (memory, store) = memory_store();
    let rows: Vec<RawRecord> = three_campaigns()
        .into_iter()
        .map(|row| RawRecord {
            age: Some(17),
            ..row
        })
        .collect();
    store
        .persist(Stage::Raw, "raw_campaigns", &raw_frame(&rows)?)
        .await?;

    let report = run_all(&store, &BusinessRules::default(), None).await?;

    assert_eq!(report.clean.cleaning.invalid_rows, 3);
    assert_eq!(report.clean.cleaning.output_rows, 0);
    assert_eq!(report.enrich.derivation.rows, 0);
    assert_eq!(keys_under(&memory, "summary/").len(), SUMMARY_TABLE_NAMES.len());
    assert!(report
        .aggregate
        .warnings
        .contains(&DegenerateWarning::NoPlatforms));

    let executive = report
        .aggregate
        .tables
        .iter()
        .find(|handle| handle.key.starts_with(&format!("summary/{EXECUTIVE_SUMMARY}/")))
        .expect("executive handle");
    let table = store.fetch(&executive.key).await?;
    let metrics = table.column("metric")?.str()?;
    let values = table.column("value")?.str()?;
    let value = |metric: &str| {
        (0..table.height())
            .find(|idx| metrics.get(*idx) == Some(metric))
            .and_then(|idx| values.get(idx))
    };

    assert_eq!(value("Total Campaigns"), Some("0"));
    assert_eq!(value("Total Ad Spend"), Some("$0.00"));
    assert_eq!(value("Overall ROI %"), Some("N/A"));
    assert_eq!(value("Best Performing Platform"), Some("N/A"));
    Ok(())
}
