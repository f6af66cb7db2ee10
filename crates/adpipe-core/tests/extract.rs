use adpipe_core::rules::{BusinessRules, RulesError};
use adpipe_core::schema::SchemaError;
use adpipe_core::{add_cost_data, PipelineError};
use polars::prelude::*;

fn source() -> PolarsResult<DataFrame> {
    df!(
        "ad_platform" => &[
            Some("Facebook"),
            Some("LinkedIn"),
            Some("TikTok"),
            None,
            Some("linkedin"),
            Some("Twitter"),
        ],
        "clicks" => &[Some(10i64), Some(10), Some(10), Some(10), Some(10), None],
        "conversion" => &[2i64, 0, 1, 3, 4, 1],
        "campaign_note" => &["a", "b", "c", "d", "e", "f"]
    )
}

#[test]
fn cost_columns_use_platform_rates() -> adpipe_core::Result<()> {
    let priced = add_cost_data(&source()?, &BusinessRules::default())?;

    let spent: Vec<Option<f64>> = priced.column("amount_spent")?.f64()?.into_iter().collect();
    // unknown and missing platforms fall back to the default rate; the lookup is
    // case-sensitive, and a missing click count leaves the cost empty
    assert_eq!(
        spent,
        vec![Some(17.2), Some(52.6), Some(15.0), Some(15.0), Some(15.0), None]
    );

    let value: Vec<Option<f64>> = priced
        .column("conversion_value")?
        .f64()?
        .into_iter()
        .collect();
    assert_eq!(
        value,
        vec![
            Some(100.0),
            Some(0.0),
            Some(50.0),
            Some(150.0),
            Some(200.0),
            Some(50.0)
        ]
    );

    assert_eq!(priced.column("campaign_note")?.str()?.get(5), Some("f"));
    Ok(())
}

#[test]
fn existing_cost_columns_are_overwritten() -> adpipe_core::Result<()> {
    let mut source = source()?;
    source.with_column(Series::new("amount_spent".into(), vec![99.0; 6]))?;

    let priced = add_cost_data(&source, &BusinessRules::default())?;

    assert_eq!(priced.width(), source.width() + 1);
    assert_eq!(priced.column("amount_spent")?.f64()?.get(0), Some(17.2));
    Ok(())
}

#[test]
fn rules_file_overrides_rates() -> adpipe_core::Result<()> {
    let rules = BusinessRules::from_toml_str(
        r#"
            default_cpc = 2.0
            conversion_value = 10.0

            [cpc_rates]
            TikTok = 0.5
        "#,
    )?;

    let priced = add_cost_data(&source()?, &rules)?;

    let spent = priced.column("amount_spent")?.f64()?;
    // the table replaces the defaults, so Facebook now uses default_cpc
    assert_eq!(spent.get(0), Some(20.0));
    assert_eq!(spent.get(2), Some(5.0));
    assert_eq!(priced.column("conversion_value")?.f64()?.get(3), Some(30.0));
    Ok(())
}

#[test]
fn invalid_rules_are_rejected() {
    assert!(matches!(
        BusinessRules::from_toml_str("default_cpc = -1.0"),
        Err(RulesError::Invalid(_))
    ));
    assert!(matches!(
        BusinessRules::from_toml_str("cpc = 1.0"),
        Err(RulesError::Toml(_))
    ));
}

#[test]
fn source_without_clicks_is_rejected() -> PolarsResult<()> {
    let source = df!(
        "ad_platform" => &["Facebook"],
        "conversion" => &[1i64]
    )?;

    match add_cost_data(&source, &BusinessRules::default()) {
        Err(PipelineError::Schema(SchemaError::MissingColumns { table, missing })) => {
            assert_eq!(table, "source");
            assert_eq!(missing, vec!["clicks".to_string()]);
        }
        other => panic!("expected missing clicks, got {other:?}"),
    }
    Ok(())
}
