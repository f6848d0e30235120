//! Integration tests for the full cleaning workflow
//!
//! These tests run complete pipelines on the box-score fixture and verify the end-to-end
//! results.

use boxscore_cleaner::config::{CleaningConfig, OutlierAction};
use boxscore_cleaner::diagnostics::Diagnostics;
use boxscore_cleaner::error::CleaningError;
use boxscore_cleaner::pipeline::{
    CleaningLevel, Pipeline, StageSelection, aggressive_pipeline, quick_clean, standard_pipeline,
};
use boxscore_cleaner::stages::{
    FinalQualityStage, MissingValueStage, OutlierStage, Stage, TypeCoercionStage,
};
use boxscore_cleaner::table::records_to_frame;
use polars::prelude::*;
use std::sync::Arc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const COUNTING: &[&str] = &[
    "fgm", "fga", "fg3m", "fg3a", "ftm", "fta", "oreb", "dreb", "reb", "ast", "stl", "blk",
    "turnover", "pf", "pts",
];

fn fixture() -> Result<DataFrame, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string("testdata/box_scores.json")?;
    let records: serde_json::Value = serde_json::from_str(&raw)?;
    Ok(records_to_frame(&records)?)
}

fn floats(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let s = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(s.f64()?.into_iter().collect())
}

fn ints(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .collect())
}

fn strings(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

fn flags(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<bool>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .bool()?
        .into_iter()
        .collect())
}

/// Fails whenever the table carries a `force_failure` column
#[derive(Default)]
struct ExplodingStage {
    fitted: bool,
}

impl Stage for ExplodingStage {
    fn name(&self) -> &str {
        "exploding"
    }

    fn expected_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn fit(&mut self, _df: &DataFrame) -> boxscore_cleaner::Result<()> {
        self.fitted = true;
        Ok(())
    }

    fn transform(
        &self,
        df: &DataFrame,
        _diagnostics: &mut Diagnostics,
    ) -> boxscore_cleaner::Result<DataFrame> {
        if df.column("force_failure").is_ok() {
            return Err(CleaningError::StageFailed {
                stage: "exploding".to_owned(),
                message: "forced failure".to_owned(),
            });
        }
        Ok(df.clone())
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

#[test]
fn test_standard_pipeline_on_fixture() -> TestResult {
    let raw = fixture()?;
    let mut pipeline = standard_pipeline(true)?;

    let run = pipeline.fit_transform(&raw)?;
    let cleaned = &run.cleaned;

    assert_eq!(run.skipped().count(), 0, "no stage should be skipped");
    assert_eq!(cleaned.height(), 5, "duplicate player/game row should be removed");

    // sorted by date then player, unparsable date last
    assert_eq!(
        ints(cleaned, "player_id")?,
        vec![Some(3), Some(4), Some(1), Some(2), Some(5)]
    );

    // the first occurrence of the duplicate survives
    assert_eq!(floats(cleaned, "pts")?.get(2).copied().flatten(), Some(30.0));

    assert!(cleaned.column("min").is_err());
    let minutes = floats(cleaned, "minutes_played")?;
    assert_eq!(minutes.get(3).copied().flatten(), Some(0.0), "DNP plays zero minutes");
    let last = minutes.get(4).copied().flatten().unwrap_or_default();
    assert!((last - 12.1).abs() < 1e-9);

    let positions = strings(cleaned, "player_position_standardized")?;
    assert_eq!(positions.get(2).cloned().flatten().as_deref(), Some("Guard-Forward"));
    assert_eq!(positions.get(3).cloned().flatten().as_deref(), Some("Guard-Forward"));
    assert_eq!(
        strings(cleaned, "player_full_name")?.get(2).cloned().flatten().as_deref(),
        Some("LeBron James")
    );
    assert_eq!(strings(cleaned, "team_abbreviation")?.get(4).cloned().flatten(), None);
    Ok(())
}

#[test]
fn test_cleaned_fixture_is_consistent() -> TestResult {
    let raw = fixture()?;
    let run = standard_pipeline(true)?.fit_transform(&raw)?;
    let cleaned = &run.cleaned;

    for name in COUNTING {
        assert_eq!(
            cleaned.column(name)?.null_count(),
            0,
            "{name} should have no nulls after cleaning"
        );
    }

    for (made, attempted) in [("fgm", "fga"), ("fg3m", "fg3a"), ("ftm", "fta")] {
        for (m, a) in floats(cleaned, made)?.into_iter().zip(floats(cleaned, attempted)?) {
            assert!(m <= a, "{made} {m:?} exceeds {attempted} {a:?}");
        }
    }

    let reb = floats(cleaned, "reb")?;
    let oreb = floats(cleaned, "oreb")?;
    let dreb = floats(cleaned, "dreb")?;
    for ((r, o), d) in reb.iter().zip(&oreb).zip(&dreb) {
        let (r, o, d) = (r.unwrap_or_default(), o.unwrap_or_default(), d.unwrap_or_default());
        assert!((r - (o + d)).abs() <= 0.1, "reb {r} != oreb {o} + dreb {d}");
    }

    for pct in ["fg_pct", "fg3_pct", "ft_pct"] {
        for value in floats(cleaned, pct)?.into_iter().flatten() {
            assert!((0.0..=1.0).contains(&value), "{pct} {value} out of range");
        }
    }

    // player 2 took no shots: percentages are zero, not missing
    assert_eq!(floats(cleaned, "fg_pct")?.get(3).copied().flatten(), Some(0.0));
    Ok(())
}

#[test]
fn test_report_matches_tables() -> TestResult {
    let raw = fixture()?;
    let run = standard_pipeline(true)?.fit_transform(&raw)?;
    let report = &run.report;

    let added = i64::try_from(run.cleaned.width())? - i64::try_from(raw.width())?;
    assert_eq!(report.columns_added, added);
    assert_eq!(report.rows_removed, 1);
    assert_eq!(report.original_shape, raw.shape());
    assert_eq!(report.cleaned_shape, run.cleaned.shape());
    assert_eq!(report.removed_columns, vec!["min"]);
    for name in [
        "minutes_played",
        "pts_outlier_flag",
        "player_full_name",
        "player_position_standardized",
    ] {
        assert!(
            report.new_columns.iter().any(|c| c == name),
            "{name} should be reported as new"
        );
    }
    assert!(report.missing_values_after < report.missing_values_before);
    assert_eq!(report.config_used, *standard_pipeline(true)?.config());
    Ok(())
}

#[test]
fn test_outlier_bounds_fitted_once() -> TestResult {
    let fit_df = df!("pts" => [1.0, 2.0, 3.0, 100.0])?;
    let later = df!("pts" => [1.0, 2.0, 3.0, 4.0, 50.0])?;
    let config = Arc::new(CleaningConfig::default());

    let mut stage = OutlierStage::new(Arc::clone(&config));
    stage.fit(&fit_df)?;
    let fitted = stage.bounds().clone();
    stage.transform(&later, &mut Diagnostics::new())?;
    assert_eq!(stage.bounds(), &fitted, "transform must not refit bounds");

    let stages: Vec<Box<dyn Stage>> = vec![Box::new(OutlierStage::new(Arc::clone(&config)))];
    let mut pipeline = Pipeline::from_stages(Arc::clone(&config), stages)?;

    pipeline.fit(&fit_df)?;
    let run = pipeline.transform(&later)?;
    assert_eq!(flags(&run.cleaned, "pts_outlier_flag")?, vec![Some(false); 5]);

    // refitting on the later table moves the fences and 50 becomes an outlier
    let run = pipeline.fit_transform(&later)?;
    assert_eq!(
        flags(&run.cleaned, "pts_outlier_flag")?.last().copied().flatten(),
        Some(true)
    );
    Ok(())
}

#[test]
fn test_outlier_bounds_fitted_on_cleaned_values() -> TestResult {
    let raw = df!(
        "player_id" => [1_i64, 2, 3, 4, 5, 6],
        "game_id" => [7_i64, 7, 7, 7, 7, 7],
        "pts" => [Some("10"), Some("12"), Some("abc"), None, Some("14"), Some("11")],
    )?;
    let mut pipeline = Pipeline::new(
        CleaningConfig {
            strict_validation: false,
            ..Default::default()
        },
        StageSelection::all(),
    )?;
    assert!(pipeline.outlier_bounds().is_none());

    let run = pipeline.fit_transform(&raw)?;

    // fitted on [10, 12, 0, 0, 14, 11]: Q1 = 2.5, Q3 = 11.75, k = 3
    let bounds = pipeline
        .outlier_bounds()
        .and_then(|b| b.get("pts"))
        .ok_or("pts bounds missing")?;
    assert!((bounds.lower + 25.25).abs() < 1e-9);
    assert!((bounds.upper - 39.5).abs() < 1e-9);

    // bounds from the four parsable raw values would be [5.5, 17.75] and flag the zeros
    assert_eq!(flags(&run.cleaned, "pts_outlier_flag")?, vec![Some(false); 6]);
    Ok(())
}

#[test]
fn test_failing_stage_does_not_halt_pipeline() -> TestResult {
    let raw = fixture()?;
    let config = Arc::new(CleaningConfig {
        strict_validation: false,
        ..Default::default()
    });
    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(TypeCoercionStage::new(Arc::clone(&config))),
        Box::new(ExplodingStage::default()),
        Box::new(MissingValueStage::new(Arc::clone(&config))),
        Box::new(FinalQualityStage::new(Arc::clone(&config))),
    ];
    let mut pipeline = Pipeline::from_stages(config, stages)?;
    pipeline.fit(&raw)?;

    let mut poisoned = raw.clone();
    poisoned.with_column(Series::new("force_failure".into(), vec![true; raw.height()]))?;
    let run = pipeline.transform(&poisoned)?;

    let skipped: Vec<&str> = run.skipped().map(|o| o.stage.as_str()).collect();
    assert_eq!(skipped, vec!["exploding"]);
    assert_eq!(run.stages_applied(), 3);
    assert!(run.diagnostics.mentions("exploding", "forced failure"));

    // stages before and after the failure both took effect
    assert!(run.cleaned.column("minutes_played").is_ok());
    assert_eq!(run.cleaned.column("pts")?.null_count(), 0);
    assert_eq!(run.cleaned.height(), 5);
    Ok(())
}

#[test]
fn test_strict_missing_column_skips_only_dependent_stages() -> TestResult {
    let raw = fixture()?.drop("min")?;
    let mut pipeline = standard_pipeline(true)?;
    pipeline.fit(&raw)?;

    let run = pipeline.transform(&raw.drop("team_abbreviation")?)?;

    let skipped: Vec<&str> = run.skipped().map(|o| o.stage.as_str()).collect();
    assert_eq!(skipped, vec!["type_conversion", "text_cleaning"]);
    assert!(run.diagnostics.mentions("text_cleaning", "team_abbreviation"));
    assert_eq!(run.cleaned.height(), 5);

    // the same table is fine when not strict
    let mut lenient = standard_pipeline(false)?;
    lenient.fit(&raw)?;
    let run = lenient.transform(&raw.drop("team_abbreviation")?)?;
    assert_eq!(run.skipped().count(), 0);
    Ok(())
}

#[test]
fn test_cap_and_flag_are_idempotent() -> TestResult {
    let raw = fixture()?;

    for action in [OutlierAction::Cap, OutlierAction::Flag] {
        let config = CleaningConfig {
            outlier_action: action,
            outlier_threshold: 1.0,
            strict_validation: false,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(config, StageSelection::all())?;
        pipeline.fit(&raw)?;

        let once = pipeline.transform(&raw)?.cleaned;
        let twice = pipeline.transform(&once)?.cleaned;

        assert!(
            once.equals_missing(&twice),
            "{action} should be idempotent:\n{once}\n{twice}"
        );
    }
    Ok(())
}

#[test]
fn test_transform_requires_fit() -> TestResult {
    let raw = fixture()?;
    let mut pipeline = standard_pipeline(true)?;

    assert!(matches!(
        pipeline.transform(&raw),
        Err(CleaningError::Unfitted { .. })
    ));

    pipeline.fit(&raw)?;
    pipeline.push_stage(Box::new(ExplodingStage::default()));
    assert!(
        !pipeline.is_fitted(),
        "adding a stage should require a new fit"
    );
    assert!(matches!(
        pipeline.transform(&raw),
        Err(CleaningError::Unfitted { .. })
    ));
    Ok(())
}

#[test]
fn test_presets_through_quick_clean() -> TestResult {
    let raw = fixture()?;

    let (minimal, _) = quick_clean(&raw, CleaningLevel::Minimal)?;
    assert!(minimal.column("pts_outlier_flag").is_err());
    assert!(minimal.column("player_full_name").is_err());
    assert!(minimal.column("minutes_played").is_ok());

    let (standard, report) = quick_clean(&raw, "basic".parse()?)?;
    assert!(standard.column("pts_outlier_flag").is_ok());
    assert_eq!(report.config_used.outlier_action, OutlierAction::Flag);

    let (aggressive, report) = quick_clean(&raw, CleaningLevel::Aggressive)?;
    assert_eq!(report.config_used.outlier_action, OutlierAction::Remove);
    // the duplicate's 99 points is removed as an outlier before deduplication
    assert_eq!(aggressive.height(), 5);
    assert!(aggressive.column("pts_outlier_flag").is_err());

    let capped = aggressive_pipeline(false)?.fit_transform(&raw)?;
    assert_eq!(capped.report.config_used.outlier_action, OutlierAction::Cap);
    Ok(())
}

#[test]
fn test_records_adapter_rejects_non_tabular_input() {
    let result = records_to_frame(&serde_json::json!({"player_id": 1}));
    assert!(matches!(result, Err(CleaningError::NotTabular(_))));
}
