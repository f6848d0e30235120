//! Type coercion stage
//!
//! Gives every known column its canonical dtype:
//!
//! - identifiers and `game_season` → `Int64` (non-integral values become null)
//! - statistics → `Float64`
//! - `game_date` → `Datetime[ms]`
//! - `game_postseason` → `Boolean`
//! - text columns → trimmed `String`
//! - `min` → `minutes_played` in decimal minutes, `min` dropped
//!
//! Anything that cannot be converted becomes null; nothing here fails the stage.

use super::text::normalized_text;
use super::{FitState, Stage, owned};
use crate::columns::{
    GAME_DATE, GAME_POSTSEASON, GAME_SEASON, ID_COLUMNS, MINUTES_PLAYED, RAW_MINUTES,
    STAT_COLUMNS, TEXT_COLUMNS, is_null_sentinel,
};
use crate::config::CleaningConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::minutes::{MinutesValue, try_convert};
use crate::table::{has_column, numeric_values};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::chunked_array::cast::CastOptions;
use polars::prelude::*;
use std::sync::Arc;

const NAME: &str = "type_conversion";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const TRUE_VALUES: &[&str] = &["true", "t", "1", "yes", "y"];
const FALSE_VALUES: &[&str] = &["false", "f", "0", "no", "n"];

/// Canonical dtypes for every known column
pub struct TypeCoercionStage {
    config: Arc<CleaningConfig>,
    state: FitState,
}

impl TypeCoercionStage {
    pub fn new(config: Arc<CleaningConfig>) -> Self {
        Self {
            config,
            state: FitState::default(),
        }
    }
}

impl Stage for TypeCoercionStage {
    fn name(&self) -> &str {
        NAME
    }

    fn expected_columns(&self) -> Vec<String> {
        let mut expected = owned(ID_COLUMNS);
        expected.extend(owned(STAT_COLUMNS));
        expected.extend(owned(TEXT_COLUMNS));
        expected.extend(owned(&[GAME_DATE, GAME_SEASON, GAME_POSTSEASON, RAW_MINUTES]));
        expected
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.state.record(df, &self.expected_columns());
        Ok(())
    }

    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.state
            .check(NAME, df, self.config.strict_validation)?;
        diagnostics.debug(NAME, "Converting data types...");

        let mut out = df.clone();

        for name in ID_COLUMNS.iter().chain(std::iter::once(&GAME_SEASON)) {
            if let Ok(column) = df.column(name) {
                let (series, lost) = to_integers(column)?;
                report_lost(diagnostics, name, lost, "integer");
                out.with_column(series)?;
            }
        }

        for name in STAT_COLUMNS {
            if let Ok(column) = df.column(name) {
                let (series, lost) = to_floats(column)?;
                report_lost(diagnostics, name, lost, "numeric");
                out.with_column(series)?;
            }
        }

        if let Ok(column) = df.column(GAME_DATE) {
            let (series, lost) = to_datetimes(column)?;
            report_lost(diagnostics, GAME_DATE, lost, "date");
            out.with_column(series)?;
        }

        if let Ok(column) = df.column(GAME_POSTSEASON) {
            let (series, lost) = to_booleans(column)?;
            report_lost(diagnostics, GAME_POSTSEASON, lost, "boolean");
            out.with_column(series)?;
        }

        let text: Vec<Expr> = TEXT_COLUMNS
            .iter()
            .filter(|name| has_column(df, name))
            .map(|name| normalized_text(name))
            .collect();
        if !text.is_empty() {
            out = out.lazy().with_columns(text).collect()?;
        }

        if has_column(df, RAW_MINUTES) {
            let minutes = decimal_minutes(df.column(RAW_MINUTES)?, diagnostics)?;
            out.with_column(minutes)?;
            out = out.drop(RAW_MINUTES)?;
            diagnostics.debug(NAME, format!("Converted '{RAW_MINUTES}' to '{MINUTES_PLAYED}'"));
        }

        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

fn report_lost(diagnostics: &mut Diagnostics, column: &str, lost: usize, target: &str) {
    if lost > 0 {
        diagnostics.warn(
            NAME,
            format!("{column}: {lost} values could not be converted to {target} and were set to null"),
        );
    }
}

/// Number of cells that were non-null before conversion and null after
fn lost_count(column: &Column, converted: &Series) -> usize {
    converted.null_count().saturating_sub(column.null_count())
}

fn to_floats(column: &Column) -> Result<(Series, usize)> {
    let values = numeric_values(column)?;
    let series = Series::new(column.name().clone(), values);
    let lost = lost_count(column, &series);
    Ok((series, lost))
}

fn to_integers(column: &Column) -> Result<(Series, usize)> {
    let values: Vec<Option<i64>> = numeric_values(column)?
        .into_iter()
        .map(|v| v.and_then(integral))
        .collect();
    let series = Series::new(column.name().clone(), values);
    let lost = lost_count(column, &series);
    Ok((series, lost))
}

fn integral(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up, hence the strict upper bound
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then(|| value as i64)
}

fn to_datetimes(column: &Column) -> Result<(Series, usize)> {
    let target = DataType::Datetime(TimeUnit::Milliseconds, None);
    let series = column.as_materialized_series();

    let converted = match series.dtype() {
        DataType::String => {
            let millis: Vec<Option<i64>> = series
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_datetime_millis))
                .collect();
            Series::new(column.name().clone(), millis).cast(&target)?
        }
        _ => series.cast_with_options(&target, CastOptions::NonStrict)?,
    };

    let lost = lost_count(column, &converted);
    Ok((converted, lost))
}

/// Milliseconds since the epoch for the date formats seen in box-score exports
fn parse_datetime_millis(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if is_null_sentinel(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|ndt| ndt.and_utc().timestamp_millis())
}

fn to_booleans(column: &Column) -> Result<(Series, usize)> {
    let series = column.as_materialized_series();

    let converted = match series.dtype() {
        DataType::Boolean => series.clone(),
        DataType::String => {
            let name = column.name().clone();
            DataFrame::new(vec![column.clone()])?
                .lazy()
                .select([parsed_bool(name.as_str())])
                .collect()?
                .column(name.as_str())?
                .as_materialized_series()
                .clone()
        }
        _ => {
            let values: Vec<Option<bool>> = numeric_values(column)?
                .into_iter()
                .map(|v| v.map(|n| n != 0.0))
                .collect();
            Series::new(column.name().clone(), values)
        }
    };

    let lost = lost_count(column, &converted);
    Ok((converted, lost))
}

/// Case-insensitive yes/no text to `Boolean`; anything else is null
fn parsed_bool(name: &str) -> Expr {
    let lower = col(name).str().strip_chars(lit(NULL)).str().to_lowercase();
    when(lower.clone().is_in(lit(Series::new("true".into(), TRUE_VALUES))))
        .then(lit(true))
        .when(lower.is_in(lit(Series::new("false".into(), FALSE_VALUES))))
        .then(lit(false))
        .otherwise(lit(NULL))
        .cast(DataType::Boolean)
        .alias(name)
}

fn decimal_minutes(column: &Column, diagnostics: &mut Diagnostics) -> Result<Series> {
    let series = column.as_materialized_series();
    let raw: Vec<MinutesValue<'_>> = match series.dtype() {
        DataType::String => series.str()?.into_iter().map(MinutesValue::from).collect(),
        _ => numeric_values(column)?
            .into_iter()
            .map(MinutesValue::from)
            .collect(),
    };

    let mut failed: Vec<String> = Vec::new();
    let minutes: Vec<f64> = raw
        .iter()
        .map(|value| {
            try_convert(value).unwrap_or_else(|warning| {
                failed.push(warning.raw);
                0.0
            })
        })
        .collect();

    if !failed.is_empty() {
        let sample: Vec<&str> = failed.iter().take(3).map(String::as_str).collect();
        diagnostics.warn(
            NAME,
            format!(
                "Could not convert {} minutes values (e.g. {}), set to 0",
                failed.len(),
                sample.join(", ")
            ),
        );
    }

    Ok(Series::new(MINUTES_PLAYED.into(), minutes))
}
