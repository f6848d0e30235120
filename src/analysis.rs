//! Before/after analysis helpers that sit next to the pipeline.
//!
//! None of these modify the table. They produce plain serializable structs for whatever
//! reporting layer consumes them.

use crate::columns::{ASSISTS, GAME_DATE, GAME_ID, GAME_SEASON, PLAYER_ID, POINTS, REBOUNDS};
use crate::error::Result;
use crate::stages::quality::first_player_games;
use crate::table::{has_column, has_columns, missing_value_total, null_counts, numeric_values};
use polars::chunked_array::cast::CastOptions;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

/// Statistics compared by default
pub const DEFAULT_TARGETS: &[&str] = &[POINTS, REBOUNDS, ASSISTS];

/// Highest share of missing cells any one column may have in a cleaned table
const MAX_MISSING_PCT: f64 = 10.0;
const MAX_REASONABLE_POINTS: f64 = 150.0;
const MAX_REASONABLE_REBOUNDS_OR_ASSISTS: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub shape: (usize, usize),
    /// Columns with at least one missing value
    pub missing_columns: usize,
    pub total_missing_values: usize,
    pub numeric_columns: usize,
    /// Earliest and latest `game_date`, rendered as text
    pub date_range: Option<(String, String)>,
    /// Distinct seasons, ascending
    pub seasons: Vec<i64>,
}

pub fn assess_data_quality(df: &DataFrame) -> Result<QualityAssessment> {
    let missing = null_counts(df);

    let date_range = match df.column(GAME_DATE) {
        Ok(column) => text_range(column)?,
        Err(_) => None,
    };

    let seasons = match df.column(GAME_SEASON) {
        Ok(column) => numeric_values(column)?
            .into_iter()
            .flatten()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        Err(_) => Vec::new(),
    };

    Ok(QualityAssessment {
        shape: df.shape(),
        missing_columns: missing.iter().filter(|(_, n)| *n > 0).count(),
        total_missing_values: missing.iter().map(|(_, n)| n).sum(),
        numeric_columns: df
            .get_columns()
            .iter()
            .filter(|c| c.dtype().is_primitive_numeric())
            .count(),
        date_range,
        seasons,
    })
}

/// Min and max of the column's text rendering. ISO dates and timestamps sort correctly as text.
fn text_range(column: &Column) -> Result<Option<(String, String)>> {
    let text = column
        .as_materialized_series()
        .cast_with_options(&DataType::String, CastOptions::NonStrict)?;
    let values: Vec<&str> = text.str()?.into_iter().flatten().collect();

    let min = values.iter().min().map(|s| (*s).to_owned());
    let max = values.iter().max().map(|s| (*s).to_owned());
    Ok(min.zip(max))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeChange {
    pub before: (usize, usize),
    pub after: (usize, usize),
    pub rows_removed: i64,
    pub columns_added: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDataChange {
    pub before: usize,
    pub after: usize,
    /// `before - after`; negative if cleaning introduced nulls
    pub improvement: i64,
}

/// Mean, sample std and missing count of one statistic before and after cleaning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStatistics {
    pub column: String,
    pub mean_before: Option<f64>,
    pub mean_after: Option<f64>,
    pub std_before: Option<f64>,
    pub std_after: Option<f64>,
    pub missing_before: usize,
    pub missing_after: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAnalysis {
    pub shape_change: ShapeChange,
    pub missing_data_change: MissingDataChange,
    /// Targets present in both tables, in the order requested
    pub target_statistics: Vec<TargetStatistics>,
}

/// Compares a table before and after cleaning.
///
/// `targets` defaults to [`DEFAULT_TARGETS`]; a target missing from either table is skipped.
///
/// # Errors
///
/// Propagates polars errors from reading target columns.
pub fn analyze_cleaning_impact(
    original: &DataFrame,
    cleaned: &DataFrame,
    targets: Option<&[&str]>,
) -> Result<ImpactAnalysis> {
    let missing_before = missing_value_total(original);
    let missing_after = missing_value_total(cleaned);

    let mut target_statistics = Vec::new();
    for name in targets.unwrap_or(DEFAULT_TARGETS) {
        let (Ok(before), Ok(after)) = (original.column(name), cleaned.column(name)) else {
            continue;
        };
        let (mean_before, std_before) = mean_and_std(&numeric_values(before)?);
        let (mean_after, std_after) = mean_and_std(&numeric_values(after)?);

        target_statistics.push(TargetStatistics {
            column: (*name).to_owned(),
            mean_before,
            mean_after,
            std_before,
            std_after,
            missing_before: before.null_count(),
            missing_after: after.null_count(),
        });
    }

    Ok(ImpactAnalysis {
        shape_change: ShapeChange {
            before: original.shape(),
            after: cleaned.shape(),
            rows_removed: signed(original.height()) - signed(cleaned.height()),
            columns_added: signed(cleaned.width()) - signed(original.width()),
        },
        missing_data_change: MissingDataChange {
            before: missing_before,
            after: missing_after,
            improvement: signed(missing_before) - signed(missing_after),
        },
        target_statistics,
    })
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Mean and sample standard deviation (ddof = 1) of the non-null values
fn mean_and_std(values: &[Option<f64>]) -> (Option<f64>, Option<f64>) {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return (None, None);
    }

    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let std = (present.len() > 1).then(|| {
        let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    });
    (Some(mean), std)
}

/// Pass/fail checks for a cleaned table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedDataCheck {
    pub has_required_columns: bool,
    pub missing_columns: Vec<String>,
    /// Only checked when `game_date` is present
    pub date_column_is_datetime: Option<bool>,
    pub reasonable_data_ranges: bool,
    pub acceptable_missing_data: bool,
    /// Only checked when `player_id` and `game_id` are present
    pub no_duplicates: Option<bool>,
    pub overall_valid: bool,
}

/// Checks a cleaned table against basketball-level expectations.
///
/// - `target_stats` defaults to [`DEFAULT_TARGETS`]
/// - `expected_columns` defaults to `player_id`, `game_id`, `game_date` plus the targets
/// - `pts` must lie in `[0, 150]`, `reb` and `ast` in `[0, 50]`
/// - no column may be 10% or more missing
///
/// # Errors
///
/// Propagates polars errors from reading columns.
pub fn validate_cleaned_data(
    df: &DataFrame,
    expected_columns: Option<&[&str]>,
    target_stats: Option<&[&str]>,
) -> Result<CleanedDataCheck> {
    let targets = target_stats.unwrap_or(DEFAULT_TARGETS);

    let mut expected: Vec<&str> = vec![PLAYER_ID, GAME_ID, GAME_DATE];
    expected.extend_from_slice(targets);
    let expected = expected_columns.map_or(expected, <[&str]>::to_vec);

    let missing_columns: Vec<String> = expected
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| (*name).to_owned())
        .collect();
    if !missing_columns.is_empty() {
        tracing::warn!("Missing required columns: {}", missing_columns.join(", "));
    }

    let date_column_is_datetime = df
        .column(GAME_DATE)
        .ok()
        .map(|c| matches!(c.dtype(), DataType::Datetime(_, _) | DataType::Date));

    let mut reasonable_data_ranges = true;
    for stat in targets {
        let max_allowed = match *stat {
            POINTS => MAX_REASONABLE_POINTS,
            REBOUNDS | ASSISTS => MAX_REASONABLE_REBOUNDS_OR_ASSISTS,
            _ => continue,
        };
        let Ok(column) = df.column(stat) else {
            continue;
        };
        let out_of_range = numeric_values(column)?
            .into_iter()
            .flatten()
            .any(|v| !(0.0..=max_allowed).contains(&v));
        if out_of_range {
            reasonable_data_ranges = false;
        }
    }

    let height = df.height();
    let worst_missing_pct = null_counts(df)
        .into_iter()
        .map(|(_, n)| if height == 0 { 0.0 } else { n as f64 / height as f64 * 100.0 })
        .fold(0.0_f64, f64::max);
    let acceptable_missing_data = worst_missing_pct < MAX_MISSING_PCT;

    let no_duplicates = if has_columns(df, &[PLAYER_ID, GAME_ID]) {
        Some(first_player_games(df)?.height() == df.height())
    } else {
        None
    };

    let has_required_columns = missing_columns.is_empty();
    let overall_valid = has_required_columns
        && date_column_is_datetime.unwrap_or(true)
        && reasonable_data_ranges
        && acceptable_missing_data
        && no_duplicates.unwrap_or(true);

    Ok(CleanedDataCheck {
        has_required_columns,
        missing_columns,
        date_column_is_datetime,
        reasonable_data_ranges,
        acceptable_missing_data,
        no_duplicates,
        overall_valid,
    })
}
