//! Record-table helpers shared by the stages.
//!
//! The table type is a polars [`DataFrame`]. This module adds the input adapter for
//! JSON records and a handful of small accessors the stages use to stay defensive about
//! which columns exist and what dtype they arrived with.

use crate::columns::is_null_sentinel;
use crate::error::{CleaningError, Result, ResultExt as _};
use polars::chunked_array::cast::CastOptions;
use polars::prelude::*;
use serde_json::Value;
use std::io::Cursor;

/// Builds a table from a JSON array of objects.
///
/// The records are read with polars' JSON reader over the whole input, so a column that
/// mixes numbers and text comes out as `String`. A key missing from a record, or a JSON
/// `null`, becomes a null cell. Columns that are null in every record are typed `Float64`.
///
/// # Errors
///
/// Returns [`CleaningError::NotTabular`] if `value` is not an array or any element is not
/// an object.
pub fn records_to_frame(value: &Value) -> Result<DataFrame> {
    let rows = value.as_array().ok_or_else(|| {
        CleaningError::NotTabular(format!(
            "expected a JSON array of records, got {}",
            json_kind(value)
        ))
    })?;

    for (idx, row) in rows.iter().enumerate() {
        if !row.is_object() {
            return Err(CleaningError::NotTabular(format!(
                "record {idx} is {}, expected an object",
                json_kind(row)
            )));
        }
    }

    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }

    let bytes = serde_json::to_vec(value)?;
    let df = JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::Json)
        .infer_schema_len(None)
        .finish()
        .context("Failed to read JSON records")?;

    let all_null: Vec<Expr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::Null)
        .map(|c| col(c.name().clone()).cast(DataType::Float64))
        .collect();

    if all_null.is_empty() {
        return Ok(df);
    }
    Ok(df.lazy().with_columns(all_null).collect()?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns().iter().map(|c| c.name().to_string()).collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn has_columns(df: &DataFrame, names: &[&str]) -> bool {
    names.iter().all(|name| has_column(df, name))
}

/// Total null cells across every column
pub fn missing_value_total(df: &DataFrame) -> usize {
    df.get_columns().iter().map(Column::null_count).sum()
}

/// Null count per column, in column order
pub fn null_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.null_count()))
        .collect()
}

/// Parses a trimmed numeric string; null sentinels and non-finite values give `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_null_sentinel(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Values of `column` as floats, whatever its dtype.
///
/// Strings are parsed with [`parse_number`], booleans map to 1/0, everything else goes
/// through a non-strict cast. Unparsable cells become `None`.
pub fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect()),
        DataType::Boolean => Ok(series
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| f64::from(u8::from(b))))
            .collect()),
        _ => {
            let floats = series.cast_with_options(&DataType::Float64, CastOptions::NonStrict)?;
            Ok(floats
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect())
        }
    }
}

/// Number of rows where `predicate` is true (nulls count as false).
pub fn count_where(df: &DataFrame, predicate: Expr) -> Result<usize> {
    let counted = df
        .clone()
        .lazy()
        .select([predicate.cast(DataType::Int64).sum().alias("n")])
        .collect()?;

    let n = counted
        .column("n")?
        .as_materialized_series()
        .i64()?
        .get(0)
        .unwrap_or(0);

    Ok(usize::try_from(n).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_to_frame_infers_dtypes() -> Result<()> {
        let records = json!([
            {"player_id": 1, "pts": 10.5, "min": "30:45", "game_postseason": false},
            {"player_id": 2, "pts": 7, "game_postseason": true},
        ]);

        let df = records_to_frame(&records)?;

        assert_eq!(df.height(), 2);
        assert_eq!(
            column_names(&df),
            vec!["player_id", "pts", "min", "game_postseason"]
        );
        assert_eq!(df.column("player_id")?.dtype(), &DataType::Int64);
        assert_eq!(df.column("pts")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("min")?.dtype(), &DataType::String);
        assert_eq!(df.column("game_postseason")?.dtype(), &DataType::Boolean);
        assert_eq!(df.column("min")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_records_to_frame_mixed_and_null_columns() -> Result<()> {
        let records = json!([
            {"player_id": 1, "min": 30, "team": null},
            {"player_id": 2, "min": "12:30", "team": null},
        ]);

        let df = records_to_frame(&records)?;

        assert_eq!(df.column("min")?.dtype(), &DataType::String);
        assert_eq!(df.column("team")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("team")?.null_count(), 2);
        assert_eq!(records_to_frame(&json!([]))?.height(), 0);
        Ok(())
    }

    #[test]
    fn test_records_to_frame_rejects_non_tabular() {
        assert!(matches!(
            records_to_frame(&json!({"player_id": 1})),
            Err(CleaningError::NotTabular(_))
        ));
        assert!(matches!(
            records_to_frame(&json!([{"player_id": 1}, 42])),
            Err(CleaningError::NotTabular(_))
        ));
    }

    #[test]
    fn test_numeric_values_parses_strings() -> Result<()> {
        let s = Series::new("pts".into(), vec![Some(" 12 "), Some("abc"), None, Some("None")]);
        let values = numeric_values(&Column::from(s))?;
        assert_eq!(values, vec![Some(12.0), None, None, None]);
        Ok(())
    }

    #[test]
    fn test_missing_value_total_and_count_where() -> Result<()> {
        let df = df!(
            "fgm" => [Some(5.0), None, Some(1.0)],
            "fga" => [Some(3.0), Some(2.0), None],
        )?;

        assert_eq!(missing_value_total(&df), 2);
        assert_eq!(count_where(&df, col("fgm").gt(col("fga")))?, 1);
        Ok(())
    }
}
