//! Before/after report for a cleaning run

use crate::config::CleaningConfig;
use crate::table::{column_names, missing_value_total};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;

/// What a transform did to the table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    /// `(rows, columns)` of the input
    pub original_shape: (usize, usize),

    /// `(rows, columns)` of the output
    pub cleaned_shape: (usize, usize),

    /// Input rows minus output rows
    pub rows_removed: i64,

    /// Output columns minus input columns; negative when columns were dropped
    pub columns_added: i64,

    pub missing_values_before: usize,
    pub missing_values_after: usize,

    /// Output columns not present in the input, in output order
    pub new_columns: Vec<String>,

    /// Input columns not present in the output, in input order
    pub removed_columns: Vec<String>,

    pub cleaning_timestamp: DateTime<Utc>,

    /// Copy of the configuration the pipeline ran with
    pub config_used: CleaningConfig,
}

impl CleaningReport {
    pub fn new(original: &DataFrame, cleaned: &DataFrame, config: &CleaningConfig) -> Self {
        let before = column_names(original);
        let after = column_names(cleaned);

        let new_columns = after
            .iter()
            .filter(|name| !before.contains(name))
            .cloned()
            .collect();
        let removed_columns = before
            .iter()
            .filter(|name| !after.contains(name))
            .cloned()
            .collect();

        Self {
            original_shape: original.shape(),
            cleaned_shape: cleaned.shape(),
            rows_removed: signed(original.height()) - signed(cleaned.height()),
            columns_added: signed(cleaned.width()) - signed(original.width()),
            missing_values_before: missing_value_total(original),
            missing_values_after: missing_value_total(cleaned),
            new_columns,
            removed_columns,
            cleaning_timestamp: Utc::now(),
            config_used: config.clone(),
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "Cleaning completed: rows {} → {} ({} removed), columns {} → {} ({:+}), missing values {} → {}",
            self.original_shape.0,
            self.cleaned_shape.0,
            self.rows_removed,
            self.original_shape.1,
            self.cleaned_shape.1,
            self.columns_added,
            self.missing_values_before,
            self.missing_values_after,
        )
    }
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_report_counts_columns_by_name() -> PolarsResult<()> {
        let original = df!(
            "player_id" => [1, 2, 3],
            "min" => [Some("30:00"), None, Some("12:30")],
        )?;
        let cleaned = df!(
            "player_id" => [1, 2],
            "minutes_played" => [30.0, 0.0],
            "pts_outlier_flag" => [false, false],
        )?;

        let report = CleaningReport::new(&original, &cleaned, &CleaningConfig::default());

        assert_eq!(report.original_shape, (3, 2));
        assert_eq!(report.cleaned_shape, (2, 3));
        assert_eq!(report.rows_removed, 1);
        assert_eq!(report.columns_added, 1);
        assert_eq!(report.missing_values_before, 1);
        assert_eq!(report.missing_values_after, 0);
        assert_eq!(report.new_columns, vec!["minutes_played", "pts_outlier_flag"]);
        assert_eq!(report.removed_columns, vec!["min"]);
        assert!(report.summary().contains("rows 3 → 2 (1 removed)"));
        Ok(())
    }

    #[test]
    fn test_report_serializes() -> PolarsResult<()> {
        let df = df!("pts" => [1.0])?;
        let report = CleaningReport::new(&df, &df, &CleaningConfig::default());

        let json = serde_json::to_value(&report).expect("report serializes");

        assert_eq!(json["columns_added"], 0);
        assert_eq!(json["config_used"]["outlier_method"], "iqr");
        assert!(json["cleaning_timestamp"].is_string());
        Ok(())
    }
}
