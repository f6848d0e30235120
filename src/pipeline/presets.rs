//! Preset pipelines and the one-call [`quick_clean`] entry point.

use super::executor::{Pipeline, StageSelection};
use super::report::CleaningReport;
use crate::analysis::{analyze_cleaning_impact, assess_data_quality, validate_cleaned_data};
use crate::config::{CleaningConfig, OutlierAction};
use crate::error::{CleaningError, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Cleaning intensity for [`quick_clean`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleaningLevel {
    /// No outlier or text stage, lenient about columns
    Minimal,
    /// Every stage, outliers flagged
    #[default]
    Standard,
    /// Every stage, outliers removed with tighter fences
    Aggressive,
}

impl CleaningLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Aggressive => "aggressive",
        }
    }

    /// Unfitted pipeline for this level
    ///
    /// # Errors
    ///
    /// Propagates [`CleaningError::Config`] from pipeline construction.
    pub fn pipeline(self) -> Result<Pipeline> {
        match self {
            Self::Minimal => minimal_pipeline(),
            Self::Standard => standard_pipeline(true),
            Self::Aggressive => aggressive_pipeline(true),
        }
    }
}

impl fmt::Display for CleaningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleaningLevel {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "standard" | "basic" => Ok(Self::Standard),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(CleaningError::Config(format!(
                "Unknown cleaning level '{other}' (expected minimal, standard or aggressive)"
            ))),
        }
    }
}

/// Every stage with default thresholds; outliers are flagged.
///
/// # Errors
///
/// Propagates [`CleaningError::Config`] from pipeline construction.
pub fn standard_pipeline(strict: bool) -> Result<Pipeline> {
    let config = CleaningConfig {
        strict_validation: strict,
        auto_fix_inconsistencies: true,
        outlier_action: OutlierAction::Flag,
        ..Default::default()
    };
    Pipeline::new(config, StageSelection::all())
}

/// Every stage with tighter fences (`k = 2.5`) and a 90% missing threshold.
///
/// Outliers are removed when `remove_outliers`, otherwise capped.
///
/// # Errors
///
/// Propagates [`CleaningError::Config`] from pipeline construction.
pub fn aggressive_pipeline(remove_outliers: bool) -> Result<Pipeline> {
    let config = CleaningConfig {
        strict_validation: true,
        auto_fix_inconsistencies: true,
        outlier_action: if remove_outliers {
            OutlierAction::Remove
        } else {
            OutlierAction::Cap
        },
        outlier_threshold: 2.5,
        drop_threshold_missing_pct: 90.0,
        ..Default::default()
    };
    Pipeline::new(config, StageSelection::all())
}

/// Type coercion, missing values, validation and final checks; no outlier or text stage.
///
/// # Errors
///
/// Propagates [`CleaningError::Config`] from pipeline construction.
pub fn minimal_pipeline() -> Result<Pipeline> {
    let config = CleaningConfig {
        strict_validation: false,
        outlier_action: OutlierAction::Flag,
        ..Default::default()
    };
    let selection = StageSelection {
        outliers: false,
        text: false,
        ..StageSelection::all()
    };
    Pipeline::new(config, selection)
}

/// Assess, fit, transform and validate in one call.
///
/// Quality, impact and validation findings are logged; the cleaned table and the report
/// are returned.
///
/// # Errors
///
/// Errors from fitting the pipeline. Stage errors during the transform are logged and
/// skipped.
pub fn quick_clean(df: &DataFrame, level: CleaningLevel) -> Result<(DataFrame, CleaningReport)> {
    info!("Quick cleaning with level '{level}'");

    let quality = assess_data_quality(df)?;
    info!(
        "Input: {} rows x {} columns, {} missing values in {} columns",
        quality.shape.0,
        quality.shape.1,
        quality.total_missing_values,
        quality.missing_columns
    );

    let mut pipeline = level.pipeline()?;
    let run = pipeline.fit_transform(df)?;

    for skipped in run.skipped() {
        warn!("Stage '{}' was skipped", skipped.stage);
    }

    let impact = analyze_cleaning_impact(df, &run.cleaned, None)?;
    info!(
        "Impact: {} rows removed, {} columns added, missing values {} → {}",
        impact.shape_change.rows_removed,
        impact.shape_change.columns_added,
        impact.missing_data_change.before,
        impact.missing_data_change.after
    );

    info!("Pipeline ran {} stages in {:.2?}", run.stages_applied(), run.duration);

    let check = validate_cleaned_data(&run.cleaned, None, None)?;
    if check.overall_valid {
        info!("Cleaned data passed validation");
    } else {
        warn!("Cleaned data failed validation: {check:?}");
    }

    Ok((run.cleaned, run.report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() -> Result<()> {
        assert_eq!("basic".parse::<CleaningLevel>()?, CleaningLevel::Standard);
        assert_eq!(" Aggressive ".parse::<CleaningLevel>()?, CleaningLevel::Aggressive);
        assert!(matches!(
            "extreme".parse::<CleaningLevel>(),
            Err(CleaningError::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn test_preset_configs() -> Result<()> {
        let aggressive = aggressive_pipeline(false)?;
        assert_eq!(aggressive.config().outlier_action, OutlierAction::Cap);
        assert!((aggressive.config().outlier_threshold - 2.5).abs() < f64::EPSILON);
        assert!((aggressive.config().drop_threshold_missing_pct - 90.0).abs() < f64::EPSILON);

        let standard = standard_pipeline(false)?;
        assert!(!standard.config().strict_validation);
        assert_eq!(standard.stage_names().len(), 6);

        let minimal = minimal_pipeline()?;
        assert!(!minimal.config().strict_validation);
        assert!(!minimal.stage_names().contains(&"outlier_detection"));
        assert!(!minimal.stage_names().contains(&"text_cleaning"));
        Ok(())
    }
}
