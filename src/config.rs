//! Cleaning thresholds and policy switches.

use crate::error::{CleaningError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How outlier bounds are derived from the fit-time data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// `Q1 - k*IQR`, `Q3 + k*IQR`
    #[default]
    Iqr,
    /// `mean - k*std`, `mean + k*std`
    Zscore,
}

impl OutlierMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iqr => "iqr",
            Self::Zscore => "zscore",
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "iqr" => Ok(Self::Iqr),
            "zscore" => Ok(Self::Zscore),
            other => Err(CleaningError::Config(format!(
                "outlier_method must be 'iqr' or 'zscore', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a value outside the fitted bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierAction {
    /// Add a `<col>_outlier_flag` boolean column
    #[default]
    Flag,
    /// Clamp into `[lower, upper]`
    Cap,
    /// Drop the row
    Remove,
}

impl OutlierAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Cap => "cap",
            Self::Remove => "remove",
        }
    }
}

impl FromStr for OutlierAction {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "flag" => Ok(Self::Flag),
            "cap" => Ok(Self::Cap),
            "remove" => Ok(Self::Remove),
            other => Err(CleaningError::Config(format!(
                "outlier_action must be 'flag', 'cap', or 'remove', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OutlierAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds and switches shared read-only by every stage.
///
/// Construct with [`CleaningConfig::default`] and struct update syntax, or parse with
/// [`CleaningConfig::from_json`]. Either way, call [`CleaningConfig::validate`] (the pipeline
/// does so in [`Pipeline::new`](crate::pipeline::Pipeline::new)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Regulation plus overtime; larger values are clamped
    pub max_minutes_per_game: f64,
    pub max_reasonable_points: i64,
    pub max_reasonable_rebounds: i64,
    pub max_reasonable_assists: i64,

    pub fill_counting_stats_with_zero: bool,
    /// Columns missing more than this percentage are reported
    pub drop_threshold_missing_pct: f64,

    pub outlier_method: OutlierMethod,
    /// IQR multiplier or z-score cutoff
    pub outlier_threshold: f64,
    pub outlier_action: OutlierAction,

    pub standardize_positions: bool,
    pub create_full_names: bool,

    pub strict_validation: bool,
    pub auto_fix_inconsistencies: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            max_minutes_per_game: 60.0,
            max_reasonable_points: 100,
            max_reasonable_rebounds: 30,
            max_reasonable_assists: 25,
            fill_counting_stats_with_zero: true,
            drop_threshold_missing_pct: 95.0,
            outlier_method: OutlierMethod::Iqr,
            outlier_threshold: 3.0,
            outlier_action: OutlierAction::Flag,
            standardize_positions: true,
            create_full_names: true,
            strict_validation: true,
            auto_fix_inconsistencies: true,
        }
    }
}

impl CleaningConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::Config`] for malformed JSON, an unknown outlier method or
    /// action, or a threshold that fails [`CleaningConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks numeric thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !(self.outlier_threshold.is_finite() && self.outlier_threshold > 0.0) {
            return Err(CleaningError::Config(format!(
                "outlier_threshold must be a positive number, got {}",
                self.outlier_threshold
            )));
        }
        if !(self.max_minutes_per_game.is_finite() && self.max_minutes_per_game > 0.0) {
            return Err(CleaningError::Config(format!(
                "max_minutes_per_game must be a positive number, got {}",
                self.max_minutes_per_game
            )));
        }
        if !(0.0..=100.0).contains(&self.drop_threshold_missing_pct) {
            return Err(CleaningError::Config(format!(
                "drop_threshold_missing_pct must be within 0-100, got {}",
                self.drop_threshold_missing_pct
            )));
        }
        Ok(())
    }
}
