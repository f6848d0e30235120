//! Cleaning stages and the fit/transform contract they share.
//!
//! Stages run in this order inside a [`Pipeline`](crate::pipeline::Pipeline):
//!
//! 1. [`TypeCoercionStage`] - canonical dtypes, clock minutes to decimal
//! 2. [`MissingValueStage`] - percentage recomputation, zero-filled counting stats
//! 3. [`ValidationStage`] - basketball consistency checks with optional auto-fix
//! 4. [`OutlierStage`] - bounds learned at fit time, applied at transform time
//! 5. [`TextNormalizationStage`] - trimmed text, standard positions, full names
//! 6. [`FinalQualityStage`] - dedup on player/game, deterministic sort
//!
//! Every stage owns a [`FitState`]. `transform` before `fit` fails with
//! [`CleaningError::Unfitted`]; with `strict_validation` on, a column the stage used at fit
//! time that has since disappeared fails with [`CleaningError::MissingColumns`].

pub mod coerce;
pub mod missing;
pub mod outliers;
pub mod quality;
pub mod text;
pub mod validate;

pub use coerce::TypeCoercionStage;
pub use missing::MissingValueStage;
pub use outliers::{ColumnBounds, OutlierBounds, OutlierStage};
pub use quality::FinalQualityStage;
pub use text::TextNormalizationStage;
pub use validate::{ValidationIssue, ValidationStage};

use crate::diagnostics::Diagnostics;
use crate::error::{CleaningError, Result};
use crate::table::{column_names, has_column};
use polars::prelude::*;

/// Trait for every cleaning stage
///
/// `transform` is a pure function of its input and the fitted state: it works on a copy and
/// never mutates the caller's frame.
pub trait Stage: Send + Sync {
    /// Identifier used in logs, diagnostics and stage outcomes
    fn name(&self) -> &str;

    /// Columns this stage reads or writes when present
    fn expected_columns(&self) -> Vec<String>;

    /// Learn whatever the stage needs from `df`. Stateless stages only record the schema.
    fn fit(&mut self, df: &DataFrame) -> Result<()>;

    /// Apply the stage using the fitted state
    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame>;

    fn is_fitted(&self) -> bool;

    /// Bounds learned by an outlier stage; `None` for every other stage
    fn outlier_bounds(&self) -> Option<&OutlierBounds> {
        None
    }

    /// `fit` followed by `transform` on the same frame
    fn fit_transform(&mut self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df, diagnostics)
    }
}

/// Input schema recorded by `fit`
#[derive(Debug, Clone, Default)]
pub struct FitState {
    feature_names_in: Option<Vec<String>>,
    required_columns: Vec<String>,
}

impl FitState {
    /// Record the fitted schema. Required columns are the expected ones present in `df`.
    pub fn record(&mut self, df: &DataFrame, expected: &[String]) {
        self.required_columns = expected
            .iter()
            .filter(|name| has_column(df, name))
            .cloned()
            .collect();
        self.feature_names_in = Some(column_names(df));
    }

    pub fn is_fitted(&self) -> bool {
        self.feature_names_in.is_some()
    }

    pub fn n_features_in(&self) -> Option<usize> {
        self.feature_names_in.as_ref().map(Vec::len)
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    /// Preconditions for `transform`.
    ///
    /// # Errors
    ///
    /// [`CleaningError::Unfitted`] before `fit`; [`CleaningError::MissingColumns`] when
    /// `strict` and a required column is absent from `df`.
    pub fn check(&self, stage: &str, df: &DataFrame, strict: bool) -> Result<()> {
        if !self.is_fitted() {
            return Err(CleaningError::Unfitted {
                stage: stage.to_owned(),
            });
        }

        if strict {
            let missing: Vec<String> = self
                .required_columns
                .iter()
                .filter(|name| !has_column(df, name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(CleaningError::MissingColumns {
                    stage: stage.to_owned(),
                    columns: missing,
                });
            }
        }

        Ok(())
    }
}

pub(crate) fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}
