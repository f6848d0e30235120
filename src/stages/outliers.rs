//! Outlier stage - bounds are learned once and reused
//!
//! `fit` computes per-column bounds from the fitting frame (IQR fences or mean ± k·std);
//! `transform` only applies them. A frame transformed later is judged against the fitted
//! bounds, never against its own distribution.

use super::{FitState, Stage, owned};
use crate::columns::{OUTLIER_COLUMNS, OUTLIER_FLAG_SUFFIX};
use crate::config::{CleaningConfig, OutlierAction, OutlierMethod};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::table::{count_where, has_column, numeric_values};
use polars::prelude::*;
use serde::Serialize;
use std::sync::Arc;

const NAME: &str = "outlier_detection";

/// Fitted fences for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnBounds {
    pub column: String,
    pub lower: f64,
    pub upper: f64,
}

impl ColumnBounds {
    /// IQR fences `[Q1 - k·IQR, Q3 + k·IQR]`; `None` when the column has no values.
    ///
    /// # Errors
    ///
    /// Propagates polars errors from the quantile computation.
    pub fn iqr(column: &str, values: &[f64], k: f64) -> Result<Option<Self>> {
        if values.is_empty() {
            return Ok(None);
        }
        let ca = Float64Chunked::from_slice(column.into(), values);
        let q1 = ca.quantile(0.25, QuantileMethod::Linear)?;
        let q3 = ca.quantile(0.75, QuantileMethod::Linear)?;

        Ok(q1.zip(q3).map(|(q1, q3)| {
            let iqr = q3 - q1;
            Self {
                column: column.to_owned(),
                lower: q1 - k * iqr,
                upper: q3 + k * iqr,
            }
        }))
    }

    /// Z-score fences `[mean - k·std, mean + k·std]` with sample std; `None` below two values.
    pub fn zscore(column: &str, values: &[f64], k: f64) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let ca = Float64Chunked::from_slice(column.into(), values);
        let mean = ca.mean()?;
        let std = ca.std(1)?;

        Some(Self {
            column: column.to_owned(),
            lower: mean - k * std,
            upper: mean + k * std,
        })
    }

    /// True outside the fences; null cells are never outliers.
    fn is_outlier(&self) -> Expr {
        let c = col(self.column.as_str());
        c.clone()
            .lt(lit(self.lower))
            .or(c.gt(lit(self.upper)))
            .fill_null(lit(false))
    }

    fn capped(&self) -> Expr {
        let c = col(self.column.as_str());
        when(c.clone().lt(lit(self.lower)))
            .then(lit(self.lower))
            .when(c.clone().gt(lit(self.upper)))
            .then(lit(self.upper))
            .otherwise(c)
            .alias(self.column.as_str())
    }
}

/// Fitted bounds in column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutlierBounds(Vec<ColumnBounds>);

impl OutlierBounds {
    pub fn get(&self, column: &str) -> Option<&ColumnBounds> {
        self.0.iter().find(|b| b.column == column)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnBounds> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a OutlierBounds {
    type Item = &'a ColumnBounds;
    type IntoIter = std::slice::Iter<'a, ColumnBounds>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Flags, caps or removes values outside the fitted bounds
pub struct OutlierStage {
    config: Arc<CleaningConfig>,
    state: FitState,
    bounds: OutlierBounds,
}

impl OutlierStage {
    pub fn new(config: Arc<CleaningConfig>) -> Self {
        Self {
            config,
            state: FitState::default(),
            bounds: OutlierBounds::default(),
        }
    }

    /// Bounds learned by the last `fit`
    pub fn bounds(&self) -> &OutlierBounds {
        &self.bounds
    }
}

impl Stage for OutlierStage {
    fn name(&self) -> &str {
        NAME
    }

    fn expected_columns(&self) -> Vec<String> {
        owned(OUTLIER_COLUMNS)
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let k = self.config.outlier_threshold;
        let mut bounds = Vec::new();

        for name in OUTLIER_COLUMNS {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let values: Vec<f64> = numeric_values(column)?.into_iter().flatten().collect();
            let fitted = match self.config.outlier_method {
                OutlierMethod::Iqr => ColumnBounds::iqr(name, &values, k)?,
                OutlierMethod::Zscore => ColumnBounds::zscore(name, &values, k),
            };
            match fitted {
                Some(b) => {
                    tracing::debug!(
                        "Fitted {} bounds for {name}: [{:.3}, {:.3}]",
                        self.config.outlier_method,
                        b.lower,
                        b.upper
                    );
                    bounds.push(b);
                }
                None => tracing::debug!("No outlier bounds for {name}: not enough values"),
            }
        }

        self.bounds = OutlierBounds(bounds);
        self.state.record(df, &self.expected_columns());
        Ok(())
    }

    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.state
            .check(NAME, df, self.config.strict_validation)?;
        diagnostics.debug(NAME, "Detecting and handling outliers...");

        let action = self.config.outlier_action;
        let mut out = df.clone();

        for bounds in &self.bounds {
            if !has_column(&out, &bounds.column) {
                continue;
            }

            let outliers = count_where(&out, bounds.is_outlier())?;
            if outliers > 0 {
                diagnostics.info(
                    NAME,
                    format!(
                        "{}: {outliers} outliers outside [{:.2}, {:.2}] ({action})",
                        bounds.column, bounds.lower, bounds.upper
                    ),
                );
            }

            out = match action {
                OutlierAction::Flag => out
                    .lazy()
                    .with_column(
                        bounds
                            .is_outlier()
                            .alias(format!("{}{OUTLIER_FLAG_SUFFIX}", bounds.column)),
                    )
                    .collect()?,
                OutlierAction::Cap => out.lazy().with_column(bounds.capped()).collect()?,
                OutlierAction::Remove => out.lazy().filter(bounds.is_outlier().not()).collect()?,
            };
        }

        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }

    fn outlier_bounds(&self) -> Option<&OutlierBounds> {
        self.state.is_fitted().then_some(&self.bounds)
    }
}
