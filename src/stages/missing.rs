//! Missing value stage
//!
//! Shooting percentages are recomputed from made/attempted where possible, counting stats
//! are zero-filled (a missing count means nothing was recorded), and `minutes_played` is
//! zero-filled. Columns whose missing share exceeds `drop_threshold_missing_pct` are
//! reported, never dropped.

use super::{FitState, Stage, owned};
use crate::columns::{COUNTING_STATS, MINUTES_PLAYED, SHOT_TRIPLES};
use crate::config::CleaningConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::table::{has_column, null_counts};
use polars::prelude::*;
use std::sync::Arc;

const NAME: &str = "missing_values";

/// Columns above this missing share get an info line in the diagnostics
const REPORT_MISSING_PCT: f64 = 1.0;

/// Fills and recomputes missing values by column role
pub struct MissingValueStage {
    config: Arc<CleaningConfig>,
    state: FitState,
}

impl MissingValueStage {
    pub fn new(config: Arc<CleaningConfig>) -> Self {
        Self {
            config,
            state: FitState::default(),
        }
    }

    fn report_missing(&self, df: &DataFrame, diagnostics: &mut Diagnostics) {
        let height = df.height();
        if height == 0 {
            return;
        }

        for (name, nulls) in null_counts(df) {
            let pct = nulls as f64 / height as f64 * 100.0;
            if pct > self.config.drop_threshold_missing_pct {
                diagnostics.warn(
                    NAME,
                    format!(
                        "{name}: {pct:.1}% missing exceeds {:.1}% threshold",
                        self.config.drop_threshold_missing_pct
                    ),
                );
            } else if pct > REPORT_MISSING_PCT {
                diagnostics.info(NAME, format!("{name}: {nulls} missing ({pct:.1}%)"));
            }
        }
    }
}

impl Stage for MissingValueStage {
    fn name(&self) -> &str {
        NAME
    }

    fn expected_columns(&self) -> Vec<String> {
        let mut expected = owned(COUNTING_STATS);
        expected.extend(SHOT_TRIPLES.iter().map(|(_, _, pct)| (*pct).to_owned()));
        expected.push(MINUTES_PLAYED.to_owned());
        expected
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.state.record(df, &self.expected_columns());
        Ok(())
    }

    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.state
            .check(NAME, df, self.config.strict_validation)?;
        diagnostics.debug(NAME, "Handling missing values...");
        self.report_missing(df, diagnostics);

        let mut lf = df.clone().lazy();

        for (made, attempted, pct) in SHOT_TRIPLES {
            if !has_column(df, pct) || !has_column(df, attempted) {
                continue;
            }

            // No attempts means a 0% shooting line
            lf = lf.with_column(
                when(col(*attempted).eq(lit(0)).and(col(*pct).is_null()))
                    .then(lit(0.0))
                    .otherwise(col(*pct))
                    .alias(*pct),
            );

            if has_column(df, made) {
                let made_f = col(*made).cast(DataType::Float64);
                let attempted_f = col(*attempted).cast(DataType::Float64);
                lf = lf.with_column(
                    when(col(*pct).is_null().and(col(*attempted).gt(lit(0))))
                        .then(made_f / attempted_f)
                        .otherwise(col(*pct))
                        .alias(*pct),
                );
            }
        }

        let mut fills = Vec::new();
        if self.config.fill_counting_stats_with_zero {
            for name in COUNTING_STATS {
                let Ok(column) = df.column(name) else {
                    continue;
                };
                let nulls = column.null_count();
                if nulls > 0 {
                    diagnostics.debug(NAME, format!("Filled {nulls} missing {name} values with 0"));
                    fills.push(col(*name).fill_null(lit(0)).alias(*name));
                }
            }
        }

        if has_column(df, MINUTES_PLAYED) {
            fills.push(col(MINUTES_PLAYED).fill_null(lit(0.0)).alias(MINUTES_PLAYED));
        }

        if !fills.is_empty() {
            lf = lf.with_columns(fills);
        }

        Ok(lf.collect()?)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
