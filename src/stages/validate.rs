//! Validation stage - basketball consistency rules
//!
//! Checks run in a fixed order and each one sees the result of the previous fix:
//!
//! 1. `minutes_played` above `max_minutes_per_game` is capped
//! 2. made above attempted is clamped to attempted
//! 3. `reb` not within 0.1 of `oreb + dreb` is replaced by the sum, on the mismatching rows
//!    only; rows within tolerance keep their own `reb`
//! 4. percentages are clamped into `[0, 1]`
//! 5. `pts`/`reb`/`ast` above the reasonable maxima are counted only
//!
//! With `auto_fix_inconsistencies` off every rule is report-only.

use super::{FitState, Stage, owned};
use crate::columns::{
    ASSISTS, DEFENSIVE_REBOUNDS, MINUTES_PLAYED, OFFENSIVE_REBOUNDS, PERCENTAGE_COLUMNS, POINTS,
    REBOUNDS, SHOT_TRIPLES,
};
use crate::config::CleaningConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::table::{count_where, has_column, has_columns};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

const NAME: &str = "validation";

/// Allowed gap between `reb` and `oreb + dreb`
const REBOUND_TOLERANCE: f64 = 0.1;

/// One failed consistency rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub rule: &'static str,
    pub column: String,
    pub rows: usize,
    pub fixed: bool,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.fixed { "fixed" } else { "found" };
        write!(f, "{} ({}): {} rows {action}", self.rule, self.column, self.rows)
    }
}

/// Applies the consistency rules, fixing what it may
pub struct ValidationStage {
    config: Arc<CleaningConfig>,
    state: FitState,
}

impl ValidationStage {
    pub fn new(config: Arc<CleaningConfig>) -> Self {
        Self {
            config,
            state: FitState::default(),
        }
    }

    /// Runs every rule without modifying anything.
    ///
    /// # Errors
    ///
    /// Propagates polars errors from evaluating a rule.
    pub fn inspect(&self, df: &DataFrame) -> Result<Vec<ValidationIssue>> {
        let (_, issues) = self.apply_rules(df, false)?;
        Ok(issues)
    }

    fn apply_rules(&self, df: &DataFrame, fix: bool) -> Result<(DataFrame, Vec<ValidationIssue>)> {
        let mut rules = Rules {
            df: df.clone(),
            fix,
            issues: Vec::new(),
        };

        if has_column(df, MINUTES_PLAYED) {
            let max = self.config.max_minutes_per_game;
            let over = col(MINUTES_PLAYED).gt(lit(max));
            rules.apply(
                "minutes_over_max",
                MINUTES_PLAYED,
                over.clone(),
                when(over)
                    .then(lit(max))
                    .otherwise(col(MINUTES_PLAYED))
                    .alias(MINUTES_PLAYED),
            )?;
        }

        for (made, attempted, _) in SHOT_TRIPLES {
            if !has_columns(df, &[*made, *attempted]) {
                continue;
            }
            let over = col(*made).gt(col(*attempted));
            rules.apply(
                "made_exceeds_attempted",
                made,
                over.clone(),
                when(over)
                    .then(col(*attempted))
                    .otherwise(col(*made))
                    .alias(*made),
            )?;
        }

        if has_columns(df, &[REBOUNDS, OFFENSIVE_REBOUNDS, DEFENSIVE_REBOUNDS]) {
            let total = col(OFFENSIVE_REBOUNDS) + col(DEFENSIVE_REBOUNDS);
            let diff = col(REBOUNDS) - total.clone();
            let mismatch = diff
                .clone()
                .gt(lit(REBOUND_TOLERANCE))
                .or(diff.lt(lit(-REBOUND_TOLERANCE)));
            rules.apply(
                "rebound_mismatch",
                REBOUNDS,
                mismatch.clone(),
                when(mismatch)
                    .then(total)
                    .otherwise(col(REBOUNDS))
                    .alias(REBOUNDS),
            )?;
        }

        for pct in PERCENTAGE_COLUMNS {
            if !has_column(df, pct) {
                continue;
            }
            let c = col(*pct);
            rules.apply(
                "percentage_out_of_range",
                pct,
                c.clone().lt(lit(0.0)).or(c.clone().gt(lit(1.0))),
                when(c.clone().lt(lit(0.0)))
                    .then(lit(0.0))
                    .when(c.clone().gt(lit(1.0)))
                    .then(lit(1.0))
                    .otherwise(c)
                    .alias(*pct),
            )?;
        }

        let maxima = [
            (POINTS, self.config.max_reasonable_points),
            (REBOUNDS, self.config.max_reasonable_rebounds),
            (ASSISTS, self.config.max_reasonable_assists),
        ];
        for (stat, max) in maxima {
            if has_column(df, stat) {
                rules.report("extreme_value", stat, col(stat).gt(lit(max)))?;
            }
        }

        Ok((rules.df, rules.issues))
    }
}

/// Accumulates the working frame and the issues found so far
struct Rules {
    df: DataFrame,
    fix: bool,
    issues: Vec<ValidationIssue>,
}

impl Rules {
    fn apply(&mut self, rule: &'static str, column: &str, predicate: Expr, fix: Expr) -> Result<()> {
        let rows = count_where(&self.df, predicate)?;
        if rows == 0 {
            return Ok(());
        }

        if self.fix {
            self.df = self.df.clone().lazy().with_column(fix).collect()?;
        }
        self.issues.push(ValidationIssue {
            rule,
            column: column.to_owned(),
            rows,
            fixed: self.fix,
        });
        Ok(())
    }

    fn report(&mut self, rule: &'static str, column: &str, predicate: Expr) -> Result<()> {
        let rows = count_where(&self.df, predicate)?;
        if rows > 0 {
            self.issues.push(ValidationIssue {
                rule,
                column: column.to_owned(),
                rows,
                fixed: false,
            });
        }
        Ok(())
    }
}

impl Stage for ValidationStage {
    fn name(&self) -> &str {
        NAME
    }

    fn expected_columns(&self) -> Vec<String> {
        let mut expected = owned(&[
            MINUTES_PLAYED,
            REBOUNDS,
            OFFENSIVE_REBOUNDS,
            DEFENSIVE_REBOUNDS,
            POINTS,
            ASSISTS,
        ]);
        for (made, attempted, pct) in SHOT_TRIPLES {
            expected.extend(owned(&[*made, *attempted, *pct]));
        }
        expected
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.state.record(df, &self.expected_columns());
        Ok(())
    }

    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.state
            .check(NAME, df, self.config.strict_validation)?;
        diagnostics.debug(NAME, "Validating data consistency...");

        let (out, issues) = self.apply_rules(df, self.config.auto_fix_inconsistencies)?;

        if issues.is_empty() {
            diagnostics.debug(NAME, "No consistency issues found");
        }
        for issue in &issues {
            diagnostics.info(NAME, issue.to_string());
        }

        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}
