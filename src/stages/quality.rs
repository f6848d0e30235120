//! Final quality stage - dedup on `(player_id, game_id)` and a deterministic sort

use super::{FitState, Stage, owned};
use crate::columns::{GAME_DATE, GAME_ID, PLAYER_ID};
use crate::config::CleaningConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::table::{has_columns, null_counts};
use polars::prelude::*;
use std::sync::Arc;

const NAME: &str = "final_checks";

/// Drops repeated player/game rows, sorts by date then player, reports residual nulls
pub struct FinalQualityStage {
    config: Arc<CleaningConfig>,
    state: FitState,
}

impl FinalQualityStage {
    pub fn new(config: Arc<CleaningConfig>) -> Self {
        Self {
            config,
            state: FitState::default(),
        }
    }
}

impl Stage for FinalQualityStage {
    fn name(&self) -> &str {
        NAME
    }

    fn expected_columns(&self) -> Vec<String> {
        owned(&[PLAYER_ID, GAME_ID, GAME_DATE])
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.state.record(df, &self.expected_columns());
        Ok(())
    }

    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.state
            .check(NAME, df, self.config.strict_validation)?;
        diagnostics.debug(NAME, "Running final quality checks...");

        let mut out = df.clone();

        if has_columns(&out, &[PLAYER_ID, GAME_ID]) {
            let before = out.height();
            out = first_player_games(&out)?;
            let duplicates = before - out.height();
            if duplicates > 0 {
                diagnostics.info(NAME, format!("Removed {duplicates} duplicate player-game rows"));
            }
        }

        if has_columns(&out, &[GAME_DATE, PLAYER_ID]) {
            out = out
                .lazy()
                .sort_by_exprs(
                    [col(GAME_DATE), col(PLAYER_ID)],
                    SortMultipleOptions::default()
                        .with_nulls_last(true)
                        .with_maintain_order(true),
                )
                .collect()?;
        }

        let height = out.height();
        for (name, nulls) in null_counts(&out) {
            if nulls > 0 {
                let pct = nulls as f64 / height as f64 * 100.0;
                diagnostics.info(
                    NAME,
                    format!("{name}: {nulls} missing ({pct:.1}%) after cleaning"),
                );
            }
        }

        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

/// First row of every `(player_id, game_id)` pair, in input order. Null keys are equal.
pub(crate) fn first_player_games(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.unique_stable(
        Some(&[PLAYER_ID.into(), GAME_ID.into()]),
        UniqueKeepStrategy::First,
        None,
    )?)
}
