//! Text stage - trimmed names, standard positions, derived full names

use super::{FitState, Stage, owned};
use crate::columns::{
    FIRST_NAME, FULL_NAME, LAST_NAME, NULL_SENTINELS, POSITION, POSITION_MAPPING,
    POSITION_STANDARDIZED, TEXT_COLUMNS,
};
use crate::config::CleaningConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::table::{has_column, has_columns};
use polars::prelude::*;
use std::sync::Arc;

const NAME: &str = "text_cleaning";

/// Trims text columns, maps position codes, and builds `player_full_name`
pub struct TextNormalizationStage {
    config: Arc<CleaningConfig>,
    state: FitState,
}

impl TextNormalizationStage {
    pub fn new(config: Arc<CleaningConfig>) -> Self {
        Self {
            config,
            state: FitState::default(),
        }
    }
}

impl Stage for TextNormalizationStage {
    fn name(&self) -> &str {
        NAME
    }

    fn expected_columns(&self) -> Vec<String> {
        owned(TEXT_COLUMNS)
    }

    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.state.record(df, &self.expected_columns());
        Ok(())
    }

    fn transform(&self, df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
        self.state
            .check(NAME, df, self.config.strict_validation)?;
        diagnostics.debug(NAME, "Cleaning text data...");

        let trimmed: Vec<Expr> = TEXT_COLUMNS
            .iter()
            .filter(|name| has_column(df, name))
            .map(|name| normalized_text(name))
            .collect();

        let mut derived = Vec::new();
        if self.config.standardize_positions && has_column(df, POSITION) {
            derived.push(standardized_position());
        }
        if self.config.create_full_names && has_columns(df, &[FIRST_NAME, LAST_NAME]) {
            derived.push(full_name());
        }

        let mut lf = df.clone().lazy().with_columns(trimmed);
        if !derived.is_empty() {
            lf = lf.with_columns(derived);
        }
        Ok(lf.collect()?)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

/// Trimmed string values with null sentinels mapped to null
pub(crate) fn normalized_text(name: &str) -> Expr {
    let trimmed = col(name).cast(DataType::String).str().strip_chars(lit(NULL));
    let sentinels = Series::new("sentinels".into(), NULL_SENTINELS);
    when(trimmed.clone().is_in(lit(sentinels)))
        .then(lit(NULL))
        .otherwise(trimmed)
        .alias(name)
}

/// Canonical position names; unmapped codes pass through
fn standardized_position() -> Expr {
    let (codes, names): (Vec<&str>, Vec<&str>) = POSITION_MAPPING.iter().copied().unzip();
    col(POSITION)
        .cast(DataType::String)
        .replace(
            lit(Series::new("codes".into(), codes)),
            lit(Series::new("names".into(), names)),
        )
        .alias(POSITION_STANDARDIZED)
}

/// `"first last"`, null unless both parts are present
fn full_name() -> Expr {
    concat_str([col(FIRST_NAME), col(LAST_NAME)], " ", false).alias(FULL_NAME)
}
