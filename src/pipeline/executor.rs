//! Pipeline execution engine.
//!
//! `fit` chains fit+transform through every stage so each stage learns from what the
//! previous ones produce; any error aborts the fit. `transform` applies the fitted stages in
//! order and never aborts on a stage error: the stage is skipped, the table it was given is
//! passed on unchanged, and the failure is recorded in the run.

use super::report::CleaningReport;
use crate::config::CleaningConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{CleaningError, Result, ResultExt as _};
use crate::stages::{
    FinalQualityStage, MissingValueStage, OutlierBounds, OutlierStage, Stage,
    TextNormalizationStage, TypeCoercionStage, ValidationStage,
};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which built-in stages a pipeline includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageSelection {
    pub coercion: bool,
    pub missing: bool,
    pub validation: bool,
    pub outliers: bool,
    pub text: bool,
    pub final_checks: bool,
}

impl Default for StageSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl StageSelection {
    pub fn all() -> Self {
        Self {
            coercion: true,
            missing: true,
            validation: true,
            outliers: true,
            text: true,
            final_checks: true,
        }
    }
}

/// How a stage fared in one transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageStatus {
    Applied,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: String,
    #[serde(flatten)]
    pub status: StageStatus,
}

impl StageOutcome {
    pub fn is_applied(&self) -> bool {
        self.status == StageStatus::Applied
    }
}

/// Result of [`Pipeline::transform`]
#[derive(Debug, Clone)]
pub struct CleaningRun {
    pub cleaned: DataFrame,
    pub report: CleaningReport,
    /// One entry per stage, in execution order
    pub outcomes: Vec<StageOutcome>,
    pub diagnostics: Diagnostics,
    pub duration: Duration,
}

impl CleaningRun {
    /// Stages that failed and were skipped
    pub fn skipped(&self) -> impl Iterator<Item = &StageOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    pub fn stages_applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }
}

/// Ordered chain of cleaning stages sharing one configuration
pub struct Pipeline {
    config: Arc<CleaningConfig>,
    stages: Vec<Box<dyn Stage>>,
    fitted: bool,
    fit_diagnostics: Diagnostics,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("fitted", &self.fitted)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds the standard stage chain for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::Config`] if `config` fails validation.
    pub fn new(config: CleaningConfig, selection: StageSelection) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let stages = Self::builtin_stages(&config, selection);
        Ok(Self {
            config,
            stages,
            fitted: false,
            fit_diagnostics: Diagnostics::new(),
        })
    }

    /// Builds a pipeline from an explicit stage list
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::Config`] if `config` fails validation.
    pub fn from_stages(config: Arc<CleaningConfig>, stages: Vec<Box<dyn Stage>>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stages,
            fitted: false,
            fit_diagnostics: Diagnostics::new(),
        })
    }

    /// The standard stages in execution order
    pub fn builtin_stages(
        config: &Arc<CleaningConfig>,
        selection: StageSelection,
    ) -> Vec<Box<dyn Stage>> {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        if selection.coercion {
            stages.push(Box::new(TypeCoercionStage::new(Arc::clone(config))));
        }
        if selection.missing {
            stages.push(Box::new(MissingValueStage::new(Arc::clone(config))));
        }
        if selection.validation {
            stages.push(Box::new(ValidationStage::new(Arc::clone(config))));
        }
        if selection.outliers {
            stages.push(Box::new(OutlierStage::new(Arc::clone(config))));
        }
        if selection.text {
            stages.push(Box::new(TextNormalizationStage::new(Arc::clone(config))));
        }
        if selection.final_checks {
            stages.push(Box::new(FinalQualityStage::new(Arc::clone(config))));
        }
        stages
    }

    /// Appends a stage; the pipeline must be fitted again before it transforms.
    pub fn push_stage(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
        self.fitted = false;
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Bounds fitted by the first outlier stage, once the pipeline is fitted
    pub fn outlier_bounds(&self) -> Option<&OutlierBounds> {
        if !self.fitted {
            return None;
        }
        self.stages.iter().find_map(|s| s.outlier_bounds())
    }

    /// Diagnostics emitted while the last `fit` ran each stage's transform
    pub fn fit_diagnostics(&self) -> &Diagnostics {
        &self.fit_diagnostics
    }

    /// Fits every stage in order, each on the previous stage's output.
    ///
    /// # Errors
    ///
    /// The first error from any stage's `fit` or `transform`, prefixed with the stage name.
    /// The pipeline is left unfitted.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        info!(
            "Fitting cleaning pipeline on {} rows x {} columns",
            df.height(),
            df.width()
        );
        self.fitted = false;

        let mut diagnostics = Diagnostics::new();
        let mut working = df.clone();
        for stage in &mut self.stages {
            let name = stage.name().to_owned();
            debug!("Fitting stage '{name}'");
            working = stage
                .fit_transform(&working, &mut diagnostics)
                .with_context(|| format!("Failed to fit stage '{name}'"))?;
        }

        self.fit_diagnostics = diagnostics;
        self.fitted = true;
        info!("Pipeline fitted ({} stages)", self.stages.len());
        Ok(self)
    }

    /// Applies every fitted stage in order.
    ///
    /// A stage that fails is skipped: its input passes to the next stage unchanged and the
    /// failure shows up in [`CleaningRun::outcomes`] and as a warning diagnostic.
    ///
    /// # Errors
    ///
    /// [`CleaningError::Unfitted`] if [`Pipeline::fit`] has not succeeded.
    pub fn transform(&self, df: &DataFrame) -> Result<CleaningRun> {
        if !self.fitted {
            return Err(CleaningError::Unfitted {
                stage: "pipeline".to_owned(),
            });
        }

        let start = Instant::now();
        info!("Cleaning {} rows x {} columns", df.height(), df.width());

        let mut diagnostics = Diagnostics::new();
        let mut outcomes = Vec::with_capacity(self.stages.len());
        let mut cleaned = df.clone();

        for stage in &self.stages {
            let name = stage.name().to_owned();
            match stage.transform(&cleaned, &mut diagnostics) {
                Ok(next) => {
                    debug!(
                        "Stage '{name}' produced {} rows x {} columns",
                        next.height(),
                        next.width()
                    );
                    cleaned = next;
                    outcomes.push(StageOutcome {
                        stage: name,
                        status: StageStatus::Applied,
                    });
                }
                Err(e) => {
                    warn!("Error applying stage '{name}': {e} (skipped)");
                    diagnostics.warn(&name, format!("{e} (skipped)"));
                    outcomes.push(StageOutcome {
                        stage: name,
                        status: StageStatus::Skipped {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        let report = CleaningReport::new(df, &cleaned, &self.config);
        let duration = start.elapsed();
        info!("{} in {:.2}s", report.summary(), duration.as_secs_f64());

        Ok(CleaningRun {
            cleaned,
            report,
            outcomes,
            diagnostics,
            duration,
        })
    }

    /// [`Pipeline::fit`] then [`Pipeline::transform`] on the same frame.
    ///
    /// # Errors
    ///
    /// Any error from `fit`.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<CleaningRun> {
        self.fit(df)?.transform(df)
    }
}
