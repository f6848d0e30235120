//! Fit/transform cleaning pipeline for player box scores.
//!
//! A [`Pipeline`] owns an ordered list of [`Stage`](crate::stages::Stage)s and one shared
//! [`CleaningConfig`](crate::config::CleaningConfig). Fit it on a reference table, then
//! transform any number of tables with the state it learned.
//!
//! # Example
//!
//! ```
//! use boxscore_cleaner::pipeline::{Pipeline, StageSelection};
//! use boxscore_cleaner::config::CleaningConfig;
//! use polars::prelude::*;
//!
//! let df = df!(
//!     "player_id" => [1_i64, 2],
//!     "game_id" => [100_i64, 100],
//!     "pts" => [21.0, 9.0],
//!     "min" => ["34:30", "18:00"],
//! )?;
//!
//! let mut pipeline = Pipeline::new(CleaningConfig::default(), StageSelection::all())?;
//! let run = pipeline.fit(&df)?.transform(&df)?;
//!
//! assert!(run.cleaned.column("minutes_played").is_ok());
//! println!("{}", run.report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Presets
//!
//! - **minimal**: types, missing values, validation and final checks, non-strict
//! - **standard** (alias `basic`): every stage, outliers flagged
//! - **aggressive**: every stage, tighter fences, outliers removed (or capped)

pub mod executor;
pub mod presets;
pub mod report;

pub use executor::{CleaningRun, Pipeline, StageOutcome, StageSelection, StageStatus};
pub use presets::{
    CleaningLevel, aggressive_pipeline, minimal_pipeline, quick_clean, standard_pipeline,
};
pub use report::CleaningReport;
