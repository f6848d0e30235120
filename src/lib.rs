//! # Boxscore Cleaner - Fit/Transform Cleaning for Player Box Scores
//!
//! Boxscore Cleaner takes raw per-player, per-game basketball statistics and turns them
//! into a consistent table: canonical dtypes, domain-aware missing values, consistency
//! fixes, outlier handling, normalized text, and one row per player per game.
//!
//! ## Quick Start
//!
//! ```
//! use boxscore_cleaner::pipeline::{CleaningLevel, quick_clean};
//! use polars::prelude::*;
//!
//! let raw = df!(
//!     "player_id" => [23_i64, 23, 30],
//!     "game_id" => [1_i64, 1, 1],
//!     "fgm" => [12.0, 12.0, 9.0],
//!     "fga" => [10.0, 10.0, 20.0],
//!     "min" => ["38:12", "38:12", "DNP"],
//! )?;
//!
//! let (cleaned, report) = quick_clean(&raw, CleaningLevel::Standard)?;
//!
//! assert_eq!(cleaned.height(), 2); // duplicate player/game row removed
//! assert_eq!(report.rows_removed, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: the [`Pipeline`](pipeline::Pipeline), presets and the cleaning report
//! - [`stages`]: the six cleaning stages and the [`Stage`](stages::Stage) contract
//! - [`config`]: thresholds and policy switches
//! - [`analysis`]: quality assessment, before/after impact, cleaned-table validation
//! - [`minutes`]: clock-string minutes to decimal
//! - [`table`]: JSON records adapter and column helpers
//! - [`error`]: error types and handling utilities
//! - [`diagnostics`] and [`logging`]: advisory messages and the tracing setup
//!
//! ## Key Concepts
//!
//! ### Fit, Then Transform
//!
//! `fit` learns from a reference table, `transform` applies what was learned. The outlier
//! bounds are the one piece of learned state: a table transformed later is judged against
//! the fit-time distribution.
//!
//! ### Partial Failure
//!
//! Inside [`Pipeline::transform`](pipeline::Pipeline::transform) a failing stage is skipped
//! and recorded, and the remaining stages still run on the last good table.
//!
//! ### Lazy Evaluation
//!
//! Column rules are written as Polars expressions and executed through `LazyFrame`:
//!
//! ```
//! use polars::prelude::*;
//!
//! let df = df!("fgm" => [5.0, 9.0], "fga" => [10.0, 8.0])?;
//! let fixed = df
//!     .lazy()
//!     .with_column(
//!         when(col("fgm").gt(col("fga")))
//!             .then(col("fga"))
//!             .otherwise(col("fgm"))
//!             .alias("fgm"),
//!     )
//!     .collect()?;
//! # assert_eq!(fixed.height(), 2);
//! # Ok::<(), PolarsError>(())
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod analysis;
pub mod columns;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod minutes;
pub mod pipeline;
pub mod stages;
pub mod table;

pub use config::{CleaningConfig, OutlierAction, OutlierMethod};
pub use error::{CleaningError, Result};
pub use pipeline::{CleaningLevel, CleaningReport, CleaningRun, Pipeline, StageSelection};
