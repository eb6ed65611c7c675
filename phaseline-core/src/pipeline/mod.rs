//! Phased interceptor pipeline.
//!
//! This module provides a [`Pipeline`] that executes interceptors grouped by
//! [`Phase`]. The pipeline provides:
//!
//! - Relative phase ordering (append, before, after) resolved at insertion time
//! - Lazily materialized per-phase interceptor lists ([`PhaseContent`])
//! - Onion-style execution through a [`PipelineContext`] cursor with
//!   `proceed`, `proceed_with` and `finish`
//! - Merging of phases and interceptors from another pipeline
//! - [`Plugin`] hooks that weave behavior into a pipeline
//!
//! # Example
//!
//! ```ignore
//! use phaseline_core::pipeline::{Phase, Pipeline};
//!
//! let state = Phase::new("State");
//! let output = Phase::new("Output");
//! let mut pipeline: Pipeline<Record, Logger> = Pipeline::new([state.clone(), output.clone()]);
//!
//! pipeline.intercept(&state, |ctx| {
//!     if !ctx.context().enabled {
//!         ctx.finish();
//!         return Ok(());
//!     }
//!     ctx.proceed()
//! })?;
//!
//! let record = pipeline.execute(&logger, Record::new("hello"))?;
//! ```

mod content;
mod context;
mod merge;
mod phase;
mod plugin;
mod runner;
mod snapshot;

pub use content::{Interceptor, PhaseContent, interceptor};
pub use context::PipelineContext;
pub use phase::{Phase, PhaseRelation};
pub use plugin::{Plugin, Plugins};
pub use runner::Pipeline;
pub use snapshot::{PhaseSnapshot, PipelineSnapshot};
