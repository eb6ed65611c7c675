//! Phased interceptor pipelines.
//!
//! A [`Pipeline`] runs an ordered chain of interceptors over a mutable
//! subject. Interceptors attach to named [`Phase`]s, and phases can be
//! appended or inserted relative to each other, so independent plugins can
//! weave behavior into a shared pipeline without knowing about each other.
//!
//! # Module Organization
//!
//! - [`pipeline`] - Phases, the pipeline itself, the execution cursor, plugins
//! - [`deferred`] - Once-computed values for subjects that build lazily
//! - [`error`] - Configuration errors
//!
//! # Example
//!
//! ```
//! use phaseline_core::{Phase, Pipeline};
//!
//! let validate = Phase::new("Validate");
//! let output = Phase::new("Output");
//! let mut pipeline: Pipeline<String, ()> = Pipeline::new([validate.clone(), output.clone()]);
//!
//! pipeline.intercept(&output, |ctx| {
//!     ctx.subject_mut().push_str(" OUT");
//!     ctx.proceed()
//! })?;
//!
//! let result = pipeline.execute(&(), "log".to_string())?;
//! assert_eq!(result, "log OUT");
//! # Ok::<(), eyre::Report>(())
//! ```

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

pub mod deferred;
pub mod error;
pub mod pipeline;

pub use deferred::Deferred;
pub use error::{PipelineError, Result};
pub use pipeline::{
    Interceptor, Phase, PhaseContent, PhaseRelation, PhaseSnapshot, Pipeline, PipelineContext,
    PipelineSnapshot, Plugin, Plugins, interceptor,
};
