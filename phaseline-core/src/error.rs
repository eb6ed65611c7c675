//! Configuration errors raised while wiring a pipeline.

use miette::Diagnostic;
use thiserror::Error;

use crate::Phase;

/// Result type for pipeline configuration operations.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// An error in how phases and interceptors were wired together.
///
/// These indicate a bug in plugin setup, not bad runtime data, and are never
/// retried.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("phase '{phase}' is not registered for this pipeline")]
    #[diagnostic(
        code(phaseline::phase_not_registered),
        help("add '{phase}' with `add_phase` or insert it relative to a registered phase first")
    )]
    PhaseNotRegistered { phase: String },

    #[error(
        "cannot place {} merged phase(s) relative to their anchors: {}",
        .phases.len(),
        .phases.join(", ")
    )]
    #[diagnostic(
        code(phaseline::relation_cycle),
        help("the source pipeline declares phases relative to each other in a cycle")
    )]
    RelationCycle { phases: Vec<String> },
}

impl PipelineError {
    /// Create a "phase not registered" error for the given phase.
    pub fn not_registered(phase: &Phase) -> Self {
        PipelineError::PhaseNotRegistered {
            phase: phase.name().to_string(),
        }
    }
}
