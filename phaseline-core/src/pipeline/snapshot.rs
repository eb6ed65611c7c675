//! Serializable view of a pipeline's phase layout.
//!
//! Snapshots are meant for debugging plugin wiring: they show the resolved
//! phase order, how each phase was placed, and how many interceptors it
//! carries.

use std::fmt;

use serde::Serialize;

use super::Pipeline;

/// One phase in a [`PipelineSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSnapshot {
    /// The phase name.
    pub name: String,
    /// The recorded relation, e.g. "last" or "after Output".
    pub relation: String,
    /// Number of interceptors registered on the phase.
    pub interceptors: usize,
}

/// The phase layout of a pipeline at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    /// Phases in execution order.
    pub phases: Vec<PhaseSnapshot>,
    /// Total interceptors across all phases.
    pub interceptors: usize,
}

impl<S, C> Pipeline<S, C> {
    /// Capture the current phase layout.
    pub fn snapshot(&self) -> PipelineSnapshot {
        let phases = self
            .slots
            .iter()
            .map(|slot| PhaseSnapshot {
                name: slot.phase().name().to_string(),
                relation: slot
                    .relation()
                    .map_or_else(|| "last".to_string(), ToString::to_string),
                interceptors: slot.content().map_or(0, |content| content.len()),
            })
            .collect();

        PipelineSnapshot {
            phases,
            interceptors: self.interceptor_count,
        }
    }
}

impl fmt::Display for PipelineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, phase) in self.phases.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{} [{}] x{}",
                phase.name, phase.relation, phase.interceptors
            )?;
        }
        Ok(())
    }
}
