//! Name lookup for phases built from a layout.

use indexmap::IndexMap;
use phaseline_core::{Phase, PipelineError};

/// Phases created from a layout, keyed by name in declaration order.
///
/// Phases are compared by identity, so the handles in this set are the only
/// way to attach interceptors to a pipeline built from a layout.
#[derive(Debug, Clone, Default)]
pub struct PhaseSet {
    phases: IndexMap<String, Phase>,
}

impl PhaseSet {
    /// Look up a phase by name.
    pub fn get(&self, name: &str) -> Option<&Phase> {
        self.phases.get(name)
    }

    /// Look up a phase by name, failing with a configuration error if it is
    /// not part of the layout.
    pub fn require(&self, name: &str) -> phaseline_core::Result<&Phase> {
        self.get(name)
            .ok_or_else(|| PipelineError::PhaseNotRegistered {
                phase: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.phases.contains_key(name)
    }

    /// Phase names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.phases.keys().map(String::as_str)
    }

    /// Phases in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.phases.values()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub(crate) fn insert(&mut self, phase: Phase) {
        self.phases.insert(phase.name().to_string(), phase);
    }
}
