//! Phase markers and their relative placement.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A named ordering anchor in a pipeline.
///
/// Phases are compared by identity, not by name: two phases created with
/// the same name are distinct. Cloning a phase yields a handle to the same
/// identity.
#[derive(Clone)]
pub struct Phase {
    name: Arc<str>,
}

impl Phase {
    /// Create a new phase with a fresh identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
        }
    }

    /// The display name of this phase (diagnostics only).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Phase {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for Phase {}

impl Hash for Phase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.name).cast::<u8>(), state);
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Phase").field(&self.name()).finish()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a phase was placed when it entered a pipeline.
///
/// The relation is resolved once, at insertion time. It is kept afterwards
/// so that merging into another pipeline can replay the same placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhaseRelation {
    /// Appended at the end with no constraint.
    Last,
    /// Inserted immediately before the given phase.
    Before(Phase),
    /// Inserted after the given phase and after any earlier `After` siblings.
    After(Phase),
}

impl PhaseRelation {
    /// The phase this relation is anchored to, if any.
    pub fn anchor(&self) -> Option<&Phase> {
        match self {
            PhaseRelation::Last => None,
            PhaseRelation::Before(phase) | PhaseRelation::After(phase) => Some(phase),
        }
    }

    /// Returns true if this is an `After` relation anchored to `reference`.
    pub fn is_after(&self, reference: &Phase) -> bool {
        matches!(self, PhaseRelation::After(anchor) if anchor == reference)
    }
}

impl fmt::Display for PhaseRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseRelation::Last => write!(f, "last"),
            PhaseRelation::Before(phase) => write!(f, "before {}", phase),
            PhaseRelation::After(phase) => write!(f, "after {}", phase),
        }
    }
}
