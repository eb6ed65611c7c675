//! Per-phase interceptor storage.

use std::{fmt, sync::Arc};

use super::{Phase, PhaseRelation, PipelineContext};

/// A unit of behavior registered on a phase.
///
/// The interceptor receives the execution cursor, which exposes the current
/// subject and the caller's context. It continues the chain by calling
/// [`PipelineContext::proceed`] or [`PipelineContext::proceed_with`]; returning
/// without doing so ends the chain.
pub type Interceptor<S, C> =
    Arc<dyn Fn(&mut PipelineContext<'_, S, C>) -> eyre::Result<()> + Send + Sync>;

/// Wrap a closure as a shareable [`Interceptor`].
pub fn interceptor<S, C, F>(f: F) -> Interceptor<S, C>
where
    F: Fn(&mut PipelineContext<'_, S, C>) -> eyre::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The interceptors registered on one phase, plus the relation recorded when
/// the phase was placed.
pub struct PhaseContent<S, C> {
    phase: Phase,
    relation: PhaseRelation,
    interceptors: Vec<Interceptor<S, C>>,
}

impl<S, C> PhaseContent<S, C> {
    /// Create an empty content for `phase`.
    pub fn new(phase: Phase, relation: PhaseRelation) -> Self {
        Self {
            phase,
            relation,
            interceptors: Vec::new(),
        }
    }

    /// The phase this content belongs to.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The relation recorded when the phase was placed.
    pub fn relation(&self) -> &PhaseRelation {
        &self.relation
    }

    /// Registered interceptors, in invocation order.
    pub fn interceptors(&self) -> &[Interceptor<S, C>] {
        &self.interceptors
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Append an interceptor. Duplicates are kept.
    pub fn push(&mut self, interceptor: Interceptor<S, C>) {
        self.interceptors.push(interceptor);
    }

    /// Append every interceptor of `other`, in order.
    pub fn extend_from(&mut self, other: &PhaseContent<S, C>) {
        self.interceptors
            .extend(other.interceptors.iter().map(Arc::clone));
    }
}

impl<S, C> Clone for PhaseContent<S, C> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase.clone(),
            relation: self.relation.clone(),
            interceptors: self.interceptors.clone(),
        }
    }
}

impl<S, C> fmt::Debug for PhaseContent<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseContent")
            .field("phase", &self.phase)
            .field("relation", &self.relation)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// A position in the pipeline's phase sequence.
///
/// A slot starts out bare and is promoted to populated content the first
/// time an interceptor is attached to it. Relative insertion creates
/// populated slots up front so the recorded relation is never lost.
pub(crate) enum PhaseSlot<S, C> {
    Bare(Phase),
    Populated(PhaseContent<S, C>),
}

impl<S, C> PhaseSlot<S, C> {
    pub(crate) fn phase(&self) -> &Phase {
        match self {
            PhaseSlot::Bare(phase) => phase,
            PhaseSlot::Populated(content) => content.phase(),
        }
    }

    /// The recorded relation; bare slots have none, which reads as `Last`.
    pub(crate) fn relation(&self) -> Option<&PhaseRelation> {
        match self {
            PhaseSlot::Bare(_) => None,
            PhaseSlot::Populated(content) => Some(content.relation()),
        }
    }

    pub(crate) fn content(&self) -> Option<&PhaseContent<S, C>> {
        match self {
            PhaseSlot::Bare(_) => None,
            PhaseSlot::Populated(content) => Some(content),
        }
    }

    /// Promote a bare slot to empty content with a `Last` relation.
    pub(crate) fn promote(&mut self) -> &mut PhaseContent<S, C> {
        if let PhaseSlot::Bare(phase) = self {
            let content = PhaseContent::new(phase.clone(), PhaseRelation::Last);
            *self = PhaseSlot::Populated(content);
        }
        match self {
            PhaseSlot::Populated(content) => content,
            PhaseSlot::Bare(_) => unreachable!("bare slot was promoted above"),
        }
    }
}

impl<S, C> Clone for PhaseSlot<S, C> {
    fn clone(&self) -> Self {
        match self {
            PhaseSlot::Bare(phase) => PhaseSlot::Bare(phase.clone()),
            PhaseSlot::Populated(content) => PhaseSlot::Populated(content.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Interceptor<(), ()> {
        interceptor(|ctx: &mut PipelineContext<'_, (), ()>| ctx.proceed())
    }

    #[test]
    fn test_promote_bare_slot() {
        let phase = Phase::new("Render");
        let mut slot: PhaseSlot<(), ()> = PhaseSlot::Bare(phase.clone());
        assert!(slot.content().is_none());
        assert!(slot.relation().is_none());

        slot.promote().push(noop());

        let content = slot.content().expect("slot should be populated");
        assert_eq!(content.phase(), &phase);
        assert_eq!(content.relation(), &PhaseRelation::Last);
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_promote_keeps_existing_content() {
        let anchor = Phase::new("Output");
        let mut content =
            PhaseContent::new(Phase::new("Store"), PhaseRelation::After(anchor.clone()));
        content.push(noop());
        let mut slot = PhaseSlot::Populated(content);

        slot.promote().push(noop());

        assert_eq!(slot.relation(), Some(&PhaseRelation::After(anchor)));
        assert_eq!(slot.content().map(PhaseContent::len), Some(2));
    }

    #[test]
    fn test_extend_from_keeps_duplicates() {
        let phase = Phase::new("Render");
        let shared = noop();
        let mut source = PhaseContent::new(phase.clone(), PhaseRelation::Last);
        source.push(Arc::clone(&shared));
        source.push(shared);

        let mut target = PhaseContent::new(phase, PhaseRelation::Last);
        target.extend_from(&source);
        target.extend_from(&source);

        assert_eq!(target.len(), 4);
        assert!(Arc::ptr_eq(
            &target.interceptors()[0],
            &target.interceptors()[3]
        ));
    }
}
