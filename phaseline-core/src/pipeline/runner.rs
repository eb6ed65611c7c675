//! Pipeline orchestrator.

use std::fmt;

use super::{
    Interceptor, Phase, PhaseContent, PhaseRelation, PipelineContext,
    content::{PhaseSlot, interceptor},
    context::Step,
};
use crate::{PipelineError, Result};

/// An ordered set of phases, each carrying a chain of interceptors.
///
/// The pipeline is configured first (phases declared, interceptors attached,
/// other pipelines merged in) and then executed any number of times. The
/// slot order is the execution order: flattening concatenates every phase's
/// interceptors in that order.
///
/// # Example
///
/// ```ignore
/// let before = Phase::new("Before");
/// let output = Phase::new("Output");
/// let mut pipeline: Pipeline<Record, Logger> = Pipeline::new([before.clone(), output.clone()]);
///
/// let store = Phase::new("Store");
/// pipeline.insert_phase_after(&output, store.clone())?;
/// pipeline.intercept(&store, |ctx| {
///     ctx.context().store(ctx.subject());
///     ctx.proceed()
/// })?;
///
/// let record = pipeline.execute(&logger, record)?;
/// ```
pub struct Pipeline<S, C> {
    pub(super) slots: Vec<PhaseSlot<S, C>>,
    pub(super) interceptor_count: usize,
}

impl<S, C> Pipeline<S, C> {
    /// Create a pipeline with the given phases in default order.
    ///
    /// Repeated phases are kept only once.
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Self {
        let mut pipeline = Self {
            slots: Vec::new(),
            interceptor_count: 0,
        };
        for phase in phases {
            pipeline.add_phase(phase);
        }
        pipeline
    }

    /// The phases of this pipeline, in execution order.
    pub fn phases(&self) -> impl Iterator<Item = &Phase> {
        self.slots.iter().map(PhaseSlot::phase)
    }

    /// Returns true if `phase` is part of this pipeline.
    pub fn has_phase(&self, phase: &Phase) -> bool {
        self.position(phase).is_some()
    }

    /// The relation recorded for `phase`, or `None` if it is not registered.
    ///
    /// Phases that were appended report [`PhaseRelation::Last`].
    pub fn relation(&self, phase: &Phase) -> Option<PhaseRelation> {
        let slot = &self.slots[self.position(phase)?];
        Some(slot.relation().cloned().unwrap_or(PhaseRelation::Last))
    }

    /// Returns true if no interceptor is registered on any phase.
    pub fn is_empty(&self) -> bool {
        self.interceptor_count == 0
    }

    /// Total number of interceptors across all phases.
    pub fn interceptor_count(&self) -> usize {
        self.interceptor_count
    }

    /// Append `phase` at the end unless it is already registered.
    pub fn add_phase(&mut self, phase: Phase) {
        if self.has_phase(&phase) {
            return;
        }
        tracing::debug!(phase = %phase, index = self.slots.len(), "added phase");
        self.slots.push(PhaseSlot::Bare(phase));
    }

    /// Insert `phase` immediately before `reference`.
    ///
    /// Does nothing if `phase` is already registered.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PhaseNotRegistered`] if `reference` is not
    /// part of this pipeline.
    pub fn insert_phase_before(&mut self, reference: &Phase, phase: Phase) -> Result<()> {
        if self.has_phase(&phase) {
            return Ok(());
        }
        let index = self
            .position(reference)
            .ok_or_else(|| PipelineError::not_registered(reference))?;

        tracing::debug!(phase = %phase, reference = %reference, index, "inserted phase before");
        let content = PhaseContent::new(phase, PhaseRelation::Before(reference.clone()));
        self.slots.insert(index, PhaseSlot::Populated(content));
        Ok(())
    }

    /// Insert `phase` after `reference`.
    ///
    /// If other phases were already inserted after the same reference, the
    /// new phase goes after the last of them, so chained `After` insertions
    /// keep their registration order. Does nothing if `phase` is already
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PhaseNotRegistered`] if `reference` is not
    /// part of this pipeline.
    pub fn insert_phase_after(&mut self, reference: &Phase, phase: Phase) -> Result<()> {
        if self.has_phase(&phase) {
            return Ok(());
        }
        let index = self
            .position(reference)
            .ok_or_else(|| PipelineError::not_registered(reference))?;

        let last_related = self
            .slots
            .iter()
            .enumerate()
            .skip(index + 1)
            .filter(|(_, slot)| slot.relation().is_some_and(|r| r.is_after(reference)))
            .map(|(i, _)| i)
            .last()
            .unwrap_or(index);

        tracing::debug!(
            phase = %phase,
            reference = %reference,
            index = last_related + 1,
            "inserted phase after"
        );
        let content = PhaseContent::new(phase, PhaseRelation::After(reference.clone()));
        self.slots
            .insert(last_related + 1, PhaseSlot::Populated(content));
        Ok(())
    }

    /// Attach an interceptor to the end of `phase`'s chain.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PhaseNotRegistered`] if `phase` is not part
    /// of this pipeline.
    pub fn intercept<F>(&mut self, phase: &Phase, f: F) -> Result<()>
    where
        F: Fn(&mut PipelineContext<'_, S, C>) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.intercept_shared(phase, interceptor(f))
    }

    /// Attach an already shared interceptor to the end of `phase`'s chain.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PhaseNotRegistered`] if `phase` is not part
    /// of this pipeline.
    pub fn intercept_shared(
        &mut self,
        phase: &Phase,
        interceptor: Interceptor<S, C>,
    ) -> Result<()> {
        let content = self
            .content_mut(phase)
            .ok_or_else(|| PipelineError::not_registered(phase))?;
        content.push(interceptor);
        self.interceptor_count += 1;
        Ok(())
    }

    /// The interceptors currently registered on `phase`.
    ///
    /// Returns an empty slice for a registered phase without interceptors and
    /// `None` if the phase is not part of this pipeline.
    pub fn interceptors_for_phase(&self, phase: &Phase) -> Option<&[Interceptor<S, C>]> {
        let slot = &self.slots[self.position(phase)?];
        Some(
            slot.content()
                .map(PhaseContent::interceptors)
                .unwrap_or_default(),
        )
    }

    /// Run every interceptor over `subject` and return the final subject.
    ///
    /// Pipelines without interceptors return `subject` untouched without
    /// building an execution context.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by an interceptor.
    pub fn execute(&self, context: &C, subject: S) -> eyre::Result<S> {
        if self.is_empty() {
            tracing::trace!("pipeline has no interceptors, skipping execution");
            return Ok(subject);
        }

        let steps = self.flatten();
        tracing::trace!(interceptors = steps.len(), "executing pipeline");
        PipelineContext::new(context, subject, &steps).execute()
    }

    /// Concatenate every phase's interceptors in slot order.
    fn flatten(&self) -> Vec<Step<'_, S, C>> {
        let mut steps = Vec::with_capacity(self.interceptor_count);
        for content in self.slots.iter().filter_map(PhaseSlot::content) {
            steps.extend(content.interceptors().iter().map(|interceptor| Step {
                phase: content.phase(),
                interceptor,
            }));
        }
        steps
    }

    pub(super) fn position(&self, phase: &Phase) -> Option<usize> {
        self.slots.iter().position(|slot| slot.phase() == phase)
    }

    /// Find the content for `phase`, promoting a bare slot on first use.
    pub(super) fn content_mut(&mut self, phase: &Phase) -> Option<&mut PhaseContent<S, C>> {
        let index = self.position(phase)?;
        Some(self.slots[index].promote())
    }
}

impl<S, C> Default for Pipeline<S, C> {
    fn default() -> Self {
        Self::new([])
    }
}

impl<S, C> Clone for Pipeline<S, C> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            interceptor_count: self.interceptor_count,
        }
    }
}

impl<S, C> fmt::Debug for Pipeline<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("phases", &self.phases().collect::<Vec<_>>())
            .field("interceptors", &self.interceptor_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn record(pipeline: &mut Pipeline<(), Trace>, phase: &Phase, id: &'static str) {
        pipeline
            .intercept(phase, move |ctx| {
                ctx.context().lock().unwrap().push(id);
                ctx.proceed()
            })
            .unwrap();
    }

    fn run(pipeline: &Pipeline<(), Trace>) -> Vec<&'static str> {
        let trace = Trace::default();
        pipeline.execute(&trace, ()).unwrap();
        let calls = trace.lock().unwrap().clone();
        calls
    }

    fn names(pipeline: &Pipeline<(), Trace>) -> Vec<String> {
        pipeline.phases().map(|p| p.name().to_string()).collect()
    }

    #[test]
    fn test_add_phase_is_idempotent() {
        let a = Phase::new("A");
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([a.clone(), a.clone()]);
        pipeline.add_phase(a.clone());

        assert_eq!(names(&pipeline), ["A"]);
    }

    #[test]
    fn test_same_name_distinct_phases() {
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([Phase::new("A")]);
        pipeline.add_phase(Phase::new("A"));

        assert_eq!(names(&pipeline), ["A", "A"]);
    }

    #[test]
    fn test_insert_before() {
        let [a, b, c] = ["A", "B", "C"].map(Phase::new);
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([a, b, c.clone()]);
        pipeline.add_phase(Phase::new("D"));

        pipeline.insert_phase_before(&c, Phase::new("Z")).unwrap();

        assert_eq!(names(&pipeline), ["A", "B", "Z", "C", "D"]);
    }

    #[test]
    fn test_insert_after_chains() {
        let [a, b] = ["A", "B"].map(Phase::new);
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([a.clone(), b]);

        pipeline.insert_phase_after(&a, Phase::new("X")).unwrap();
        pipeline.insert_phase_after(&a, Phase::new("Y")).unwrap();
        pipeline.insert_phase_after(&a, Phase::new("W")).unwrap();

        assert_eq!(names(&pipeline), ["A", "X", "Y", "W", "B"]);
    }

    #[test]
    fn test_insert_after_ignores_phases_anchored_elsewhere() {
        let [a, b] = ["A", "B"].map(Phase::new);
        let x = Phase::new("X");
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([a.clone(), b]);

        pipeline.insert_phase_after(&a, x.clone()).unwrap();
        // X2 is anchored to X, so it does not extend the run of phases after A.
        pipeline.insert_phase_after(&x, Phase::new("X2")).unwrap();
        pipeline.insert_phase_after(&a, Phase::new("Y")).unwrap();

        assert_eq!(names(&pipeline), ["A", "X", "Y", "X2", "B"]);
        assert_eq!(pipeline.relation(&x), Some(PhaseRelation::After(a)));
    }

    #[test]
    fn test_insert_existing_phase_is_noop() {
        let [a, b] = ["A", "B"].map(Phase::new);
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([a.clone(), b.clone()]);

        pipeline.insert_phase_after(&b, a.clone()).unwrap();
        pipeline.insert_phase_before(&a, b.clone()).unwrap();
        // Already present phases short-circuit before the reference lookup.
        pipeline
            .insert_phase_before(&Phase::new("Missing"), a.clone())
            .unwrap();

        assert_eq!(names(&pipeline), ["A", "B"]);
        assert_eq!(pipeline.relation(&a), Some(PhaseRelation::Last));
    }

    #[test]
    fn test_insert_unknown_reference_fails() {
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([Phase::new("A")]);
        let missing = Phase::new("Missing");

        let before = pipeline.insert_phase_before(&missing, Phase::new("X"));
        let after = pipeline.insert_phase_after(&missing, Phase::new("Y"));

        match before {
            Err(PipelineError::PhaseNotRegistered { phase }) => assert_eq!(phase, "Missing"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            after,
            Err(PipelineError::PhaseNotRegistered { .. })
        ));
        assert_eq!(names(&pipeline), ["A"]);
    }

    #[test]
    fn test_intercept_unknown_phase_fails() {
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([Phase::new("A")]);

        let result = pipeline.intercept(&Phase::new("A"), |ctx| ctx.proceed());

        assert!(matches!(
            result,
            Err(PipelineError::PhaseNotRegistered { .. })
        ));
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_execution_order() {
        let [a, b, c] = ["A", "B", "C"].map(Phase::new);
        let mut pipeline = Pipeline::new([a.clone(), b.clone(), c.clone()]);

        record(&mut pipeline, &c, "c1");
        record(&mut pipeline, &a, "a1");
        record(&mut pipeline, &b, "b1");
        record(&mut pipeline, &a, "a2");
        record(&mut pipeline, &c, "c2");

        assert_eq!(run(&pipeline), ["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(pipeline.interceptor_count(), 5);
    }

    #[test]
    fn test_relations_recorded() {
        let [a, b] = ["A", "B"].map(Phase::new);
        let [x, z] = ["X", "Z"].map(Phase::new);
        let mut pipeline: Pipeline<(), Trace> = Pipeline::new([a.clone(), b.clone()]);
        pipeline.insert_phase_after(&a, x.clone()).unwrap();
        pipeline.insert_phase_before(&b, z.clone()).unwrap();
        record(&mut pipeline, &a, "a1");

        assert_eq!(pipeline.relation(&a), Some(PhaseRelation::Last));
        assert_eq!(pipeline.relation(&x), Some(PhaseRelation::After(a)));
        assert_eq!(pipeline.relation(&z), Some(PhaseRelation::Before(b)));
        assert_eq!(pipeline.relation(&Phase::new("A")), None);
    }

    #[test]
    fn test_interceptors_for_phase() {
        let [a, b] = ["A", "B"].map(Phase::new);
        let mut pipeline = Pipeline::new([a.clone(), b.clone()]);
        record(&mut pipeline, &a, "a1");
        record(&mut pipeline, &a, "a1");

        assert_eq!(pipeline.interceptors_for_phase(&a).map(<[_]>::len), Some(2));
        assert_eq!(pipeline.interceptors_for_phase(&b).map(<[_]>::len), Some(0));
        assert!(pipeline.interceptors_for_phase(&Phase::new("A")).is_none());
    }

    #[test]
    fn test_empty_pipeline_returns_subject() {
        let phase = Phase::new("A");
        let pipeline: Pipeline<Vec<u8>, ()> = Pipeline::new([phase]);

        assert!(pipeline.is_empty());
        assert_eq!(pipeline.execute(&(), vec![7]).unwrap(), vec![7]);
    }

    #[test]
    fn test_clone_shares_interceptors() {
        let a = Phase::new("A");
        let mut pipeline = Pipeline::new([a.clone()]);
        record(&mut pipeline, &a, "a1");

        let mut copy = pipeline.clone();
        record(&mut copy, &a, "a2");

        assert_eq!(run(&pipeline), ["a1"]);
        assert_eq!(run(&copy), ["a1", "a2"]);
    }
}
