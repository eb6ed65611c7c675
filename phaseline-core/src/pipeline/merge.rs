//! Merging one pipeline into another.

use super::{Phase, PhaseRelation, Pipeline, content::PhaseSlot};
use crate::{PipelineError, Result};

impl<S, C> Pipeline<S, C> {
    /// Import every phase of `from` that this pipeline does not have yet.
    ///
    /// Each phase is placed using the relation recorded in `from`. A phase
    /// anchored to another phase that has not been imported yet waits until
    /// its anchor exists, so the source may declare relative phases in any
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RelationCycle`] if a full pass over the
    /// remaining phases places none of them.
    pub fn merge_phases(&mut self, from: &Pipeline<S, C>) -> Result<()> {
        let mut pending: Vec<(&Phase, PhaseRelation)> = from
            .slots
            .iter()
            .map(|slot| {
                let relation = slot.relation().cloned().unwrap_or(PhaseRelation::Last);
                (slot.phase(), relation)
            })
            .collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut remaining = Vec::new();

            for (phase, relation) in pending {
                if self.has_phase(phase) || self.insert_relative(phase, &relation)? {
                    continue;
                }
                remaining.push((phase, relation));
            }

            if remaining.len() == before {
                return Err(PipelineError::RelationCycle {
                    phases: remaining
                        .iter()
                        .map(|(phase, _)| phase.name().to_string())
                        .collect(),
                });
            }
            pending = remaining;
        }

        Ok(())
    }

    /// Append the interceptors of every phase of `from` to the matching
    /// phase of this pipeline.
    ///
    /// Interceptors are not deduplicated: merging the same source twice
    /// registers its interceptors twice.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PhaseNotRegistered`] if a source phase with
    /// interceptors is missing here; call [`merge_phases`](Self::merge_phases)
    /// first.
    pub fn merge_interceptors(&mut self, from: &Pipeline<S, C>) -> Result<()> {
        for source in from.slots.iter().filter_map(PhaseSlot::content) {
            if source.is_empty() {
                continue;
            }
            let target = self
                .content_mut(source.phase())
                .ok_or_else(|| PipelineError::not_registered(source.phase()))?;
            target.extend_from(source);
            self.interceptor_count += source.len();
        }
        Ok(())
    }

    /// Merge phases, then interceptors, from `from` into this pipeline.
    pub fn merge(&mut self, from: &Pipeline<S, C>) -> Result<()> {
        self.merge_phases(from)?;
        self.merge_interceptors(from)?;
        tracing::debug!(
            phases = self.slots.len(),
            interceptors = self.interceptor_count,
            "merged pipeline"
        );
        Ok(())
    }

    /// Place `phase` according to `relation` if its anchor is present.
    ///
    /// Returns false when the anchor has not been placed yet.
    fn insert_relative(&mut self, phase: &Phase, relation: &PhaseRelation) -> Result<bool> {
        match relation {
            PhaseRelation::Last => self.add_phase(phase.clone()),
            PhaseRelation::Before(anchor) if self.has_phase(anchor) => {
                self.insert_phase_before(anchor, phase.clone())?
            }
            PhaseRelation::After(anchor) if self.has_phase(anchor) => {
                self.insert_phase_after(anchor, phase.clone())?
            }
            PhaseRelation::Before(_) | PhaseRelation::After(_) => return Ok(false),
        }
        Ok(true)
    }
}
