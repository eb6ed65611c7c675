//! Execution cursor handed to interceptors.

use super::{Interceptor, Phase};

/// One entry of a flattened pipeline: an interceptor and the phase it came from.
pub(crate) struct Step<'a, S, C> {
    pub(crate) phase: &'a Phase,
    pub(crate) interceptor: &'a Interceptor<S, C>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Index of the next interceptor to invoke; equal to the step count once
    /// every interceptor has been entered.
    Running(usize),
    Finished,
}

/// Per-execution state passed to every interceptor.
///
/// The context owns the current subject and a cursor over the flattened
/// interceptor list. Interceptors drive the chain forward explicitly:
///
/// - [`proceed`](Self::proceed) invokes the next interceptor. Code before the
///   call runs on the way in, code after it on the way out.
/// - [`proceed_with`](Self::proceed_with) replaces the subject first.
/// - [`finish`](Self::finish) skips every remaining interceptor.
///
/// An interceptor that returns without calling `proceed` ends the chain as
/// if it had called `finish`.
pub struct PipelineContext<'a, S, C> {
    context: &'a C,
    subject: S,
    steps: &'a [Step<'a, S, C>],
    cursor: Cursor,
}

impl<'a, S, C> PipelineContext<'a, S, C> {
    /// Create a cursor positioned before the first step.
    pub(crate) fn new(context: &'a C, subject: S, steps: &'a [Step<'a, S, C>]) -> Self {
        Self {
            context,
            subject,
            steps,
            cursor: Cursor::Running(0),
        }
    }

    /// The caller-supplied context value.
    pub fn context(&self) -> &'a C {
        self.context
    }

    /// The current subject.
    pub fn subject(&self) -> &S {
        &self.subject
    }

    /// Mutable access to the current subject.
    pub fn subject_mut(&mut self) -> &mut S {
        &mut self.subject
    }

    /// Returns true once the chain can make no further progress.
    pub fn is_finished(&self) -> bool {
        self.cursor == Cursor::Finished
    }

    /// Invoke the next interceptor.
    ///
    /// Does nothing once finished. When every interceptor has been entered
    /// the cursor transitions to finished. The cursor advances before the
    /// interceptor runs, so a nested `proceed` continues from the one after.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an interceptor further down the
    /// chain, unchanged.
    pub fn proceed(&mut self) -> eyre::Result<()> {
        let index = match self.cursor {
            Cursor::Finished => return Ok(()),
            Cursor::Running(index) => index,
        };

        let steps = self.steps;
        let Some(step) = steps.get(index) else {
            self.cursor = Cursor::Finished;
            return Ok(());
        };

        self.cursor = Cursor::Running(index + 1);
        tracing::trace!(phase = %step.phase, index, "invoking interceptor");
        (step.interceptor)(self)
    }

    /// Replace the subject, then [`proceed`](Self::proceed).
    ///
    /// The new value may be a different variant of the subject type; every
    /// later interceptor observes it.
    pub fn proceed_with(&mut self, subject: S) -> eyre::Result<()> {
        self.subject = subject;
        self.proceed()
    }

    /// Stop the chain. Remaining interceptors are skipped and the subject is
    /// left as is. Interceptors already on the call stack still return
    /// normally.
    pub fn finish(&mut self) {
        if let Cursor::Running(index) = self.cursor {
            tracing::trace!(index, "pipeline finished early");
        }
        self.cursor = Cursor::Finished;
    }

    /// Drive the chain from the first interceptor and return the final subject.
    pub(crate) fn execute(mut self) -> eyre::Result<S> {
        self.cursor = Cursor::Running(0);
        self.proceed()?;
        Ok(self.subject)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::pipeline::interceptor;

    fn steps<'a>(
        phase: &'a Phase,
        interceptors: &'a [Interceptor<Vec<u8>, ()>],
    ) -> Vec<Step<'a, Vec<u8>, ()>> {
        interceptors
            .iter()
            .map(|interceptor| Step { phase, interceptor })
            .collect()
    }

    #[test]
    fn test_empty_chain_finishes() {
        let phase = Phase::new("Empty");
        let interceptors: [Interceptor<Vec<u8>, ()>; 0] = [];
        let steps = steps(&phase, &interceptors);
        let mut ctx = PipelineContext::new(&(), vec![1], &steps);

        ctx.proceed().unwrap();

        assert!(ctx.is_finished());
        assert_eq!(ctx.subject(), &vec![1]);
    }

    #[test]
    fn test_onion_order() {
        let phase = Phase::new("Onion");
        let trace = std::sync::Arc::new(Mutex::new(Vec::new()));

        let make = |id: u8| {
            let trace = trace.clone();
            interceptor(move |ctx: &mut PipelineContext<'_, Vec<u8>, ()>| {
                trace.lock().unwrap().push(format!("in {}", id));
                ctx.proceed()?;
                trace.lock().unwrap().push(format!("out {}", id));
                Ok(())
            })
        };
        let interceptors = [make(1), make(2)];
        let steps = steps(&phase, &interceptors);

        PipelineContext::new(&(), Vec::new(), &steps)
            .execute()
            .unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["in 1", "in 2", "out 2", "out 1"]
        );
    }

    #[test]
    fn test_finish_is_idempotent() {
        let phase = Phase::new("Finish");
        let interceptors = [
            interceptor(|ctx: &mut PipelineContext<'_, Vec<u8>, ()>| {
                ctx.subject_mut().push(1);
                ctx.finish();
                ctx.finish();
                ctx.proceed()
            }),
            interceptor(|ctx: &mut PipelineContext<'_, Vec<u8>, ()>| {
                ctx.subject_mut().push(2);
                ctx.proceed()
            }),
        ];
        let steps = steps(&phase, &interceptors);

        let subject = PipelineContext::new(&(), Vec::new(), &steps)
            .execute()
            .unwrap();

        assert_eq!(subject, vec![1]);
    }

    #[test]
    fn test_second_proceed_sees_next_index() {
        let phase = Phase::new("Twice");
        let interceptors = [
            interceptor(|ctx: &mut PipelineContext<'_, Vec<u8>, ()>| {
                ctx.proceed()?;
                ctx.proceed()
            }),
            // Does not proceed, so the first interceptor's second call resumes here.
            interceptor(|ctx: &mut PipelineContext<'_, Vec<u8>, ()>| {
                ctx.subject_mut().push(2);
                Ok(())
            }),
            interceptor(|ctx: &mut PipelineContext<'_, Vec<u8>, ()>| {
                ctx.subject_mut().push(3);
                Ok(())
            }),
        ];
        let steps = steps(&phase, &interceptors);

        let subject = PipelineContext::new(&(), Vec::new(), &steps)
            .execute()
            .unwrap();

        assert_eq!(subject, vec![2, 3]);
    }
}
