//! Effect Scheduler
//!
//! The scheduler decides, after each render pass, which registered effects
//! execute and in which order.
//!
//! # Algorithm
//!
//! For each registration of the pass, in registration order:
//!
//! 1. `Once` with an existing snapshot: skip.
//! 2. `Always`: execute.
//! 3. `List`: compare element-wise with the snapshot; execute on any change.
//! 4. Executing means: run the stored cleanup of the previous execution,
//!    then the body, then store the body's cleanup and the new snapshot.
//!
//! On teardown the last stored cleanup of every registration runs once, in
//! reverse registration order.
//!
//! # Re-entrancy
//!
//! Effect bodies mutate state, and state mutation talks to the owning view.
//! The view therefore never runs a body while it holds the scheduler: it
//! takes the planned jobs out with [`EffectScheduler::take_jobs`], and for
//! each job in turn takes the previous cleanup with
//! [`EffectScheduler::take_cleanup`], runs it, runs the body, and reports back
//! with [`EffectScheduler::complete`]. A cleanup stays in its slot until its
//! own job is about to run, so a pass cut short by a panic or an unmount
//! leaves the remaining cleanups for teardown.
//! [`EffectScheduler::flush`] does all of this for callers that own the
//! scheduler outright.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::effect::{Cleanup, Deps, EffectBody, EffectId, EffectRegistration};

/// Per-registration state that survives across renders.
#[derive(Debug, Default)]
struct EffectSlot {
    /// Dependency list captured at the most recent execution.
    snapshot: Option<Deps>,

    /// Cleanup returned by the most recent execution.
    cleanup: Option<Cleanup>,

    runs: usize,
    cleanups: usize,
}

/// A planned execution of one effect.
///
/// The previous cleanup is not part of the job; it stays in the scheduler
/// until [`EffectScheduler::take_cleanup`] is called for this job.
pub struct EffectJob {
    id: EffectId,
    deps: Deps,
    body: EffectBody,
}

impl EffectJob {
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Run the body and hand back what the scheduler must record.
    pub fn run(self) -> EffectCompletion {
        trace!(effect = %self.id, "running effect body");
        let cleanup = (self.body)();
        EffectCompletion {
            id: self.id,
            deps: self.deps,
            cleanup,
        }
    }
}

/// Result of running an [`EffectJob`].
pub struct EffectCompletion {
    id: EffectId,
    deps: Deps,
    cleanup: Option<Cleanup>,
}

/// The effect scheduler of a single view.
pub struct EffectScheduler {
    /// Slots in first-registration order.
    slots: IndexMap<EffectId, EffectSlot>,

    /// Registrations of the current render pass.
    pending: Vec<EffectRegistration>,

    torn_down: bool,
}

impl EffectScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
            pending: Vec::new(),
            torn_down: false,
        }
    }

    /// Register an effect for the current render pass.
    pub fn register(&mut self, id: EffectId, body: EffectBody, deps: Deps) {
        self.push(EffectRegistration::new(id, deps, body));
    }

    /// Queue an already-built registration for the current render pass.
    pub fn push(&mut self, registration: EffectRegistration) {
        if self.torn_down {
            debug!(effect = %registration.id(), "registration after teardown ignored");
            return;
        }
        self.slots.entry(registration.id()).or_default();
        self.pending.push(registration);
    }

    /// Plan the executions of the current pass.
    ///
    /// Registrations that do not need to run are dropped here. Previous
    /// cleanups stay in their slots.
    pub fn take_jobs(&mut self) -> Vec<EffectJob> {
        let pending = std::mem::take(&mut self.pending);
        let mut jobs = Vec::with_capacity(pending.len());

        for registration in pending {
            let (id, deps, body) = registration.into_parts();
            let Some(slot) = self.slots.get_mut(&id) else {
                continue;
            };

            if !deps.requires_run(slot.snapshot.as_ref()) {
                trace!(effect = %id, "dependencies unchanged, skipping");
                continue;
            }

            debug!(effect = %id, run = slot.runs + 1, "effect scheduled");
            jobs.push(EffectJob { id, deps, body });
        }

        jobs
    }

    /// Take the stored cleanup of an effect, to run it right before the
    /// effect's next body. Call [`EffectScheduler::record_cleanup`] once it
    /// has run.
    pub fn take_cleanup(&mut self, id: EffectId) -> Option<Cleanup> {
        self.slots.get_mut(&id)?.cleanup.take()
    }

    /// Count a cleanup of the effect that has finished running.
    pub fn record_cleanup(&mut self, id: EffectId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.cleanups += 1;
        }
    }

    /// Record a finished job.
    ///
    /// Returns the job's cleanup when the scheduler was torn down while the
    /// job ran; the caller must run it.
    #[must_use]
    pub fn complete(&mut self, completion: EffectCompletion) -> Option<Cleanup> {
        let EffectCompletion { id, deps, cleanup } = completion;

        if self.torn_down {
            return cleanup;
        }

        match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.snapshot = Some(deps);
                slot.cleanup = cleanup;
                slot.runs += 1;
                None
            }
            None => cleanup,
        }
    }

    /// Run the current pass to completion.
    pub fn flush(&mut self) {
        for job in self.take_jobs() {
            let id = job.id();
            if let Some(cleanup) = self.take_cleanup(id) {
                trace!(effect = %id, "running previous cleanup");
                cleanup.run();
                self.record_cleanup(id);
            }
            let completion = job.run();
            if let Some(orphan) = self.complete(completion) {
                orphan.run();
            }
        }
    }

    /// Take the last cleanup of every registration, in reverse registration
    /// order. After this the scheduler accepts no more registrations.
    ///
    /// The caller runs each cleanup and records it with
    /// [`EffectScheduler::record_cleanup`].
    pub fn teardown(&mut self) -> Vec<(EffectId, Cleanup)> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        self.pending.clear();

        let mut cleanups = Vec::new();
        for (id, slot) in self.slots.iter_mut().rev() {
            if let Some(cleanup) = slot.cleanup.take() {
                trace!(effect = %id, "teardown cleanup");
                cleanups.push((*id, cleanup));
            }
        }
        cleanups
    }

    /// Number of times the effect body ran.
    pub fn run_count(&self, id: EffectId) -> usize {
        self.slots.get(&id).map_or(0, |slot| slot.runs)
    }

    /// Number of cleanups of this effect that ran to completion.
    pub fn cleanup_count(&self, id: EffectId) -> usize {
        self.slots.get(&id).map_or(0, |slot| slot.cleanups)
    }

    /// Whether the effect has executed at least once.
    pub fn has_snapshot(&self, id: EffectId) -> bool {
        self.slots.get(&id).is_some_and(|slot| slot.snapshot.is_some())
    }

    /// Get the total number of registrations.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Default for EffectScheduler {
    fn default() -> Self {
        Self::new()
    }
}
