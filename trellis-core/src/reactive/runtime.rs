//! View Runtime
//!
//! A view is the unit that connects state cells, the render function and the
//! effect scheduler.
//!
//! # How It Works
//!
//! 1. Mounting a view runs the first render pass. The render declares state
//!    cells (subscribing the view to them) and registers effects.
//!
//! 2. After the render, the scheduler runs the effects whose dependencies
//!    changed, each one after the cleanup of its previous execution.
//!
//! 3. When a cell changes, the view renders again:
//!    a. inside `dispatch` the render waits until the handler returns, so
//!       several mutations produce one pass;
//!    b. during a pass (render or effects) the request marks the view dirty
//!       and one follow-up pass runs afterwards;
//!    c. otherwise (a timer tick, a late async result) it renders at once.
//!
//! 4. Unmounting runs every stored cleanup once, newest registration first.
//!    Mutations after that are ignored.
//!
//! # Failure
//!
//! Panics in render, effect bodies or cleanups are not caught. They unwind to
//! whoever triggered the pass. A guard marks the view failed on the way out,
//! and later dispatches report `ViewError::Failed`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, info, trace};

use super::context::Scope;
use super::effect::EffectId;
use super::scheduler::EffectScheduler;
use super::subscriber::{RenderTrigger, Subscriber, SubscriberId};
use crate::error::ViewError;

/// Default bound on consecutive render passes for one trigger.
pub const DEFAULT_MAX_RENDER_PASSES: usize = 50;

/// A render function plus whatever it needs from the outside.
pub trait Component: 'static {
    /// What a render produces.
    type Output: Clone + 'static;

    /// Render the view. Hooks must be called in the same order every time.
    fn render(&self, cx: &mut Scope) -> Self::Output;
}

/// Lifecycle of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Mounted,
    /// A pass failed or panicked. Only unmount is still allowed.
    Failed,
    Unmounted,
}

/// Options for mounting a view.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    /// Consecutive passes allowed before the render loop is declared runaway.
    pub max_render_passes: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            max_render_passes: DEFAULT_MAX_RENDER_PASSES,
        }
    }
}

struct ViewInner<C: Component> {
    id: SubscriberId,
    component: C,
    scope: RefCell<Scope>,
    scheduler: RefCell<EffectScheduler>,
    output: RefCell<Option<C::Output>>,
    status: Cell<ViewStatus>,
    batch_depth: Cell<usize>,
    rendering: Cell<bool>,
    dirty: Cell<bool>,
    render_count: Cell<usize>,
    options: ViewOptions,
    /// Error of a pass that nobody was waiting for.
    last_error: RefCell<Option<ViewError>>,
}

/// Marks the view as rendering; on unwind, marks it failed.
struct PassGuard<'a> {
    rendering: &'a Cell<bool>,
    status: &'a Cell<ViewStatus>,
}

impl<'a> PassGuard<'a> {
    fn enter(rendering: &'a Cell<bool>, status: &'a Cell<ViewStatus>) -> Self {
        rendering.set(true);
        Self { rendering, status }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.rendering.set(false);
        if std::thread::panicking() && self.status.get() == ViewStatus::Mounted {
            self.status.set(ViewStatus::Failed);
        }
    }
}

/// Keeps a batch open; closes it even if the handler panics.
struct BatchGuard<'a>(&'a Cell<usize>);

impl<'a> BatchGuard<'a> {
    fn open(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl<C: Component> ViewInner<C> {
    fn ensure_live(&self) -> Result<(), ViewError> {
        match self.status.get() {
            ViewStatus::Mounted => Ok(()),
            ViewStatus::Failed => Err(ViewError::Failed),
            ViewStatus::Unmounted => Err(ViewError::Unmounted),
        }
    }

    fn can_render(&self) -> bool {
        self.batch_depth.get() == 0 && !self.rendering.get()
    }

    /// Render until no pass leaves the view dirty.
    fn render_loop(&self) -> Result<(), ViewError> {
        let mut passes = 0;
        self.dirty.set(true);

        while self.dirty.get() {
            if self.status.get() != ViewStatus::Mounted {
                // Unmounted by one of the effects.
                return Ok(());
            }
            if passes == self.options.max_render_passes {
                self.dirty.set(false);
                return Err(self.fail(ViewError::RenderLoop { passes }));
            }
            self.dirty.set(false);
            passes += 1;
            if let Err(err) = self.render_pass() {
                return Err(self.fail(err));
            }
        }

        trace!(view = self.id.raw(), passes, "render loop settled");
        Ok(())
    }

    fn render_pass(&self) -> Result<(), ViewError> {
        let _guard = PassGuard::enter(&self.rendering, &self.status);

        let registrations = {
            let mut scope = self.scope.borrow_mut();
            scope.begin_pass();
            let output = self.component.render(&mut scope);
            let registrations = scope.finish_pass()?;
            *self.output.borrow_mut() = Some(output);
            registrations
        };
        self.render_count.set(self.render_count.get() + 1);

        let jobs = {
            let mut scheduler = self.scheduler.borrow_mut();
            for registration in registrations {
                scheduler.push(registration);
            }
            scheduler.take_jobs()
        };

        // The scheduler is released while a cleanup or body runs; either may
        // touch state or even unmount the view. Once the view is gone the rest
        // of the plan is dropped: teardown already ran the cleanups it left.
        for job in jobs {
            if self.status.get() != ViewStatus::Mounted {
                trace!(view = self.id.raw(), effect = %job.id(), "view gone, skipping effect");
                break;
            }

            let id = job.id();
            let previous = self.scheduler.borrow_mut().take_cleanup(id);
            if let Some(cleanup) = previous {
                cleanup.run();
                self.scheduler.borrow_mut().record_cleanup(id);
                if self.status.get() != ViewStatus::Mounted {
                    break;
                }
            }

            let completion = job.run();
            let orphan = self.scheduler.borrow_mut().complete(completion);
            if let Some(cleanup) = orphan {
                cleanup.run();
                self.scheduler.borrow_mut().record_cleanup(id);
            }
        }

        Ok(())
    }

    fn fail(&self, err: ViewError) -> ViewError {
        error!(view = self.id.raw(), error = %err, "view failed");
        if self.status.get() == ViewStatus::Mounted {
            self.status.set(ViewStatus::Failed);
        }
        err
    }

    fn teardown(&self) {
        if self.status.get() == ViewStatus::Unmounted {
            return;
        }
        self.status.set(ViewStatus::Unmounted);
        self.dirty.set(false);

        let cleanups = self.scheduler.borrow_mut().teardown();
        info!(view = self.id.raw(), cleanups = cleanups.len(), "view unmounted");
        for (id, cleanup) in cleanups {
            cleanup.run();
            self.scheduler.borrow_mut().record_cleanup(id);
        }
    }
}

impl<C: Component> RenderTrigger for ViewInner<C> {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn request_render(&self) {
        if self.status.get() != ViewStatus::Mounted {
            trace!(view = self.id.raw(), status = ?self.status.get(), "render request ignored");
            return;
        }
        if !self.can_render() {
            self.dirty.set(true);
            return;
        }
        if let Err(err) = self.render_loop() {
            *self.last_error.borrow_mut() = Some(err);
        }
    }
}

impl<C: Component> Drop for ViewInner<C> {
    fn drop(&mut self) {
        if self.status.get() != ViewStatus::Unmounted {
            debug!(view = self.id.raw(), "view dropped while mounted, tearing down");
            self.teardown();
        }
    }
}

/// A mounted view.
///
/// Cloning a view yields another handle to the same view. The view is torn
/// down by [`View::unmount`], or when the last handle is dropped.
pub struct View<C: Component> {
    inner: Rc<ViewInner<C>>,
}

impl<C: Component> View<C> {
    /// Mount a view with default options.
    pub fn mount(component: C) -> Result<Self, ViewError> {
        Self::mount_with(component, ViewOptions::default())
    }

    /// Mount a view and run its first render pass.
    pub fn mount_with(component: C, options: ViewOptions) -> Result<Self, ViewError> {
        let id = SubscriberId::new();
        let inner = Rc::new_cyclic(|weak: &Weak<ViewInner<C>>| {
            let trigger: Weak<dyn RenderTrigger> = weak.clone();
            ViewInner {
                id,
                component,
                scope: RefCell::new(Scope::new(Subscriber::new(id, trigger))),
                scheduler: RefCell::new(EffectScheduler::new()),
                output: RefCell::new(None),
                status: Cell::new(ViewStatus::Mounted),
                batch_depth: Cell::new(0),
                rendering: Cell::new(false),
                dirty: Cell::new(false),
                render_count: Cell::new(0),
                options,
                last_error: RefCell::new(None),
            }
        });

        info!(view = id.raw(), "mounting view");
        inner.render_loop()?;
        Ok(Self { inner })
    }

    /// Run a handler as one batch.
    ///
    /// State mutations inside the handler produce a single render once it
    /// returns. Nested dispatches, and dispatches from inside a pass, join the
    /// enclosing batch.
    pub fn dispatch<R>(&self, handler: impl FnOnce() -> R) -> Result<R, ViewError> {
        let inner = &self.inner;
        inner.ensure_live()?;

        let result = {
            let _batch = BatchGuard::open(&inner.batch_depth);
            handler()
        };

        if inner.dirty.get() && inner.can_render() && inner.status.get() == ViewStatus::Mounted {
            inner.render_loop()?;
        }
        if let Some(err) = inner.last_error.borrow_mut().take() {
            return Err(err);
        }
        Ok(result)
    }

    /// Tear the view down. Calling it again is a no-op.
    pub fn unmount(&self) {
        self.inner.teardown();
    }

    /// Output of the most recent successful render.
    pub fn output(&self) -> Option<C::Output> {
        self.inner.output.borrow().clone()
    }

    pub fn component(&self) -> &C {
        &self.inner.component
    }

    pub fn status(&self) -> ViewStatus {
        self.inner.status.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.status() == ViewStatus::Mounted
    }

    /// Number of completed render passes.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    /// Take the error of a pass triggered outside `dispatch`, if any.
    pub fn take_error(&self) -> Option<ViewError> {
        self.inner.last_error.borrow_mut().take()
    }

    /// Number of times the effect body ran.
    pub fn effect_runs(&self, id: EffectId) -> usize {
        self.inner.scheduler.borrow().run_count(id)
    }

    /// Number of times a cleanup of the effect ran.
    pub fn effect_cleanups(&self, id: EffectId) -> usize {
        self.inner.scheduler.borrow().cleanup_count(id)
    }

    /// A weak handle for tasks that must not keep the view alive.
    pub fn downgrade(&self) -> WeakView<C> {
        WeakView {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl<C: Component> Clone for View<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Component> fmt::Debug for View<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .field("render_count", &self.render_count())
            .finish()
    }
}

/// A view handle that does not keep the view alive.
pub struct WeakView<C: Component> {
    inner: Weak<ViewInner<C>>,
}

impl<C: Component> WeakView<C> {
    /// Get the view back if it is still alive and mounted.
    pub fn upgrade(&self) -> Option<View<C>> {
        let inner = self.inner.upgrade()?;
        (inner.status.get() == ViewStatus::Mounted).then(|| View { inner })
    }
}

impl<C: Component> Clone for WeakView<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps;
    use crate::reactive::{Cleanup, Deps, StateCell};
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    #[derive(Clone)]
    struct Cells {
        count: StateCell<i32>,
        other: StateCell<i32>,
    }

    /// A counter with one effect per dependency kind.
    struct Probe {
        log: Log,
    }

    impl Component for Probe {
        type Output = Cells;

        fn render(&self, cx: &mut Scope) -> Cells {
            let count = cx.use_state(|| 0);
            let other = cx.use_state(|| 0);
            let n = count.get();

            let log = self.log.clone();
            cx.use_effect(Deps::Once, move || {
                log.borrow_mut().push("mount".into());
                let log = log.clone();
                Cleanup::new(move || log.borrow_mut().push("unmount".into()))
            });

            let log = self.log.clone();
            cx.use_effect(deps![n], move || {
                log.borrow_mut().push(format!("count {n}"));
                let log = log.clone();
                Cleanup::new(move || log.borrow_mut().push(format!("leave {n}")))
            });

            let log = self.log.clone();
            cx.use_effect(Deps::Always, move || log.borrow_mut().push("render".into()));

            Cells { count, other }
        }
    }

    fn mount_probe() -> (View<Probe>, Log, Cells) {
        let log = Log::default();
        let view = View::mount(Probe { log: log.clone() }).unwrap();
        let cells = view.output().unwrap();
        (view, log, cells)
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn mount_runs_every_effect_once() {
        let (view, log, _) = mount_probe();

        assert_eq!(drain(&log), ["mount", "count 0", "render"]);
        assert_eq!(view.render_count(), 1);
        assert!(view.is_mounted());
    }

    #[test]
    fn dispatch_batches_mutations_into_one_render() {
        let (view, log, cells) = mount_probe();
        drain(&log);

        view.dispatch(|| {
            cells.count.set(1);
            cells.count.set(2);
            cells.other.set(9);
        })
        .unwrap();

        assert_eq!(view.render_count(), 2);
        assert_eq!(drain(&log), ["leave 0", "count 2", "render"]);
    }

    #[test]
    fn unrelated_state_only_reruns_always_effects() {
        let (view, log, cells) = mount_probe();
        drain(&log);

        for i in 0..5 {
            view.dispatch(|| cells.other.set(i)).unwrap();
        }

        assert_eq!(drain(&log), ["render"; 5]);
    }

    #[test]
    fn set_outside_dispatch_renders_immediately() {
        let (view, log, cells) = mount_probe();
        drain(&log);

        cells.count.set(3);

        assert_eq!(view.render_count(), 2);
        assert_eq!(drain(&log), ["leave 0", "count 3", "render"]);
    }

    #[test]
    fn unmount_runs_cleanups_in_reverse_and_ignores_later_sets() {
        let (view, log, cells) = mount_probe();
        cells.count.set(1);
        drain(&log);

        view.unmount();
        assert_eq!(drain(&log), ["leave 1", "unmount"]);

        cells.count.set(2);
        view.unmount();
        assert!(drain(&log).is_empty());
        assert_eq!(view.status(), ViewStatus::Unmounted);
        assert!(matches!(view.dispatch(|| ()), Err(ViewError::Unmounted)));
    }

    /// Unmounts its own view from an effect once `trip` is set.
    struct SelfUnmounting {
        log: Log,
        handle: Rc<RefCell<Option<WeakView<SelfUnmounting>>>>,
    }

    impl Component for SelfUnmounting {
        type Output = StateCell<u32>;

        fn render(&self, cx: &mut Scope) -> StateCell<u32> {
            let trip = cx.use_state(|| 0u32);
            let v = trip.get();

            let handle = self.handle.clone();
            cx.use_effect(deps![v], move || {
                if v == 1 {
                    let view = handle.borrow().as_ref().and_then(WeakView::upgrade);
                    if let Some(view) = view {
                        view.unmount();
                    }
                }
            });

            let log = self.log.clone();
            cx.use_effect(deps![v], move || {
                log.borrow_mut().push(format!("body {v}"));
                let log = log.clone();
                Cleanup::new(move || log.borrow_mut().push(format!("cleanup {v}")))
            });

            trip
        }
    }

    #[test]
    fn unmount_from_an_effect_stops_the_rest_of_the_pass() {
        let log = Log::default();
        let handle = Rc::new(RefCell::new(None));
        let view = View::mount(SelfUnmounting {
            log: log.clone(),
            handle: handle.clone(),
        })
        .unwrap();
        *handle.borrow_mut() = Some(view.downgrade());
        let trip = view.output().unwrap();

        trip.set(1);

        assert_eq!(drain(&log), ["body 0", "cleanup 0"]);
        assert_eq!(view.status(), ViewStatus::Unmounted);
        assert_eq!(view.effect_runs(EffectId::new(2)), 1);
        assert_eq!(view.effect_cleanups(EffectId::new(2)), 1);
    }

    #[test]
    fn dropping_the_last_handle_tears_down() {
        let (view, log, _cells) = mount_probe();
        drain(&log);

        drop(view);

        assert_eq!(drain(&log), ["leave 0", "unmount"]);
    }

    /// An effect that feeds its own dependency.
    struct Runaway;

    impl Component for Runaway {
        type Output = ();

        fn render(&self, cx: &mut Scope) {
            let n = cx.use_state(|| 0u32);
            let current = n.get();
            cx.use_effect(deps![current], move || n.set(current + 1));
        }
    }

    #[test]
    fn runaway_effect_is_stopped() {
        let err = View::mount_with(Runaway, ViewOptions { max_render_passes: 10 }).unwrap_err();
        assert!(matches!(err, ViewError::RenderLoop { passes: 10 }));
    }

    /// Settles after a few passes.
    struct Converging;

    impl Component for Converging {
        type Output = u32;

        fn render(&self, cx: &mut Scope) -> u32 {
            let n = cx.use_state(|| 0u32);
            let current = n.get();
            cx.use_effect(deps![current], move || {
                if current < 3 {
                    n.set(current + 1);
                }
            });
            current
        }
    }

    #[test]
    fn effect_mutations_render_follow_up_passes() {
        let view = View::mount(Converging).unwrap();
        assert_eq!(view.output(), Some(3));
        assert_eq!(view.render_count(), 4);
    }

    struct Panicking;

    impl Component for Panicking {
        type Output = StateCell<bool>;

        fn render(&self, cx: &mut Scope) -> StateCell<bool> {
            let armed = cx.use_state(|| false);
            let now = armed.get();
            cx.use_effect(deps![now], move || {
                if now {
                    panic!("effect exploded");
                }
            });
            armed
        }
    }

    #[test]
    fn effect_panic_propagates_and_fails_the_view() {
        let view = View::mount(Panicking).unwrap();
        let armed = view.output().unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = view.dispatch(|| armed.set(true));
        }));

        assert!(result.is_err());
        assert_eq!(view.status(), ViewStatus::Failed);
        assert!(matches!(view.dispatch(|| ()), Err(ViewError::Failed)));
    }

    /// The first effect panics when armed; the second owns a resource.
    struct PanicThenResource {
        released: Rc<Cell<usize>>,
    }

    impl Component for PanicThenResource {
        type Output = StateCell<bool>;

        fn render(&self, cx: &mut Scope) -> StateCell<bool> {
            let armed = cx.use_state(|| false);
            let now = armed.get();
            cx.use_effect(deps![now], move || {
                if now {
                    panic!("effect exploded");
                }
            });

            let released = self.released.clone();
            cx.use_effect(deps![now], move || {
                Cleanup::new(move || released.set(released.get() + 1))
            });
            armed
        }
    }

    #[test]
    fn cleanups_of_skipped_effects_run_at_unmount_after_a_panic() {
        let released = Rc::new(Cell::new(0));
        let view = View::mount(PanicThenResource {
            released: released.clone(),
        })
        .unwrap();
        let armed = view.output().unwrap();
        let second = EffectId::new(2);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = view.dispatch(|| armed.set(true));
        }));
        assert!(result.is_err());
        assert_eq!(released.get(), 0);
        assert_eq!(view.effect_cleanups(second), 0);

        view.unmount();

        assert_eq!(released.get(), 1);
        assert_eq!(view.effect_cleanups(second), 1);
    }

    #[test]
    fn weak_view_does_not_outlive_unmount() {
        let (view, _log, _cells) = mount_probe();
        let weak = view.downgrade();
        assert!(weak.upgrade().is_some());

        view.unmount();
        assert!(weak.upgrade().is_none());
    }
}
