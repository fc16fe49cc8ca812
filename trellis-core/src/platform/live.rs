//! Tokio Platform
//!
//! Real timers backed by `tokio::time`. Timer callbacks touch view state,
//! which is `Rc`-based, so every timer runs as a local task: the platform must
//! be used from inside a `tokio::task::LocalSet`.
//!
//! There is no window; the viewport is whatever was configured, and
//! [`TokioPlatform::resize`] delivers a resize event by hand.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::registry::{dispatch_resize, ListenerRegistry, PlatformStats, Transcript};
use super::{
    IntervalId, ListenerId, LogLevel, Platform, ResizeListener, Tick, WindowSize, MIN_INTERVAL,
};

/// A platform whose timers run on the current tokio `LocalSet`.
pub struct TokioPlatform {
    viewport: Cell<WindowSize>,
    intervals: RefCell<IndexMap<IntervalId, JoinHandle<()>>>,
    next_interval: Cell<u64>,
    listeners: RefCell<ListenerRegistry>,
    stats: Cell<PlatformStats>,
    transcript: RefCell<Transcript>,
}

impl TokioPlatform {
    pub fn new(viewport: WindowSize) -> Self {
        Self {
            viewport: Cell::new(viewport),
            intervals: RefCell::new(IndexMap::new()),
            next_interval: Cell::new(0),
            listeners: RefCell::new(ListenerRegistry::new()),
            stats: Cell::new(PlatformStats::default()),
            transcript: RefCell::new(Transcript::default()),
        }
    }

    /// Change the viewport and deliver a resize event to every listener.
    pub fn resize(&self, size: WindowSize) {
        self.viewport.set(size);
        self.bump(|stats| stats.resize_events += 1);
        let listeners = self.listeners.borrow().snapshot();
        dispatch_resize(listeners, size);
    }

    pub fn stats(&self) -> PlatformStats {
        self.stats.get()
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.borrow().clone()
    }

    pub fn active_intervals(&self) -> usize {
        self.intervals.borrow().len()
    }

    fn bump(&self, f: impl FnOnce(&mut PlatformStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Platform for TokioPlatform {
    fn viewport(&self) -> WindowSize {
        self.viewport.get()
    }

    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId {
        self.bump(|stats| stats.listeners_added += 1);
        self.listeners.borrow_mut().add(listener)
    }

    fn remove_resize_listener(&self, id: ListenerId) -> bool {
        let removed = self.listeners.borrow_mut().remove(id);
        if removed {
            self.bump(|stats| stats.listeners_removed += 1);
        }
        removed
    }

    /// # Panics
    ///
    /// Panics when called outside a `LocalSet`.
    fn set_interval(&self, period: Duration, tick: Tick) -> IntervalId {
        let period = period.max(MIN_INTERVAL);
        let id = IntervalId::new(self.next_interval.get());
        self.next_interval.set(id.raw() + 1);

        let handle = tokio::task::spawn_local(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!(interval = id.raw(), "tick");
                tick();
            }
        });

        self.intervals.borrow_mut().insert(id, handle);
        self.bump(|stats| stats.intervals_started += 1);
        debug!(interval = id.raw(), period_ms = period.as_millis() as u64, "interval started");
        id
    }

    fn clear_interval(&self, id: IntervalId) -> bool {
        let handle = self.intervals.borrow_mut().shift_remove(&id);
        match handle {
            Some(handle) => {
                handle.abort();
                self.bump(|stats| stats.intervals_cleared += 1);
                debug!(interval = id.raw(), "interval cleared");
                true
            }
            None => false,
        }
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.transcript.borrow_mut().log(level, message);
    }

    fn alert(&self, message: &str) {
        self.transcript.borrow_mut().alert(message);
    }
}

impl Drop for TokioPlatform {
    fn drop(&mut self) {
        for (_, handle) in self.intervals.get_mut().drain(..) {
            handle.abort();
        }
    }
}
