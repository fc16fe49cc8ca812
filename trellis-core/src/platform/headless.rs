//! Virtual Platform
//!
//! A deterministic platform: time only moves when [`VirtualPlatform::advance`]
//! is called, and resize events only happen through
//! [`VirtualPlatform::resize`]. Console output and notifications are recorded
//! in a [`Transcript`].

use std::cell::{Cell, RefCell};
use std::time::Duration;

use indexmap::IndexMap;
use tracing::trace;

use super::registry::{dispatch_resize, ListenerRegistry, PlatformStats, Transcript};
use super::{
    IntervalId, ListenerId, LogLevel, Platform, ResizeListener, Tick, WindowSize, MIN_INTERVAL,
};

struct ScheduledInterval {
    period: Duration,
    next_due: Duration,
    tick: Tick,
}

/// A platform driven by a virtual clock.
pub struct VirtualPlatform {
    now: Cell<Duration>,
    viewport: Cell<WindowSize>,
    intervals: RefCell<IndexMap<IntervalId, ScheduledInterval>>,
    next_interval: Cell<u64>,
    listeners: RefCell<ListenerRegistry>,
    stats: Cell<PlatformStats>,
    transcript: RefCell<Transcript>,
}

impl VirtualPlatform {
    /// Create a platform with the given viewport at time zero.
    pub fn new(viewport: WindowSize) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            viewport: Cell::new(viewport),
            intervals: RefCell::new(IndexMap::new()),
            next_interval: Cell::new(0),
            listeners: RefCell::new(ListenerRegistry::new()),
            stats: Cell::new(PlatformStats::default()),
            transcript: RefCell::new(Transcript::default()),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Move the clock forward, firing every tick that falls due on the way.
    ///
    /// Ticks fire in due order; timers due at the same instant fire in the
    /// order they were started. Returns the number of ticks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;

        loop {
            let due = {
                let mut intervals = self.intervals.borrow_mut();
                let next = intervals
                    .iter()
                    .filter(|(_, interval)| interval.next_due <= target)
                    .min_by_key(|(id, interval)| (interval.next_due, **id))
                    .map(|(id, _)| *id);

                next.and_then(|id| {
                    let interval = intervals.get_mut(&id)?;
                    let at = interval.next_due;
                    interval.next_due += interval.period;
                    Some((id, at, interval.tick.clone()))
                })
            };

            let Some((id, at, tick)) = due else {
                break;
            };

            self.now.set(at);
            self.bump(|stats| stats.ticks += 1);
            trace!(interval = id.raw(), at_ms = at.as_millis() as u64, "virtual tick");
            tick();
            fired += 1;
        }

        self.now.set(target);
        fired
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

    /// Console messages so far.
    pub fn console(&self) -> Vec<String> {
        self.transcript.borrow().messages()
    }

    /// Notifications so far.
    pub fn alerts(&self) -> Vec<String> {
        self.transcript.borrow().alerts.clone()
    }

    pub fn active_intervals(&self) -> usize {
        self.intervals.borrow().len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn bump(&self, f: impl FnOnce(&mut PlatformStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Default for VirtualPlatform {
    fn default() -> Self {
        Self::new(WindowSize::new(1024, 768))
    }
}

impl Platform for VirtualPlatform {
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

    fn set_interval(&self, period: Duration, tick: Tick) -> IntervalId {
        let period = period.max(MIN_INTERVAL);
        let id = IntervalId::new(self.next_interval.get());
        self.next_interval.set(id.raw() + 1);
        self.intervals.borrow_mut().insert(
            id,
            ScheduledInterval {
                period,
                next_due: self.now.get() + period,
                tick,
            },
        );
        self.bump(|stats| stats.intervals_started += 1);
        id
    }

    fn clear_interval(&self, id: IntervalId) -> bool {
        let removed = self.intervals.borrow_mut().shift_remove(&id).is_some();
        if removed {
            self.bump(|stats| stats.intervals_cleared += 1);
        }
        removed
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.transcript.borrow_mut().log(level, message);
    }

    fn alert(&self, message: &str) {
        self.transcript.borrow_mut().alert(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Tick) {
        let count = Rc::new(Cell::new(0));
        let tick_count = count.clone();
        (count, Rc::new(move || tick_count.set(tick_count.get() + 1)))
    }

    #[test]
    fn interval_fires_once_per_period() {
        let platform = VirtualPlatform::default();
        let (count, tick) = counter();
        platform.set_interval(Duration::from_secs(1), tick);

        assert_eq!(platform.advance(Duration::from_millis(999)), 0);
        assert_eq!(platform.advance(Duration::from_millis(1)), 1);
        assert_eq!(platform.advance(Duration::from_millis(2500)), 2);
        assert_eq!(count.get(), 3);
        assert_eq!(platform.now(), Duration::from_millis(3500));
    }

    #[test]
    fn cleared_interval_stops_ticking() {
        let platform = VirtualPlatform::default();
        let (count, tick) = counter();
        let id = platform.set_interval(Duration::from_secs(1), tick);

        platform.advance(Duration::from_secs(2));
        assert!(platform.clear_interval(id));
        assert!(!platform.clear_interval(id));
        platform.advance(Duration::from_secs(5));

        assert_eq!(count.get(), 2);
        assert_eq!(platform.stats().intervals_cleared, 1);
        assert_eq!(platform.active_intervals(), 0);
    }

    #[test]
    fn tick_may_clear_its_own_interval() {
        let platform = Rc::new(VirtualPlatform::default());
        let count = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<IntervalId>>> = Rc::new(Cell::new(None));

        let tick: Tick = {
            let platform = Rc::downgrade(&platform);
            let count = count.clone();
            let slot = slot.clone();
            Rc::new(move || {
                count.set(count.get() + 1);
                if let (Some(platform), Some(id)) = (platform.upgrade(), slot.get()) {
                    platform.clear_interval(id);
                }
            })
        };
        slot.set(Some(platform.set_interval(Duration::from_millis(100), tick)));

        platform.advance(Duration::from_secs(1));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn zero_period_is_clamped() {
        let platform = VirtualPlatform::default();
        let (count, tick) = counter();
        platform.set_interval(Duration::ZERO, tick);

        platform.advance(Duration::from_millis(5));
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn resize_updates_viewport_and_listeners() {
        let platform = VirtualPlatform::default();
        let seen = Rc::new(Cell::new(WindowSize::default()));
        let seen_clone = seen.clone();
        let id = platform.add_resize_listener(Rc::new(move |size: WindowSize| seen_clone.set(size)));

        platform.resize(WindowSize::new(800, 600));
        assert_eq!(seen.get(), WindowSize::new(800, 600));
        assert_eq!(platform.viewport(), WindowSize::new(800, 600));

        assert!(platform.remove_resize_listener(id));
        platform.resize(WindowSize::new(1, 1));
        assert_eq!(seen.get(), WindowSize::new(800, 600));
        assert_eq!(platform.stats().resize_events, 2);
    }

    #[test]
    fn console_and_alerts_are_recorded() {
        let platform = VirtualPlatform::default();
        platform.log(LogLevel::Info, "hello");
        platform.alert("ding");

        assert_eq!(platform.console(), ["hello"]);
        assert_eq!(platform.alerts(), ["ding"]);
    }
}
