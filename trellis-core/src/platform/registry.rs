//! Bookkeeping shared by the platform implementations.

use indexmap::IndexMap;
use tracing::{error, info};

use super::{ListenerId, LogLevel, ResizeListener, WindowSize};

/// Resize listeners in subscription order.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: IndexMap<ListenerId, ResizeListener>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: ResizeListener) -> ListenerId {
        let id = ListenerId::new(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.shift_remove(&id).is_some()
    }

    /// Copy the listeners out so they can be called without holding the
    /// registry; a listener may subscribe or unsubscribe while running.
    pub fn snapshot(&self) -> Vec<ResizeListener> {
        self.listeners.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Deliver one resize event to every listener.
pub(crate) fn dispatch_resize(listeners: Vec<ResizeListener>, size: WindowSize) {
    for listener in listeners {
        listener(size);
    }
}

/// Counters of acquired and released platform resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformStats {
    pub intervals_started: usize,
    pub intervals_cleared: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub ticks: usize,
    pub resize_events: usize,
}

impl PlatformStats {
    /// Timers started and not yet cleared.
    pub fn active_intervals(&self) -> usize {
        self.intervals_started - self.intervals_cleared
    }

    /// Listeners added and not yet removed.
    pub fn active_listeners(&self) -> usize {
        self.listeners_added - self.listeners_removed
    }
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: LogLevel,
    pub message: String,
}

/// Everything written to the console or shown as a notification.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub console: Vec<ConsoleLine>,
    pub alerts: Vec<String>,
}

impl Transcript {
    pub(crate) fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(target: "trellis::console", "{message}"),
            LogLevel::Error => error!(target: "trellis::console", "{message}"),
        }
        self.console.push(ConsoleLine {
            level,
            message: message.to_owned(),
        });
    }

    pub(crate) fn alert(&mut self, message: &str) {
        info!(target: "trellis::alert", "{message}");
        self.alerts.push(message.to_owned());
    }

    /// Console messages in order, without levels.
    pub fn messages(&self) -> Vec<String> {
        self.console.iter().map(|line| line.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn registry_adds_and_removes() {
        let mut registry = ListenerRegistry::new();
        let a = registry.add(Rc::new(|_: WindowSize| {}));
        let b = registry.add(Rc::new(|_: WindowSize| {}));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resize_reaches_every_listener() {
        let mut registry = ListenerRegistry::new();
        let seen = Rc::new(Cell::new(0u32));
        for _ in 0..3 {
            let seen = seen.clone();
            registry.add(Rc::new(move |size: WindowSize| seen.set(seen.get() + size.width)));
        }

        dispatch_resize(registry.snapshot(), WindowSize::new(10, 5));
        assert_eq!(seen.get(), 30);
    }

    #[test]
    fn transcript_keeps_order() {
        let mut transcript = Transcript::default();
        transcript.log(LogLevel::Info, "one");
        transcript.log(LogLevel::Error, "two");
        transcript.alert("hey");

        assert_eq!(transcript.messages(), ["one", "two"]);
        assert_eq!(transcript.console[1].level, LogLevel::Error);
        assert_eq!(transcript.alerts, ["hey"]);
    }
}
