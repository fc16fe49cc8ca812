//! State Cell Implementation
//!
//! A StateCell is the fundamental piece of view state. It holds a value and
//! the list of views that must re-render when the value changes.
//!
//! # How State Cells Work
//!
//! 1. A view declares a cell during render (`Scope::use_state`). The cell
//!    records the view as a subscriber.
//!
//! 2. Reading a cell (`get`) never subscribes anything; the subscription was
//!    made at declaration time.
//!
//! 3. Writing a cell (`set`/`update`) always notifies every subscriber, even
//!    when the new value equals the old one. The view decides whether the
//!    request is rendered now or folded into an open batch.
//!
//! # Threading
//!
//! Cells are single-threaded (`Rc<RefCell<T>>`). All state mutation and effect
//! execution happen on one logical control thread.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::subscriber::{Subscriber, SubscriberId};

/// Counter for generating unique cell IDs.
static CELL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique cell ID.
fn next_cell_id() -> u64 {
    CELL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct CellInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Subscriber>>,
}

/// A piece of mutable view state holding a value of type `T`.
///
/// Cloning a cell yields another handle to the same value.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::StateCell;
///
/// let count = StateCell::declare(0);
/// count.set(5);
/// count.update(|n| n + 1);
/// assert_eq!(count.get(), 6);
/// ```
pub struct StateCell<T> {
    /// Unique identifier for this cell.
    id: u64,

    inner: Rc<CellInner<T>>,
}

impl<T: 'static> StateCell<T> {
    /// Create a free-standing cell with the given initial value.
    ///
    /// The cell has no subscribers until one is attached.
    pub fn declare(initial: T) -> Self {
        Self {
            id: next_cell_id(),
            inner: Rc::new(CellInner {
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify_subscribers();
    }

    /// Compute the next value from the previous one and notify subscribers.
    ///
    /// Always sees the latest value, unlike a handler that captured a value
    /// from an earlier render.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let current = self.inner.value.borrow();
            f(&current)
        };
        self.set(next);
    }

    /// Attach a subscriber. Attaching the same subscriber twice is a no-op.
    pub fn subscribe(&self, subscriber: Subscriber) {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        if subscribers.iter().all(|s| s.id() != subscriber.id()) {
            subscribers.push(subscriber);
        }
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.inner
            .subscribers
            .borrow_mut()
            .retain(|s| s.id() != subscriber_id);
    }

    /// Get the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.is_alive())
            .count()
    }

    fn notify_subscribers(&self) {
        // Snapshot first: a notification may render, and rendering may clone
        // or subscribe to this very cell.
        let subscribers = self.inner.subscribers.borrow().clone();
        let mut dead = false;
        for subscriber in &subscribers {
            dead |= !subscriber.notify();
        }
        trace!(cell = self.id, notified = subscribers.len(), "state cell changed");
        if dead {
            self.inner.subscribers.borrow_mut().retain(Subscriber::is_alive);
        }
    }
}

impl<T: Clone + 'static> StateCell<T> {
    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Split the cell into a read half and a write half.
    pub fn split(&self) -> (Getter<T>, Setter<T>) {
        (Getter(self.clone()), Setter(self.clone()))
    }
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("id", &self.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

/// Read half of a [`StateCell`].
pub struct Getter<T>(StateCell<T>);

impl<T: Clone + 'static> Getter<T> {
    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.0.get()
    }
}

impl<T> Clone for Getter<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Write half of a [`StateCell`].
pub struct Setter<T>(StateCell<T>);

impl<T: 'static> Setter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.0.set(value);
    }

    /// Compute the next value from the previous one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.0.update(f);
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
