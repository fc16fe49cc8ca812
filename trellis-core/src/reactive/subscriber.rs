//! Subscriber types for the reactive system.
//!
//! A Subscriber represents anything that wants to hear about state
//! mutations. In Trellis that is always a view: every state cell a view
//! declares holds a weak render trigger pointing back at the view.

use std::fmt;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each view gets a unique ID when mounted. State cells use it to avoid
/// registering the same view twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A target that re-renders when a cell it subscribed to changes.
pub trait RenderTrigger {
    /// Get the subscriber ID for this target.
    fn subscriber_id(&self) -> SubscriberId;

    /// Ask for a render pass.
    ///
    /// The target decides whether to render now or to coalesce the request
    /// into a batch that is already open.
    fn request_render(&self);
}

/// A subscriber to state cells.
///
/// Holds the trigger weakly so a cell never keeps its view alive.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    trigger: Weak<dyn RenderTrigger>,
}

impl Subscriber {
    /// Create a subscriber that forwards notifications to `trigger`.
    pub fn new(id: SubscriberId, trigger: Weak<dyn RenderTrigger>) -> Self {
        Self { id, trigger }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the target is still alive.
    pub fn is_alive(&self) -> bool {
        self.trigger.strong_count() > 0
    }

    /// Notify the subscriber that a cell changed.
    ///
    /// Returns `false` when the target has been dropped.
    pub fn notify(&self) -> bool {
        match self.trigger.upgrade() {
            Some(trigger) => {
                trigger.request_render();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
