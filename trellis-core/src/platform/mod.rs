//! Platform Capabilities
//!
//! Everything the demo needs from its host (viewport size, resize events,
//! periodic timers, a console and a blocking notification) goes through the
//! [`Platform`] trait. The reactive core never touches global state, so it
//! runs the same under a virtual clock in tests and under tokio in the CLI.
//!
//! # Implementations
//!
//! - [`VirtualPlatform`]: deterministic, time moves only when told to.
//! - [`TokioPlatform`]: real timers on a tokio `LocalSet`.

mod registry;
mod headless;
mod live;

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use registry::{ConsoleLine, ListenerRegistry, PlatformStats, Transcript};
pub use headless::VirtualPlatform;
pub use live::TokioPlatform;

/// Shortest period a timer may have; shorter requests are clamped.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px x {}px", self.width, self.height)
    }
}

/// Handle of a periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(u64);

impl IntervalId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Handle of a resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Callback invoked on every resize event.
pub type ResizeListener = Rc<dyn Fn(WindowSize)>;

/// Callback invoked on every timer tick.
pub type Tick = Rc<dyn Fn()>;

/// Host capabilities consumed by the demo.
///
/// All methods take `&self`; implementations use interior mutability and are
/// shared as `Rc<dyn Platform>`.
pub trait Platform {
    /// Current viewport dimensions.
    fn viewport(&self) -> WindowSize;

    /// Subscribe to resize events. Every event is delivered; there is no
    /// throttling.
    fn add_resize_listener(&self, listener: ResizeListener) -> ListenerId;

    /// Unsubscribe. Returns `false` if the listener was not registered.
    fn remove_resize_listener(&self, id: ListenerId) -> bool;

    /// Start a periodic timer. The first tick fires one period from now.
    fn set_interval(&self, period: Duration, tick: Tick) -> IntervalId;

    /// Cancel a periodic timer. Returns `false` if it was not running.
    fn clear_interval(&self, id: IntervalId) -> bool;

    /// Write a console line.
    fn log(&self, level: LogLevel, message: &str);

    /// Show a blocking notification.
    fn alert(&self, message: &str);
}
