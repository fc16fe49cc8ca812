//! The Effect Demo Page
//!
//! One view, five effects:
//!
//! 1. [`lifecycle`]: logs mount and unmount, captures the viewport once.
//! 2. [`counter`]: logs every new count and notifies at milestones.
//! 3. [`timer`]: runs a periodic tick while the timer flag is set.
//! 4. [`window`]: follows resize events until teardown.
//! 5. [`profile`]: logs the fetched user.
//!
//! The fetch itself is not an effect; it is an explicit action on
//! [`DemoPage`].

pub mod counter;
pub mod lifecycle;
pub mod page;
pub mod profile;
pub mod timer;
pub mod window;

pub use counter::CounterAction;
pub use page::{DemoPage, PageCells, PageEffects, PageFrame, PageModel, UseEffectDemo};
pub use timer::{TimerAction, TimerState};
