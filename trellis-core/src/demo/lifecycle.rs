//! Mount and unmount logging.

use std::rc::Rc;

use crate::platform::{LogLevel, Platform, WindowSize};
use crate::reactive::{Cleanup, StateCell};

/// Effect for the first render only: log the mount and capture the viewport.
/// Its cleanup logs the unmount.
pub fn mount_effect(
    platform: Rc<dyn Platform>,
    window: StateCell<WindowSize>,
) -> impl FnOnce() -> Cleanup + 'static {
    move || {
        platform.log(LogLevel::Info, "component mounted");
        window.set(platform.viewport());

        Cleanup::new(move || platform.log(LogLevel::Info, "component unmounted"))
    }
}
