//! Window-size panel.
//!
//! Every resize event writes the new size; there is no throttling or
//! debouncing.

use std::rc::Rc;

use crate::platform::{Platform, ResizeListener, WindowSize};
use crate::reactive::{Cleanup, StateCell};

/// Effect with an empty dependency list: subscribe to resize events until
/// teardown.
pub fn resize_effect(
    platform: Rc<dyn Platform>,
    window: StateCell<WindowSize>,
) -> impl FnOnce() -> Cleanup + 'static {
    move || {
        let listener: ResizeListener = Rc::new(move |size: WindowSize| window.set(size));
        let id = platform.add_resize_listener(listener);

        Cleanup::new(move || {
            platform.remove_resize_listener(id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::VirtualPlatform;

    #[test]
    fn listener_tracks_every_event_until_cleanup() {
        let platform = Rc::new(VirtualPlatform::default());
        let window = StateCell::declare(WindowSize::default());

        let cleanup = resize_effect(platform.clone(), window.clone())();
        platform.resize(WindowSize::new(100, 50));
        platform.resize(WindowSize::new(101, 50));
        assert_eq!(window.get(), WindowSize::new(101, 50));

        cleanup.run();
        platform.resize(WindowSize::new(5, 5));
        assert_eq!(window.get(), WindowSize::new(101, 50));
        assert_eq!(platform.active_listeners(), 0);
    }
}
