//! Timer panel.
//!
//! The running flag is the only input of the timer effect. Turning it on
//! starts a periodic tick; turning it off re-runs the effect, whose previous
//! cleanup cancels the tick first. Setting the flag to the value it already
//! has leaves the dependency unchanged and does nothing, so at most one tick
//! source exists at any time.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::platform::{LogLevel, Platform, Tick};
use crate::reactive::{Cleanup, StateCell};

/// Whether the timer is ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

impl TimerState {
    pub fn from_flag(running: bool) -> Self {
        if running {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    pub fn is_running(self) -> bool {
        self == TimerState::Running
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Stopped => f.write_str("stopped"),
            TimerState::Running => f.write_str("running"),
        }
    }
}

/// Buttons of the timer panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Stop,
    /// The start/stop button.
    Toggle,
    /// Zero the seconds and stop.
    Reset,
}

/// Effect keyed on the running flag.
pub fn timer_effect(
    platform: Rc<dyn Platform>,
    running: bool,
    period: Duration,
    seconds: StateCell<u64>,
) -> impl FnOnce() -> Option<Cleanup> + 'static {
    move || {
        if !running {
            return None;
        }

        platform.log(LogLevel::Info, "timer started");
        let tick: Tick = Rc::new(move || seconds.update(|s| s + 1));
        let id = platform.set_interval(period, tick);

        Some(Cleanup::new(move || {
            platform.log(LogLevel::Info, "timer stopped");
            platform.clear_interval(id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::VirtualPlatform;

    #[test]
    fn stopped_effect_starts_nothing() {
        let platform = Rc::new(VirtualPlatform::default());
        let seconds = StateCell::declare(0);

        let cleanup = timer_effect(platform.clone(), false, Duration::from_secs(1), seconds)();

        assert!(cleanup.is_none());
        assert_eq!(platform.stats().intervals_started, 0);
    }

    #[test]
    fn running_effect_ticks_until_cleaned_up() {
        let platform = Rc::new(VirtualPlatform::default());
        let seconds = StateCell::declare(0);

        let cleanup = timer_effect(platform.clone(), true, Duration::from_secs(1), seconds.clone())();
        platform.advance(Duration::from_secs(3));
        assert_eq!(seconds.get(), 3);

        cleanup.unwrap().run();
        platform.advance(Duration::from_secs(3));
        assert_eq!(seconds.get(), 3);
        assert_eq!(platform.console(), ["timer started", "timer stopped"]);
    }

    #[test]
    fn state_follows_flag() {
        assert_eq!(TimerState::from_flag(true), TimerState::Running);
        assert!(!TimerState::from_flag(false).is_running());
    }
}
