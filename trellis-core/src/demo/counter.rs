//! Counter panel.

use std::rc::Rc;

use crate::platform::{LogLevel, Platform};

/// Buttons of the counter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    Reset,
}

impl CounterAction {
    pub fn apply(self, count: i64) -> i64 {
        match self {
            CounterAction::Increment => count.saturating_add(1),
            CounterAction::Decrement => count.saturating_sub(1),
            CounterAction::Reset => 0,
        }
    }
}

/// Whether `count` is a positive multiple of `every`.
pub fn is_milestone(count: i64, every: i64) -> bool {
    every > 0 && count > 0 && count % every == 0
}

/// Effect keyed on the count: log it, and notify at milestones.
pub fn count_effect(platform: Rc<dyn Platform>, count: i64, alert_every: i64) -> impl FnOnce() + 'static {
    move || {
        platform.log(LogLevel::Info, &format!("count changed to {count}"));
        if is_milestone(count, alert_every) {
            platform.alert(&format!("reached {count}!"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::VirtualPlatform;

    #[test]
    fn actions_move_the_count() {
        assert_eq!(CounterAction::Increment.apply(4), 5);
        assert_eq!(CounterAction::Decrement.apply(0), -1);
        assert_eq!(CounterAction::Reset.apply(42), 0);
        assert_eq!(CounterAction::Increment.apply(i64::MAX), i64::MAX);
    }

    #[test]
    fn milestones_are_positive_multiples() {
        assert!(is_milestone(10, 10));
        assert!(is_milestone(30, 10));
        assert!(!is_milestone(0, 10));
        assert!(!is_milestone(-10, 10));
        assert!(!is_milestone(15, 10));
        assert!(!is_milestone(10, 0));
    }

    #[test]
    fn effect_logs_and_alerts() {
        let platform = Rc::new(VirtualPlatform::default());

        count_effect(platform.clone(), 9, 10)();
        count_effect(platform.clone(), 10, 10)();

        assert_eq!(platform.console(), ["count changed to 9", "count changed to 10"]);
        assert_eq!(platform.alerts(), ["reached 10!"]);
    }
}
