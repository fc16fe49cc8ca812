//! Render Scope
//!
//! The scope is what a component's render function talks to. It hands out
//! the view's hooks (state cells and effect registrations) by call-site
//! position.
//!
//! # Implementation
//!
//! Hooks are identified by the order in which render calls them. The first
//! render allocates one slot per hook call; every later render walks the same
//! slots with a cursor. A render that calls a different hook at some position,
//! or a different number of hooks, is reported as a hook-order violation.

use std::any::Any;
use std::fmt;

use super::effect::{Deps, EffectId, EffectRegistration, EffectReturn};
use super::signal::StateCell;
use super::subscriber::{Subscriber, SubscriberId};
use crate::error::ViewError;

/// Kind of hook occupying a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
    /// No hook at this position.
    Missing,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::State => f.write_str("state"),
            HookKind::Effect => f.write_str("effect"),
            HookKind::Missing => f.write_str("nothing"),
        }
    }
}

enum HookSlot {
    /// A `StateCell<T>`, type-erased.
    State(Box<dyn Any>),
    Effect(EffectId),
}

impl HookSlot {
    fn kind(&self) -> HookKind {
        match self {
            HookSlot::State(_) => HookKind::State,
            HookSlot::Effect(_) => HookKind::Effect,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Violation {
    slot: usize,
    expected: HookKind,
    found: HookKind,
}

/// Hook storage of one view, handed to its component on every render.
pub struct Scope {
    /// The owning view, attached to every declared cell.
    subscriber: Subscriber,

    slots: Vec<HookSlot>,

    /// Position of the next hook call in the current pass.
    cursor: usize,

    /// Effects registered during the current pass.
    registrations: Vec<EffectRegistration>,

    /// First hook-order violation of the current pass.
    violation: Option<Violation>,

    /// Number of completed passes.
    passes: usize,
}

impl Scope {
    /// Create an empty scope for the view behind `subscriber`.
    pub fn new(subscriber: Subscriber) -> Self {
        Self {
            subscriber,
            slots: Vec::new(),
            cursor: 0,
            registrations: Vec::new(),
            violation: None,
            passes: 0,
        }
    }

    /// Get the owning view's subscriber ID.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    /// Whether this is the first render of the view.
    pub fn is_first_pass(&self) -> bool {
        self.passes == 0
    }

    /// Declare a state cell at this call-site.
    ///
    /// `init` runs on the first render only; later renders return the cell
    /// created then.
    pub fn use_state<T, F>(&mut self, init: F) -> StateCell<T>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        let index = self.advance();

        match self.slots.get(index) {
            Some(HookSlot::State(any)) => {
                if let Some(cell) = any.downcast_ref::<StateCell<T>>() {
                    return cell.clone();
                }
                // Same kind, different value type: still a different hook.
                self.record_violation(index, HookKind::State, HookKind::State);
                StateCell::declare(init())
            }
            Some(other) => {
                let expected = other.kind();
                self.record_violation(index, expected, HookKind::State);
                StateCell::declare(init())
            }
            None if self.is_first_pass() => {
                let cell = StateCell::declare(init());
                cell.subscribe(self.subscriber.clone());
                self.slots.push(HookSlot::State(Box::new(cell.clone())));
                cell
            }
            None => {
                self.record_violation(index, HookKind::Missing, HookKind::State);
                StateCell::declare(init())
            }
        }
    }

    /// Register an effect at this call-site.
    ///
    /// The body captures this render's values. Whether it runs is decided
    /// after the render by comparing `deps` with the previous execution.
    pub fn use_effect<F, R>(&mut self, deps: Deps, body: F) -> EffectId
    where
        F: FnOnce() -> R + 'static,
        R: EffectReturn,
    {
        let index = self.advance();

        let id = match self.slots.get(index) {
            Some(HookSlot::Effect(id)) => *id,
            Some(other) => {
                let expected = other.kind();
                self.record_violation(index, expected, HookKind::Effect);
                return EffectId::new(index);
            }
            None if self.is_first_pass() => {
                let id = EffectId::new(index);
                self.slots.push(HookSlot::Effect(id));
                id
            }
            None => {
                self.record_violation(index, HookKind::Missing, HookKind::Effect);
                return EffectId::new(index);
            }
        };

        self.registrations
            .push(EffectRegistration::new(id, deps, body));
        id
    }

    /// Number of hook slots allocated by the first render.
    pub fn hook_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn begin_pass(&mut self) {
        self.cursor = 0;
        self.registrations.clear();
        self.violation = None;
    }

    /// Close the pass and hand out its effect registrations.
    pub(crate) fn finish_pass(&mut self) -> Result<Vec<EffectRegistration>, ViewError> {
        if self.violation.is_none() && self.cursor < self.slots.len() {
            let expected = self.slots[self.cursor].kind();
            self.record_violation(self.cursor, expected, HookKind::Missing);
        }

        if let Some(Violation { slot, expected, found }) = self.violation.take() {
            self.registrations.clear();
            return Err(ViewError::HookOrder {
                slot,
                expected,
                found,
            });
        }

        self.passes += 1;
        Ok(std::mem::take(&mut self.registrations))
    }

    fn advance(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }

    fn record_violation(&mut self, slot: usize, expected: HookKind, found: HookKind) {
        if self.violation.is_none() {
            self.violation = Some(Violation {
                slot,
                expected,
                found,
            });
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("subscriber", &self.subscriber.id())
            .field("hooks", &self.slots.len())
            .field("passes", &self.passes)
            .finish()
    }
}
