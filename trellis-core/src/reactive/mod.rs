//! Reactive Primitives
//!
//! This module implements the core reactive system: state cells, effect
//! registrations, the effect scheduler and the view runtime that ties them
//! together.
//!
//! # Concepts
//!
//! ## State Cells
//!
//! A StateCell is a container for mutable view state. It is declared during
//! render and remembers which view declared it. Writing a cell asks that view
//! to render again.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation registered during render with a
//! dependency list. After each render, effects whose dependencies changed run
//! again, each one right after the cleanup of its previous execution.
//!
//! ## Views
//!
//! A View owns a component, its hook slots and its scheduler. It batches state
//! mutations into render passes and tears everything down on unmount.
//!
//! # Implementation Notes
//!
//! Hooks are identified by call order, the approach used by React hooks and
//! Dioxus. Dependencies are explicit lists compared shallowly rather than
//! tracked automatically.

mod signal;
mod context;
mod subscriber;
mod effect;
mod scheduler;
mod runtime;

pub use signal::{StateCell, Getter, Setter};
pub use context::{Scope, HookKind};
pub use subscriber::{RenderTrigger, Subscriber, SubscriberId};
pub use effect::{Cleanup, Dep, DepList, Deps, EffectBody, EffectId, EffectRegistration, EffectReturn};
pub use scheduler::{EffectCompletion, EffectJob, EffectScheduler};
pub use runtime::{Component, View, ViewOptions, ViewStatus, WeakView, DEFAULT_MAX_RENDER_PASSES};
