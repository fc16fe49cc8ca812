//! Trellis Core
//!
//! This crate provides a small reactive view runtime and the effect demo page
//! built on it. It implements:
//!
//! - State cells that re-render the view that declared them
//! - Effects with dependency lists and cleanups
//! - An effect scheduler that runs cleanups before re-runs and on teardown
//! - A platform layer for timers, resize events and console output
//! - The demo page: a counter, a timer, a remote user fetch and a window-size
//!   observer
//!
//! # Architecture
//!
//! - `reactive`: state cells, effects, the scheduler and the view runtime
//! - `platform`: the host capabilities effects use, virtual or tokio-backed
//! - `fetch`: the remote user record and where it comes from
//! - `demo`: the page component and its actions
//! - `config`: layered settings of the demo
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use trellis_core::{CannedUserSource, DemoConfig, DemoPage, User, VirtualPlatform};
//!
//! let platform = Rc::new(VirtualPlatform::default());
//! let source = Rc::new(CannedUserSource::ok(User::sample()));
//! let page = DemoPage::mount(platform.clone(), source, DemoConfig::default())?;
//!
//! page.start_timer()?;
//! platform.advance(std::time::Duration::from_secs(3));
//! // The timer effect ticked three times.
//! assert_eq!(page.model().unwrap().seconds, 3);
//!
//! page.unmount();
//! // Every interval and listener is gone.
//! assert_eq!(platform.active_intervals(), 0);
//! ```

pub mod config;
pub mod demo;
pub mod error;
pub mod fetch;
pub mod platform;
pub mod reactive;

pub use config::DemoConfig;
pub use demo::{DemoPage, PageModel, UseEffectDemo};
pub use error::{ConfigError, FetchError, ViewError};
pub use fetch::{CannedUserSource, FetchOutcome, HttpUserSource, User, UserSource};
pub use platform::{Platform, TokioPlatform, VirtualPlatform, WindowSize};
pub use reactive::{Component, Deps, Scope, StateCell, View};
