//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::reactive::HookKind;

/// Errors raised by the view runtime.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Effects kept mutating their own dependencies.
    #[error("render loop did not settle after {passes} passes")]
    RenderLoop { passes: usize },

    /// A render called hooks in a different order than the first render.
    #[error("hook order changed at slot {slot}: expected {expected}, found {found}")]
    HookOrder {
        slot: usize,
        expected: HookKind,
        found: HookKind,
    },

    /// An earlier pass failed; the view only accepts unmount now.
    #[error("view failed during an earlier render pass")]
    Failed,

    #[error("view is unmounted")]
    Unmounted,
}

/// Errors raised while fetching the user record.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },

    #[error("response is not a user record: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure produced by a canned source.
    #[error("{0}")]
    Canned(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("environment variable {var} has invalid value {value:?}")]
    Env { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
