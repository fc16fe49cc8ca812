//! Remote User Fetch
//!
//! The fetch demo loads one user record from a remote endpoint. The endpoint
//! is an opaque collaborator behind the [`UserSource`] trait: the HTTP
//! implementation talks to the placeholder API, the canned one answers from
//! memory for tests and offline runs.

mod canned;
mod http;

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub use canned::CannedUserSource;
pub use http::HttpUserSource;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/users/1";

/// The fields of the remote user record the page displays.
///
/// Any other fields in the response are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

impl User {
    /// The first record of the placeholder API.
    pub fn sample() -> Self {
        Self {
            name: "Leanne Graham".into(),
            email: "Sincere@april.biz".into(),
            phone: "1-770-736-8031 x56442".into(),
            website: "hildegard.org".into(),
        }
    }
}

/// Where user records come from.
///
/// Single-threaded like the rest of the runtime, so the futures are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait UserSource {
    async fn fetch_user(&self) -> Result<User, FetchError>;
}

/// What happened to one fetch request.
///
/// The view never sees this; it only sees the loading flag drop, with or
/// without a user.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The user is now displayed.
    Loaded(Rc<User>),
    /// The request failed. The error was logged and swallowed.
    Failed(FetchError),
    /// A request was already in flight, so the trigger was ignored.
    Busy,
    /// The view went away before the result arrived; nothing was written.
    Discarded,
}

impl FetchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchOutcome::Loaded(_))
    }
}

/// Fetch panel state as the view sees it.
///
/// A failed request leaves the panel exactly as an idle one: no data and not
/// loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Loaded,
}

impl FetchPhase {
    pub fn of(loading: bool, has_user: bool) -> Self {
        match (loading, has_user) {
            (true, _) => FetchPhase::Loading,
            (false, true) => FetchPhase::Loaded,
            (false, false) => FetchPhase::Idle,
        }
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Idle => f.write_str("idle"),
            FetchPhase::Loading => f.write_str("loading"),
            FetchPhase::Loaded => f.write_str("loaded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ignores_extra_fields() {
        let json = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "x@y.com",
            "phone": "1",
            "website": "z",
            "company": { "name": "Romaguera-Crona" }
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.name, "Leanne Graham");
        assert_eq!(user.website, "z");
    }

    #[test]
    fn user_requires_displayed_fields() {
        let json = r#"{ "name": "Leanne Graham" }"#;
        assert!(serde_json::from_str::<User>(json).is_err());
    }

    #[test]
    fn phase_follows_flags() {
        assert_eq!(FetchPhase::of(false, false), FetchPhase::Idle);
        assert_eq!(FetchPhase::of(true, false), FetchPhase::Loading);
        assert_eq!(FetchPhase::of(true, true), FetchPhase::Loading);
        assert_eq!(FetchPhase::of(false, true), FetchPhase::Loaded);
    }
}
