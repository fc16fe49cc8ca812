//! In-memory user source.

use std::cell::Cell;
use std::time::Duration;

use async_trait::async_trait;

use super::{User, UserSource};
use crate::error::FetchError;

/// Answers every request with the same result, optionally after a delay.
#[derive(Debug, Clone)]
pub struct CannedUserSource {
    result: Result<User, String>,
    delay: Option<Duration>,
    requests: Cell<usize>,
}

impl CannedUserSource {
    /// Always succeed with `user`.
    pub fn ok(user: User) -> Self {
        Self {
            result: Ok(user),
            delay: None,
            requests: Cell::new(0),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            delay: None,
            requests: Cell::new(0),
        }
    }

    /// Wait `delay` (on the tokio clock) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests served.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

#[async_trait(?Send)]
impl UserSource for CannedUserSource {
    async fn fetch_user(&self) -> Result<User, FetchError> {
        self.requests.set(self.requests.get() + 1);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone().map_err(FetchError::Canned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_source_answers_and_counts() {
        let source = CannedUserSource::ok(User::sample());
        assert_eq!(source.fetch_user().await.unwrap(), User::sample());
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_source_waits_then_fails() {
        let source = CannedUserSource::failing("offline").with_delay(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let err = source.fetch_user().await.unwrap_err();

        assert!(matches!(err, FetchError::Canned(ref msg) if msg == "offline"));
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
