//! Rate limit snapshots and request pacing.
//!
//! GitHub reports the API quota through `x-ratelimit-*` response
//! headers. The [`RateLimit`] snapshot captures those values, and the
//! [`RateLimitChecker`] decides between successive paginated calls
//! whether to pause until the quota window resets. A cancelled wait is
//! absorbed: pacing must never abort an otherwise-successful
//! multi-page fetch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Rate limit snapshot extracted from response headers.
///
/// A snapshot is either fully present (all three values) or entirely
/// absent; partially populated headers never produce one.
///
/// # Example
///
/// ```
/// use github_alm_client::RateLimit;
///
/// let limit = RateLimit::new(4999, 5000, 1_700_000_000);
/// assert_eq!(limit.remaining(), 4999);
/// assert_eq!(limit.limit(), 5000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Remaining requests in the current window.
    remaining: u32,
    /// Maximum requests allowed in the current window.
    limit: u32,
    /// Unix timestamp when the window resets.
    reset_epoch_seconds: u64,
}

impl RateLimit {
    /// Creates a new rate limit snapshot.
    #[must_use]
    pub const fn new(remaining: u32, limit: u32, reset_epoch_seconds: u64) -> Self {
        Self {
            remaining,
            limit,
            reset_epoch_seconds,
        }
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the Unix timestamp when the window resets.
    #[must_use]
    pub const fn reset_epoch_seconds(&self) -> u64 {
        self.reset_epoch_seconds
    }

    /// Calculates seconds until the window resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system
    /// time cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_epoch_seconds.saturating_sub(now)
    }
}

/// Outcome of a pacing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Pacing {
    /// The quota budget allows the next call immediately.
    Proceed,
    /// The checker slept for the contained duration before returning.
    Waited(Duration),
    /// The wait was cancelled; the caller may proceed immediately.
    Cancelled,
}

/// Decides whether to pause between paginated calls.
///
/// The checker compares the consumed share of the quota against a
/// percentage threshold; once crossed, it sleeps until the advertised
/// reset instant (optionally capped). The wait is cooperatively
/// cancellable through a [`CancellationToken`]: cancellation is logged
/// and reported as [`Pacing::Cancelled`], never as an error.
#[derive(Debug, Clone)]
pub struct RateLimitChecker {
    threshold_percent: u64,
    max_wait: Option<Duration>,
}

impl RateLimitChecker {
    /// Consumed-quota percentage above which the checker pauses.
    pub const DEFAULT_THRESHOLD_PERCENT: u64 = 90;

    /// Creates a checker with the default threshold and an uncapped
    /// wait.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold_percent: Self::DEFAULT_THRESHOLD_PERCENT,
            max_wait: None,
        }
    }

    /// Sets the consumed-quota percentage that triggers a pause.
    #[must_use]
    pub const fn with_threshold_percent(mut self, threshold_percent: u64) -> Self {
        self.threshold_percent = threshold_percent;
        self
    }

    /// Caps how long a single pacing pause may last.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Pauses when the consumed quota share crosses the threshold.
    ///
    /// An absent snapshot is a no-op. Cancellation during the pause is
    /// logged and absorbed so pagination can continue immediately.
    pub async fn check_rate_limit(
        &self,
        rate_limit: Option<&RateLimit>,
        cancellation: &CancellationToken,
    ) -> Pacing {
        let Some(snapshot) = rate_limit else {
            return Pacing::Proceed;
        };
        if snapshot.limit() == 0 || !self.threshold_crossed(snapshot) {
            return Pacing::Proceed;
        }

        let mut wait = Duration::from_secs(snapshot.seconds_until_reset());
        if let Some(max_wait) = self.max_wait {
            wait = wait.min(max_wait);
        }
        if wait.is_zero() {
            return Pacing::Proceed;
        }

        debug!(
            remaining = snapshot.remaining(),
            limit = snapshot.limit(),
            wait_seconds = wait.as_secs(),
            "rate limit budget nearly consumed, pausing until reset"
        );

        tokio::select! {
            () = tokio::time::sleep(wait) => Pacing::Waited(wait),
            () = cancellation.cancelled() => {
                warn!("interrupted while waiting for the rate limit to reset, continuing");
                Pacing::Cancelled
            }
        }
    }

    fn threshold_crossed(&self, snapshot: &RateLimit) -> bool {
        let limit = u64::from(snapshot.limit());
        let consumed = u64::from(snapshot.limit().saturating_sub(snapshot.remaining()));
        consumed * 100 >= self.threshold_percent * limit
    }
}

impl Default for RateLimitChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use tokio_util::sync::CancellationToken;

    use super::{Pacing, RateLimit, RateLimitChecker};

    fn epoch_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be available")
            .as_secs()
    }

    #[test]
    fn seconds_until_reset_returns_zero_when_reset_has_passed() {
        let snapshot = RateLimit::new(0, 5000, 0);
        assert_eq!(snapshot.seconds_until_reset(), 0);
    }

    #[tokio::test]
    async fn absent_snapshot_is_a_no_op() {
        let checker = RateLimitChecker::new();

        let pacing = checker
            .check_rate_limit(None, &CancellationToken::new())
            .await;

        assert_eq!(pacing, Pacing::Proceed);
    }

    #[tokio::test]
    async fn budget_below_threshold_proceeds_immediately() {
        let checker = RateLimitChecker::new();
        let snapshot = RateLimit::new(4000, 5000, epoch_now() + 3600);

        let pacing = checker
            .check_rate_limit(Some(&snapshot), &CancellationToken::new())
            .await;

        assert_eq!(pacing, Pacing::Proceed);
    }

    #[tokio::test]
    async fn reset_in_the_past_proceeds_without_sleeping() {
        let checker = RateLimitChecker::new();
        let snapshot = RateLimit::new(0, 5000, 0);

        let pacing = checker
            .check_rate_limit(Some(&snapshot), &CancellationToken::new())
            .await;

        assert_eq!(pacing, Pacing::Proceed);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_waits_until_reset() {
        let checker = RateLimitChecker::new();
        let snapshot = RateLimit::new(0, 5000, epoch_now() + 60);

        let pacing = checker
            .check_rate_limit(Some(&snapshot), &CancellationToken::new())
            .await;

        assert!(
            matches!(pacing, Pacing::Waited(waited) if waited >= Duration::from_secs(59)),
            "expected a wait close to the reset window, got {pacing:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_capped_by_the_configured_maximum() {
        let checker = RateLimitChecker::new().with_max_wait(Duration::from_secs(5));
        let snapshot = RateLimit::new(0, 5000, epoch_now() + 3600);

        let pacing = checker
            .check_rate_limit(Some(&snapshot), &CancellationToken::new())
            .await;

        assert_eq!(pacing, Pacing::Waited(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_absorbed_not_propagated() {
        let checker = RateLimitChecker::new();
        let snapshot = RateLimit::new(0, 5000, epoch_now() + 3600);
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let pacing = checker
            .check_rate_limit(Some(&snapshot), &cancellation)
            .await;

        assert_eq!(pacing, Pacing::Cancelled);
    }

    #[tokio::test]
    async fn custom_threshold_is_honoured() {
        let checker = RateLimitChecker::new().with_threshold_percent(50);
        let snapshot = RateLimit::new(4000, 5000, 0);

        // 20% consumed stays below a 50% threshold.
        let pacing = checker
            .check_rate_limit(Some(&snapshot), &CancellationToken::new())
            .await;

        assert_eq!(pacing, Pacing::Proceed);
    }
}
