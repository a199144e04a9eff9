//! Bounded sleep-then-check polling.
//!
//! Restores and rollouts take minutes; the control plane only exposes
//! their progress through describe calls. `Poller` waits for a target
//! condition by sleeping a fixed interval and probing, up to an attempt
//! ceiling. The sleep comes before every probe, including the first:
//! nothing is ever ready immediately after the request that created it.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Outcome of a single readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The target condition holds.
    Ready,
    /// The target condition does not hold yet.
    NotReady,
    /// The probe itself failed (describe error mid-provisioning).
    /// Folded into not-ready by policy: transient control-plane errors
    /// during a wait never abort the wait.
    TransientError,
}

/// Fixed-interval, bounded-attempt poller.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
    max_attempts: u32,
}

impl Poller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Probe until `check` reports [`Readiness::Ready`], at most
    /// `max_attempts` times, sleeping `interval` before each probe.
    ///
    /// Returns `true` as soon as a probe reports ready and `false` once
    /// the attempt ceiling is reached. Exhaustion is not an error here;
    /// the caller decides whether a timeout is fatal.
    pub async fn wait_until<F, Fut>(&self, mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Readiness>,
    {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            match check().await {
                Readiness::Ready => {
                    debug!(attempt, "poll target reached");
                    return true;
                }
                Readiness::NotReady => {}
                Readiness::TransientError => {
                    debug!(attempt, "probe failed, treating as not ready");
                }
            }
        }
        false
    }
}
