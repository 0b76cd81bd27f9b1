//! Bounded existence polling after writes.

use std::time::Duration;

use tracing::debug;

use crate::backend::ObjectBackend;
use crate::error::{FacadeError, FacadeResult};
use crate::types::ObjectRef;

/// Parameters of the existence poll run after `put` and `copy`.
///
/// The defaults (5 seconds between checks, 20 checks) match the stock
/// `ObjectExists` waiter shipped with the AWS SDKs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between two existence checks.
    pub delay: Duration,
    /// Maximum number of existence checks.
    pub max_attempts: u32,
}

impl WaitConfig {
    /// Default delay between checks.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    /// Default number of checks.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

    /// Create a poll configuration.
    #[must_use]
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Block until `object` is visible, checking at most `config.max_attempts` times.
///
/// A failing existence check aborts the poll with that error.
pub async fn wait_until_exists(
    backend: &dyn ObjectBackend,
    object: &ObjectRef,
    config: &WaitConfig,
) -> FacadeResult<()> {
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if backend.head_object(object).await? {
            debug!(bucket = %object.bucket, key = %object.key, attempt, "object is visible");
            return Ok(());
        }
        if attempt < max_attempts {
            tokio::time::sleep(config.delay).await;
        }
    }

    Err(FacadeError::NotVisible {
        bucket: object.bucket.clone(),
        key: object.key.clone(),
        attempts: max_attempts,
    })
}
