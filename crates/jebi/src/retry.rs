// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Fixed-count retry with constant backoff.
//!
//! Every failure is retried the same way until the attempt budget runs out;
//! the last error is returned unchanged. The backoff sleep suspends only the
//! calling task.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before every retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Three retries, one second apart.
    pub const fn new() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(1),
        }
    }

    /// A single attempt.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Set the retry count.
    pub const fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the backoff delay.
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts allowed.
    #[inline]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Run `op` until it succeeds or the retries are spent.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut remaining = self.max_retries;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if remaining > 0 => {
                    tracing::debug!(
                        error = %err,
                        retries_left = remaining,
                        backoff_ms = self.backoff.as_millis() as u64,
                        "retrying after failure"
                    );
                    remaining -= 1;
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
