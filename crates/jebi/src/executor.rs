// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Bounded worker pool
//!
//! Runs independent units of async work on the tokio runtime with a fixed
//! concurrency cap and a per-unit timeout. Each unit is its own task, so a
//! panic or timeout in one never touches its siblings.
//!
//! ## Usage
//!
//! ```ignore
//! let pool = WorkerPool::new(PoolConfig::new(4).with_timeout(Duration::from_secs(120)));
//! let outcomes = pool.run_all(chunks.into_iter().map(|c| run_chunk(c))).await;
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Number of threads the machine offers, at least 1.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Configuration for the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Units allowed to run at once; the rest queue.
    pub max_concurrency: usize,
    /// Ceiling on one unit's running time, counted from when it gets a slot.
    pub timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(default_parallelism())
    }
}

impl PoolConfig {
    /// Create a configuration with no timeout.
    pub const fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            timeout: None,
        }
    }

    /// Set the per-unit timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How one unit of work ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The unit finished and produced a value.
    Completed(T),
    /// The unit ran past the pool timeout; its partial work is dropped.
    TimedOut,
    /// The unit panicked or was cancelled.
    Failed(String),
}

impl<T> Outcome<T> {
    /// The value, if the unit completed.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the unit completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }
}

/// Worker pool with a concurrency cap and per-unit timeout.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Create a pool. A cap of zero is raised to one.
    pub fn new(config: PoolConfig) -> Self {
        let config = PoolConfig {
            max_concurrency: config.max_concurrency.max(1),
            ..config
        };
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
            config,
        }
    }

    /// The effective configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Free slots right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run every unit and return their outcomes in submission order.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run_all<T, Fut, I>(&self, units: I) -> Vec<Outcome<T>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = units
            .into_iter()
            .enumerate()
            .map(|(index, unit)| {
                let semaphore = Arc::clone(&self.semaphore);
                let limit = self.config.timeout;
                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return Outcome::Failed("worker pool closed".to_string());
                    };
                    match limit {
                        Some(limit) => match tokio::time::timeout(limit, unit).await {
                            Ok(value) => Outcome::Completed(value),
                            Err(_) => {
                                tracing::warn!(
                                    unit = index,
                                    timeout_ms = limit.as_millis() as u64,
                                    "unit timed out"
                                );
                                Outcome::TimedOut
                            }
                        },
                        None => Outcome::Completed(unit.await),
                    }
                })
            })
            .collect();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| {
                joined.unwrap_or_else(|err| {
                    tracing::warn!(unit = index, error = %err, "unit failed");
                    Outcome::Failed(err.to_string())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_pool_config() {
        let config = PoolConfig::new(4).with_timeout(Duration::from_secs(3));
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
        assert!(PoolConfig::default().max_concurrency >= 1);
    }

    #[test]
    fn test_zero_concurrency_is_raised() {
        let pool = WorkerPool::new(PoolConfig::new(0));
        assert_eq!(pool.config().max_concurrency, 1);
        assert_eq!(pool.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_outcomes_in_submission_order() {
        let pool = WorkerPool::new(PoolConfig::new(2));
        let outcomes = pool
            .run_all((0..5u64).map(|i| async move {
                tokio::time::sleep(Duration::from_millis(10 * (5 - i))).await;
                i * 10
            }))
            .await;

        let values: Vec<u64> = outcomes.into_iter().filter_map(Outcome::completed).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn test_concurrency_cap() {
        let pool = WorkerPool::new(PoolConfig::new(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let units = (0..8).map(|_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        });
        let outcomes = pool.run_all(units).await;

        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(Outcome::is_completed));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_isolates_unit() {
        let pool = WorkerPool::new(PoolConfig::new(4).with_timeout(Duration::from_secs(1)));
        let outcomes = pool
            .run_all((0..3u64).map(|i| async move {
                if i == 1 {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                i
            }))
            .await;

        assert_eq!(
            outcomes,
            vec![Outcome::Completed(0), Outcome::TimedOut, Outcome::Completed(2)]
        );
    }

    #[tokio::test]
    async fn test_panic_isolates_unit() {
        let pool = WorkerPool::new(PoolConfig::new(2));
        let outcomes = pool
            .run_all((0..3u32).map(|i| async move {
                if i == 0 {
                    panic!("boom");
                }
                i
            }))
            .await;

        assert!(matches!(outcomes[0], Outcome::Failed(_)));
        assert_eq!(outcomes[1], Outcome::Completed(1));
        assert_eq!(outcomes[2], Outcome::Completed(2));
    }
}
