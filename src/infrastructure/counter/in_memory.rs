//! Process-local counter for tests and local development.

use super::service::{BlockCounter, CounterResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A counter that lives in process memory.
///
/// Not durable and not shared between processes: two instances of the service
/// using it would hand out the same blocks. Only suitable for tests and a
/// single local process.
#[derive(Default)]
pub struct InMemoryBlockCounter {
    values: Mutex<HashMap<String, u64>>,
    increments: AtomicUsize,
}

impl InMemoryBlockCounter {
    /// Creates an empty counter; every key starts at `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter whose `key` already holds `value`.
    pub fn starting_at(key: &str, value: u64) -> Self {
        let counter = Self::new();
        counter.values.lock().insert(key.to_string(), value);
        counter
    }

    /// Number of increments served so far, across all keys.
    pub fn increments(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockCounter for InMemoryBlockCounter {
    async fn increment_and_get(&self, key: &str) -> CounterResult<u64> {
        let mut values = self.values.lock();
        let value = values.entry(key.to_string()).or_insert(0);
        *value += 1;
        self.increments.fetch_add(1, Ordering::SeqCst);
        Ok(*value)
    }

    async fn current(&self, key: &str) -> CounterResult<u64> {
        Ok(self.values.lock().get(key).copied().unwrap_or(0))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
