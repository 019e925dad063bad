//! Block-based id allocation.
//!
//! Ids are leased from a shared [`BlockCounter`] in blocks of `block_size`
//! consecutive integers. Counter value `n` (1-indexed) owns the range
//! `[(n - 1) * block_size, n * block_size - 1]`, so blocks handed to different
//! processes never overlap and only one remote call is made per block.
//!
//! Within one [`BlockAllocator`] ids are strictly increasing. Across processes
//! they are unique but not ordered.

use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{error, info};

use crate::infrastructure::counter::BlockCounter;

/// Number of ids leased per counter increment unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: NonZeroU64 = NonZeroU64::new(1000).unwrap();

/// Counter key shared by every allocator of a deployment.
pub const DEFAULT_COUNTER_KEY: &str = "global:block_counter";

/// Retries after a failed counter increment unless configured otherwise.
pub const DEFAULT_FETCH_RETRIES: usize = 3;

/// Errors returned by [`BlockAllocator::next_id`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocatorError {
    /// No usable block could be obtained. Usually the counter backend is down;
    /// the whole operation may be retried later.
    #[error("Id allocator exhausted: {reason}")]
    Exhausted { reason: String },
}

impl AllocatorError {
    fn exhausted(reason: impl Into<String>) -> Self {
        Self::Exhausted {
            reason: reason.into(),
        }
    }
}

/// A leased range of ids, `range_start..=range_end`, and the next one to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBlock {
    range_start: u64,
    range_end: u64,
    next_to_issue: u64,
}

impl IdBlock {
    /// Computes the block owned by counter value `block_number`.
    ///
    /// Returns `None` for block number `0` (counters start at 1) or when the
    /// range does not fit into `u64`.
    pub fn for_block_number(block_number: u64, block_size: NonZeroU64) -> Option<Self> {
        let size = block_size.get();
        let range_start = block_number.checked_sub(1)?.checked_mul(size)?;
        let range_end = block_number.checked_mul(size)?.checked_sub(1)?;

        Some(Self {
            range_start,
            range_end,
            next_to_issue: range_start,
        })
    }

    pub fn range_start(&self) -> u64 {
        self.range_start
    }

    pub fn range_end(&self) -> u64 {
        self.range_end
    }

    /// Returns true once every id of the block has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.next_to_issue > self.range_end
    }

    /// Ids still available in this block.
    pub fn remaining(&self) -> u64 {
        if self.is_exhausted() {
            0
        } else {
            self.range_end - self.next_to_issue + 1
        }
    }

    /// Hands out the cursor value and advances it.
    fn take(&mut self) -> Option<u64> {
        if self.is_exhausted() {
            return None;
        }
        let id = self.next_to_issue;
        // range_end < u64::MAX (see for_block_number), so this cannot overflow
        self.next_to_issue += 1;
        Some(id)
    }
}

/// Hands out unique ids to concurrent callers, one counter round-trip per block.
///
/// # Concurrency
///
/// The current block sits behind a synchronous mutex that is only held to move
/// the cursor, never across an `.await`. Refills go through `fetch_guard`: the
/// first caller to find the block exhausted takes the guard and fetches; callers
/// that arrive meanwhile queue on the guard and, once they get it, take an id
/// from the block that was just installed instead of fetching a second one.
/// If that fetch failed, the queued callers fail with the same reason without
/// touching the counter again.
pub struct BlockAllocator {
    counter: Arc<dyn BlockCounter>,
    counter_key: String,
    block_size: NonZeroU64,
    fetch_retries: usize,
    block: Mutex<Option<IdBlock>>,
    /// Number of completed fetch attempts. Only bumped while `fetch_guard` is held.
    fetch_epoch: AtomicU64,
    /// Guards refills and holds the failure of the latest attempt, if it failed.
    fetch_guard: tokio::sync::Mutex<Option<AllocatorError>>,
}

impl BlockAllocator {
    /// Creates an allocator in the empty state; the first call to
    /// [`Self::next_id`] fetches a block.
    pub fn new(counter: Arc<dyn BlockCounter>, block_size: NonZeroU64) -> Self {
        Self {
            counter,
            counter_key: DEFAULT_COUNTER_KEY.to_string(),
            block_size,
            fetch_retries: DEFAULT_FETCH_RETRIES,
            block: Mutex::new(None),
            fetch_epoch: AtomicU64::new(0),
            fetch_guard: tokio::sync::Mutex::new(None),
        }
    }

    /// Uses `key` instead of [`DEFAULT_COUNTER_KEY`] for the shared counter.
    pub fn with_counter_key(mut self, key: impl Into<String>) -> Self {
        self.counter_key = key.into();
        self
    }

    /// Sets how many times a failed counter increment is retried before
    /// [`AllocatorError::Exhausted`] is returned.
    pub fn with_fetch_retries(mut self, retries: usize) -> Self {
        self.fetch_retries = retries;
        self
    }

    pub fn block_size(&self) -> NonZeroU64 {
        self.block_size
    }

    pub fn counter_key(&self) -> &str {
        &self.counter_key
    }

    /// Returns a copy of the block currently held, if any.
    pub fn current_block(&self) -> Option<IdBlock> {
        *self.block.lock()
    }

    /// Returns the next id.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::Exhausted`] if the current block is used up and
    /// no new block could be obtained from the counter.
    pub async fn next_id(&self) -> Result<u64, AllocatorError> {
        if let Some(id) = self.try_take() {
            return Ok(id);
        }

        let seen_epoch = self.fetch_epoch.load(Ordering::Acquire);
        let mut last_failure = self.fetch_guard.lock().await;

        // A fetch that completed while we were queued may have refilled the block.
        if let Some(id) = self.try_take() {
            return Ok(id);
        }

        // ...or failed, in which case we share its outcome.
        if self.fetch_epoch.load(Ordering::Acquire) != seen_epoch
            && let Some(failure) = last_failure.as_ref()
        {
            return Err(failure.clone());
        }

        let outcome = self
            .fetch_block()
            .await
            .and_then(|fresh| self.install(fresh));

        *last_failure = outcome.as_ref().err().cloned();
        self.fetch_epoch.fetch_add(1, Ordering::Release);

        outcome
    }

    /// Installs a freshly fetched block and takes its first id.
    fn install(&self, fresh: IdBlock) -> Result<u64, AllocatorError> {
        let mut block = self.block.lock();
        if let Some(previous) = block.as_ref()
            && fresh.range_start <= previous.range_end
        {
            error!(
                "Counter went backwards: block {}..={} is not above {}..={}",
                fresh.range_start, fresh.range_end, previous.range_start, previous.range_end
            );
            return Err(AllocatorError::exhausted(
                "counter returned a block below the previous one",
            ));
        }

        let installed = block.insert(fresh);
        installed
            .take()
            .ok_or_else(|| AllocatorError::exhausted("fetched block is empty"))
    }

    fn try_take(&self) -> Option<u64> {
        self.block.lock().as_mut().and_then(IdBlock::take)
    }

    /// Increments the shared counter and turns the result into a block.
    async fn fetch_block(&self) -> Result<IdBlock, AllocatorError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(5)
            .max_delay(Duration::from_millis(500))
            .map(jitter)
            .take(self.fetch_retries);

        let block_number = Retry::start(strategy, || {
            self.counter.increment_and_get(&self.counter_key)
        })
        .await
        .map_err(|e| {
            error!("Failed to fetch id block from {}: {}", self.counter_key, e);
            AllocatorError::exhausted(e.to_string())
        })?;

        let block = IdBlock::for_block_number(block_number, self.block_size).ok_or_else(|| {
            error!(
                "Counter {} returned unusable block number {}",
                self.counter_key, block_number
            );
            AllocatorError::exhausted(format!("unusable block number {}", block_number))
        })?;

        counter!("id_blocks_fetched_total").increment(1);
        info!(
            "Fetched id block #{}: {}..={}",
            block_number, block.range_start, block.range_end
        );

        Ok(block)
    }
}
