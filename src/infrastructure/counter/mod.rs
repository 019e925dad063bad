//! Shared atomic counters backing id block allocation.
//!
//! Provides a [`BlockCounter`] trait with three implementations:
//! - [`RedisBlockCounter`] - Production counter using Redis `INCR`
//! - [`PgBlockCounter`] - Counter row in PostgreSQL, used when Redis is not configured
//! - [`InMemoryBlockCounter`] - Process-local counter for tests and local development

mod in_memory;
mod pg_counter;
mod redis_counter;
mod service;

pub use in_memory::InMemoryBlockCounter;
pub use pg_counter::PgBlockCounter;
pub use redis_counter::RedisBlockCounter;
pub use service::{BlockCounter, CounterError, CounterResult};

#[cfg(test)]
pub use service::MockBlockCounter;
