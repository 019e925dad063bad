//! Infrastructure layer for external integrations.
//!
//! Implements the interfaces the domain layer depends on.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`counter`] - Shared atomic counters for id block allocation
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod counter;
pub mod persistence;
