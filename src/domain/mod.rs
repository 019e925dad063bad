//! Domain layer containing business entities and id allocation.
//!
//! Defines entities, repository interfaces and the block allocator,
//! independent of HTTP concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`allocator`] - Block-based unique id allocation
//!
//! # Shorten Flow
//!
//! 1. [`allocator::BlockAllocator`] hands out a unique id
//! 2. The id is encoded with [`crate::utils::base62`] unless a custom alias is given
//! 3. The record is persisted via [`repositories::ShortUrlRepository`]
//! 4. The mapping is written to the cache

pub mod allocator;
pub mod entities;
pub mod repositories;
