//! Utility functions shared across layers.
//!
//! - [`base62`] - Reversible encoding of numeric ids into short codes

pub mod base62;
