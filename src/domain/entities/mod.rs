//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures; orchestration lives in
//! [`crate::application::services`].
//!
//! # Entity Types
//!
//! - [`ShortUrl`] - A persisted short code to URL mapping
//! - [`NewShortUrl`] - Input for creating a [`ShortUrl`]

pub mod short_url;

pub use short_url::{NewShortUrl, ShortUrl};
