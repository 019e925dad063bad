//! Application layer services implementing business logic.
//!
//! Services coordinate the allocator, repositories and cache, and give HTTP
//! handlers and the admin CLI a small API to call.
//!
//! # Available Services
//!
//! - [`services::short_url_service::ShortUrlService`] - Short URL creation and resolution

pub mod services;
