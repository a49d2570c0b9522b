//! Infrastructure Layer
//!
//! Cross-cutting concerns backing the domain: the live-handle cache.

pub mod handle_cache;

pub use handle_cache::{HandleCache, DEFAULT_TTL};
