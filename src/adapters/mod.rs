//! Adapters Layer
//!
//! Concrete implementations of the domain's outbound ports.

pub mod outbound;
