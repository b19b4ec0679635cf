#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Request cache implementations.
//!
//! This crate provides implementations of the [`RequestCache`] trait from
//! `analyzer-core`:
//!
//! - [`MemoryCache`] - in-memory TTL cache
//! - [`NoopCache`] - no-op cache that doesn't store anything

/// In-memory request cache.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use analyzer_core::cache::RequestCache;

// Re-export implementations
pub use memory::MemoryCache;
pub use noop::NoopCache;
