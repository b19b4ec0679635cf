#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for multi-source stock analysis.
//!
//! This crate provides the foundational abstractions:
//!
//! - [`DataProvider`](provider::DataProvider) - Base trait for all providers
//! - [`ReferenceProvider`](provider::ReferenceProvider) - Company profiles
//! - [`PriceProvider`](provider::PriceProvider) - Daily OHLCV history
//! - [`FundamentalProvider`](provider::FundamentalProvider) - Ratios and statements
//! - [`InsiderProvider`](provider::InsiderProvider) - Insider transactions
//! - [`EconomicProvider`](provider::EconomicProvider) - Macroeconomic series
//! - [`RequestCache`](cache::RequestCache) - TTL caching abstraction
//! - [`FixedDelay`](throttle::FixedDelay) - Pre-request rate limiting

/// Request cache trait, keys, and clock abstraction.
pub mod cache;
/// Error types for analysis operations.
pub mod error;
/// Provider traits for fetching financial data.
pub mod provider;
/// Fixed-delay rate limiting.
pub mod throttle;
/// Core data types (Symbol, PriceBar, CompanyProfile, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::{CacheKey, CachedValue, Clock, ManualClock, RequestCache, SystemClock};
pub use error::{AnalysisError, Result};
pub use provider::{
    DataProvider, EconomicProvider, FundamentalProvider, InsiderProvider, PriceProvider,
    ReferenceProvider,
};
pub use throttle::FixedDelay;
pub use types::{
    CompanyProfile, EconomicIndicatorKind, EconomicPoint, InsiderTransaction, PriceBar,
    RatioSnapshot, ReportPeriod, StatementRecord, StatementType, Symbol,
};
