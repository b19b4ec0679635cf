#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Multi-source stock analysis.
//!
//! # Example
//!
//! ```rust,ignore
//! use analyzer::{Config, StockAnalyzer, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> analyzer::Result<()> {
//!     let analyzer = StockAnalyzer::from_config(&Config::from_env())?;
//!
//!     let assessment = analyzer.comprehensive_analysis(&Symbol::new("AAPL")).await?;
//!     println!("{:?}", assessment.score);
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use analyzer_core::*;

// Cache implementations
pub use analyzer_cache::{MemoryCache, NoopCache};

// Providers
pub use analyzer_edgar::EdgarProvider;
pub use analyzer_fred::FredProvider;
pub use analyzer_polygon::{PolygonProvider, TickerMatch};
pub use analyzer_yahoo::YahooProvider;

// Computation
pub use analyzer_indicators::IndicatorSnapshot;
pub use analyzer_scoring::{Recommendation, ScoreBreakdown};

// Persistence
pub use analyzer_store::{AnalysisStore, Report, StockAnalysis};

mod config;
mod orchestrator;
mod resolve;

pub use config::{Config, DEFAULT_EDGAR_USER_AGENT};
pub use orchestrator::{
    EconomicDashboard, IndustrySeries, SectorPerformance, StockAnalyzer, StockAssessment,
};
