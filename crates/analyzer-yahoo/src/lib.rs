#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance data provider.
//!
//! This crate implements the [`PriceProvider`] and [`ReferenceProvider`]
//! traits from `analyzer-core` against Yahoo Finance's public endpoints:
//!
//! - Daily OHLCV data via the chart API
//! - Company profile fields via the quoteSummary assetProfile module
//!
//! # Example
//!
//! ```no_run
//! use analyzer_yahoo::YahooProvider;
//! use analyzer_core::{PriceProvider, Symbol};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> analyzer_core::Result<()> {
//! let provider = YahooProvider::new();
//! let symbol = Symbol::new("AAPL");
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
//!
//! let bars = provider.daily_prices(&symbol, start, end).await?;
//! println!("Fetched {} bars", bars.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use analyzer_core::{
    AnalysisError, CompanyProfile, DataProvider, FixedDelay, PriceBar, PriceProvider,
    ReferenceProvider, Result, Symbol,
};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Default pre-request delay.
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance data provider.
///
/// Implements [`PriceProvider`] and [`ReferenceProvider`].
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    throttle: FixedDelay,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with the default one-second
    /// pre-request delay.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_DELAY)
    }

    /// Create a provider with a custom pre-request delay.
    ///
    /// Tests pass `Duration::ZERO` to avoid sleeping.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            throttle: FixedDelay::new(delay),
        }
    }

    /// Build the chart API URL for a symbol and date range.
    fn build_chart_url(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or(0);

        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
            .unwrap_or(0);

        format!(
            "{}/{}?period1={}&period2={}&interval=1d&includeAdjustedClose=true",
            CHART_API_URL,
            symbol.as_str(),
            start_ts,
            end_ts,
        )
    }

    /// Parse a chart response into price bars, skipping rows with gaps.
    fn parse_chart_response(&self, symbol: &Symbol, response: ChartResponse) -> Result<Vec<PriceBar>> {
        let result = response
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::SymbolNotFound(symbol.to_string()))?;

        let timestamps = result.timestamp.unwrap_or_default();
        if timestamps.is_empty() {
            return Ok(Vec::new());
        }

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::Parse("Missing quote data".to_string()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let Some(date) = Utc.timestamp_opt(ts, 0).single().map(|dt| dt.date_naive()) else {
                continue;
            };
            // Yahoo pads rows with nulls on holidays and halts; drop them.
            if let (Some(open), Some(high), Some(low), Some(close)) = (
                value_at(&quote.open, i),
                value_at(&quote.high, i),
                value_at(&quote.low, i),
                value_at(&quote.close, i),
            ) {
                let volume = value_at(&quote.volume, i).map(|v| v as f64).unwrap_or(0.0);
                bars.push(PriceBar::new(date, open, high, low, close, volume));
            }
        }

        debug!(symbol = %symbol, bars = bars.len(), "parsed chart response");
        Ok(bars)
    }

    async fn fetch_quote_summary(&self, symbol: &Symbol) -> Result<QuoteSummaryResponse> {
        self.throttle.wait().await;

        let url = format!(
            "{}/{}?modules=assetProfile",
            QUOTE_SUMMARY_URL,
            symbol.as_str()
        );

        debug!("Fetching quote summary: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AnalysisError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(AnalysisError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        response
            .json::<QuoteSummaryResponse>()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance provider for daily OHLCV and company profile fields"
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn daily_prices(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        if start > end {
            return Err(AnalysisError::InvalidParameter(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        self.throttle.wait().await;

        let url = self.build_chart_url(symbol, start, end);
        debug!("Fetching OHLCV: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::RateLimited {
                provider: "Yahoo Finance".to_string(),
                retry_after: Some(Duration::from_secs(60)),
            });
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AnalysisError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(AnalysisError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        let chart_response: ChartResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        if let Some(error) = chart_response.chart.error {
            if error.code == "Not Found" {
                return Err(AnalysisError::SymbolNotFound(symbol.to_string()));
            }
            return Err(AnalysisError::Other(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        self.parse_chart_response(symbol, chart_response)
    }
}

#[async_trait]
impl ReferenceProvider for YahooProvider {
    async fn company_profile(&self, symbol: &Symbol) -> Result<Option<CompanyProfile>> {
        let summary = match self.fetch_quote_summary(symbol).await {
            Ok(summary) => summary,
            Err(AnalysisError::SymbolNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(result) = summary.quote_summary.result.into_iter().next() else {
            return Ok(None);
        };
        let Some(asset_profile) = result.asset_profile else {
            return Ok(None);
        };

        // The assetProfile module has no company name; the symbol stands in
        // and a merge from a richer source replaces it.
        let mut profile = CompanyProfile::new(symbol.clone(), symbol.as_str());
        profile.sector = asset_profile.sector;
        profile.industry = asset_profile.industry;
        profile.country = asset_profile.country;
        profile.website = asset_profile.website;
        profile.description = asset_profile.long_business_summary;
        profile.employee_count = asset_profile.full_time_employees;

        Ok(Some(profile))
    }
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Vec<ChartData>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Vec<QuoteSummaryData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
    website: Option<String>,
    long_business_summary: Option<String>,
    full_time_employees: Option<i64>,
}
