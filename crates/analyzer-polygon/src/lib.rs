#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Polygon.io data provider.
//!
//! Implements the provider traits from `analyzer-core` against the Polygon
//! REST API:
//!
//! - Ticker details for company profiles
//! - Daily aggregate bars for price history
//! - Quarterly financials for ratio derivation and statement records
//! - Insider transactions
//! - Ticker search

use analyzer_core::{
    AnalysisError, CompanyProfile, DataProvider, FixedDelay, FundamentalProvider, InsiderProvider,
    InsiderTransaction, PriceBar, PriceProvider, RatioSnapshot, ReferenceProvider, ReportPeriod,
    Result, StatementRecord, StatementType, Symbol,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Base URL for the Polygon REST API.
const POLYGON_BASE_URL: &str = "https://api.polygon.io";

/// Default pre-request delay for most endpoints.
const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// Default pre-request delay for the financials endpoint, which has a
/// tighter free-tier budget.
const FINANCIALS_DELAY: Duration = Duration::from_secs(4);

/// Polygon.io data provider.
#[derive(Clone)]
pub struct PolygonProvider {
    client: Client,
    api_key: String,
    throttle: FixedDelay,
    financials_throttle: FixedDelay,
}

impl fmt::Debug for PolygonProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonProvider")
            .field("api_key", &"[REDACTED]")
            .field("throttle", &self.throttle)
            .field("financials_throttle", &self.financials_throttle)
            .finish()
    }
}

impl PolygonProvider {
    /// Create a new Polygon provider with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_delays(api_key, DEFAULT_DELAY, FINANCIALS_DELAY)
    }

    /// Create a provider with custom pre-request delays.
    ///
    /// Tests pass `Duration::ZERO` to avoid sleeping.
    #[must_use]
    pub fn with_delays(
        api_key: impl Into<String>,
        delay: Duration,
        financials_delay: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            throttle: FixedDelay::new(delay),
            financials_throttle: FixedDelay::new(financials_delay),
        }
    }

    /// Build a URL with the API key appended.
    fn url(&self, endpoint: &str) -> String {
        if endpoint.contains('?') {
            format!("{POLYGON_BASE_URL}/{endpoint}&apiKey={}", self.api_key)
        } else {
            format!("{POLYGON_BASE_URL}/{endpoint}?apiKey={}", self.api_key)
        }
    }

    /// Make a throttled GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        throttle: &FixedDelay,
    ) -> Result<T> {
        throttle.wait().await;

        let url = self.url(endpoint);
        debug!("Polygon request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::RateLimited {
                provider: "Polygon".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Network(format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| AnalysisError::Parse(format!("{e}: {text}")))
    }

    /// Like [`Self::get`], but treats 404 and key-entitlement failures
    /// (401/403) as "no data" rather than errors.
    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        throttle: &FixedDelay,
    ) -> Result<Option<T>> {
        throttle.wait().await;

        let url = self.url(endpoint);
        debug!("Polygon request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AnalysisError::RateLimited {
                    provider: "Polygon".to_string(),
                    retry_after: None,
                });
            }
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Polygon returned {} for {}", response.status(), endpoint);
                return Ok(None);
            }
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(AnalysisError::Network(format!("HTTP {status}: {text}")));
            }
            _ => {}
        }

        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AnalysisError::Parse(format!("{e}: {text}")))
    }

    async fn fetch_financials(
        &self,
        symbol: &Symbol,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<FinancialsResult>> {
        let timeframe = match period {
            ReportPeriod::Annual => "annual",
            ReportPeriod::Quarterly => "quarterly",
        };
        let endpoint = format!(
            "vX/reference/financials?ticker={}&timeframe={}&limit={}",
            symbol, timeframe, limit
        );
        let response: Option<FinancialsResponse> = self
            .get_optional(&endpoint, &self.financials_throttle)
            .await?;
        Ok(response.map(|r| r.results).unwrap_or_default())
    }

    /// Search for tickers matching a query string.
    pub async fn search_tickers(&self, query: &str, limit: usize) -> Result<Vec<TickerMatch>> {
        if query.trim().is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "Empty search query".to_string(),
            ));
        }

        let endpoint = format!(
            "v3/reference/tickers?search={}&active=true&market=stocks&limit={}",
            query, limit
        );
        let response: TickersResponse = self.get(&endpoint, &self.throttle).await?;

        Ok(response
            .results
            .into_iter()
            .map(|r| TickerMatch {
                symbol: Symbol::new(r.ticker),
                name: r.name,
                primary_exchange: r.primary_exchange,
                market: r.market,
                locale: r.locale,
            })
            .collect())
    }
}

impl DataProvider for PolygonProvider {
    fn name(&self) -> &str {
        "Polygon"
    }

    fn description(&self) -> &str {
        "Polygon.io provider for aggregates, reference data, financials, and insider activity"
    }
}

#[async_trait]
impl ReferenceProvider for PolygonProvider {
    async fn company_profile(&self, symbol: &Symbol) -> Result<Option<CompanyProfile>> {
        let endpoint = format!("v3/reference/tickers/{}", symbol);
        let response: Option<TickerDetailsResponse> =
            self.get_optional(&endpoint, &self.throttle).await?;
        let Some(details) = response.map(|r| r.results) else {
            return Ok(None);
        };

        let mut profile = CompanyProfile::new(symbol.clone(), details.name);
        profile.description = details.description;
        profile.industry = details.sic_description;
        profile.website = details.homepage_url;
        profile.logo_url = details.branding.and_then(|b| b.logo_url);
        profile.employee_count = details.total_employees;
        profile.market_cap = details.market_cap;
        profile.country = details.locale.map(|l| l.to_uppercase());

        Ok(Some(profile))
    }
}

#[async_trait]
impl PriceProvider for PolygonProvider {
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

        let endpoint = format!(
            "v2/aggs/ticker/{}/range/1/day/{}/{}?adjusted=true&sort=asc&limit=50000",
            symbol, start, end
        );
        let response: Option<AggsResponse> = self.get_optional(&endpoint, &self.throttle).await?;

        let results = response.and_then(|r| r.results).unwrap_or_default();
        let bars: Vec<PriceBar> = results
            .into_iter()
            .filter_map(|agg| {
                let date = DateTime::from_timestamp_millis(agg.t)?.date_naive();
                Some(PriceBar::new(date, agg.o, agg.h, agg.l, agg.c, agg.v))
            })
            .collect();

        debug!(symbol = %symbol, bars = bars.len(), "fetched daily aggregates");
        Ok(bars)
    }
}

#[async_trait]
impl FundamentalProvider for PolygonProvider {
    async fn financial_ratios(&self, symbol: &Symbol) -> Result<Option<RatioSnapshot>> {
        let results = self
            .fetch_financials(symbol, ReportPeriod::Quarterly, 4)
            .await?;

        // Most recent period with an income statement wins.
        let Some(period) = results
            .iter()
            .find(|r| r.financials.income_statement.is_some())
        else {
            return Ok(None);
        };

        let income = period.financials.income_statement.as_ref();
        let balance = period.financials.balance_sheet.as_ref();

        let revenue = line_item(income, "revenues");
        let net_income = line_item(income, "net_income_loss");
        let assets = line_item(balance, "assets");
        let equity = line_item(balance, "equity");
        let liabilities = line_item(balance, "liabilities");

        let date = period
            .end_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let mut snapshot = RatioSnapshot::new(symbol.clone(), date, self.name());
        if let (Some(ni), Some(rev)) = (net_income, revenue)
            && rev > 0.0
        {
            snapshot.profit_margin = Some(ni / rev);
        }
        if let (Some(ni), Some(eq)) = (net_income, equity)
            && eq > 0.0
        {
            snapshot.roe = Some(ni / eq);
        }
        if let (Some(ni), Some(total)) = (net_income, assets)
            && total > 0.0
        {
            snapshot.roa = Some(ni / total);
        }
        if let (Some(liab), Some(eq)) = (liabilities, equity)
            && eq > 0.0
        {
            snapshot.debt_to_equity = Some(liab / eq);
        }

        if snapshot.has_any_value() {
            Ok(Some(snapshot))
        } else {
            Ok(None)
        }
    }

    async fn financial_statements(
        &self,
        symbol: &Symbol,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<StatementRecord>> {
        let results = self.fetch_financials(symbol, period, limit).await?;

        let mut records = Vec::with_capacity(results.len() * 3);
        for result in results {
            let fiscal_year = result
                .fiscal_year
                .as_deref()
                .and_then(|y| y.parse::<i32>().ok())
                .unwrap_or(0);
            let fiscal_period = result.fiscal_period.clone().unwrap_or_default();
            let filing_date = result
                .filing_date
                .as_deref()
                .or(result.end_date.as_deref())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .unwrap_or_else(|| chrono::Utc::now().date_naive());

            let sections = [
                (
                    StatementType::Income,
                    result.financials.income_statement.as_ref(),
                ),
                (
                    StatementType::Balance,
                    result.financials.balance_sheet.as_ref(),
                ),
                (
                    StatementType::CashFlow,
                    result.financials.cash_flow_statement.as_ref(),
                ),
            ];
            for (statement_type, section) in sections {
                let Some(section) = section else {
                    continue;
                };
                records.push(StatementRecord {
                    symbol: symbol.clone(),
                    statement_type,
                    period,
                    fiscal_year,
                    fiscal_period: fiscal_period.clone(),
                    filing_date,
                    data: section_to_json(section, result.end_date.as_deref()),
                    source: self.name().to_string(),
                });
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl InsiderProvider for PolygonProvider {
    async fn insider_transactions(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<InsiderTransaction>> {
        let endpoint = format!(
            "vX/reference/insider-transactions?ticker={}&limit={}",
            symbol, limit
        );
        let response: Option<InsiderResponse> =
            self.get_optional(&endpoint, &self.throttle).await?;

        let Some(response) = response else {
            warn!(symbol = %symbol, "insider transactions unavailable for this API key");
            return Ok(Vec::new());
        };

        Ok(response
            .results
            .into_iter()
            .map(|r| {
                let total_value = match (r.shares, r.price_per_share) {
                    (Some(shares), Some(price)) => Some(shares * price),
                    _ => None,
                };
                InsiderTransaction {
                    insider_name: r.name.unwrap_or_else(|| "Unknown".to_string()),
                    position: r.position.unwrap_or_else(|| "Unknown".to_string()),
                    transaction_type: r.transaction_type.unwrap_or_default(),
                    transaction_date: r
                        .transaction_date
                        .as_deref()
                        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
                    shares: r.shares,
                    price_per_share: r.price_per_share,
                    total_value,
                }
            })
            .collect())
    }
}

fn line_item(section: Option<&StatementSection>, key: &str) -> Option<f64> {
    section.and_then(|s| s.get(key)).and_then(|item| item.value)
}

fn section_to_json(section: &StatementSection, end_date: Option<&str>) -> Value {
    let mut data = Map::new();
    if let Some(end) = end_date {
        data.insert("period_end".to_string(), Value::String(end.to_string()));
    }
    for (key, item) in section {
        if let Some(value) = item.value
            && let Some(number) = serde_json::Number::from_f64(value)
        {
            data.insert(key.clone(), Value::Number(number));
        }
    }
    Value::Object(data)
}

/// A ticker search match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerMatch {
    /// Matched symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Primary listing exchange, when reported.
    pub primary_exchange: Option<String>,
    /// Market classification (e.g. "stocks").
    pub market: Option<String>,
    /// Listing locale (e.g. "us").
    pub locale: Option<String>,
}

// =============================================================================
// Polygon API Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Deserialize)]
struct TickerDetails {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    sic_description: Option<String>,
    #[serde(default)]
    homepage_url: Option<String>,
    #[serde(default)]
    total_employees: Option<i64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    branding: Option<Branding>,
}

#[derive(Debug, Deserialize)]
struct Branding {
    #[serde(default)]
    logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    results: Option<Vec<AggBar>>,
}

/// One aggregate bar. Field names follow Polygon's single-letter schema.
#[derive(Debug, Deserialize)]
struct AggBar {
    /// Start timestamp in Unix milliseconds.
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

#[derive(Debug, Deserialize)]
struct FinancialsResponse {
    #[serde(default)]
    results: Vec<FinancialsResult>,
}

#[derive(Debug, Deserialize)]
struct FinancialsResult {
    #[serde(default)]
    fiscal_year: Option<String>,
    #[serde(default)]
    fiscal_period: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    filing_date: Option<String>,
    financials: Financials,
}

type StatementSection = HashMap<String, LineItem>;

#[derive(Debug, Deserialize)]
struct Financials {
    #[serde(default)]
    income_statement: Option<StatementSection>,
    #[serde(default)]
    balance_sheet: Option<StatementSection>,
    #[serde(default)]
    cash_flow_statement: Option<StatementSection>,
}

#[derive(Debug, Deserialize)]
struct LineItem {
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct InsiderResponse {
    #[serde(default)]
    results: Vec<InsiderResult>,
}

#[derive(Debug, Deserialize)]
struct InsiderResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    transaction_type: Option<String>,
    #[serde(default)]
    transaction_date: Option<String>,
    #[serde(default)]
    shares: Option<f64>,
    #[serde(default)]
    price_per_share: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TickersResponse {
    #[serde(default)]
    results: Vec<TickerSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TickerSearchResult {
    ticker: String,
    name: String,
    #[serde(default)]
    primary_exchange: Option<String>,
    #[serde(default)]
    market: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
