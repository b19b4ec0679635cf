//! The fallback orchestrator tying providers, cache, and store together.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use analyzer_cache::MemoryCache;
use analyzer_core::{
    AnalysisError, CacheKey, CachedValue, CompanyProfile, DataProvider, EconomicIndicatorKind,
    EconomicPoint, EconomicProvider, FundamentalProvider, InsiderProvider, InsiderTransaction,
    PriceBar, PriceProvider, RatioSnapshot, ReferenceProvider, ReportPeriod, RequestCache, Result,
    StatementRecord, Symbol,
};
use analyzer_edgar::EdgarProvider;
use analyzer_fred::{FredProvider, INDUSTRY_SERIES, SECTOR_SERIES, dashboard_series};
use analyzer_indicators::IndicatorSnapshot;
use analyzer_polygon::{PolygonProvider, TickerMatch};
use analyzer_scoring::{ScoreBreakdown, score};
use analyzer_store::{AnalysisStore, StockAnalysis};
use analyzer_yahoo::YahooProvider;
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::resolve::{resolve_first, resolve_list, resolve_merged};

/// Index symbol used as the beta reference.
const REFERENCE_INDEX: &str = "SPY";

/// Lookback window for price history and economic series.
const HISTORY_DAYS: u64 = 365;

/// Default request-cache TTL.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Insider rows fetched for a comprehensive analysis.
const INSIDER_LIMIT: usize = 10;

// ============================================================================
// Result types
// ============================================================================

/// Everything `comprehensive_analysis` could gather for one symbol.
///
/// Each leg is independently optional: a provider outage leaves a `None`
/// hole (or an empty list) rather than failing the whole analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAssessment {
    /// Analyzed symbol.
    pub symbol: Symbol,
    /// Date the analysis ran.
    pub as_of: NaiveDate,
    /// Company reference information.
    pub profile: Option<CompanyProfile>,
    /// Latest financial ratios.
    pub ratios: Option<RatioSnapshot>,
    /// Latest technical indicator snapshot.
    pub indicators: Option<IndicatorSnapshot>,
    /// Weighted investment score.
    pub score: Option<ScoreBreakdown>,
    /// Recent insider transactions.
    pub insider_transactions: Vec<InsiderTransaction>,
}

/// Latest values and one-year history for the dashboard indicators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EconomicDashboard {
    /// Most recent reported observation per indicator.
    pub latest: BTreeMap<EconomicIndicatorKind, EconomicPoint>,
    /// Full fetched history per indicator, oldest first.
    pub history: BTreeMap<EconomicIndicatorKind, Vec<EconomicPoint>>,
}

/// One industry activity gauge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustrySeries {
    /// Most recent reported value.
    pub current: Option<f64>,
    /// One-year history, oldest first.
    pub history: Vec<EconomicPoint>,
}

/// Period performance of one sector proxy series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorPerformance {
    /// Most recent reported value, 0 when the series was empty.
    pub value: f64,
    /// Percent change from the first to the last reported value over the
    /// window; 0 when the window start is missing or non-positive.
    pub change_pct: f64,
    /// One-year history, oldest first.
    pub history: Vec<EconomicPoint>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Multi-source stock analyzer with provider fallback.
///
/// Providers are held by role: EDGAR is the primary source for reference
/// and fundamental data, Polygon the secondary (and the primary for
/// prices), Yahoo the price fallback and profile gap-filler, FRED the
/// economic source. Every fetch goes through the request cache; results
/// are persisted to the store when one is configured.
pub struct StockAnalyzer {
    reference_primary: Option<Arc<dyn ReferenceProvider>>,
    reference_secondary: Option<Arc<dyn ReferenceProvider>>,
    reference_tertiary: Option<Arc<dyn ReferenceProvider>>,
    price_primary: Option<Arc<dyn PriceProvider>>,
    price_secondary: Option<Arc<dyn PriceProvider>>,
    fundamental_primary: Option<Arc<dyn FundamentalProvider>>,
    fundamental_secondary: Option<Arc<dyn FundamentalProvider>>,
    insider_primary: Option<Arc<dyn InsiderProvider>>,
    insider_secondary: Option<Arc<dyn InsiderProvider>>,
    economic: Option<Arc<dyn EconomicProvider>>,
    search: Option<Arc<PolygonProvider>>,
    cache: Arc<dyn RequestCache>,
    store: Option<Arc<AnalysisStore>>,
    cache_ttl: Duration,
    #[cfg(feature = "mock-data")]
    mock_economic: bool,
}

impl std::fmt::Debug for StockAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockAnalyzer")
            .field(
                "reference",
                &[
                    self.reference_primary.as_ref().map_or("-", |p| p.name()),
                    self.reference_secondary.as_ref().map_or("-", |p| p.name()),
                    self.reference_tertiary.as_ref().map_or("-", |p| p.name()),
                ],
            )
            .field(
                "prices",
                &[
                    self.price_primary.as_ref().map_or("-", |p| p.name()),
                    self.price_secondary.as_ref().map_or("-", |p| p.name()),
                ],
            )
            .field(
                "fundamentals",
                &[
                    self.fundamental_primary.as_ref().map_or("-", |p| p.name()),
                    self.fundamental_secondary.as_ref().map_or("-", |p| p.name()),
                ],
            )
            .field(
                "insiders",
                &[
                    self.insider_primary.as_ref().map_or("-", |p| p.name()),
                    self.insider_secondary.as_ref().map_or("-", |p| p.name()),
                ],
            )
            .field("economic", &self.economic.as_ref().map_or("-", |p| p.name()))
            .field("store", &self.store.as_ref().map(|_| "configured"))
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl Default for StockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StockAnalyzer {
    /// Creates an analyzer with no providers and an in-memory request
    /// cache; add sources with the `with_*` builder methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reference_primary: None,
            reference_secondary: None,
            reference_tertiary: None,
            price_primary: None,
            price_secondary: None,
            fundamental_primary: None,
            fundamental_secondary: None,
            insider_primary: None,
            insider_secondary: None,
            economic: None,
            search: None,
            cache: Arc::new(MemoryCache::new()),
            store: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            #[cfg(feature = "mock-data")]
            mock_economic: false,
        }
    }

    /// Builds an analyzer from configuration: EDGAR and Yahoo always,
    /// Polygon/FRED when keys are present, the store when a path is set.
    ///
    /// # Errors
    /// Returns an error if the store database cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut analyzer = Self::new()
            .with_edgar(&config.edgar_user_agent)
            .with_yahoo();
        if let Some(key) = &config.polygon_api_key {
            analyzer = analyzer.with_polygon(key);
        }
        if let Some(key) = &config.fred_api_key {
            analyzer = analyzer.with_fred(key);
        }
        if let Some(path) = &config.db_path {
            analyzer = analyzer.with_store(Arc::new(AnalysisStore::new(path)?));
        }
        Ok(analyzer)
    }

    /// Adds SEC EDGAR as the primary reference, fundamental, and insider
    /// source.
    #[must_use]
    pub fn with_edgar(mut self, user_agent: &str) -> Self {
        let provider = Arc::new(EdgarProvider::new(user_agent));
        self.reference_primary = Some(provider.clone());
        self.fundamental_primary = Some(provider.clone());
        self.insider_primary = Some(provider);
        self
    }

    /// Adds Polygon as the secondary reference/fundamental/insider source,
    /// the primary price source, and the ticker-search backend.
    #[must_use]
    pub fn with_polygon(mut self, api_key: &str) -> Self {
        let provider = Arc::new(PolygonProvider::new(api_key));
        self.reference_secondary = Some(provider.clone());
        self.fundamental_secondary = Some(provider.clone());
        self.insider_secondary = Some(provider.clone());
        self.price_primary = Some(provider.clone());
        self.search = Some(provider);
        self
    }

    /// Adds Yahoo Finance as the price fallback and profile gap-filler.
    #[must_use]
    pub fn with_yahoo(mut self) -> Self {
        let provider = Arc::new(YahooProvider::new());
        self.reference_tertiary = Some(provider.clone());
        self.price_secondary = Some(provider);
        self
    }

    /// Adds FRED as the economic series source.
    #[must_use]
    pub fn with_fred(mut self, api_key: &str) -> Self {
        self.economic = Some(Arc::new(FredProvider::new(api_key)));
        self
    }

    /// Replaces the request cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn RequestCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the persistence store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<AnalysisStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the request-cache TTL (default 5 minutes).
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Serves the economic dashboard from the deterministic offline
    /// generator instead of FRED.
    #[cfg(feature = "mock-data")]
    #[must_use]
    pub fn with_mock_economic(mut self) -> Self {
        self.mock_economic = true;
        self
    }

    // ========================================================================
    // Company data
    // ========================================================================

    /// Fetches the company profile with EDGAR-first fallback.
    ///
    /// Polygon fills fields EDGAR left empty; Yahoo backfills whatever is
    /// still missing, or supplies the whole profile when the first two
    /// sources found nothing. Returns `Ok(None)` when every source came
    /// up empty.
    ///
    /// # Errors
    /// Returns an error only on store failure; provider failures degrade
    /// to `None`.
    pub async fn company_profile(&self, symbol: &Symbol) -> Result<Option<CompanyProfile>> {
        let key = CacheKey::new("company_profile", symbol.as_str());
        if let Some(CachedValue::Profile(profile)) = self.cache.get(&key, self.cache_ttl) {
            debug!(symbol = %symbol, "company profile cache hit");
            return Ok(profile);
        }

        let mut profile = resolve_merged(
            "company_profile",
            self.reference_primary
                .as_ref()
                .map(|p| p.company_profile(symbol)),
            self.reference_secondary
                .as_ref()
                .map(|p| p.company_profile(symbol)),
            CompanyProfile::is_complete,
            CompanyProfile::merge_missing,
        )
        .await;

        // Yahoo backfills gaps neither EDGAR nor Polygon covered, and
        // stands in entirely when both came up empty.
        if let Some(tertiary) = &self.reference_tertiary
            && profile.as_ref().is_none_or(|p| !p.is_complete())
        {
            match tertiary.company_profile(symbol).await {
                Ok(Some(extra)) => match &mut profile {
                    Some(merged) => merged.merge_missing(&extra),
                    None => profile = Some(extra),
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "tertiary profile provider failed");
                }
            }
        }

        if let Some(store) = &self.store
            && let Some(profile) = &profile
        {
            store.upsert_company_profile(profile)?;
        }

        self.cache.put(key, CachedValue::Profile(profile.clone()));
        Ok(profile)
    }

    /// Fetches daily price bars, Polygon first, Yahoo as whole-series
    /// fallback. Returns an empty vector when every source failed.
    ///
    /// # Errors
    /// Returns an error when `start > end`.
    pub async fn price_history(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        if start > end {
            return Err(AnalysisError::InvalidParameter(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        let key = CacheKey::new("price_history", format!("{}|{}|{}", symbol, start, end));
        if let Some(CachedValue::Prices(bars)) = self.cache.get(&key, self.cache_ttl) {
            debug!(symbol = %symbol, "price history cache hit");
            return Ok(bars);
        }

        let bars = resolve_first(
            "price_history",
            self.price_primary
                .as_ref()
                .map(|p| p.daily_prices(symbol, start, end)),
            self.price_secondary
                .as_ref()
                .map(|p| p.daily_prices(symbol, start, end)),
        )
        .await;

        self.cache.put(key, CachedValue::Prices(bars.clone()));
        Ok(bars)
    }

    /// Fetches financial ratios, EDGAR-derived first, Polygon filling
    /// ratios EDGAR could not compute.
    ///
    /// # Errors
    /// Returns an error only on store failure.
    pub async fn financial_ratios(&self, symbol: &Symbol) -> Result<Option<RatioSnapshot>> {
        let key = CacheKey::new("financial_ratios", symbol.as_str());
        if let Some(CachedValue::Ratios(ratios)) = self.cache.get(&key, self.cache_ttl) {
            debug!(symbol = %symbol, "financial ratios cache hit");
            return Ok(ratios);
        }

        let ratios = resolve_merged(
            "financial_ratios",
            self.fundamental_primary
                .as_ref()
                .map(|p| p.financial_ratios(symbol)),
            self.fundamental_secondary
                .as_ref()
                .map(|p| p.financial_ratios(symbol)),
            RatioSnapshot::has_any_value,
            |primary: &mut RatioSnapshot, secondary: &RatioSnapshot| {
                if primary.profit_margin.is_none() {
                    primary.profit_margin = secondary.profit_margin;
                }
                if primary.roe.is_none() {
                    primary.roe = secondary.roe;
                }
                if primary.roa.is_none() {
                    primary.roa = secondary.roa;
                }
                if primary.debt_to_equity.is_none() {
                    primary.debt_to_equity = secondary.debt_to_equity;
                }
            },
        )
        .await;

        if let Some(store) = &self.store
            && let Some(ratios) = &ratios
        {
            store.upsert_valuation_metrics(ratios)?;
        }

        self.cache.put(key, CachedValue::Ratios(ratios.clone()));
        Ok(ratios)
    }

    /// Fetches financial statement periods, EDGAR first, Polygon as
    /// whole-result fallback, and persists them with provenance.
    ///
    /// # Errors
    /// Returns an error only on store failure.
    pub async fn financial_statements(
        &self,
        symbol: &Symbol,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<StatementRecord>> {
        let key = CacheKey::new(
            "financial_statements",
            format!("{}|{}|{}", symbol, period.as_str(), limit),
        );
        if let Some(CachedValue::Statements(records)) = self.cache.get(&key, self.cache_ttl) {
            debug!(symbol = %symbol, "financial statements cache hit");
            return Ok(records);
        }

        let records = resolve_first(
            "financial_statements",
            self.fundamental_primary
                .as_ref()
                .map(|p| p.financial_statements(symbol, period, limit)),
            self.fundamental_secondary
                .as_ref()
                .map(|p| p.financial_statements(symbol, period, limit)),
        )
        .await;

        if let Some(store) = &self.store {
            for record in &records {
                store.upsert_financial_statement(record)?;
            }
        }

        self.cache.put(key, CachedValue::Statements(records.clone()));
        Ok(records)
    }

    /// Fetches insider transactions. EDGAR's Form 4 metadata carries no
    /// share counts, so a list whose first row lacks them counts as
    /// incomplete and Polygon's richer rows replace it wholesale.
    ///
    /// # Errors
    /// Never fails currently; kept fallible for API consistency.
    pub async fn insider_transactions(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<InsiderTransaction>> {
        let key = CacheKey::new("insider_transactions", format!("{}|{}", symbol, limit));
        if let Some(CachedValue::Insiders(transactions)) = self.cache.get(&key, self.cache_ttl) {
            debug!(symbol = %symbol, "insider transactions cache hit");
            return Ok(transactions);
        }

        let transactions = resolve_list(
            "insider_transactions",
            self.insider_primary
                .as_ref()
                .map(|p| p.insider_transactions(symbol, limit)),
            self.insider_secondary
                .as_ref()
                .map(|p| p.insider_transactions(symbol, limit)),
            |rows: &[InsiderTransaction]| !rows.is_empty() && rows[0].shares.is_some(),
        )
        .await;

        self.cache
            .put(key, CachedValue::Insiders(transactions.clone()));
        Ok(transactions)
    }

    // ========================================================================
    // Computation
    // ========================================================================

    /// Computes the technical indicator snapshot from one year of daily
    /// bars, with beta against the reference index, and persists it.
    ///
    /// Returns `Ok(None)` when no price history was available.
    ///
    /// # Errors
    /// Returns an error only on store failure.
    pub async fn technical_indicators(&self, symbol: &Symbol) -> Result<Option<IndicatorSnapshot>> {
        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(end);

        let bars = self.price_history(symbol, start, end).await?;
        if bars.is_empty() {
            debug!(symbol = %symbol, "no price history, skipping indicators");
            return Ok(None);
        }

        let index_bars = if symbol.as_str() == REFERENCE_INDEX {
            bars.clone()
        } else {
            self.price_history(&Symbol::new(REFERENCE_INDEX), start, end)
                .await?
        };
        let index = (!index_bars.is_empty()).then_some(index_bars.as_slice());

        let snapshot = IndicatorSnapshot::compute(&bars, index);

        if let Some(snapshot) = &snapshot
            && let Some(store) = &self.store
        {
            store.upsert_technical_indicators(symbol, snapshot)?;
        }

        Ok(snapshot)
    }

    /// Computes and persists the weighted investment score.
    ///
    /// Returns `Ok(None)` when neither ratios nor indicators could be
    /// obtained; otherwise missing inputs score their components 0.
    ///
    /// # Errors
    /// Returns an error only on store failure.
    pub async fn investment_score(&self, symbol: &Symbol) -> Result<Option<ScoreBreakdown>> {
        let ratios = self.financial_ratios(symbol).await?;
        let indicators = self.technical_indicators(symbol).await?;

        if ratios.is_none() && indicators.is_none() {
            return Ok(None);
        }

        let date = indicators
            .as_ref()
            .map(|s| s.date)
            .or_else(|| ratios.as_ref().map(|r| r.date))
            .unwrap_or_else(|| Utc::now().date_naive());

        let breakdown = score(symbol.clone(), date, ratios.as_ref(), indicators.as_ref());

        if let Some(store) = &self.store {
            store.upsert_investment_score(&breakdown)?;
        }

        Ok(Some(breakdown))
    }

    // ========================================================================
    // Economic data
    // ========================================================================

    /// Builds the economic dashboard, preferring stored observations.
    ///
    /// When the store already holds data for every indicator it is served
    /// directly; otherwise series are fetched, persisted, and returned.
    ///
    /// # Errors
    /// Returns an error when no economic source is configured or the
    /// store fails.
    pub async fn economic_dashboard(&self) -> Result<EconomicDashboard> {
        if let Some(store) = &self.store
            && let Some(dashboard) = Self::stored_dashboard(store)?
        {
            debug!("economic dashboard served from store");
            return Ok(dashboard);
        }

        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(end);

        let mut dashboard = EconomicDashboard::default();
        for kind in EconomicIndicatorKind::ALL {
            let points = self.dashboard_points(kind, start, end).await?;

            if let Some(store) = &self.store {
                for point in &points {
                    store.upsert_economic_point(kind, *point)?;
                }
            }

            if let Some(latest) = points.iter().rev().find(|p| p.value.is_some()) {
                dashboard.latest.insert(kind, *latest);
            }
            dashboard.history.insert(kind, points);
        }

        Ok(dashboard)
    }

    fn stored_dashboard(store: &AnalysisStore) -> Result<Option<EconomicDashboard>> {
        let mut dashboard = EconomicDashboard::default();
        for kind in EconomicIndicatorKind::ALL {
            match store.latest_economic(kind)? {
                Some(latest) => {
                    dashboard.latest.insert(kind, latest);
                    dashboard.history.insert(kind, store.economic_history(kind)?);
                }
                None => return Ok(None),
            }
        }
        Ok(Some(dashboard))
    }

    async fn dashboard_points(
        &self,
        kind: EconomicIndicatorKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EconomicPoint>> {
        #[cfg(feature = "mock-data")]
        if self.mock_economic {
            return Ok(analyzer_fred::mock::generate_series(kind, end));
        }

        self.economic_series(dashboard_series(kind), start, end).await
    }

    /// Fetches one named economic series through the cache.
    async fn economic_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EconomicPoint>> {
        let Some(economic) = &self.economic else {
            return Err(AnalysisError::ProviderNotConfigured(
                "No economic data source configured".to_string(),
            ));
        };

        let key = CacheKey::new(
            "economic_series",
            format!("{}|{}|{}", series_id, start, end),
        );
        if let Some(CachedValue::Series(points)) = self.cache.get(&key, self.cache_ttl) {
            debug!(series_id, "economic series cache hit");
            return Ok(points);
        }

        let points = economic.series(series_id, start, end).await?;
        self.cache.put(key, CachedValue::Series(points.clone()));
        Ok(points)
    }

    /// Fetches the general industry activity gauges over the past year.
    ///
    /// Gauges whose series fail are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error when no economic source is configured.
    pub async fn industry_data(&self) -> Result<BTreeMap<String, IndustrySeries>> {
        if self.economic.is_none() {
            return Err(AnalysisError::ProviderNotConfigured(
                "No economic data source configured".to_string(),
            ));
        }

        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(end);

        let mut gauges = BTreeMap::new();
        for (name, series_id) in INDUSTRY_SERIES {
            match self.economic_series(series_id, start, end).await {
                Ok(points) => {
                    let current = points.iter().rev().find_map(|p| p.value);
                    gauges.insert(
                        (*name).to_string(),
                        IndustrySeries {
                            current,
                            history: points,
                        },
                    );
                }
                Err(e) => warn!(name, series_id, error = %e, "industry series failed"),
            }
        }
        Ok(gauges)
    }

    /// Fetches per-sector proxy series and their one-year percent change.
    ///
    /// Sectors whose series fail are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error when no economic source is configured.
    pub async fn sector_performance(&self) -> Result<BTreeMap<String, SectorPerformance>> {
        if self.economic.is_none() {
            return Err(AnalysisError::ProviderNotConfigured(
                "No economic data source configured".to_string(),
            ));
        }

        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(end);

        let mut sectors = BTreeMap::new();
        for (sector, series_id) in SECTOR_SERIES {
            match self.economic_series(series_id, start, end).await {
                Ok(points) => {
                    let values: Vec<f64> = points.iter().filter_map(|p| p.value).collect();
                    let value = values.last().copied().unwrap_or(0.0);
                    let change_pct = match (values.first(), values.last()) {
                        (Some(&first), Some(&last)) if first > 0.0 => {
                            (last - first) / first * 100.0
                        }
                        _ => 0.0,
                    };
                    sectors.insert(
                        (*sector).to_string(),
                        SectorPerformance {
                            value,
                            change_pct,
                            history: points,
                        },
                    );
                }
                Err(e) => warn!(sector, series_id, error = %e, "sector series failed"),
            }
        }
        Ok(sectors)
    }

    // ========================================================================
    // Search and aggregation
    // ========================================================================

    /// Searches for tickers matching a query via Polygon.
    ///
    /// # Errors
    /// Returns an error when Polygon is not configured or the query is
    /// empty.
    pub async fn search_companies(&self, query: &str, limit: usize) -> Result<Vec<TickerMatch>> {
        let Some(polygon) = &self.search else {
            return Err(AnalysisError::ProviderNotConfigured(
                "Ticker search requires Polygon".to_string(),
            ));
        };
        polygon.search_tickers(query, limit).await
    }

    /// Runs every analysis leg for a symbol, leaving `None` holes where
    /// data was unavailable.
    ///
    /// # Errors
    /// Returns an error only on store failure; no single provider outage
    /// aborts the analysis.
    pub async fn comprehensive_analysis(&self, symbol: &Symbol) -> Result<StockAssessment> {
        let profile = self.company_profile(symbol).await?;
        let ratios = self.financial_ratios(symbol).await?;
        let indicators = self.technical_indicators(symbol).await?;
        // Re-resolves ratios and indicators through the request cache.
        let score = self.investment_score(symbol).await?;
        let insider_transactions = self.insider_transactions(symbol, INSIDER_LIMIT).await?;

        Ok(StockAssessment {
            symbol: symbol.clone(),
            as_of: Utc::now().date_naive(),
            profile,
            ratios,
            indicators,
            score,
            insider_transactions,
        })
    }

    /// Runs a comprehensive analysis and attaches the result to a report.
    ///
    /// # Errors
    /// Returns an error when no store is configured, the report does not
    /// exist, or persistence fails.
    pub async fn analyze_for_report(
        &self,
        report_id: i64,
        symbol: &Symbol,
    ) -> Result<StockAnalysis> {
        let Some(store) = &self.store else {
            return Err(AnalysisError::Store(
                "No analysis store configured".to_string(),
            ));
        };

        let assessment = self.comprehensive_analysis(symbol).await?;
        let json =
            serde_json::to_value(&assessment).map_err(|e| AnalysisError::Parse(e.to_string()))?;
        store.add_stock_analysis(report_id, symbol, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct StubReference {
        profile: Option<CompanyProfile>,
        calls: AtomicUsize,
    }

    impl DataProvider for StubReference {
        fn name(&self) -> &str {
            "stub-reference"
        }
        fn description(&self) -> &str {
            "test reference provider"
        }
    }

    #[async_trait]
    impl ReferenceProvider for StubReference {
        async fn company_profile(&self, _symbol: &Symbol) -> Result<Option<CompanyProfile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.profile.clone())
        }
    }

    #[derive(Debug)]
    struct StubPrices {
        bars: Vec<PriceBar>,
    }

    impl DataProvider for StubPrices {
        fn name(&self) -> &str {
            "stub-prices"
        }
        fn description(&self) -> &str {
            "test price provider"
        }
    }

    #[async_trait]
    impl PriceProvider for StubPrices {
        async fn daily_prices(
            &self,
            _symbol: &Symbol,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>> {
            Ok(self.bars.clone())
        }
    }

    #[derive(Debug)]
    struct FailingPrices;

    impl DataProvider for FailingPrices {
        fn name(&self) -> &str {
            "failing-prices"
        }
        fn description(&self) -> &str {
            "always fails"
        }
    }

    #[async_trait]
    impl PriceProvider for FailingPrices {
        async fn daily_prices(
            &self,
            _symbol: &Symbol,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>> {
            Err(AnalysisError::Network("connection refused".to_string()))
        }
    }

    #[derive(Debug)]
    struct StubFundamentals {
        ratios: Option<RatioSnapshot>,
    }

    impl DataProvider for StubFundamentals {
        fn name(&self) -> &str {
            "stub-fundamentals"
        }
        fn description(&self) -> &str {
            "test fundamental provider"
        }
    }

    #[async_trait]
    impl FundamentalProvider for StubFundamentals {
        async fn financial_ratios(&self, _symbol: &Symbol) -> Result<Option<RatioSnapshot>> {
            Ok(self.ratios.clone())
        }

        async fn financial_statements(
            &self,
            _symbol: &Symbol,
            _period: ReportPeriod,
            _limit: usize,
        ) -> Result<Vec<StatementRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Debug)]
    struct StubInsiders {
        rows: Vec<InsiderTransaction>,
    }

    impl DataProvider for StubInsiders {
        fn name(&self) -> &str {
            "stub-insiders"
        }
        fn description(&self) -> &str {
            "test insider provider"
        }
    }

    #[async_trait]
    impl InsiderProvider for StubInsiders {
        async fn insider_transactions(
            &self,
            _symbol: &Symbol,
            _limit: usize,
        ) -> Result<Vec<InsiderTransaction>> {
            Ok(self.rows.clone())
        }
    }

    fn flat_bars(days: u64, price: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        (0..days)
            .map(|i| {
                let date = start.checked_add_days(Days::new(i)).unwrap();
                PriceBar::new(date, price, price, price, price, 1_000_000.0)
            })
            .collect()
    }

    fn incomplete_profile(symbol: &Symbol) -> CompanyProfile {
        let mut profile = CompanyProfile::new(symbol.clone(), "Apple Inc.");
        profile.sector = Some("Technology".to_string());
        profile
    }

    fn complete_profile(symbol: &Symbol) -> CompanyProfile {
        let mut profile = CompanyProfile::new(symbol.clone(), "Apple");
        profile.sector = Some("Tech".to_string());
        profile.industry = Some("Consumer Electronics".to_string());
        profile.description = Some("Designs and sells devices.".to_string());
        profile
    }

    #[tokio::test]
    async fn profile_merge_keeps_primary_fields() {
        let symbol = Symbol::new("AAPL");
        let mut analyzer = StockAnalyzer::new();
        analyzer.reference_primary = Some(Arc::new(StubReference {
            profile: Some(incomplete_profile(&symbol)),
            calls: AtomicUsize::new(0),
        }));
        analyzer.reference_secondary = Some(Arc::new(StubReference {
            profile: Some(complete_profile(&symbol)),
            calls: AtomicUsize::new(0),
        }));

        let profile = analyzer.company_profile(&symbol).await.unwrap().unwrap();

        // Primary's populated fields survive; gaps are filled.
        assert_eq!(profile.name, "Apple Inc.");
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.industry.as_deref(), Some("Consumer Electronics"));
        assert!(profile.is_complete());
    }

    #[tokio::test]
    async fn profile_falls_through_to_tertiary_when_others_empty() {
        let symbol = Symbol::new("AAPL");
        let mut analyzer = StockAnalyzer::new();
        analyzer.reference_primary = Some(Arc::new(StubReference {
            profile: None,
            calls: AtomicUsize::new(0),
        }));
        analyzer.reference_secondary = Some(Arc::new(StubReference {
            profile: None,
            calls: AtomicUsize::new(0),
        }));
        let tertiary = Arc::new(StubReference {
            profile: Some(complete_profile(&symbol)),
            calls: AtomicUsize::new(0),
        });
        analyzer.reference_tertiary = Some(tertiary.clone());

        let profile = analyzer.company_profile(&symbol).await.unwrap().unwrap();

        assert_eq!(tertiary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(profile.name, "Apple");
        assert!(profile.is_complete());
    }

    #[tokio::test]
    async fn profile_is_cached_within_ttl() {
        let symbol = Symbol::new("AAPL");
        let primary = Arc::new(StubReference {
            profile: Some(complete_profile(&symbol)),
            calls: AtomicUsize::new(0),
        });
        let mut analyzer = StockAnalyzer::new();
        analyzer.reference_primary = Some(primary.clone());

        analyzer.company_profile(&symbol).await.unwrap();
        analyzer.company_profile(&symbol).await.unwrap();

        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn price_history_falls_back_on_primary_failure() {
        let symbol = Symbol::new("AAPL");
        let mut analyzer = StockAnalyzer::new();
        analyzer.price_primary = Some(Arc::new(FailingPrices));
        analyzer.price_secondary = Some(Arc::new(StubPrices {
            bars: flat_bars(5, 100.0),
        }));

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let bars = analyzer.price_history(&symbol, start, end).await.unwrap();
        assert_eq!(bars.len(), 5);
    }

    #[tokio::test]
    async fn price_history_rejects_inverted_range() {
        let analyzer = StockAnalyzer::new();
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(
            analyzer
                .price_history(&Symbol::new("AAPL"), start, end)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn insiders_without_shares_replaced_by_secondary() {
        let symbol = Symbol::new("AAPL");
        let mut analyzer = StockAnalyzer::new();
        analyzer.insider_primary = Some(Arc::new(StubInsiders {
            rows: vec![InsiderTransaction {
                insider_name: "Unknown".to_string(),
                transaction_type: "form_4".to_string(),
                ..Default::default()
            }],
        }));
        analyzer.insider_secondary = Some(Arc::new(StubInsiders {
            rows: vec![InsiderTransaction {
                insider_name: "Jane Roe".to_string(),
                shares: Some(1_000.0),
                ..Default::default()
            }],
        }));

        let rows = analyzer.insider_transactions(&symbol, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].insider_name, "Jane Roe");
    }

    #[tokio::test]
    async fn flat_series_produces_saturated_snapshot() {
        let symbol = Symbol::new("AAPL");
        let store = Arc::new(AnalysisStore::in_memory().unwrap());
        let mut analyzer = StockAnalyzer::new().with_store(store.clone());
        analyzer.price_primary = Some(Arc::new(StubPrices {
            bars: flat_bars(250, 100.0),
        }));

        let snapshot = analyzer
            .technical_indicators(&symbol)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.sma_20, Some(100.0));
        assert_eq!(snapshot.sma_200, Some(100.0));
        assert_eq!(snapshot.rsi_14, Some(100.0));
        // Same flat series serves as the index, so variance is zero.
        assert_eq!(snapshot.beta, None);

        let stored = store.latest_technical_indicators(&symbol).unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn investment_score_is_computed_and_persisted() {
        let symbol = Symbol::new("AAPL");
        let store = Arc::new(AnalysisStore::in_memory().unwrap());
        let mut analyzer = StockAnalyzer::new().with_store(store.clone());

        let mut ratios = RatioSnapshot::new(
            symbol.clone(),
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            "stub-fundamentals",
        );
        ratios.profit_margin = Some(0.25);
        ratios.roe = Some(1.5);
        ratios.debt_to_equity = Some(0.4);
        analyzer.fundamental_primary = Some(Arc::new(StubFundamentals {
            ratios: Some(ratios),
        }));

        let breakdown = analyzer.investment_score(&symbol).await.unwrap().unwrap();
        assert_eq!(breakdown.valuation_score, 100.0);
        assert_eq!(breakdown.financial_health_score, 100.0);

        let stored = store.latest_investment_score(&symbol).unwrap().unwrap();
        assert_eq!(stored.recommendation, breakdown.recommendation);
    }

    #[tokio::test]
    async fn score_is_none_when_nothing_is_available() {
        let analyzer = StockAnalyzer::new();
        let result = analyzer
            .investment_score(&Symbol::new("AAPL"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn dashboard_served_from_store_without_economic_source() {
        let store = Arc::new(AnalysisStore::in_memory().unwrap());
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for kind in EconomicIndicatorKind::ALL {
            store
                .upsert_economic_point(
                    kind,
                    EconomicPoint {
                        date,
                        value: Some(1.0),
                    },
                )
                .unwrap();
        }

        let analyzer = StockAnalyzer::new().with_store(store);
        let dashboard = analyzer.economic_dashboard().await.unwrap();

        assert_eq!(dashboard.latest.len(), 5);
        assert_eq!(
            dashboard.latest[&EconomicIndicatorKind::Gdp].value,
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn dashboard_without_any_source_is_an_error() {
        let analyzer = StockAnalyzer::new();
        assert!(analyzer.economic_dashboard().await.is_err());
    }

    #[tokio::test]
    async fn search_requires_polygon() {
        let analyzer = StockAnalyzer::new();
        assert!(analyzer.search_companies("apple", 10).await.is_err());
    }

    #[tokio::test]
    async fn report_analysis_roundtrip() {
        let symbol = Symbol::new("AAPL");
        let store = Arc::new(AnalysisStore::in_memory().unwrap());
        let mut analyzer = StockAnalyzer::new().with_store(store.clone());
        analyzer.price_primary = Some(Arc::new(StubPrices {
            bars: flat_bars(250, 100.0),
        }));

        let report = store.create_report("Watchlist", "list", None).unwrap();
        let analysis = analyzer
            .analyze_for_report(report.id, &symbol)
            .await
            .unwrap();

        assert_eq!(analysis.report_id, report.id);
        assert_eq!(store.list_analyses(report.id).unwrap().len(), 1);
        // The indicator leg made it into the persisted JSON.
        assert!(analysis.analysis["indicators"]["rsi_14"].is_number());
    }
}
