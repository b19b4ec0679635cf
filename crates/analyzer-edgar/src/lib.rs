#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR data provider.
//!
//! This crate provides access to SEC EDGAR data including:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - Company profiles from submissions metadata
//! - XBRL company facts parsing for ratios and statements
//! - Form 4 insider filing activity
//!
//! # Example
//!
//! ```no_run
//! use analyzer_edgar::EdgarProvider;
//! use analyzer_core::{FundamentalProvider, ReferenceProvider, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = EdgarProvider::new("MyApp/1.0 (contact@example.com)");
//!
//!     let symbol = Symbol::new("AAPL");
//!     if let Some(profile) = provider.company_profile(&symbol).await? {
//!         println!("Company: {} ({:?})", profile.name, profile.industry);
//!     }
//!
//!     if let Some(ratios) = provider.financial_ratios(&symbol).await? {
//!         println!("ROE: {:?}", ratios.roe);
//!     }
//!
//!     Ok(())
//! }
//! ```

use analyzer_core::{
    AnalysisError, CompanyProfile, DataProvider, FixedDelay, FundamentalProvider, InsiderProvider,
    InsiderTransaction, RatioSnapshot, ReferenceProvider, ReportPeriod, Result, StatementRecord,
    StatementType, Symbol,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default pre-request delay for EDGAR endpoints.
const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// SEC EDGAR data provider.
///
/// Provides company reference data, fundamentals, and insider filing
/// activity. Sleeps for a fixed interval before every request to stay well
/// inside the SEC's published limits.
#[derive(Debug)]
pub struct EdgarProvider {
    client: reqwest::Client,
    throttle: FixedDelay,
    #[allow(dead_code)]
    user_agent: String,
}

impl EdgarProvider {
    /// Create a new EDGAR provider with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self::with_delay(user_agent, DEFAULT_DELAY)
    }

    /// Create a provider with a custom pre-request delay.
    ///
    /// Tests pass `Duration::ZERO` to avoid sleeping.
    #[must_use]
    pub fn with_delay(user_agent: &str, delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            throttle: FixedDelay::new(delay),
            user_agent: user_agent.to_string(),
        }
    }

    /// Look up a company's CIK number from its ticker symbol.
    ///
    /// # Returns
    /// The company's CIK number as a zero-padded 10-digit string
    pub async fn get_cik(&self, ticker: &str) -> Result<String> {
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidParameter("Empty ticker".to_string()));
        }

        let ticker_upper = ticker.to_uppercase();

        self.throttle.wait().await;

        debug!("Fetching company tickers from SEC");
        let response = self
            .client
            .get(COMPANY_TICKERS_URL)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Network(format!(
                "Failed to fetch company tickers: HTTP {}",
                response.status()
            )));
        }

        let data: HashMap<String, CompanyTickerInfo> = response.json().await.map_err(|e| {
            AnalysisError::Parse(format!("Failed to parse company tickers: {}", e))
        })?;

        for company in data.values() {
            if company.ticker.to_uppercase() == ticker_upper {
                // CIK is zero-padded to 10 digits in API paths
                let cik = format!("{:0>10}", company.cik_str);
                debug!("Found CIK {} for ticker {}", cik, ticker);
                return Ok(cik);
            }
        }

        Err(AnalysisError::SymbolNotFound(ticker.to_string()))
    }

    async fn fetch_company_facts(&self, cik: &str) -> Result<CompanyFactsResponse> {
        let cik_padded = format!("{:0>10}", cik);

        self.throttle.wait().await;

        let url = format!(
            "{}/api/xbrl/companyfacts/CIK{}.json",
            EDGAR_BASE_URL, cik_padded
        );

        debug!("Fetching company facts from {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Network(format!(
                "Failed to fetch company facts for CIK {}: HTTP {}",
                cik_padded,
                response.status()
            )));
        }

        let facts: CompanyFactsResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(format!("Failed to parse company facts: {}", e)))?;

        Ok(facts)
    }

    async fn fetch_company_submissions(&self, cik: &str) -> Result<CompanySubmissions> {
        let cik_padded = format!("{:0>10}", cik);

        self.throttle.wait().await;

        let url = format!("{}/submissions/CIK{}.json", EDGAR_BASE_URL, cik_padded);

        debug!("Fetching company submissions from {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Network(format!(
                "Failed to fetch company submissions for CIK {}: HTTP {}",
                cik_padded,
                response.status()
            )));
        }

        let submissions: CompanySubmissions = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(format!("Failed to parse submissions: {}", e)))?;

        Ok(submissions)
    }
}

impl DataProvider for EdgarProvider {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR provider for company reference data, XBRL fundamentals, and Form 4 filings"
    }
}

#[async_trait]
impl ReferenceProvider for EdgarProvider {
    async fn company_profile(&self, symbol: &Symbol) -> Result<Option<CompanyProfile>> {
        let cik = match self.get_cik(symbol.as_str()).await {
            Ok(cik) => cik,
            Err(AnalysisError::SymbolNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let submissions = self.fetch_company_submissions(&cik).await?;

        let mut profile = CompanyProfile::new(symbol.clone(), &submissions.name);
        profile.industry = submissions.sic_description.clone();
        profile.sector = sector_from_sic(
            submissions.sic.as_deref(),
            submissions.sic_description.as_deref(),
        );
        // EDGAR covers US registrants only
        profile.country = Some("US".to_string());
        // No description or website in submissions metadata; callers fill
        // those from a secondary source.

        Ok(Some(profile))
    }
}

#[async_trait]
impl FundamentalProvider for EdgarProvider {
    async fn financial_ratios(&self, symbol: &Symbol) -> Result<Option<RatioSnapshot>> {
        let cik = match self.get_cik(symbol.as_str()).await {
            Ok(cik) => cik,
            Err(AnalysisError::SymbolNotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let facts = self.fetch_company_facts(&cik).await?;

        let revenue = latest_fact(&facts, "Revenue", "10-K");
        let net_income = latest_fact(&facts, "NetIncome", "10-K");
        let total_assets = latest_fact(&facts, "Assets", "10-K");
        let equity = latest_fact(&facts, "StockholdersEquity", "10-K");
        let liabilities = latest_fact(&facts, "Liabilities", "10-K");

        let date = [&revenue, &net_income, &total_assets, &equity, &liabilities]
            .iter()
            .filter_map(|f| f.as_ref().map(|(_, end)| *end))
            .max()
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let mut snapshot = RatioSnapshot::new(symbol.clone(), date, self.name());

        if let (Some((ni, _)), Some((rev, _))) = (&net_income, &revenue)
            && *rev > 0.0
        {
            snapshot.profit_margin = Some(ni / rev);
        }
        if let (Some((ni, _)), Some((eq, _))) = (&net_income, &equity)
            && *eq > 0.0
        {
            snapshot.roe = Some(ni / eq);
        }
        if let (Some((ni, _)), Some((assets, _))) = (&net_income, &total_assets)
            && *assets > 0.0
        {
            snapshot.roa = Some(ni / assets);
        }
        if let (Some((liab, _)), Some((eq, _))) = (&liabilities, &equity)
            && *eq > 0.0
        {
            snapshot.debt_to_equity = Some(liab / eq);
        }

        if snapshot.has_any_value() {
            Ok(Some(snapshot))
        } else {
            debug!(symbol = %symbol, "no usable XBRL facts for ratio derivation");
            Ok(None)
        }
    }

    async fn financial_statements(
        &self,
        symbol: &Symbol,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<StatementRecord>> {
        let cik = match self.get_cik(symbol.as_str()).await {
            Ok(cik) => cik,
            Err(AnalysisError::SymbolNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let facts = self.fetch_company_facts(&cik).await?;
        let form = form_for(period);

        // Collect the distinct reporting periods present in the facts.
        let mut periods: HashMap<(i32, String), PeriodDates> = HashMap::new();
        for taxonomy_facts in facts.facts.values() {
            for tag_facts in taxonomy_facts.values() {
                let Some(units) = &tag_facts.units else {
                    continue;
                };
                for values in units.values() {
                    for value in values {
                        if let (Some(fy), Some(fp), Some(v_form)) =
                            (value.fy, &value.fp, &value.form)
                            && v_form.as_str() == form
                            && let Ok(end) = NaiveDate::parse_from_str(&value.end, "%Y-%m-%d")
                        {
                            let filed = value
                                .filed
                                .as_deref()
                                .and_then(|f| NaiveDate::parse_from_str(f, "%Y-%m-%d").ok());
                            let entry = periods
                                .entry((fy, fp.clone()))
                                .or_insert(PeriodDates { end, filed });
                            if end > entry.end {
                                entry.end = end;
                            }
                            if filed > entry.filed {
                                entry.filed = filed;
                            }
                        }
                    }
                }
            }
        }

        let mut ordered: Vec<((i32, String), PeriodDates)> = periods.into_iter().collect();
        ordered.sort_by(|a, b| b.1.end.cmp(&a.1.end));
        ordered.truncate(limit);

        let mut records = Vec::with_capacity(ordered.len() * 3);
        for ((fy, fp), dates) in ordered {
            for statement_type in [
                StatementType::Income,
                StatementType::Balance,
                StatementType::CashFlow,
            ] {
                let data = extract_statement_data(&facts, statement_type, form, fy, &fp, dates.end);
                records.push(StatementRecord {
                    symbol: symbol.clone(),
                    statement_type,
                    period,
                    fiscal_year: fy,
                    fiscal_period: fp.clone(),
                    filing_date: dates.filed.unwrap_or(dates.end),
                    data,
                    source: self.name().to_string(),
                });
            }
        }

        debug!(symbol = %symbol, count = records.len(), "extracted statement records");
        Ok(records)
    }
}

#[async_trait]
impl InsiderProvider for EdgarProvider {
    async fn insider_transactions(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<InsiderTransaction>> {
        let cik = match self.get_cik(symbol.as_str()).await {
            Ok(cik) => cik,
            Err(AnalysisError::SymbolNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let submissions = self.fetch_company_submissions(&cik).await?;

        let Some(filings) = submissions.filings else {
            return Ok(Vec::new());
        };
        let recent = filings.recent;

        // Filing metadata lists Form 4 submissions but not their contents;
        // the individual filing documents would need a fetch each. Share
        // counts and prices stay empty here, which marks the list as
        // incomplete for fallback purposes.
        let mut transactions = Vec::new();
        for (i, form) in recent.form.iter().enumerate() {
            if transactions.len() == limit {
                break;
            }
            if form != "4" {
                continue;
            }
            let transaction_date = recent
                .filing_date
                .get(i)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            transactions.push(InsiderTransaction {
                insider_name: "Unknown".to_string(),
                position: "Unknown".to_string(),
                transaction_type: "form_4".to_string(),
                transaction_date,
                shares: None,
                price_per_share: None,
                total_value: None,
            });
        }

        if transactions.is_empty() {
            warn!(symbol = %symbol, "no Form 4 filings in recent submissions");
        }
        Ok(transactions)
    }
}

#[derive(Debug, Clone, Copy)]
struct PeriodDates {
    end: NaiveDate,
    filed: Option<NaiveDate>,
}

const fn form_for(period: ReportPeriod) -> &'static str {
    match period {
        ReportPeriod::Annual => "10-K",
        ReportPeriod::Quarterly => "10-Q",
    }
}

// =============================================================================
// SIC-based sector classification
// =============================================================================

/// Maps a SIC code (and its description as a fallback) to a broad sector.
///
/// The SEC classifies registrants by SIC code only; these buckets cover the
/// codes most common among listed companies.
fn sector_from_sic(sic: Option<&str>, sic_description: Option<&str>) -> Option<String> {
    if let Some(code) = sic
        && code.len() >= 3
    {
        let sector = match &code[..3] {
            "737" | "357" | "367" => Some("Technology"),
            "283" | "384" | "801" => Some("Healthcare"),
            "291" | "131" => Some("Energy"),
            "602" | "603" | "621" => Some("Financial Services"),
            "541" | "581" => Some("Consumer"),
            "371" | "335" => Some("Manufacturing"),
            _ => None,
        };
        if let Some(sector) = sector {
            return Some(sector.to_string());
        }
    }

    let description = sic_description?.to_lowercase();
    let sector = if ["computer", "software", "electronic"]
        .iter()
        .any(|kw| description.contains(kw))
    {
        "Technology"
    } else if ["pharmaceutical", "medical", "health", "biological"]
        .iter()
        .any(|kw| description.contains(kw))
    {
        "Healthcare"
    } else if ["petroleum", "oil", "gas", "crude"]
        .iter()
        .any(|kw| description.contains(kw))
    {
        "Energy"
    } else if ["bank", "finance", "insurance", "investment"]
        .iter()
        .any(|kw| description.contains(kw))
    {
        "Financial Services"
    } else if ["retail", "food", "restaurant"]
        .iter()
        .any(|kw| description.contains(kw))
    {
        "Consumer"
    } else if description.contains("manufactur") {
        "Manufacturing"
    } else {
        return None;
    };
    Some(sector.to_string())
}

// =============================================================================
// XBRL fact extraction
// =============================================================================

/// Get possible XBRL tags for a concept.
///
/// Different companies use different XBRL tags for the same concept; this
/// returns all tags worth trying, in preference order.
fn get_xbrl_tags(concept: &str) -> Option<Vec<&'static str>> {
    match concept {
        // Assets
        "Assets" => Some(vec!["Assets"]),
        "AssetsCurrent" => Some(vec!["AssetsCurrent"]),
        "CashAndCashEquivalents" => Some(vec![
            "CashAndCashEquivalentsAtCarryingValue",
            "Cash",
            "CashCashEquivalentsAndShortTermInvestments",
        ]),

        // Liabilities
        "Liabilities" => Some(vec!["Liabilities"]),
        "LiabilitiesCurrent" => Some(vec!["LiabilitiesCurrent"]),
        "LongTermDebt" => Some(vec![
            "LongTermDebt",
            "LongTermDebtNoncurrent",
            "LongTermDebtAndCapitalLeaseObligations",
        ]),

        // Equity
        "StockholdersEquity" => Some(vec![
            "StockholdersEquity",
            "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
        ]),

        // Income statement
        "Revenue" => Some(vec![
            "Revenues",
            "RevenueFromContractWithCustomerExcludingAssessedTax",
            "SalesRevenueNet",
            "RevenueFromContractWithCustomerIncludingAssessedTax",
        ]),
        "CostOfRevenue" => Some(vec![
            "CostOfRevenue",
            "CostOfGoodsAndServicesSold",
            "CostOfGoodsSold",
        ]),
        "GrossProfit" => Some(vec!["GrossProfit"]),
        "OperatingIncome" => Some(vec!["OperatingIncomeLoss"]),
        "NetIncome" => Some(vec![
            "NetIncomeLoss",
            "ProfitLoss",
            "NetIncomeLossAvailableToCommonStockholdersBasic",
        ]),
        "EarningsPerShareBasic" => Some(vec!["EarningsPerShareBasic"]),
        "EarningsPerShareDiluted" => Some(vec!["EarningsPerShareDiluted"]),

        // Cash flow
        "OperatingCashFlow" => Some(vec![
            "NetCashProvidedByUsedInOperatingActivities",
            "CashProvidedByUsedInOperatingActivities",
        ]),
        "InvestingCashFlow" => Some(vec!["NetCashProvidedByUsedInInvestingActivities"]),
        "FinancingCashFlow" => Some(vec!["NetCashProvidedByUsedInFinancingActivities"]),
        "CapitalExpenditures" => Some(vec![
            "PaymentsToAcquirePropertyPlantAndEquipment",
            "PaymentsForCapitalImprovements",
        ]),
        "DividendsPaid" => Some(vec![
            "PaymentsOfDividends",
            "PaymentsOfDividendsCommonStock",
        ]),

        _ => None,
    }
}

/// Finds the most recent value for a concept filed on the given form type.
fn latest_fact(
    facts: &CompanyFactsResponse,
    concept: &str,
    form: &str,
) -> Option<(f64, NaiveDate)> {
    let tags = get_xbrl_tags(concept)?;

    for taxonomy in ["us-gaap", "dei"] {
        let Some(taxonomy_facts) = facts.facts.get(taxonomy) else {
            continue;
        };
        for tag in &tags {
            if let Some(tag_facts) = taxonomy_facts.get(*tag)
                && let Some(units) = &tag_facts.units
            {
                for unit_type in ["USD", "shares", "pure"] {
                    let Some(values) = units.get(unit_type) else {
                        continue;
                    };
                    let best = values
                        .iter()
                        .filter(|v| v.form.as_deref() == Some(form))
                        .filter_map(|v| {
                            NaiveDate::parse_from_str(&v.end, "%Y-%m-%d")
                                .ok()
                                .map(|end| (v.val, end))
                        })
                        .max_by_key(|(_, end)| *end);
                    if best.is_some() {
                        return best;
                    }
                }
            }
        }
    }

    None
}

/// Finds a concept value for one specific fiscal period.
fn period_fact(
    facts: &CompanyFactsResponse,
    concept: &str,
    form: &str,
    fiscal_year: i32,
    fiscal_period: &str,
) -> Option<f64> {
    let tags = get_xbrl_tags(concept)?;

    for taxonomy in ["us-gaap", "dei"] {
        let Some(taxonomy_facts) = facts.facts.get(taxonomy) else {
            continue;
        };
        for tag in &tags {
            if let Some(tag_facts) = taxonomy_facts.get(*tag)
                && let Some(units) = &tag_facts.units
            {
                for unit_type in ["USD", "shares", "pure"] {
                    let Some(values) = units.get(unit_type) else {
                        continue;
                    };
                    let matched = values
                        .iter()
                        .filter(|v| {
                            v.form.as_deref() == Some(form)
                                && v.fy == Some(fiscal_year)
                                && v.fp.as_deref() == Some(fiscal_period)
                        })
                        .next_back();
                    if let Some(fact) = matched {
                        return Some(fact.val);
                    }
                }
            }
        }
    }

    None
}

/// Concepts reported on each statement.
const INCOME_CONCEPTS: &[&str] = &[
    "Revenue",
    "CostOfRevenue",
    "GrossProfit",
    "OperatingIncome",
    "NetIncome",
    "EarningsPerShareBasic",
    "EarningsPerShareDiluted",
];

const BALANCE_CONCEPTS: &[&str] = &[
    "Assets",
    "AssetsCurrent",
    "CashAndCashEquivalents",
    "Liabilities",
    "LiabilitiesCurrent",
    "LongTermDebt",
    "StockholdersEquity",
];

const CASH_FLOW_CONCEPTS: &[&str] = &[
    "OperatingCashFlow",
    "InvestingCashFlow",
    "FinancingCashFlow",
    "CapitalExpenditures",
    "DividendsPaid",
];

/// Builds the JSON line-item payload for one statement in one period.
fn extract_statement_data(
    facts: &CompanyFactsResponse,
    statement_type: StatementType,
    form: &str,
    fiscal_year: i32,
    fiscal_period: &str,
    period_end: NaiveDate,
) -> Value {
    let concepts = match statement_type {
        StatementType::Income => INCOME_CONCEPTS,
        StatementType::Balance => BALANCE_CONCEPTS,
        StatementType::CashFlow => CASH_FLOW_CONCEPTS,
    };

    let mut data = Map::new();
    data.insert(
        "period_end".to_string(),
        Value::String(period_end.to_string()),
    );
    for concept in concepts {
        if let Some(value) = period_fact(facts, concept, form, fiscal_year, fiscal_period)
            && let Some(number) = serde_json::Number::from_f64(value)
        {
            data.insert(snake_case(concept), Value::Number(number));
        }
    }
    Value::Object(data)
}

/// Converts an XBRL-style concept name to a snake_case JSON key.
fn snake_case(concept: &str) -> String {
    let mut out = String::with_capacity(concept.len() + 4);
    for (i, c) in concept.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
    /// Company name
    #[allow(dead_code)]
    title: String,
}

/// Response from the SEC EDGAR Company Facts API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyFactsResponse {
    /// CIK number
    #[allow(dead_code)]
    cik: u64,
    /// Entity name
    #[allow(dead_code)]
    entity_name: String,
    /// Facts organized by taxonomy and tag
    facts: HashMap<String, HashMap<String, TagFacts>>,
}

/// Facts for a specific XBRL tag.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct TagFacts {
    /// Label/description
    label: Option<String>,
    /// Description
    description: Option<String>,
    /// Units (USD, shares, etc.) containing the actual fact values
    units: Option<HashMap<String, Vec<FactValue>>>,
}

/// A single fact value with metadata.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
struct FactValue {
    /// End date of the period
    end: String,
    /// Value
    val: f64,
    /// Accession number
    #[serde(default)]
    accn: Option<String>,
    /// Fiscal year
    #[serde(default)]
    fy: Option<i32>,
    /// Fiscal period
    #[serde(default)]
    fp: Option<String>,
    /// Form type
    #[serde(default)]
    form: Option<String>,
    /// Filed date
    #[serde(default)]
    filed: Option<String>,
}

/// Company submissions/filings metadata.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanySubmissions {
    /// Company name
    name: String,
    /// SIC code
    #[serde(default)]
    sic: Option<String>,
    /// SIC description
    #[serde(default)]
    sic_description: Option<String>,
    /// Recent filing lists
    #[serde(default)]
    filings: Option<Filings>,
}

/// Filing lists from the submissions endpoint.
#[derive(Debug, Deserialize)]
struct Filings {
    /// The most recent filings, as parallel arrays.
    recent: RecentFilings,
}

/// Parallel arrays describing recent filings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    /// Form types (e.g. "10-K", "4").
    #[serde(default)]
    form: Vec<String>,
    /// Filing dates, aligned with `form`.
    #[serde(default)]
    filing_date: Vec<String>,
    /// Accession numbers, aligned with `form`.
    #[serde(default)]
    #[allow(dead_code)]
    accession_number: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_facts() -> CompanyFactsResponse {
        serde_json::from_value(serde_json::json!({
            "cik": 320193,
            "entityName": "Apple Inc.",
            "facts": {
                "us-gaap": {
                    "NetIncomeLoss": {
                        "label": "Net Income (Loss)",
                        "units": {
                            "USD": [
                                {"end": "2022-09-24", "val": 99_803_000_000.0, "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2022-10-28"},
                                {"end": "2023-09-30", "val": 96_995_000_000.0, "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2023-11-03"}
                            ]
                        }
                    },
                    "Revenues": {
                        "label": "Revenues",
                        "units": {
                            "USD": [
                                {"end": "2023-09-30", "val": 383_285_000_000.0, "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2023-11-03"}
                            ]
                        }
                    },
                    "StockholdersEquity": {
                        "label": "Stockholders' Equity",
                        "units": {
                            "USD": [
                                {"end": "2023-09-30", "val": 62_146_000_000.0, "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2023-11-03"}
                            ]
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn xbrl_tag_lookup() {
        assert!(get_xbrl_tags("Assets").is_some());
        assert!(get_xbrl_tags("Revenue").is_some());
        assert!(get_xbrl_tags("NetIncome").is_some());
        assert!(get_xbrl_tags("NonexistentConcept").is_none());
    }

    #[test]
    fn latest_fact_picks_most_recent_period() {
        let facts = sample_facts();
        let (value, end) = latest_fact(&facts, "NetIncome", "10-K").unwrap();
        assert_eq!(value, 96_995_000_000.0);
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 9, 30).unwrap());
    }

    #[test]
    fn latest_fact_respects_form_filter() {
        let facts = sample_facts();
        assert!(latest_fact(&facts, "NetIncome", "10-Q").is_none());
    }

    #[test]
    fn period_fact_matches_fiscal_period() {
        let facts = sample_facts();
        let value = period_fact(&facts, "NetIncome", "10-K", 2022, "FY").unwrap();
        assert_eq!(value, 99_803_000_000.0);
        assert!(period_fact(&facts, "NetIncome", "10-K", 2021, "FY").is_none());
    }

    #[test]
    fn statement_data_contains_snake_case_items() {
        let facts = sample_facts();
        let end = NaiveDate::from_ymd_opt(2023, 9, 30).unwrap();
        let data = extract_statement_data(&facts, StatementType::Income, "10-K", 2023, "FY", end);
        let object = data.as_object().unwrap();
        assert_eq!(
            object.get("period_end").and_then(Value::as_str),
            Some("2023-09-30")
        );
        assert!(object.contains_key("revenue"));
        assert!(object.contains_key("net_income"));
        assert!(!object.contains_key("gross_profit"));
    }

    #[test]
    fn sector_classification_by_sic_prefix() {
        assert_eq!(
            sector_from_sic(Some("7372"), None).as_deref(),
            Some("Technology")
        );
        assert_eq!(
            sector_from_sic(Some("2836"), None).as_deref(),
            Some("Healthcare")
        );
        assert_eq!(
            sector_from_sic(Some("6022"), None).as_deref(),
            Some("Financial Services")
        );
        assert!(sector_from_sic(Some("9999"), None).is_none());
    }

    #[test]
    fn sector_classification_falls_back_to_description() {
        assert_eq!(
            sector_from_sic(Some("9999"), Some("Crude Petroleum & Natural Gas")).as_deref(),
            Some("Energy")
        );
        assert_eq!(
            sector_from_sic(None, Some("Motor Vehicle Manufacturing")).as_deref(),
            Some("Manufacturing")
        );
        assert!(sector_from_sic(None, Some("Gold Mining")).is_none());
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(snake_case("NetIncome"), "net_income");
        assert_eq!(snake_case("EarningsPerShareBasic"), "earnings_per_share_basic");
    }

    #[test]
    fn provider_metadata() {
        let provider = EdgarProvider::with_delay("Test/1.0 (test@example.com)", Duration::ZERO);
        assert_eq!(provider.name(), "SEC EDGAR");
        assert!(!provider.description().is_empty());
    }

    #[test]
    fn cik_padding() {
        let cik = "320193";
        let padded = format!("{:0>10}", cik);
        assert_eq!(padded, "0000320193");
    }
}
