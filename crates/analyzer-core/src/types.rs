//! Core data types for the analyzer.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`PriceBar`] - Daily OHLCV price bar
//! - [`CompanyProfile`] - Company reference information with merge support
//! - [`RatioSnapshot`] - Point-in-time financial ratios with provenance
//! - [`StatementRecord`] - A reported financial statement period
//! - [`InsiderTransaction`] - A single insider trade
//! - [`EconomicPoint`] - One observation of an economic time series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single daily OHLCV price bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date of the bar.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price during the day.
    pub high: f64,
    /// Lowest price during the day.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume.
    pub volume: f64,
}

impl PriceBar {
    /// Creates a new price bar.
    #[must_use]
    pub const fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Company reference information.
///
/// Most fields are optional because no single provider reports all of them;
/// [`CompanyProfile::merge_missing`] fills gaps from a secondary source without
/// overwriting what the primary already supplied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Business sector.
    pub sector: Option<String>,
    /// Industry within the sector.
    pub industry: Option<String>,
    /// Business description.
    pub description: Option<String>,
    /// Country of incorporation.
    pub country: Option<String>,
    /// Company website.
    pub website: Option<String>,
    /// Logo image URL.
    pub logo_url: Option<String>,
    /// Number of employees.
    pub employee_count: Option<i64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
}

impl CompanyProfile {
    /// Creates a new profile with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, name: impl Into<String>) -> Self {
        Self {
            symbol,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns true if the profile has the fields a dashboard needs:
    /// sector, industry, and description all present and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        has_text(&self.sector) && has_text(&self.industry) && has_text(&self.description)
    }

    /// Fills empty fields from `other` without overwriting populated ones.
    ///
    /// The name is only replaced when ours is empty; optional fields are
    /// taken from `other` only when ours are `None` or blank.
    pub fn merge_missing(&mut self, other: &Self) {
        if self.name.trim().is_empty() && !other.name.trim().is_empty() {
            self.name = other.name.clone();
        }
        merge_text(&mut self.sector, &other.sector);
        merge_text(&mut self.industry, &other.industry);
        merge_text(&mut self.description, &other.description);
        merge_text(&mut self.country, &other.country);
        merge_text(&mut self.website, &other.website);
        merge_text(&mut self.logo_url, &other.logo_url);
        if self.employee_count.is_none() {
            self.employee_count = other.employee_count;
        }
        if self.market_cap.is_none() {
            self.market_cap = other.market_cap;
        }
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn merge_text(target: &mut Option<String>, source: &Option<String>) {
    if !has_text(target) && has_text(source) {
        target.clone_from(source);
    }
}

/// Point-in-time financial ratios for a company.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSnapshot {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Date of the snapshot.
    pub date: NaiveDate,
    /// Net profit margin (net income / revenue).
    pub profit_margin: Option<f64>,
    /// Return on equity (net income / stockholders' equity).
    pub roe: Option<f64>,
    /// Return on assets (net income / total assets).
    pub roa: Option<f64>,
    /// Debt-to-equity ratio (total liabilities / stockholders' equity).
    pub debt_to_equity: Option<f64>,
    /// Provider that supplied the underlying figures.
    pub source: String,
}

impl RatioSnapshot {
    /// Creates an empty snapshot with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, date: NaiveDate, source: impl Into<String>) -> Self {
        Self {
            symbol,
            date,
            source: source.into(),
            ..Default::default()
        }
    }

    /// Returns true if at least one ratio was computed.
    #[must_use]
    pub const fn has_any_value(&self) -> bool {
        self.profit_margin.is_some()
            || self.roe.is_some()
            || self.roa.is_some()
            || self.debt_to_equity.is_some()
    }
}

/// The kind of financial statement a record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    /// Income statement.
    Income,
    /// Balance sheet.
    Balance,
    /// Cash flow statement.
    CashFlow,
}

impl StatementType {
    /// Returns the canonical string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Balance => "balance",
            Self::CashFlow => "cash_flow",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting period of a financial statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// Annual (fiscal year) reporting.
    #[default]
    Annual,
    /// Quarterly reporting.
    Quarterly,
}

impl ReportPeriod {
    /// Returns the canonical string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported financial statement period.
///
/// The line items live in the JSON `data` payload because different providers
/// report different subsets; `source` records which provider supplied them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Which statement this record carries.
    pub statement_type: StatementType,
    /// Annual or quarterly.
    pub period: ReportPeriod,
    /// Fiscal year of the period.
    pub fiscal_year: i32,
    /// Fiscal period label (e.g. "FY", "Q2").
    pub fiscal_period: String,
    /// Date the statement was filed.
    pub filing_date: NaiveDate,
    /// Line items as reported.
    pub data: serde_json::Value,
    /// Provider that supplied the data.
    pub source: String,
}

/// A single insider transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsiderTransaction {
    /// Name of the insider.
    pub insider_name: String,
    /// Role of the insider at the company.
    pub position: String,
    /// Buy/sell classification as reported.
    pub transaction_type: String,
    /// Date of the transaction.
    pub transaction_date: Option<NaiveDate>,
    /// Number of shares transacted.
    pub shares: Option<f64>,
    /// Price per share.
    pub price_per_share: Option<f64>,
    /// Total transaction value.
    pub total_value: Option<f64>,
}

/// One observation of an economic time series.
///
/// `value` is `None` for dates the series reports no figure (FRED encodes
/// these as ".").
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomicPoint {
    /// Observation date.
    pub date: NaiveDate,
    /// Observation value, if reported.
    pub value: Option<f64>,
}

/// The economic indicators shown on the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomicIndicatorKind {
    /// Federal funds effective rate.
    InterestRate,
    /// Unemployment rate.
    Unemployment,
    /// Consumer price index.
    Inflation,
    /// Gross domestic product.
    Gdp,
    /// 10-year minus 2-year treasury spread.
    YieldCurve,
}

impl EconomicIndicatorKind {
    /// All dashboard indicator kinds.
    pub const ALL: [Self; 5] = [
        Self::InterestRate,
        Self::Unemployment,
        Self::Inflation,
        Self::Gdp,
        Self::YieldCurve,
    ];

    /// Returns the canonical string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InterestRate => "interest_rate",
            Self::Unemployment => "unemployment",
            Self::Inflation => "inflation",
            Self::Gdp => "gdp",
            Self::YieldCurve => "yield_curve",
        }
    }
}

impl fmt::Display for EconomicIndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_uppercases() {
        assert_eq!(Symbol::new("aapl").as_str(), "AAPL");
        assert_eq!(Symbol::from("msft").to_string(), "MSFT");
    }

    #[test]
    fn profile_completeness_requires_all_three_fields() {
        let mut profile = CompanyProfile::new(Symbol::new("AAPL"), "Apple Inc.");
        assert!(!profile.is_complete());

        profile.sector = Some("Technology".into());
        profile.industry = Some("Consumer Electronics".into());
        assert!(!profile.is_complete());

        profile.description = Some("   ".into());
        assert!(!profile.is_complete());

        profile.description = Some("Designs and sells devices.".into());
        assert!(profile.is_complete());
    }

    #[test]
    fn merge_missing_never_overwrites_populated_fields() {
        let mut primary = CompanyProfile::new(Symbol::new("AAPL"), "Apple Inc.");
        primary.sector = Some("Technology".into());
        primary.employee_count = Some(164_000);

        let mut secondary = CompanyProfile::new(Symbol::new("AAPL"), "Apple");
        secondary.sector = Some("Tech".into());
        secondary.description = Some("Consumer electronics company.".into());
        secondary.employee_count = Some(1);
        secondary.market_cap = Some(3.0e12);

        primary.merge_missing(&secondary);

        assert_eq!(primary.name, "Apple Inc.");
        assert_eq!(primary.sector.as_deref(), Some("Technology"));
        assert_eq!(
            primary.description.as_deref(),
            Some("Consumer electronics company.")
        );
        assert_eq!(primary.employee_count, Some(164_000));
        assert_eq!(primary.market_cap, Some(3.0e12));
    }

    #[test]
    fn ratio_snapshot_emptiness() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let mut snapshot = RatioSnapshot::new(Symbol::new("AAPL"), date, "SEC EDGAR");
        assert!(!snapshot.has_any_value());

        snapshot.roe = Some(1.5);
        assert!(snapshot.has_any_value());
    }
}
