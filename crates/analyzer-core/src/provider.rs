//! Provider traits for fetching financial data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`ReferenceProvider`] - Company reference information
//! - [`PriceProvider`] - Daily OHLCV price history
//! - [`FundamentalProvider`] - Financial ratios and statements
//! - [`InsiderProvider`] - Insider transactions
//! - [`EconomicProvider`] - Macroeconomic time series

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{
        CompanyProfile, EconomicPoint, InsiderTransaction, PriceBar, RatioSnapshot, ReportPeriod,
        StatementRecord, Symbol,
    },
};

/// Base trait for all data providers.
///
/// All data providers must implement this trait to provide basic metadata
/// about the provider.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for company reference information.
#[async_trait]
pub trait ReferenceProvider: DataProvider {
    /// Fetches the company profile for a symbol.
    ///
    /// Returns `Ok(None)` when the provider has no record of the symbol;
    /// `Err` is reserved for transport and parse failures.
    async fn company_profile(&self, symbol: &Symbol) -> Result<Option<CompanyProfile>>;
}

/// Provider for daily OHLCV price history.
#[async_trait]
pub trait PriceProvider: DataProvider {
    /// Fetches daily price bars for a symbol in the given date range,
    /// ordered oldest first.
    async fn daily_prices(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>>;
}

/// Provider for fundamental financial data.
#[async_trait]
pub trait FundamentalProvider: DataProvider {
    /// Fetches the most recent financial ratios for a symbol.
    ///
    /// Returns `Ok(None)` when the provider has no figures for the symbol.
    async fn financial_ratios(&self, symbol: &Symbol) -> Result<Option<RatioSnapshot>>;

    /// Fetches financial statement records for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The stock symbol
    /// * `period` - Annual or quarterly
    /// * `limit` - Maximum number of periods to return (most recent first)
    async fn financial_statements(
        &self,
        symbol: &Symbol,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<StatementRecord>>;
}

/// Provider for insider transaction data.
#[async_trait]
pub trait InsiderProvider: DataProvider {
    /// Fetches recent insider transactions for a symbol, newest first.
    async fn insider_transactions(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<InsiderTransaction>>;
}

/// Provider for macroeconomic time series.
#[async_trait]
pub trait EconomicProvider: DataProvider {
    /// Fetches observations for a named series in the given date range,
    /// ordered oldest first.
    async fn series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EconomicPoint>>;
}
