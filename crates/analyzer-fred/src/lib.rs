#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! FRED data provider.
//!
//! Implements [`EconomicProvider`] against the FRED observations API and
//! maps dashboard indicator kinds, industry gauges, and sector proxies to
//! their FRED series IDs.

use analyzer_core::{
    AnalysisError, DataProvider, EconomicIndicatorKind, EconomicPoint, EconomicProvider,
    FixedDelay, Result,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Deterministic offline series generation.
#[cfg(feature = "mock")]
pub mod mock;

/// Base URL for the FRED API.
const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// Default pre-request delay.
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Industry activity gauges: (name, FRED series ID).
pub const INDUSTRY_SERIES: &[(&str, &str)] = &[
    ("industrial_production", "INDPRO"),
    ("capacity_utilization", "TCU"),
    ("manufacturing_pmi", "NAPM"),
    ("business_inventories", "BUSINV"),
];

/// Sector proxy series: (sector, FRED series ID).
///
/// FRED has no direct sector-performance data; these series track activity
/// loosely related to each sector.
pub const SECTOR_SERIES: &[(&str, &str)] = &[
    ("technology", "IPMINE"),
    ("healthcare", "USEHLTHNS"),
    ("energy", "IPG2211A2N"),
    ("financials", "USFIRE"),
    ("consumer", "DPCERE1Q156NBEA"),
    ("manufacturing", "AMTMNO"),
];

/// Returns the FRED series ID backing a dashboard indicator.
#[must_use]
pub const fn dashboard_series(kind: EconomicIndicatorKind) -> &'static str {
    match kind {
        EconomicIndicatorKind::InterestRate => "DFF",
        EconomicIndicatorKind::Unemployment => "UNRATE",
        EconomicIndicatorKind::Inflation => "CPIAUCSL",
        EconomicIndicatorKind::Gdp => "GDP",
        EconomicIndicatorKind::YieldCurve => "T10Y2Y",
    }
}

/// Returns the proxy series for a sector name, matched case-insensitively.
#[must_use]
pub fn sector_series(sector: &str) -> Option<&'static str> {
    let sector = sector.to_lowercase();
    SECTOR_SERIES
        .iter()
        .find(|(name, _)| sector.contains(name))
        .map(|(_, id)| *id)
}

/// FRED data provider.
#[derive(Clone)]
pub struct FredProvider {
    client: reqwest::Client,
    api_key: String,
    throttle: FixedDelay,
}

impl fmt::Debug for FredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FredProvider")
            .field("api_key", &"[REDACTED]")
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl FredProvider {
    /// Create a new FRED provider with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_delay(api_key, DEFAULT_DELAY)
    }

    /// Create a provider with a custom pre-request delay.
    ///
    /// Tests pass `Duration::ZERO` to avoid sleeping.
    #[must_use]
    pub fn with_delay(api_key: impl Into<String>, delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            throttle: FixedDelay::new(delay),
        }
    }
}

impl DataProvider for FredProvider {
    fn name(&self) -> &str {
        "FRED"
    }

    fn description(&self) -> &str {
        "Federal Reserve Economic Data provider for macroeconomic time series"
    }
}

#[async_trait]
impl EconomicProvider for FredProvider {
    async fn series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EconomicPoint>> {
        if series_id.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "Empty series id".to_string(),
            ));
        }

        self.throttle.wait().await;

        let url = format!(
            "{}/series/observations?series_id={}&observation_start={}&observation_end={}&file_type=json&api_key={}",
            FRED_BASE_URL, series_id, start, end, self.api_key
        );

        debug!(series_id, "FRED request");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::RateLimited {
                provider: "FRED".to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            return Err(AnalysisError::Network(format!(
                "HTTP {} for series {}",
                response.status(),
                series_id
            )));
        }

        let body: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let points: Vec<EconomicPoint> = body
            .observations
            .into_iter()
            .filter_map(|obs| {
                let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").ok()?;
                // FRED reports missing observations as "."
                let value = obs.value.parse::<f64>().ok();
                Some(EconomicPoint { date, value })
            })
            .collect();

        debug!(series_id, points = points.len(), "parsed observations");
        Ok(points)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_metadata() {
        let provider = FredProvider::with_delay("key", Duration::ZERO);
        assert_eq!(provider.name(), "FRED");
        assert!(!provider.description().is_empty());
    }

    #[test]
    fn debug_redacts_api_key() {
        let provider = FredProvider::new("fred-secret");
        let output = format!("{:?}", provider);
        assert!(output.contains("REDACTED"));
        assert!(!output.contains("fred-secret"));
    }

    #[test]
    fn dashboard_series_ids() {
        assert_eq!(dashboard_series(EconomicIndicatorKind::InterestRate), "DFF");
        assert_eq!(dashboard_series(EconomicIndicatorKind::Unemployment), "UNRATE");
        assert_eq!(dashboard_series(EconomicIndicatorKind::Inflation), "CPIAUCSL");
        assert_eq!(dashboard_series(EconomicIndicatorKind::Gdp), "GDP");
        assert_eq!(dashboard_series(EconomicIndicatorKind::YieldCurve), "T10Y2Y");
    }

    #[test]
    fn sector_lookup_is_case_insensitive_and_partial() {
        assert_eq!(sector_series("Technology"), Some("IPMINE"));
        assert_eq!(sector_series("Consumer Discretionary"), Some("DPCERE1Q156NBEA"));
        assert_eq!(sector_series("Utilities"), None);
    }

    #[test]
    fn missing_observations_parse_as_none() {
        let body: ObservationsResponse = serde_json::from_value(serde_json::json!({
            "observations": [
                {"date": "2024-01-01", "value": "5.33"},
                {"date": "2024-01-02", "value": "."}
            ]
        }))
        .unwrap();

        let values: Vec<Option<f64>> = body
            .observations
            .iter()
            .map(|o| o.value.parse::<f64>().ok())
            .collect();
        assert_eq!(values, vec![Some(5.33), None]);
    }
}
