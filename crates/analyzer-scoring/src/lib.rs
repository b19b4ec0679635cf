#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Investment score aggregation.
//!
//! Component scores are deliberately simple heuristics; each lives in
//! [0, 100]. Valuation, financial health, and technical components score
//! 0 when their inputs are missing; only the growth and sentiment
//! placeholders sit at the neutral 50. The overall score is a
//! fixed-weight blend mapped to a [`Recommendation`].

use analyzer_core::types::{RatioSnapshot, Symbol};
use analyzer_indicators::IndicatorSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

const NEUTRAL: f64 = 50.0;

const WEIGHT_VALUATION: f64 = 0.30;
const WEIGHT_GROWTH: f64 = 0.20;
const WEIGHT_HEALTH: f64 = 0.25;
const WEIGHT_TECHNICAL: f64 = 0.15;
const WEIGHT_SENTIMENT: f64 = 0.10;

/// The recommendation bands an overall score maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Overall score of 80 or above.
    StrongBuy,
    /// Overall score of 60 or above.
    Buy,
    /// Middle band.
    Hold,
    /// Overall score of 40 or below.
    Sell,
    /// Overall score of 20 or below.
    StrongSell,
}

impl Recommendation {
    /// Maps an overall score to its band.
    ///
    /// Boundary scores resolve to the higher-conviction band: exactly 80 is
    /// a strong buy, exactly 40 is a sell.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::StrongBuy
        } else if score >= 60.0 {
            Self::Buy
        } else if score <= 20.0 {
            Self::StrongSell
        } else if score <= 40.0 {
            Self::Sell
        } else {
            Self::Hold
        }
    }

    /// Returns the canonical string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrongBuy => "strong_buy",
            Self::Buy => "buy",
            Self::Hold => "hold",
            Self::Sell => "sell",
            Self::StrongSell => "strong_sell",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored symbol with its component breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Date the score applies to.
    pub date: NaiveDate,
    /// Profitability-based valuation component.
    pub valuation_score: f64,
    /// Growth component (neutral placeholder until growth data lands).
    pub growth_score: f64,
    /// Leverage and return-on-equity component.
    pub financial_health_score: f64,
    /// RSI and moving-average trend component.
    pub technical_score: f64,
    /// Sentiment component (neutral placeholder).
    pub sentiment_score: f64,
    /// Weighted blend of the five components.
    pub overall_score: f64,
    /// Band the overall score falls in.
    pub recommendation: Recommendation,
    /// One-line human-readable summary.
    pub summary: String,
    /// Components scoring 70 or above.
    pub key_strengths: Vec<String>,
    /// Components scoring 30 or below.
    pub key_risks: Vec<String>,
}

/// Computes the investment score for a symbol.
///
/// `ratios` feeds the valuation and financial-health components;
/// `indicators` feeds the technical component. Either may be absent, in
/// which case its components score 0.
#[must_use]
pub fn score(
    symbol: Symbol,
    date: NaiveDate,
    ratios: Option<&RatioSnapshot>,
    indicators: Option<&IndicatorSnapshot>,
) -> ScoreBreakdown {
    let valuation_score = valuation(ratios);
    let growth_score = NEUTRAL;
    let financial_health_score = financial_health(ratios);
    let technical_score = technical(indicators);
    let sentiment_score = NEUTRAL;

    let overall_score = WEIGHT_VALUATION * valuation_score
        + WEIGHT_GROWTH * growth_score
        + WEIGHT_HEALTH * financial_health_score
        + WEIGHT_TECHNICAL * technical_score
        + WEIGHT_SENTIMENT * sentiment_score;
    let recommendation = Recommendation::from_score(overall_score);

    let components = [
        ("valuation", valuation_score),
        ("growth", growth_score),
        ("financial health", financial_health_score),
        ("technical", technical_score),
        ("sentiment", sentiment_score),
    ];
    let key_strengths: Vec<String> = components
        .iter()
        .filter(|(_, s)| *s >= 70.0)
        .map(|(name, s)| format!("Strong {name} ({s:.0}/100)"))
        .collect();
    let key_risks: Vec<String> = components
        .iter()
        .filter(|(_, s)| *s <= 30.0)
        .map(|(name, s)| format!("Weak {name} ({s:.0}/100)"))
        .collect();

    let summary = format!(
        "{symbol} scores {overall_score:.1}/100 ({recommendation}): \
         {} notable strength(s), {} notable risk(s)",
        key_strengths.len(),
        key_risks.len()
    );

    ScoreBreakdown {
        symbol,
        date,
        valuation_score,
        growth_score,
        financial_health_score,
        technical_score,
        sentiment_score,
        overall_score,
        recommendation,
        summary,
        key_strengths,
        key_risks,
    }
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Valuation from profitability: a 20% net margin maps to 100, a
/// missing margin to 0.
fn valuation(ratios: Option<&RatioSnapshot>) -> f64 {
    match ratios.and_then(|r| r.profit_margin) {
        Some(margin) => clamp(margin * 100.0 * 5.0),
        None => 0.0,
    }
}

/// Financial health from return on equity and leverage; missing inputs
/// contribute nothing.
fn financial_health(ratios: Option<&RatioSnapshot>) -> f64 {
    let Some(ratios) = ratios else {
        return 0.0;
    };

    let mut health = 0.0;
    if let Some(roe) = ratios.roe {
        // negative equity returns add nothing rather than subtract
        health += (roe * 100.0).clamp(0.0, 50.0);
    }
    if let Some(debt) = ratios.debt_to_equity {
        if debt < 0.5 {
            health += 50.0;
        } else if debt < 1.0 {
            health += 30.0;
        } else if debt < 2.0 {
            health += 15.0;
        }
    }
    clamp(health)
}

/// Technical score from the RSI band, nudged by moving-average ordering.
/// An absent RSI contributes nothing; the base stays 0.
fn technical(indicators: Option<&IndicatorSnapshot>) -> f64 {
    let Some(snapshot) = indicators else {
        return 0.0;
    };

    let mut tech = match snapshot.rsi_14 {
        Some(rsi) if rsi < 30.0 => 80.0, // oversold
        Some(rsi) if rsi > 70.0 => 20.0, // overbought
        Some(_) => NEUTRAL,
        None => 0.0,
    };

    if let (Some(sma_20), Some(sma_50)) = (snapshot.sma_20, snapshot.sma_50) {
        if snapshot.close > sma_20 && sma_20 > sma_50 {
            tech += 20.0;
        } else if snapshot.close < sma_20 && sma_20 < sma_50 {
            tech -= 20.0;
        }
    }
    clamp(tech)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    fn ratios(
        profit_margin: Option<f64>,
        roe: Option<f64>,
        debt_to_equity: Option<f64>,
    ) -> RatioSnapshot {
        RatioSnapshot {
            symbol: Symbol::new("AAPL"),
            date: day(),
            profit_margin,
            roe,
            roa: None,
            debt_to_equity,
            source: "SEC EDGAR".into(),
        }
    }

    #[test]
    fn recommendation_boundaries() {
        assert_eq!(Recommendation::from_score(80.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_score(79.99), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(60.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_score(59.99), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(40.0), Recommendation::Sell);
        assert_eq!(Recommendation::from_score(40.01), Recommendation::Hold);
        assert_eq!(Recommendation::from_score(20.0), Recommendation::StrongSell);
        assert_eq!(Recommendation::from_score(20.01), Recommendation::Sell);
    }

    #[test]
    fn recommendation_storage_strings() {
        assert_eq!(Recommendation::StrongBuy.as_str(), "strong_buy");
        assert_eq!(Recommendation::StrongSell.as_str(), "strong_sell");
        assert_eq!(Recommendation::Hold.to_string(), "hold");
    }

    #[test]
    fn missing_inputs_zero_their_components() {
        let breakdown = score(Symbol::new("AAPL"), day(), None, None);
        assert_eq!(breakdown.valuation_score, 0.0);
        assert_eq!(breakdown.financial_health_score, 0.0);
        assert_eq!(breakdown.technical_score, 0.0);
        assert_eq!(breakdown.growth_score, 50.0);
        assert_eq!(breakdown.sentiment_score, 50.0);
        // 0.3*0 + 0.2*50 + 0.25*0 + 0.15*0 + 0.1*50
        assert_eq!(breakdown.overall_score, 15.0);
        assert_eq!(breakdown.recommendation, Recommendation::StrongSell);
        assert!(breakdown.key_strengths.is_empty());
        assert_eq!(breakdown.key_risks.len(), 3);
    }

    #[test]
    fn missing_margin_zeroes_valuation_only() {
        let r = ratios(None, Some(0.50), Some(0.4));
        let snapshot = IndicatorSnapshot {
            close: 110.0,
            rsi_14: Some(55.0),
            ..Default::default()
        };
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), Some(&snapshot));
        assert_eq!(breakdown.valuation_score, 0.0);
        assert_eq!(breakdown.financial_health_score, 100.0);
        assert_eq!(breakdown.technical_score, 50.0);
        // 0.3*0 + 0.2*50 + 0.25*100 + 0.15*50 + 0.1*50
        assert!((breakdown.overall_score - 47.5).abs() < 1e-9);
        assert_eq!(breakdown.recommendation, Recommendation::Hold);
    }

    #[test]
    fn absent_rsi_keeps_technical_base_at_zero() {
        let snapshot = IndicatorSnapshot {
            close: 110.0,
            rsi_14: None,
            sma_20: Some(105.0),
            sma_50: Some(100.0),
            ..Default::default()
        };
        let breakdown = score(Symbol::new("AAPL"), day(), None, Some(&snapshot));
        // bullish trend alone contributes the +20 nudge
        assert_eq!(breakdown.technical_score, 20.0);
    }

    #[test]
    fn negative_roe_adds_nothing_to_health() {
        let r = ratios(None, Some(-0.40), Some(0.3));
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), None);
        // low-debt band alone
        assert_eq!(breakdown.financial_health_score, 50.0);
    }

    #[test]
    fn valuation_scales_with_profit_margin() {
        let r = ratios(Some(0.10), None, None);
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), None);
        assert_eq!(breakdown.valuation_score, 50.0);

        let r = ratios(Some(0.25), None, None);
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), None);
        assert_eq!(breakdown.valuation_score, 100.0);

        let r = ratios(Some(-0.05), None, None);
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), None);
        assert_eq!(breakdown.valuation_score, 0.0);
    }

    #[test]
    fn health_combines_roe_and_leverage() {
        let r = ratios(None, Some(0.30), Some(0.3));
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), None);
        // roe part 30, low-debt band 50
        assert_eq!(breakdown.financial_health_score, 80.0);

        let r = ratios(None, Some(1.2), Some(2.5));
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), None);
        // roe capped at 50, heavy debt adds nothing
        assert_eq!(breakdown.financial_health_score, 50.0);
    }

    #[test]
    fn technical_rsi_bands_and_trend() {
        let snapshot = IndicatorSnapshot {
            close: 110.0,
            rsi_14: Some(25.0),
            sma_20: Some(105.0),
            sma_50: Some(100.0),
            ..Default::default()
        };
        let breakdown = score(Symbol::new("AAPL"), day(), None, Some(&snapshot));
        // oversold 80, bullish trend +20, clamped
        assert_eq!(breakdown.technical_score, 100.0);

        let snapshot = IndicatorSnapshot {
            close: 90.0,
            rsi_14: Some(75.0),
            sma_20: Some(95.0),
            sma_50: Some(100.0),
            ..Default::default()
        };
        let breakdown = score(Symbol::new("AAPL"), day(), None, Some(&snapshot));
        // overbought 20, bearish trend -20
        assert_eq!(breakdown.technical_score, 0.0);
    }

    #[test]
    fn strong_fundamentals_produce_a_strong_buy() {
        let r = ratios(Some(0.25), Some(0.50), Some(0.4));
        let snapshot = IndicatorSnapshot {
            close: 110.0,
            rsi_14: Some(55.0),
            sma_20: Some(105.0),
            sma_50: Some(100.0),
            ..Default::default()
        };
        let breakdown = score(Symbol::new("AAPL"), day(), Some(&r), Some(&snapshot));

        // valuation 100, growth 50, health 100, technical 70, sentiment 50
        let expected = 30.0 + 10.0 + 25.0 + 10.5 + 5.0;
        assert!((breakdown.overall_score - expected).abs() < 1e-9);
        assert_eq!(breakdown.recommendation, Recommendation::StrongBuy);
        assert!(!breakdown.key_strengths.is_empty());
        assert!(breakdown.summary.contains("strong_buy"));
    }
}
