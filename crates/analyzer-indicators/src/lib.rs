#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Technical indicator calculations.
//!
//! All series functions take a slice of closing prices (oldest first) and
//! return a vector of the same length, with `None` in the leading positions
//! where the indicator is undefined. [`IndicatorSnapshot::compute`] bundles
//! the latest value of every indicator for one symbol.

use analyzer_core::types::PriceBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Simple moving average over `window` values.
///
/// Positions before the first full window are `None`.
#[must_use]
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = Some(sum / window as f64);
    }
    out
}

/// Rolling sample standard deviation (ddof = 1) over `window` values.
///
/// Positions before the first full window are `None`. A window of 1 yields
/// `None` everywhere because a single observation has no sample deviation.
#[must_use]
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 || values.len() < window {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let ss: f64 = slice.iter().map(|v| (v - mean).powi(2)).sum();
        out[i] = Some((ss / (window - 1) as f64).sqrt());
    }
    out
}

/// Exponential moving average with smoothing `alpha = 2 / (span + 1)`.
///
/// Seeded with the first value and defined from the first position on, so
/// the result has the same length as the input with no leading gap.
#[must_use]
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() || span == 0 {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current = values[0];
    out.push(current);
    for &value in &values[1..] {
        current = alpha * value + (1.0 - alpha) * current;
        out.push(current);
    }
    out
}

/// Relative strength index over `window` price changes.
///
/// Gains and losses are averaged with trailing simple means (not Wilder
/// smoothing). When the average loss is zero the RSI is 100, which covers
/// both all-gain windows and perfectly flat windows. Defined from position
/// `window` on; earlier positions are `None`.
#[must_use]
pub fn rsi(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window + 1 {
        return out;
    }
    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    for i in window..values.len() {
        let recent = &deltas[i - window..i];
        let avg_gain: f64 = recent.iter().filter(|d| **d > 0.0).sum::<f64>() / window as f64;
        let avg_loss: f64 = -recent.iter().filter(|d| **d < 0.0).sum::<f64>() / window as f64;
        out[i] = Some(if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        });
    }
    out
}

/// MACD line, signal line, and histogram series.
#[derive(Clone, Debug, PartialEq)]
pub struct MacdSeries {
    /// Fast EMA minus slow EMA.
    pub macd: Vec<f64>,
    /// EMA of the MACD line.
    pub signal: Vec<f64>,
    /// MACD minus signal.
    pub histogram: Vec<f64>,
}

/// MACD with the conventional 12/26/9 spans.
#[must_use]
pub fn macd(values: &[f64]) -> MacdSeries {
    macd_with_spans(values, 12, 26, 9)
}

/// MACD with explicit fast, slow, and signal spans.
#[must_use]
pub fn macd_with_spans(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema(&macd, signal);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

/// Bollinger band series.
#[derive(Clone, Debug, PartialEq)]
pub struct BollingerSeries {
    /// The middle band (SMA).
    pub middle: Vec<Option<f64>>,
    /// Middle band plus two standard deviations.
    pub upper: Vec<Option<f64>>,
    /// Middle band minus two standard deviations.
    pub lower: Vec<Option<f64>>,
}

/// Bollinger bands: 20-period SMA with bands at two sample standard
/// deviations. A constant series collapses all three bands to the constant.
#[must_use]
pub fn bollinger(values: &[f64], window: usize) -> BollingerSeries {
    let middle = sma(values, window);
    let std = rolling_std(values, window);
    let upper = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m + 2.0 * s),
            _ => None,
        })
        .collect();
    let lower = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - 2.0 * s),
            _ => None,
        })
        .collect();
    BollingerSeries {
        middle,
        upper,
        lower,
    }
}

/// Beta of a symbol against a reference index.
///
/// Bars are joined on date, daily returns are computed over the aligned
/// closes, and beta is the sample covariance of the two return series over
/// the sample variance of the index returns. Returns `None` when fewer than
/// two aligned return pairs exist or the index variance is zero (e.g. a flat
/// index, or a symbol measured against itself while flat).
#[must_use]
pub fn beta(bars: &[PriceBar], index_bars: &[PriceBar]) -> Option<f64> {
    let index_closes: HashMap<NaiveDate, f64> =
        index_bars.iter().map(|b| (b.date, b.close)).collect();
    let aligned: Vec<(f64, f64)> = bars
        .iter()
        .filter_map(|b| index_closes.get(&b.date).map(|ic| (b.close, *ic)))
        .collect();
    if aligned.len() < 3 {
        return None;
    }

    let mut stock_returns = Vec::with_capacity(aligned.len() - 1);
    let mut index_returns = Vec::with_capacity(aligned.len() - 1);
    for pair in aligned.windows(2) {
        let (prev_s, prev_i) = pair[0];
        let (cur_s, cur_i) = pair[1];
        if prev_s == 0.0 || prev_i == 0.0 {
            continue;
        }
        stock_returns.push(cur_s / prev_s - 1.0);
        index_returns.push(cur_i / prev_i - 1.0);
    }
    if stock_returns.len() < 2 {
        return None;
    }

    let n = stock_returns.len() as f64;
    let mean_s = stock_returns.iter().sum::<f64>() / n;
    let mean_i = index_returns.iter().sum::<f64>() / n;
    let covariance: f64 = stock_returns
        .iter()
        .zip(&index_returns)
        .map(|(s, i)| (s - mean_s) * (i - mean_i))
        .sum::<f64>()
        / (n - 1.0);
    let variance: f64 = index_returns
        .iter()
        .map(|i| (i - mean_i).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    if variance == 0.0 {
        return None;
    }
    Some(covariance / variance)
}

/// The latest value of every indicator for one symbol on one date.
///
/// Fields are `None` when the price history is too short for the
/// corresponding window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Date of the last price bar.
    pub date: NaiveDate,
    /// Last closing price.
    pub close: f64,
    /// Last trading volume.
    pub volume: f64,
    /// 20-day simple moving average.
    pub sma_20: Option<f64>,
    /// 50-day simple moving average.
    pub sma_50: Option<f64>,
    /// 200-day simple moving average.
    pub sma_200: Option<f64>,
    /// 12-day exponential moving average.
    pub ema_12: Option<f64>,
    /// 26-day exponential moving average.
    pub ema_26: Option<f64>,
    /// 14-period relative strength index.
    pub rsi_14: Option<f64>,
    /// MACD line.
    pub macd: Option<f64>,
    /// MACD signal line.
    pub macd_signal: Option<f64>,
    /// MACD histogram.
    pub macd_histogram: Option<f64>,
    /// Upper Bollinger band.
    pub bollinger_upper: Option<f64>,
    /// Middle Bollinger band.
    pub bollinger_middle: Option<f64>,
    /// Lower Bollinger band.
    pub bollinger_lower: Option<f64>,
    /// Beta against the reference index, when index bars were supplied.
    pub beta: Option<f64>,
}

impl IndicatorSnapshot {
    /// Computes the snapshot from daily bars (oldest first), optionally
    /// with reference index bars for beta.
    ///
    /// Returns `None` when `bars` is empty.
    #[must_use]
    pub fn compute(bars: &[PriceBar], index_bars: Option<&[PriceBar]>) -> Option<Self> {
        let last = bars.last()?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let macd_series = macd(&closes);
        let bands = bollinger(&closes, 20);
        // EMAs and MACD are defined from the first bar, but a reading over
        // fewer bars than the slow span is not meaningful; report them only
        // once the slow window is filled, matching the SMA convention.
        let macd_ready = closes.len() >= 26;

        Some(Self {
            date: last.date,
            close: last.close,
            volume: last.volume,
            sma_20: last_value(&sma(&closes, 20)),
            sma_50: last_value(&sma(&closes, 50)),
            sma_200: last_value(&sma(&closes, 200)),
            ema_12: macd_ready.then(|| ema(&closes, 12)).and_then(|e| e.last().copied()),
            ema_26: macd_ready.then(|| ema(&closes, 26)).and_then(|e| e.last().copied()),
            rsi_14: last_value(&rsi(&closes, 14)),
            macd: macd_ready.then(|| macd_series.macd.last().copied()).flatten(),
            macd_signal: macd_ready
                .then(|| macd_series.signal.last().copied())
                .flatten(),
            macd_histogram: macd_ready
                .then(|| macd_series.histogram.last().copied())
                .flatten(),
            bollinger_upper: last_value(&bands.upper),
            bollinger_middle: last_value(&bands.middle),
            bollinger_lower: last_value(&bands.lower),
            beta: index_bars.and_then(|index| beta(bars, index)),
        })
    }
}

fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(n)
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::new(day(i as u64), c, c, c, c, 1_000.0))
            .collect()
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn sma_of_constant_series_is_the_constant() {
        let values = vec![100.0; 30];
        let out = sma(&values, 20);
        assert!(out[18].is_none());
        approx(out[19].unwrap(), 100.0);
        approx(out[29].unwrap(), 100.0);
    }

    #[test]
    fn sma_short_series_is_all_none() {
        let out = sma(&[1.0, 2.0, 3.0], 20);
        assert!(out.iter().all(Option::is_none));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn sma_matches_hand_computation() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        approx(out[2].unwrap(), 2.0);
        approx(out[3].unwrap(), 3.0);
        approx(out[4].unwrap(), 4.0);
    }

    #[test]
    fn rolling_std_uses_sample_denominator() {
        // std of [1, 2, 3, 4] with ddof=1 is sqrt(5/3)
        let out = rolling_std(&[1.0, 2.0, 3.0, 4.0], 4);
        approx(out[3].unwrap(), (5.0_f64 / 3.0).sqrt());
    }

    #[test]
    fn ema_is_seeded_with_first_value() {
        let out = ema(&[10.0, 20.0], 3);
        approx(out[0], 10.0);
        // alpha = 0.5: 0.5 * 20 + 0.5 * 10
        approx(out[1], 15.0);
    }

    #[test]
    fn rsi_requires_window_plus_one_points() {
        let values: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&values, 14);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_is_100_when_losses_are_zero() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&rising, 14);
        approx(out.last().copied().flatten().unwrap(), 100.0);

        // A flat window has zero gains and zero losses; same rule applies.
        let flat = vec![100.0; 20];
        let out = rsi(&flat, 14);
        approx(out.last().copied().flatten().unwrap(), 100.0);
    }

    #[test]
    fn rsi_is_zero_when_gains_are_zero() {
        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&falling, 14);
        approx(out.last().copied().flatten().unwrap(), 0.0);
    }

    #[test]
    fn rsi_alternating_gains_and_losses() {
        // Alternating +1/-1 deltas: avg gain == avg loss, RS = 1, RSI = 50.
        let values: Vec<f64> = (0..21)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let out = rsi(&values, 14);
        approx(out.last().copied().flatten().unwrap(), 50.0);
    }

    #[test]
    fn bollinger_bands_collapse_on_constant_series() {
        let values = vec![100.0; 30];
        let bands = bollinger(&values, 20);
        approx(bands.middle.last().copied().flatten().unwrap(), 100.0);
        approx(bands.upper.last().copied().flatten().unwrap(), 100.0);
        approx(bands.lower.last().copied().flatten().unwrap(), 100.0);
    }

    #[test]
    fn macd_of_constant_series_is_zero() {
        let values = vec![50.0; 40];
        let series = macd(&values);
        approx(*series.macd.last().unwrap(), 0.0);
        approx(*series.signal.last().unwrap(), 0.0);
        approx(*series.histogram.last().unwrap(), 0.0);
    }

    #[test]
    fn beta_of_scaled_series_is_one() {
        // The stock is the index times a constant: identical returns, beta 1.
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let index = bars_from_closes(&closes);
        let scaled: Vec<f64> = closes.iter().map(|c| c * 3.0).collect();
        let stock = bars_from_closes(&scaled);
        approx(beta(&stock, &index).unwrap(), 1.0);
    }

    #[test]
    fn beta_is_none_for_flat_index() {
        let stock = bars_from_closes(&[100.0, 101.0, 102.0, 101.0, 103.0]);
        let index = bars_from_closes(&[500.0; 5]);
        assert!(beta(&stock, &index).is_none());
    }

    #[test]
    fn beta_is_none_without_date_overlap() {
        let stock = bars_from_closes(&[100.0, 101.0, 102.0]);
        let mut index = bars_from_closes(&[500.0, 501.0, 502.0]);
        for (i, bar) in index.iter_mut().enumerate() {
            bar.date = day(100 + i as u64);
        }
        assert!(beta(&stock, &index).is_none());
    }

    #[test]
    fn snapshot_of_empty_bars_is_none() {
        assert!(IndicatorSnapshot::compute(&[], None).is_none());
    }

    #[test]
    fn snapshot_of_flat_year_reports_degenerate_values() {
        // 250 flat trading days at $100.
        let closes = vec![100.0; 250];
        let bars = bars_from_closes(&closes);
        let snapshot = IndicatorSnapshot::compute(&bars, Some(&bars)).unwrap();

        assert_eq!(snapshot.date, day(249));
        approx(snapshot.close, 100.0);
        approx(snapshot.sma_20.unwrap(), 100.0);
        approx(snapshot.sma_50.unwrap(), 100.0);
        approx(snapshot.sma_200.unwrap(), 100.0);
        approx(snapshot.rsi_14.unwrap(), 100.0);
        approx(snapshot.macd.unwrap(), 0.0);
        approx(snapshot.bollinger_upper.unwrap(), 100.0);
        approx(snapshot.bollinger_middle.unwrap(), 100.0);
        approx(snapshot.bollinger_lower.unwrap(), 100.0);
        // flat index has zero return variance
        assert!(snapshot.beta.is_none());
    }

    #[test]
    fn snapshot_of_short_history_leaves_long_windows_empty() {
        let closes = vec![100.0; 30];
        let bars = bars_from_closes(&closes);
        let snapshot = IndicatorSnapshot::compute(&bars, None).unwrap();
        assert!(snapshot.sma_20.is_some());
        assert!(snapshot.sma_50.is_none());
        assert!(snapshot.sma_200.is_none());
        assert!(snapshot.macd.is_some());
        assert!(snapshot.beta.is_none());
    }
}
