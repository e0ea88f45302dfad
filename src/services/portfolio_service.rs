use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

use crate::errors::{AppError, StatsError};
use crate::models::{AnnualizedMetrics, PortfolioMetrics, PriceTable, ReturnTable};

/// Trading days used to scale daily statistics to annual ones, regardless of
/// the actual sampling frequency or gaps in the data.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Weights whose sum is this close to 1.0 are used as-is.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Convert aligned prices into daily fractional returns.
///
/// Row `t` of the result is `(price[t] - price[t-1]) / price[t-1]` for every
/// asset. A return is undefined when either price is missing or the previous
/// price is zero; any row with an undefined return is dropped so the
/// covariance matrix is computed over the same dates for all assets.
pub fn daily_returns(table: &PriceTable) -> ReturnTable {
    let width = table.assets.len();
    let mut dates = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for pair in table.rows.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        let row: Option<Vec<f64>> = prev.prices
            .iter()
            .zip(cur.prices.iter())
            .map(|(p, c)| match (p, c) {
                (Some(p), Some(c)) if *p != 0.0 => Some((c - p) / p),
                _ => None,
            })
            .collect();

        if let Some(row) = row.filter(|r| r.iter().all(|v| v.is_finite())) {
            dates.push(cur.date);
            rows.push(row);
        }
    }

    let values = Array2::from_shape_fn((rows.len(), width), |(r, c)| rows[r][c]);

    ReturnTable {
        assets: table.assets.clone(),
        dates,
        values,
    }
}

/// Annualized mean return and sample covariance (N-1 denominator) per asset.
///
/// Fewer than two complete rows cannot produce a sample covariance and are
/// reported as [`StatsError::InsufficientObservations`].
pub fn compute_annualized_metrics(returns: &ReturnTable) -> Result<AnnualizedMetrics, StatsError> {
    let n = returns.observations();
    if n < 2 {
        return Err(StatsError::InsufficientObservations(n));
    }

    let means = returns.values
        .mean_axis(Axis(0))
        .ok_or(StatsError::InsufficientObservations(n))?;

    let centered = &returns.values - &means;
    let covariance = centered.t().dot(&centered) / (n as f64 - 1.0) * TRADING_DAYS_PER_YEAR;

    Ok(AnnualizedMetrics {
        assets: returns.assets.clone(),
        expected_returns: means * TRADING_DAYS_PER_YEAR,
        covariance,
        observations: n,
    })
}

/// Validate weights against the asset list and scale them to sum to 1.0.
pub fn normalize_weights(assets: &[String], weights: &[f64]) -> Result<Array1<f64>, StatsError> {
    if weights.len() != assets.len() {
        return Err(StatsError::WeightCountMismatch {
            expected: assets.len(),
            actual: weights.len(),
        });
    }

    for (asset, &weight) in assets.iter().zip(weights) {
        if !weight.is_finite() || weight < 0.0 {
            return Err(StatsError::InvalidWeight { asset: asset.clone(), weight });
        }
    }

    let largest = weights.iter().copied().fold(0.0, f64::max);
    if largest == 0.0 {
        return Err(StatsError::ZeroWeightSum);
    }

    let weights = Array1::from(weights.to_vec());
    let sum = weights.sum();
    if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
        Ok(weights)
    } else if sum.is_finite() {
        Ok(weights / sum)
    } else {
        // the raw sum overflowed; rescale so every entry is at most 1.0 first
        let scaled = weights / largest;
        let scaled_sum = scaled.sum();
        Ok(scaled / scaled_sum)
    }
}

/// Portfolio return, volatility and Sharpe ratio for a weight vector.
///
/// `weights` must be in the same order as `metrics.assets`. The Sharpe ratio
/// is `return / volatility` without a risk-free rate, and exactly 0 when the
/// volatility is 0.
pub fn compute_portfolio_performance(
    weights: &[f64],
    metrics: &AnnualizedMetrics,
) -> Result<PortfolioMetrics, StatsError> {
    let w = normalize_weights(&metrics.assets, weights)?;

    let expected_return = w.dot(&metrics.expected_returns);
    let variance = w.dot(&metrics.covariance.dot(&w));
    // rounding can leave a tiny negative variance for degenerate inputs
    let volatility = variance.max(0.0).sqrt();

    let sharpe_ratio = if volatility != 0.0 {
        expected_return / volatility
    } else {
        0.0
    };

    Ok(PortfolioMetrics {
        expected_return,
        volatility,
        sharpe_ratio,
    })
}

/// Order a ticker → weight map by `assets`. Equal weights when no map is given.
pub fn weights_for_assets(
    assets: &[String],
    weights: Option<&BTreeMap<String, f64>>,
) -> Result<Vec<f64>, AppError> {
    let Some(weights) = weights else {
        return Ok(vec![1.0; assets.len()]);
    };

    let mut by_ticker: BTreeMap<String, f64> = BTreeMap::new();
    for (key, &weight) in weights {
        let ticker = key.trim().to_uppercase();
        if !assets.contains(&ticker) {
            return Err(AppError::Validation(format!(
                "Weight given for {} which is not in the selected assets",
                key
            )));
        }
        if by_ticker.insert(ticker, weight).is_some() {
            return Err(AppError::Validation(format!("Duplicate weight for {}", key)));
        }
    }

    assets
        .iter()
        .map(|asset| {
            by_ticker.get(asset).copied().ok_or_else(|| {
                AppError::Validation(format!("Missing weight for {}", asset))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRow;
    use chrono::NaiveDate;
    use ndarray::array;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn assets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn return_table(names: &[&str], values: Array2<f64>) -> ReturnTable {
        let dates = (0..values.nrows()).map(|i| day(i as u32 + 2)).collect();
        ReturnTable { assets: assets(names), dates, values }
    }

    fn two_asset_metrics() -> AnnualizedMetrics {
        let returns = return_table(
            &["AAPL", "MSFT"],
            array![[0.01, 0.02], [-0.01, -0.02], [0.01, 0.02]],
        );
        compute_annualized_metrics(&returns).unwrap()
    }

    #[test]
    fn test_daily_returns_basic() {
        let table = PriceTable {
            assets: assets(&["AAPL"]),
            rows: vec![
                PriceRow { date: day(2), prices: vec![Some(100.0)] },
                PriceRow { date: day(3), prices: vec![Some(110.0)] },
                PriceRow { date: day(4), prices: vec![Some(99.0)] },
            ],
        };

        let returns = daily_returns(&table);
        assert_eq!(returns.dates, vec![day(3), day(4)]);
        assert!((returns.values[[0, 0]] - 0.10).abs() < 1e-12);
        assert!((returns.values[[1, 0]] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_daily_returns_drops_rows_with_gaps() {
        let table = PriceTable {
            assets: assets(&["AAPL", "MSFT"]),
            rows: vec![
                PriceRow { date: day(2), prices: vec![Some(100.0), Some(50.0)] },
                PriceRow { date: day(3), prices: vec![Some(101.0), None] },
                PriceRow { date: day(4), prices: vec![Some(102.0), Some(51.0)] },
                PriceRow { date: day(5), prices: vec![Some(103.0), Some(52.0)] },
            ],
        };

        let returns = daily_returns(&table);
        // day 3 has no MSFT price, day 4 has no MSFT predecessor
        assert_eq!(returns.dates, vec![day(5)]);
        assert_eq!(returns.values.shape(), &[1, 2]);
    }

    #[test]
    fn test_daily_returns_skips_zero_previous_price() {
        let table = PriceTable {
            assets: assets(&["XYZ"]),
            rows: vec![
                PriceRow { date: day(2), prices: vec![Some(0.0)] },
                PriceRow { date: day(3), prices: vec![Some(5.0)] },
                PriceRow { date: day(4), prices: vec![Some(6.0)] },
            ],
        };

        let returns = daily_returns(&table);
        assert_eq!(returns.observations(), 1);
        assert!((returns.values[[0, 0]] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_annualized_metrics_proportional_returns() {
        let metrics = two_asset_metrics();

        let a = metrics.expected_return("AAPL").unwrap();
        let b = metrics.expected_return("MSFT").unwrap();
        assert!((a - 0.01 / 3.0 * 252.0).abs() < 1e-12);
        assert!((b / a - 2.0).abs() < 1e-9);

        let cov = metrics.covariance_between("AAPL", "MSFT").unwrap();
        assert!(cov > 0.0);
        assert_eq!(metrics.observations, 3);
    }

    #[test]
    fn test_annualized_covariance_uses_sample_denominator() {
        let returns = return_table(&["A"], array![[0.01], [-0.01], [0.01]]);
        let metrics = compute_annualized_metrics(&returns).unwrap();

        let mean = 0.01 / 3.0;
        let ss: f64 = [0.01, -0.01, 0.01].iter().map(|r: &f64| (r - mean).powi(2)).sum();
        let expected = ss / 2.0 * 252.0;
        assert!((metrics.covariance[[0, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_covariance_is_symmetric() {
        let returns = return_table(
            &["A", "B", "C"],
            array![[0.01, 0.03, -0.02], [0.02, -0.01, 0.00], [-0.01, 0.02, 0.01], [0.00, 0.01, 0.02]],
        );
        let metrics = compute_annualized_metrics(&returns).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!((metrics.covariance[[i, j]] - metrics.covariance[[j, i]]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_annualized_metrics_rejects_too_few_rows() {
        let empty = return_table(&["A"], Array2::zeros((0, 1)));
        assert_eq!(
            compute_annualized_metrics(&empty),
            Err(StatsError::InsufficientObservations(0))
        );

        let single = return_table(&["A"], array![[0.01]]);
        assert_eq!(
            compute_annualized_metrics(&single),
            Err(StatsError::InsufficientObservations(1))
        );
    }

    #[test]
    fn test_weights_are_normalized() {
        let metrics = two_asset_metrics();

        let scaled = compute_portfolio_performance(&[2.0, 2.0], &metrics).unwrap();
        let unit = compute_portfolio_performance(&[0.5, 0.5], &metrics).unwrap();

        assert!((scaled.expected_return - unit.expected_return).abs() < 1e-12);
        assert!((scaled.volatility - unit.volatility).abs() < 1e-12);
        assert!((scaled.sharpe_ratio - unit.sharpe_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_weights_sums_to_one() {
        let w = normalize_weights(&assets(&["A", "B", "C"]), &[3.0, 1.0, 4.0]).unwrap();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert!((w[0] - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_huge_weights_still_sum_to_one() {
        let w = normalize_weights(&assets(&["A", "B"]), &[1e308, 1e308]).unwrap();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert!((w[0] - 0.5).abs() < 1e-12);

        let metrics = two_asset_metrics();
        let huge = compute_portfolio_performance(&[1e308, 1e308], &metrics).unwrap();
        let unit = compute_portfolio_performance(&[0.5, 0.5], &metrics).unwrap();
        assert!((huge.expected_return - unit.expected_return).abs() < 1e-12);
        assert!((huge.volatility - unit.volatility).abs() < 1e-12);
        assert!(huge.volatility > 0.0);
        assert!((huge.sharpe_ratio - unit.sharpe_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_equal_weights_reproduce_average_return() {
        let metrics = two_asset_metrics();
        let performance = compute_portfolio_performance(&[0.5, 0.5], &metrics).unwrap();

        let manual = (metrics.expected_returns[0] + metrics.expected_returns[1]) / 2.0;
        assert!((performance.expected_return - manual).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_is_quadratic_form() {
        let metrics = AnnualizedMetrics {
            assets: assets(&["A", "B"]),
            expected_returns: array![0.10, 0.20],
            covariance: array![[0.04, 0.01], [0.01, 0.09]],
            observations: 10,
        };

        let performance = compute_portfolio_performance(&[0.5, 0.5], &metrics).unwrap();
        // 0.25*0.04 + 2*0.25*0.01 + 0.25*0.09 = 0.0375
        assert!((performance.volatility - 0.0375_f64.sqrt()).abs() < 1e-12);
        assert!((performance.expected_return - 0.15).abs() < 1e-12);
        assert!((performance.sharpe_ratio - 0.15 / 0.0375_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_volatility_gives_zero_sharpe() {
        let returns = return_table(&["FLAT"], array![[0.0], [0.0], [0.0]]);
        let metrics = compute_annualized_metrics(&returns).unwrap();

        let performance = compute_portfolio_performance(&[1.0], &metrics).unwrap();
        assert_eq!(performance.volatility, 0.0);
        assert_eq!(performance.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_constant_positive_return_still_zero_sharpe() {
        let returns = return_table(&["BOND"], array![[0.001], [0.001], [0.001]]);
        let metrics = compute_annualized_metrics(&returns).unwrap();

        let performance = compute_portfolio_performance(&[1.0], &metrics).unwrap();
        assert!(performance.expected_return > 0.0);
        assert_eq!(performance.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_weight_count_mismatch_is_rejected() {
        let metrics = two_asset_metrics();
        assert_eq!(
            compute_portfolio_performance(&[1.0], &metrics),
            Err(StatsError::WeightCountMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_zero_weight_sum_is_rejected() {
        let metrics = two_asset_metrics();
        assert_eq!(
            compute_portfolio_performance(&[0.0, 0.0], &metrics),
            Err(StatsError::ZeroWeightSum)
        );
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let metrics = two_asset_metrics();
        let result = compute_portfolio_performance(&[1.5, -0.5], &metrics);
        assert!(matches!(result, Err(StatsError::InvalidWeight { ref asset, .. }) if asset == "MSFT"));
    }

    #[test]
    fn test_weights_for_assets_defaults_to_equal() {
        let w = weights_for_assets(&assets(&["A", "B"]), None).unwrap();
        assert_eq!(w, vec![1.0, 1.0]);
    }

    #[test]
    fn test_weights_for_assets_orders_by_selection() {
        let mut map = BTreeMap::new();
        map.insert("B".to_string(), 0.7);
        map.insert("A".to_string(), 0.3);

        let w = weights_for_assets(&assets(&["B", "A"]), Some(&map)).unwrap();
        assert_eq!(w, vec![0.7, 0.3]);
    }

    #[test]
    fn test_weights_for_assets_matches_keys_case_insensitively() {
        let mut map = BTreeMap::new();
        map.insert(" aapl".to_string(), 0.25);
        map.insert("Msft".to_string(), 0.75);

        let w = weights_for_assets(&assets(&["AAPL", "MSFT"]), Some(&map)).unwrap();
        assert_eq!(w, vec![0.25, 0.75]);

        map.insert("AAPL".to_string(), 0.5);
        assert!(matches!(
            weights_for_assets(&assets(&["AAPL", "MSFT"]), Some(&map)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_weights_for_assets_rejects_unknown_and_missing() {
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), 1.0);
        map.insert("Z".to_string(), 1.0);
        assert!(matches!(
            weights_for_assets(&assets(&["A"]), Some(&map)),
            Err(AppError::Validation(_))
        ));

        let mut partial = BTreeMap::new();
        partial.insert("A".to_string(), 1.0);
        assert!(matches!(
            weights_for_assets(&assets(&["A", "B"]), Some(&partial)),
            Err(AppError::Validation(_))
        ));
    }
}
