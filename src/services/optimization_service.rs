use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::errors::AppError;
use crate::models::{AnnualizedMetrics, PortfolioMetrics};
use crate::services::portfolio_service::{compute_portfolio_performance, normalize_weights};

/// Best portfolio found by [`optimize_weights`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedPortfolio {
    /// Normalized weights in `metrics.assets` order
    pub weights: Vec<f64>,
    pub metrics: PortfolioMetrics,
}

/// Search for the weight vector with the highest Sharpe ratio by sampling
/// random long-only portfolios.
///
/// The equal-weight portfolio is always evaluated first, so the result is never
/// worse than equal weighting. Each further sample draws one uniform value per
/// asset and normalizes the draw.
///
/// # Arguments
/// * `metrics` - annualized expected returns and covariance
/// * `samples` - number of random portfolios to evaluate (must be > 0)
/// * `seed` - RNG seed; the same seed always yields the same result
pub fn optimize_weights(
    metrics: &AnnualizedMetrics,
    samples: usize,
    seed: u64,
) -> Result<OptimizedPortfolio, AppError> {
    if samples == 0 {
        return Err(AppError::Validation("samples must be greater than zero".to_string()));
    }
    if metrics.assets.is_empty() {
        return Err(AppError::Validation("No assets to optimize".to_string()));
    }

    let n = metrics.assets.len();
    let equal = vec![1.0; n];
    let mut best = OptimizedPortfolio {
        metrics: compute_portfolio_performance(&equal, metrics)?,
        weights: normalize_weights(&metrics.assets, &equal)?.to_vec(),
    };

    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..samples {
        let draw: Vec<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
        if draw.iter().all(|w| *w == 0.0) {
            continue;
        }

        let candidate = compute_portfolio_performance(&draw, metrics)?;
        if candidate.sharpe_ratio > best.metrics.sharpe_ratio {
            best = OptimizedPortfolio {
                weights: normalize_weights(&metrics.assets, &draw)?.to_vec(),
                metrics: candidate,
            };
        }
    }

    info!(
        "Optimized {} assets over {} samples: sharpe {:.4}, return {:.4}, volatility {:.4}",
        n, samples, best.metrics.sharpe_ratio, best.metrics.expected_return, best.metrics.volatility
    );

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn metrics() -> AnnualizedMetrics {
        AnnualizedMetrics {
            assets: vec!["GOOD".to_string(), "BAD".to_string()],
            expected_returns: array![0.20, -0.05],
            covariance: array![[0.04, 0.0], [0.0, 0.04]],
            observations: 100,
        }
    }

    #[test]
    fn test_rejects_zero_samples() {
        assert!(matches!(optimize_weights(&metrics(), 0, 1), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_result_beats_equal_weights() {
        let equal = compute_portfolio_performance(&[1.0, 1.0], &metrics()).unwrap();
        let best = optimize_weights(&metrics(), 2000, 7).unwrap();

        assert!(best.metrics.sharpe_ratio >= equal.sharpe_ratio);
        // the losing asset should be mostly dropped
        assert!(best.weights[0] > 0.8);
        assert!((best.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = optimize_weights(&metrics(), 500, 42).unwrap();
        let b = optimize_weights(&metrics(), 500, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_asset_gets_full_weight() {
        let single = AnnualizedMetrics {
            assets: vec!["ONLY".to_string()],
            expected_returns: array![0.1],
            covariance: array![[0.01]],
            observations: 10,
        };
        let best = optimize_weights(&single, 10, 3).unwrap();
        assert_eq!(best.weights.len(), 1);
        assert!((best.weights[0] - 1.0).abs() < 1e-12);
    }
}
