use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::performance::PerformanceWindow;

/// Annualized expected returns and covariance for an ordered set of assets.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualizedMetrics {
    pub assets: Vec<String>,
    pub expected_returns: Array1<f64>,
    pub covariance: Array2<f64>,
    /// Complete daily-return rows the estimates are based on
    pub observations: usize,
}

impl AnnualizedMetrics {
    fn index_of(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn expected_return(&self, asset: &str) -> Option<f64> {
        self.index_of(asset).map(|i| self.expected_returns[i])
    }

    pub fn covariance_between(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.covariance[[self.index_of(a)?, self.index_of(b)?]])
    }

    pub fn expected_returns_map(&self) -> BTreeMap<String, f64> {
        self.assets
            .iter()
            .cloned()
            .zip(self.expected_returns.iter().copied())
            .collect()
    }

    pub fn covariance_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.assets
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let row = self.assets
                    .iter()
                    .enumerate()
                    .map(|(j, b)| (b.clone(), self.covariance[[i, j]]))
                    .collect();
                (a.clone(), row)
            })
            .collect()
    }
}

/// Weighted portfolio statistics. Sharpe ratio has no risk-free-rate adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Body of `POST /api/portfolio/metrics`
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioMetricsRequest {
    pub assets: Option<Vec<String>>,
    /// Weight per ticker; equal weights when absent
    pub weights: Option<BTreeMap<String, f64>>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioMetricsResponse {
    pub window: PerformanceWindow,
    pub weights: BTreeMap<String, f64>,
    pub expected_returns: BTreeMap<String, f64>,
    pub covariance: BTreeMap<String, BTreeMap<String, f64>>,
    pub observations: usize,
    pub metrics: PortfolioMetrics,
}

/// Body of `POST /api/portfolio/optimize`
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationRequest {
    pub assets: Option<Vec<String>>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub samples: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub window: PerformanceWindow,
    pub weights: BTreeMap<String, f64>,
    pub metrics: PortfolioMetrics,
    pub samples: usize,
    pub observations: usize,
}
