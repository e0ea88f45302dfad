use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::price_point::PriceSeries;

/// A calendar selection: a whole year, or one month of it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSelection {
    pub year: i32,
    pub month: Option<u32>,
}

/// Inclusive date range resolved from a [`WindowSelection`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceWindow {
    pub year: i32,
    /// Month after clamping to the current month
    pub month: Option<u32>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// e.g. "March 2024" or "2024"
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthOption {
    pub label: String,
    pub value: u32,
}

/// Query parameters for `GET /api/performance`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceQuery {
    /// Comma-separated tickers; the default selection is used when absent
    pub assets: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceResponse {
    pub window: PerformanceWindow,
    pub month_options: Vec<MonthOption>,
    pub series: Vec<PriceSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRoster {
    pub tickers: Vec<String>,
    pub default_selection: Vec<String>,
    pub years: Vec<i32>,
    pub month_options: Vec<MonthOption>,
    pub default_year: i32,
    pub default_month: u32,
}
