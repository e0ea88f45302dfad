use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One adjusted-close observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// Ascending, gap-preserving price history for a single ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    /// One entry per asset, in [`PriceTable::assets`] order
    pub prices: Vec<Option<f64>>,
}

/// Prices of several assets aligned on the union of their dates.
/// A missing observation stays `None`; nothing is imputed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub assets: Vec<String>,
    pub rows: Vec<PriceRow>,
}

impl PriceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn series(&self) -> Vec<PriceSeries> {
        self.assets
            .iter()
            .enumerate()
            .map(|(idx, ticker)| PriceSeries {
                ticker: ticker.clone(),
                points: self.rows
                    .iter()
                    .filter_map(|row| {
                        row.prices[idx].map(|adj_close| PricePoint { date: row.date, adj_close })
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Daily fractional returns with no undefined values.
/// `values` has one row per date and one column per asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    pub assets: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub values: Array2<f64>,
}

impl ReturnTable {
    pub fn observations(&self) -> usize {
        self.values.nrows()
    }
}
