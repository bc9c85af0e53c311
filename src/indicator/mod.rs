//! Table level indicators
//!
//! Indicators here take normalized history frames (one per security, or a
//! map of them) and return result frames that can carry selected source
//! columns alongside the computed values.

pub mod dataset;
pub mod super_trend;

use polars::prelude::DataFrame;
use std::collections::BTreeMap;

use crate::error::Result;

pub use dataset::recent_trend_dataset;
pub use super_trend::{SuperTrend, SuperTrendParams};

/// Source data for an indicator: one security or many, keyed by ticker
#[derive(Debug, Clone)]
pub enum IndicatorData {
    Single(DataFrame),
    Bulk(BTreeMap<String, DataFrame>),
}

impl From<DataFrame> for IndicatorData {
    fn from(df: DataFrame) -> Self {
        IndicatorData::Single(df)
    }
}

impl From<BTreeMap<String, DataFrame>> for IndicatorData {
    fn from(frames: BTreeMap<String, DataFrame>) -> Self {
        IndicatorData::Bulk(frames)
    }
}

/// Common surface of table level indicators
pub trait Indicator {
    type Params;

    /// Compute for a single security. Fails when built from bulk data.
    fn calculate_per_security(&mut self, params: Self::Params) -> Result<DataFrame>;

    /// Compute for every security. Fails when built from a single table.
    fn calculate_bulk(&mut self, params: Self::Params) -> Result<BTreeMap<String, DataFrame>>;
}
