//! Rate sources and the comparison between them

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Label used for every alert produced by the checker.
pub const USD_UAH: &str = "USD-UAH";

/// A bank API quoting the USD to UAH sale rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Stable identifier of the source, e.g. `privatbank`.
    fn name(&self) -> &str;

    /// Returns `Ok(None)` when the response holds no USD/UAH record.
    async fn fetch_rate(&self) -> Result<Option<f64>>;
}

/// Rates collected from all sources during one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub fetched_at: DateTime<Utc>,
    rates: BTreeMap<String, f64>,
}

impl Default for RateSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl RateSnapshot {
    pub fn new() -> Self {
        RateSnapshot {
            fetched_at: Utc::now(),
            rates: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, source: &str, rate: f64) {
        self.rates.insert(source.to_string(), rate);
    }

    pub fn get(&self, source: &str) -> Option<f64> {
        self.rates.get(source).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(String, f64)> for RateSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut snapshot = RateSnapshot::new();
        snapshot.rates.extend(iter);
        snapshot
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRate {
    pub source: String,
    pub rate: f64,
}

/// Discrepancy between two sources that reached the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RateAlert {
    pub pair: String,
    pub left: SourceRate,
    pub right: SourceRate,
    pub difference: f64,
}

impl Display for RateAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}: {:.2}, {}: {:.2}, Difference: {:.2}",
            self.pair,
            self.left.source,
            self.left.rate,
            self.right.source,
            self.right.rate,
            self.difference
        )
    }
}

/// Compares the rates of `left` and `right` in the snapshot.
///
/// Yields an alert only when both rates are present and their absolute
/// difference is at least `threshold`.
pub fn calculate_difference(
    snapshot: &RateSnapshot,
    left: &str,
    right: &str,
    threshold: f64,
) -> Option<RateAlert> {
    let left_rate = snapshot.get(left)?;
    let right_rate = snapshot.get(right)?;
    let difference = (left_rate - right_rate).abs();

    (difference >= threshold).then(|| RateAlert {
        pair: USD_UAH.to_string(),
        left: SourceRate {
            source: left.to_string(),
            rate: left_rate,
        },
        right: SourceRate {
            source: right.to_string(),
            rate: right_rate,
        },
        difference,
    })
}
