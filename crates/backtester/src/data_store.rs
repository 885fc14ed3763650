//! Market data collaborator: supplies sorted bar windows to the runner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use market_core::types::{MarketBar, Timeframe};
use market_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query parameters for fetching historical bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarQuery {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Inclusive start.
    pub start_time: DateTime<Utc>,
    /// Inclusive end.
    pub end_time: DateTime<Utc>,
    /// Maximum number of bars, keeping the earliest.
    pub limit: Option<usize>,
}

impl BarQuery {
    /// Create a query for a specific time range.
    pub fn range(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            start_time: start,
            end_time: end,
            limit: None,
        }
    }

    /// Set maximum records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time
    }
}

/// Source of historical bars.
///
/// Implementations return bars deduplicated and sorted by timestamp. Gaps
/// are passed through as-is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_bars(&self, query: &BarQuery) -> Result<Vec<MarketBar>>;
}

/// Bars held in memory, keyed by symbol and timeframe.
#[derive(Debug, Default)]
pub struct InMemoryBarSource {
    series: DashMap<(String, Timeframe), Vec<MarketBar>>,
}

impl InMemoryBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a series, sorting it and dropping repeated timestamps.
    pub fn insert(&self, symbol: &str, timeframe: Timeframe, mut bars: Vec<MarketBar>) {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        debug!(symbol, timeframe = %timeframe, bars = bars.len(), "Stored bar series");
        self.series.insert((symbol.to_string(), timeframe), bars);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[async_trait]
impl BarSource for InMemoryBarSource {
    async fn fetch_bars(&self, query: &BarQuery) -> Result<Vec<MarketBar>> {
        let key = (query.symbol.clone(), query.timeframe);
        let Some(series) = self.series.get(&key) else {
            return Ok(Vec::new());
        };

        let bars = series
            .iter()
            .filter(|b| query.contains(b.timestamp))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(bars)
    }
}
