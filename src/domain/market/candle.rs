use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV point. Timestamps are unix epoch milliseconds, aligned to
/// the start of the candle's period. Volume is absent for sources that do
/// not report it (FX reference rates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Option<Decimal>,
}

/// An ordered candle series: ascending by timestamp, no duplicates.
///
/// Provider adapters return whatever shape their API produced;
/// `CandleSeries::normalized` is the single place where ordering and
/// de-duplication are enforced, so everything downstream can rely on both.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandleSeries(Vec<Candle>);

impl CandleSeries {
    /// Build a series from raw provider output: sorts ascending and keeps
    /// the last entry seen for any duplicated timestamp.
    pub fn normalized(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Self(candles)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.0
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.0
    }

    /// Most recent candle, if any
    pub fn latest(&self) -> Option<&Candle> {
        self.0.last()
    }
}

/// Versioned wire/cache record for a candle series.
///
/// The version field lets a future payload change coexist with entries
/// already persisted in the durable tier; readers skip versions they do not
/// understand instead of failing the whole lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSeries {
    pub version: u32,
    pub candles: Vec<Candle>,
}

impl CachedSeries {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(series: &CandleSeries) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            candles: series.candles().to_vec(),
        }
    }

    pub fn into_series(self) -> CandleSeries {
        CandleSeries::normalized(self.candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(ts: i64, close: Decimal) -> Candle {
        Candle {
            timestamp: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: Some(dec!(10)),
        }
    }

    #[test]
    fn test_normalized_sorts_and_dedups() {
        let raw = vec![
            candle(3000, dec!(3)),
            candle(1000, dec!(1)),
            candle(3000, dec!(4)),
            candle(2000, dec!(2)),
        ];
        let series = CandleSeries::normalized(raw);

        assert_eq!(series.len(), 3);
        let timestamps: Vec<i64> = series.candles().iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_latest_is_last() {
        let series = CandleSeries::normalized(vec![candle(1000, dec!(1)), candle(2000, dec!(2))]);
        assert_eq!(series.latest().unwrap().timestamp, 2000);
    }

    #[test]
    fn test_cached_series_round_trip() {
        let series = CandleSeries::normalized(vec![candle(1000, dec!(1))]);
        let record = CachedSeries::new(&series);
        assert_eq!(record.version, CachedSeries::CURRENT_VERSION);

        let json = serde_json::to_string(&record).unwrap();
        let decoded: CachedSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.into_series(), series);
    }
}
