//! Cross-resolution aggregation: rebuild a coarse candle series from a finer
//! one by fixed-size bucketing. Per bucket: open = first, close = last,
//! high = max, low = min, volume = sum. Output length is ceil(N/k).

use crate::domain::market::candle::{Candle, CandleSeries};
use crate::domain::market::timeframe::Timeframe;
use rust_decimal::Decimal;
use tracing::debug;

/// Downsample `series` from `from` into `to`.
///
/// Returns an empty series when the input is empty or the granularities are
/// incompatible (`to` not strictly coarser, or not an even multiple).
pub fn downsample(series: &CandleSeries, from: Timeframe, to: Timeframe) -> CandleSeries {
    if series.is_empty() {
        return CandleSeries::default();
    }
    if to.minutes() <= from.minutes() || to.minutes() % from.minutes() != 0 {
        debug!(
            "downsample: cannot map {} -> {}, granularities incompatible",
            from, to
        );
        return CandleSeries::default();
    }

    let bucket_size = to.minutes() / from.minutes();
    let mut output = Vec::with_capacity(series.len().div_ceil(bucket_size));

    for bucket in series.candles().chunks(bucket_size) {
        let first = &bucket[0];
        let last = &bucket[bucket.len() - 1];

        let mut high = first.high;
        let mut low = first.low;
        let mut volume: Option<Decimal> = None;

        for candle in bucket {
            high = high.max(candle.high);
            low = low.min(candle.low);
            if let Some(v) = candle.volume {
                volume = Some(volume.unwrap_or(Decimal::ZERO) + v);
            }
        }

        output.push(Candle {
            timestamp: to.period_start(first.timestamp),
            open: first.open,
            high,
            low,
            close: last.close,
            volume,
        });
    }

    CandleSeries::normalized(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn h1_series(count: usize) -> CandleSeries {
        // 2024-01-01 00:00:00 UTC, one H1 candle per hour with a rising close
        let base = 1704067200000i64;
        let candles = (0..count)
            .map(|i| Candle {
                timestamp: base + (i as i64) * 3_600_000,
                open: Decimal::from(100 + i as i64),
                high: Decimal::from(110 + i as i64),
                low: Decimal::from(90 + i as i64),
                close: Decimal::from(105 + i as i64),
                volume: Some(dec!(10)),
            })
            .collect();
        CandleSeries::normalized(candles)
    }

    #[test]
    fn test_h1_to_h4_bucketing() {
        // 24 H1 candles -> 6 H4 candles
        let result = downsample(&h1_series(24), Timeframe::H1, Timeframe::H4);
        assert_eq!(result.len(), 6);

        let first = &result.candles()[0];
        assert_eq!(first.open, dec!(100)); // first H1 open
        assert_eq!(first.close, dec!(108)); // 4th H1 close (105 + 3)
        assert_eq!(first.high, dec!(113)); // max high (110 + 3)
        assert_eq!(first.low, dec!(90)); // min low
        assert_eq!(first.volume, Some(dec!(40))); // summed
    }

    #[test]
    fn test_ragged_tail_bucket() {
        // ceil(10 / 4) = 3 buckets; tail bucket has 2 candles
        let result = downsample(&h1_series(10), Timeframe::H1, Timeframe::H4);
        assert_eq!(result.len(), 3);

        let tail = &result.candles()[2];
        assert_eq!(tail.open, dec!(108)); // 9th candle's open
        assert_eq!(tail.close, dec!(114)); // 10th candle's close
        assert_eq!(tail.volume, Some(dec!(20)));
    }

    #[test]
    fn test_timestamps_align_to_target_periods() {
        let result = downsample(&h1_series(8), Timeframe::H1, Timeframe::H4);
        for candle in result.candles() {
            assert_eq!(Timeframe::H4.period_start(candle.timestamp), candle.timestamp);
        }
    }

    #[test]
    fn test_incompatible_granularities_yield_empty() {
        let series = h1_series(8);
        assert!(downsample(&series, Timeframe::H1, Timeframe::M15).is_empty());
        assert!(downsample(&series, Timeframe::H1, Timeframe::H1).is_empty());
    }

    #[test]
    fn test_missing_volume_stays_missing() {
        let base = 1704067200000i64;
        let candles = (0..4)
            .map(|i| Candle {
                timestamp: base + i * 3_600_000,
                open: dec!(1),
                high: dec!(1),
                low: dec!(1),
                close: dec!(1),
                volume: None,
            })
            .collect();
        let series = CandleSeries::normalized(candles);

        let result = downsample(&series, Timeframe::H1, Timeframe::H4);
        assert_eq!(result.len(), 1);
        assert_eq!(result.candles()[0].volume, None);
    }
}
