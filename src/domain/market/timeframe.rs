use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle granularities supported by the acquisition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Duration of one candle of this timeframe in minutes
    pub fn minutes(&self) -> usize {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Duration in seconds
    pub fn seconds(&self) -> i64 {
        (self.minutes() * 60) as i64
    }

    /// All timeframes, ascending by duration
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::M1,
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
        ]
    }

    /// Canonical identifier used in cache keys and logs
    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }

    /// Finer timeframes to try, in preference order, when this one cannot be
    /// sourced directly and must be rebuilt by downsampling.
    ///
    /// Only granularities that divide this one evenly are listed, so the
    /// bucket size is always a whole number of source candles.
    pub fn finer_sources(&self) -> Vec<Timeframe> {
        match self {
            Timeframe::M1 => vec![],
            Timeframe::M5 => vec![Timeframe::M1],
            Timeframe::M15 => vec![Timeframe::M5, Timeframe::M1],
            Timeframe::H1 => vec![Timeframe::M15, Timeframe::M5],
            Timeframe::H4 => vec![Timeframe::H1, Timeframe::M15],
            Timeframe::D1 => vec![Timeframe::H4, Timeframe::H1],
        }
    }

    /// Start timestamp (ms) of the period containing the given timestamp
    pub fn period_start(&self, timestamp_ms: i64) -> i64 {
        let timestamp_sec = timestamp_ms / 1000;
        let period_sec = self.seconds();
        (timestamp_sec - (timestamp_sec % period_sec)) * 1000
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "m1" | "1m" | "1min" => Ok(Timeframe::M1),
            "m5" | "5m" | "5min" => Ok(Timeframe::M5),
            "m15" | "15m" | "15min" => Ok(Timeframe::M15),
            "h1" | "1h" | "1hour" => Ok(Timeframe::H1),
            "h4" | "4h" | "4hour" => Ok(Timeframe::H4),
            "d1" | "1d" | "1day" => Ok(Timeframe::D1),
            _ => Err(anyhow!(
                "Invalid timeframe: '{}'. Valid options: M1, M5, M15, H1, H4, D1",
                s
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes() {
        assert_eq!(Timeframe::M1.minutes(), 1);
        assert_eq!(Timeframe::M15.minutes(), 15);
        assert_eq!(Timeframe::H4.minutes(), 240);
        assert_eq!(Timeframe::D1.minutes(), 1440);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Timeframe::from_str("15m").unwrap(), Timeframe::M15);
        assert_eq!(Timeframe::from_str("H4").unwrap(), Timeframe::H4);
        assert_eq!(Timeframe::from_str("1Day").unwrap(), Timeframe::D1);
        assert!(Timeframe::from_str("2w").is_err());
    }

    #[test]
    fn test_period_start() {
        // 2024-01-01 00:00:00 UTC
        let base = 1704067200000i64;
        let tf = Timeframe::H1;

        assert_eq!(tf.period_start(base), base);
        assert_eq!(tf.period_start(base + 42 * 60 * 1000), base);
        assert_eq!(
            tf.period_start(base + 61 * 60 * 1000),
            base + 60 * 60 * 1000
        );
    }

    #[test]
    fn test_finer_sources_divide_evenly() {
        for tf in Timeframe::all() {
            for finer in tf.finer_sources() {
                assert_eq!(tf.minutes() % finer.minutes(), 0);
                assert!(finer.minutes() < tf.minutes());
            }
        }
    }

    #[test]
    fn test_display_matches_code() {
        assert_eq!(Timeframe::M15.to_string(), "M15");
        assert_eq!(Timeframe::D1.to_string(), "D1");
    }
}
