pub mod candle;
pub mod series;
pub mod timeframe;

pub use candle::{CachedSeries, Candle, CandleSeries};
pub use series::{Quality, SeriesRequest, SeriesResult, SeriesSource};
pub use timeframe::Timeframe;
