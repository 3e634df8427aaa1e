pub mod binance;
pub mod frankfurter;
pub mod openai_chat;
pub mod twelvedata;

pub use binance::BinanceProvider;
pub use frankfurter::FrankfurterProvider;
pub use openai_chat::OpenAiChatProvider;
pub use twelvedata::TwelveDataProvider;
