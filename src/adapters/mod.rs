pub mod binance_futures;

pub use binance_futures::{classify_response, format_decimal, BinanceFuturesClient};
