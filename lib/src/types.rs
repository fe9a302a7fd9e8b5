use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::Deserialize;

/// The most klines the exchange returns for a single request.
pub const MAX_LIMIT: u32 = 1000;

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct KlineRequest {
    pub(crate) symbol: String,
    pub(crate) interval: String,
    /// Inclusive lower bound, epoch milliseconds.
    pub(crate) start_ms: i64,
    /// Inclusive upper bound, epoch milliseconds.
    pub(crate) end_ms: i64,
    #[builder(default = "MAX_LIMIT")]
    pub(crate) limit: u32,
}

impl KlineRequest {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// One candlestick as returned by `GET /api/v3/klines`.
///
/// The exchange encodes each kline as a positional JSON array:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
/// trades, taker_buy_base, taker_buy_quote, ignore]`.
/// Prices and volumes arrive as strings and are kept as [`Decimal`] so their
/// textual precision survives into the CSV output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawKline")]
pub struct Kline {
    /// The Unix Msec timestamp for the start of the kline.
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// The Unix Msec timestamp for the last millisecond of the kline.
    pub close_time: i64,
    pub quote_volume: Decimal,
    pub trades: u64,
    pub taker_buy_base_volume: Decimal,
    pub taker_buy_quote_volume: Decimal,
    /// Unused by the exchange.
    pub ignore: String,
}

#[derive(Deserialize)]
struct RawKline(
    i64,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    i64,
    Decimal,
    u64,
    Decimal,
    Decimal,
    String,
);

impl From<RawKline> for Kline {
    fn from(raw: RawKline) -> Self {
        let RawKline(
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
            quote_volume,
            trades,
            taker_buy_base_volume,
            taker_buy_quote_volume,
            ignore,
        ) = raw;
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
            quote_volume,
            trades,
            taker_buy_base_volume,
            taker_buy_quote_volume,
            ignore,
        }
    }
}

/// Error body the exchange sends alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub(crate) struct ExchangeError {
    pub code: i64,
    pub msg: String,
}
