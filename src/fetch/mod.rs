use async_trait::async_trait;
use chrono::NaiveDate;

use crate::directory::Instrument;
use crate::error::Result;
use crate::series::{Frequency, PricePoint};

pub mod batch;
pub mod decode;
pub mod news;
pub mod provider;
pub mod quotes;
pub mod request;

pub use batch::{BatchFetchReport, BatchFetcher, BatchPlan};
pub use news::{Article, NewsOutcome};
pub use provider::FmpClient;
pub use quotes::{Quote, QuoteRequestError, QuoteTable};

/// Starting number of symbols per quote request.
pub const DEFAULT_BATCH_LIMIT: usize = 1500;

/// Default concurrency guard applied when issuing batch requests.
pub const QUOTE_CONCURRENCY_LIMIT: usize = 4;

/// Date sent to the history endpoint when the full history is requested.
pub const EARLIEST_HISTORY_DATE: &str = "1900-01-01";

#[inline]
pub fn ensure_concurrency_limit(limit: usize) -> usize {
    limit.max(1)
}

/// Where a daily history request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStart {
    Beginning,
    From(NaiveDate),
}

impl HistoryStart {
    pub fn as_query_value(&self) -> String {
        match self {
            HistoryStart::Beginning => EARLIEST_HISTORY_DATE.to_string(),
            HistoryStart::From(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One row of the long-format daily history table.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub close: f64,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Quotes for exactly one batch. Size rejections are reported as `TooLarge`.
    async fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> std::result::Result<Vec<Quote>, QuoteRequestError>;
}

#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn daily_closes(
        &self,
        symbols: &[String],
        start: HistoryStart,
    ) -> Result<Vec<HistoricalRow>>;

    /// `Ok(None)` when the provider has no intraday data for the symbol.
    async fn intraday_closes(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<Vec<PricePoint>>>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn stock_news(&self, symbols: &[String], limit: usize) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait InstrumentListSource: Send + Sync {
    async fn tradable_instruments(&self) -> Result<Vec<Instrument>>;
}
