use std::collections::HashSet;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::directory::Directory;
use crate::error::{AppError, Result};

use super::quotes::{Quote, QuoteRequestError, QuoteTable};
use super::{ensure_concurrency_limit, QuoteSource, DEFAULT_BATCH_LIMIT, QUOTE_CONCURRENCY_LIMIT};

/// Default cap on how many times a fetch may re-partition after size rejections.
pub const DEFAULT_MAX_REPLANS: usize = 32;

/// Ordered partition of a ticker list into disjoint, non-empty, contiguous groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    groups: Vec<Vec<String>>,
}

impl BatchPlan {
    /// Split `tickers` into `groups` contiguous runs whose sizes differ by at most one.
    ///
    /// The group count is clamped to `1..=tickers.len()` so no group is empty.
    pub fn partition(tickers: &[String], groups: usize) -> Self {
        if tickers.is_empty() {
            return Self { groups: Vec::new() };
        }

        let count = groups.clamp(1, tickers.len());
        let base = tickers.len() / count;
        let remainder = tickers.len() % count;

        let mut partition = Vec::with_capacity(count);
        let mut offset = 0;
        for index in 0..count {
            let size = base + usize::from(index < remainder);
            partition.push(tickers[offset..offset + size].to_vec());
            offset += size;
        }

        Self { groups: partition }
    }

    /// `ceil(len / batch_limit)`, never below one.
    pub fn initial_group_count(ticker_count: usize, batch_limit: usize) -> usize {
        ticker_count.div_ceil(batch_limit.max(1)).max(1)
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn largest_group(&self) -> usize {
        self.groups.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// What one completed fetch looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFetchReport {
    pub table: QuoteTable,
    /// Group count used by every attempt, in order. The last entry succeeded.
    pub attempts: Vec<usize>,
}

enum FetchState {
    Planning { groups: usize },
    Requesting(BatchPlan),
    Replanning { rejected: BatchPlan },
    Merged(QuoteTable),
    Failed(AppError),
}

/// Fetches quotes for any number of symbols, shrinking batches whenever the
/// provider rejects a request as too large.
pub struct BatchFetcher<S> {
    source: S,
    batch_limit: usize,
    max_replans: usize,
    concurrency_limit: usize,
}

impl<S: QuoteSource> BatchFetcher<S> {
    pub fn new(source: S) -> Self {
        Self::with_limits(
            source,
            DEFAULT_BATCH_LIMIT,
            DEFAULT_MAX_REPLANS,
            QUOTE_CONCURRENCY_LIMIT,
        )
    }

    pub fn with_limits(
        source: S,
        batch_limit: usize,
        max_replans: usize,
        concurrency_limit: usize,
    ) -> Self {
        Self {
            source,
            batch_limit: batch_limit.max(1),
            max_replans,
            concurrency_limit: ensure_concurrency_limit(concurrency_limit),
        }
    }

    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    pub async fn fetch_all_quotes(&self, tickers: &[String]) -> Result<QuoteTable> {
        self.fetch_with_report(tickers).await.map(|report| report.table)
    }

    /// Quotes for every symbol the directory lists on `exchange`.
    pub async fn fetch_exchange_quotes(
        &self,
        directory: &Directory,
        exchange: &str,
    ) -> Result<QuoteTable> {
        let tickers = directory.symbols_for_exchange(exchange);
        if tickers.is_empty() {
            log::warn!("No instruments listed on exchange {}", exchange);
        }
        self.fetch_all_quotes(&tickers).await
    }

    pub async fn fetch_with_report(&self, tickers: &[String]) -> Result<BatchFetchReport> {
        let tickers = unique_tickers(tickers);
        let mut attempts = Vec::new();

        if tickers.is_empty() {
            return Ok(BatchFetchReport {
                table: QuoteTable::default(),
                attempts,
            });
        }

        let mut state = FetchState::Planning {
            groups: BatchPlan::initial_group_count(tickers.len(), self.batch_limit),
        };

        loop {
            state = match state {
                FetchState::Planning { groups } => {
                    FetchState::Requesting(BatchPlan::partition(&tickers, groups))
                }
                FetchState::Requesting(plan) => {
                    attempts.push(plan.len());
                    log::info!(
                        "Requesting quotes for {} symbols in {} batch(es) of up to {}",
                        tickers.len(),
                        plan.len(),
                        plan.largest_group()
                    );
                    match self.request_plan(&plan).await {
                        Ok(batches) => FetchState::Merged(QuoteTable::merge(batches)),
                        Err(QuoteRequestError::TooLarge { symbols }) => {
                            log::warn!(
                                "Provider rejected a batch of {} symbols as too large",
                                symbols
                            );
                            FetchState::Replanning { rejected: plan }
                        }
                        Err(QuoteRequestError::Failed(err)) => FetchState::Failed(err),
                    }
                }
                FetchState::Replanning { rejected } => {
                    if rejected.len() >= tickers.len() {
                        FetchState::Failed(AppError::RequestTooLarge { symbols: 1 })
                    } else if attempts.len() > self.max_replans {
                        FetchState::Failed(AppError::ReplanLimitExceeded {
                            attempts: attempts.len(),
                        })
                    } else {
                        FetchState::Planning {
                            groups: rejected.len() + 1,
                        }
                    }
                }
                FetchState::Merged(table) => {
                    log::info!(
                        "Fetched {} quotes for {} requested symbols",
                        table.len(),
                        tickers.len()
                    );
                    return Ok(BatchFetchReport { table, attempts });
                }
                FetchState::Failed(err) => return Err(err),
            };
        }
    }

    /// Issue every batch of the plan; the first rejection or failure abandons the attempt.
    async fn request_plan(
        &self,
        plan: &BatchPlan,
    ) -> std::result::Result<Vec<Vec<Quote>>, QuoteRequestError> {
        stream::iter(plan.groups())
            .map(|group| self.source.fetch_quotes(group))
            .buffer_unordered(self.concurrency_limit)
            .try_collect()
            .await
    }
}

/// Drop repeated symbols, keeping the first occurrence.
fn unique_tickers(tickers: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tickers.len());
    tickers
        .iter()
        .filter(|ticker| seen.insert(ticker.as_str()))
        .cloned()
        .collect()
}
