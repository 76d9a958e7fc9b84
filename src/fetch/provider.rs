use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio::time::{sleep, Duration};

use crate::config::{ApiConfig, Config, EndpointTemplates, FetchConfig};
use crate::directory::Instrument;
use crate::error::{AppError, Result};
use crate::series::{Frequency, PricePoint};

use super::decode;
use super::news::Article;
use super::quotes::{Quote, QuoteRequestError};
use super::request::{expand_env_vars, join_symbols, prepare_url, RequestContext};
use super::{
    HistoricalRow, HistoryStart, InstrumentListSource, NewsSource, PriceHistorySource, QuoteSource,
};

/// HTTP client for a Financial Modeling Prep style REST API.
#[derive(Debug, Clone)]
pub struct FmpClient {
    client: Client,
    base_url: String,
    api_key: String,
    endpoints: EndpointTemplates,
    max_retries: usize,
}

impl FmpClient {
    pub fn new(api: &ApiConfig, fetch: &FetchConfig) -> Result<Self> {
        let api_key = expand_env_vars(&api.api_key)?;
        let client = Client::builder().timeout(fetch.timeout).build()?;

        Ok(Self {
            client,
            base_url: api.base_url.clone(),
            api_key,
            endpoints: api.endpoints.clone(),
            max_retries: fetch.max_retries,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api, &config.fetch)
    }

    fn url(&self, template: &str, extras: &[(&str, String)]) -> Result<String> {
        prepare_url(
            template,
            RequestContext {
                base_url: &self.base_url,
                api_key: &self.api_key,
                extras,
            },
        )
    }

    /// GET with exponential backoff on transport errors and transient statuses,
    /// up to `max_retries` extra attempts (none by default).
    /// URLs carry the API key, so only `what` is logged.
    async fn get(&self, url: &str, what: &str) -> Result<Response> {
        let mut attempt = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) if is_transient(response.status()) && attempt < self.max_retries => {
                    log::warn!(
                        "{} request returned {}, retrying ({}/{})",
                        what,
                        response.status(),
                        attempt + 1,
                        self.max_retries
                    );
                }
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.max_retries && (err.is_timeout() || err.is_connect()) => {
                    log::warn!(
                        "{} request failed: {}, retrying ({}/{})",
                        what,
                        err.without_url(),
                        attempt + 1,
                        self.max_retries
                    );
                }
                Err(err) => return Err(err.without_url().into()),
            }

            attempt += 1;
            let delay = Duration::from_millis(2_u64.pow(attempt as u32) * 250);
            sleep(delay).await;
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// The provider answers oversized symbol lists with 414 or 413.
pub fn is_too_large(status: StatusCode) -> bool {
    status == StatusCode::URI_TOO_LONG || status == StatusCode::PAYLOAD_TOO_LARGE
}

async fn success_body(response: Response, what: &str) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Status {
            context: format!("{what} request"),
            status,
        });
    }
    Ok(response.text().await?)
}

#[async_trait]
impl QuoteSource for FmpClient {
    async fn fetch_quotes(
        &self,
        symbols: &[String],
    ) -> std::result::Result<Vec<Quote>, QuoteRequestError> {
        let url = self.url(&self.endpoints.quote, &[("symbols", join_symbols(symbols))])?;
        let response = self.get(&url, "quote").await?;

        if is_too_large(response.status()) {
            return Err(QuoteRequestError::TooLarge {
                symbols: symbols.len(),
            });
        }

        let body = success_body(response, "quote").await?;
        Ok(decode::parse_quotes(&body)?)
    }
}

#[async_trait]
impl PriceHistorySource for FmpClient {
    async fn daily_closes(
        &self,
        symbols: &[String],
        start: HistoryStart,
    ) -> Result<Vec<HistoricalRow>> {
        let url = self.url(
            &self.endpoints.history,
            &[
                ("symbols", join_symbols(symbols)),
                ("from", start.as_query_value()),
            ],
        )?;
        let response = self.get(&url, "history").await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body = success_body(response, "history").await?;
        decode::parse_daily_history(&body)
    }

    async fn intraday_closes(
        &self,
        symbol: &str,
        frequency: Frequency,
    ) -> Result<Option<Vec<PricePoint>>> {
        let url = self.url(
            &self.endpoints.intraday,
            &[
                ("symbol", symbol.to_string()),
                ("frequency", frequency.as_str().to_string()),
            ],
        )?;
        let response = self.get(&url, "intraday").await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = success_body(response, "intraday").await?;
        let points = decode::parse_intraday(&body)?;
        Ok((!points.is_empty()).then_some(points))
    }
}

#[async_trait]
impl NewsSource for FmpClient {
    async fn stock_news(&self, symbols: &[String], limit: usize) -> Result<Vec<Article>> {
        let url = self.url(
            &self.endpoints.news,
            &[
                ("symbols", join_symbols(symbols)),
                ("limit", limit.to_string()),
            ],
        )?;
        let response = self.get(&url, "news").await?;
        let body = success_body(response, "news").await?;
        decode::parse_news(&body)
    }
}

#[async_trait]
impl InstrumentListSource for FmpClient {
    async fn tradable_instruments(&self) -> Result<Vec<Instrument>> {
        let url = self.url(&self.endpoints.listing, &[])?;
        let response = self.get(&url, "listing").await?;
        let body = success_body(response, "listing").await?;
        let instruments = decode::parse_listing(&body)?;

        if instruments.is_empty() {
            return Err(AppError::message(
                "Instrument listing came back empty; keeping the existing snapshot",
            ));
        }
        Ok(instruments)
    }
}
