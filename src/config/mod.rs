use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::batch::DEFAULT_MAX_REPLANS;
use crate::fetch::{DEFAULT_BATCH_LIMIT, QUOTE_CONCURRENCY_LIMIT};
use crate::series::MovingAverageWindows;

pub mod loader;
pub mod validator;

pub use loader::load_or_builtin;

pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com";
pub const DEFAULT_API_KEY: &str = "${FMP_API_KEY}";

/// URL templates for every provider endpoint. Placeholders use `{name}` syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplates {
    pub quote: String,
    pub history: String,
    pub intraday: String,
    pub news: String,
    pub listing: String,
}

impl Default for EndpointTemplates {
    fn default() -> Self {
        Self {
            quote: "{base_url}/api/v3/quote/{symbols}?apikey={api_key}".to_string(),
            history: "{base_url}/api/v3/historical-price-full/{symbols}?serietype=line&from={from}&apikey={api_key}".to_string(),
            intraday: "{base_url}/api/v3/historical-chart/{frequency}/{symbol}?apikey={api_key}"
                .to_string(),
            news: "{base_url}/api/v3/stock_news?tickers={symbols}&limit={limit}&apikey={api_key}"
                .to_string(),
            listing: "{base_url}/api/v3/available-traded/list?apikey={api_key}".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// May contain `${ENV}` placeholders, expanded when the client is built.
    pub api_key: String,
    pub endpoints: EndpointTemplates,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub batch_limit: usize,
    pub max_replans: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    /// Extra attempts for transport errors and 5xx/429 responses. Zero by default,
    /// so such failures abort the fetch.
    pub max_retries: usize,
}

#[derive(Debug, Clone)]
pub struct SeriesConfig {
    pub short_window_days: i64,
    pub long_window_days: i64,
}

impl SeriesConfig {
    pub fn windows(&self) -> MovingAverageWindows {
        MovingAverageWindows::from_days(self.short_window_days, self.long_window_days)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub series: SeriesConfig,
    pub directory: DirectoryConfig,
    pub news: NewsConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn builtin() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: DEFAULT_API_KEY.to_string(),
                endpoints: EndpointTemplates::default(),
            },
            fetch: FetchConfig {
                batch_limit: DEFAULT_BATCH_LIMIT,
                max_replans: DEFAULT_MAX_REPLANS,
                concurrency: QUOTE_CONCURRENCY_LIMIT,
                timeout: Duration::from_secs(30),
                max_retries: 0,
            },
            series: SeriesConfig {
                short_window_days: 30,
                long_window_days: 200,
            },
            directory: DirectoryConfig {
                snapshot: PathBuf::from("assets/instruments.csv"),
            },
            news: NewsConfig { limit: 20 },
            output: OutputConfig {
                dir: PathBuf::from("exports"),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}
