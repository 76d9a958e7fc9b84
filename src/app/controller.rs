use std::sync::Arc;

use crate::cli::Commands;
use crate::config::Config;
use crate::directory::Directory;
use crate::error::{AppError, Result};
use crate::fetch::news::top_news;
use crate::fetch::{
    BatchFetcher, FmpClient, NewsOutcome, NewsSource, PriceHistorySource, QuoteSource, QuoteTable,
};
use crate::records::Records;
use crate::series::{ChartFrame, SeriesAssembler, SeriesMode, SeriesOutcome};
use crate::ui::TextTable;

/// Rows of a chart printed to the terminal; the full frame goes to CSV.
const CHART_TAIL_ROWS: usize = 10;

/// What a quotes request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteScope {
    Exchange(String),
    Symbols(Vec<String>),
}

/// Runs CLI commands against the loaded directory and the configured provider.
pub struct AppController {
    config: Config,
    directory: Arc<Directory>,
}

impl AppController {
    pub fn new(config: Config, directory: Arc<Directory>) -> Self {
        Self { config, directory }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    fn client(&self) -> Result<FmpClient> {
        FmpClient::from_config(&self.config)
    }

    fn records(&self) -> Records {
        Records::new(self.config.output.dir.clone())
    }

    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::RefreshDirectory => Err(AppError::message(
                "refresh-directory runs before the directory is loaded",
            )),
            Commands::Exchanges => {
                self.print_exchanges();
                Ok(())
            }
            Commands::Quotes {
                exchange,
                symbols,
                stocks_only,
                save,
            } => {
                let scope = match exchange {
                    Some(exchange) => QuoteScope::Exchange(exchange),
                    None => QuoteScope::Symbols(symbols),
                };
                let table = self.quotes(self.client()?, &scope, stocks_only).await?;
                println!("{}", quote_table_view(&table).render());
                if save {
                    let path = self.records().save_quotes(&scope.label(), &table)?;
                    println!("Saved to {}", path.display());
                }
                Ok(())
            }
            Commands::Chart {
                name,
                mode,
                frequency,
                save,
            } => {
                let mode = mode.with_frequency(frequency);
                match self.chart(self.client()?, &name, mode).await? {
                    SeriesOutcome::Ready(frame) => {
                        println!("{}", chart_tail_view(&frame, CHART_TAIL_ROWS).render());
                        if save {
                            let path = self.records().save_chart(&frame.symbol, &frame)?;
                            println!("Saved to {}", path.display());
                        }
                    }
                    SeriesOutcome::NotAvailable => {
                        println!("No data available for {name} at this frequency.");
                    }
                }
                Ok(())
            }
            Commands::News { name, limit } => {
                let limit = limit.unwrap_or(self.config.news.limit);
                match self.news(&self.client()?, &name, limit).await? {
                    NewsOutcome::Articles(articles) => {
                        let mut table = TextTable::new(["Date", "Time", "Title", "Link"]);
                        for article in &articles {
                            table.push_row(vec![
                                article.date().to_string(),
                                article.time().to_string(),
                                article.title.clone(),
                                article.url.clone(),
                            ]);
                        }
                        println!("{}", table.render());
                    }
                    NewsOutcome::NoNews => println!("No news for {name}."),
                }
                Ok(())
            }
        }
    }

    fn print_exchanges(&self) {
        let mut table = TextTable::new(["Exchange", "Instruments"]).right_align_from(1);
        for exchange in self.directory.exchanges() {
            let count = self.directory.symbols_for_exchange(exchange).len();
            table.push_row(vec![exchange.to_string(), count.to_string()]);
        }
        println!("{}", table.render());
    }

    pub async fn quotes<S: QuoteSource>(
        &self,
        source: S,
        scope: &QuoteScope,
        stocks_only: bool,
    ) -> Result<QuoteTable> {
        let fetch = &self.config.fetch;
        let fetcher = BatchFetcher::with_limits(
            source,
            fetch.batch_limit,
            fetch.max_replans,
            fetch.concurrency,
        );

        let table = match scope {
            QuoteScope::Exchange(exchange) => {
                fetcher
                    .fetch_exchange_quotes(&self.directory, exchange)
                    .await?
            }
            QuoteScope::Symbols(symbols) => fetcher.fetch_all_quotes(symbols).await?,
        };

        Ok(if stocks_only {
            table.stocks_only()
        } else {
            table
        })
    }

    pub async fn chart<S: PriceHistorySource>(
        &self,
        source: S,
        display_key: &str,
        mode: SeriesMode,
    ) -> Result<SeriesOutcome> {
        let instrument = self.directory.lookup(display_key)?;
        let assembler = SeriesAssembler::new(source, self.config.series.windows());
        assembler.build_series(instrument, mode).await
    }

    pub async fn news<S: NewsSource + ?Sized>(
        &self,
        source: &S,
        display_key: &str,
        limit: usize,
    ) -> Result<NewsOutcome> {
        let instrument = self.directory.lookup(display_key)?;
        top_news(source, &instrument.symbol, limit).await
    }
}

impl QuoteScope {
    fn label(&self) -> String {
        match self {
            QuoteScope::Exchange(exchange) => exchange.clone(),
            QuoteScope::Symbols(_) => "symbols".to_string(),
        }
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn quote_table_view(table: &QuoteTable) -> TextTable {
    let mut view = TextTable::new([
        "Symbol",
        "Name",
        "Price",
        "Change (%)",
        "Market Cap (B)",
        "Vol/Avg",
        "% of 52w High",
        "Exchange",
    ])
    .right_align_from(2);

    for quote in table.quotes() {
        view.push_row(vec![
            quote.symbol.clone(),
            quote.name.clone().unwrap_or_default(),
            fixed(quote.price, 2),
            fixed(quote.changes_percentage, 2),
            fixed(quote.market_cap_billions(), 2),
            fixed(quote.volume_to_avg_volume_ratio(), 2),
            fixed(quote.price_to_year_high_percent(), 1),
            quote.exchange.clone().unwrap_or_default(),
        ]);
    }

    view
}

fn chart_tail_view(frame: &ChartFrame, rows: usize) -> TextTable {
    let mut headers = vec!["Date".to_string()];
    headers.extend(frame.columns().iter().map(|column| column.label.clone()));
    let mut view = TextTable::new(headers).right_align_from(1);

    let start = frame.len().saturating_sub(rows);
    for (offset, timestamp) in frame.index[start..].iter().enumerate() {
        let row = start + offset;
        let mut cells = vec![timestamp.format("%Y-%m-%d %H:%M").to_string()];
        cells.extend(
            frame
                .columns()
                .iter()
                .map(|column| fixed(column.values.get(row).copied().flatten(), 2)),
        );
        view.push_row(cells);
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Instrument;
    use crate::fetch::{Article, Quote, QuoteRequestError};
    use async_trait::async_trait;

    struct EchoQuotes;

    #[async_trait]
    impl QuoteSource for EchoQuotes {
        async fn fetch_quotes(
            &self,
            symbols: &[String],
        ) -> std::result::Result<Vec<Quote>, QuoteRequestError> {
            Ok(symbols
                .iter()
                .map(|symbol| Quote {
                    market_cap: (symbol != "ETF").then_some(1e9),
                    ..Quote::for_symbol(symbol.clone())
                })
                .collect())
        }
    }

    struct NoArticles;

    #[async_trait]
    impl NewsSource for NoArticles {
        async fn stock_news(&self, _symbols: &[String], _limit: usize) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }
    }

    fn controller() -> AppController {
        let directory = Directory::from_instruments(vec![
            Instrument {
                symbol: "SAP.DE".to_string(),
                name: "SAP SE".to_string(),
                exchange: "XETRA".to_string(),
            },
            Instrument {
                symbol: "ETF".to_string(),
                name: "Some Fund".to_string(),
                exchange: "XETRA".to_string(),
            },
            Instrument {
                symbol: "NFLX".to_string(),
                name: "Netflix, Inc.".to_string(),
                exchange: "NASDAQ".to_string(),
            },
        ]);
        AppController::new(Config::builtin(), Arc::new(directory))
    }

    #[tokio::test]
    async fn exchange_quotes_can_be_limited_to_stocks() {
        let controller = controller();
        let scope = QuoteScope::Exchange("XETRA".to_string());

        let all = controller.quotes(EchoQuotes, &scope, false).await.unwrap();
        let stocks = controller.quotes(EchoQuotes, &scope, true).await.unwrap();

        assert_eq!(all.symbols().collect::<Vec<_>>(), vec!["ETF", "SAP.DE"]);
        assert_eq!(stocks.symbols().collect::<Vec<_>>(), vec!["SAP.DE"]);
    }

    #[tokio::test]
    async fn news_for_unknown_instrument_is_an_error() {
        let controller = controller();

        let err = controller
            .news(&NoArticles, "Nobody, NOPE", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownInstrument(_)));
    }

    #[tokio::test]
    async fn news_without_articles_is_reported_as_such() {
        let controller = controller();

        let outcome = controller
            .news(&NoArticles, "Netflix, Inc., NFLX", 5)
            .await
            .unwrap();

        assert_eq!(outcome, NewsOutcome::NoNews);
    }

    #[test]
    fn quote_view_formats_missing_values_as_dashes() {
        let table = QuoteTable::merge(vec![vec![Quote::for_symbol("SAP.DE")]]);

        let rendered = quote_table_view(&table).render();
        let row = rendered.lines().nth(2).unwrap();

        assert!(row.starts_with("SAP.DE"));
        assert!(row.contains('-'));
    }
}
