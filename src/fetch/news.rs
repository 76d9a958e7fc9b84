use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::NewsSource;

/// A single news item about one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub symbol: String,
    /// Provider timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub published_date: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub site: Option<String>,
}

impl Article {
    pub fn date(&self) -> &str {
        self.published_date
            .split_once(' ')
            .map_or(self.published_date.as_str(), |(date, _)| date)
    }

    pub fn time(&self) -> &str {
        self.published_date
            .split_once(' ')
            .map_or("", |(_, time)| time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsOutcome {
    Articles(Vec<Article>),
    NoNews,
}

/// Latest articles for `symbol`, newest first, capped at `limit`.
///
/// Articles the provider attributes to other symbols are dropped.
pub async fn top_news<S>(source: &S, symbol: &str, limit: usize) -> Result<NewsOutcome>
where
    S: NewsSource + ?Sized,
{
    let symbols = [symbol.to_string()];
    let mut articles: Vec<Article> = source
        .stock_news(&symbols, limit)
        .await?
        .into_iter()
        .filter(|article| article.symbol == symbol)
        .collect();

    articles.sort_by(|a, b| b.published_date.cmp(&a.published_date));
    articles.truncate(limit);

    if articles.is_empty() {
        log::info!("No news for {}", symbol);
        Ok(NewsOutcome::NoNews)
    } else {
        Ok(NewsOutcome::Articles(articles))
    }
}
