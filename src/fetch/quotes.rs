use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::error::AppError;

/// Live quote for one instrument as returned by the quote endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub changes_percentage: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub day_low: Option<f64>,
    #[serde(default)]
    pub day_high: Option<f64>,
    #[serde(default)]
    pub year_high: Option<f64>,
    #[serde(default)]
    pub year_low: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub price_avg50: Option<f64>,
    #[serde(default)]
    pub price_avg200: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub avg_volume: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default)]
    pub earnings_announcement: Option<String>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Quote {
    /// Bare quote carrying only a symbol; handy for fixtures.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            exchange: None,
            price: None,
            changes_percentage: None,
            change: None,
            day_low: None,
            day_high: None,
            year_high: None,
            year_low: None,
            market_cap: None,
            price_avg50: None,
            price_avg200: None,
            volume: None,
            avg_volume: None,
            open: None,
            previous_close: None,
            eps: None,
            pe: None,
            earnings_announcement: None,
            shares_outstanding: None,
            timestamp: None,
        }
    }

    /// `price / yearHigh * 100`.
    pub fn price_to_year_high_percent(&self) -> Option<f64> {
        ratio(self.price, self.year_high).map(|value| value * 100.0)
    }

    /// `volume / avgVolume`.
    pub fn volume_to_avg_volume_ratio(&self) -> Option<f64> {
        ratio(self.volume, self.avg_volume)
    }

    pub fn market_cap_billions(&self) -> Option<f64> {
        self.market_cap.map(|cap| cap / 1e9)
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let value = numerator? / denominator?;
    value.is_finite().then_some(value)
}

/// Quotes keyed by symbol. Built once per fetch and replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteTable {
    quotes: BTreeMap<String, Quote>,
}

impl QuoteTable {
    /// Merge per-batch results. A symbol seen twice keeps its last quote.
    pub fn merge<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Vec<Quote>>,
    {
        let mut quotes = BTreeMap::new();
        let mut duplicates = Vec::new();

        for quote in batches.into_iter().flatten() {
            if let Some(previous) = quotes.insert(quote.symbol.clone(), quote) {
                duplicates.push(previous.symbol);
            }
        }

        if !duplicates.is_empty() {
            log::warn!(
                "Quote batches overlapped on {} symbol(s), kept the last quote: {}",
                duplicates.len(),
                duplicates.join(", ")
            );
        }

        Self { quotes }
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.quotes.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.quotes.keys().map(String::as_str)
    }

    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.values()
    }

    /// Only instruments that report a market capitalization, i.e. listed equities.
    pub fn stocks_only(&self) -> QuoteTable {
        let quotes = self
            .quotes
            .iter()
            .filter(|(_, quote)| quote.market_cap.is_some())
            .map(|(symbol, quote)| (symbol.clone(), quote.clone()))
            .collect();
        QuoteTable { quotes }
    }
}

/// Outcome of a single batch request other than success.
#[derive(Debug, Error)]
pub enum QuoteRequestError {
    #[error("quote request for {symbols} symbol(s) was rejected as too large")]
    TooLarge { symbols: usize },
    #[error(transparent)]
    Failed(#[from] AppError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ratios_from_raw_fields() {
        let quote = Quote {
            price: Some(100.0),
            year_high: Some(200.0),
            market_cap: Some(3e10),
            volume: Some(1_500.0),
            avg_volume: Some(1_000.0),
            ..Quote::for_symbol("ABC")
        };

        assert_eq!(quote.price_to_year_high_percent(), Some(50.0));
        assert_eq!(quote.market_cap_billions(), Some(30.0));
        assert_eq!(quote.volume_to_avg_volume_ratio(), Some(1.5));
    }

    #[test]
    fn derived_fields_are_absent_without_inputs() {
        let quote = Quote {
            price: Some(10.0),
            year_high: Some(0.0),
            ..Quote::for_symbol("ABC")
        };

        assert_eq!(quote.price_to_year_high_percent(), None);
        assert_eq!(quote.volume_to_avg_volume_ratio(), None);
        assert_eq!(quote.market_cap_billions(), None);
    }

    #[test]
    fn merge_keeps_last_quote_for_duplicates() {
        let first = Quote {
            price: Some(1.0),
            ..Quote::for_symbol("A")
        };
        let second = Quote {
            price: Some(2.0),
            ..Quote::for_symbol("A")
        };

        let table = QuoteTable::merge(vec![vec![first, Quote::for_symbol("B")], vec![second]]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A").and_then(|quote| quote.price), Some(2.0));
    }

    #[test]
    fn stocks_only_requires_market_cap() {
        let stock = Quote {
            market_cap: Some(1e9),
            ..Quote::for_symbol("STOCK")
        };
        let table = QuoteTable::merge(vec![vec![stock, Quote::for_symbol("FUND")]]);

        let stocks = table.stocks_only();

        assert_eq!(stocks.symbols().collect::<Vec<_>>(), vec!["STOCK"]);
        assert_eq!(table.len(), 2);
    }
}
