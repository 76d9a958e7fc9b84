use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::directory::Instrument;
use crate::error::{AppError, Context, Result};
use crate::series::PricePoint;

use super::news::Article;
use super::quotes::Quote;
use super::HistoricalRow;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a JSON body, surfacing the provider's `Error Message` objects as errors.
fn parse_body(body: &str, what: &str) -> Result<Value> {
    let root: Value = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse {what} response as JSON"))?;

    if let Some(message) = root.get("Error Message").and_then(Value::as_str) {
        return Err(AppError::message(format!(
            "Provider rejected {what} request: {message}"
        )));
    }

    Ok(root)
}

fn expect_array(root: Value, what: &str) -> Result<Vec<Value>> {
    match root {
        Value::Array(items) => Ok(items),
        other => Err(AppError::message(format!(
            "Unexpected {what} payload: expected an array, found {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Quotes of one batch. A record that does not decode is skipped with a warning
/// so the other instruments of the batch survive.
pub fn parse_quotes(body: &str) -> Result<Vec<Quote>> {
    let items = expect_array(parse_body(body, "quote")?, "quote")?;

    let mut quotes = Vec::with_capacity(items.len());
    for item in items {
        let symbol = item
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or("<no symbol>")
            .to_string();
        let quote = match serde_json::from_value::<Quote>(item) {
            Ok(quote) => quote,
            Err(err) => {
                log::warn!("Skipping undecodable quote for {}: {}", symbol, err);
                continue;
            }
        };
        quotes.push(quote);
    }

    Ok(quotes)
}

/// Daily closes in long format, from either a single-symbol payload or a
/// `historicalStockList` payload. An empty object means no data.
pub fn parse_daily_history(body: &str) -> Result<Vec<HistoricalRow>> {
    let root = parse_body(body, "history")?;

    let blocks: Vec<&Value> = if let Some(list) = root.get("historicalStockList") {
        list.as_array()
            .ok_or_else(|| AppError::message("historicalStockList must be an array"))?
            .iter()
            .collect()
    } else if root.get("historical").is_some() {
        vec![&root]
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for block in blocks {
        let Some(symbol) = block.get("symbol").and_then(Value::as_str) else {
            continue;
        };
        let Some(entries) = block.get("historical").and_then(Value::as_array) else {
            continue;
        };

        for entry in entries {
            let Some(date) = entry.get("date").and_then(Value::as_str) else {
                continue;
            };
            let Some(close) = entry.get("close").and_then(Value::as_f64) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(date, DATE_FORMAT)?;
            rows.push(HistoricalRow {
                date,
                symbol: symbol.to_string(),
                close,
            });
        }
    }

    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));
    Ok(rows)
}

/// Intraday closes in ascending time order. The provider lists newest first.
pub fn parse_intraday(body: &str) -> Result<Vec<PricePoint>> {
    let items = expect_array(parse_body(body, "intraday")?, "intraday")?;

    let mut points = Vec::with_capacity(items.len());
    for item in &items {
        let Some(date) = item.get("date").and_then(Value::as_str) else {
            continue;
        };
        let Some(close) = item.get("close").and_then(Value::as_f64) else {
            continue;
        };
        let timestamp = NaiveDateTime::parse_from_str(date, DATE_TIME_FORMAT)?;
        points.push(PricePoint::new(timestamp, close));
    }

    points.sort_by_key(|point| point.timestamp);
    Ok(points)
}

pub fn parse_news(body: &str) -> Result<Vec<Article>> {
    let items = expect_array(parse_body(body, "news")?, "news")?;
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(AppError::from))
        .collect()
}

/// Tradable instruments; `exchangeShortName` stands in when `exchange` is missing.
pub fn parse_listing(body: &str) -> Result<Vec<Instrument>> {
    let items = expect_array(parse_body(body, "listing")?, "listing")?;

    let mut instruments = Vec::with_capacity(items.len());
    for item in &items {
        let Some(symbol) = item.get("symbol").and_then(Value::as_str) else {
            continue;
        };
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let exchange = item
            .get("exchange")
            .and_then(Value::as_str)
            .or_else(|| item.get("exchangeShortName").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        instruments.push(Instrument {
            symbol: symbol.to_string(),
            name,
            exchange,
        });
    }

    Ok(instruments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_payload() {
        let body = r#"[
            {"symbol":"NFLX","name":"Netflix, Inc.","price":600.5,"changesPercentage":1.25,
             "yearHigh":700.0,"marketCap":260000000000,"volume":3000000,"avgVolume":4000000,
             "exchange":"NASDAQ","earningsAnnouncement":"2024-04-18T20:00:00.000+0000",
             "timestamp":1700000000},
            {"symbol":"SPY","price":null}
        ]"#;

        let quotes = parse_quotes(body).unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].name.as_deref(), Some("Netflix, Inc."));
        assert_eq!(quotes[0].market_cap_billions(), Some(260.0));
        assert_eq!(quotes[0].volume_to_avg_volume_ratio(), Some(0.75));
        assert_eq!(quotes[1].price, None);
    }

    #[test]
    fn skips_malformed_quote_records_and_keeps_the_rest() {
        let body = r#"[
            {"symbol":"GOOD","price":10.0},
            {"symbol":"ODD","price":"n/a"},
            {"price":3.0},
            {"symbol":"ALSO","price":12.5}
        ]"#;

        let quotes = parse_quotes(body).unwrap();

        let symbols: Vec<_> = quotes.iter().map(|quote| quote.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["GOOD", "ALSO"]);
        assert_eq!(quotes[0].price, Some(10.0));
    }

    #[test]
    fn surfaces_provider_error_messages() {
        let err = parse_quotes(r#"{"Error Message":"Invalid API KEY."}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid API KEY."));
    }

    #[test]
    fn parses_single_symbol_history() {
        let body = r#"{"symbol":"NFLX","historical":[
            {"date":"2024-01-03","close":470.26},
            {"date":"2024-01-02","close":468.5}
        ]}"#;

        let rows = parse_daily_history(body).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[1].close, 470.26);
    }

    #[test]
    fn parses_history_stock_list() {
        let body = r#"{"historicalStockList":[
            {"symbol":"MSFT","historical":[{"date":"2024-01-02","close":370.87}]},
            {"symbol":"AAPL","historical":[{"date":"2024-01-02","close":185.64}]}
        ]}"#;

        let rows = parse_daily_history(body).unwrap();

        let symbols: Vec<_> = rows.iter().map(|row| row.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn empty_history_object_has_no_rows() {
        assert!(parse_daily_history("{}").unwrap().is_empty());
    }

    #[test]
    fn intraday_points_are_sorted_ascending() {
        let body = r#"[
            {"date":"2024-01-02 10:00:00","open":1,"close":101.0},
            {"date":"2024-01-02 09:30:00","open":1,"close":100.0}
        ]"#;

        let points = parse_intraday(body).unwrap();

        assert_eq!(points.len(), 2);
        assert!(points[0].timestamp < points[1].timestamp);
        assert_eq!(points[0].close, Some(100.0));
    }

    #[test]
    fn parses_news_items() {
        let body = r#"[{"symbol":"NFLX","publishedDate":"2024-03-01 14:05:00",
            "title":"Headline","text":"Body","url":"https://news.test/a","site":"news.test"}]"#;

        let articles = parse_news(body).unwrap();

        assert_eq!(articles[0].title, "Headline");
        assert_eq!(articles[0].site.as_deref(), Some("news.test"));
    }

    #[test]
    fn listing_falls_back_to_short_exchange_name() {
        let body = r#"[
            {"symbol":"SAP.DE","name":"SAP SE","exchange":"XETRA"},
            {"symbol":"XYZ","name":null,"exchangeShortName":"NYSE"},
            {"name":"no symbol"}
        ]"#;

        let instruments = parse_listing(body).unwrap();

        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[1].exchange, "NYSE");
        assert_eq!(instruments[1].name, "");
    }

    #[test]
    fn rejects_non_array_payloads() {
        let err = parse_intraday(r#"{"unexpected":true}"#).unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }
}
