use std::io::Write;

use crate::error::Result;
use crate::fetch::{Quote, QuoteTable};
use crate::series::ChartFrame;

/// Market-view column order; `marketCap` is in billions.
pub const QUOTE_COLUMNS: [&str; 23] = [
    "name",
    "symbol",
    "changesPercentage",
    "marketCap",
    "volume",
    "voltoavgvolume",
    "price",
    "change",
    "dayLow",
    "dayHigh",
    "yearHigh",
    "yearLow",
    "priceAvg50",
    "priceAvg200",
    "exchange",
    "open",
    "previousClose",
    "eps",
    "pe",
    "earningsAnnouncement",
    "sharesOutstanding",
    "timestamp",
    "priceToYearHighPercent",
];

const INDEX_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn quote_row(quote: &Quote) -> [String; 23] {
    [
        quote.name.clone().unwrap_or_default(),
        quote.symbol.clone(),
        number(quote.changes_percentage),
        number(quote.market_cap_billions()),
        number(quote.volume),
        number(quote.volume_to_avg_volume_ratio()),
        number(quote.price),
        number(quote.change),
        number(quote.day_low),
        number(quote.day_high),
        number(quote.year_high),
        number(quote.year_low),
        number(quote.price_avg50),
        number(quote.price_avg200),
        quote.exchange.clone().unwrap_or_default(),
        number(quote.open),
        number(quote.previous_close),
        number(quote.eps),
        number(quote.pe),
        quote.earnings_announcement.clone().unwrap_or_default(),
        number(quote.shares_outstanding),
        quote
            .timestamp
            .map(|ts| ts.to_string())
            .unwrap_or_default(),
        number(quote.price_to_year_high_percent()),
    ]
}

pub fn write_quote_table<W: Write>(writer: W, table: &QuoteTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(QUOTE_COLUMNS)?;

    for quote in table.quotes() {
        writer.write_record(quote_row(quote))?;
    }

    writer.flush()?;
    Ok(())
}

/// One row per index entry: timestamp, close and both moving averages. Gaps are empty cells.
pub fn write_chart_frame<W: Write>(writer: W, frame: &ChartFrame) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(frame.columns().iter().map(|column| column.label.clone()));
    writer.write_record(&header)?;

    for (row, timestamp) in frame.index.iter().enumerate() {
        let mut record = vec![timestamp.format(INDEX_FORMAT).to_string()];
        record.extend(
            frame
                .columns()
                .iter()
                .map(|column| number(column.values.get(row).copied().flatten())),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{MovingAverageWindows, PricePoint, PriceSeries};
    use chrono::NaiveDate;

    #[test]
    fn writes_quotes_in_market_view_order() {
        let quote = Quote {
            name: Some("SAP SE".to_string()),
            price: Some(150.0),
            year_high: Some(200.0),
            market_cap: Some(1.8e11),
            exchange: Some("XETRA".to_string()),
            ..Quote::for_symbol("SAP.DE")
        };
        let table = QuoteTable::merge(vec![vec![quote]]);

        let mut buffer = Vec::new();
        write_quote_table(&mut buffer, &table).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(header[..4], ["name", "symbol", "changesPercentage", "marketCap"]);

        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[0], "SAP SE");
        assert_eq!(row[1], "SAP.DE");
        assert_eq!(row[3], "180");
        assert_eq!(row[14], "XETRA");
        assert_eq!(row[22], "75");
    }

    #[test]
    fn writes_chart_frame_with_gaps_as_empty_cells() {
        let day = |d: u32| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let series = PriceSeries::new(
            "NFLX",
            vec![
                PricePoint::new(day(1), 10.0),
                PricePoint::gap(day(2)),
                PricePoint::new(day(3), 20.0),
            ],
        );
        let frame =
            ChartFrame::from_series(&series, &MovingAverageWindows::from_days(2, 5)).unwrap();

        let mut buffer = Vec::new();
        write_chart_frame(&mut buffer, &frame).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "date,close,2d-MA,5d-MA");
        assert_eq!(lines[1], "2024-01-01 00:00:00,10,10,10");
        assert_eq!(lines[2], "2024-01-02 00:00:00,,10,10");
        assert_eq!(lines[3], "2024-01-03 00:00:00,20,20,15");
    }
}
