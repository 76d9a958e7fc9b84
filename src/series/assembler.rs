use chrono::{Duration, NaiveDateTime};

use crate::directory::Instrument;
use crate::error::{AppError, Result};
use crate::fetch::{HistoryStart, PriceHistorySource};

use super::{window_label, Frequency, PricePoint, PriceSeries};

/// Which history to chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMode {
    /// Daily closes since the instrument's first listed day.
    Full,
    /// Recent high-frequency closes resampled onto a fixed grid.
    Intraday(Frequency),
}

/// Short- and long-term moving average windows, in calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageWindows {
    pub short: Duration,
    pub long: Duration,
}

impl MovingAverageWindows {
    pub fn from_days(short: i64, long: i64) -> Self {
        Self {
            short: Duration::days(short),
            long: Duration::days(long),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartColumn {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Close price plus both moving averages, aligned on one time index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub symbol: String,
    pub index: Vec<NaiveDateTime>,
    pub close: ChartColumn,
    pub short_ma: ChartColumn,
    pub long_ma: ChartColumn,
}

impl ChartFrame {
    pub fn from_series(series: &PriceSeries, windows: &MovingAverageWindows) -> Result<Self> {
        let short_ma = series.rolling_mean(windows.short)?;
        let long_ma = series.rolling_mean(windows.long)?;

        Ok(Self {
            symbol: series.symbol().to_string(),
            index: series.timestamps(),
            close: ChartColumn {
                label: "close".to_string(),
                values: series.closes(),
            },
            short_ma: ChartColumn {
                label: format!("{}-MA", window_label(windows.short)),
                values: short_ma,
            },
            long_ma: ChartColumn {
                label: format!("{}-MA", window_label(windows.long)),
                values: long_ma,
            },
        })
    }

    pub fn columns(&self) -> [&ChartColumn; 3] {
        [&self.close, &self.short_ma, &self.long_ma]
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Result of a chart request. `NotAvailable` is an expected outcome, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesOutcome {
    Ready(ChartFrame),
    NotAvailable,
}

/// Turns raw price history into chart-ready frames.
pub struct SeriesAssembler<S> {
    source: S,
    windows: MovingAverageWindows,
}

impl<S: PriceHistorySource> SeriesAssembler<S> {
    pub fn new(source: S, windows: MovingAverageWindows) -> Self {
        Self { source, windows }
    }

    pub fn windows(&self) -> &MovingAverageWindows {
        &self.windows
    }

    pub async fn build_series(
        &self,
        instrument: &Instrument,
        mode: SeriesMode,
    ) -> Result<SeriesOutcome> {
        let Some(series) = self.close_series(instrument, mode).await? else {
            log::info!(
                "No {:?} data available for {}",
                mode,
                instrument.display_key()
            );
            return Ok(SeriesOutcome::NotAvailable);
        };

        let frame = ChartFrame::from_series(&series, &self.windows)?;
        log::debug!(
            "Assembled {} points for {} ({:?})",
            frame.len(),
            frame.symbol,
            mode
        );
        Ok(SeriesOutcome::Ready(frame))
    }

    /// The close series a chart is built from; `None` only for an intraday lookup miss.
    pub async fn close_series(
        &self,
        instrument: &Instrument,
        mode: SeriesMode,
    ) -> Result<Option<PriceSeries>> {
        match mode {
            SeriesMode::Full => self.full_history(instrument).await.map(Some),
            SeriesMode::Intraday(frequency) => {
                let Some(points) = self
                    .source
                    .intraday_closes(&instrument.symbol, frequency)
                    .await?
                else {
                    return Ok(None);
                };

                let series = PriceSeries::new(instrument.symbol.clone(), points);
                if series.is_empty() {
                    return Ok(None);
                }
                series.resample(frequency.step()).map(Some)
            }
        }
    }

    async fn full_history(&self, instrument: &Instrument) -> Result<PriceSeries> {
        let symbols = [instrument.symbol.clone()];
        let rows = self
            .source
            .daily_closes(&symbols, HistoryStart::Beginning)
            .await?;

        let points: Vec<PricePoint> = rows
            .into_iter()
            .filter(|row| row.symbol == instrument.symbol)
            .filter_map(|row| {
                row.date
                    .and_hms_opt(0, 0, 0)
                    .map(|timestamp| PricePoint::new(timestamp, row.close))
            })
            .collect();

        if points.is_empty() {
            return Err(AppError::NoHistory(instrument.symbol.clone()));
        }

        Ok(PriceSeries::new(instrument.symbol.clone(), points))
    }
}
