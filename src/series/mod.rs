use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};

use crate::error::{AppError, Result};

pub mod assembler;

pub use assembler::{
    ChartColumn, ChartFrame, MovingAverageWindows, SeriesAssembler, SeriesMode, SeriesOutcome,
};

/// One close observation. `close` is `None` for grid slots created by resampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub close: Option<f64>,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            timestamp,
            close: Some(close),
        }
    }

    pub fn gap(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            close: None,
        }
    }
}

/// Chronologically ordered closes for a single symbol with unique timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts the points and collapses duplicate timestamps, keeping the last observation.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        let symbol = symbol.into();
        points.sort_by_key(|point| point.timestamp);

        let mut unique: Vec<PricePoint> = Vec::with_capacity(points.len());
        let mut duplicates = 0usize;
        for point in points {
            match unique.last_mut() {
                Some(last) if last.timestamp == point.timestamp => {
                    *last = point;
                    duplicates += 1;
                }
                _ => unique.push(point),
            }
        }

        if duplicates > 0 {
            log::warn!(
                "Collapsed {} duplicate timestamp(s) in the {} series",
                duplicates,
                symbol
            );
        }

        Self {
            symbol,
            points: unique,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|point| point.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|point| point.close).collect()
    }

    /// Conform the series to a fixed grid that starts at the first sample.
    ///
    /// Grid slots without an exact sample become gaps and samples falling between
    /// slots are dropped. Nothing is forward-filled or interpolated, so resampling an
    /// already resampled series with the same step returns it unchanged.
    pub fn resample(&self, step: Duration) -> Result<PriceSeries> {
        if step <= Duration::zero() {
            return Err(AppError::message(format!(
                "resample step must be positive, got {}",
                step
            )));
        }

        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Ok(self.clone());
        };

        let mut grid = Vec::new();
        let mut cursor = 0usize;
        let mut slot = first.timestamp;
        while slot <= last.timestamp {
            while cursor < self.points.len() && self.points[cursor].timestamp < slot {
                cursor += 1;
            }
            match self.points.get(cursor) {
                Some(point) if point.timestamp == slot => grid.push(*point),
                _ => grid.push(PricePoint::gap(slot)),
            }
            slot += step;
        }

        Ok(PriceSeries {
            symbol: self.symbol.clone(),
            points: grid,
        })
    }

    /// Trailing mean over the calendar window `(t - window, t]` for every point.
    ///
    /// Gaps are skipped. A point gets a value as soon as its window holds one
    /// observation, so early points average whatever history exists.
    pub fn rolling_mean(&self, window: Duration) -> Result<Vec<Option<f64>>> {
        if window <= Duration::zero() {
            return Err(AppError::message(format!(
                "moving average window must be positive, got {}",
                window
            )));
        }

        let mut means = Vec::with_capacity(self.points.len());
        let mut start = 0usize;
        let mut sum = 0.0;
        let mut count = 0usize;

        for point in &self.points {
            if let Some(close) = point.close {
                sum += close;
                count += 1;
            }

            let left_edge = point.timestamp - window;
            while self.points[start].timestamp <= left_edge {
                if let Some(close) = self.points[start].close {
                    sum -= close;
                    count -= 1;
                }
                start += 1;
            }

            if count == 0 {
                sum = 0.0;
                means.push(None);
            } else {
                means.push(Some(sum / count as f64));
            }
        }

        Ok(means)
    }
}

/// Sampling step supported by the intraday endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneMinute => "1min",
            Frequency::FiveMinutes => "5min",
            Frequency::FifteenMinutes => "15min",
            Frequency::ThirtyMinutes => "30min",
            Frequency::OneHour => "1hour",
            Frequency::FourHours => "4hour",
        }
    }

    pub fn step(&self) -> Duration {
        match self {
            Frequency::OneMinute => Duration::minutes(1),
            Frequency::FiveMinutes => Duration::minutes(5),
            Frequency::FifteenMinutes => Duration::minutes(15),
            Frequency::ThirtyMinutes => Duration::minutes(30),
            Frequency::OneHour => Duration::hours(1),
            Frequency::FourHours => Duration::hours(4),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "1min" => Ok(Frequency::OneMinute),
            "5min" => Ok(Frequency::FiveMinutes),
            "15min" => Ok(Frequency::FifteenMinutes),
            "30min" => Ok(Frequency::ThirtyMinutes),
            "1hour" | "60min" => Ok(Frequency::OneHour),
            "4hour" => Ok(Frequency::FourHours),
            other => Err(AppError::message(format!(
                "unsupported intraday frequency `{other}`"
            ))),
        }
    }
}

/// Short label for a window, e.g. `30d`, `4h` or `15min`.
pub fn window_label(window: Duration) -> String {
    let minutes = window.num_minutes();
    if minutes > 0 && minutes % (24 * 60) == 0 {
        format!("{}d", minutes / (24 * 60))
    } else if minutes > 0 && minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else if minutes > 0 && window == Duration::minutes(minutes) {
        format!("{}min", minutes)
    } else {
        format!("{}s", window.num_seconds())
    }
}
