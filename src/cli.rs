use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::series::{Frequency, SeriesMode};

#[derive(Parser, Debug)]
#[command(name = "market-dash")]
#[command(about = "Equity market views: exchange-wide quotes, price charts and news")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file; builtin defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the tradable-instrument list and rewrite the directory snapshot
    RefreshDirectory,

    /// List the exchanges found in the directory snapshot
    Exchanges,

    /// Fetch live quotes for a whole exchange or an explicit symbol list
    Quotes {
        /// Exchange name as listed in the directory, e.g. XETRA
        #[arg(short, long, conflicts_with = "symbols", required_unless_present = "symbols")]
        exchange: Option<String>,

        /// Comma-separated symbols, e.g. AAPL,MSFT
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Keep only instruments reporting a market capitalization
        #[arg(long)]
        stocks_only: bool,

        /// Write the table to a timestamped CSV in the output directory
        #[arg(long)]
        save: bool,
    },

    /// Close price with short and long moving averages for one instrument
    Chart {
        /// Display key as listed in the directory, e.g. "Netflix, Inc., NFLX"
        #[arg(short, long)]
        name: String,

        #[arg(short, long, value_enum, default_value = "full")]
        mode: ChartMode,

        /// Intraday sampling step: 1min, 5min, 15min, 30min, 1hour or 4hour
        #[arg(short, long, default_value = "1min")]
        frequency: Frequency,

        /// Write the chart frame to a timestamped CSV in the output directory
        #[arg(long)]
        save: bool,
    },

    /// Latest news articles for one instrument
    News {
        /// Display key as listed in the directory
        #[arg(short, long)]
        name: String,

        /// Maximum number of articles; defaults to the configured limit
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartMode {
    Full,
    Intraday,
}

impl ChartMode {
    pub fn with_frequency(self, frequency: Frequency) -> SeriesMode {
        match self {
            ChartMode::Full => SeriesMode::Full,
            ChartMode::Intraday => SeriesMode::Intraday(frequency),
        }
    }
}
