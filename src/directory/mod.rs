use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Context, Result};

pub mod refresh;

pub use refresh::{refresh_snapshot, write_snapshot};

/// A tradable instrument as listed in the directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exchange: String,
}

impl Instrument {
    /// Key used by pickers, e.g. `Netflix, Inc., NFLX`.
    pub fn display_key(&self) -> String {
        format!("{}, {}", self.name, self.symbol)
    }
}

/// Read-only catalogue of every tradable instrument, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    instruments: Vec<Instrument>,
    by_symbol: HashMap<String, usize>,
    by_display_key: HashMap<String, usize>,
}

impl Directory {
    /// Index the instruments, keeping the first entry when a symbol repeats.
    pub fn from_instruments(instruments: Vec<Instrument>) -> Self {
        let mut kept = Vec::with_capacity(instruments.len());
        let mut by_symbol = HashMap::with_capacity(instruments.len());
        let mut by_display_key = HashMap::with_capacity(instruments.len());
        let mut skipped = 0usize;

        for mut instrument in instruments {
            let symbol = instrument.symbol.trim();
            if symbol.is_empty() || by_symbol.contains_key(symbol) {
                skipped += 1;
                continue;
            }
            instrument.symbol = symbol.to_string();

            let index = kept.len();
            by_symbol.insert(instrument.symbol.clone(), index);
            by_display_key
                .entry(instrument.display_key())
                .or_insert(index);
            kept.push(instrument);
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {} blank or duplicate symbol(s) while indexing the directory",
                skipped
            );
        }

        Self {
            instruments: kept,
            by_symbol,
            by_display_key,
        }
    }

    /// Load the persisted snapshot (`symbol,name,exchange` CSV).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).with_context(|| {
            format!(
                "Failed to open instrument snapshot {}. Run `refresh-directory` first.",
                path.display()
            )
        })?;
        let directory = Self::from_reader(file)?;
        log::info!(
            "Loaded {} instruments from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut instruments = Vec::new();
        for record in reader.deserialize::<Instrument>() {
            let instrument = record.context("Failed to read instrument snapshot record")?;
            instruments.push(instrument);
        }
        Ok(Self::from_instruments(instruments))
    }

    /// Exact match on the display key; no fuzzy matching.
    pub fn lookup(&self, display_key: &str) -> Result<&Instrument> {
        self.by_display_key
            .get(display_key)
            .map(|&index| &self.instruments[index])
            .ok_or_else(|| AppError::UnknownInstrument(display_key.to_string()))
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.by_symbol
            .get(symbol)
            .map(|&index| &self.instruments[index])
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Distinct exchange names, sorted.
    pub fn exchanges(&self) -> Vec<&str> {
        self.instruments
            .iter()
            .map(|instrument| instrument.exchange.as_str())
            .filter(|exchange| !exchange.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Symbols listed on `exchange`, in directory order.
    pub fn symbols_for_exchange(&self, exchange: &str) -> Vec<String> {
        self.instruments
            .iter()
            .filter(|instrument| instrument.exchange == exchange)
            .map(|instrument| instrument.symbol.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "symbol,name,exchange\n\
        NFLX,\"Netflix, Inc.\",NASDAQ\n\
        SAP.DE,SAP SE,XETRA\n\
        BMW.DE,Bayerische Motoren Werke AG,XETRA\n\
        NFLX,Netflix duplicate,NASDAQ\n\
        EMPTY,,\n";

    fn directory() -> Directory {
        Directory::from_reader(SNAPSHOT.as_bytes()).unwrap()
    }

    #[test]
    fn looks_up_by_exact_display_key() {
        let directory = directory();

        let netflix = directory.lookup("Netflix, Inc., NFLX").unwrap();
        assert_eq!(netflix.symbol, "NFLX");
        assert_eq!(netflix.exchange, "NASDAQ");

        let err = directory.lookup("netflix, inc., nflx").unwrap_err();
        assert!(matches!(err, AppError::UnknownInstrument(_)));
    }

    #[test]
    fn keeps_first_entry_for_duplicate_symbols() {
        let directory = directory();

        assert_eq!(directory.len(), 4);
        assert_eq!(directory.get("NFLX").unwrap().name, "Netflix, Inc.");
        assert!(directory.lookup("Netflix duplicate, NFLX").is_err());
    }

    #[test]
    fn lists_exchanges_and_their_symbols() {
        let directory = directory();

        assert_eq!(directory.exchanges(), vec!["NASDAQ", "XETRA"]);
        assert_eq!(
            directory.symbols_for_exchange("XETRA"),
            vec!["SAP.DE".to_string(), "BMW.DE".to_string()]
        );
        assert!(directory.symbols_for_exchange("NYSE").is_empty());
    }

    #[test]
    fn trims_symbols_before_indexing() {
        let directory = Directory::from_reader(
            "symbol,name,exchange\n\" NFLX \",\"Netflix, Inc.\",NASDAQ\n".as_bytes(),
        )
        .unwrap();

        let netflix = directory.lookup("Netflix, Inc., NFLX").unwrap();
        assert_eq!(netflix.symbol, "NFLX");
        assert_eq!(directory.get("NFLX"), Some(netflix));
        assert_eq!(directory.symbols_for_exchange("NASDAQ"), vec!["NFLX".to_string()]);
    }

    #[test]
    fn tolerates_missing_names() {
        let directory = directory();
        let empty = directory.get("EMPTY").unwrap();

        assert_eq!(empty.display_key(), ", EMPTY");
    }
}
