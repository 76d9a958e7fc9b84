use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Context, Result};
use crate::fetch::QuoteTable;
use crate::series::ChartFrame;
use crate::utils::{file_slug, snapshot_timestamp_slug};

pub mod export;

pub use export::{write_chart_frame, write_quote_table, QUOTE_COLUMNS};

/// Facade that keeps CSV exports isolated from the rest of the app.
pub struct Records {
    output_dir: PathBuf,
}

impl Records {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Ensure the output directory exists before any persistence happens.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.output_dir.display()
            )
        })?;
        Ok(())
    }

    /// Persist a quote table using a timestamped filename, e.g. `quotes_xetra_2024_03_01_14_05.csv`.
    pub fn save_quotes(&self, label: &str, table: &QuoteTable) -> Result<PathBuf> {
        let path = self.timestamped_path("quotes", label);
        self.save_with(&path, |file| write_quote_table(file, table))?;
        log::info!("Saved {} quotes to {}", table.len(), path.display());
        Ok(path)
    }

    pub fn save_chart(&self, label: &str, frame: &ChartFrame) -> Result<PathBuf> {
        let path = self.timestamped_path("chart", label);
        self.save_with(&path, |file| write_chart_frame(file, frame))?;
        log::info!("Saved {} chart rows to {}", frame.len(), path.display());
        Ok(path)
    }

    fn timestamped_path(&self, kind: &str, label: &str) -> PathBuf {
        let name = match file_slug(label) {
            Some(slug) => format!("{kind}_{slug}_{}.csv", snapshot_timestamp_slug()),
            None => format!("{kind}_{}.csv", snapshot_timestamp_slug()),
        };
        self.output_dir.join(name)
    }

    fn save_with<F>(&self, path: &Path, write: F) -> Result<()>
    where
        F: FnOnce(fs::File) -> Result<()>,
    {
        self.prepare()?;
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write(file)
    }
}
