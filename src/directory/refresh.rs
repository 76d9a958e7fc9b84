use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Context, Result};
use crate::fetch::InstrumentListSource;

use super::Instrument;

/// Offline maintenance: download the tradable-instrument list and rewrite the snapshot.
///
/// Returns the number of instruments written. The runtime path never calls this.
pub async fn refresh_snapshot<S>(source: &S, path: &Path) -> Result<usize>
where
    S: InstrumentListSource + ?Sized,
{
    let instruments = source.tradable_instruments().await?;
    write_snapshot(&instruments, path)?;
    log::info!(
        "Instrument snapshot {} refreshed with {} entries",
        path.display(),
        instruments.len()
    );
    Ok(instruments.len())
}

/// Write the snapshot next to its destination first, then swap it in.
pub fn write_snapshot(instruments: &[Instrument], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "Failed to create snapshot directory {}",
                parent.display()
            )
        })?;
    }

    let staging = staging_path(path);
    {
        let mut writer = csv::Writer::from_path(&staging)
            .with_context(|| format!("Failed to create {}", staging.display()))?;
        for instrument in instruments {
            writer.serialize(instrument)?;
        }
        writer.flush()?;
    }

    fs::rename(&staging, path).with_context(|| {
        format!(
            "Failed to move {} into place at {}",
            staging.display(),
            path.display()
        )
    })?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
