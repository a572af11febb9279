use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::CoreError;
use crate::models::trade::{Trade, TradeRecord};

use super::format;

/// Reads and writes the trade log file.
///
/// Remembers the path of the last file read or written so that a plain
/// "save" goes back to where the log came from.
#[derive(Debug, Clone)]
pub struct DatabaseHandler {
    db_filepath: PathBuf,
}

impl DatabaseHandler {
    pub fn new(db_filepath: impl Into<PathBuf>) -> Self {
        Self {
            db_filepath: db_filepath.into(),
        }
    }

    /// Path of the current trade log file.
    pub fn db_filepath(&self) -> &Path {
        &self.db_filepath
    }

    /// Read the records stored at `path` (or the current path) and make it
    /// the current path.
    pub fn read_data(&mut self, path: Option<&Path>) -> Result<Vec<TradeRecord>, CoreError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| self.db_filepath.clone());
        let bytes = std::fs::read(&path)?;
        let records = format::read_file(&bytes)?;
        info!("Read {} trade(s) from {}", records.len(), path.display());
        self.db_filepath = path;
        Ok(records)
    }

    /// Read and validate every record into a [`Trade`]. Fails on the first
    /// malformed record.
    pub fn read_trades(&mut self, path: Option<&Path>) -> Result<Vec<Trade>, CoreError> {
        self.read_data(path)?
            .iter()
            .map(Trade::from_record)
            .collect()
    }

    /// Write `records` to `path` (or the current path), creating parent
    /// directories, and make it the current path.
    pub fn write_data(&mut self, path: Option<&Path>, records: &[TradeRecord]) -> Result<(), CoreError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| self.db_filepath.clone());
        let bytes = format::write_file(records)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        info!("Wrote {} trade(s) to {}", records.len(), path.display());
        self.db_filepath = path;
        Ok(())
    }
}
