use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::rename::RunReport;

use super::types::*;

/// Error types for history operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to write history file: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to serialize history: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("Failed to read history file: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("History file version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },
}

impl HistoryError {
    /// The history file involved, when known
    pub fn path(&self) -> Option<&Path> {
        match self {
            HistoryError::ReadError { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Write the journal of a live run into the target directory
pub fn write_history(
    report: &RunReport,
    target_dir: &Path,
    format: &str,
) -> Result<PathBuf, HistoryError> {
    let mut history = HistoryFile::new(
        OperationType::Rename,
        target_dir.to_path_buf(),
        entries_from_report(report, target_dir),
    );
    history.format = Some(format.to_string());
    write_history_file(&history, target_dir)
}

/// Applied renames as paths relative to the target directory
pub fn entries_from_report(report: &RunReport, target_dir: &Path) -> Vec<HistoryEntry> {
    report
        .applied()
        .map(|(item, new_path)| HistoryEntry {
            source: relative_to(&item.old_path, target_dir),
            destination: relative_to(new_path, target_dir),
            kind: item.kind,
        })
        .collect()
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

pub fn write_history_file(history: &HistoryFile, target_dir: &Path) -> Result<PathBuf, HistoryError> {
    let filename = history.generate_filename();
    let file_path = target_dir.join(&filename);

    if file_path.exists() {
        warn!("History file already exists: {:?}", file_path);
        // Add milliseconds to make unique
        let unique_filename = format!(
            "{}-{:03}.json",
            filename.trim_end_matches(".json"),
            history.executed_at.timestamp_subsec_millis()
        );
        let unique_path = target_dir.join(unique_filename);
        return write_to_path(history, &unique_path);
    }

    write_to_path(history, &file_path)
}

fn write_to_path(history: &HistoryFile, path: &Path) -> Result<PathBuf, HistoryError> {
    // Write to temporary file first
    let temp_path = path.with_extension("json.tmp");

    {
        let file = File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, history)?;
    }

    fs::rename(&temp_path, path)?;

    info!("History written to: {:?}", path);

    Ok(path.to_path_buf())
}
