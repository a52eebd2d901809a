use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rename::RenameKind;

pub const HISTORY_VERSION: &str = "1.0";
pub const HISTORY_PREFIX: &str = "episode-renamer-history-";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    /// Schema version for compatibility
    pub version: String,

    /// When the operation was executed
    pub executed_at: DateTime<Utc>,

    /// Type of operation performed
    pub operation: OperationType,

    /// Target directory path
    pub target_directory: PathBuf,

    /// Tool version that created this history
    pub tool_version: String,

    /// Output format used for the run, absent for reverts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Applied changes in the order they happened
    pub changes: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Rename,
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Path before the rename, relative to the target directory
    pub source: PathBuf,

    /// Path after the rename, relative to the target directory
    pub destination: PathBuf,

    pub kind: RenameKind,
}

impl HistoryFile {
    pub fn new(operation: OperationType, target_directory: PathBuf, changes: Vec<HistoryEntry>) -> Self {
        Self {
            version: HISTORY_VERSION.to_string(),
            executed_at: Utc::now(),
            operation,
            target_directory,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            format: None,
            changes,
        }
    }

    /// Generate the filename for this history file
    pub fn generate_filename(&self) -> String {
        let timestamp = self.executed_at.format("%Y%m%d-%H%M%S");
        match self.operation {
            OperationType::Rename => format!("{}{}.json", HISTORY_PREFIX, timestamp),
            OperationType::Revert => format!("{}{}-revert.json", HISTORY_PREFIX, timestamp),
        }
    }
}
