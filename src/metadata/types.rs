use std::path::PathBuf;

use thiserror::Error;

/// Commands used for container metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub mediainfo: String,
    pub mkvpropedit: String,
    pub mkvmerge: String,
    pub ffmpeg: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            mediainfo: "mediainfo".to_string(),
            mkvpropedit: "mkvpropedit".to_string(),
            mkvmerge: "mkvmerge".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl ToolConfig {
    /// Resolve a configured command to an executable on this system
    pub fn resolve(command: &str) -> Option<PathBuf> {
        which::which(command).ok()
    }

    pub fn has_mediainfo(&self) -> bool {
        Self::resolve(&self.mediainfo).is_some()
    }

    pub fn has_mkvpropedit(&self) -> bool {
        Self::resolve(&self.mkvpropedit).is_some()
    }

    pub fn has_ffmpeg(&self) -> bool {
        Self::resolve(&self.ffmpeg).is_some()
    }
}

/// Result of a metadata clean that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    Cleaned,
    /// Container already carried the wanted title
    Unchanged,
    /// No cleaner for this container type
    Unsupported,
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("{0} not found")]
    ToolMissing(String),

    #[error("{tool} failed: {message}")]
    CommandFailed { tool: String, message: String },

    #[error("Metadata I/O error: {0}")]
    Io(#[from] std::io::Error),
}
