use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, trace, warn};

use super::types::{CleanOutcome, MetadataError, ToolConfig};
use crate::title::TitleLookup;

static TRACK_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Track ID (\d+):").unwrap());

/// Rewrites container metadata after a file got its final name
pub trait MetadataCleaner {
    fn clean(&self, path: &Path, title: &str) -> Result<CleanOutcome, MetadataError>;
}

/// Reads the container title with `mediainfo`
pub struct MediaInfoLookup {
    command: PathBuf,
}

impl MediaInfoLookup {
    /// None when mediainfo is not installed
    pub fn new(config: &ToolConfig) -> Option<Self> {
        let command = ToolConfig::resolve(&config.mediainfo)?;
        debug!(command = ?command, "Using mediainfo for title lookup");
        Some(Self { command })
    }
}

impl TitleLookup for MediaInfoLookup {
    fn lookup_title(&self, path: &Path) -> Option<String> {
        container_title(&self.command, path)
    }
}

fn container_title(mediainfo: &Path, path: &Path) -> Option<String> {
    let output = Command::new(mediainfo)
        .arg("--Output=General;%Title%")
        .arg(path)
        .output()
        .map_err(|e| debug!(error = %e, "mediainfo failed to start"))
        .ok()?;

    if !output.status.success() {
        trace!(path = ?path, "mediainfo returned an error status");
        return None;
    }

    normalize_reported_title(&String::from_utf8_lossy(&output.stdout))
}

/// Treat empty and placeholder answers as missing, strip wrapping quotes
pub fn normalize_reported_title(raw: &str) -> Option<String> {
    let title = raw.trim();
    if matches!(title.to_lowercase().as_str(), "" | "n/a" | "na" | "none") {
        return None;
    }

    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            title
                .strip_prefix(*q)
                .and_then(|t| t.strip_suffix(*q))
        })
        .unwrap_or(title)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

/// Parse the track ids listed by `mkvmerge -i`
pub fn parse_track_ids(listing: &str) -> Vec<u32> {
    TRACK_ID_REGEX
        .captures_iter(listing)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Cleans MKV files with mkvtoolnix and MP4 files with ffmpeg
pub struct ExternalToolCleaner {
    config: ToolConfig,
}

impl ExternalToolCleaner {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Warnings for tools that are configured but not installed
    pub fn missing_tools(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.config.has_mkvpropedit() {
            missing.push(format!(
                "{} not found, MKV metadata will not be cleaned",
                self.config.mkvpropedit
            ));
        }
        if !self.config.has_ffmpeg() {
            missing.push(format!(
                "{} not found, MP4 metadata will not be cleaned",
                self.config.ffmpeg
            ));
        }
        missing
    }

    fn clean_mkv(&self, path: &Path, title: &str) -> Result<CleanOutcome, MetadataError> {
        let propedit = ToolConfig::resolve(&self.config.mkvpropedit)
            .ok_or_else(|| MetadataError::ToolMissing(self.config.mkvpropedit.clone()))?;

        let output = Command::new(&propedit)
            .args(["--quiet", "--edit", "info", "--set"])
            .arg(format!("title={}", title))
            .args(["--tags", "all:"])
            .arg(path)
            .output()?;
        check_status(&self.config.mkvpropedit, &output)?;

        for id in self.track_ids(path) {
            // Exit status 2 only means the track had no name
            let status = Command::new(&propedit)
                .arg("--quiet")
                .arg(path)
                .arg("--edit")
                .arg(format!("track:@{}", id + 1))
                .args(["--delete", "name"])
                .output()?
                .status;
            trace!(track = id, ?status, "Cleared track name");
        }

        info!(path = ?path, "Cleaned MKV metadata");
        Ok(CleanOutcome::Cleaned)
    }

    fn track_ids(&self, path: &Path) -> Vec<u32> {
        let Some(mkvmerge) = ToolConfig::resolve(&self.config.mkvmerge) else {
            debug!("mkvmerge not found, track names left as is");
            return Vec::new();
        };

        match Command::new(mkvmerge).arg("-i").arg(path).output() {
            Ok(output) => parse_track_ids(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                warn!(error = %e, "Failed to list MKV tracks");
                Vec::new()
            }
        }
    }

    fn clean_mp4(&self, path: &Path, title: &str) -> Result<CleanOutcome, MetadataError> {
        let ffmpeg = ToolConfig::resolve(&self.config.ffmpeg)
            .ok_or_else(|| MetadataError::ToolMissing(self.config.ffmpeg.clone()))?;

        let current = ToolConfig::resolve(&self.config.mediainfo)
            .and_then(|mediainfo| container_title(&mediainfo, path));
        if current.as_deref() == Some(title) {
            debug!(path = ?path, "MP4 title already clean");
            return Ok(CleanOutcome::Unchanged);
        }

        let temp = temp_sibling(path);
        let output = Command::new(ffmpeg)
            .args(["-hide_banner", "-nostdin", "-v", "error", "-i"])
            .arg(path)
            .args(["-map", "0", "-c", "copy", "-map_metadata", "-1", "-metadata"])
            .arg(format!("title={}", title))
            .args(["-movflags", "use_metadata_tags", "-f", "mp4", "-y"])
            .arg(&temp)
            .output();

        let result = output
            .map_err(MetadataError::from)
            .and_then(|o| check_status(&self.config.ffmpeg, &o));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        fs::rename(&temp, path)?;
        info!(path = ?path, "Cleaned MP4 metadata");
        Ok(CleanOutcome::Cleaned)
    }
}

impl MetadataCleaner for ExternalToolCleaner {
    fn clean(&self, path: &Path, title: &str) -> Result<CleanOutcome, MetadataError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "mkv" => self.clean_mkv(path, title),
            "mp4" | "m4v" => self.clean_mp4(path, title),
            _ => Ok(CleanOutcome::Unsupported),
        }
    }
}

fn check_status(tool: &str, output: &Output) -> Result<(), MetadataError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(MetadataError::CommandFailed {
        tool: tool.to_string(),
        message: if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        },
    })
}

// `Show - S01E01.mp4` -> `Show - S01E01.tmp.mp4`, same directory
fn temp_sibling(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_extension(format!("tmp.{}", extension))
}
