use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::parser::{locate_episode, EpisodeCode, LocatorMode};

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "ts", "m2ts",
];

pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "ass", "ssa", "vtt"];

/// Files that follow a video when it is renamed
pub const SIDECAR_EXTENSIONS: &[&str] = &[
    "srt", "ass", "vtt", "ssa", "sub", "idx", "nfo", "jpg", "jpeg", "png", "ttml", "txt", "sfv",
    "srr", "tbn", "cue", "xml", "mka", "mks",
];

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to read directory: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Subtitle,
    Sidecar,
}

impl MediaKind {
    /// Classify by extension, case-insensitively
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = extension.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Subtitle)
        } else if SIDECAR_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Sidecar)
        } else {
            None
        }
    }
}

/// A media file found under the target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPath {
    pub path: PathBuf,
    pub parent: PathBuf,
    pub extension: String,
    pub kind: MediaKind,
}

impl MediaPath {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().to_string();
        let kind = MediaKind::from_extension(&extension)?;
        let parent = path.parent()?.to_path_buf();

        Some(Self {
            path: path.to_path_buf(),
            parent,
            extension,
            kind,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Name of the directly containing folder
    pub fn parent_name(&self) -> Option<String> {
        self.parent
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
}

impl DirectoryEntry {
    pub fn new(name: String, path: PathBuf) -> Self {
        Self { name, path }
    }
}

/// Check that the run's root exists and is a readable directory
pub fn validate_root(target: &Path) -> Result<(), ScannerError> {
    if !target.exists() {
        return Err(ScannerError::PathNotFound(target.to_path_buf()));
    }

    if !target.is_dir() {
        return Err(ScannerError::NotADirectory(target.to_path_buf()));
    }

    fs::read_dir(target).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ScannerError::PermissionDenied(target.to_path_buf())
        } else {
            ScannerError::IoError(e)
        }
    })?;

    Ok(())
}

/// Immediate, non-hidden subdirectories sorted by name
pub fn scan_directory(target: &Path) -> Result<Vec<DirectoryEntry>, ScannerError> {
    debug!(path = ?target, "Scanning directory");
    validate_root(target)?;

    let mut entries = Vec::new();

    for entry in fs::read_dir(target)? {
        let entry = entry?;
        let path = entry.path();

        trace!(entry = ?path, "Examining entry");

        if !path.is_dir() {
            trace!(path = ?path, "Skipping non-directory");
            continue;
        }

        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => continue,
        };

        if name.starts_with('.') {
            trace!(name = %name, "Skipping hidden directory");
            continue;
        }

        debug!(name = %name, "Found subdirectory");
        entries.push(DirectoryEntry::new(name, path));
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

/// Every video, subtitle and sidecar file below `target`, hidden entries skipped
pub fn scan_media(target: &Path) -> Result<Vec<MediaPath>, ScannerError> {
    debug!(path = ?target, "Scanning media files");
    validate_root(target)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(target)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        match MediaPath::from_path(entry.path()) {
            Some(media) => {
                trace!(path = ?media.path, kind = ?media.kind, "Found media file");
                files.push(media);
            }
            None => trace!(path = ?entry.path(), "Skipping unsupported file"),
        }
    }

    debug!(count = files.len(), "Media scan complete");
    Ok(files)
}

/// Order files by folder, then episode, then name. Files without an
/// episode code go last within their folder.
pub fn sort_media(files: &mut [MediaPath], mode: LocatorMode) {
    files.sort_by_cached_key(|media| {
        let code = locate_episode(&media.file_name(), media.parent_name().as_deref(), mode)
            .map(|m| m.code);
        (
            media.parent.to_string_lossy().to_lowercase(),
            code.is_none(),
            code.unwrap_or_else(|| EpisodeCode::new(0, 0)),
            media.file_name().to_lowercase(),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    // ============ Root Validation Tests ============

    #[test]
    fn test_nonexistent_directory() {
        let result = scan_media(Path::new("/nonexistent/path/12345"));
        assert!(matches!(result, Err(ScannerError::PathNotFound(_))));
    }

    #[test]
    fn test_file_not_directory() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.mkv");
        touch(&file_path);

        let result = scan_media(&file_path);
        assert!(matches!(result, Err(ScannerError::NotADirectory(_))));
    }

    // ============ Subdirectory Tests ============

    #[test]
    fn test_scan_directory_lists_subdirectories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Season 2")).unwrap();
        fs::create_dir(dir.path().join("Season 1")).unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        touch(&dir.path().join("episode.mkv"));

        let entries = scan_directory(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Season 1", "Season 2"]);
    }

    // ============ Media Scan Tests ============

    #[test]
    fn test_scan_media_classifies_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Show.S01E01.mkv"));
        touch(&dir.path().join("Show.S01E01.en.srt"));
        touch(&dir.path().join("Show.S01E01.nfo"));
        touch(&dir.path().join("notes.doc"));

        let files = scan_media(dir.path()).unwrap();
        let kinds: Vec<_> = files.iter().map(|f| (f.file_name(), f.kind)).collect();

        assert_eq!(files.len(), 3);
        assert!(kinds.contains(&("Show.S01E01.mkv".to_string(), MediaKind::Video)));
        assert!(kinds.contains(&("Show.S01E01.en.srt".to_string(), MediaKind::Subtitle)));
        assert!(kinds.contains(&("Show.S01E01.nfo".to_string(), MediaKind::Sidecar)));
    }

    #[test]
    fn test_scan_media_recurses_and_skips_hidden() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Season 1").join("Show.S01E01.mkv"));
        touch(&dir.path().join(".trash").join("Show.S01E02.mkv"));
        touch(&dir.path().join(".Show.S01E03.mkv"));

        let files = scan_media(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].parent_name().as_deref(), Some("Season 1"));
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(MediaKind::from_extension("MKV"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("Srt"), Some(MediaKind::Subtitle));
        assert_eq!(MediaKind::from_extension("JPG"), Some(MediaKind::Sidecar));
        assert_eq!(MediaKind::from_extension("exe"), None);
    }

    // ============ Ordering Tests ============

    #[test]
    fn test_sort_media_by_episode() {
        let dir = tempdir().unwrap();
        for name in ["Show.S01E10.mkv", "Show.S01E02.mkv", "extras.mkv", "Show.S01E01.mkv"] {
            touch(&dir.path().join(name));
        }

        let mut files = scan_media(dir.path()).unwrap();
        sort_media(&mut files, LocatorMode::Standard);

        let names: Vec<_> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(
            names,
            vec!["Show.S01E01.mkv", "Show.S01E02.mkv", "Show.S01E10.mkv", "extras.mkv"]
        );
    }
}
