use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_specials_dir, normalize_key};

// Folder names that are a season container rather than the show itself
static SEASON_FOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:season[\s._-]*(\d{1,2})|s(\d{1,2}))$").unwrap());

// "Show - Season 2", "Show S02", "Show.Season.2.1080p"
static TRAILING_SEASON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\s._-]+(?:season[\s._-]*\d{1,2}|s\d{1,2})(?:[\s._-].*)?$").unwrap()
});

// "Show (2008)", "Show [2008]"
static YEAR_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)[\s._-]*[(\[]((?:19|20)\d{2})[)\]]\s*$").unwrap()
});

static SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._]+").unwrap());
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Series identity for one run: read from the folder layout or given on the
/// command line. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesContext {
    name: String,
    year: Option<u16>,
    key: String,
    key_no_year: String,
}

impl SeriesContext {
    /// Derive the series from the directory being processed
    pub fn from_path(path: &Path) -> Self {
        match detect_series_folder(path) {
            Some(folder) => Self::from_folder_name(&folder),
            None => Self::default(),
        }
    }

    /// Build from a folder name, dropping season markers after the title
    pub fn from_folder_name(folder: &str) -> Self {
        let without_season = TRAILING_SEASON_REGEX.replace(folder, "");
        Self::from_name(&without_season)
    }

    /// Build from a user-supplied name such as `Doctor Who (2005)`
    pub fn from_name(raw: &str) -> Self {
        let spaced = SEPARATOR_REGEX.replace_all(raw, " ");
        let collapsed = WHITESPACE_REGEX.replace_all(spaced.trim(), " ").to_string();

        let (name, year) = match YEAR_SUFFIX_REGEX.captures(&collapsed) {
            Some(caps) => {
                let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                let year = caps.get(2).and_then(|m| m.as_str().parse().ok());
                (name.to_string(), year)
            }
            None => (collapsed.clone(), None),
        };

        let mut context = Self {
            name,
            year,
            key: String::new(),
            key_no_year: String::new(),
        };
        context.key = normalize_key(&context.display_name());
        context.key_no_year = normalize_key(&context.name);
        context
    }

    pub fn is_known(&self) -> bool {
        !self.name.is_empty()
    }

    /// Series name without any year
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn year(&self) -> Option<u16> {
        self.year
    }

    /// `Name (Year)` when the year is known, otherwise just the name
    pub fn display_name(&self) -> String {
        match self.year {
            Some(year) if !self.name.is_empty() => format!("{} ({})", self.name, year),
            _ => self.name.clone(),
        }
    }

    /// Normalized key of the name including the year
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn key_no_year(&self) -> &str {
        &self.key_no_year
    }
}

/// Season number when the whole folder name is a season marker (`Season 1`, `s01`)
pub fn season_folder_number(folder: &str) -> Option<u32> {
    let caps = SEASON_FOLDER_REGEX.captures(folder.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Name of the folder that carries the series title.
///
/// Climbs one level when `path` is itself a season or specials folder.
pub fn detect_series_folder(path: &Path) -> Option<String> {
    let own = path.file_name()?.to_string_lossy().to_string();
    let trimmed = own.trim();

    if season_folder_number(trimmed).is_some() || is_specials_dir(trimmed) {
        return path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string());
    }

    Some(own)
}
