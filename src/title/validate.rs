use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::extract::clean_title_text;
use super::types::{EpisodeTitle, TitleSource};
use crate::parser::{normalize_key, EpisodeCode, SeriesContext};

static NUMERIC_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9.-]+$").unwrap());
static GENERIC_EPISODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:episode|ep|e)?\d+$").unwrap());

/// Optional source of episode titles when the file name has none
pub trait TitleLookup {
    fn lookup_title(&self, path: &Path) -> Option<String>;
}

/// Why a candidate title was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    NumericOnly,
    SameAsSeries,
    OverlapsSeries,
    GenericEpisode,
}

/// Titles already used in this run, per season
#[derive(Debug, Default)]
pub struct SeenTitles {
    seen: HashSet<(u32, String)>,
}

impl SeenTitles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, season: u32, key: &str) -> bool {
        self.seen.contains(&(season, key.to_string()))
    }

    /// Returns false when the title was already registered for that season
    pub fn register(&mut self, season: u32, key: &str) -> bool {
        self.seen.insert((season, key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Check a candidate against the series name and generic shapes
pub fn check_candidate(candidate: &str, series: &SeriesContext) -> Result<(), Rejection> {
    let trimmed = candidate.trim();
    if trimmed.chars().count() < 3 {
        return Err(Rejection::TooShort);
    }
    if NUMERIC_ONLY_REGEX.is_match(trimmed) {
        return Err(Rejection::NumericOnly);
    }

    let key = normalize_key(trimmed);
    if key.is_empty() {
        return Err(Rejection::TooShort);
    }

    let series_keys: Vec<&str> = [series.key(), series.key_no_year()]
        .into_iter()
        .filter(|k| !k.is_empty())
        .collect();

    if series_keys.iter().any(|k| *k == key) {
        return Err(Rejection::SameAsSeries);
    }
    if series_keys
        .iter()
        .any(|k| k.contains(key.as_str()) || key.contains(k))
    {
        return Err(Rejection::OverlapsSeries);
    }

    if GENERIC_EPISODE_REGEX.is_match(&key) {
        return Err(Rejection::GenericEpisode);
    }

    Ok(())
}

/// Accepts, replaces or drops candidate titles for one run
pub struct TitleValidator<'a> {
    series: &'a SeriesContext,
    lookup: Option<&'a dyn TitleLookup>,
}

impl<'a> TitleValidator<'a> {
    pub fn new(series: &'a SeriesContext) -> Self {
        Self {
            series,
            lookup: None,
        }
    }

    pub fn with_lookup(mut self, lookup: &'a dyn TitleLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Validate a candidate, fall back to the lookup, then deduplicate
    /// within the season. The first title seen for a season wins.
    pub fn resolve(
        &self,
        candidate: &str,
        path: &Path,
        code: &EpisodeCode,
        seen: &mut SeenTitles,
    ) -> EpisodeTitle {
        let title = self.accept(candidate, path);
        let Some(text) = title.text() else {
            return title;
        };

        if !seen.register(code.season(), title.key()) {
            debug!(title = text, season = code.season(), "Duplicate title in season, dropping");
            return EpisodeTitle::none();
        }

        title
    }

    /// Same checks as [`resolve`](Self::resolve) without touching the registry
    pub fn accept(&self, candidate: &str, path: &Path) -> EpisodeTitle {
        match check_candidate(candidate, self.series) {
            Ok(()) => return EpisodeTitle::new(candidate.trim(), TitleSource::Filename),
            Err(reason) if !candidate.is_empty() => {
                debug!(candidate, ?reason, "Rejected filename title");
            }
            Err(_) => {}
        }

        let Some(lookup) = self.lookup else {
            return EpisodeTitle::none();
        };

        let Some(answer) = lookup.lookup_title(path) else {
            return EpisodeTitle::none();
        };

        let cleaned = clean_title_text(&answer);
        match check_candidate(&cleaned, self.series) {
            Ok(()) => EpisodeTitle::new(cleaned, TitleSource::MetadataLookup),
            Err(reason) => {
                debug!(answer = %answer, ?reason, "Rejected looked-up title");
                EpisodeTitle::none()
            }
        }
    }
}
