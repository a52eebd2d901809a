use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use super::types::{RenameKind, RenamePlan};
use crate::parser::{locate_episode, EpisodeCode, LocatorMode};
use crate::scanner::{SIDECAR_EXTENSIONS, SUBTITLE_EXTENSIONS, VIDEO_EXTENSIONS};

// "en", "pt-BR", "zh_Hans", optionally followed by a forced/sdh flag
static LANGUAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[._-]([A-Za-z]{2,4}(?:[-_][A-Za-z]{2,4})?)(?:[._-](forced|sdh|cc))?$").unwrap()
});

// Trailing tokens that look like language codes but are release tags or title words
const NOT_LANGUAGES: &[&str] = &[
    "web", "dl", "rip", "hdtv", "dvd", "bd", "hd", "sd", "uhd", "sub", "subs", "aac", "ac3", "dts",
    "avc", "hevc", "xvid", "divx", "mkv", "mp4", "raw", "the", "and", "of", "at", "for", "by", "on",
    "up", "me", "you", "we", "she", "her", "his", "him", "our", "out", "man", "men", "day", "end",
    "war", "new", "old", "one", "two", "six", "ten", "part", "home", "time", "last", "life",
    "love", "game", "dead", "bee", "bad",
];

/// Finds and plans renames for files that belong to a renamed video.
///
/// Keeps track of every sidecar already planned so that no file is renamed
/// twice in one run.
#[derive(Debug)]
pub struct CompanionResolver {
    handled: HashSet<PathBuf>,
    mode: LocatorMode,
}

impl CompanionResolver {
    pub fn new(mode: LocatorMode) -> Self {
        Self {
            handled: HashSet::new(),
            mode,
        }
    }

    pub fn is_handled(&self, path: &Path) -> bool {
        self.handled.contains(path)
    }

    pub fn handled_count(&self) -> usize {
        self.handled.len()
    }

    /// Plan companion renames for a video moving from `old_video` to `new_video`.
    ///
    /// Runs for no-op videos too, so stray sidecars still get linked.
    pub fn plan(
        &mut self,
        old_video: &Path,
        new_video: &Path,
        code: &EpisodeCode,
        dry_run: bool,
    ) -> io::Result<Vec<RenamePlan>> {
        let Some(directory) = old_video.parent() else {
            return Ok(Vec::new());
        };
        let old_base = stem_of(old_video);
        let new_base = stem_of(new_video);

        let siblings = list_siblings(directory, old_video, new_video)?;
        let other_bases: Vec<String> = siblings
            .iter()
            .filter(|p| has_extension(p, VIDEO_EXTENSIONS))
            .map(|p| stem_of(p))
            .collect();
        let mut plans = Vec::new();

        // Files named after the old video base
        for path in &siblings {
            if self.handled.contains(path) || !has_extension(path, SIDECAR_EXTENSIONS) {
                continue;
            }
            let name = file_name(path);
            let Some(suffix) = named_after(&name, &old_base) else {
                continue;
            };

            let new_name = format!("{}{}", new_base, suffix);
            trace!(from = %name, to = %new_name, "Companion by prefix");
            plans.push(self.claim(path, &new_name, dry_run));
        }

        // Subtitles carrying the same episode code
        for path in &siblings {
            if self.handled.contains(path) || !has_extension(path, SUBTITLE_EXTENSIONS) {
                continue;
            }
            let name = file_name(path);
            // A subtitle named after another video belongs to that video
            if other_bases.iter().any(|base| named_after(&name, base).is_some()) {
                continue;
            }
            let parent = directory.file_name().map(|n| n.to_string_lossy().to_string());
            let Some(found) = locate_episode(&name, parent.as_deref(), self.mode) else {
                continue;
            };
            if found.code != *code {
                continue;
            }

            let new_name = subtitle_name(&new_base, path);
            trace!(from = %name, to = %new_name, "Companion by episode code");
            plans.push(self.claim(path, &new_name, dry_run));
        }

        if !plans.is_empty() {
            debug!(video = %old_base, count = plans.len(), "Planned companion renames");
        }
        Ok(plans)
    }

    /// Claim the companions of a video that was left in place, without renaming them.
    ///
    /// Keeps the orphan pass from moving subtitles away from a video whose own
    /// rename failed. Returns how many files were held back.
    pub fn hold(&mut self, video: &Path, code: &EpisodeCode) -> io::Result<usize> {
        let held = self.plan(video, video, code, true)?;
        Ok(held.len())
    }

    /// Mark a sidecar as taken outside of [`plan`](Self::plan)
    pub fn mark_handled(&mut self, path: &Path) {
        self.handled.insert(path.to_path_buf());
    }

    fn claim(&mut self, path: &Path, new_name: &str, dry_run: bool) -> RenamePlan {
        let plan = RenamePlan::new(path.to_path_buf(), new_name, RenameKind::Sidecar, dry_run);
        self.handled.insert(plan.old_path.clone());
        self.handled.insert(plan.new_path.clone());
        plan
    }
}

/// New name for a subtitle that borrows `base`, keeping its language tag
pub fn subtitle_name(base: &str, subtitle: &Path) -> String {
    let extension = subtitle
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    match language_tag(&stem_of(subtitle)) {
        Some(tag) => format!("{}.{}.{}", base, tag, extension),
        None => format!("{}.{}", base, extension),
    }
}

/// Language code at the end of a subtitle stem, lowercased
pub fn language_tag(stem: &str) -> Option<String> {
    let caps = LANGUAGE_REGEX.captures(stem)?;
    let code = caps.get(1)?.as_str();

    let parts: Vec<&str> = code.split(['-', '_']).collect();
    if parts
        .iter()
        .any(|p| NOT_LANGUAGES.contains(&p.to_lowercase().as_str()))
    {
        return None;
    }

    let lowered = code.to_lowercase();
    match caps.get(2) {
        Some(flag) => Some(format!("{}.{}", lowered, flag.as_str().to_lowercase())),
        None => Some(lowered),
    }
}

/// Subtitle stem without its trailing language tag
pub fn strip_language_tag(stem: &str) -> &str {
    if language_tag(stem).is_none() {
        return stem;
    }
    match LANGUAGE_REGEX.find(stem) {
        Some(m) => &stem[..m.start()],
        None => stem,
    }
}

/// Rest of `name` when it is `base` followed by a separator
fn named_after<'a>(name: &'a str, base: &str) -> Option<&'a str> {
    let suffix = name.strip_prefix(base)?;
    suffix.starts_with(['.', '-', '_']).then_some(suffix)
}

fn list_siblings(directory: &Path, old_video: &Path, new_video: &Path) -> io::Result<Vec<PathBuf>> {
    let mut siblings = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if path == old_video || path == new_video || !path.is_file() {
            continue;
        }
        if file_name(&path).starts_with('.') {
            continue;
        }
        siblings.push(path);
    }
    siblings.sort();
    Ok(siblings)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| allowed.contains(&e.as_str()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
