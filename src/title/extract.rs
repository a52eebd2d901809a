//! Episode title extraction.
//!
//! Each stage is a pure `&str -> String` transform; [`extract_title`] chains
//! them in a fixed order. Boundary truncation runs before token stripping so
//! that title words are never mistaken for release tags.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::SeriesContext;

/// Stand-in for `...` while separators are being rewritten
const ELLIPSIS_MARK: char = '\u{E000}';
/// Delimiters around the index of a protected parenthetical block
const BLOCK_OPEN: char = '\u{E001}';
const BLOCK_CLOSE: char = '\u{E002}';

// First technical marker: resolution, codec, source or platform.
// `Web` as a word is kept; only upper-case WEB or web followed by a codec counts.
static BOUNDARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s._\-(\[]+)(?:2160p|1080[pi]|720p|576p|480p|4k|uhd|x\.?26[45]|h\.?26[45]|hevc|avc|xvid|divx|av1|10bit|web-?dl|web-?rip|blu-?ray|bdrip|brrip|dvdrip|hdtv|pdtv|hdrip|remux|web[\s._-]+(?:x26[45]|h\.?26[45]|hevc)|(?-i:WEB|AMZN|NFLX|DSNP|HMAX|ATVP|PMTP|PCOK|HULU|NF))(?:[\s._\-)\]]|$)",
    )
    .unwrap()
});

static PROTECTED_TAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[\s._-]*\((?:\d{1,2}|part[\s._]*\d{1,2}|extended[\s._]+cut|director'?s[\s._]+cut|final[\s._]+cut)\))+[\s._-]*$",
    )
    .unwrap()
});

static PROTECTED_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

static BRACKET_BLOCK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|[(\[][^)\]]*$").unwrap());

static RELEASE_GROUP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S)-([A-Za-z0-9]+)$").unwrap());

static TAG_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^|[\s._-])(?:2160p|1080[pi]|720p|576p|480p|4k|uhd|hdr(?:10)?|x26[45]|h\.?26[45]|hevc|avc|xvid|divx|av1|10bit|8bit|web-?dl|web-?rip|blu-?ray|bdrip|brrip|dvdrip|hdtv|pdtv|hdrip|remux|aac(?:2\.0)?|e?ac3|dts(?:-hd)?|ddp?(?:\d\.\d|\d)?|flac|truehd|atmos|(?-i:WEB|AMZN|NFLX|DSNP|HMAX|ATVP|PMTP|PCOK|HULU|NF|PROPER|REPACK|RERIP|INTERNAL|EXTENDED|UNCUT|LIMITED|DUBBED|SUBBED|DIRECTOR'?S[\s._-]CUT))([\s._-]|$)",
    )
    .unwrap()
});

static DOUBLE_DASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(?:\s*-)+").unwrap());
static DOT_UNDERSCORE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._]+").unwrap());
static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static LEADING_YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}\s+(\S.*)$").unwrap());

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '_' | '-')
}

/// Candidate episode title from a file stem, before validation
pub fn extract_title(stem: &str, code_span: &Range<usize>, series: &SeriesContext) -> String {
    let without_code = remove_episode_code(stem, code_span);
    let without_series = strip_series_prefix(&without_code, series);
    clean_title_text(&without_series)
}

/// Boundary, bracket, tag and separator stages for text that is already
/// title-only (also used on metadata lookup answers).
pub fn clean_title_text(text: &str) -> String {
    let text = protect_ellipsis(text);
    let truncated = cut_at_boundary(&text);
    let (unbracketed, protected) = strip_brackets(&truncated);
    let untagged = strip_release_tags(&unbracketed);
    let normalized = normalize_separators(&untagged);
    restore(&normalized, &protected)
}

fn protect_ellipsis(text: &str) -> String {
    text.replace("...", &ELLIPSIS_MARK.to_string())
}

/// Stage 1: drop the episode code and the separators around it
pub fn remove_episode_code(stem: &str, span: &Range<usize>) -> String {
    let start = span.start.min(stem.len());
    let end = span.end.clamp(start, stem.len());
    let before = protect_ellipsis(stem.get(..start).unwrap_or(stem));
    let after = protect_ellipsis(stem.get(end..).unwrap_or_default());

    let before = before.trim_end_matches(is_separator);
    let after = after.trim_start_matches(is_separator);

    match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{} {}", before, after),
        (false, true) => before.to_string(),
        _ => after.to_string(),
    }
}

/// Stage 2: drop a leading series name, with or without its year
pub fn strip_series_prefix(text: &str, series: &SeriesContext) -> String {
    let stripped = match series_prefix_regex(series) {
        Some(regex) => regex.replace(text, "").to_string(),
        None => text.to_string(),
    };
    let collapsed = DOUBLE_DASH_REGEX.replace_all(&stripped, "-");
    collapsed.trim_start_matches(is_separator).to_string()
}

fn series_prefix_regex(series: &SeriesContext) -> Option<Regex> {
    let words: Vec<String> = series
        .name()
        .split_whitespace()
        .map(regex::escape)
        .collect();
    if words.is_empty() {
        return None;
    }

    // Optional leading [Group] tag, then the name. The name must be followed by
    // a year, a separator or the end so "Show" never eats into "Showdown".
    let pattern = format!(
        r"(?i)^(?:\[[^\]]*\][\s._-]*)?{}(?:[\s._-]*[(\[](?:19|20)\d{{2}}[)\]][\s._-]*|[\s._-]+(?:(?:19|20)\d{{2}}(?:[\s._-]+|$))?|$)",
        words.join(r"[\s._-]+")
    );
    Regex::new(&pattern).ok()
}

/// Stage 3: cut before the first technical marker
pub fn cut_at_boundary(text: &str) -> String {
    match BOUNDARY_REGEX.find(text) {
        Some(m) => text[..m.start()].to_string(),
        None => text.to_string(),
    }
}

/// Stage 4: remove bracketed blocks, keeping a whitelisted parenthetical tail
/// such as `(Part 1)` behind placeholders. Returns the text and the kept blocks.
pub fn strip_brackets(text: &str) -> (String, Vec<String>) {
    let mut protected = Vec::new();
    let mut working = text.to_string();

    if let Some(tail) = PROTECTED_TAIL_REGEX.find(text) {
        let mut placeholders = String::new();
        for block in PROTECTED_BLOCK_REGEX.find_iter(tail.as_str()) {
            placeholders.push(' ');
            placeholders.push(BLOCK_OPEN);
            placeholders.push_str(&protected.len().to_string());
            placeholders.push(BLOCK_CLOSE);
            protected.push(block.as_str().to_string());
        }
        working = format!("{}{}", &text[..tail.start()], placeholders);
    }

    let stripped = BRACKET_BLOCK_REGEX.replace_all(&working, " ").to_string();
    (stripped, protected)
}

/// Stage 5: trailing release group and standalone technical tags
pub fn strip_release_tags(text: &str) -> String {
    let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() || c == '.' || c == '_');
    let mut current = strip_release_group(trimmed);

    // Adjacent tags share a separator, so repeat until nothing changes
    loop {
        let next = TAG_TOKEN_REGEX.replace_all(&current, "${1}${2}").to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_release_group(text: &str) -> String {
    let Some(caps) = RELEASE_GROUP_REGEX.captures(text) else {
        return text.to_string();
    };
    let (Some(whole), Some(before), Some(token)) = (caps.get(0), caps.get(1), caps.get(2)) else {
        return text.to_string();
    };

    // "Spider-Man" is a title; "-GROUP", "-FoV", "-x0r" are release groups
    let token = token.as_str();
    let looks_like_group = token.chars().any(|c| c.is_ascii_digit())
        || token.chars().skip(1).any(|c| c.is_ascii_uppercase());
    if !looks_like_group {
        return text.to_string();
    }

    format!("{}{}", &text[..whole.start()], before.as_str())
}

/// Stage 6: separators to spaces, whitespace collapsed, leading year dropped
pub fn normalize_separators(text: &str) -> String {
    let spaced = DOT_UNDERSCORE_REGEX.replace_all(text, " ");
    let dashes = DOUBLE_DASH_REGEX.replace_all(&spaced, "-");
    let collapsed = WHITESPACE_REGEX.replace_all(&dashes, " ");
    let trimmed = collapsed.trim_matches(|c: char| c.is_whitespace() || c == '-');

    match LEADING_YEAR_REGEX.captures(trimmed) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        None => trimmed.to_string(),
    }
}

fn restore(text: &str, protected: &[String]) -> String {
    let mut restored = text.replace(ELLIPSIS_MARK, "...");

    for (index, block) in protected.iter().enumerate() {
        let placeholder = format!("{}{}{}", BLOCK_OPEN, index, BLOCK_CLOSE);
        let spaced = DOT_UNDERSCORE_REGEX.replace_all(block, " ");
        let block = WHITESPACE_REGEX.replace_all(&spaced, " ");
        restored = restored.replace(&placeholder, &block);
    }

    WHITESPACE_REGEX
        .replace_all(restored.trim(), " ")
        .to_string()
}
