mod series;
mod types;

pub use series::{detect_series_folder, season_folder_number, SeriesContext};
pub use types::*;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

// S01E02, s1.e2, S01 E02, S01_E02, S01E01-E02 (tail collapses to the first episode)
static SEASON_EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)s(\d{1,2})[\s._-]*e(\d{1,3})(?:[-_]?e\d{1,3})*").unwrap()
});

// 1x02, 01x102 (not 1920x1080)
static CROSS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^0-9a-z])((\d{1,2})x(\d{1,3}))(?:[^0-9a-z]|$)").unwrap()
});

// Season 1 Episode 2
static WORDS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)season[\s._-]*(\d{1,2})[\s._-]*episode[\s._-]*(\d{1,3})").unwrap()
});

// [Group] Show - 01 [1080p], Show - 01v2.mkv, Show - 01 (BD)
static ANIME_DASH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-\s+((\d{1,3})(?:v\d)?)(?:\s*[\[(]|[.\s]|$)").unwrap()
});

// Episode 5, Ep.05, EP 12
static EPISODE_WORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])((?:episode|ep)[\s._-]*(\d{1,3}))(?:[^0-9]|$)").unwrap()
});

// Show.E05.mkv
static BARE_EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._\-\[(])(e(\d{1,3}))(?:[\s._\-\])]|$)").unwrap()
});

// Season 2, Season.02, S2 inside a folder name
static DIR_SEASON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])(?:season[\s._-]*|s)(\d{1,2})(?:[^0-9]|$)").unwrap()
});

static SPECIALS_DIR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^specials?$").unwrap());

const STANDARD_ORDER: [PatternKind; 6] = [
    PatternKind::SeasonEpisode,
    PatternKind::Cross,
    PatternKind::Words,
    PatternKind::EpisodeWord,
    PatternKind::AnimeDash,
    PatternKind::BareEpisode,
];

const ANIME_ORDER: [PatternKind; 6] = [
    PatternKind::AnimeDash,
    PatternKind::SeasonEpisode,
    PatternKind::Cross,
    PatternKind::Words,
    PatternKind::EpisodeWord,
    PatternKind::BareEpisode,
];

/// Find the episode code in a file name.
///
/// `parent_dir` is the name of the folder that directly contains the file.
/// It supplies the season for bare episode numbers and forces season 0
/// when it is a `Specials` folder, whatever the file name says.
pub fn locate_episode(
    file_name: &str,
    parent_dir: Option<&str>,
    mode: LocatorMode,
) -> Option<EpisodeMatch> {
    let order: &[PatternKind] = match mode {
        LocatorMode::Standard => &STANDARD_ORDER,
        LocatorMode::Anime => &ANIME_ORDER,
    };

    let mut found = order
        .iter()
        .find_map(|kind| try_pattern(*kind, file_name, parent_dir))?;

    // "Show - S01E05 - 24 Hours": a season code ahead of the dash number wins
    if found.pattern == PatternKind::AnimeDash {
        if let Some(scene) = try_pattern(PatternKind::SeasonEpisode, file_name, parent_dir) {
            if scene.span.start < found.span.start {
                found = scene;
            }
        }
    }

    if parent_dir.is_some_and(is_specials_dir) {
        found.code = found.code.with_season(0);
    }

    trace!(file = file_name, code = %found.code, pattern = ?found.pattern, "Located episode");
    Some(found)
}

fn try_pattern(kind: PatternKind, name: &str, parent_dir: Option<&str>) -> Option<EpisodeMatch> {
    match kind {
        PatternKind::SeasonEpisode => {
            let caps = SEASON_EPISODE_REGEX.captures(name)?;
            let whole = caps.get(0)?;
            Some(EpisodeMatch {
                code: code_from(&caps, 1, 2)?,
                span: whole.range(),
                pattern: kind,
            })
        }
        PatternKind::Cross => {
            let caps = CROSS_REGEX.captures(name)?;
            Some(EpisodeMatch {
                code: code_from(&caps, 2, 3)?,
                span: caps.get(1)?.range(),
                pattern: kind,
            })
        }
        PatternKind::Words => {
            let caps = WORDS_REGEX.captures(name)?;
            Some(EpisodeMatch {
                code: code_from(&caps, 1, 2)?,
                span: caps.get(0)?.range(),
                pattern: kind,
            })
        }
        PatternKind::AnimeDash => {
            let caps = ANIME_DASH_REGEX.captures(name)?;
            let digits = caps.get(2)?;
            let episode = digits.as_str().parse().ok()?;
            Some(EpisodeMatch {
                code: EpisodeCode::with_digits(1, episode, digits.as_str().len()),
                span: caps.get(0)?.start()..caps.get(1)?.end(),
                pattern: kind,
            })
        }
        PatternKind::EpisodeWord | PatternKind::BareEpisode => {
            let regex = if kind == PatternKind::EpisodeWord {
                &EPISODE_WORD_REGEX
            } else {
                &BARE_EPISODE_REGEX
            };
            let caps = regex.captures(name)?;
            let digits = caps.get(2)?;
            let episode = digits.as_str().parse().ok()?;
            let season = parent_dir.and_then(season_from_dir).unwrap_or(1);
            Some(EpisodeMatch {
                code: EpisodeCode::with_digits(season, episode, digits.as_str().len()),
                span: caps.get(1)?.range(),
                pattern: kind,
            })
        }
    }
}

fn code_from(caps: &Captures, season_group: usize, episode_group: usize) -> Option<EpisodeCode> {
    let season: u32 = caps.get(season_group)?.as_str().parse().ok()?;
    let digits = caps.get(episode_group)?.as_str();
    let episode: u32 = digits.parse().ok()?;
    Some(EpisodeCode::with_digits(season, episode, digits.len()))
}

/// Season number named by a folder such as `Season 2` or `Show S02`
pub fn season_from_dir(dir_name: &str) -> Option<u32> {
    DIR_SEASON_REGEX
        .captures(dir_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn is_specials_dir(dir_name: &str) -> bool {
    SPECIALS_DIR_REGEX.is_match(dir_name.trim())
}

/// Comparison key: lowercase, alphanumeric characters only.
pub fn normalize_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
