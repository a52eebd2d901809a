use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

/// Which pattern family the locator tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocatorMode {
    #[default]
    Standard,
    /// Fansub releases: the `- 01 [` dash form wins over `SxxEyy`.
    Anime,
}

/// Pattern family that produced an episode match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `S01E02`, `s1.e2`, `S01 E02`
    SeasonEpisode,
    /// `1x02`
    Cross,
    /// `Season 1 Episode 2`
    Words,
    /// `[Group] Show - 02 [1080p]`
    AnimeDash,
    /// `Episode 2`, `Ep.2`
    EpisodeWord,
    /// `Show.E02.mkv`
    BareEpisode,
}

/// Normalized season/episode pair.
///
/// Equality and ordering only look at the numbers; the width flag only
/// controls whether the episode renders with three digits.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeCode {
    season: u32,
    episode: u32,
    wide: bool,
}

impl EpisodeCode {
    pub fn new(season: u32, episode: u32) -> Self {
        Self {
            season,
            episode,
            wide: episode >= 100,
        }
    }

    /// Build a code remembering how many digits the source used for the episode.
    pub fn with_digits(season: u32, episode: u32, digits: usize) -> Self {
        Self {
            season,
            episode,
            wide: digits >= 3 || episode >= 100,
        }
    }

    pub fn season(&self) -> u32 {
        self.season
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn with_season(self, season: u32) -> Self {
        Self { season, ..self }
    }
}

impl fmt::Display for EpisodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wide {
            write!(f, "S{:02}E{:03}", self.season, self.episode)
        } else {
            write!(f, "S{:02}E{:02}", self.season, self.episode)
        }
    }
}

impl PartialEq for EpisodeCode {
    fn eq(&self, other: &Self) -> bool {
        self.season == other.season && self.episode == other.episode
    }
}

impl Eq for EpisodeCode {}

impl Hash for EpisodeCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.season.hash(state);
        self.episode.hash(state);
    }
}

impl PartialOrd for EpisodeCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EpisodeCode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.season, self.episode).cmp(&(other.season, other.episode))
    }
}

/// A located episode code plus where it sits in the file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    pub code: EpisodeCode,
    /// Byte range of the code token (including multi-episode tails) in the file name
    pub span: Range<usize>,
    pub pattern: PatternKind,
}
