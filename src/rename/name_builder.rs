use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::{season_folder_number, is_specials_dir, EpisodeCode, SeriesContext};

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Maximum length of a single path component on common filesystems
pub const MAX_NAME_BYTES: usize = 255;

/// Layout of the synthesized file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    ShowYearCodeTitle,
    ShowYearCode,
    #[default]
    ShowCodeTitle,
    ShowCode,
    CodeTitle,
    Code,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::ShowYearCodeTitle,
        OutputFormat::ShowYearCode,
        OutputFormat::ShowCodeTitle,
        OutputFormat::ShowCode,
        OutputFormat::CodeTitle,
        OutputFormat::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::ShowYearCodeTitle => "Show (Year) - SxxExx - Title",
            OutputFormat::ShowYearCode => "Show (Year) - SxxExx",
            OutputFormat::ShowCodeTitle => "Show - SxxExx - Title",
            OutputFormat::ShowCode => "Show - SxxExx",
            OutputFormat::CodeTitle => "SxxExx - Title",
            OutputFormat::Code => "SxxExx",
        }
    }

    /// The same layout with the title part removed
    pub fn without_title(&self) -> Self {
        match self {
            OutputFormat::ShowYearCodeTitle => OutputFormat::ShowYearCode,
            OutputFormat::ShowCodeTitle => OutputFormat::ShowCode,
            OutputFormat::CodeTitle => OutputFormat::Code,
            other => *other,
        }
    }

    pub fn needs_series(&self) -> bool {
        !matches!(self, OutputFormat::CodeTitle | OutputFormat::Code)
    }

    pub fn has_title(&self) -> bool {
        matches!(
            self,
            OutputFormat::ShowYearCodeTitle | OutputFormat::ShowCodeTitle | OutputFormat::CodeTitle
        )
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let choices: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.as_str()).collect();
                format!(
                    "unknown format '{}', expected one of: {}",
                    wanted,
                    choices.join(", ")
                )
            })
    }
}

/// Build the file stem for an episode.
///
/// An empty title drops to the title-less layout. A layout that needs the
/// series falls back to `CodeTitle`/`Code` when the series is unknown.
pub fn build_stem(
    code: &EpisodeCode,
    title: Option<&str>,
    series: &SeriesContext,
    format: OutputFormat,
) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty());

    let mut format = format;
    if title.is_none() {
        format = format.without_title();
    }
    if format.needs_series() && !series.is_known() {
        format = if format.has_title() {
            OutputFormat::CodeTitle
        } else {
            OutputFormat::Code
        };
    }

    let raw = match (format, title) {
        (OutputFormat::ShowYearCodeTitle, Some(t)) => {
            format!("{} - {} - {}", series.display_name(), code, t)
        }
        (OutputFormat::ShowYearCode, _) | (OutputFormat::ShowYearCodeTitle, None) => {
            format!("{} - {}", series.display_name(), code)
        }
        (OutputFormat::ShowCodeTitle, Some(t)) => format!("{} - {} - {}", series.name(), code, t),
        (OutputFormat::ShowCode, _) | (OutputFormat::ShowCodeTitle, None) => {
            format!("{} - {}", series.name(), code)
        }
        (OutputFormat::CodeTitle, Some(t)) => format!("{} - {}", code, t),
        (OutputFormat::Code, _) | (OutputFormat::CodeTitle, None) => code.to_string(),
    };

    truncate_stem(&sanitize_filename(&raw))
}

/// Build the full file name, keeping the extension as written
pub fn build_filename(
    code: &EpisodeCode,
    title: Option<&str>,
    series: &SeriesContext,
    format: OutputFormat,
    extension: &str,
) -> String {
    let stem = build_stem(code, title, series, format);
    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// Remove characters that are invalid in file names on common platforms.
///
/// A colon becomes ` -` so `Title: Sub` reads `Title - Sub`.
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', '*', '?', '"', '<', '>', '|'];

    let replaced: String = name
        .chars()
        .filter(|c| !c.is_control())
        .filter(|c| !invalid_chars.contains(c))
        .map(|c| if c == ':' { " -".to_string() } else { c.to_string() })
        .collect();

    let collapsed = WHITESPACE_REGEX.replace_all(&replaced, " ");
    collapsed
        .trim()
        .trim_end_matches(['.', ' '])
        .to_string()
}

// Leave room for the extension and a companion suffix
fn truncate_stem(stem: &str) -> String {
    let limit = MAX_NAME_BYTES - 20;
    if stem.len() <= limit {
        return stem.to_string();
    }

    let mut end = limit;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    stem[..end].trim_end_matches(['.', ' ', '-']).to_string()
}

/// Canonical name for a season container folder: `Season 01` or `Specials`
pub fn canonical_season_folder(name: &str) -> Option<String> {
    if is_specials_dir(name.trim()) {
        return Some("Specials".to_string());
    }
    season_folder_number(name).map(|n| {
        if n == 0 {
            "Specials".to_string()
        } else {
            format!("Season {:02}", n)
        }
    })
}
