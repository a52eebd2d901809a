use clap::Parser;
use std::path::PathBuf;

use crate::rename::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "episode-renamer")]
#[command(author, version, about, long_about = None)]
#[command(about = "Rename TV and anime episode files to a consistent naming scheme")]
pub struct Args {
    /// Series folder containing the episode files
    #[arg(default_value = ".")]
    pub target_dir: PathBuf,

    /// Simulate changes without modifying the filesystem
    #[arg(short, long, visible_alias = "dry-run")]
    pub dry: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Overwrite files that already have the target name
    #[arg(short, long)]
    pub force: bool,

    /// Prefer anime numbering (`Show - 01`) over scene tags
    #[arg(short, long)]
    pub anime: bool,

    /// Series name to use instead of the folder name
    #[arg(short, long, value_name = "NAME")]
    pub series: Option<String>,

    /// Output naming format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Rewrite container titles and drop track names after renaming
    #[arg(long)]
    pub deep_clean: bool,

    /// Ask mediainfo for a title when the file name has none
    #[arg(long)]
    pub metadata_titles: bool,

    /// Normalize season folder names (`season 1` -> `Season 01`)
    #[arg(long)]
    pub season_folders: bool,

    /// Write a history file that --revert can undo
    #[arg(long)]
    pub history: bool,

    /// Revert changes using a history file
    #[arg(short, long, value_name = "HISTORY_FILE")]
    pub revert: Option<PathBuf>,
}

impl Args {
    /// The requested format, or the mode's default
    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            Some(format) => format,
            None if self.anime => OutputFormat::ShowCode,
            None => OutputFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("episode-renamer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.target_dir, PathBuf::from("."));
        assert!(!args.dry);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.output_format(), OutputFormat::ShowCodeTitle);
    }

    #[test]
    fn test_anime_changes_default_format() {
        assert_eq!(parse(&["-a"]).output_format(), OutputFormat::ShowCode);
        assert_eq!(
            parse(&["-a", "--format", "SxxExx - Title"]).output_format(),
            OutputFormat::CodeTitle
        );
    }

    #[test]
    fn test_flags() {
        let args = parse(&["/tv/Show", "--dry-run", "-vv", "-f", "-s", "Show (2020)"]);
        assert_eq!(args.target_dir, PathBuf::from("/tv/Show"));
        assert!(args.dry);
        assert_eq!(args.verbose, 2);
        assert!(args.force);
        assert_eq!(args.series.as_deref(), Some("Show (2020)"));
    }

    #[test]
    fn test_invalid_format_rejected() {
        let result = Args::try_parse_from(["episode-renamer", "--format", "Title only"]);
        assert!(result.is_err());
    }
}
