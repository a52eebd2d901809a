pub mod cli;
pub mod error;
pub mod history;
pub mod logging;
pub mod metadata;
pub mod output;
pub mod parser;
pub mod progress;
pub mod rename;
pub mod revert;
pub mod scanner;
pub mod title;

pub use error::{AppError, ExitCode};
pub use parser::{locate_episode, EpisodeCode, EpisodeMatch, LocatorMode, SeriesContext};
pub use rename::{
    build_filename, execute_plan, process_directory, OutputFormat, RenameOptions, RenameSession,
    RunReport,
};
pub use scanner::{scan_media, MediaKind, MediaPath, ScannerError};
pub use title::{extract_title, SeenTitles, TitleLookup, TitleValidator};
