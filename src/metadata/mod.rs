mod tools;
mod types;

pub use tools::{
    normalize_reported_title, parse_track_ids, ExternalToolCleaner, MediaInfoLookup,
    MetadataCleaner,
};
pub use types::{CleanOutcome, MetadataError, ToolConfig};

use std::env;

/// Environment variables overriding the external tool commands
pub const ENV_MEDIAINFO: &str = "EPISODE_RENAMER_MEDIAINFO";
pub const ENV_MKVPROPEDIT: &str = "EPISODE_RENAMER_MKVPROPEDIT";
pub const ENV_MKVMERGE: &str = "EPISODE_RENAMER_MKVMERGE";
pub const ENV_FFMPEG: &str = "EPISODE_RENAMER_FFMPEG";

/// Load tool commands from environment variables
///
/// Each variable may hold a command name or an absolute path. Unset or
/// empty variables fall back to the plain tool name looked up on `PATH`.
/// These can be set in a `.env` file in the working directory.
pub fn config_from_env() -> ToolConfig {
    let defaults = ToolConfig::default();
    let read = |name: &str, default: String| {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    };

    ToolConfig {
        mediainfo: read(ENV_MEDIAINFO, defaults.mediainfo),
        mkvpropedit: read(ENV_MKVPROPEDIT, defaults.mkvpropedit),
        mkvmerge: read(ENV_MKVMERGE, defaults.mkvmerge),
        ffmpeg: read(ENV_FFMPEG, defaults.ffmpeg),
    }
}
