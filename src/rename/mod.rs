mod companion;
mod executor;
mod name_builder;
mod session;
mod types;

pub use companion::{language_tag, strip_language_tag, subtitle_name, CompanionResolver};
pub use executor::execute_plan;
pub use name_builder::{
    build_filename, build_stem, canonical_season_folder, sanitize_filename, OutputFormat,
    MAX_NAME_BYTES,
};
pub use session::{process_directory, RenameOptions, RenameSession};
pub use types::{
    ItemError, ItemReport, ItemStatus, RenameKind, RenameOutcome, RenamePlan, RunReport,
};
