mod reader;
mod types;
mod writer;

pub use reader::read_history;
pub use types::*;
pub use writer::{entries_from_report, write_history, write_history_file, HistoryError};
