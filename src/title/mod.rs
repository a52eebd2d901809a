mod extract;
mod types;
mod validate;

pub use extract::{clean_title_text, extract_title};
pub use types::{EpisodeTitle, TitleSource};
pub use validate::{check_candidate, Rejection, SeenTitles, TitleLookup, TitleValidator};
