use crate::parser::normalize_key;

/// Where an accepted episode title came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Filename,
    MetadataLookup,
    None,
}

/// Episode title after validation; empty when nothing usable was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeTitle {
    text: Option<String>,
    key: String,
    source: TitleSource,
}

impl EpisodeTitle {
    pub fn new(text: impl Into<String>, source: TitleSource) -> Self {
        let text = text.into();
        let key = normalize_key(&text);
        Self {
            text: Some(text),
            key,
            source,
        }
    }

    pub fn none() -> Self {
        Self {
            text: None,
            key: String::new(),
            source: TitleSource::None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> TitleSource {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_key() {
        let title = EpisodeTitle::new("It's About George...", TitleSource::Filename);
        assert_eq!(title.text(), Some("It's About George..."));
        assert_eq!(title.key(), "itsaboutgeorge");
        assert_eq!(title.source(), TitleSource::Filename);
        assert!(!title.is_empty());
    }

    #[test]
    fn test_none_title() {
        let title = EpisodeTitle::none();
        assert!(title.is_empty());
        assert_eq!(title.text(), None);
        assert_eq!(title.source(), TitleSource::None);
    }
}
