//! Movie request classification and title extraction

use crate::{lexicon::Lexicon, model::Classification};

/// Configuration for the request classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum characters for a token and for a whole title
    pub min_title_length: usize,
    /// Maximum titles extracted from one message
    pub max_titles_per_message: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_title_length: 2,
            max_titles_per_message: 5,
        }
    }
}

/// Keyword heuristic deciding whether a message asks for a movie or show,
/// and which titles it names
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    config: ClassifierConfig,
    lexicon: Lexicon,
}

impl RequestClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_lexicon(config, Lexicon::default())
    }

    pub fn with_lexicon(config: ClassifierConfig, lexicon: Lexicon) -> Self {
        Self { config, lexicon }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a message. Never fails: empty text is simply not a request.
    pub fn classify(&self, text: &str) -> Classification {
        let titles: Vec<String> = self.titles(text).collect();

        tracing::debug!(
            is_request = !titles.is_empty(),
            titles = ?titles,
            "Classified message"
        );

        Classification::from_titles(titles)
    }

    /// Candidate titles in segment order, at most `max_titles_per_message`.
    ///
    /// Segments after the cap is reached are never filtered.
    pub fn titles<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let segments = if self.is_candidate(text) {
            split_segments(text, self.lexicon.separators)
        } else {
            Vec::new()
        };

        segments
            .into_iter()
            .filter_map(move |segment| self.title_from_segment(segment))
            .take(self.config.max_titles_per_message)
    }

    /// Indicator scan: necessary but not sufficient for a request
    fn is_candidate(&self, text: &str) -> bool {
        !text.is_empty() && self.lexicon.has_indicator(&text.to_lowercase())
    }

    /// Drop short tokens and stop words, keep the rest as one title
    fn title_from_segment(&self, segment: &str) -> Option<String> {
        let min_len = self.config.min_title_length;

        let title = segment
            .split_whitespace()
            .filter(|token| token.chars().count() >= min_len)
            .filter(|token| !self.lexicon.is_stop_word(token))
            .collect::<Vec<_>>()
            .join(" ");

        if title.is_empty() || title.chars().count() < min_len {
            None
        } else {
            Some(title)
        }
    }
}

/// Split `text` by each separator in turn; every separator re-splits the
/// pieces produced by the ones before it. Empty pieces are kept.
pub fn split_segments<'t>(text: &'t str, separators: &[&str]) -> Vec<&'t str> {
    separators.iter().fold(vec![text], |segments, separator| {
        segments
            .into_iter()
            .flat_map(|segment| segment.split(*separator))
            .collect()
    })
}
