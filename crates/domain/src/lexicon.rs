//! Word lists driving the request heuristic

/// Substrings whose presence (case-insensitive) marks a message as a
/// candidate movie request
pub const INDICATORS: &[&str] = &[
    "movie",
    "film",
    "series",
    "show",
    "season",
    "watch",
    "download",
    "need",
    "want",
    "looking for",
    "hindi",
    "english",
    "tamil",
    "telugu",
    "malayalam",
    "dubbed",
    "subtitles",
    "link",
    "available",
];

/// Tokens dropped from a segment before it becomes a title (compared
/// lowercase)
pub const STOP_WORDS: &[&str] = &[
    "movie",
    "film",
    "series",
    "show",
    "season",
    "watch",
    "download",
    "need",
    "want",
    "looking",
    "for",
    "hindi",
    "english",
    "tamil",
    "telugu",
    "malayalam",
    "dubbed",
    "subtitles",
    "link",
    "available",
    "please",
    "anyone",
    "have",
    "send",
    "share",
    "upload",
    "the",
    "and",
    "any",
    "with",
    "bro",
    "sir",
    "guys",
    "all",
    "can",
    "you",
    "me",
];

/// Separators between titles listed in one message, applied in this order.
/// Matching is case-sensitive on the original text.
pub const SEPARATORS: &[&str] = &[",", "&", "and", "also", "+", "|"];

/// The word lists a classifier runs with
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub indicators: &'static [&'static str],
    pub stop_words: &'static [&'static str],
    pub separators: &'static [&'static str],
}

impl Lexicon {
    /// True if the lowercased text contains any indicator
    pub fn has_indicator(&self, text_lower: &str) -> bool {
        self.indicators
            .iter()
            .any(|indicator| text_lower.contains(indicator))
    }

    /// True if the token is a stop word (case-insensitive)
    pub fn is_stop_word(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        self.stop_words.contains(&lower.as_str())
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            indicators: INDICATORS,
            stop_words: STOP_WORDS,
            separators: SEPARATORS,
        }
    }
}
