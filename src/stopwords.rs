//! Stopword sets used to drop filler words from search queries.
//!
//! The resolver treats a [`StopwordSet`] as an opaque set of lower-case
//! strings. [`StopwordSet::english`] ships the English list used by common
//! NLP toolkits.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// A set of words excluded from search tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StopwordSet {
    words: BTreeSet<String>,
}

impl StopwordSet {
    /// Builds a set from arbitrary words; entries are lower-cased.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// The English stopword list.
    #[must_use]
    pub fn english() -> Self {
        Self::new(ENGLISH.iter().copied())
    }

    /// A set that excludes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            words: BTreeSet::new(),
        }
    }

    /// Whether `token` (already lower-cased) is a stopword.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Number of stopwords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopwordSet {
    fn default() -> Self {
        Self::english()
    }
}

impl From<Vec<String>> for StopwordSet {
    fn from(words: Vec<String>) -> Self {
        Self::new(words)
    }
}

impl From<StopwordSet> for Vec<String> {
    fn from(set: StopwordSet) -> Self {
        set.words.into_iter().collect()
    }
}

/// Lower-cases `text`, splits it on whitespace and drops stopwords.
///
/// # Examples
///
/// ```
/// use gnosis::{tokenize, StopwordSet};
///
/// let tokens = tokenize("The Nature of Gravity", &StopwordSet::english());
/// assert_eq!(tokens, vec!["nature", "gravity"]);
/// ```
#[must_use]
pub fn tokenize(text: &str, stopwords: &StopwordSet) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|token| !stopwords.contains(token))
        .map(str::to_string)
        .collect()
}
