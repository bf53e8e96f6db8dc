//! Text preprocessing - tokenization, stop-word removal and lemmatization

use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// English stop words
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
    "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
    "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
    "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to",
    "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t",
    "can", "will", "just", "don", "don't", "should", "should've", "now", "d", "ll",
    "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
    "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't",
    "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn",
    "mustn't", "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn",
    "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

/// Irregular plural forms and their lemmas
const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("data", "datum"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("theses", "thesis"),
    ("hypotheses", "hypothesis"),
    ("crises", "crisis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("appendices", "appendix"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("halves", "half"),
    ("wolves", "wolf"),
    ("shelves", "shelf"),
    ("selves", "self"),
    ("thieves", "thief"),
    ("formulae", "formula"),
    ("bacteria", "bacterium"),
    ("media", "medium"),
    ("curricula", "curriculum"),
    ("fungi", "fungus"),
    ("stimuli", "stimulus"),
    ("syllabi", "syllabus"),
];

/// Endings that look plural but belong to the base form
const INVARIANT_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Dictionary-backed noun lemmatizer.
///
/// Irregular forms are looked up first; regular plurals are reduced by
/// detaching inflectional suffixes, longest rule first.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR_FORMS.iter().copied().collect(),
        }
    }

    /// Reduce a lowercase token to its dictionary base form
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.irregular.get(token) {
            return (*lemma).to_string();
        }

        if token.chars().count() <= 3
            || !token.ends_with('s')
            || token.chars().any(|c| c.is_ascii_digit())
            || INVARIANT_ENDINGS.iter().any(|e| token.ends_with(e))
        {
            return token.to_string();
        }

        if let Some(stem) = token.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{}y", stem);
            }
        }

        for suffix in ["sses", "ches", "shes", "xes", "zes"] {
            if token.ends_with(suffix) {
                return token[..token.len() - 2].to_string();
            }
        }

        token[..token.len() - 1].to_string()
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns text spans into normalized token sequences
#[derive(Debug, Clone)]
pub struct Preprocessor {
    stop_words: HashSet<&'static str>,
    lemmatizer: Lemmatizer,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            lemmatizer: Lemmatizer::new(),
        }
    }

    /// Lowercase, tokenize, drop non-alphanumeric tokens and stop words, lemmatize
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let lowered = text.to_lowercase();
        lowered
            .split_word_bounds()
            .filter(|t| !t.is_empty() && t.chars().all(char::is_alphanumeric))
            .filter(|t| !self.stop_words.contains(t))
            .map(|t| self.lemmatizer.lemmatize(t))
            .collect()
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word.to_lowercase().as_str())
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text into trimmed, non-empty sentences
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let pre = Preprocessor::new();
        assert!(pre.preprocess("").is_empty());
        assert!(pre.preprocess("   ").is_empty());
    }

    #[test]
    fn test_stop_words_and_punctuation_removed() {
        let pre = Preprocessor::new();
        let tokens = pre.preprocess("The model is trained, and it works!");
        assert_eq!(tokens, vec!["model", "trained", "work"]);
    }

    #[test]
    fn test_order_is_preserved() {
        let pre = Preprocessor::new();
        let tokens = pre.preprocess("Neural networks learn representations");
        assert_eq!(tokens, vec!["neural", "network", "learn", "representation"]);
    }

    #[test]
    fn test_lemmatizer_rules() {
        let lem = Lemmatizer::new();
        assert_eq!(lem.lemmatize("studies"), "study");
        assert_eq!(lem.lemmatize("boxes"), "box");
        assert_eq!(lem.lemmatize("churches"), "church");
        assert_eq!(lem.lemmatize("processes"), "process");
        assert_eq!(lem.lemmatize("houses"), "house");
        assert_eq!(lem.lemmatize("children"), "child");
        assert_eq!(lem.lemmatize("data"), "datum");
        assert_eq!(lem.lemmatize("analysis"), "analysis");
        assert_eq!(lem.lemmatize("status"), "status");
        assert_eq!(lem.lemmatize("class"), "class");
        assert_eq!(lem.lemmatize("gas"), "gas");
        assert_eq!(lem.lemmatize("1990s"), "1990s");
    }

    #[test]
    fn test_numbers_are_kept() {
        let pre = Preprocessor::new();
        let tokens = pre.preprocess("Revenue grew 15 percent in 2023");
        assert_eq!(tokens, vec!["revenue", "grew", "15", "percent", "2023"]);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First point. Second point? Third!  ");
        assert_eq!(sentences, vec!["First point.", "Second point?", "Third!"]);
        assert!(split_sentences("").is_empty());
    }
}
