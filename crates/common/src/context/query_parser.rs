//! Query Parser - Understands user intent and extracts entities
//!
//! Provides:
//! - Intent classification against an ordered pattern table
//! - Query tokenization for relevance scoring
//! - Entity extraction from the raw query text

use super::extractor::EntityExtractor;
use super::preprocessor::Preprocessor;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Query understanding result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryUnderstanding {
    /// Original query text
    pub original_query: String,

    /// Detected intent
    pub intent: QueryIntent,

    /// Preprocessed query tokens, in order
    pub tokens: Vec<String>,

    /// Extracted entity strings, first occurrence order
    pub entities: Vec<String>,
}

/// Query intent classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Definition,
    Comparison,
    How,
    Why,
    When,
    Where,
    Who,
    Example,
    List,
    YesNo,
    General,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::Definition => "definition",
            QueryIntent::Comparison => "comparison",
            QueryIntent::How => "how",
            QueryIntent::Why => "why",
            QueryIntent::When => "when",
            QueryIntent::Where => "where",
            QueryIntent::Who => "who",
            QueryIntent::Example => "example",
            QueryIntent::List => "list",
            QueryIntent::YesNo => "yes_no",
            QueryIntent::General => "general",
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent patterns in priority order; the first match wins
const INTENT_PATTERNS: &[(QueryIntent, &str)] = &[
    (QueryIntent::Definition, r"what is|what are|define|explain|meaning of|definition"),
    (QueryIntent::Comparison, r"difference between|compare|versus|vs|similarities|differences"),
    (QueryIntent::How, r"how to|how do|how can|steps|process|procedure|method"),
    (QueryIntent::Why, r"why|reason|cause|purpose|rationale"),
    (QueryIntent::When, r"when|time|date|period|duration"),
    (QueryIntent::Where, r"where|location|place|site|venue"),
    (QueryIntent::Who, r"who|person|author|creator|individual"),
    (QueryIntent::Example, r"example|instance|illustrate|demonstrate"),
    (QueryIntent::List, r"list|enumerate|what are the|types of|kinds of"),
    (QueryIntent::YesNo, r"^(is|are|can|does|do|has|have|will)"),
];

/// Words that phrase a question rather than name its subject
const CUE_WORDS: &[&str] = &[
    "what", "define", "explain", "describe", "meaning", "definition", "tell", "how", "why",
    "when", "where", "who", "which", "compare", "list", "enumerate", "give", "show",
];

fn intent_patterns() -> &'static [(QueryIntent, Regex)] {
    static PATTERNS: OnceLock<Vec<(QueryIntent, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INTENT_PATTERNS
            .iter()
            .map(|(intent, pattern)| {
                let regex = Regex::new(pattern).expect("intent patterns are valid");
                (*intent, regex)
            })
            .collect()
    })
}

/// Query parser for understanding user queries
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    preprocessor: Preprocessor,
    extractor: EntityExtractor,
}

impl QueryParser {
    pub fn new(preprocessor: Preprocessor, extractor: EntityExtractor) -> Self {
        Self {
            preprocessor,
            extractor,
        }
    }

    /// Parse a query into intent, tokens and entities
    pub fn parse(&self, query: &str) -> QueryUnderstanding {
        QueryUnderstanding {
            original_query: query.to_string(),
            intent: Self::classify(query),
            tokens: self.preprocessor.preprocess(query),
            entities: self.subject_entities(&self.extractor.extract_entities(query)),
        }
    }

    /// Strip leading question words from entities and drop those left empty.
    ///
    /// "What" in "What is Kubernetes?" and "Define" in "Define Kubernetes"
    /// are captured as capitalized phrases but name nothing in the document.
    pub fn subject_entities(&self, entities: &[String]) -> Vec<String> {
        let mut subjects: Vec<String> = Vec::new();
        for entity in entities {
            let words: Vec<&str> = entity
                .split_whitespace()
                .skip_while(|word| self.is_cue_word(word))
                .collect();
            if words.is_empty() {
                continue;
            }
            let subject = words.join(" ");
            if !subjects.contains(&subject) {
                subjects.push(subject);
            }
        }
        subjects
    }

    fn is_cue_word(&self, word: &str) -> bool {
        let lowered = word.to_lowercase();
        CUE_WORDS.contains(&lowered.as_str()) || self.preprocessor.is_stop_word(&lowered)
    }

    /// Map a query to exactly one intent
    pub fn classify(query: &str) -> QueryIntent {
        let lowered = query.to_lowercase();
        intent_patterns()
            .iter()
            .find(|(_, regex)| regex.is_match(&lowered))
            .map(|(intent, _)| *intent)
            .unwrap_or(QueryIntent::General)
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }
}
