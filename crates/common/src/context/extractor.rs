//! Entity and definition extraction

use super::preprocessor::split_sentences;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Extracted entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity text as it appears in the source
    pub text: String,

    /// Entity type
    pub entity_type: EntityType,
}

/// Types of entities we can extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Run of capitalized words
    CapitalizedPhrase,
    /// Two or more uppercase letters
    Acronym,
    /// Number with up to three following words
    Numeric,
}

struct EntityPatterns {
    capitalized: Regex,
    acronym: Regex,
    numeric: Regex,
}

fn entity_patterns() -> &'static EntityPatterns {
    static PATTERNS: OnceLock<EntityPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| EntityPatterns {
        capitalized: Regex::new(r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*").expect("valid pattern"),
        acronym: Regex::new(r"\b[A-Z]{2,}\b").expect("valid pattern"),
        numeric: Regex::new(r"\d+(?:\.\d+)?%?(?:\s+[a-zA-Z]+){1,3}").expect("valid pattern"),
    })
}

/// Definition phrasings; `{}` is replaced by the escaped term
const DEFINITION_TEMPLATES: &[&str] = &[
    r"{}\s+is\s+([^\.]+)",
    r"{}\s+refers\s+to\s+([^\.]+)",
    r"{}\s+means\s+([^\.]+)",
    r"{}\s+can\s+be\s+defined\s+as\s+([^\.]+)",
    r"{}:\s+([^\.]+)",
];

/// Sentences returned by an explanation lookup
const EXPLANATION_SENTENCES: usize = 3;

/// Pulls entities, definitions and explanations out of text
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Typed entities: capitalized phrases, then acronyms, then numeric spans
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let patterns = entity_patterns();
        let groups = [
            (&patterns.capitalized, EntityType::CapitalizedPhrase),
            (&patterns.acronym, EntityType::Acronym),
            (&patterns.numeric, EntityType::Numeric),
        ];

        let mut seen = HashSet::new();
        let mut entities = Vec::new();
        for (regex, entity_type) in groups {
            for m in regex.find_iter(text) {
                let value = m.as_str().to_string();
                if seen.insert(value.clone()) {
                    entities.push(Entity {
                        text: value,
                        entity_type,
                    });
                }
            }
        }
        entities
    }

    /// Unique entity strings in first-occurrence order
    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        self.extract(text).into_iter().map(|e| e.text).collect()
    }

    /// Find how the passages define `term`.
    ///
    /// Explicit phrasings are tried per passage in order; otherwise the first
    /// sentence mentioning the term is used.
    pub fn extract_definition<S: AsRef<str>>(&self, term: &str, passages: &[S]) -> Option<String> {
        let term_lower = term.to_lowercase();
        if term_lower.trim().is_empty() {
            return None;
        }

        let escaped = regex_lite::escape(&term_lower);
        let patterns: Vec<Regex> = DEFINITION_TEMPLATES
            .iter()
            .filter_map(|template| match Regex::new(&template.replace("{}", &escaped)) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(term = %term, error = %e, "Skipping definition pattern");
                    None
                }
            })
            .collect();

        for passage in passages {
            let lowered = passage.as_ref().to_lowercase();
            for regex in &patterns {
                if let Some(definition) = regex
                    .captures(&lowered)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|d| !d.is_empty())
                {
                    return Some(definition);
                }
            }
        }

        passages
            .iter()
            .flat_map(|p| split_sentences(p.as_ref()))
            .find(|sentence| sentence.to_lowercase().contains(&term_lower))
    }

    /// The sentences that mention the most entities, best first
    pub fn extract_explanation<S: AsRef<str>>(
        &self,
        entities: &[String],
        passages: &[S],
    ) -> Option<String> {
        if entities.is_empty() {
            return None;
        }

        let lowered: Vec<String> = entities.iter().map(|e| e.to_lowercase()).collect();
        let mut scored: Vec<(usize, String)> = passages
            .iter()
            .flat_map(|p| split_sentences(p.as_ref()))
            .filter_map(|sentence| {
                let sentence_lower = sentence.to_lowercase();
                let hits = lowered
                    .iter()
                    .filter(|e| sentence_lower.contains(e.as_str()))
                    .count();
                (hits > 0).then_some((hits, sentence))
            })
            .collect();

        if scored.is_empty() {
            return None;
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let explanation = scored
            .into_iter()
            .take(EXPLANATION_SENTENCES)
            .map(|(_, sentence)| sentence)
            .collect::<Vec<_>>()
            .join(" ");
        Some(explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ordering_and_dedup() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract_entities(
            "Marie Curie joined the CNRS in Paris. Marie Curie won 2 Nobel prizes and CNRS grew 15% per year.",
        );
        assert_eq!(
            entities,
            vec![
                "Marie Curie",
                "Paris",
                "Nobel",
                "CNRS",
                "2 Nobel prizes and",
                "15% per year",
            ]
        );
    }

    #[test]
    fn test_entity_types() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("The API returned 3.5 seconds latency");
        assert_eq!(entities[0].text, "The");
        assert_eq!(entities[0].entity_type, EntityType::CapitalizedPhrase);
        assert!(entities
            .iter()
            .any(|e| e.text == "API" && e.entity_type == EntityType::Acronym));
        assert!(entities
            .iter()
            .any(|e| e.text == "3.5 seconds latency" && e.entity_type == EntityType::Numeric));
    }

    #[test]
    fn test_no_entities() {
        let extractor = EntityExtractor::new();
        assert!(extractor.extract_entities("nothing to see here").is_empty());
        assert!(extractor.extract_entities("").is_empty());
    }

    #[test]
    fn test_extract_definition_pattern() {
        let extractor = EntityExtractor::new();
        let passages = [
            "Intro text without the term.",
            "Photosynthesis is the process by which plants convert light. It happens in leaves.",
        ];
        let definition = extractor.extract_definition("Photosynthesis", &passages);
        assert_eq!(
            definition.as_deref(),
            Some("the process by which plants convert light")
        );
    }

    #[test]
    fn test_extract_definition_refers_to() {
        let extractor = EntityExtractor::new();
        let passages = ["The term latency refers to the delay before transfer begins."];
        let definition = extractor.extract_definition("latency", &passages);
        assert_eq!(definition.as_deref(), Some("the delay before transfer begins"));
    }

    #[test]
    fn test_extract_definition_sentence_fallback() {
        let extractor = EntityExtractor::new();
        let passages = ["Results vary. We measured Throughput under load. Done."];
        let definition = extractor.extract_definition("throughput", &passages);
        assert_eq!(definition.as_deref(), Some("We measured Throughput under load."));
    }

    #[test]
    fn test_extract_definition_not_found() {
        let extractor = EntityExtractor::new();
        let passages = ["Nothing relevant here."];
        assert!(extractor.extract_definition("quantum", &passages).is_none());
        assert!(extractor.extract_definition("", &passages).is_none());
    }

    #[test]
    fn test_extract_explanation_prefers_more_matches() {
        let extractor = EntityExtractor::new();
        let entities = vec!["Rust".to_string(), "Cargo".to_string()];
        let passages = ["Cargo builds code. Rust ships with Cargo. Nothing else."];
        let explanation = extractor.extract_explanation(&entities, &passages).unwrap();
        assert!(explanation.starts_with("Rust ships with Cargo."));
        assert!(explanation.contains("Cargo builds code."));
        assert!(!explanation.contains("Nothing else"));
    }
}
