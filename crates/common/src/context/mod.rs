//! Context Engine Core Components
//!
//! The local analysis engine answers questions about a document without any
//! external model:
//! - Preprocessing (tokens, stop words, lemmas)
//! - Relevance scoring of passages and sentences
//! - Query intent classification
//! - Entity and definition extraction
//! - Templated answer synthesis

mod extractor;
mod preprocessor;
mod query_parser;
mod scorer;
pub mod synthesizer;

pub use extractor::{Entity, EntityExtractor, EntityType};
pub use preprocessor::{split_sentences, Lemmatizer, Preprocessor};
pub use query_parser::{QueryIntent, QueryParser, QueryUnderstanding};
pub use scorer::{jaccard, rank_scores, RelevanceScorer, ScoredPassage, ScoringWeights};

use rand::Rng;

/// Passages whose sentences are considered for a general answer
const SENTENCE_SOURCE_PASSAGES: usize = 3;

/// Ranked sentences handed to the formatter
const TOP_SENTENCES: usize = 5;

/// Local question-answering pipeline
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    parser: QueryParser,
    scorer: RelevanceScorer,
}

impl AnalysisEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            parser: QueryParser::default(),
            scorer: RelevanceScorer::new(weights),
        }
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        self.parser.preprocessor()
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    /// Rank passages against a free-text query
    pub fn rank_passages<S: AsRef<str>>(&self, query: &str, passages: &[S]) -> Vec<ScoredPassage> {
        let tokens = self.preprocessor().preprocess(query);
        self.scorer.rank(self.preprocessor(), &tokens, passages)
    }

    /// Answer `query` from passages already ordered by relevance
    pub fn generate_answer<S: AsRef<str>, R: Rng + ?Sized>(
        &self,
        query: &str,
        passages: &[S],
        rng: &mut R,
    ) -> String {
        let understanding = self.parser.parse(query);
        let entities = &understanding.entities;

        if passages.is_empty() {
            return synthesizer::fallback_response(entities);
        }

        let extractor = self.parser.extractor();

        if understanding.intent == QueryIntent::Definition {
            if let Some(term) = entities.first() {
                if let Some(definition) = extractor.extract_definition(term, passages) {
                    return synthesizer::render_definition(term, &definition, rng);
                }
            }
        }

        if matches!(understanding.intent, QueryIntent::Why | QueryIntent::How) {
            if let Some(explanation) = extractor.extract_explanation(entities, passages) {
                return synthesizer::render_explanation(&explanation, rng);
            }
        }

        let sentences: Vec<String> = passages
            .iter()
            .take(SENTENCE_SOURCE_PASSAGES)
            .flat_map(|p| split_sentences(p.as_ref()))
            .collect();

        let ranked = self
            .scorer
            .rank(self.preprocessor(), &understanding.tokens, &sentences);
        let top: Vec<String> = ranked
            .iter()
            .take(TOP_SENTENCES)
            .map(|r| sentences[r.index].clone())
            .filter(|s| !s.is_empty())
            .collect();

        synthesizer::generate_coherent_response(understanding.intent, entities, &top, rng)
    }
}
