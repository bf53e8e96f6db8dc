//! Relevance scoring - TF-IDF, Jaccard similarity and exact-phrase boosts

use super::preprocessor::Preprocessor;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Weights of the combined relevance score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub tfidf: f64,
    pub jaccard: f64,
    pub phrase: f64,
    /// Added to the phrase signal for every matched query bigram
    pub phrase_boost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            tfidf: 0.6,
            jaccard: 0.3,
            phrase: 0.1,
            phrase_boost: 0.2,
        }
    }
}

/// A passage index paired with its score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPassage {
    pub index: usize,
    pub score: f64,
}

/// Scores candidate passages against a tokenized query
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    weights: ScoringWeights,
}

impl RelevanceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// One score per passage, in passage order
    pub fn score<S: AsRef<str>>(
        &self,
        preprocessor: &Preprocessor,
        query_tokens: &[String],
        passages: &[S],
    ) -> Vec<f64> {
        let tokenized: Vec<Vec<String>> = passages
            .iter()
            .map(|p| preprocessor.preprocess(p.as_ref()))
            .collect();
        self.score_tokenized(query_tokens, &tokenized)
    }

    /// Score already-preprocessed passages
    pub fn score_tokenized(&self, query_tokens: &[String], passages: &[Vec<String>]) -> Vec<f64> {
        if passages.is_empty() {
            return Vec::new();
        }

        // Document frequency over the candidate set
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in passages {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let passage_count = passages.len() as f64;
        let query_set: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();
        let query_bigrams: Vec<String> = query_tokens
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect();

        passages
            .iter()
            .map(|tokens| {
                if tokens.is_empty() {
                    return 0.0;
                }

                let mut term_counts: HashMap<&str, usize> = HashMap::new();
                for token in tokens {
                    *term_counts.entry(token.as_str()).or_insert(0) += 1;
                }
                let length = tokens.len() as f64;

                let tfidf: f64 = query_tokens
                    .iter()
                    .filter_map(|q| {
                        let count = *term_counts.get(q.as_str())?;
                        let tf = count as f64 / length;
                        let df = doc_freq.get(q.as_str()).copied().unwrap_or(1).max(1) as f64;
                        Some(tf * (passage_count / df).ln())
                    })
                    .sum();

                let passage_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();
                let jaccard = jaccard(&query_set, &passage_set);

                let joined = tokens.join(" ");
                let boost = query_bigrams
                    .iter()
                    .filter(|bigram| joined.contains(bigram.as_str()))
                    .count() as f64
                    * self.weights.phrase_boost;

                self.weights.tfidf * tfidf + self.weights.jaccard * jaccard + self.weights.phrase * boost
            })
            .collect()
    }

    /// Passages sorted by descending score; ties keep passage order
    pub fn rank<S: AsRef<str>>(
        &self,
        preprocessor: &Preprocessor,
        query_tokens: &[String],
        passages: &[S],
    ) -> Vec<ScoredPassage> {
        rank_scores(&self.score(preprocessor, query_tokens, passages))
    }
}

/// Stable descending ordering of a score vector
pub fn rank_scores(scores: &[f64]) -> Vec<ScoredPassage> {
    let mut ranked: Vec<ScoredPassage> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| ScoredPassage { index, score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Intersection over union; zero when either side is empty
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_empty_passage_scores_zero() {
        let scorer = RelevanceScorer::default();
        let passages = vec![tokens(&["neural", "network"]), Vec::new()];
        let scores = scorer.score_tokenized(&tokens(&["neural", "network"]), &passages);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_no_passages() {
        let scorer = RelevanceScorer::default();
        assert!(scorer.score_tokenized(&tokens(&["query"]), &[]).is_empty());
    }

    #[test]
    fn test_jaccard_symmetric() {
        let a: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
        let b: HashSet<&str> = ["b", "c", "d", "e"].into_iter().collect();
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        assert!((jaccard(&a, &b) - 0.4).abs() < 1e-12);
        assert_eq!(jaccard(&a, &HashSet::new()), 0.0);
    }

    #[test]
    fn test_relevant_passage_ranks_first() {
        let pre = Preprocessor::new();
        let scorer = RelevanceScorer::default();
        let passages = [
            "The weather was pleasant during the conference.",
            "Gradient descent updates model parameters iteratively.",
            "Lunch was served at noon.",
        ];
        let query = pre.preprocess("How does gradient descent work?");
        let ranked = scorer.rank(&pre, &query, &passages);
        assert_eq!(ranked[0].index, 1);
        assert!(ranked[0].score > 0.0);
    }

    #[test]
    fn test_phrase_boost_applies_to_adjacent_bigram() {
        let scorer = RelevanceScorer::default();
        let query = tokens(&["machine", "learning"]);
        // Both passages contain both tokens; only the first has them adjacent
        let passages = vec![
            tokens(&["machine", "learning", "model"]),
            tokens(&["learning", "machine", "model"]),
        ];
        let scores = scorer.score_tokenized(&query, &passages);
        let expected = 0.1 * 0.2;
        assert!((scores[0] - scores[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_stable_ranking_on_ties() {
        let ranked = rank_scores(&[0.5, 1.0, 0.5, 1.0]);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_custom_weights() {
        let weights = ScoringWeights {
            tfidf: 0.0,
            jaccard: 1.0,
            phrase: 0.0,
            phrase_boost: 0.2,
        };
        let scorer = RelevanceScorer::new(weights);
        let scores = scorer.score_tokenized(&tokens(&["a", "b"]), &[tokens(&["a", "b"])]);
        assert!((scores[0] - 1.0).abs() < 1e-12);
    }
}
