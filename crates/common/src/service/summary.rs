//! Extractive local summarizer

use super::simplify::simplify_rules;
use crate::context::split_sentences;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shorter than this is returned unchanged
const MIN_SUMMARY_INPUT_CHARS: usize = 200;

/// Documents with at most this many sentences are returned unchanged
const MIN_SUMMARY_SENTENCES: usize = 5;

const CONNECTORS: &[&str] = &["Additionally, ", "Moreover, ", "Also, "];

/// Requested summary register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simplified,
    #[default]
    Standard,
    Technical,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simplified => "simplified",
            Complexity::Standard => "standard",
            Complexity::Technical => "technical",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryOptions {
    pub complexity: Complexity,
    /// Upper bound on summary words
    pub max_length: Option<usize>,
}

/// Pick sentences from the start, middle third and end, joined with connectors
pub fn extractive_summary(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() < MIN_SUMMARY_INPUT_CHARS {
        return text;
    }

    let sentences = split_sentences(&text);
    let n = sentences.len();
    if n <= MIN_SUMMARY_SENTENCES {
        return text;
    }

    let mut selected: Vec<&str> = Vec::new();
    selected.extend(sentences.iter().take(2.min(n / 5)).map(String::as_str));

    let middle = &sentences[n / 3..2 * n / 3];
    if middle.len() > 2 {
        for idx in [middle.len() / 3, 2 * middle.len() / 3] {
            if let Some(sentence) = middle.get(idx) {
                selected.push(sentence);
            }
        }
    }

    let tail = 2.min((n / 5).max(1));
    selected.extend(sentences[n - tail..].iter().map(String::as_str));

    let last = selected.len() - 1;
    let mut summary = selected[0].to_string();
    for (i, sentence) in selected.iter().enumerate().skip(1) {
        let connector = if i == 1 {
            "Furthermore, "
        } else if i == last {
            "Finally, "
        } else {
            CONNECTORS[i % CONNECTORS.len()]
        };
        summary.push(' ');
        summary.push_str(connector);
        summary.push_str(sentence);
    }
    summary
}

/// Truncate to at most `max_words` words
pub fn limit_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}

/// Local summary honoring complexity and length options
pub fn local_summary(text: &str, options: SummaryOptions) -> String {
    let mut summary = extractive_summary(text);
    if options.complexity == Complexity::Simplified {
        summary = simplify_rules(&summary);
    }
    match options.max_length {
        Some(max) if max > 0 => limit_words(&summary, max),
        _ => summary,
    }
}
