//! Mind-map tree, model output recovery and the local word-frequency builder

use crate::context::{split_sentences, Preprocessor};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const ROOT_ID: &str = "root";
pub const DEFAULT_TITLE: &str = "Document Mind Map";

/// Lines inspected when looking for a title
const TITLE_SCAN_LINES: usize = 5;
const MAX_TITLE_CHARS: usize = 50;
const MAX_TOPICS: usize = 6;
const MAX_SUBTOPICS: usize = 4;

/// A node of the mind map; leaves omit `children`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MindMapNode>>,
}

impl MindMapNode {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: None,
        }
    }

    pub fn branch(id: impl Into<String>, name: impl Into<String>, children: Vec<MindMapNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Some(children),
        }
    }

    pub fn children(&self) -> &[MindMapNode] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// Parse a model response as a mind map: whole text first, then the outermost braces
pub fn extract_mindmap_json(text: &str) -> Option<MindMapNode> {
    let parse = |candidate: &str| serde_json::from_str::<MindMapNode>(candidate.trim()).ok();

    let mut node = parse(text).or_else(|| {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        (end > start).then(|| parse(&text[start..=end])).flatten()
    })?;

    node.id = ROOT_ID.to_string();
    Some(node)
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("valid pattern"))
}

/// Content words of a sentence, lowercased
fn content_words<'a>(sentence: &'a str, preprocessor: &'a Preprocessor) -> impl Iterator<Item = String> + 'a {
    word_pattern()
        .find_iter(sentence)
        .map(|m| m.as_str().to_lowercase())
        .filter(move |w| !preprocessor.is_stop_word(w))
}

/// Most frequent items, ties in first-seen order
fn top_by_frequency(words: impl Iterator<Item = String>, limit: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        let count = counts.entry(word.clone()).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(limit);
    order
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn document_title(text: &str) -> String {
    text.lines()
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .find(|line| !line.is_empty() && line.chars().count() < MAX_TITLE_CHARS)
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Build a two-level mind map from word frequencies
pub fn local_mindmap(text: &str, preprocessor: &Preprocessor) -> MindMapNode {
    let title = document_title(text);

    let sentences: Vec<String> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .flat_map(split_sentences)
        .collect();

    let topics = top_by_frequency(
        sentences.iter().flat_map(|s| content_words(s, preprocessor)),
        MAX_TOPICS,
    );

    let children = topics
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let topic_id = format!("topic-{}", i + 1);

            let related = sentences
                .iter()
                .filter(|s| content_words(s, preprocessor).any(|w| &w == topic));
            let subtopics = top_by_frequency(
                related.flat_map(|s| content_words(s, preprocessor).filter(move |w| w != topic)),
                MAX_SUBTOPICS,
            );

            let leaves = subtopics
                .iter()
                .enumerate()
                .map(|(j, sub)| MindMapNode::leaf(format!("{}-{}", topic_id, j + 1), title_case(sub)))
                .collect();

            MindMapNode::branch(topic_id, title_case(topic), leaves)
        })
        .collect();

    MindMapNode::branch(ROOT_ID, title, children)
}
