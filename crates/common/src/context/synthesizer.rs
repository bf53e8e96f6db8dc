//! Answer Synthesizer - Renders templated answers from ranked sentences
//!
//! Provides:
//! - Intent-specific formatting (steps, comparison, list, yes/no, general)
//! - Definition and explanation templates
//! - Not-found and entity-aware fallback answers
//!
//! Template choice goes through a caller-supplied RNG so output is
//! reproducible under a fixed seed.

use super::query_parser::QueryIntent;
use rand::seq::SliceRandom;
use rand::Rng;
use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

pub const DEFINITION_TEMPLATES: &[&str] = &[
    "Based on the document, {term} refers to {definition}.",
    "The document defines {term} as {definition}.",
    "{term} is described as {definition} in the document.",
];

pub const EXPLANATION_TEMPLATES: &[&str] = &[
    "According to the document, {explanation}",
    "The document explains that {explanation}",
    "As stated in the document, {explanation}",
];

pub const NOT_FOUND_TEMPLATES: &[&str] = &[
    "I couldn't find specific information about that in the document.",
    "The document doesn't appear to address that specific question.",
    "That information doesn't seem to be covered in the document.",
];

const YES_INDICATORS: &[&str] = &["yes", "correct", "true", "right", "indeed", "agree", "confirm"];
const NO_INDICATORS: &[&str] = &["no", "incorrect", "false", "wrong", "disagree", "deny", "refute"];

/// Entities mentioned in a fallback answer
const FALLBACK_ENTITY_LIMIT: usize = 3;

/// Sentences kept per single-entity comparison group
const COMPARISON_GROUP_LIMIT: usize = 2;

struct FormatPatterns {
    step_cue: Regex,
    list_separator: Regex,
}

fn format_patterns() -> &'static FormatPatterns {
    static PATTERNS: OnceLock<FormatPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| FormatPatterns {
        step_cue: Regex::new(r"(first|second|third|next|then|finally|lastly)").expect("valid pattern"),
        list_separator: Regex::new(r",\s+|\sand\s+|;\s+").expect("valid pattern"),
    })
}

fn plain_response(sentences: &[String]) -> String {
    format!("Based on the document: {}", sentences.join(" "))
}

/// Pick a template with the injected RNG
pub fn choose_template<R: Rng + ?Sized>(templates: &[&'static str], rng: &mut R) -> &'static str {
    templates.choose(rng).copied().unwrap_or_default()
}

/// Templates end with their own period, so one trailing period is dropped
pub fn render_definition<R: Rng + ?Sized>(term: &str, definition: &str, rng: &mut R) -> String {
    let definition = definition.trim_end();
    let definition = definition.strip_suffix('.').unwrap_or(definition);
    choose_template(DEFINITION_TEMPLATES, rng)
        .replace("{term}", term)
        .replace("{definition}", definition)
}

pub fn render_explanation<R: Rng + ?Sized>(explanation: &str, rng: &mut R) -> String {
    choose_template(EXPLANATION_TEMPLATES, rng).replace("{explanation}", explanation)
}

pub fn not_found_response<R: Rng + ?Sized>(rng: &mut R) -> String {
    choose_template(NOT_FOUND_TEMPLATES, rng).to_string()
}

/// Answer used when there is no document context at all
pub fn fallback_response(entities: &[String]) -> String {
    if entities.is_empty() {
        return "I don't have enough information in the document to answer this question. \
                Could you rephrase or ask about a different topic?"
            .to_string();
    }

    let entity_list = entities
        .iter()
        .take(FALLBACK_ENTITY_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "I couldn't find specific information about {} in the document. \
         Consider asking about a different topic or rephrasing your question.",
        entity_list
    )
}

/// Route ranked sentences to the formatter for `intent`
pub fn generate_coherent_response<R: Rng + ?Sized>(
    intent: QueryIntent,
    entities: &[String],
    sentences: &[String],
    rng: &mut R,
) -> String {
    if sentences.is_empty() {
        return not_found_response(rng);
    }

    match intent {
        QueryIntent::How => format_steps_response(sentences),
        QueryIntent::Comparison => format_comparison_response(sentences, entities),
        QueryIntent::List => format_list_response(sentences),
        QueryIntent::YesNo => format_yes_no_response(sentences),
        _ => format_general_response(sentences),
    }
}

pub fn format_steps_response(sentences: &[String]) -> String {
    let step_cue = &format_patterns().step_cue;
    let steps: Vec<&String> = sentences
        .iter()
        .filter(|s| step_cue.is_match(&s.to_lowercase()))
        .collect();

    if steps.len() < 2 {
        return plain_response(sentences);
    }

    let mut response = String::from("Here are the steps based on the document:\n\n");
    for (i, sentence) in steps.iter().enumerate() {
        response.push_str(&format!("{}. {}\n", i + 1, sentence));
    }
    response
}

pub fn format_comparison_response(sentences: &[String], entities: &[String]) -> String {
    let (first, second) = match entities {
        [first, second, ..] => (first, second),
        _ => return plain_response(sentences),
    };

    let first_lower = first.to_lowercase();
    let second_lower = second.to_lowercase();

    let mut both = Vec::new();
    let mut first_only = Vec::new();
    let mut second_only = Vec::new();
    for sentence in sentences {
        let lowered = sentence.to_lowercase();
        match (lowered.contains(&first_lower), lowered.contains(&second_lower)) {
            (true, true) => both.push(sentence),
            (true, false) => first_only.push(sentence),
            (false, true) => second_only.push(sentence),
            (false, false) => {}
        }
    }

    let mut response = format!(
        "When comparing {} and {}, the document indicates:\n\n",
        first, second
    );

    if !both.is_empty() {
        response.push_str("Common points:\n");
        for sentence in &both {
            response.push_str(&format!("- {}\n", sentence));
        }
    }

    for (entity, group) in [(first, &first_only), (second, &second_only)] {
        if group.is_empty() {
            continue;
        }
        response.push_str(&format!("\nRegarding {}:\n", entity));
        for sentence in group.iter().take(COMPARISON_GROUP_LIMIT) {
            response.push_str(&format!("- {}\n", sentence));
        }
    }

    response
}

pub fn format_list_response(sentences: &[String]) -> String {
    let separator = &format_patterns().list_separator;
    let mut items = Vec::new();

    for sentence in sentences {
        let parts: Vec<&str> = separator.split(sentence).collect();
        if parts.len() < 2 {
            continue;
        }
        items.extend(
            parts
                .into_iter()
                .map(|part| {
                    let part = part.trim();
                    part.strip_prefix("and ").unwrap_or(part).trim()
                })
                .filter(|part| !part.is_empty())
                .map(String::from),
        );
    }

    if items.is_empty() {
        return plain_response(sentences);
    }

    let mut response = String::from("The document mentions the following items:\n\n");
    for item in &items {
        response.push_str(&format!("- {}\n", item));
    }
    response
}

pub fn format_yes_no_response(sentences: &[String]) -> String {
    let Some(lead) = sentences.first() else {
        return String::from("Based on the document: ");
    };

    let mut yes_count = 0;
    let mut no_count = 0;
    for sentence in sentences {
        let lowered = sentence.to_lowercase();
        let words: HashSet<&str> = lowered.unicode_words().collect();
        yes_count += YES_INDICATORS.iter().filter(|w| words.contains(*w)).count();
        no_count += NO_INDICATORS.iter().filter(|w| words.contains(*w)).count();
    }

    if yes_count > no_count {
        format!("Yes. According to the document: {}", lead)
    } else if no_count > yes_count {
        format!("No. According to the document: {}", lead)
    } else {
        format!("Based on the document: {}", lead)
    }
}

pub fn format_general_response(sentences: &[String]) -> String {
    if let [only] = sentences {
        return format!("According to the document: {}", only);
    }

    let mut response = String::from("Based on the document:\n\n");
    for sentence in sentences {
        response.push_str(&format!("- {}\n", sentence));
    }
    response
}
