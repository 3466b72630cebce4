//! Rule-based priority classification.

use super::nlp::Doc;
use super::task::Priority;

/// Keyword rule: any of the phrases (one or more consecutive tokens) maps to
/// the tier.
struct KeywordRule {
    priority: Priority,
    phrases: &'static [&'static [&'static str]],
}

/// Evaluated top to bottom, first match wins.
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        priority: Priority::High,
        phrases: &[&["urgent"], &["asap"], &["immediately"], &["now"], &["critical"]],
    },
    KeywordRule {
        priority: Priority::Medium,
        phrases: &[&["soon"], &["important"], &["deadline"]],
    },
    KeywordRule {
        priority: Priority::Low,
        phrases: &[&["whenever"], &["later"], &["someday"], &["low", "priority"]],
    },
];

/// Texts with more words than this get Medium when no keyword matched.
const LENGTH_FALLBACK_WORDS: usize = 3;

/// Classify an analyzed task description into exactly one tier.
pub fn classify(doc: &Doc) -> Priority {
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.phrases.iter().any(|phrase| doc.has_phrase(phrase)))
        .map(|rule| rule.priority)
        .unwrap_or_else(|| {
            if doc.word_count() > LENGTH_FALLBACK_WORDS {
                Priority::Medium
            } else {
                Priority::None
            }
        })
}
