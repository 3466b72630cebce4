use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{tokenize, Doc, DomainError, Entity, EntityLabel, Token};
use crate::ports::NlpModel;

/// Embedded date lexicon, installed into the data directory on first use.
const BUNDLED_LEXICON: &str = include_str!("../../resources/date_lexicon.json");

/// Vocabulary used to recognize DATE spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateLexicon {
    pub version: u32,
    /// Words that make a span a date ("tomorrow", "friday", "week").
    pub anchors: Vec<String>,
    /// Words allowed inside a date span ("next", "end", "of", numbers).
    pub qualifiers: Vec<String>,
    /// Qualifiers trimmed from span edges ("the", "of").
    pub connectors: Vec<String>,
}

/// Lexicon-driven tokenizer and DATE entity recognizer.
pub struct LexiconNlpModel {
    anchors: HashSet<String>,
    qualifiers: HashSet<String>,
    connectors: HashSet<String>,
    max_length: usize,
    version: u32,
}

impl LexiconNlpModel {
    /// Load the lexicon from a JSON file.
    pub fn from_file(path: &Path, max_length: usize) -> Result<Self, DomainError> {
        if !path.exists() {
            return Err(DomainError::ModelNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        debug!(path = ?path, "Loading date lexicon");
        let content = fs::read_to_string(path)?;
        Self::from_json(&content, max_length)
    }

    /// Build from the lexicon compiled into the binary.
    pub fn bundled(max_length: usize) -> Result<Self, DomainError> {
        Self::from_json(BUNDLED_LEXICON, max_length)
    }

    pub fn from_json(json: &str, max_length: usize) -> Result<Self, DomainError> {
        let lexicon: DateLexicon = serde_json::from_str(json)?;
        if lexicon.anchors.is_empty() {
            return Err(DomainError::Config(
                "Date lexicon has no anchor words".to_string(),
            ));
        }

        let lower = |words: Vec<String>| -> HashSet<String> {
            words.into_iter().map(|w| w.to_lowercase()).collect()
        };

        Ok(Self {
            anchors: lower(lexicon.anchors),
            qualifiers: lower(lexicon.qualifiers),
            connectors: lower(lexicon.connectors),
            max_length,
            version: lexicon.version,
        })
    }

    /// Write the bundled lexicon to `path`, creating parent directories.
    pub fn install_bundled(path: &Path) -> Result<(), DomainError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, BUNDLED_LEXICON)?;
        info!(path = ?path, "Installed bundled date lexicon");
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn is_numeric(word: &str) -> bool {
        let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        matches!(&word[digits.len()..], "" | "st" | "nd" | "rd" | "th")
    }

    fn is_date_word(&self, word: &str) -> bool {
        self.anchors.contains(word) || self.qualifiers.contains(word) || Self::is_numeric(word)
    }

    /// Group runs of date words (separated only by whitespace) into spans
    /// containing at least one anchor.
    fn extract_dates(&self, text: &str, tokens: &[Token]) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            if !self.is_date_word(&tokens[i].text) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < tokens.len()
                && self.is_date_word(&tokens[j].text)
                && text[tokens[j - 1].end..tokens[j].start].trim().is_empty()
            {
                j += 1;
            }

            let mut span = &tokens[i..j];
            while let Some((first, rest)) = span.split_first() {
                if !self.connectors.contains(&first.text) {
                    break;
                }
                span = rest;
            }
            while let Some((last, rest)) = span.split_last() {
                if !self.connectors.contains(&last.text) {
                    break;
                }
                span = rest;
            }

            if span.iter().any(|t| self.anchors.contains(&t.text)) {
                if let (Some(first), Some(last)) = (span.first(), span.last()) {
                    entities.push(Entity {
                        text: text[first.start..last.end].to_string(),
                        label: EntityLabel::Date,
                        start: first.start,
                        end: last.end,
                    });
                }
            }

            i = j;
        }

        entities
    }
}

impl NlpModel for LexiconNlpModel {
    fn name(&self) -> &str {
        "date-lexicon"
    }

    fn analyze(&self, text: &str) -> Result<Doc, DomainError> {
        let length = text.chars().count();
        if length > self.max_length {
            return Err(DomainError::Inference(format!(
                "Text of length {} exceeds maximum of {}",
                length, self.max_length
            )));
        }

        let lowered = text.to_lowercase();
        let tokens = tokenize(&lowered);
        let entities = self.extract_dates(&lowered, &tokens);

        Ok(Doc {
            text: lowered,
            tokens,
            entities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LexiconNlpModel {
        LexiconNlpModel::bundled(1_000).unwrap()
    }

    fn date_texts(text: &str) -> Vec<String> {
        model()
            .analyze(text)
            .unwrap()
            .entities
            .into_iter()
            .map(|e| e.text)
            .collect()
    }

    #[test]
    fn test_bundled_lexicon_parses() {
        let model = model();
        assert!(model.version() >= 1);
        assert!(model.anchors.contains("tomorrow"));
    }

    #[test]
    fn test_extracts_date_spans() {
        assert_eq!(date_texts("See you the next day"), vec!["next day"]);
        assert_eq!(date_texts("Dentist on Friday morning"), vec!["friday morning"]);
        assert_eq!(date_texts("due by the end of the month"), vec!["end of the month"]);
        assert_eq!(date_texts("Pay in 5 days"), vec!["5 days"]);
    }

    #[test]
    fn test_punctuation_splits_spans() {
        assert_eq!(date_texts("tomorrow, next week"), vec!["tomorrow", "next week"]);
    }

    #[test]
    fn test_spans_without_anchor_are_dropped() {
        assert!(date_texts("the next one").is_empty());
        assert!(date_texts("buy 12 eggs").is_empty());
    }

    #[test]
    fn test_numeric_words() {
        assert!(LexiconNlpModel::is_numeric("12"));
        assert!(LexiconNlpModel::is_numeric("4th"));
        assert!(!LexiconNlpModel::is_numeric("4x"));
        assert!(!LexiconNlpModel::is_numeric("th"));
    }

    #[test]
    fn test_text_longer_than_max_is_rejected() {
        let model = LexiconNlpModel::bundled(5).unwrap();
        let err = model.analyze("far too long").unwrap_err();
        assert!(matches!(err, DomainError::Inference(_)));
    }

    #[test]
    fn test_missing_file_and_install() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nlp").join("date_lexicon.json");

        assert!(matches!(
            LexiconNlpModel::from_file(&path, 1_000),
            Err(DomainError::ModelNotFound(_))
        ));

        LexiconNlpModel::install_bundled(&path).unwrap();
        let model = LexiconNlpModel::from_file(&path, 1_000).unwrap();
        assert!(model.anchors.contains("monday"));
    }

    #[test]
    fn test_empty_anchor_list_is_rejected() {
        let json = r#"{"version": 1, "anchors": [], "qualifiers": [], "connectors": []}"#;
        assert!(LexiconNlpModel::from_json(json, 10).is_err());
    }
}
