use serde::{Deserialize, Serialize};

/// A word token with byte offsets into [`Doc::text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Date,
}

/// A labelled span of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

/// Analyzed task text. Everything is lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<Entity>,
}

impl Doc {
    /// Lowercase and tokenize `text`, without entity extraction.
    pub fn tokenized(text: &str) -> Self {
        let text = text.to_lowercase();
        let tokens = tokenize(&text);
        Self {
            text,
            tokens,
            entities: Vec::new(),
        }
    }

    pub fn has_token(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t.text == word)
    }

    /// Whether the words appear as consecutive tokens.
    pub fn has_phrase(&self, words: &[&str]) -> bool {
        if words.is_empty() || words.len() > self.tokens.len() {
            return false;
        }
        self.tokens
            .windows(words.len())
            .any(|window| window.iter().zip(words).all(|(t, w)| t.text == *w))
    }

    /// Number of whitespace-separated words in the text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn dates(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.label == EntityLabel::Date)
    }
}

/// Split text into word tokens: runs of alphanumeric characters, with
/// apostrophes allowed between letters ("don't"). Punctuation is dropped.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, &(pos, ch)) in chars.iter().enumerate() {
        let inner_apostrophe = ch == '\''
            && start.is_some()
            && chars
                .get(idx + 1)
                .map_or(false, |&(_, next)| next.is_alphanumeric());
        let is_word = ch.is_alphanumeric() || inner_apostrophe;

        match (is_word, start) {
            (true, None) => start = Some(pos),
            (false, Some(s)) => {
                tokens.push(Token {
                    text: text[s..pos].to_string(),
                    start: s,
                    end: pos,
                });
                start = None;
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        tokens.push(Token {
            text: text[s..].to_string(),
            start: s,
            end: text.len(),
        });
    }

    tokens
}
