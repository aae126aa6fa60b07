//! # Entity Extractor
//!
//! Named-entity recognition is a pluggable capability: anything that
//! implements [`EntityExtractor`] can be handed to the parser. A statistical
//! model can sit behind the trait; the crate ships [`GazetteerExtractor`], a
//! deterministic dictionary matcher with an optional proper-noun fallback.

use std::collections::HashMap;
use std::path::Path;

use crate::nlp::document::EntityMap;
use crate::nlp::error::{ExtractionError, ModelLoadError};

/// Default cap on the characters accepted by [`GazetteerExtractor`].
pub const DEFAULT_MAX_INPUT_CHARS: usize = 100_000;

/// Recognizes entities in one block of plain text.
///
/// Implementations must be stateless across calls so that paragraphs can be
/// processed in any order, or concurrently.
pub trait EntityExtractor: Send + Sync {
    /// Returns every recognized entity span mapped to its type label.
    fn extract(&self, text: &str) -> Result<EntityMap, ExtractionError>;
}

/// One word of the input with its byte span.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    word: &'a str,
    start: usize,
    end: usize,
}

/// A gazetteer entry, stored under its first word.
#[derive(Debug, Clone)]
struct Entry {
    words: Vec<String>,
    label: String,
}

/// # Gazetteer Extractor
///
/// Tags known surface forms (`"New York" -> "GPE"`) on word boundaries,
/// preferring the longest entry that matches at a position. Matching is
/// case-sensitive. When `fallback_label` is set, runs of capitalized words
/// that matched nothing are tagged with it, except for a sentence-initial
/// word, which is capitalized anyway.
#[derive(Debug, Clone)]
pub struct GazetteerExtractor {
    entries: HashMap<String, Vec<Entry>>,
    fallback_label: Option<String>,
    max_input_chars: usize,
}

impl GazetteerExtractor {
    /// Builds an extractor from `(surface form, label)` pairs.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut index: HashMap<String, Vec<Entry>> = HashMap::new();
        for (surface, label) in entries {
            let words: Vec<String> = tokenize(surface.as_ref())
                .into_iter()
                .map(|t| t.word.to_string())
                .collect();
            let Some(first) = words.first().cloned() else {
                continue;
            };
            index.entry(first).or_default().push(Entry {
                words,
                label: label.into(),
            });
        }
        for candidates in index.values_mut() {
            candidates.sort_by(|a, b| b.words.len().cmp(&a.words.len()));
        }

        Self {
            entries: index,
            fallback_label: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Loads a gazetteer from a JSON object of `"surface form": "LABEL"`.
    pub fn from_json_file(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path)?;
        let map: HashMap<String, String> = serde_json::from_str(&raw)?;
        if map.is_empty() {
            return Err(ModelLoadError::Empty(path.display().to_string()));
        }
        log::info!("Loaded gazetteer with {} entries from {}", map.len(), path.display());
        Ok(Self::new(map))
    }

    /// Tags unmatched capitalized word runs with `label`.
    pub fn with_fallback_label(mut self, label: impl Into<String>) -> Self {
        self.fallback_label = Some(label.into());
        self
    }

    /// Overrides the input length limit.
    pub fn with_max_input_chars(mut self, limit: usize) -> Self {
        self.max_input_chars = limit;
        self
    }

    /// Longest entry matching at `tokens[pos..]`, as (word count, label).
    fn longest_match(&self, tokens: &[Token<'_>], pos: usize) -> Option<(usize, &str)> {
        let candidates = self.entries.get(tokens[pos].word)?;
        candidates
            .iter()
            .find(|entry| {
                entry.words.len() <= tokens.len() - pos
                    && entry
                        .words
                        .iter()
                        .zip(&tokens[pos..])
                        .all(|(w, t)| w == t.word)
            })
            .map(|entry| (entry.words.len(), entry.label.as_str()))
    }

    fn validate(&self, text: &str) -> Result<(), ExtractionError> {
        if let Some(pos) = text.find('\0') {
            return Err(ExtractionError::NulCharacter(pos));
        }
        let len = text.chars().count();
        if len > self.max_input_chars {
            return Err(ExtractionError::TooLong {
                len,
                limit: self.max_input_chars,
            });
        }
        Ok(())
    }
}

impl EntityExtractor for GazetteerExtractor {
    fn extract(&self, text: &str) -> Result<EntityMap, ExtractionError> {
        self.validate(text)?;

        let tokens = tokenize(text);
        let mut entities = EntityMap::new();
        // Start of the pending capitalized run, for the fallback label.
        let mut run: Option<usize> = None;
        let mut pos = 0;

        while pos < tokens.len() {
            if let Some((len, label)) = self.longest_match(&tokens, pos) {
                self.flush_run(text, &tokens, run.take(), pos, &mut entities);
                let span = &text[tokens[pos].start..tokens[pos + len - 1].end];
                entities.insert(span.to_string(), label.to_string());
                pos += len;
                continue;
            }

            let token = tokens[pos];
            let capitalized = token.word.chars().next().is_some_and(char::is_uppercase);
            if capitalized && !starts_sentence(text, token.start) {
                run.get_or_insert(pos);
            } else {
                self.flush_run(text, &tokens, run.take(), pos, &mut entities);
            }
            pos += 1;
        }
        self.flush_run(text, &tokens, run.take(), tokens.len(), &mut entities);

        Ok(entities)
    }
}

impl GazetteerExtractor {
    fn flush_run(
        &self,
        text: &str,
        tokens: &[Token<'_>],
        run_start: Option<usize>,
        run_end: usize,
        entities: &mut EntityMap,
    ) {
        let (Some(label), Some(start)) = (&self.fallback_label, run_start) else {
            return;
        };
        if start >= run_end {
            return;
        }
        let span = &text[tokens[start].start..tokens[run_end - 1].end];
        entities
            .entry(span.to_string())
            .or_insert_with(|| label.clone());
    }
}

/// Splits text into words: maximal runs of alphanumerics, allowing inner
/// hyphens. Apostrophes split, so `Alice's` yields `Alice` and `s`.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        let inner_hyphen = ch == '-' && start.is_some();
        if ch.is_alphanumeric() || inner_hyphen {
            start.get_or_insert(idx);
        } else if let Some(s) = start.take() {
            push_token(text, s, idx, &mut tokens);
        }
    }
    if let Some(s) = start {
        push_token(text, s, text.len(), &mut tokens);
    }
    tokens
}

fn push_token<'a>(text: &'a str, start: usize, end: usize, tokens: &mut Vec<Token<'a>>) {
    let word = text[start..end].trim_end_matches('-');
    if !word.is_empty() {
        tokens.push(Token {
            word,
            start,
            end: start + word.len(),
        });
    }
}

/// True when the word at byte `start` opens the text or follows `.`, `!`, `?`.
fn starts_sentence(text: &str, start: usize) -> bool {
    match text[..start].trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> GazetteerExtractor {
        GazetteerExtractor::new([
            ("Alice", "PERSON"),
            ("Bob", "PERSON"),
            ("Paris", "GPE"),
            ("New York", "GPE"),
            ("New York Times", "ORG"),
        ])
    }

    #[test]
    fn test_known_entities_are_tagged() {
        let ents = extractor().extract("Bob met Alice in Paris.").unwrap();
        assert_eq!(ents.len(), 3);
        assert_eq!(ents["Bob"], "PERSON");
        assert_eq!(ents["Alice"], "PERSON");
        assert_eq!(ents["Paris"], "GPE");
    }

    #[test]
    fn test_longest_match_wins() {
        let ents = extractor()
            .extract("She wrote for the New York Times from New York.")
            .unwrap();
        assert_eq!(ents["New York Times"], "ORG");
        assert_eq!(ents["New York"], "GPE");
    }

    #[test]
    fn test_possessive_still_matches() {
        let ents = extractor().extract("It was Alice's idea.").unwrap();
        assert_eq!(ents.get("Alice").map(String::as_str), Some("PERSON"));
    }

    #[test]
    fn test_matching_respects_word_boundaries() {
        let ents = extractor().extract("Parisian cafes and Bobby").unwrap();
        assert!(ents.is_empty());
    }

    #[test]
    fn test_fallback_label_skips_sentence_start() {
        let ext = GazetteerExtractor::new([("Paris", "GPE")]).with_fallback_label("MISC");
        let ents = ext
            .extract("Yesterday Grace Hopper visited Paris. Then she left.")
            .unwrap();
        assert_eq!(ents["Grace Hopper"], "MISC");
        assert_eq!(ents["Paris"], "GPE");
        assert!(!ents.contains_key("Yesterday"));
        assert!(!ents.contains_key("Then"));
    }

    #[test]
    fn test_no_fallback_by_default() {
        let ents = extractor().extract("Yesterday Grace Hopper spoke.").unwrap();
        assert!(ents.is_empty());
    }

    #[test]
    fn test_nul_character_is_rejected() {
        let err = extractor().extract("Alice\0Bob").unwrap_err();
        assert_eq!(err, ExtractionError::NulCharacter(5));
    }

    #[test]
    fn test_too_long_is_rejected() {
        let ext = extractor().with_max_input_chars(5);
        assert!(matches!(
            ext.extract("Alice and Bob"),
            Err(ExtractionError::TooLong { len: 13, limit: 5 })
        ));
    }

    #[test]
    fn test_load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gazetteer.json");
        std::fs::write(&path, r#"{"Berlin": "GPE", "Ada Lovelace": "PERSON"}"#).unwrap();

        let ext = GazetteerExtractor::from_json_file(&path).unwrap();
        let ents = ext.extract("Ada Lovelace never saw Berlin.").unwrap();
        assert_eq!(ents["Ada Lovelace"], "PERSON");
        assert_eq!(ents["Berlin"], "GPE");
    }

    #[test]
    fn test_empty_json_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            GazetteerExtractor::from_json_file(&path),
            Err(ModelLoadError::Empty(_))
        ));
    }
}
