//! # Sentiment Scorer
//!
//! Sentiment classification is a pluggable capability behind
//! [`SentimentScorer`]. The model is loaded once by the caller and shared by
//! reference across documents (and threads); scoring never mutates it.
//!
//! [`LexiconModel`] is the bundled implementation: a word-weight lexicon whose
//! summed polarity is mapped onto the `0..=255` score range, `128` being
//! neutral.

use std::collections::HashMap;
use std::path::Path;

use crate::nlp::error::ModelLoadError;

/// The neutral score of the `0..=255` range.
pub const NEUTRAL_SCORE: u8 = 128;

/// Scores the polarity of one block of plain text.
pub trait SentimentScorer: Send + Sync {
    /// Returns a bounded score, low is negative and high is positive.
    fn score(&self, text: &str) -> u8;
}

/// # Lexicon Model
///
/// Each lowercase word carries a signed weight; a paragraph's polarity is the
/// sum of the weights of its words. A negator (`not`, `never`, ...) flips
/// the sign of the next weighted word.
#[derive(Debug, Clone)]
pub struct LexiconModel {
    weights: HashMap<String, i32>,
    scale: i32,
}

const NEGATORS: &[&str] = &["not", "no", "never", "without", "hardly"];

const DEFAULT_LEXICON: &[(&str, i32)] = &[
    ("good", 2),
    ("great", 3),
    ("excellent", 3),
    ("strong", 2),
    ("gain", 2),
    ("gains", 2),
    ("growth", 2),
    ("rally", 2),
    ("surge", 2),
    ("record", 1),
    ("happy", 2),
    ("win", 2),
    ("success", 2),
    ("improve", 1),
    ("improved", 1),
    ("positive", 2),
    ("bad", -2),
    ("poor", -2),
    ("terrible", -3),
    ("weak", -2),
    ("loss", -2),
    ("losses", -2),
    ("decline", -2),
    ("crash", -3),
    ("fear", -2),
    ("crisis", -3),
    ("fail", -2),
    ("failed", -2),
    ("negative", -2),
    ("sad", -2),
    ("risk", -1),
];

impl LexiconModel {
    /// Builds a model from `(word, weight)` pairs. Words are lowercased.
    /// `scale` is how many score points one unit of weight moves.
    pub fn new<I, K>(weights: I, scale: i32) -> Self
    where
        I: IntoIterator<Item = (K, i32)>,
        K: AsRef<str>,
    {
        Self {
            weights: weights
                .into_iter()
                .map(|(w, v)| (w.as_ref().to_lowercase(), v))
                .collect(),
            scale,
        }
    }

    /// A small general-purpose English lexicon.
    pub fn default_english() -> Self {
        Self::new(DEFAULT_LEXICON.iter().copied(), 16)
    }

    /// Restores a lexicon from a JSON object of `"word": weight`.
    pub fn restore(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path)?;
        let weights: HashMap<String, i32> = serde_json::from_str(&raw)?;
        if weights.is_empty() {
            return Err(ModelLoadError::Empty(path.display().to_string()));
        }
        log::info!("Restored sentiment lexicon with {} words from {}", weights.len(), path.display());
        Ok(Self::new(weights, 16))
    }

    /// The signed polarity of `text` before mapping onto the score range.
    /// Saturates instead of overflowing on extreme lexicon weights.
    pub fn polarity(&self, text: &str) -> i64 {
        let mut total: i64 = 0;
        let mut negate = false;
        for word in text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if NEGATORS.contains(&word.as_str()) || word.ends_with("n't") {
                negate = true;
                continue;
            }
            if let Some(weight) = self.weights.get(&word) {
                let weight = i64::from(*weight);
                let signed = if negate { -weight } else { weight };
                total = total.saturating_add(signed);
                negate = false;
            }
        }
        total
    }
}

impl SentimentScorer for LexiconModel {
    fn score(&self, text: &str) -> u8 {
        let shifted = self
            .polarity(text)
            .saturating_mul(i64::from(self.scale))
            .saturating_add(i64::from(NEUTRAL_SCORE));
        shifted.clamp(0, 255) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text_scores_neutral() {
        let model = LexiconModel::default_english();
        assert_eq!(model.score("The meeting is on Tuesday."), NEUTRAL_SCORE);
        assert_eq!(model.score(""), NEUTRAL_SCORE);
    }

    #[test]
    fn test_positive_and_negative_direction() {
        let model = LexiconModel::default_english();
        assert!(model.score("Great gains and strong growth.") > NEUTRAL_SCORE);
        assert!(model.score("A terrible crash and heavy losses.") < NEUTRAL_SCORE);
    }

    #[test]
    fn test_exact_mapping() {
        let model = LexiconModel::new([("up", 1), ("down", -1)], 10);
        assert_eq!(model.score("up up"), 148);
        assert_eq!(model.score("Down"), 118);
    }

    #[test]
    fn test_negation_flips_next_weighted_word() {
        let model = LexiconModel::new([("good", 2)], 10);
        assert_eq!(model.polarity("not very good"), -2);
        assert_eq!(model.polarity("it isn't good"), -2);
        assert_eq!(model.polarity("good"), 2);
    }

    #[test]
    fn test_score_is_clamped() {
        let model = LexiconModel::new([("wow", 50)], 10);
        assert_eq!(model.score("wow wow"), 255);
        assert_eq!(model.score("not wow"), 0);
    }

    #[test]
    fn test_extreme_weights_saturate_without_overflow() {
        let model = LexiconModel::new([("wow", 2_000_000_000), ("ugh", i32::MIN)], i32::MAX);
        assert_eq!(model.score("wow wow wow"), 255);
        assert_eq!(model.score("ugh ugh ugh"), 0);
        assert_eq!(model.score("not ugh"), 255);
        assert_eq!(model.polarity("wow wow"), 4_000_000_000);
    }

    #[test]
    fn test_restore_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, r#"{"Bullish": 2, "bearish": -2}"#).unwrap();

        let model = LexiconModel::restore(&path).unwrap();
        assert_eq!(model.score("bullish"), 160);
        assert_eq!(model.score("bearish"), 96);
    }
}
