//! # Document Parser
//!
//! Drives one document through the pipeline and aggregates the partial
//! results:
//!
//! 1. entity extraction on the title,
//! 2. paragraph splitting of the HTML body,
//! 3. sentiment scoring and entity extraction on every paragraph,
//! 4. merging of all entity maps (title first, then paragraphs in document
//!    order) under the configured [`MergePolicy`],
//! 5. averaging of the paragraph scores.
//!
//! Extraction failures are per block: the block's entities are dropped, the
//! failure is logged and counted, and the last one is returned next to the
//! best-effort result. A bad paragraph never fails the document.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::nlp::document::{Document, EntityMap, ParagraphBlock, ParseResult};
use crate::nlp::entities::EntityExtractor;
use crate::nlp::error::{ExtractionError, ParseError};
use crate::nlp::sentiment::SentimentScorer;
use crate::nlp::splitter::split_paragraphs;

/// How the merge resolves an entity text produced with different labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The label seen last (in processing order) is kept.
    #[default]
    LastWins,
    /// The label seen first is kept; later labels are only reported as conflicts.
    FirstWins,
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-wins" | "last" => Ok(MergePolicy::LastWins),
            "first-wins" | "first" => Ok(MergePolicy::FirstWins),
            other => Err(format!("unknown merge policy '{}'", other)),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::LastWins => write!(f, "last-wins"),
            MergePolicy::FirstWins => write!(f, "first-wins"),
        }
    }
}

/// Tuning knobs of a [`DocumentParser`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Collision policy for entity keys.
    pub merge_policy: MergePolicy,
    /// Analyze paragraphs on the rayon thread pool. Results are merged in
    /// document order either way.
    pub parallel: bool,
}

/// Score and entities of one paragraph, before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphAnalysis {
    /// The analyzed paragraph.
    pub block: ParagraphBlock,
    /// Its sentiment score.
    pub score: u8,
    /// Its entities, or the extractor's failure.
    pub entities: Result<EntityMap, ExtractionError>,
}

/// A best-effort result plus the last block-level error, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// The aggregated result, partial when blocks failed.
    pub result: ParseResult,
    /// The last extraction failure encountered.
    pub error: Option<ParseError>,
}

/// # Document Parser
///
/// Borrows the two analyzers, so one loaded model can serve any number of
/// parsers and threads.
pub struct DocumentParser<'m, E: ?Sized, S: ?Sized> {
    extractor: &'m E,
    scorer: &'m S,
    options: ParserOptions,
}

impl<'m, E, S> DocumentParser<'m, E, S>
where
    E: EntityExtractor + ?Sized,
    S: SentimentScorer + ?Sized,
{
    /// Creates a parser over the given analyzers.
    pub fn new(extractor: &'m E, scorer: &'m S, options: ParserOptions) -> Self {
        Self {
            extractor,
            scorer,
            options,
        }
    }

    /// Extracts the entities of a title (or any standalone string).
    pub fn parse_title(&self, title: &str) -> Result<EntityMap, ExtractionError> {
        self.extractor.extract(title)
    }

    /// Splits `content` and analyzes every paragraph. The returned vector is
    /// in document order regardless of `parallel`.
    pub fn analyze_paragraphs(&self, content: &[u8]) -> Vec<ParagraphAnalysis> {
        let blocks = split_paragraphs(content);
        if self.options.parallel {
            blocks
                .into_par_iter()
                .map(|block| self.analyze(block))
                .collect()
        } else {
            blocks.into_iter().map(|block| self.analyze(block)).collect()
        }
    }

    fn analyze(&self, block: ParagraphBlock) -> ParagraphAnalysis {
        let score = self.scorer.score(&block.text);
        let entities = self.extractor.extract(&block.text);
        ParagraphAnalysis {
            block,
            score,
            entities,
        }
    }

    /// Runs the whole pipeline on one document.
    pub fn parse(&self, document: &Document) -> ParseOutcome {
        let mut merger = EntityMerger::new(self.options.merge_policy);
        let mut error = None;
        let mut failed_blocks = 0;

        match self.parse_title(&document.title) {
            Ok(entities) => merger.absorb(entities),
            Err(e) => {
                log::warn!("Entity extraction failed on title of {}: {}", document.link, e);
                failed_blocks += 1;
                error = Some(ParseError::Title(e));
            }
        }

        let analyses = self.analyze_paragraphs(&document.content);
        let paragraphs = analyses.len();
        let mut total: u64 = 0;

        for analysis in analyses {
            total += u64::from(analysis.score);
            match analysis.entities {
                Ok(entities) => merger.absorb(entities),
                Err(e) => {
                    log::warn!(
                        "Entity extraction failed on paragraph {} of {}: {}",
                        analysis.block.index,
                        document.link,
                        e
                    );
                    failed_blocks += 1;
                    error = Some(ParseError::Paragraph {
                        index: analysis.block.index,
                        source: e,
                    });
                }
            }
        }

        let avg_sentiment = average(total, paragraphs);
        if avg_sentiment.is_none() {
            log::debug!("No paragraphs found in {}; sentiment left unset", document.link);
        }

        let (entities, conflicts) = merger.finish();
        ParseOutcome {
            result: ParseResult {
                entities,
                conflicts,
                avg_sentiment,
                paragraphs,
                failed_blocks,
            },
            error,
        }
    }
}

/// Mean of `count` scores summing to `total`; `None` for zero scores.
fn average(total: u64, count: usize) -> Option<f32> {
    if count == 0 {
        None
    } else {
        Some((total as f64 / count as f64) as f32)
    }
}

/// Accumulates entity maps in processing order.
struct EntityMerger {
    policy: MergePolicy,
    entities: EntityMap,
    labels: BTreeMap<String, Vec<String>>,
}

impl EntityMerger {
    fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            entities: EntityMap::new(),
            labels: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, entities: EntityMap) {
        for (text, label) in entities {
            let seen = self.labels.entry(text.clone()).or_default();
            if !seen.contains(&label) {
                seen.push(label.clone());
            }
            match self.policy {
                MergePolicy::LastWins => {
                    self.entities.insert(text, label);
                }
                MergePolicy::FirstWins => {
                    self.entities.entry(text).or_insert(label);
                }
            }
        }
    }

    fn finish(self) -> (EntityMap, BTreeMap<String, Vec<String>>) {
        let conflicts = self
            .labels
            .into_iter()
            .filter(|(_, labels)| labels.len() > 1)
            .collect();
        (self.entities, conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Tags whole words from a fixed table; fails on any text containing `poison`.
    struct StubExtractor {
        tags: HashMap<&'static str, &'static str>,
    }

    impl StubExtractor {
        fn new(tags: &[(&'static str, &'static str)]) -> Self {
            Self {
                tags: tags.iter().copied().collect(),
            }
        }
    }

    impl EntityExtractor for StubExtractor {
        fn extract(&self, text: &str) -> Result<EntityMap, ExtractionError> {
            if text.contains("poison") {
                return Err(ExtractionError::Model("poisoned block".to_string()));
            }
            Ok(text
                .split(|c: char| !c.is_alphanumeric())
                .filter_map(|w| self.tags.get(w).map(|l| (w.to_string(), l.to_string())))
                .collect())
        }
    }

    /// Scores a paragraph by the first number it contains, 0 if none.
    struct StubScorer;

    impl SentimentScorer for StubScorer {
        fn score(&self, text: &str) -> u8 {
            text.split(|c: char| !c.is_ascii_digit())
                .find_map(|n| n.parse().ok())
                .unwrap_or(0)
        }
    }

    fn people_and_places() -> StubExtractor {
        StubExtractor::new(&[("Alice", "PERSON"), ("Paris", "LOCATION"), ("Bob", "PERSON")])
    }

    fn parse(doc: &Document, extractor: &StubExtractor, options: ParserOptions) -> ParseOutcome {
        DocumentParser::new(extractor, &StubScorer, options).parse(doc)
    }

    #[test]
    fn test_title_and_paragraph_entities_are_merged() {
        let doc = Document::from_html("Alice went to Paris", "<p>Bob met Alice in Paris.</p>");
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());

        let ents = &outcome.result.entities;
        assert_eq!(ents.len(), 3);
        assert_eq!(ents["Alice"], "PERSON");
        assert_eq!(ents["Paris"], "LOCATION");
        assert_eq!(ents["Bob"], "PERSON");
        assert!(outcome.result.conflicts.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_average_of_two_paragraphs() {
        let doc = Document::from_html("", "<p>score 100</p><p>score 200</p>");
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());
        assert_eq!(outcome.result.avg_sentiment, Some(150.0));
        assert_eq!(outcome.result.paragraphs, 2);
    }

    #[test]
    fn test_empty_paragraph_counts_toward_average() {
        let doc = Document::from_html("t", "<p></p><p>score 100</p>");
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());
        assert_eq!(outcome.result.paragraphs, 2);
        assert_eq!(outcome.result.avg_sentiment, Some(50.0));
    }

    #[test]
    fn test_average_equals_arithmetic_mean() {
        let scores = [3u8, 250, 17, 99, 0, 128];
        let html: String = scores.iter().map(|s| format!("<p>s {}</p>", s)).collect();
        let doc = Document::from_html("", html);
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());

        let mean = scores.iter().map(|&s| f32::from(s)).sum::<f32>() / scores.len() as f32;
        let avg = outcome.result.avg_sentiment.unwrap();
        assert!((avg - mean).abs() < 1e-4, "{} != {}", avg, mean);
    }

    #[test]
    fn test_zero_paragraphs_leaves_sentiment_unset() {
        let doc = Document::from_html("Alice", "<div>no paragraphs here</div>");
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());
        assert_eq!(outcome.result.avg_sentiment, None);
        assert_eq!(outcome.result.paragraphs, 0);
        assert_eq!(outcome.result.entities["Alice"], "PERSON");
    }

    #[test]
    fn test_failing_paragraph_keeps_other_entities() {
        let doc = Document::from_html(
            "Headline",
            "<p>Alice 10</p><p>poison Bob 20</p><p>Paris 30</p>",
        );
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());

        let ents = &outcome.result.entities;
        assert_eq!(ents.len(), 2);
        assert!(ents.contains_key("Alice"));
        assert!(ents.contains_key("Paris"));
        assert!(!ents.contains_key("Bob"));
        // Scores are collected even for the failed paragraph.
        assert_eq!(outcome.result.avg_sentiment, Some(20.0));
        assert_eq!(outcome.result.failed_blocks, 1);
        assert!(matches!(outcome.error, Some(ParseError::Paragraph { index: 1, .. })));
    }

    #[test]
    fn test_failing_title_is_not_fatal() {
        let doc = Document::from_html("poison title", "<p>Bob 5</p>");
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());
        assert_eq!(outcome.result.entities.len(), 1);
        assert!(matches!(outcome.error, Some(ParseError::Title(_))));
    }

    #[test]
    fn test_last_error_is_reported() {
        let doc = Document::from_html("poison", "<p>poison one</p><p>fine</p><p>poison two</p>");
        let outcome = parse(&doc, &people_and_places(), ParserOptions::default());
        assert_eq!(outcome.result.failed_blocks, 3);
        assert!(matches!(outcome.error, Some(ParseError::Paragraph { index: 2, .. })));
    }

    #[test]
    fn test_last_wins_and_first_wins() {
        let ext = StubExtractor::new(&[("Jordan", "PERSON")]);
        let relabel = StubExtractor::new(&[("Jordan", "GPE")]);

        // Title labels Jordan one way, paragraphs the other.
        struct Split<'a>(&'a StubExtractor, &'a StubExtractor);
        impl EntityExtractor for Split<'_> {
            fn extract(&self, text: &str) -> Result<EntityMap, ExtractionError> {
                if text.starts_with("Title") {
                    self.0.extract(text)
                } else {
                    self.1.extract(text)
                }
            }
        }
        let split = Split(&ext, &relabel);
        let doc = Document::from_html("Title Jordan", "<p>Jordan 1</p>");

        let last = DocumentParser::new(&split, &StubScorer, ParserOptions::default()).parse(&doc);
        assert_eq!(last.result.entities["Jordan"], "GPE");

        let first_opts = ParserOptions {
            merge_policy: MergePolicy::FirstWins,
            ..Default::default()
        };
        let first = DocumentParser::new(&split, &StubScorer, first_opts).parse(&doc);
        assert_eq!(first.result.entities["Jordan"], "PERSON");

        let expected = vec!["PERSON".to_string(), "GPE".to_string()];
        assert_eq!(last.result.conflicts["Jordan"], expected);
        assert_eq!(first.result.conflicts["Jordan"], expected);
    }

    #[test]
    fn test_reparsing_yields_identical_keys() {
        let doc = Document::from_html(
            "Alice went to Paris",
            "<p>Bob 1</p><p>Alice 2</p><p>Paris and Bob 3</p>",
        );
        let ext = people_and_places();
        let a = parse(&doc, &ext, ParserOptions::default());
        let b = parse(&doc, &ext, ParserOptions::default());
        let keys_a: Vec<_> = a.result.entities.keys().collect();
        let keys_b: Vec<_> = b.result.entities.keys().collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_parallel_matches_sequential_and_keeps_order() {
        let html: String = (0..64)
            .map(|i| {
                if i % 7 == 0 {
                    format!("<p>Bob {}</p>", i)
                } else {
                    format!("<p>Alice {}</p>", i)
                }
            })
            .collect();
        let doc = Document::from_html("Paris", html);
        let ext = people_and_places();

        let sequential = DocumentParser::new(&ext, &StubScorer, ParserOptions::default());
        let parallel = DocumentParser::new(
            &ext,
            &StubScorer,
            ParserOptions {
                parallel: true,
                ..Default::default()
            },
        );

        let order: Vec<usize> = parallel
            .analyze_paragraphs(&doc.content)
            .iter()
            .map(|a| a.block.index)
            .collect();
        assert_eq!(order, (0..64usize).collect::<Vec<_>>());
        assert_eq!(sequential.parse(&doc), parallel.parse(&doc));
    }

    #[test]
    fn test_works_with_trait_objects() {
        let ext = people_and_places();
        let dyn_ext: &dyn EntityExtractor = &ext;
        let dyn_scorer: &dyn SentimentScorer = &StubScorer;
        let parser = DocumentParser::new(dyn_ext, dyn_scorer, ParserOptions::default());
        let outcome = parser.parse(&Document::from_html("Bob", "<p>7</p>"));
        assert_eq!(outcome.result.avg_sentiment, Some(7.0));
    }

    #[test]
    fn test_merge_policy_parsing() {
        assert_eq!("last-wins".parse::<MergePolicy>(), Ok(MergePolicy::LastWins));
        assert_eq!("First".parse::<MergePolicy>(), Ok(MergePolicy::FirstWins));
        assert!("collect".parse::<MergePolicy>().is_err());
        assert_eq!(MergePolicy::FirstWins.to_string(), "first-wins");
    }
}
