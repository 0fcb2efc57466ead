// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Metric implementations
//!
//! Every metric here implements [`jebi::Metric`], so it can drive
//! `BootstrapFewShot` directly. [`DetailedMetric`] adds a pass flag and
//! optional details for reports.

use jebi::types::value_text;
use jebi::{Example, Metric, Prediction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of a metric evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Score (typically 0.0 to 1.0 or boolean 0/1)
    pub score: f64,

    /// Whether the prediction passed
    pub passed: bool,

    /// Optional details
    pub details: Option<String>,
}

impl MetricResult {
    /// Create a new metric result
    pub fn new(score: f64) -> Self {
        Self {
            score,
            passed: jebi::metric::is_passing(score),
            details: None,
        }
    }

    /// Create a passed result
    pub fn pass() -> Self {
        Self::new(1.0)
    }

    /// Create a failed result
    pub fn fail() -> Self {
        Self::new(0.0)
    }

    /// Add details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A metric that can explain its score.
pub trait DetailedMetric: Metric {
    /// Evaluate a prediction against an example
    fn evaluate(&self, example: &Example, prediction: &Prediction) -> MetricResult {
        MetricResult::new(self.score(example, prediction))
    }
}

/// Text of `field` on both sides, when both have it.
fn field_pair(example: &Example, prediction: &Prediction, field: &str) -> Option<(String, String)> {
    let expected = example.get(field)?;
    let actual = prediction.get(field)?;
    Some((value_text(expected), value_text(actual)))
}

fn mean(scores: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = scores.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn default_fields() -> Vec<String> {
    vec!["answer".to_string()]
}

/// Exact match metric.
///
/// Passes when every compared field is present in the prediction with the
/// same text, after trimming and, by default, ignoring case.
#[derive(Debug, Clone)]
pub struct ExactMatch {
    fields: Vec<String>,
    ignore_case: bool,
}

impl Default for ExactMatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ExactMatch {
    /// Compare the `answer` field.
    pub fn new() -> Self {
        Self {
            fields: default_fields(),
            ignore_case: true,
        }
    }

    /// Compare these fields instead.
    pub fn on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Compare case-sensitively.
    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = false;
        self
    }

    fn same(&self, a: &str, b: &str) -> bool {
        let (a, b) = (a.trim(), b.trim());
        if self.ignore_case {
            a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    }
}

impl Metric for ExactMatch {
    fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        let all_match = !self.fields.is_empty()
            && self.fields.iter().all(|field| {
                field_pair(example, prediction, field).is_some_and(|(e, a)| self.same(&e, &a))
            });
        if all_match {
            1.0
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "exact_match"
    }
}

impl DetailedMetric for ExactMatch {}

/// F1 score metric (for token-level comparison)
#[derive(Debug, Clone)]
pub struct F1Score {
    fields: Vec<String>,
}

impl Default for F1Score {
    fn default() -> Self {
        Self::new()
    }
}

impl F1Score {
    /// Compare the `answer` field.
    pub fn new() -> Self {
        Self {
            fields: default_fields(),
        }
    }

    /// Compare these fields instead; the score is their mean.
    pub fn on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Token-set F1 between two token lists.
    pub fn calculate_f1(prediction_tokens: &[&str], gold_tokens: &[&str]) -> f64 {
        if prediction_tokens.is_empty() || gold_tokens.is_empty() {
            return 0.0;
        }

        let pred_set: HashSet<_> = prediction_tokens.iter().collect();
        let gold_set: HashSet<_> = gold_tokens.iter().collect();

        let intersection = pred_set.intersection(&gold_set).count();

        let precision = intersection as f64 / pred_set.len() as f64;
        let recall = intersection as f64 / gold_set.len() as f64;

        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * (precision * recall) / (precision + recall)
        }
    }
}

impl Metric for F1Score {
    fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        mean(self.fields.iter().map(|field| {
            field_pair(example, prediction, field).map_or(0.0, |(gold, pred)| {
                let pred_tokens: Vec<&str> = pred.split_whitespace().collect();
                let gold_tokens: Vec<&str> = gold.split_whitespace().collect();
                Self::calculate_f1(&pred_tokens, &gold_tokens)
            })
        }))
    }

    fn name(&self) -> &str {
        "f1_score"
    }
}

impl DetailedMetric for F1Score {}

/// Default English stop words for semantic comparison.
const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "need",
    "dare", "ought", "used", "it", "its", "this", "that", "these", "those", "i", "you", "he",
    "she", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "our", "their",
    "what", "which", "who", "whom", "whose", "when", "where", "why", "how", "all", "each", "every",
    "both", "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own",
    "same", "so", "than", "too", "very", "just", "also", "now", "here",
];

fn content_tokens(s: &str, stop_words: &HashSet<&'static str>, normalize: bool) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|t| !t.is_empty())
        .map(|t| if normalize { t.to_lowercase() } else { t.to_string() })
        .filter(|t| !stop_words.contains(t.as_str()))
        .collect()
}

/// Semantic F1 metric with stop word filtering.
///
/// Computes F1 score while ignoring common stop words for more
/// meaningful semantic comparison.
#[derive(Debug, Clone)]
pub struct SemanticF1 {
    fields: Vec<String>,
    /// Stop words to ignore (O(1) lookup via HashSet)
    stop_words: HashSet<&'static str>,
    /// Whether to normalize text (lowercase)
    normalize: bool,
}

impl Default for SemanticF1 {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticF1 {
    /// Create a new SemanticF1 metric with default stop words.
    pub fn new() -> Self {
        Self {
            fields: default_fields(),
            stop_words: DEFAULT_STOP_WORDS.iter().copied().collect(),
            normalize: true,
        }
    }

    /// Create without stop words.
    pub fn without_stop_words() -> Self {
        Self {
            stop_words: HashSet::new(),
            ..Self::new()
        }
    }

    /// Compare these fields instead; the score is their mean.
    pub fn on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set normalization.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    fn calculate_f1(pred_tokens: &[String], gold_tokens: &[String]) -> f64 {
        if pred_tokens.is_empty() && gold_tokens.is_empty() {
            return 1.0;
        }
        if pred_tokens.is_empty() || gold_tokens.is_empty() {
            return 0.0;
        }

        let pred_set: HashSet<_> = pred_tokens.iter().collect();
        let gold_set: HashSet<_> = gold_tokens.iter().collect();

        let intersection = pred_set.intersection(&gold_set).count();
        if intersection == 0 {
            return 0.0;
        }

        let precision = intersection as f64 / pred_set.len() as f64;
        let recall = intersection as f64 / gold_set.len() as f64;

        2.0 * (precision * recall) / (precision + recall)
    }
}

impl Metric for SemanticF1 {
    fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        mean(self.fields.iter().map(|field| {
            field_pair(example, prediction, field).map_or(0.0, |(gold, pred)| {
                let pred_tokens = content_tokens(&pred, &self.stop_words, self.normalize);
                let gold_tokens = content_tokens(&gold, &self.stop_words, self.normalize);
                Self::calculate_f1(&pred_tokens, &gold_tokens)
            })
        }))
    }

    fn name(&self) -> &str {
        "semantic_f1"
    }
}

impl DetailedMetric for SemanticF1 {}

/// Numeric closeness metric.
///
/// Parses both values as numbers and passes when they differ by at most
/// `tolerance`. Non-numeric values score 0.
#[derive(Debug, Clone)]
pub struct NumericMatch {
    field: String,
    tolerance: f64,
}

impl Default for NumericMatch {
    fn default() -> Self {
        Self::new("answer")
    }
}

impl NumericMatch {
    /// Compare `field` with a tolerance of 1e-6.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tolerance: 1e-6,
        }
    }

    /// Set the absolute tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    fn number(value: &jebi::Value) -> Option<f64> {
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .filter(|x: &f64| x.is_finite())
    }
}

impl Metric for NumericMatch {
    fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        let expected = example.get(&self.field).and_then(Self::number);
        let actual = prediction.get(&self.field).and_then(Self::number);
        match (expected, actual) {
            (Some(e), Some(a)) if (e - a).abs() <= self.tolerance => 1.0,
            _ => 0.0,
        }
    }

    fn name(&self) -> &str {
        "numeric_match"
    }
}

impl DetailedMetric for NumericMatch {
    fn evaluate(&self, example: &Example, prediction: &Prediction) -> MetricResult {
        let expected = example.get(&self.field).and_then(Self::number);
        let actual = prediction.get(&self.field).and_then(Self::number);
        let result = MetricResult::new(self.score(example, prediction));
        match (expected, actual) {
            (Some(e), Some(a)) => result.with_details(format!("expected={}, actual={}", e, a)),
            (None, _) => result.with_details("expected value is not numeric"),
            (_, None) => result.with_details("predicted value is not numeric"),
        }
    }
}
