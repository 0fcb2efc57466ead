// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Metric trait
//!
//! A metric scores a prediction against its ground-truth example. Higher is
//! better; optimizers treat a non-finite or non-positive score as a failure.
//! Concrete metrics live in `jebi-eval`; any
//! `Fn(&Example, &Prediction) -> f64` closure is a metric too.

use crate::example::Example;
use crate::prediction::Prediction;

/// Metric trait for scoring predictions
pub trait Metric: Send + Sync {
    /// Score a prediction against an example
    fn score(&self, example: &Example, prediction: &Prediction) -> f64;

    /// Get metric name
    fn name(&self) -> &str {
        "metric"
    }
}

impl<F> Metric for F
where
    F: Fn(&Example, &Prediction) -> f64 + Send + Sync,
{
    fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        self(example, prediction)
    }
}

/// Whether an optimizer should keep a result with this score.
#[inline]
pub fn is_passing(score: f64) -> bool {
    score.is_finite() && score > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_closure_metric() {
        let metric: Arc<dyn Metric> = Arc::new(|ex: &Example, pred: &Prediction| {
            (ex.get("answer") == pred.get("answer")) as u8 as f64
        });
        let ex = Example::from_iter([("answer", "4")]);
        let mut pred = Prediction::new();
        pred.insert("answer", "4");

        assert_eq!(metric.score(&ex, &pred), 1.0);
        assert_eq!(metric.score(&ex, &Prediction::new()), 0.0);
        assert_eq!(metric.name(), "metric");
    }

    #[test]
    fn test_is_passing() {
        assert!(is_passing(0.1));
        assert!(!is_passing(0.0));
        assert!(!is_passing(-1.0));
        assert!(!is_passing(f64::NAN));
        assert!(!is_passing(f64::INFINITY));
    }
}
