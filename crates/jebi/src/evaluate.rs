// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Evaluation runner interface and the default concurrent runner.

use crate::error::Result;
use crate::example::Example;
use crate::metric::Metric;
use crate::module::Module;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scores of one module over one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Mean score; 0 for an empty dataset
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Per-example scores in dataset order
    pub scores: Vec<f64>,
    /// Examples whose forward call failed (scored 0)
    pub failures: usize,
}

impl EvaluationSummary {
    /// Summarize per-example scores.
    ///
    /// Non-finite scores count as 0.
    pub fn from_scores(scores: Vec<f64>, failures: usize) -> Self {
        let scores: Vec<f64> = scores
            .into_iter()
            .map(|s| if s.is_finite() { s } else { 0.0 })
            .collect();
        if scores.is_empty() {
            return Self {
                failures,
                ..Self::default()
            };
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: variance.sqrt(),
            scores,
            failures,
        }
    }

    /// Number of examples evaluated.
    pub fn total(&self) -> usize {
        self.scores.len()
    }
}

/// Runs a module over a dataset and scores it.
#[async_trait]
pub trait EvaluationRunner: Send + Sync {
    /// Evaluate `module` on `examples` with `metric`.
    async fn evaluate(
        &self,
        module: Arc<dyn Module>,
        examples: &[Example],
        metric: Arc<dyn Metric>,
    ) -> Result<EvaluationSummary>;
}

/// Default runner: up to `concurrency` forward calls in flight.
///
/// A failed forward call scores 0 and is counted in
/// [`EvaluationSummary::failures`]; the run itself never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrentRunner {
    /// Forward calls in flight at once
    pub concurrency: usize,
}

impl Default for ConcurrentRunner {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ConcurrentRunner {
    /// Create a runner. Zero is raised to one.
    pub const fn new(concurrency: usize) -> Self {
        Self {
            concurrency: if concurrency == 0 { 1 } else { concurrency },
        }
    }
}

#[async_trait]
impl EvaluationRunner for ConcurrentRunner {
    async fn evaluate(
        &self,
        module: Arc<dyn Module>,
        examples: &[Example],
        metric: Arc<dyn Metric>,
    ) -> Result<EvaluationSummary> {
        // Owned items and cloned handles keep each scoring future 'static and Send.
        let results: Vec<Option<f64>> = stream::iter(examples.to_vec())
            .map(|example| {
                let module = Arc::clone(&module);
                let metric = Arc::clone(&metric);
                async move {
                    let inputs = example.inputs_for(module.signature());
                    match module.forward(inputs).await {
                        Ok(prediction) => Some(metric.score(&example, &prediction)),
                        Err(err) => {
                            tracing::debug!(module = module.name(), error = %err, "evaluation forward failed");
                            None
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let failures = results.iter().filter(|r| r.is_none()).count();
        let scores = results.into_iter().map(|r| r.unwrap_or(0.0)).collect();
        Ok(EvaluationSummary::from_scores(scores, failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::Predict;
    use crate::prediction::Prediction;
    use crate::signature::Signature;
    use jebi_client::MockLM;

    #[test]
    fn test_summary_population_std() {
        let summary = EvaluationSummary::from_scores(vec![1.0, 0.0, 1.0, 0.0], 1);
        assert_eq!(summary.mean, 0.5);
        assert_eq!(summary.std, 0.5);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn test_summary_empty_and_nan() {
        let empty = EvaluationSummary::from_scores(Vec::new(), 0);
        assert_eq!((empty.mean, empty.std), (0.0, 0.0));

        let nan = EvaluationSummary::from_scores(vec![f64::NAN, 1.0], 0);
        assert_eq!(nan.mean, 0.5);
    }

    #[tokio::test]
    async fn test_runner_scores_and_counts_failures() {
        let lm = Arc::new(MockLM::new(|prompt| {
            if prompt.contains("Question: fail") {
                "nothing useful".to_string()
            } else {
                "Answer: 4".to_string()
            }
        }));
        let module: Arc<dyn Module> = Arc::new(
            Predict::new(Signature::parse("question -> answer").unwrap())
                .with_lm(lm)
                .with_max_retries(0),
        );
        let examples = vec![
            Example::from_iter([("question", "2+2"), ("answer", "4")]),
            Example::from_iter([("question", "fail"), ("answer", "4")]),
            Example::from_iter([("question", "3+3"), ("answer", "6")]),
        ];
        let metric: Arc<dyn Metric> = Arc::new(|ex: &Example, pred: &Prediction| {
            (ex.get("answer") == pred.get("answer")) as u8 as f64
        });

        let summary = ConcurrentRunner::new(2)
            .evaluate(module, &examples, metric)
            .await
            .unwrap();

        assert_eq!(summary.scores, vec![1.0, 0.0, 0.0]);
        assert_eq!(summary.failures, 1);
        assert!((summary.mean - 1.0 / 3.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_runner_future_can_be_spawned() {
        let lm = Arc::new(MockLM::constant("Answer: 4"));
        let module: Arc<dyn Module> = Arc::new(
            Predict::new(Signature::parse("question -> answer").unwrap()).with_lm(lm),
        );
        let metric: Arc<dyn Metric> = Arc::new(|_: &Example, _: &Prediction| 1.0);
        let runner: Arc<dyn EvaluationRunner> = Arc::new(ConcurrentRunner::new(4));
        let examples: Vec<Example> = (0..8)
            .map(|i| Example::from_iter([("question", format!("q{}", i))]))
            .collect();

        let summary = tokio::spawn(async move { runner.evaluate(module, &examples, metric).await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.total(), 8);
        assert_eq!(summary.mean, 1.0);
    }
}
