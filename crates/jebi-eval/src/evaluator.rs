// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Evaluator for running metrics on datasets

use crate::metric::{DetailedMetric, MetricResult};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use jebi::{EvaluationRunner, EvaluationSummary, Example, Metric, Module, Prediction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Evaluation results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Average score across all examples
    pub score: f64,

    /// Individual results
    pub results: Vec<(MetricResult, String)>, // (result, example_id)

    /// Number of passed examples
    pub passed: usize,

    /// Total examples
    pub total: usize,

    /// Examples whose forward call failed
    pub failures: usize,
}

impl EvaluationResult {
    /// Calculate accuracy (passed / total)
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }

    /// Collapse into the summary the optimizer consumes.
    pub fn summary(&self) -> EvaluationSummary {
        EvaluationSummary::from_scores(
            self.results.iter().map(|(r, _)| r.score).collect(),
            self.failures,
        )
    }

    pub(crate) fn from_results(results: Vec<(MetricResult, String)>, failures: usize) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|(r, _)| r.passed).count();
        let score = if total == 0 {
            0.0
        } else {
            results.iter().map(|(r, _)| r.score).sum::<f64>() / total as f64
        };
        Self {
            score,
            results,
            passed,
            total,
            failures,
        }
    }
}

/// Evaluator for running a module over a dataset.
///
/// Forward calls run up to `concurrency` at a time; results keep dataset
/// order. A failed forward call is recorded as a failing result with the
/// error in its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    concurrency: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Create a sequential evaluator
    pub fn new() -> Self {
        Self { concurrency: 1 }
    }

    /// Set how many forward calls may be in flight. Zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Evaluate a module on a dataset
    pub async fn run(
        &self,
        module: Arc<dyn Module>,
        examples: &[Example],
        metric: Arc<dyn DetailedMetric>,
    ) -> EvaluationResult {
        let outcomes: Vec<(MetricResult, bool)> = stream::iter(examples.to_vec())
            .map(|example| {
                let module = Arc::clone(&module);
                let metric = Arc::clone(&metric);
                async move {
                    let inputs = example.inputs_for(module.signature());
                    match module.forward(inputs).await {
                        Ok(prediction) => (metric.evaluate(&example, &prediction), false),
                        Err(err) => {
                            tracing::debug!(module = module.name(), error = %err, "evaluation forward failed");
                            (MetricResult::fail().with_details(err.to_string()), true)
                        }
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let failures = outcomes.iter().filter(|(_, failed)| *failed).count();
        let results = outcomes
            .into_iter()
            .enumerate()
            .map(|(idx, (result, _))| (result, format!("example_{}", idx)))
            .collect();
        EvaluationResult::from_results(results, failures)
    }
}

/// Lets a plain score function stand in where details are expected.
struct ScoreOnly(Arc<dyn Metric>);

impl Metric for ScoreOnly {
    fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        self.0.score(example, prediction)
    }

    fn name(&self) -> &str {
        self.0.name()
    }
}

impl DetailedMetric for ScoreOnly {}

#[async_trait]
impl EvaluationRunner for Evaluator {
    async fn evaluate(
        &self,
        module: Arc<dyn Module>,
        examples: &[Example],
        metric: Arc<dyn Metric>,
    ) -> jebi::Result<EvaluationSummary> {
        let result = self
            .run(module, examples, Arc::new(ScoreOnly(metric)))
            .await;
        Ok(result.summary())
    }
}
