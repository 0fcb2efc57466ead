// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Parallel scoring of precomputed predictions using Rayon

use crate::evaluator::EvaluationResult;
use crate::metric::DetailedMetric;
use jebi::{Example, Prediction};
use rayon::prelude::*;
use std::sync::Arc;

/// Parallel evaluator using Rayon for CPU-bound scoring
pub struct ParallelEvaluator {
    metric: Arc<dyn DetailedMetric>,
    num_threads: Option<usize>,
}

impl ParallelEvaluator {
    /// Create a new parallel evaluator
    pub fn new(metric: Arc<dyn DetailedMetric>) -> Self {
        Self {
            metric,
            num_threads: None,
        }
    }

    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads.max(1));
        self
    }

    /// Score predictions already computed, pairing them with examples by index.
    pub fn evaluate_predictions(
        &self,
        examples: &[Example],
        predictions: &[Prediction],
    ) -> anyhow::Result<EvaluationResult> {
        anyhow::ensure!(
            examples.len() == predictions.len(),
            "examples and predictions length mismatch: {} vs {}",
            examples.len(),
            predictions.len()
        );

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.num_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        // Indexed parallel iterators keep dataset order through collect.
        let results = pool.install(|| {
            examples
                .par_iter()
                .zip(predictions.par_iter())
                .enumerate()
                .map(|(idx, (example, prediction))| {
                    (self.metric.evaluate(example, prediction), format!("example_{}", idx))
                })
                .collect::<Vec<_>>()
        });

        Ok(EvaluationResult::from_results(results, 0))
    }
}
