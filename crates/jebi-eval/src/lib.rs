// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Evaluation framework for jebi
//!
//! Metrics here implement [`jebi::Metric`] and plug straight into the
//! optimizer; [`Evaluator`] implements [`jebi::EvaluationRunner`].
//! [`ParallelEvaluator`] scores precomputed predictions on Rayon.

pub mod evaluator;
pub mod metric;
pub mod parallel;

pub use evaluator::{EvaluationResult, Evaluator};
pub use metric::{DetailedMetric, ExactMatch, F1Score, MetricResult, NumericMatch, SemanticF1};
pub use parallel::ParallelEvaluator;
