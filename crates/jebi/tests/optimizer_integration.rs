// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Integration tests for the BootstrapFewShot optimizer
//!
//! These tests drive end-to-end optimizer runs with mock LMs and metrics.

use async_trait::async_trait;
use jebi::prelude::*;
use jebi::{ParameterKind, ScoredExample};
use std::sync::Arc;
use std::time::Duration;

fn qa() -> Signature {
    Signature::parse("question -> answer").unwrap()
}

/// Value of the last `label` line in the prompt, i.e. the live input.
fn last_value<'a>(prompt: &'a str, label: &str) -> &'a str {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
        .unwrap_or("")
}

/// Answers every question with its uppercase form.
fn upper_lm() -> Arc<MockLM> {
    Arc::new(MockLM::new(|prompt| {
        format!("Answer: {}", last_value(prompt, "Question:").to_uppercase())
    }))
}

fn student(lm: Arc<dyn LM>) -> Arc<dyn Module> {
    Arc::new(Predict::new(qa()).with_lm(lm).with_max_retries(0))
}

fn exact_answer() -> Arc<dyn Metric> {
    Arc::new(|ex: &Example, pred: &Prediction| {
        if ex.get("answer") == pred.get("answer") {
            1.0
        } else {
            0.0
        }
    })
}

fn example(question: &str, answer: &str) -> Example {
    Example::from_iter([("question", question), ("answer", answer)])
}

fn trainset() -> Vec<Example> {
    vec![
        example("alpha", "ALPHA"),
        example("beta", "BETA"),
        example("gamma", "wrong"),
        example("delta", "DELTA"),
        example("epsilon", "nope"),
        example("zeta", "ZETA"),
        example("eta", "ETA"),
        example("theta", "bad"),
    ]
}

/// Route optimizer logs to the test harness; set `RUST_LOG=jebi=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> BootstrapConfig {
    BootstrapConfig::new()
        .with_max_bootstrapped_demos(3)
        .with_max_labeled_demos(2)
        .with_num_candidate_programs(6)
        .with_num_threads(3)
        .with_seed(17)
}

#[tokio::test]
async fn test_bootstrap_filters_and_caps() {
    let result = BootstrapFewShot::new(config())
        .compile(student(upper_lm()), &trainset(), exact_answer())
        .await
        .unwrap();

    assert!(result.bootstrapped.len() <= 3);
    for ScoredExample { example, score } in &result.bootstrapped {
        assert!(*score > 0.0);
        let question = example.get_str("question").unwrap();
        assert_eq!(example.get_str("answer"), Some(question.to_uppercase().as_str()));
    }
    assert_eq!(result.labeled.len(), 2);
    assert_eq!(result.candidates.len(), 6);
}

#[tokio::test]
async fn test_bootstrap_collapses_duplicates() {
    let trainset = vec![example("same", "SAME"); 5];
    let result = BootstrapFewShot::new(config().with_max_rounds(2))
        .compile(student(upper_lm()), &trainset, exact_answer())
        .await
        .unwrap();

    assert_eq!(result.bootstrapped.len(), 1);
    assert_eq!(result.bootstrapped[0].example, example("same", "SAME"));
}

#[tokio::test]
async fn test_selection_is_reproducible() {
    let run = || async {
        BootstrapFewShot::new(config())
            .compile(student(upper_lm()), &trainset(), exact_answer())
            .await
            .unwrap()
    };
    let first = run().await;
    let second = run().await;

    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.best.candidate_id(), second.best.candidate_id());
    assert_eq!(first.best.examples(), second.best.examples());
    assert_eq!(first.score, second.score);
    assert_eq!(first.bootstrapped, second.bootstrapped);
}

#[tokio::test]
async fn test_best_candidate_has_max_mean() {
    // Answers correctly only with at least two demos in the prompt; the
    // format block contributes one more "Answer: " line.
    let lm: Arc<dyn LM> = Arc::new(MockLM::new(|prompt| {
        let answer_lines = prompt.matches("\nAnswer: ").count();
        let question = last_value(prompt, "Question:");
        if answer_lines >= 3 {
            format!("Answer: {}", question.to_uppercase())
        } else {
            "Answer: ?".to_string()
        }
    }));
    let teacher = student(upper_lm());
    let valset: Vec<Example> = trainset()
        .into_iter()
        .filter(|e| e.get_str("answer") != Some("wrong"))
        .collect();

    let result = BootstrapFewShot::new(config().with_num_candidate_programs(8))
        .compile_with(student(lm), Some(teacher), &trainset(), Some(valset.as_slice()), exact_answer())
        .await
        .unwrap();

    let max = result
        .candidates
        .iter()
        .map(|c| c.mean)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.score, max);
    let first_max = result.candidates.iter().find(|c| c.mean == max).unwrap();
    assert_eq!(result.best.candidate_id(), first_max.candidate_id);
    assert!(result.std >= 0.0);
}

#[tokio::test]
async fn test_ties_go_to_first_candidate() {
    let always: Arc<dyn Metric> = Arc::new(|_: &Example, _: &Prediction| 1.0);
    let result = BootstrapFewShot::new(config())
        .compile(student(upper_lm()), &trainset(), always)
        .await
        .unwrap();

    assert_eq!(result.best.candidate_id(), 0);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.std, 0.0);

    // Only the first candidate ever improved on the empty starting set.
    assert_eq!(result.demos.kind, ParameterKind::Examples);
    assert_eq!(result.demos.history(), &[Value::Array(Vec::new())]);
    assert_eq!(
        result.demos.value(),
        &serde_json::to_value(result.best.examples()).unwrap()
    );
}

#[tokio::test]
async fn test_teacher_errors_respect_budget() {
    init_tracing();
    let failing = Arc::new(MockLM::failing("teacher offline"));
    let teacher = student(failing.clone());

    let result = BootstrapFewShot::new(config().with_num_threads(1).with_max_errors(2))
        .compile_with(student(upper_lm()), Some(teacher), &trainset(), None, exact_answer())
        .await
        .unwrap();

    // One chunk of six sampled inputs, stopped after the second failure.
    assert_eq!(failing.calls(), 2);
    assert!(result.bootstrapped.is_empty());
    assert_eq!(result.labeled.len(), 2);
}

#[tokio::test]
async fn test_panicking_metric_costs_one_unit() {
    init_tracing();
    let metric: Arc<dyn Metric> = Arc::new(|ex: &Example, pred: &Prediction| {
        if ex.get_str("question") == Some("boom") {
            panic!("metric cannot score boom");
        }
        if ex.get("answer") == pred.get("answer") {
            1.0
        } else {
            0.0
        }
    });
    let trainset = vec![
        example("alpha", "ALPHA"),
        example("beta", "BETA"),
        example("boom", "BOOM"),
        example("gamma", "GAMMA"),
    ];
    let valset = vec![example("delta", "DELTA")];

    let result = BootstrapFewShot::new(config().with_num_threads(1).with_max_bootstrapped_demos(2))
        .compile_with(
            student(upper_lm()),
            None,
            &trainset,
            Some(valset.as_slice()),
            metric,
        )
        .await
        .unwrap();

    // One chunk holds all four inputs; only the panicking one is lost.
    assert_eq!(result.bootstrapped.len(), 2);
    assert!(result
        .bootstrapped
        .iter()
        .all(|s| s.example.get_str("question") != Some("boom")));
}

#[tokio::test]
async fn test_best_candidate_is_a_module() {
    let result = BootstrapFewShot::new(config())
        .compile(student(upper_lm()), &trainset(), exact_answer())
        .await
        .unwrap();

    let best: Arc<dyn Module> = Arc::new(result.best);
    let prediction = best
        .forward(Inputs::new().with("question", "iota"))
        .await
        .unwrap();
    assert_eq!(prediction.get_str("answer"), Some("IOTA"));
}

struct Stalled(Signature);

#[async_trait]
impl Module for Stalled {
    async fn forward(&self, _inputs: Inputs) -> Result<Prediction> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Prediction::new())
    }

    fn signature(&self) -> &Signature {
        &self.0
    }
}

#[tokio::test(start_paused = true)]
async fn test_all_chunks_timing_out_fails_bootstrapping() {
    init_tracing();
    let teacher: Arc<dyn Module> = Arc::new(Stalled(qa()));
    let err = BootstrapFewShot::new(config().with_bootstrap_timeout(Duration::from_secs(5)))
        .compile_with(student(upper_lm()), Some(teacher), &trainset(), None, exact_answer())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Bootstrapping));
    assert!(err.to_string().starts_with("Optimization failed during bootstrapping"));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_candidates_fail_selection() {
    let stalled: Arc<dyn Module> = Arc::new(Stalled(qa()));
    let err = BootstrapFewShot::new(
        config()
            .with_max_bootstrapped_demos(0)
            .with_evaluation_timeout(Duration::from_secs(5)),
    )
    .compile(stalled, &trainset(), exact_answer())
    .await
    .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Selection));
}
