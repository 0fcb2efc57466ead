// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! BootstrapFewShot optimizer implementation
//!
//! ## Algorithm
//!
//! 1. Run the teacher over random trainset inputs, in chunks on a bounded
//!    worker pool, and keep the outputs the metric scores above zero
//! 2. Draw labeled demos straight from the trainset
//! 3. Build candidate programs, each wrapping the student with a random mix
//!    of bootstrapped and labeled demos
//! 4. Evaluate every candidate on the validation set and keep the best mean
//!
//! Each random phase reseeds from `seed` plus a fixed offset, so a run is
//! reproducible given the same data, seed and scores.

use crate::error::{Error, Result, Stage};
use crate::evaluate::{ConcurrentRunner, EvaluationRunner, EvaluationSummary};
use crate::example::Example;
use crate::executor::{default_parallelism, Outcome, PoolConfig, WorkerPool};
use crate::metric::{is_passing, Metric};
use crate::module::Module;
use crate::optimizer::{sample, Rng, SamplingStrategy};
use crate::parameter::{Parameter, ParameterKind};
use crate::prediction::Prediction;
use crate::signature::Signature;
use crate::types::{Inputs, Value};
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Seed offset for bootstrap input sampling.
pub const BOOTSTRAP_SEED_OFFSET: u64 = 0;
/// Seed offset for labeled demo selection.
pub const LABELED_SEED_OFFSET: u64 = 1;
/// Seed offset for candidate generation.
pub const CANDIDATE_SEED_OFFSET: u64 = 2;

/// BootstrapFewShot configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Cap on bootstrapped demos kept after filtering
    pub max_bootstrapped_demos: usize,
    /// Labeled demos drawn from the trainset
    pub max_labeled_demos: usize,
    /// Bootstrap rounds
    pub max_rounds: usize,
    /// Candidate programs generated and evaluated
    pub num_candidate_programs: usize,
    /// Concurrency cap for chunks and candidate evaluations
    pub num_threads: usize,
    /// Teacher failures after which a chunk stops (at least one)
    pub max_errors: usize,
    /// Base random seed
    pub seed: u64,
    /// Ceiling on one bootstrap chunk
    pub bootstrap_timeout: Duration,
    /// Ceiling on one candidate evaluation
    pub evaluation_timeout: Duration,
    /// How labeled demos are drawn
    pub labeled_strategy: SamplingStrategy,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            max_bootstrapped_demos: 4,
            max_labeled_demos: 16,
            max_rounds: 1,
            num_candidate_programs: 16,
            num_threads: default_parallelism(),
            max_errors: 5,
            seed: 0,
            bootstrap_timeout: Duration::from_secs(120),
            evaluation_timeout: Duration::from_secs(600),
            labeled_strategy: SamplingStrategy::Diverse,
        }
    }
}

impl BootstrapConfig {
    /// Create new config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max bootstrapped demos.
    pub const fn with_max_bootstrapped_demos(mut self, n: usize) -> Self {
        self.max_bootstrapped_demos = n;
        self
    }

    /// Set max labeled demos.
    pub const fn with_max_labeled_demos(mut self, n: usize) -> Self {
        self.max_labeled_demos = n;
        self
    }

    /// Set bootstrap rounds.
    pub const fn with_max_rounds(mut self, n: usize) -> Self {
        self.max_rounds = n;
        self
    }

    /// Set number of candidate programs.
    pub const fn with_num_candidate_programs(mut self, n: usize) -> Self {
        self.num_candidate_programs = n;
        self
    }

    /// Set concurrency cap.
    pub const fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    /// Set per-chunk error budget.
    pub const fn with_max_errors(mut self, n: usize) -> Self {
        self.max_errors = n;
        self
    }

    /// Set seed.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set bootstrap chunk timeout.
    pub const fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    /// Set candidate evaluation timeout.
    pub const fn with_evaluation_timeout(mut self, timeout: Duration) -> Self {
        self.evaluation_timeout = timeout;
        self
    }

    /// Set labeled sampling strategy.
    pub const fn with_labeled_strategy(mut self, strategy: SamplingStrategy) -> Self {
        self.labeled_strategy = strategy;
        self
    }

    fn rng(&self, offset: u64) -> Rng {
        Rng::new(self.seed.wrapping_add(offset))
    }
}

/// A student bound to a fixed set of few-shot demos.
///
/// Every forward call injects the demos into the inputs and delegates to the
/// student; the student's own examples are left alone.
#[derive(Clone)]
pub struct BootstrapCandidate {
    student: Arc<dyn Module>,
    examples: Vec<Example>,
    candidate_id: usize,
}

impl BootstrapCandidate {
    /// Wrap a student with demos.
    pub fn new(student: Arc<dyn Module>, examples: Vec<Example>, candidate_id: usize) -> Self {
        Self {
            student,
            examples,
            candidate_id,
        }
    }

    /// Injected demos.
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Generation index.
    pub fn candidate_id(&self) -> usize {
        self.candidate_id
    }

    /// The wrapped student.
    pub fn student(&self) -> &Arc<dyn Module> {
        &self.student
    }
}

#[async_trait]
impl Module for BootstrapCandidate {
    async fn forward(&self, inputs: Inputs) -> Result<Prediction> {
        self.student.forward(inputs.with_demos(&self.examples)).await
    }

    fn signature(&self) -> &Signature {
        self.student.signature()
    }

    fn name(&self) -> &str {
        self.student.name()
    }
}

impl core::fmt::Debug for BootstrapCandidate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapCandidate")
            .field("student", &self.student.name())
            .field("examples", &self.examples.len())
            .field("candidate_id", &self.candidate_id)
            .finish()
    }
}

/// A demo with the metric score that admitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredExample {
    /// The demo: signature inputs merged with the teacher's outputs
    pub example: Example,
    /// Metric score
    pub score: f64,
}

/// Evaluation result of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Generation index
    pub candidate_id: usize,
    /// Mean validation score
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

/// Outcome of a BootstrapFewShot run.
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    /// Best candidate; usable as a module
    pub best: BootstrapCandidate,
    /// Its mean validation score
    pub score: f64,
    /// Its score standard deviation
    pub std: f64,
    /// Every candidate that finished evaluation, in generation order
    pub candidates: Vec<CandidateScore>,
    /// Bootstrapped demos, best first
    pub bootstrapped: Vec<ScoredExample>,
    /// Labeled demos drawn from the trainset
    pub labeled: Vec<Example>,
    /// Demo set history; updated each time a better candidate is found
    pub demos: Parameter,
}

#[derive(Debug, Default)]
struct ChunkReport {
    kept: Vec<ScoredExample>,
    errors: usize,
}

/// BootstrapFewShot optimizer.
///
/// Never mutates the student; it returns a new [`BootstrapCandidate`].
#[derive(Clone)]
pub struct BootstrapFewShot {
    config: BootstrapConfig,
    runner: Arc<dyn EvaluationRunner>,
}

impl Default for BootstrapFewShot {
    fn default() -> Self {
        Self::new(BootstrapConfig::default())
    }
}

impl BootstrapFewShot {
    /// Create with the default evaluation runner.
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            runner: Arc::new(ConcurrentRunner::default()),
        }
    }

    /// Use a different evaluation runner for candidate selection.
    pub fn with_runner(mut self, runner: Arc<dyn EvaluationRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Optimize `student`, using it as its own teacher and the trainset for validation.
    pub async fn compile(
        &self,
        student: Arc<dyn Module>,
        trainset: &[Example],
        metric: Arc<dyn Metric>,
    ) -> Result<BootstrapResult> {
        self.compile_with(student, None, trainset, None, metric).await
    }

    /// Optimize `student` with an optional separate teacher and validation set.
    pub async fn compile_with(
        &self,
        student: Arc<dyn Module>,
        teacher: Option<Arc<dyn Module>>,
        trainset: &[Example],
        valset: Option<&[Example]>,
        metric: Arc<dyn Metric>,
    ) -> Result<BootstrapResult> {
        let span = tracing::info_span!(
            "bootstrap_fewshot",
            student = %student.name(),
            trainset = trainset.len(),
            seed = self.config.seed,
        );
        self.run(student, teacher, trainset, valset, metric)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        student: Arc<dyn Module>,
        teacher: Option<Arc<dyn Module>>,
        trainset: &[Example],
        valset: Option<&[Example]>,
        metric: Arc<dyn Metric>,
    ) -> Result<BootstrapResult> {
        if trainset.is_empty() {
            return Err(Error::at_stage(
                Stage::ValidateTrainset,
                Error::Bootstrap("trainset is empty".to_string()),
            ));
        }

        let teacher = teacher.unwrap_or_else(|| Arc::clone(&student));
        tracing::debug!(teacher = %teacher.name(), "teacher resolved");

        let bootstrapped = self
            .bootstrap(&teacher, trainset, &metric)
            .await
            .map_err(|e| Error::at_stage(Stage::Bootstrapping, e))?;

        let labeled = sample(
            trainset,
            self.config.max_labeled_demos,
            self.config.labeled_strategy,
            &mut self.config.rng(LABELED_SEED_OFFSET),
        );
        tracing::info!(
            bootstrapped = bootstrapped.len(),
            labeled = labeled.len(),
            "demo pools ready"
        );

        let candidates = self
            .generate_candidates(&student, &bootstrapped, &labeled)
            .map_err(|e| Error::at_stage(Stage::CandidateGeneration, e))?;

        let valset = valset.unwrap_or(trainset);
        let (best, candidate_scores, demos) = self
            .select(candidates, valset, &metric)
            .await
            .map_err(|e| Error::at_stage(Stage::Selection, e))?;

        let (score, std) = candidate_scores
            .iter()
            .find(|c| c.candidate_id == best.candidate_id)
            .map(|c| (c.mean, c.std))
            .unwrap_or_default();
        tracing::info!(
            best = best.candidate_id,
            score,
            std,
            evaluated = candidate_scores.len(),
            "best candidate selected"
        );

        Ok(BootstrapResult {
            best,
            score,
            std,
            candidates: candidate_scores,
            bootstrapped,
            labeled,
            demos,
        })
    }

    /// Run the teacher over sampled inputs and keep the well-scored outputs.
    async fn bootstrap(
        &self,
        teacher: &Arc<dyn Module>,
        trainset: &[Example],
        metric: &Arc<dyn Metric>,
    ) -> Result<Vec<ScoredExample>> {
        let max_demos = self.config.max_bootstrapped_demos;
        if max_demos == 0 {
            return Ok(Vec::new());
        }

        let pool = WorkerPool::new(
            PoolConfig::new(self.config.num_threads).with_timeout(self.config.bootstrap_timeout),
        );
        let max_errors = self.config.max_errors.max(1);
        let mut rng = self.config.rng(BOOTSTRAP_SEED_OFFSET);
        let mut collected = Vec::new();
        let (mut units, mut completed) = (0usize, 0usize);

        for round in 0..self.config.max_rounds {
            let sampled = sample(trainset, 2 * max_demos, SamplingStrategy::Random, &mut rng);
            let chunk_size = sampled.len().div_ceil(pool.config().max_concurrency).max(1);
            let chunks: Vec<Vec<Example>> = sampled.chunks(chunk_size).map(<[Example]>::to_vec).collect();
            units += chunks.len();

            let outcomes = pool
                .run_all(chunks.into_iter().map(|chunk| {
                    run_chunk(Arc::clone(teacher), Arc::clone(metric), chunk, max_errors)
                }))
                .await;

            let mut kept = 0;
            let mut errors = 0;
            for report in outcomes.into_iter().filter_map(Outcome::completed) {
                completed += 1;
                kept += report.kept.len();
                errors += report.errors;
                collected.extend(report.kept);
            }
            tracing::info!(round, sampled = sampled.len(), kept, errors, "bootstrap round finished");
        }

        if units > 0 && completed == 0 {
            return Err(Error::Bootstrap(
                "no bootstrap chunk completed".to_string(),
            ));
        }

        Ok(select_top(collected, max_demos))
    }

    fn generate_candidates(
        &self,
        student: &Arc<dyn Module>,
        bootstrapped: &[ScoredExample],
        labeled: &[Example],
    ) -> Result<Vec<BootstrapCandidate>> {
        if self.config.num_candidate_programs == 0 {
            return Err(Error::Bootstrap(
                "num_candidate_programs must be at least 1".to_string(),
            ));
        }

        let boot_pool: Vec<Example> = bootstrapped.iter().map(|s| s.example.clone()).collect();
        let mut rng = self.config.rng(CANDIDATE_SEED_OFFSET);

        Ok((0..self.config.num_candidate_programs)
            .map(|candidate_id| {
                let boot_count = rng.up_to(boot_pool.len());
                let labeled_count = rng.up_to(labeled.len());
                let mut demos = sample(&boot_pool, boot_count, SamplingStrategy::Random, &mut rng);
                demos.extend(sample(labeled, labeled_count, SamplingStrategy::Random, &mut rng));
                BootstrapCandidate::new(Arc::clone(student), demos, candidate_id)
            })
            .collect())
    }

    /// Evaluate candidates concurrently and pick the best mean.
    ///
    /// Ties go to the lowest candidate id. Candidates that time out or panic
    /// are dropped; a runner error fails the selection.
    async fn select(
        &self,
        candidates: Vec<BootstrapCandidate>,
        valset: &[Example],
        metric: &Arc<dyn Metric>,
    ) -> Result<(BootstrapCandidate, Vec<CandidateScore>, Parameter)> {
        let pool = WorkerPool::new(
            PoolConfig::new(self.config.num_threads).with_timeout(self.config.evaluation_timeout),
        );
        let valset: Arc<Vec<Example>> = Arc::new(valset.to_vec());

        let outcomes = pool
            .run_all(candidates.iter().map(|candidate| {
                let module: Arc<dyn Module> = Arc::new(candidate.clone());
                let runner = Arc::clone(&self.runner);
                let metric = Arc::clone(metric);
                let valset = Arc::clone(&valset);
                async move { runner.evaluate(module, &valset, metric).await }
            }))
            .await;

        let mut demos = Parameter::new("demos", ParameterKind::Examples, Value::Array(Vec::new()));
        let mut scores = Vec::new();
        let mut best: Option<(usize, f64)> = None;

        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            let summary: EvaluationSummary = match outcome {
                Outcome::Completed(result) => result?,
                Outcome::TimedOut | Outcome::Failed(_) => {
                    tracing::warn!(candidate = candidate.candidate_id, "candidate dropped from selection");
                    continue;
                }
            };
            tracing::debug!(
                candidate = candidate.candidate_id,
                demos = candidate.examples.len(),
                mean = summary.mean,
                failures = summary.failures,
                "candidate evaluated"
            );

            if best.map_or(true, |(_, mean)| summary.mean > mean) {
                best = Some((scores.len(), summary.mean));
                demos.update(serde_json::to_value(&candidate.examples)?);
            }
            scores.push(CandidateScore {
                candidate_id: candidate.candidate_id,
                mean: summary.mean,
                std: summary.std,
            });
        }

        let Some((best_index, _)) = best else {
            return Err(Error::Bootstrap(
                "no candidate completed evaluation".to_string(),
            ));
        };
        let best_id = scores[best_index].candidate_id;
        let best = candidates
            .into_iter()
            .find(|c| c.candidate_id == best_id)
            .ok_or_else(|| Error::Other(format!("candidate {} missing", best_id)))?;
        Ok((best, scores, demos))
    }
}

/// Run the teacher over one chunk of trainset examples.
///
/// Each example is its own unit: a teacher error, or a panic in the teacher
/// or the metric, costs one unit of the error budget and the chunk moves on.
async fn run_chunk(
    teacher: Arc<dyn Module>,
    metric: Arc<dyn Metric>,
    chunk: Vec<Example>,
    max_errors: usize,
) -> ChunkReport {
    let mut report = ChunkReport::default();

    for example in chunk {
        let inputs = example.inputs_for(teacher.signature());
        let unit = AssertUnwindSafe(async {
            let prediction = teacher.forward(inputs.clone()).await?;
            let score = metric.score(&example, &prediction);
            Ok::<_, Error>((prediction, score))
        })
        .catch_unwind()
        .await;

        let (prediction, score) = match unit {
            Ok(Ok(scored)) => scored,
            Ok(Err(err)) => {
                report.errors += 1;
                tracing::debug!(error = %err, category = err.category(), errors = report.errors, "teacher failed");
                if report.errors >= max_errors {
                    tracing::debug!(max_errors, "chunk error budget spent");
                    break;
                }
                continue;
            }
            Err(payload) => {
                report.errors += 1;
                let err = Error::Bootstrap(format!("unit panicked: {}", panic_message(&*payload)));
                tracing::debug!(error = %err, category = err.category(), errors = report.errors, "bootstrap unit panicked");
                if report.errors >= max_errors {
                    tracing::debug!(max_errors, "chunk error budget spent");
                    break;
                }
                continue;
            }
        };

        if !is_passing(score) {
            tracing::debug!(score, "bootstrapped output rejected");
            continue;
        }

        let demo = Example::from_attrs(inputs.fields().clone()).merge(&prediction.into_example());
        report.kept.push(ScoredExample {
            example: demo,
            score,
        });
    }
    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Best-scored first, duplicates collapsed, capped at `max`.
fn select_top(mut collected: Vec<ScoredExample>, max: usize) -> Vec<ScoredExample> {
    // Stable, so equal scores keep round and chunk order.
    collected.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut unique: Vec<ScoredExample> = Vec::with_capacity(max);
    for scored in collected {
        if unique.len() == max {
            break;
        }
        if !unique.iter().any(|u| u.example.same_content(&scored.example)) {
            unique.push(scored);
        }
    }
    unique
}
