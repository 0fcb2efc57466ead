// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Seeded randomness and trainset sampling for optimizers.
//!
//! Everything here is deterministic for a given seed so optimization runs
//! can be reproduced.

use crate::example::Example;
use crate::types::value_text;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Simple random number generator (LCG).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rng(u64);

impl Rng {
    /// Create from seed.
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Get next random u64.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    /// Get random float in [0, 1).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        // Top 53 bits; the low bits of an LCG are weak.
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Get random usize in [0, max). Returns 0 when `max` is 0.
    #[inline]
    pub fn next_usize(&mut self, max: usize) -> usize {
        ((self.next_f64() * max as f64) as usize).min(max.saturating_sub(1))
    }

    /// Get random usize in [0, max].
    #[inline]
    pub fn up_to(&mut self, max: usize) -> usize {
        self.next_usize(max + 1)
    }

    /// Shuffle a mutable slice.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_usize(i + 1);
            slice.swap(i, j);
        }
    }
}

/// How examples are drawn from a trainset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Uniform, without replacement.
    #[default]
    Random,
    /// Spread over the trainset by token overlap.
    Diverse,
    /// Hardest first, by `difficulty` metadata then text length.
    Hard,
}

/// Metadata key read by [`SamplingStrategy::Hard`].
pub const DIFFICULTY_KEY: &str = "difficulty";

/// Draw `min(n, trainset.len())` examples.
///
/// `Random` consumes the generator; `Diverse` uses it only to pick the first
/// example; `Hard` is fully deterministic.
pub fn sample(
    trainset: &[Example],
    n: usize,
    strategy: SamplingStrategy,
    rng: &mut Rng,
) -> Vec<Example> {
    let n = n.min(trainset.len());
    if n == 0 {
        return Vec::new();
    }

    let picked = match strategy {
        SamplingStrategy::Random => random_indices(trainset.len(), n, rng),
        SamplingStrategy::Diverse => diverse_indices(trainset, n, rng),
        SamplingStrategy::Hard => hard_indices(trainset, n),
    };
    picked.into_iter().map(|i| trainset[i].clone()).collect()
}

/// Partial Fisher-Yates over `0..len`.
fn random_indices(len: usize, n: usize, rng: &mut Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    for i in 0..n {
        let j = i + rng.next_usize(len - i);
        indices.swap(i, j);
    }
    indices.truncate(n);
    indices
}

/// Greedy farthest-point selection on Jaccard distance.
fn diverse_indices(trainset: &[Example], n: usize, rng: &mut Rng) -> Vec<usize> {
    let tokens: Vec<HashSet<String>> = trainset.iter().map(token_set).collect();

    let first = rng.next_usize(trainset.len());
    let mut picked = vec![first];
    let mut nearest: Vec<f64> = tokens.iter().map(|t| jaccard_distance(t, &tokens[first])).collect();
    nearest[first] = f64::NEG_INFINITY;

    while picked.len() < n {
        let mut best = None::<(usize, f64)>;
        for (i, &d) in nearest.iter().enumerate() {
            if d == f64::NEG_INFINITY {
                continue;
            }
            if best.map_or(true, |(_, bd)| d > bd) {
                best = Some((i, d));
            }
        }
        let Some((next, _)) = best else { break };

        picked.push(next);
        nearest[next] = f64::NEG_INFINITY;
        for (i, d) in nearest.iter_mut().enumerate() {
            if *d != f64::NEG_INFINITY {
                *d = d.min(jaccard_distance(&tokens[i], &tokens[next]));
            }
        }
    }
    picked
}

fn hard_indices(trainset: &[Example], n: usize) -> Vec<usize> {
    let keyed: Vec<(f64, usize)> = trainset
        .iter()
        .map(|ex| {
            let difficulty = ex
                .metadata
                .get(DIFFICULTY_KEY)
                .and_then(|v| v.as_f64())
                .unwrap_or(f64::NEG_INFINITY);
            let length = ex.attrs.values().map(|v| value_text(v).len()).sum();
            (difficulty, length)
        })
        .collect();

    let mut indices: Vec<usize> = (0..trainset.len()).collect();
    // Stable: equal keys keep trainset order.
    indices.sort_by(|&a, &b| {
        keyed[b]
            .0
            .total_cmp(&keyed[a].0)
            .then(keyed[b].1.cmp(&keyed[a].1))
    });
    indices.truncate(n);
    indices
}

fn token_set(example: &Example) -> HashSet<String> {
    example
        .attrs
        .values()
        .flat_map(|v| {
            value_text(v)
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn jaccard_distance(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    1.0 - a.intersection(b).count() as f64 / union as f64
}
