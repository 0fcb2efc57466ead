// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! # Jebi - Signature-Driven LM Programs
//!
//! Declare typed input/output signatures for a language-model call, wrap them
//! in modules, and let the library build the prompt, call the LM and parse the
//! answer back into typed fields. [`BootstrapFewShot`] then picks few-shot
//! demos for a module by bootstrapping them from a teacher and evaluating
//! candidate demo sets.
//!
//! ## Architecture
//!
//! - **Signature**: field schema, prompt rendering, output parsing
//! - **Module**: `forward(inputs) -> prediction`, implemented by [`Predict`],
//!   [`ChainOfThought`] and [`BootstrapCandidate`]
//! - **LM boundary**: the [`jebi_client::LM`] trait, passed explicitly to modules
//! - **Optimizer**: bootstrap, labeled sampling, candidate generation, selection
//!
//! ## Quick Start
//!
//! ```ignore
//! use jebi::prelude::*;
//! use std::sync::Arc;
//!
//! let lm = Arc::new(MockLM::constant("Answer: 4"));
//! let qa = Predict::new(Signature::parse("question -> answer")?).with_lm(lm);
//!
//! let prediction = qa.forward(Inputs::new().with("question", "What is 2+2?")).await?;
//! assert_eq!(prediction.get_str("answer"), Some("4"));
//! ```

#![warn(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod evaluate;
pub mod example;
pub mod executor;
pub mod field;
pub mod lm;
pub mod metric;
pub mod module;
pub mod modules;
pub mod optimizer;
pub mod parameter;
pub mod predict;
pub mod prediction;
pub mod retry;
pub mod signature;
pub mod types;

// Re-exports for convenience
pub use bootstrap::{
    BootstrapCandidate, BootstrapConfig, BootstrapFewShot, BootstrapResult, CandidateScore,
    ScoredExample,
};
pub use error::{Error, Result, Stage};
pub use evaluate::{ConcurrentRunner, EvaluationRunner, EvaluationSummary};
pub use example::Example;
pub use executor::{Outcome, PoolConfig, WorkerPool};
pub use field::{Field, FieldType, InputField, OutputField};
pub use lm::{generate_text, GenerateOptions};
pub use metric::Metric;
pub use module::Module;
pub use modules::ChainOfThought;
pub use optimizer::{sample, Rng, SamplingStrategy};
pub use parameter::{Parameter, ParameterKind};
pub use predict::Predict;
pub use prediction::Prediction;
pub use retry::RetryPolicy;
pub use signature::{ParseMode, Signature, SignatureBuilder};
pub use types::{FieldMap, Inputs, Value};

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::{Error, Result, Stage};

    // Core types
    pub use crate::{
        Example, Field, FieldMap, FieldType, InputField, Inputs, OutputField, ParseMode,
        Prediction, Signature, SignatureBuilder, Value,
    };

    // Modules
    pub use crate::{ChainOfThought, Module, Predict, RetryPolicy};

    // Optimizer system
    pub use crate::{
        BootstrapCandidate, BootstrapConfig, BootstrapFewShot, BootstrapResult, EvaluationRunner,
        Metric, SamplingStrategy,
    };

    // LM boundary
    pub use jebi_client::{LMConfig, MockLM, LM};
}

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
