// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Error types for jebi

use thiserror::Error;

/// Result type alias for jebi operations
pub type Result<T> = core::result::Result<T, Error>;

/// Stage of the bootstrap pipeline that produced a terminal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Trainset or valset rejected before any work was done
    ValidateTrainset,
    /// No usable teacher module
    ResolveTeacher,
    /// Teacher runs over sampled inputs
    Bootstrapping,
    /// Ground-truth demo sampling
    LabeledSelection,
    /// Candidate program construction
    CandidateGeneration,
    /// Validation-set evaluation of candidates
    Selection,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::ValidateTrainset => "trainset validation",
            Self::ResolveTeacher => "teacher resolution",
            Self::Bootstrapping => "bootstrapping",
            Self::LabeledSelection => "labeled-example selection",
            Self::CandidateGeneration => "candidate generation",
            Self::Selection => "selection",
        };
        f.write_str(name)
    }
}

/// Main error type for jebi
#[derive(Error, Debug)]
pub enum Error {
    /// Signature construction errors (e.g. duplicate field names)
    #[error("Signature error: {0}")]
    Signature(String),

    /// Required input fields absent from the caller's inputs, in declaration order
    #[error("Missing input fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Required output fields absent from the parsed completion, in declaration order
    #[error("Missing required outputs: {}", .0.join(", "))]
    MissingRequiredOutputs(Vec<String>),

    /// A captured output value could not be coerced to its field type
    #[error("Invalid value for field {field}: {reason} (raw: {raw:?})")]
    InvalidFieldValue {
        /// Field name
        field: String,
        /// Captured text
        raw: String,
        /// Why coercion failed
        reason: String,
    },

    /// The language-model boundary returned an error
    #[error("LM invocation failed: {0}")]
    LmInvocationFailed(String),

    /// A module was asked to generate without an LM
    #[error("No language model configured")]
    NoLmConfigured,

    /// A single bootstrap unit failed; contained by the optimizer
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),

    /// Terminal optimizer failure
    #[error("Optimization failed during {stage}: {source}")]
    Optimization {
        /// Pipeline stage that failed
        stage: Stage,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a signature error
    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    /// Create an invalid-value error for a field
    pub fn invalid_value(
        field: impl Into<String>,
        raw: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an LM boundary failure, keeping its context chain
    pub fn lm(err: anyhow::Error) -> Self {
        Self::LmInvocationFailed(format!("{:#}", err))
    }

    /// Wrap a cause as a terminal failure of the given stage
    pub fn at_stage(stage: Stage, source: Error) -> Self {
        Self::Optimization {
            stage,
            source: Box::new(source),
        }
    }

    /// Stage of a terminal optimizer error
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Optimization { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Signature(_) => "signature",
            Self::MissingFields(_) => "missing_fields",
            Self::MissingRequiredOutputs(_) => "missing_outputs",
            Self::InvalidFieldValue { .. } => "invalid_value",
            Self::LmInvocationFailed(_) => "lm",
            Self::NoLmConfigured => "no_lm",
            Self::Bootstrap(_) => "bootstrap",
            Self::Optimization { .. } => "optimization",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}
