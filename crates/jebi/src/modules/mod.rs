// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Prompting strategies built on [`Predict`](crate::predict::Predict).

pub mod chain_of_thought;

pub use chain_of_thought::{ChainOfThought, DEFAULT_REASONING_FIELD};
