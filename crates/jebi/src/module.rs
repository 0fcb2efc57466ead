// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Module trait
//!
//! Every executable unit (plain prediction, chain-of-thought, optimized
//! candidates) implements [`Module`]. The trait is object safe so the
//! optimizer can hold students and teachers as `Arc<dyn Module>` and drive
//! them from spawned tasks.
//!
//! ## Example
//!
//! ```ignore
//! struct Echo(Signature);
//!
//! #[async_trait]
//! impl Module for Echo {
//!     async fn forward(&self, inputs: Inputs) -> Result<Prediction> {
//!         let mut prediction = Prediction::new();
//!         if let Some(q) = inputs.get("question") {
//!             prediction.insert("answer", q.clone());
//!         }
//!         Ok(prediction)
//!     }
//!
//!     fn signature(&self) -> &Signature {
//!         &self.0
//!     }
//! }
//! ```

use crate::error::Result;
use crate::prediction::Prediction;
use crate::signature::Signature;
use crate::types::Inputs;
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for executable modules.
///
/// A module turns structured inputs into a [`Prediction`]. Few-shot demos
/// travel with the inputs (see [`Inputs::with_demos`]) so wrappers can add
/// context without touching the wrapped module.
#[async_trait]
pub trait Module: Send + Sync {
    /// Execute the module with given inputs.
    async fn forward(&self, inputs: Inputs) -> Result<Prediction>;

    /// The signature this module answers.
    fn signature(&self) -> &Signature;

    /// Get module name for debugging and tracing.
    fn name(&self) -> &str {
        &self.signature().name
    }
}

#[async_trait]
impl<M: Module + ?Sized> Module for Arc<M> {
    async fn forward(&self, inputs: Inputs) -> Result<Prediction> {
        (**self).forward(inputs).await
    }

    fn signature(&self) -> &Signature {
        (**self).signature()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<M: Module + ?Sized> Module for Box<M> {
    async fn forward(&self, inputs: Inputs) -> Result<Prediction> {
        (**self).forward(inputs).await
    }

    fn signature(&self) -> &Signature {
        (**self).signature()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
