// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Language-model boundary for jebi.
//!
//! Vendor clients live outside this workspace; they implement [`LM`] and are
//! handed to modules at construction time.

pub mod lm;
pub mod mock;
pub mod request;
pub mod response;

pub use lm::{LMConfig, LM};
pub use mock::MockLM;
pub use request::{LMRequest, Message, Tool};
pub use response::{Choice, LMResponse, Usage};
