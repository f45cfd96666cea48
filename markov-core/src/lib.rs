//! Word-level Markov chain text model.
//!
//! This crate provides the learning and generation halves of an order-N
//! Markov chain over words:
//! - Context windows and per-context transition tables
//! - A mergeable model with a fixed text persistence format
//! - Concurrent learning from many remote sources (fan-out/fan-in)
//! - Weighted random prediction from a saved model
//!
//! Fetching and tokenization are kept behind small seams (`Fetch`, `Words`)
//! so the learning pipeline can be driven from memory in tests.

/// Error type shared by every operation of the crate.
pub mod error;

/// Core model types: context window, transition table, model and its text format.
pub mod model;

/// Lazy word tokenizer over byte streams.
pub mod tokenizer;

/// Downloaders turning a URL into a readable stream.
pub mod fetch;

/// Per-source learning and the concurrent learn pipeline.
pub mod learn;

/// Prediction loop and start strategies.
pub mod predict;

/// Stream helpers (input/output selection, URL lists).
pub mod io;

pub use error::{MarkovError, Result};
pub use model::chain::Model;
pub use model::context::ContextWindow;
pub use model::transitions::{SamplingRule, TransitionTable};
