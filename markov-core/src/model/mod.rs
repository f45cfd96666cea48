//! Model layer of the Markov chain.
//!
//! - `ContextWindow`: sliding window of the last N words, rendered as a key
//! - `TransitionTable`: next-word occurrence counts for one context
//! - `Model`: context key to transition table mapping, merge and sampling
//! - `format`: the whitespace-delimited text persistence format

/// Sliding window over the last N words.
pub mod context;

/// Empirical next-word distribution for a single context key.
///
/// Keeps its entries sorted so weighted sampling is reproducible.
pub mod transitions;

/// Context-keyed model built from observations or by merging partial models.
pub mod chain;

/// Text serialization (`save` / `load`) of a `Model`.
mod format;
