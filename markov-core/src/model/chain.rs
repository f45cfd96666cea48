use std::collections::HashMap;

use rand::Rng;
use rand::prelude::IteratorRandom;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::context::SEPARATOR;
use super::transitions::{SamplingRule, TransitionTable};

/// Order-N word Markov chain.
///
/// Maps a context key (N words joined by `_`) to the distribution of the
/// word that followed it.
///
/// # Responsibilities
/// - Accumulate `(context, next)` observations during learning
/// - Merge with independently built partial models
/// - Sample a next word for a given context
///
/// # Invariants
/// - Every table satisfies `total == sum(counts)`
/// - Merging never depends on the iteration order of the underlying map
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
	/// Mapping from a context key to its transition table.
	pub(super) transitions: HashMap<String, TransitionTable>,
}

impl Model {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records that `next` followed the context `key`.
	pub fn record(&mut self, key: &str, next: &str) {
		match self.transitions.get_mut(key) {
			Some(table) => table.record(next),
			None => {
				let mut table = TransitionTable::new();
				table.record(next);
				self.transitions.insert(key.to_owned(), table);
			}
		}
	}

	/// Merges another model into this one.
	///
	/// Tables present on both sides are merged word by word, tables only
	/// present in `other` are copied through. This is a key-wise union, so
	/// the result is the same whatever order the two maps iterate in.
	pub fn merge(&mut self, other: &Self) {
		for (key, table) in &other.transitions {
			if let Some(existing) = self.transitions.get_mut(key) {
				existing.merge(table);
			} else {
				self.transitions.insert(key.clone(), table.clone());
			}
		}
	}

	/// Samples the word following `key` with the given rule.
	///
	/// Returns `None` ("no prediction") if the key is unknown or its table
	/// holds no observation.
	pub fn sample<R: Rng + ?Sized>(&self, key: &str, rng: &mut R, rule: SamplingRule) -> Option<&str> {
		self.transitions.get(key)?.sample(rng, rule)
	}

	/// Returns a random context key, or `None` if the model is empty.
	///
	/// Keys are drawn from a sorted list so a seeded generator always picks
	/// the same one.
	pub fn random_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
		let mut keys: Vec<&str> = self.keys().collect();
		keys.sort_unstable();
		keys.into_iter().choose(rng)
	}

	pub fn get(&self, key: &str) -> Option<&TransitionTable> {
		self.transitions.get(key)
	}

	/// Iterates the context keys in unspecified order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.transitions.keys().map(String::as_str)
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Sum of all observations across contexts.
	pub fn total_observations(&self) -> u64 {
		self.transitions.values().map(TransitionTable::total).sum()
	}

	/// Number of words in the stored context keys.
	///
	/// Returns `None` for an empty model or if keys have mixed widths.
	pub fn order_hint(&self) -> Option<usize> {
		let mut widths = self.keys().map(|key| key.split(SEPARATOR).count());
		let first = widths.next()?;
		widths.all(|width| width == first).then_some(first)
	}
}
