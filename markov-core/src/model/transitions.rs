use std::collections::BTreeMap;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Threshold test applied while walking the cumulative counts of a table.
///
/// Both rules draw `r` uniformly from `[0, total - 1]` and walk the entries
/// in ascending lexicographic order, accumulating counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplingRule {
	/// Return the first word whose cumulative count is `>= r`.
	///
	/// This is the rule saved models have always been sampled with. A draw of
	/// `r = 0` selects the first word regardless of its weight, and the last
	/// word of a table is only reachable when earlier counts leave room.
	#[default]
	Inclusive,
	/// Return the first word whose cumulative count is `> r`.
	///
	/// Selection probability is exactly proportional to the counts.
	Strict,
}

/// Empirical next-word distribution for one context key.
///
/// Conceptually a node of the Markov chain whose outgoing edges are weighted
/// by their number of observations.
///
/// ## Invariants
/// - `total` equals the sum of all counts after every mutation
/// - Every stored count is strictly positive
/// - Entries iterate in ascending lexicographic order of the word
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransitionTable {
	/// Outgoing transitions indexed by the next word.
	/// Example: { "cat" => 2, "mat" => 1 }
	counts: BTreeMap<String, u64>,
	/// Number of observations folded into this table.
	total: u64,
}

impl TransitionTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one observation of `next`.
	pub fn record(&mut self, next: &str) {
		match self.counts.get_mut(next) {
			Some(count) => *count += 1,
			None => {
				self.counts.insert(next.to_owned(), 1);
			}
		}
		self.total += 1;
	}

	/// Adds `count` observations of `next` at once.
	///
	/// Used when rebuilding a table from its persisted form. Returns `None`,
	/// leaving the table untouched, if the count or the total would overflow.
	pub(crate) fn record_many(&mut self, next: String, count: u64) -> Option<()> {
		let total = self.total.checked_add(count)?;
		let entry = self.counts.entry(next).or_insert(0);
		*entry = entry.checked_add(count)?;
		self.total = total;
		Some(())
	}

	/// Merges another table into this one by summing counts word by word.
	///
	/// Words missing on either side count as zero, so the operation is
	/// commutative and associative. Counts saturate at `u64::MAX`.
	pub fn merge(&mut self, other: &Self) {
		for (next, count) in &other.counts {
			match self.counts.get_mut(next) {
				Some(existing) => *existing = existing.saturating_add(*count),
				None => {
					self.counts.insert(next.clone(), *count);
				}
			}
		}
		self.total = self.total.saturating_add(other.total);
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of distinct next words.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Occurrence count of `next`, zero if never observed.
	pub fn count(&self, next: &str) -> u64 {
		self.counts.get(next).copied().unwrap_or(0)
	}

	/// Iterates `(word, count)` in ascending lexicographic order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
		self.counts.iter().map(|(next, count)| (next.as_str(), *count))
	}

	/// Resolves a draw `r` to a word by walking cumulative counts.
	///
	/// Returns `None` if the table is empty or if no cumulative count passes
	/// the threshold (only possible when `r >= total`).
	pub fn pick(&self, r: u64, rule: SamplingRule) -> Option<&str> {
		let mut cumulative: u64 = 0;
		for (next, count) in &self.counts {
			cumulative = cumulative.saturating_add(*count);
			let reached = match rule {
				SamplingRule::Inclusive => cumulative >= r,
				SamplingRule::Strict => cumulative > r,
			};
			if reached {
				return Some(next.as_str());
			}
		}
		None
	}

	/// Draws `r` uniformly from `[0, total - 1]` and resolves it with `pick`.
	///
	/// Returns `None` if the table holds no observation.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, rule: SamplingRule) -> Option<&str> {
		if self.total == 0 {
			return None;
		}
		let r = rng.random_range(0..self.total);
		self.pick(r, rule)
	}
}
