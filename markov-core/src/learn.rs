use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::{MarkovError, Result};
use crate::fetch::Fetch;
use crate::model::chain::Model;
use crate::model::context::ContextWindow;
use crate::tokenizer::Words;

/// Parameters of a learn job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LearnOptions {
	/// Number of preceding words forming a context.
	pub order: usize,
}

impl Default for LearnOptions {
	fn default() -> Self {
		Self { order: 1 }
	}
}

impl LearnOptions {
	/// # Errors
	/// Returns `MarkovError::Configuration` if `order` is zero.
	pub fn validate(&self) -> Result<()> {
		if self.order == 0 {
			return Err(MarkovError::Configuration("order must be >= 1".to_owned()));
		}
		Ok(())
	}
}

/// A source skipped by the learn pipeline.
#[derive(Debug)]
pub struct SourceFailure {
	pub url: String,
	pub error: MarkovError,
}

/// Outcome of a learn job where at least one source succeeded.
#[derive(Debug)]
pub struct Learned {
	/// Merge of every successfully learned source.
	pub model: Model,
	/// Number of sources folded into `model`.
	pub succeeded: usize,
	/// Sources that failed, in completion order.
	pub failures: Vec<SourceFailure>,
}

/// Builds a model from a word stream.
///
/// Every word is recorded against the current context once the window is
/// full, then pushed into the window.
pub fn learn_stream<R: BufRead>(reader: R, order: usize) -> io::Result<Model> {
	let mut model = Model::new();
	let mut window = ContextWindow::new(order);

	for word in Words::new(reader) {
		let word = word?;
		if window.is_full() {
			model.record(&window.key(), &word);
		}
		window.push(word);
	}

	Ok(model)
}

/// Learns a partial model from a single URL.
///
/// # Errors
/// Any failure (stream not opened, read error, downloader exit status) is a
/// `MarkovError::SourceFailed` carrying the URL; the partial model is dropped.
pub fn learn_source<F: Fetch + ?Sized>(fetcher: &F, url: &str, order: usize) -> Result<Model> {
	let started = Instant::now();
	let reader = fetcher.open(url)?;
	let model = learn_stream(BufReader::new(reader), order).map_err(|e| MarkovError::source_failed(url, e))?;
	debug!(
		"Learned '{}': {} contexts, {} observations in {:?}",
		url,
		model.len(),
		model.total_observations(),
		started.elapsed()
	);
	Ok(model)
}

/// Learns every URL concurrently and folds the partial models.
///
/// One thread is spawned per URL. Results are collected over a channel as
/// they complete: the first success becomes the aggregate, later successes
/// are merged into it, failures are logged and skipped. Since merging is
/// commutative and associative the aggregate does not depend on the
/// completion order.
///
/// # Errors
/// - `MarkovError::Configuration` if `urls` is empty or the options are invalid
/// - `MarkovError::AllSourcesFailed` if no source could be learned
pub fn learn(fetcher: Arc<dyn Fetch>, urls: &[String], options: &LearnOptions) -> Result<Learned> {
	options.validate()?;
	if urls.is_empty() {
		return Err(MarkovError::Configuration("no source URL to learn from".to_owned()));
	}

	info!("Learning {} source(s) with order {}", urls.len(), options.order);
	let started = Instant::now();

	let mut failures = Vec::new();
	let mut workers = Vec::with_capacity(urls.len());

	let (tx, rx) = mpsc::channel();
	for (index, url) in urls.iter().enumerate() {
		let tx = tx.clone();
		let fetcher = Arc::clone(&fetcher);
		let thread_url = url.clone();
		let order = options.order;

		let spawned = thread::Builder::new().name(format!("learn-{index}")).spawn(move || {
			let result = learn_source(fetcher.as_ref(), &thread_url, order);
			// The receiver outlives every worker
			let _ = tx.send((thread_url, result));
		});

		match spawned {
			Ok(handle) => workers.push((url.clone(), handle)),
			Err(e) => failures.push(SourceFailure { url: url.clone(), error: MarkovError::source_failed(url, e) }),
		}
	}
	drop(tx);

	let mut aggregate: Option<Model> = None;
	let mut succeeded = 0;
	for (url, result) in rx.iter() {
		match result {
			Ok(partial) => {
				succeeded += 1;
				debug!("Folding '{}' ({} contexts)", url, partial.len());
				if let Some(model) = aggregate.as_mut() {
					model.merge(&partial);
				} else {
					aggregate = Some(partial);
				}
			}
			Err(error) => {
				warn!("Skipping source: {}", error);
				failures.push(SourceFailure { url, error });
			}
		}
	}

	for (url, handle) in workers {
		if handle.join().is_err() {
			let error = MarkovError::source_failed(&url, io::Error::other("learning thread panicked"));
			warn!("Skipping source: {}", error);
			failures.push(SourceFailure { url, error });
		}
	}

	let Some(model) = aggregate else {
		return Err(MarkovError::AllSourcesFailed { attempted: urls.len() });
	};

	info!(
		"Learned {} of {} source(s): {} contexts in {:?}",
		succeeded,
		urls.len(),
		model.len(),
		started.elapsed()
	);
	Ok(Learned { model, succeeded, failures })
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn order_one_counts_following_words() {
		let model = learn_stream("the cat sat on the mat".as_bytes(), 1).unwrap();

		let the = model.get("the").unwrap();
		assert_eq!(the.total(), 2);
		assert_eq!(the.count("cat"), 1);
		assert_eq!(the.count("mat"), 1);
		assert_eq!(model.len(), 4);
		assert!(model.get("mat").is_none());
	}

	#[test]
	fn order_two_uses_joined_keys() {
		let model = learn_stream("a b c a b d".as_bytes(), 2).unwrap();

		let ab = model.get("a_b").unwrap();
		assert_eq!(ab.total(), 2);
		assert_eq!(ab.count("c"), 1);
		assert_eq!(ab.count("d"), 1);
		assert_eq!(model.get("b_c").map(|t| t.count("a")), Some(1));
		assert_eq!(model.get("c_a").map(|t| t.count("b")), Some(1));
		assert_eq!(model.len(), 3);
	}

	#[test]
	fn short_stream_records_nothing() {
		assert!(learn_stream("only".as_bytes(), 1).unwrap().is_empty());
		assert!(learn_stream("two words".as_bytes(), 2).unwrap().is_empty());
		assert!(learn_stream("".as_bytes(), 1).unwrap().is_empty());
	}

	#[test]
	fn zero_order_is_rejected() {
		assert!(matches!(LearnOptions { order: 0 }.validate(), Err(MarkovError::Configuration(_))));
		assert!(LearnOptions::default().validate().is_ok());
	}
}
