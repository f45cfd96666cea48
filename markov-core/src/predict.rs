use std::time::Instant;

use log::{debug, info, warn};
use rand::Rng;

use crate::error::{MarkovError, Result};
use crate::model::chain::Model;
use crate::model::context::{ContextWindow, SEPARATOR};
use crate::model::transitions::SamplingRule;
use crate::tokenizer::tokenize;

/// Strategy used to prime the context window before sampling.
///
/// # Variants
/// - `Empty`: start from an empty window; its key never matches, so nothing
///   is predicted unless the model has been primed otherwise.
/// - `Continuation(text)`: tokenize `text` like learning input and keep its
///   trailing `order` words.
/// - `Random`: start from a context key drawn uniformly from the model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Seed {
	#[default]
	Empty,
	Continuation(String),
	Random,
}

/// Parameters of a prediction run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredictOptions {
	/// Number of preceding words forming a context. Must match the order the
	/// model was learned with.
	pub order: usize,
	/// Maximum number of words to emit.
	pub count: usize,
	pub seed: Seed,
	pub rule: SamplingRule,
}

impl Default for PredictOptions {
	fn default() -> Self {
		Self { order: 1, count: 1, seed: Seed::Empty, rule: SamplingRule::Inclusive }
	}
}

impl PredictOptions {
	/// # Errors
	/// Returns `MarkovError::Configuration` if `order` is zero.
	pub fn validate(&self) -> Result<()> {
		if self.order == 0 {
			return Err(MarkovError::Configuration("order must be >= 1".to_owned()));
		}
		Ok(())
	}

	fn initial_window<R: Rng + ?Sized>(&self, model: &Model, rng: &mut R) -> ContextWindow {
		match &self.seed {
			Seed::Empty => ContextWindow::new(self.order),
			Seed::Continuation(text) => ContextWindow::with_tokens(self.order, tokenize(text)),
			Seed::Random => match model.random_key(rng) {
				Some(key) => ContextWindow::with_tokens(self.order, key.split(SEPARATOR)),
				None => ContextWindow::new(self.order),
			},
		}
	}
}

/// Generates up to `options.count` words from `model`.
///
/// Each step samples the word following the window's key, emits it and pushes
/// it into the window. Generation stops early, without error, as soon as the
/// current context has no prediction. The model is never modified.
///
/// # Errors
/// Returns `MarkovError::Configuration` if the options are invalid.
pub fn predict<R: Rng + ?Sized>(model: &Model, options: &PredictOptions, rng: &mut R) -> Result<Vec<String>> {
	options.validate()?;
	if let Some(width) = model.order_hint() {
		if width != options.order {
			warn!("Model contexts hold {} word(s) but order {} was requested", width, options.order);
		}
	}

	let started = Instant::now();
	let mut window = options.initial_window(model, rng);
	debug!("Starting from context '{}'", window.key());

	let mut words = Vec::new();
	while words.len() < options.count {
		let Some(next) = model.sample(&window.key(), rng, options.rule) else {
			debug!("No prediction for '{}', stopping after {} word(s)", window.key(), words.len());
			break;
		};
		let next = next.to_owned();
		window.push(next.clone());
		words.push(next);
	}

	info!("Predicted {} of {} word(s) in {:?}", words.len(), options.count, started.elapsed());
	Ok(words)
}
