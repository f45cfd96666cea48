use std::collections::VecDeque;

/// Character joining the words of a context key.
///
/// Tokens are alphabetic runs, so this never appears inside one.
pub const SEPARATOR: char = '_';

/// Fixed-capacity FIFO of the last `order` words seen.
///
/// The window only produces a usable key once it is full; before that
/// `key()` is the empty string, which never indexes a model entry.
///
/// ## Invariants
/// - `tokens.len() <= order` after every push
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextWindow {
	tokens: VecDeque<String>,
	order: usize,
}

impl ContextWindow {
	/// Creates an empty window of capacity `order`.
	pub fn new(order: usize) -> Self {
		Self { tokens: VecDeque::with_capacity(order), order }
	}

	/// Creates a window of capacity `order` primed with `tokens`.
	///
	/// Only the trailing `order` tokens are kept. With fewer than `order`
	/// tokens the window is not full and its key stays empty.
	pub fn with_tokens<I, S>(order: usize, tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut window = Self::new(order);
		for token in tokens {
			window.push(token);
		}
		window
	}

	/// Appends a word, evicting the oldest one if the window is at capacity.
	pub fn push(&mut self, token: impl Into<String>) {
		if self.order == 0 {
			return;
		}
		if self.tokens.len() == self.order {
			self.tokens.pop_front();
		}
		self.tokens.push_back(token.into());
	}

	/// True iff the window holds exactly `order` words.
	pub fn is_full(&self) -> bool {
		self.tokens.len() == self.order
	}

	/// Renders the held words joined by `SEPARATOR`, or `""` if not full.
	pub fn key(&self) -> String {
		if !self.is_full() {
			return String::new();
		}
		let mut key = String::new();
		for (i, token) in self.tokens.iter().enumerate() {
			if i > 0 {
				key.push(SEPARATOR);
			}
			key.push_str(token);
		}
		key
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}
