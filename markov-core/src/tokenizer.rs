use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Lazy sequence of normalized words read from a byte stream.
///
/// A word is a maximal run of alphabetic characters, lower-cased. Every
/// other character is a separator and is dropped.
///
/// # Notes
/// - The stream is consumed one line at a time, so memory stays bounded by
///   the longest line rather than the whole source.
/// - Invalid UTF-8 is replaced, never rejected; the replacement character is
///   not alphabetic and therefore splits words.
/// - Read errors are yielded once, after which the iterator is exhausted.
pub struct Words<R> {
	reader: R,
	line: Vec<u8>,
	pending: VecDeque<String>,
	done: bool,
}

impl<R: BufRead> Words<R> {
	pub fn new(reader: R) -> Self {
		Self { reader, line: Vec::new(), pending: VecDeque::new(), done: false }
	}

	/// Reads lines until at least one word is buffered or the stream ends.
	fn fill(&mut self) -> io::Result<()> {
		while self.pending.is_empty() && !self.done {
			self.line.clear();
			if self.reader.read_until(b'\n', &mut self.line)? == 0 {
				self.done = true;
				break;
			}
			let text = String::from_utf8_lossy(&self.line);
			self.pending.extend(split_words(&text));
		}
		Ok(())
	}
}

impl<R: BufRead> Iterator for Words<R> {
	type Item = io::Result<String>;

	fn next(&mut self) -> Option<Self::Item> {
		if let Err(e) = self.fill() {
			self.done = true;
			self.pending.clear();
			return Some(Err(e));
		}
		self.pending.pop_front().map(Ok)
	}
}

/// Tokenizes an in-memory text with the same rules as [`Words`].
pub fn tokenize(text: &str) -> Vec<String> {
	split_words(text).collect()
}

fn split_words(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split(|c: char| !c.is_alphabetic())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::{BufReader, Read};

	fn words(input: &[u8]) -> Vec<String> {
		Words::new(input).collect::<io::Result<Vec<_>>>().unwrap()
	}

	#[test]
	fn splits_on_non_alphabetic_and_lowercases() {
		assert_eq!(
			words(b"The cat, sat on\nthe MAT... 42 times!"),
			vec!["the", "cat", "sat", "on", "the", "mat", "times"]
		);
	}

	#[test]
	fn empty_and_separator_only_streams_yield_nothing() {
		assert!(words(b"").is_empty());
		assert!(words(b"  123 -- !!\n\n").is_empty());
	}

	#[test]
	fn digits_and_underscores_split_words() {
		assert_eq!(words(b"snake_case abc123def"), vec!["snake", "case", "abc", "def"]);
	}

	#[test]
	fn handles_unicode_letters() {
		assert_eq!(words("Ça VA, Straße".as_bytes()), vec!["ça", "va", "straße"]);
	}

	#[test]
	fn tokenize_matches_stream_rules() {
		assert_eq!(tokenize("Hello, World"), vec!["hello", "world"]);
	}

	struct FailingReader;

	impl Read for FailingReader {
		fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
			Err(io::Error::other("connection reset"))
		}
	}

	#[test]
	fn read_errors_are_yielded_once() {
		let mut words = Words::new(BufReader::new(FailingReader));
		assert!(matches!(words.next(), Some(Err(_))));
		assert!(words.next().is_none());
	}
}
