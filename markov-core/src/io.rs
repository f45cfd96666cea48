use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{MarkovError, Result};

/// Opens `path` for reading, or stdin when `path` is `None`.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
	match path {
		Some(path) => {
			let file = File::open(path).map_err(|source| MarkovError::Io { path: path.to_owned(), source })?;
			Ok(Box::new(BufReader::new(file)))
		}
		None => Ok(Box::new(io::stdin().lock())),
	}
}

/// Opens `path` for writing (created or truncated), or stdout when `path` is `None`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
	match path {
		Some(path) => {
			let file = File::create(path).map_err(|source| MarkovError::Io { path: path.to_owned(), source })?;
			Ok(Box::new(BufWriter::new(file)))
		}
		None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
	}
}

/// Reads a list of source URLs, one per line.
///
/// - Surrounding whitespace is trimmed
/// - Blank lines and lines starting with `#` are skipped
pub fn read_urls<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
	let mut urls = Vec::new();
	for line in reader.lines() {
		let line = line?;
		let url = line.trim();
		if url.is_empty() || url.starts_with('#') {
			continue;
		}
		urls.push(url.to_owned());
	}
	Ok(urls)
}

/// Reads the whole stream as text, replacing invalid UTF-8.
pub fn read_text<R: Read>(mut reader: R) -> io::Result<String> {
	let mut bytes = Vec::new();
	reader.read_to_end(&mut bytes)?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}
