//! Text persistence of a [`Model`].
//!
//! ```text
//! <contextCount>
//! <contextKey> <n> <distinctNextCount> <next1> <count1> <next2> <count2> ...
//! ```
//!
//! One record per line, fields separated by whitespace. Records are written
//! in ascending key order so the same model always produces the same bytes.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{MarkovError, Result};

use super::chain::Model;
use super::transitions::TransitionTable;

impl Model {
	/// Writes the model in its text format.
	pub fn save<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
		writeln!(writer, "{}", self.transitions.len())?;

		let mut keys: Vec<&String> = self.transitions.keys().collect();
		keys.sort_unstable();

		for key in keys {
			let table = &self.transitions[key];
			write!(writer, "{} {} {}", key, table.total(), table.len())?;
			for (next, count) in table.iter() {
				write!(writer, " {} {}", next, count)?;
			}
			writeln!(writer)?;
		}
		writer.flush()
	}

	/// Reads a model written by [`Model::save`].
	///
	/// The whole input is validated; nothing is returned unless every record
	/// is well-formed.
	///
	/// # Errors
	/// - `MarkovError::Format` if a count does not match the fields present,
	///   a number is not a non-negative integer, a total differs from the sum
	///   of its counts, or a context key appears twice
	/// - `MarkovError::Stream` if reading fails
	pub fn load<R: BufRead>(reader: R) -> Result<Self> {
		let mut lines = reader.lines().enumerate();
		let mut next_line = || -> Result<Option<(usize, String)>> {
			for (index, line) in lines.by_ref() {
				let line = line?;
				if !line.trim().is_empty() {
					return Ok(Some((index + 1, line)));
				}
			}
			Ok(None)
		};

		let (header_no, header) = next_line()?.ok_or_else(|| MarkovError::format(1, "missing context count"))?;
		let mut fields = header.split_whitespace();
		let expected = parse_number(header_no, fields.next(), "context count")?;
		if fields.next().is_some() {
			return Err(MarkovError::format(header_no, "unexpected field after context count"));
		}

		let mut model = Model::new();
		let mut last_no = header_no;
		for found in 0..expected {
			let (line_no, line) = next_line()?.ok_or_else(|| {
				MarkovError::format(last_no, format!("expected {} context records, found {}", expected, found))
			})?;
			let (key, table) = parse_record(line_no, &line)?;
			if model.transitions.contains_key(&key) {
				return Err(MarkovError::format(line_no, format!("duplicate context '{}'", key)));
			}
			model.transitions.insert(key, table);
			last_no = line_no;
		}

		if let Some((line_no, _)) = next_line()? {
			return Err(MarkovError::format(
				line_no,
				format!("content after the declared {} context records", expected),
			));
		}

		Ok(model)
	}

	/// Saves the model to `path`, creating or truncating the file.
	pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let io_error = |source| MarkovError::Io { path: path.to_owned(), source };
		let file = File::create(path).map_err(io_error)?;
		self.save(BufWriter::new(file)).map_err(io_error)
	}

	/// Loads a model from `path`.
	pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).map_err(|source| MarkovError::Io { path: path.to_owned(), source })?;
		Self::load(BufReader::new(file)).map_err(|e| match e {
			MarkovError::Stream(source) => MarkovError::Io { path: path.to_owned(), source },
			other => other,
		})
	}
}

/// Parses `<key> <n> <distinct> (<next> <count>){distinct}`.
fn parse_record(line_no: usize, line: &str) -> Result<(String, TransitionTable)> {
	let mut fields = line.split_whitespace();

	let key = fields
		.next()
		.ok_or_else(|| MarkovError::format(line_no, "missing context key"))?
		.to_owned();
	let total = parse_number(line_no, fields.next(), "total count")?;
	let distinct = parse_number(line_no, fields.next(), "distinct count")?;

	let mut table = TransitionTable::new();
	for _ in 0..distinct {
		let next = fields
			.next()
			.ok_or_else(|| MarkovError::format(line_no, format!("'{}' declares {} entries, fewer present", key, distinct)))?;
		let count = parse_number(line_no, fields.next(), "transition count")?;
		if count == 0 {
			return Err(MarkovError::format(line_no, format!("zero count for '{}'", next)));
		}
		if table.count(next) > 0 {
			return Err(MarkovError::format(line_no, format!("duplicate entry '{}' in '{}'", next, key)));
		}
		table
			.record_many(next.to_owned(), count)
			.ok_or_else(|| MarkovError::format(line_no, format!("counts of '{}' overflow", key)))?;
	}

	if fields.next().is_some() {
		return Err(MarkovError::format(line_no, format!("'{}' has more entries than the {} declared", key, distinct)));
	}
	if table.total() != total {
		return Err(MarkovError::format(
			line_no,
			format!("'{}' declares total {} but its counts sum to {}", key, total, table.total()),
		));
	}

	Ok((key, table))
}

fn parse_number(line_no: usize, field: Option<&str>, what: &str) -> Result<u64> {
	let field = field.ok_or_else(|| MarkovError::format(line_no, format!("missing {}", what)))?;
	field
		.parse::<u64>()
		.map_err(|_| MarkovError::format(line_no, format!("{} '{}' is not a non-negative integer", what, field)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn sample_model() -> Model {
		let mut model = Model::new();
		for (key, next) in [("the", "cat"), ("cat", "sat"), ("sat", "on"), ("on", "the"), ("the", "mat")] {
			model.record(key, next);
		}
		model
	}

	fn saved(model: &Model) -> String {
		let mut bytes = Vec::new();
		model.save(&mut bytes).unwrap();
		String::from_utf8(bytes).unwrap()
	}

	fn load_str(text: &str) -> Result<Model> {
		Model::load(text.as_bytes())
	}

	#[test]
	fn save_writes_sorted_records() {
		assert_eq!(
			saved(&sample_model()),
			"4\ncat 1 1 sat 1\non 1 1 the 1\nsat 1 1 on 1\nthe 2 2 cat 1 mat 1\n"
		);
	}

	#[test]
	fn load_restores_saved_model() {
		let model = sample_model();
		let loaded = load_str(&saved(&model)).unwrap();
		assert_eq!(loaded, model);
	}

	#[test]
	fn empty_model_round_trips() {
		assert_eq!(saved(&Model::new()), "0\n");
		assert_eq!(load_str("0\n").unwrap(), Model::new());
	}

	#[test]
	fn load_accepts_trailing_spaces_and_blank_lines() {
		let model = load_str("1\nthe 2 2 cat 1 mat 1 \n\n").unwrap();
		assert_eq!(model.get("the").map(TransitionTable::total), Some(2));
	}

	#[test]
	fn load_rejects_missing_header() {
		assert!(matches!(load_str(""), Err(MarkovError::Format { line: 1, .. })));
	}

	#[test]
	fn load_rejects_non_numeric_fields() {
		assert!(matches!(load_str("x\n"), Err(MarkovError::Format { .. })));
		assert!(matches!(load_str("1\nthe two 1 cat 2\n"), Err(MarkovError::Format { line: 2, .. })));
		assert!(matches!(load_str("1\nthe 2 1 cat -2\n"), Err(MarkovError::Format { line: 2, .. })));
	}

	#[test]
	fn load_rejects_field_count_mismatch() {
		// fewer pairs than declared
		assert!(matches!(load_str("1\nthe 2 2 cat 2\n"), Err(MarkovError::Format { .. })));
		// more pairs than declared
		assert!(matches!(load_str("1\nthe 2 1 cat 1 mat 1\n"), Err(MarkovError::Format { .. })));
		// fewer records than declared
		assert!(matches!(load_str("2\nthe 1 1 cat 1\n"), Err(MarkovError::Format { .. })));
		// more records than declared
		assert!(matches!(load_str("1\nthe 1 1 cat 1\ncat 1 1 sat 1\n"), Err(MarkovError::Format { line: 3, .. })));
	}

	#[test]
	fn load_rejects_inconsistent_totals() {
		assert!(matches!(load_str("1\nthe 3 2 cat 1 mat 1\n"), Err(MarkovError::Format { .. })));
	}

	#[test]
	fn load_rejects_counts_overflowing_the_total() {
		assert!(matches!(
			load_str("1\nthe 2 2 a 18446744073709551615 b 3\n"),
			Err(MarkovError::Format { line: 2, .. })
		));
		assert!(matches!(
			load_str("1\nthe 18446744073709551615 1 a 18446744073709551615\n"),
			Ok(_)
		));
	}

	#[test]
	fn load_rejects_duplicates() {
		assert!(matches!(load_str("2\nthe 1 1 cat 1\nthe 1 1 mat 1\n"), Err(MarkovError::Format { line: 3, .. })));
		assert!(matches!(load_str("1\nthe 2 2 cat 1 cat 1\n"), Err(MarkovError::Format { .. })));
	}

	#[test]
	fn file_round_trip_and_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.txt");
		let model = sample_model();
		model.save_file(&path).unwrap();
		assert_eq!(Model::load_file(&path).unwrap(), model);

		let missing = dir.path().join("missing.txt");
		assert!(matches!(Model::load_file(&missing), Err(MarkovError::Io { .. })));
	}
}
