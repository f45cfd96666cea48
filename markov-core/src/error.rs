use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarkovError>;

#[derive(Error, Debug)]
pub enum MarkovError {
	/// A single source could not be opened or failed while being read.
	#[error("Source '{url}' failed: {cause}")]
	SourceFailed {
		url: String,
		#[source]
		cause: std::io::Error,
	},

	#[error("Malformed model at line {line}: {message}")]
	Format { line: usize, message: String },

	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("All {attempted} source(s) failed, no model produced")]
	AllSourcesFailed { attempted: usize },

	#[error("I/O error: {0}")]
	Stream(#[from] std::io::Error),

	#[error("I/O error on '{}': {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl MarkovError {
	pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
		MarkovError::Format { line, message: message.into() }
	}

	pub(crate) fn source_failed(url: &str, cause: std::io::Error) -> Self {
		MarkovError::SourceFailed { url: url.to_owned(), cause }
	}
}
