use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use log::debug;
use reqwest::blocking::Client;

use crate::error::{MarkovError, Result};

/// Turns a URL into a readable stream of the resource body.
///
/// Implementations are shared by every learning thread, hence `Send + Sync`.
/// Failures must be reported as `MarkovError::SourceFailed`; failures noticed
/// while the stream is read are reported by the stream as `io::Error`.
pub trait Fetch: Send + Sync {
	fn open(&self, url: &str) -> Result<Box<dyn Read + Send>>;
}

/// Opens `file://` URLs and bare paths from the local filesystem.
///
/// Returns `None` when `url` names a remote resource. A string without a
/// scheme is only read as a path if that path exists.
fn open_local(url: &str) -> Option<Result<Box<dyn Read + Send>>> {
	let path = match url.strip_prefix("file://") {
		Some(path) => path,
		None if !url.contains("://") => {
			if !Path::new(url).exists() {
				let cause = io::Error::new(
					io::ErrorKind::InvalidInput,
					"neither a URL with a scheme (http://, file://, ...) nor an existing file",
				);
				return Some(Err(MarkovError::source_failed(url, cause)));
			}
			debug!("Reading '{}' as a local path", url);
			url
		}
		None => return None,
	};
	Some(match File::open(path) {
		Ok(file) => Ok(Box::new(file)),
		Err(e) => Err(MarkovError::source_failed(url, e)),
	})
}

/// Native HTTP downloader backed by a blocking `reqwest` client.
///
/// Non-success HTTP statuses are fetch errors. No request timeout is set,
/// so a stalled source stalls the whole learn job.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
	client: Client,
}

impl HttpFetcher {
	pub fn new() -> Result<Self> {
		let client = Client::builder()
			.timeout(None)
			.build()
			.map_err(|e| MarkovError::Stream(io::Error::other(format!("can't build HTTP client: {e}"))))?;
		Ok(Self { client })
	}
}

impl Fetch for HttpFetcher {
	fn open(&self, url: &str) -> Result<Box<dyn Read + Send>> {
		if let Some(local) = open_local(url) {
			return local;
		}
		let response = self
			.client
			.get(url)
			.send()
			.and_then(|response| response.error_for_status())
			.map_err(|e| MarkovError::source_failed(url, io::Error::other(e)))?;
		Ok(Box::new(response))
	}
}

/// Downloader delegating to the `curl` executable.
///
/// The body is streamed from curl's stdout; a non-zero exit status is
/// reported as a read error once the stream is exhausted.
#[derive(Clone, Debug, Default)]
pub struct CurlFetcher;

impl Fetch for CurlFetcher {
	fn open(&self, url: &str) -> Result<Box<dyn Read + Send>> {
		if let Some(local) = open_local(url) {
			return local;
		}
		let mut child = Command::new("curl")
			.args(["-s", "-f", "-L", url, "-o", "-"])
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.spawn()
			.map_err(|e| MarkovError::source_failed(url, e))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| MarkovError::source_failed(url, io::Error::other("curl stdout unavailable")))?;
		Ok(Box::new(CurlReader { child, stdout, finished: false }))
	}
}

struct CurlReader {
	child: Child,
	stdout: ChildStdout,
	finished: bool,
}

impl Read for CurlReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let n = self.stdout.read(buf)?;
		if n == 0 && !buf.is_empty() && !self.finished {
			self.finished = true;
			let status = self.child.wait()?;
			if !status.success() {
				return Err(io::Error::other(format!("curl exited with {status}")));
			}
		}
		Ok(n)
	}
}

impl Drop for CurlReader {
	fn drop(&mut self) {
		if !self.finished {
			let _ = self.child.kill();
			let _ = self.child.wait();
		}
	}
}
