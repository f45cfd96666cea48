use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use log::{LevelFilter, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use markov_core::fetch::{CurlFetcher, Fetch, HttpFetcher};
use markov_core::learn::{LearnOptions, learn};
use markov_core::predict::{PredictOptions, Seed, predict};
use markov_core::{MarkovError, Model, SamplingRule, io};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
	/// Build a model from a list of URLs
	Learn,
	/// Generate words from a saved model
	Predict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FetcherKind {
	/// Native HTTP client
	Http,
	/// Spawn the `curl` executable
	Curl,
}

#[derive(Parser, Debug)]
#[command(name = "markov-chain")]
#[command(version, about = "Markov chain utility.", long_about = None)]
#[command(after_help = "Examples:\n  \
	markov-chain -a learn -i files.txt -o markov_chain.txt -n 2\n  \
	markov-chain -a predict -m markov_chain.txt -n 2 -c 20 -i start.txt")]
struct Cli {
	/// 'learn' or 'predict' mode
	#[arg(short, long, value_enum)]
	action: Action,

	/// Input file: list of URLs (learn) or continuation text (predict); stdin if omitted
	#[arg(short, long)]
	input: Option<PathBuf>,

	/// Output file, stdout if omitted
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Order of the Markov chain
	#[arg(short = 'n', long, default_value_t = 1)]
	order: usize,

	/// Model file for the predict mode
	#[arg(short, long)]
	model: Option<PathBuf>,

	/// Count of words to predict
	#[arg(short, long, default_value_t = 1)]
	count: usize,

	/// Downloader used to fetch sources
	#[arg(long, value_enum, default_value_t = FetcherKind::Http)]
	fetcher: FetcherKind,

	/// Seed of the random generator, for reproducible predictions
	#[arg(long)]
	seed: Option<u64>,

	/// Start prediction from a random context of the model instead of the input
	#[arg(long)]
	random_start: bool,

	/// Sample strictly proportionally to counts
	#[arg(long)]
	unbiased: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Only log warnings and errors
	#[arg(short, long, conflicts_with = "verbose")]
	quiet: bool,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(&cli);

	let outcome = match cli.action {
		Action::Learn => run_learn(&cli),
		Action::Predict => run_predict(&cli),
	};

	match outcome {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			if let Some(message) = usage_error(&e) {
				Cli::command().error(ErrorKind::ValueValidation, message).exit();
			}
			eprintln!("Error: {e:#}");
			ExitCode::FAILURE
		}
	}
}

/// Returns the message of errors caused by the arguments themselves.
///
/// Those are reported with the usage screen and exit code 2, every other
/// failure with exit code 1.
fn usage_error(error: &anyhow::Error) -> Option<&str> {
	match error.downcast_ref::<MarkovError>() {
		Some(MarkovError::Configuration(message)) => Some(message.as_str()),
		_ => None,
	}
}

fn init_logging(cli: &Cli) {
	let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
	if cli.quiet {
		builder.filter_level(LevelFilter::Warn);
	} else if cli.verbose {
		builder.filter_level(LevelFilter::Debug);
	}
	// HTTP internals are only interesting when debugging them
	if !cli.verbose {
		builder.filter_module("reqwest", LevelFilter::Warn);
		builder.filter_module("hyper_util", LevelFilter::Warn);
	}
	builder.target(env_logger::Target::Stderr).init();
}

/// Names a file argument in error messages, `fallback` being the standard stream used without it.
fn describe(path: Option<&Path>, fallback: &str) -> String {
	match path {
		Some(path) => format!("'{}'", path.display()),
		None => fallback.to_owned(),
	}
}

fn run_learn(cli: &Cli) -> Result<()> {
	let options = LearnOptions { order: cli.order };
	options.validate()?;

	let input = io::open_input(cli.input.as_deref())?;
	let urls = io::read_urls(input).with_context(|| format!("Can't read URL list from {}", describe(cli.input.as_deref(), "stdin")))?;
	if urls.is_empty() {
		return Err(MarkovError::Configuration(format!("no URL found in {}", describe(cli.input.as_deref(), "stdin"))).into());
	}

	let fetcher: Arc<dyn Fetch> = match cli.fetcher {
		FetcherKind::Http => Arc::new(HttpFetcher::new()?),
		FetcherKind::Curl => Arc::new(CurlFetcher),
	};

	let learned = learn(fetcher, &urls, &options)?;
	if !learned.failures.is_empty() {
		warn!("{} of {} source(s) skipped", learned.failures.len(), urls.len());
	}

	// Opened after learning: a failed job must not truncate an existing output
	let mut output = io::open_output(cli.output.as_deref())?;
	learned
		.model
		.save(&mut output)
		.with_context(|| format!("Can't write model to {}", describe(cli.output.as_deref(), "stdout")))?;
	Ok(())
}

fn run_predict(cli: &Cli) -> Result<()> {
	let model_path = cli
		.model
		.as_deref()
		.ok_or_else(|| MarkovError::Configuration("--model is required in predict mode".to_owned()))?;

	let rule = if cli.unbiased { SamplingRule::Strict } else { SamplingRule::Inclusive };
	let mut options = PredictOptions { order: cli.order, count: cli.count, seed: Seed::Empty, rule };
	options.validate()?;

	let model = Model::load_file(model_path).with_context(|| format!("Can't load model '{}'", model_path.display()))?;
	options.seed = continuation(cli)?;

	let mut rng = match cli.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};
	let words = predict(&model, &options, &mut rng)?;

	let mut output = io::open_output(cli.output.as_deref())?;
	write_words(&mut output, &words)
		.with_context(|| format!("Can't write prediction to {}", describe(cli.output.as_deref(), "stdout")))?;
	Ok(())
}

/// Writes the words space-joined on one line; nothing at all when there is none.
fn write_words<W: Write>(mut output: W, words: &[String]) -> std::io::Result<()> {
	if !words.is_empty() {
		writeln!(output, "{}", words.join(" "))?;
	}
	output.flush()
}

/// Resolves the prediction start: random context, input file, piped stdin, or nothing.
fn continuation(cli: &Cli) -> Result<Seed> {
	if cli.random_start {
		return Ok(Seed::Random);
	}
	if cli.input.is_none() && std::io::stdin().is_terminal() {
		return Ok(Seed::Empty);
	}
	let input = io::open_input(cli.input.as_deref())?;
	let text = io::read_text(input).with_context(|| format!("Can't read continuation from {}", describe(cli.input.as_deref(), "stdin")))?;
	Ok(Seed::Continuation(text))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn defaults_match_documented_interface() {
		let cli = Cli::try_parse_from(["markov-chain", "-a", "learn"]).unwrap();
		assert_eq!(cli.action, Action::Learn);
		assert_eq!(cli.order, 1);
		assert_eq!(cli.count, 1);
		assert_eq!(cli.fetcher, FetcherKind::Http);
		assert!(cli.input.is_none() && cli.output.is_none() && cli.model.is_none());
	}

	#[test]
	fn short_options_are_recognized() {
		let cli = Cli::try_parse_from([
			"markov-chain", "-a", "predict", "-m", "model.txt", "-n", "2", "-c", "5", "-i", "in.txt", "-o", "out.txt",
		])
		.unwrap();
		assert_eq!(cli.action, Action::Predict);
		assert_eq!(cli.model, Some(PathBuf::from("model.txt")));
		assert_eq!((cli.order, cli.count), (2, 5));
	}

	#[test]
	fn words_are_space_joined() {
		let mut out = Vec::new();
		write_words(&mut out, &["the".to_owned(), "cat".to_owned()]).unwrap();
		assert_eq!(out, b"the cat\n");

		let mut out = Vec::new();
		write_words(&mut out, &[]).unwrap();
		assert!(out.is_empty());
	}

	#[test]
	fn only_configuration_errors_are_usage_errors() {
		let config = anyhow::Error::from(MarkovError::Configuration("order must be >= 1".to_owned()));
		assert_eq!(usage_error(&config), Some("order must be >= 1"));

		let client = anyhow::Error::from(MarkovError::Stream(std::io::Error::other("can't build HTTP client")));
		assert_eq!(usage_error(&client), None);

		let all_failed = anyhow::Error::from(MarkovError::AllSourcesFailed { attempted: 3 }).context("learning");
		assert_eq!(usage_error(&all_failed), None);
	}

	#[test]
	fn action_is_required_and_validated() {
		assert!(Cli::try_parse_from(["markov-chain"]).is_err());
		assert!(Cli::try_parse_from(["markov-chain", "-a", "train"]).is_err());
		assert!(Cli::try_parse_from(["markov-chain", "-a", "learn", "-n", "x"]).is_err());
	}
}
