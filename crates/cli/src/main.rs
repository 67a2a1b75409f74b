//! tirpk: builds and validates TI-99/4A RPK cartridge containers from
//! software list entries.

mod cli;
mod config;
mod report;
mod run;


use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;
use crate::config::Settings;
use crate::run::Outcome;

/// Environment variable redirecting logs to a per-process file.
const LOG_DIR_ENV: &str = "TIRPK_LOG_DIR";

fn main() -> ExitCode {
	let cli = Cli::parse();
	let settings = match Settings::load(cli.config.as_deref()) {
		Ok(settings) => settings,
		Err(err) => {
			eprintln!("error: {err:#}");
			return ExitCode::from(2);
		}
	};
	setup_tracing(cli.verbose, settings.log.as_deref());

	match run::run(&cli, &settings, &mut stdout().lock()) {
		Ok(Outcome::Success) => ExitCode::SUCCESS,
		Ok(Outcome::Failed) => ExitCode::FAILURE,
		Err(err) => {
			tracing::error!(error = %format!("{err:#}"), "run aborted");
			eprintln!("error: {err:#}");
			ExitCode::from(2)
		}
	}
}

fn setup_tracing(verbose: bool, configured: Option<&str>) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| match configured {
			Some(directives) => EnvFilter::new(directives),
			None if verbose => EnvFilter::new("debug"),
			None => EnvFilter::new("warn"),
		})
	};

	if let Some(log_dir) = std::env::var(LOG_DIR_ENV).ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("tirpk.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}
