//! CLI schema for the tirpk binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tirpk")]
#[command(about = "Use a TI-99/4A software list to create and validate RPK files")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Configuration file (defaults to $XDG_CONFIG_HOME/tirpk/config.toml)
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Fail when the input holds content no chip accounts for
	#[arg(long, global = true)]
	pub strict: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Build an RPK from a ROM zip
	Convert {
		/// Software list, usually ti99_cart.xml
		catalog: PathBuf,
		/// ROM zip to load
		zip: PathBuf,
		/// RPK file to create
		rpk: PathBuf,
		/// Replace an existing RPK
		#[arg(long)]
		force: bool,
	},
	/// Check an RPK against the software list
	Validate {
		/// Software list, usually ti99_cart.xml
		catalog: PathBuf,
		/// RPK file to check
		#[arg(short = 'c', long = "container", value_name = "RPK")]
		rpk: PathBuf,
	},
	/// Verify a ROM zip without writing anything
	Check {
		/// Software list, usually ti99_cart.xml
		catalog: PathBuf,
		/// ROM zip to load
		zip: PathBuf,
	},
}
