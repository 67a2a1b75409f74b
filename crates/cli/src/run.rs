//! The convert, validate and check pipelines.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, bail};
use tirpk_board::{Layout, resolve};
use tirpk_catalog::{Catalog, ObservedFile, Title};
use tirpk_matcher::{MatchReport, match_title, observe};
use tirpk_rpk::{AssembleOptions, RpkContainer, RpkContent, ZipContent, assemble};

use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::report::write_report;

/// States a run passes through. Any of them may end in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Start,
	CatalogLoaded,
	TitleIdentified,
	LayoutResolved,
	ContentMatched,
	Assembled,
	Validated,
	Done,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Stage::Start => "start",
			Stage::CatalogLoaded => "catalog loaded",
			Stage::TitleIdentified => "title identified",
			Stage::LayoutResolved => "layout resolved",
			Stage::ContentMatched => "content matched",
			Stage::Assembled => "assembled",
			Stage::Validated => "validated",
			Stage::Done => "done",
		})
	}
}

/// How a run that did not hit a fatal error ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Success,
	/// No title matched, or parts did not match; the report says why.
	Failed,
}

/// Runs the subcommand, printing reports to `out`.
///
/// Fatal errors carry the last stage the run reached.
pub fn run(cli: &Cli, settings: &Settings, out: &mut impl Write) -> anyhow::Result<Outcome> {
	let mut pipeline = Pipeline {
		settings,
		strict: cli.strict || settings.strict,
		out,
		stage: Stage::Start,
	};
	let result = match &cli.command {
		Command::Convert { catalog, zip, rpk, force } => pipeline.convert(catalog, zip, rpk, *force),
		Command::Validate { catalog, rpk } => pipeline.validate(catalog, rpk),
		Command::Check { catalog, zip } => pipeline.check(catalog, zip),
	};
	let stage = pipeline.stage;
	result.with_context(|| format!("failed after stage '{stage}'"))
}

struct Pipeline<'a, W> {
	settings: &'a Settings,
	strict: bool,
	out: &'a mut W,
	stage: Stage,
}

impl<W: Write> Pipeline<'_, W> {
	fn advance(&mut self, stage: Stage) {
		tracing::debug!(from = %self.stage, to = %stage, "stage");
		self.stage = stage;
	}

	fn convert(&mut self, catalog: &Path, zip: &Path, rpk: &Path, force: bool) -> anyhow::Result<Outcome> {
		let catalog = self.load_catalog(catalog)?;
		let mut content = ZipContent::open(zip)?;
		let Some(title) = self.identify_zip(&catalog, zip, &mut content)? else {
			return Ok(Outcome::Failed);
		};
		let layout = self.resolve(title)?;
		let report = match_title(title, &mut content)?;
		self.advance(Stage::ContentMatched);
		if !self.accept(title, &report, zip)? {
			return Ok(Outcome::Failed);
		}

		let options = AssembleOptions {
			compression_level: self.settings.compression_level,
		};
		let bytes = assemble(title, &layout, &report, &options)?;
		self.advance(Stage::Assembled);
		write_new(rpk, &bytes, force || self.settings.overwrite)?;
		writeln!(self.out, "{} written ok to {}", title.name, rpk.display())?;
		self.advance(Stage::Done);
		Ok(Outcome::Success)
	}

	fn check(&mut self, catalog: &Path, zip: &Path) -> anyhow::Result<Outcome> {
		let catalog = self.load_catalog(catalog)?;
		let mut content = ZipContent::open(zip)?;
		let Some(title) = self.identify_zip(&catalog, zip, &mut content)? else {
			return Ok(Outcome::Failed);
		};
		self.resolve(title)?;
		let report = match_title(title, &mut content)?;
		self.advance(Stage::ContentMatched);
		let accepted = self.accept(title, &report, zip)?;
		self.advance(Stage::Validated);
		self.advance(Stage::Done);
		Ok(if accepted { Outcome::Success } else { Outcome::Failed })
	}

	fn validate(&mut self, catalog: &Path, rpk: &Path) -> anyhow::Result<Outcome> {
		let catalog = self.load_catalog(catalog)?;
		let container = RpkContainer::open(rpk)?;

		let by_name = container
			.list_name
			.as_deref()
			.and_then(|name| catalog.get(name))
			.or_else(|| file_stem(rpk).and_then(|stem| catalog.get(stem)));
		let Some(title) = by_name.or_else(|| lookup(&catalog, &container.observed())) else {
			writeln!(self.out, "no matching title for {}", rpk.display())?;
			return Ok(Outcome::Failed);
		};
		self.advance(Stage::TitleIdentified);

		let layout = self.resolve(title)?;
		let mut content = RpkContent::new(&container, title, &layout)?;
		let report = match_title(title, &mut content)?;
		self.advance(Stage::ContentMatched);
		let accepted = self.accept(title, &report, rpk)?;
		self.advance(Stage::Validated);
		self.advance(Stage::Done);
		Ok(if accepted { Outcome::Success } else { Outcome::Failed })
	}

	fn load_catalog(&mut self, path: &Path) -> anyhow::Result<Catalog> {
		let catalog = Catalog::load(path)?;
		for warning in catalog.warnings() {
			tracing::warn!(%warning, "software list entry");
		}
		self.advance(Stage::CatalogLoaded);
		Ok(catalog)
	}

	/// Picks the title named by the zip's file stem, else the one its
	/// content matches best.
	fn identify_zip<'c, R>(
		&mut self,
		catalog: &'c Catalog,
		zip: &Path,
		content: &mut ZipContent<R>,
	) -> anyhow::Result<Option<&'c Title>>
	where
		R: std::io::Read + std::io::Seek,
	{
		let title = match file_stem(zip).and_then(|stem| catalog.get(stem)) {
			Some(title) => Some(title),
			None => lookup(catalog, &observe(content)?),
		};
		match title {
			Some(title) => {
				tracing::debug!(title = %title.name, "identified title");
				self.advance(Stage::TitleIdentified);
			}
			None => writeln!(self.out, "no matching title for {}", zip.display())?,
		}
		Ok(title)
	}

	fn resolve(&mut self, title: &Title) -> anyhow::Result<Layout> {
		let layout = resolve(&title.pcb).with_context(|| format!("cannot lay out {}", title.name))?;
		self.advance(Stage::LayoutResolved);
		Ok(layout)
	}

	/// Prints the report. Returns whether the content is good enough to
	/// proceed.
	fn accept(&mut self, title: &Title, report: &MatchReport, source: &Path) -> anyhow::Result<bool> {
		write_report(&mut *self.out, title, report)?;
		if !report.all_matched() {
			return Ok(false);
		}
		if self.strict && !report.extras.is_empty() {
			writeln!(self.out, "extra content is not allowed in strict mode")?;
			return Ok(false);
		}
		writeln!(self.out, "{} loaded ok from {}", title.name, source.display())?;
		Ok(true)
	}
}

fn file_stem(path: &Path) -> Option<&str> {
	path.file_stem().and_then(|stem| stem.to_str())
}

fn lookup<'c>(catalog: &'c Catalog, observed: &[ObservedFile]) -> Option<&'c Title> {
	catalog.find_by_content(observed).map(|found| found.title)
}

/// Writes `bytes` to a new file at `path`, replacing an existing one only
/// when `overwrite` is set.
fn write_new(path: &Path, bytes: &[u8], overwrite: bool) -> anyhow::Result<()> {
	let opened = if overwrite {
		File::create(path)
	} else {
		OpenOptions::new().write(true).create_new(true).open(path)
	};
	let mut file = match opened {
		Ok(file) => file,
		Err(err) if err.kind() == ErrorKind::AlreadyExists => {
			bail!("{} already exists, use --force to replace it", path.display())
		}
		Err(err) => return Err(err).with_context(|| format!("failed to create {}", path.display())),
	};
	if let Err(err) = file.write_all(bytes) {
		drop(file);
		let _ = std::fs::remove_file(path);
		return Err(err).with_context(|| format!("failed to write {}", path.display()));
	}
	Ok(())
}
