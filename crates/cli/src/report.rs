//! Human readable match reports.

use std::io::{self, Write};

use tirpk_catalog::Title;
use tirpk_matcher::{MatchReport, MatchResult};

/// Prints one line per part, every mismatch with expected and actual
/// values, and the extra content found.
pub fn write_report(out: &mut impl Write, title: &Title, report: &MatchReport) -> io::Result<()> {
	match &title.description {
		Some(description) => writeln!(out, "{} ({description}), board {}", title.name, title.pcb)?,
		None => writeln!(out, "{}, board {}", title.name, title.pcb)?,
	}
	for result in &report.results {
		write_result(out, result)?;
	}
	for extra in &report.extras {
		writeln!(out, "warning: unexpected extra content {extra}")?;
	}
	let matched = report.results.iter().filter(|result| result.matched()).count();
	writeln!(out, "{matched} of {} parts matched", report.results.len())
}

fn write_result(out: &mut impl Write, result: &MatchResult) -> io::Result<()> {
	if result.matched() {
		return writeln!(out, "  ok        {} ({} @ {:#06x})", result.part, result.area, result.offset);
	}
	writeln!(out, "  MISMATCH  {} ({} @ {:#06x})", result.part, result.area, result.offset)?;
	for mismatch in &result.mismatches {
		writeln!(out, "            {mismatch}")?;
	}
	Ok(())
}
