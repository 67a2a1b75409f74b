//! Match results for single parts and for whole titles.

use std::fmt;

use thiserror::Error;
use tirpk_catalog::{AreaKind, Checksum, Crc32, Sha1Digest};

/// One way a part's content differs from its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
	/// The provider has nothing under the part's name.
	Missing,
	Size { expected: u64, actual: u64 },
	Sha1 { expected: Sha1Digest, actual: Sha1Digest },
	Crc { expected: Crc32, actual: Crc32 },
}

impl fmt::Display for Mismatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Mismatch::Missing => f.write_str("missing"),
			Mismatch::Size { expected, actual } => {
				write!(f, "wrong length {actual:#06x}, expected {expected:#06x}")
			}
			Mismatch::Sha1 { expected, actual } => write!(f, "wrong sha1 {actual}, expected {expected}"),
			Mismatch::Crc { expected, actual } => write!(f, "wrong crc32 {actual}, expected {expected}"),
		}
	}
}

/// Outcome of comparing one declared part with the content on offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
	pub part: String,
	pub area: AreaKind,
	/// Offset of the part within its data area.
	pub offset: u32,
	pub expected_size: u32,
	pub expected: Checksum,
	/// `None` when the content is missing.
	pub actual_size: Option<u64>,
	pub actual: Option<Checksum>,
	pub mismatches: Vec<Mismatch>,
	/// The verified bytes. Only kept for matched parts.
	pub data: Option<Vec<u8>>,
}

impl MatchResult {
	pub fn matched(&self) -> bool {
		self.mismatches.is_empty()
	}
}

/// Results for every declared part of a title, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
	pub title: String,
	pub results: Vec<MatchResult>,
	/// Names offered by the provider that no part claimed.
	pub extras: Vec<String>,
}

impl MatchReport {
	/// Returns true when every declared part matched.
	pub fn all_matched(&self) -> bool {
		self.results.iter().all(MatchResult::matched)
	}

	/// Returns true when every part matched and nothing else was offered.
	pub fn is_full_match(&self) -> bool {
		self.all_matched() && self.extras.is_empty()
	}

	pub fn mismatched(&self) -> impl Iterator<Item = &MatchResult> {
		self.results.iter().filter(|result| !result.matched())
	}

	/// Proof that every part matched, granting access to the verified bytes.
	pub fn verified(&self) -> Result<Verified<'_>, IncompleteMatch> {
		let mismatched = self.mismatched().count();
		if mismatched > 0 {
			return Err(IncompleteMatch {
				title: self.title.clone(),
				mismatched,
				total: self.results.len(),
			});
		}
		Ok(Verified { report: self })
	}
}

/// Content was requested from a report with unmatched parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {mismatched} of {total} parts did not match")]
pub struct IncompleteMatch {
	pub title: String,
	pub mismatched: usize,
	pub total: usize,
}

/// A report whose parts all matched.
#[derive(Debug, Clone, Copy)]
pub struct Verified<'a> {
	report: &'a MatchReport,
}

impl<'a> Verified<'a> {
	pub fn report(&self) -> &'a MatchReport {
		self.report
	}

	/// Verified parts with their bytes, in declaration order.
	pub fn parts(&self) -> impl Iterator<Item = (&'a MatchResult, &'a [u8])> {
		self.report
			.results
			.iter()
			.filter_map(|result| result.data.as_deref().map(|data| (result, data)))
	}
}
