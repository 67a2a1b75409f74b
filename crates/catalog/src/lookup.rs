//! Identifying a title from the files at hand.
//!
//! A file matches a part exactly when the sizes agree and every checksum the
//! part declares agrees; it matches by size only when just the size agrees.
//!
//! # Ranking
//!
//! Titles without a single exact match are never candidates. The rest are
//! ordered, best first, by:
//!
//! 1. every declared part matched exactly,
//! 2. part count equal to the number of observed files,
//! 3. more exact matches,
//! 4. more size-only matches,
//! 5. title name, ascending.

use std::cmp::Ordering;

use crate::checksum::Checksum;
use crate::model::Title;
use crate::Catalog;

/// A file offered for identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedFile {
	pub name: String,
	pub size: u64,
	pub checksum: Checksum,
}

impl ObservedFile {
	/// Hashes `data` under `name`.
	pub fn of(name: impl Into<String>, data: &[u8]) -> Self {
		Self {
			name: name.into(),
			size: data.len() as u64,
			checksum: Checksum::of(data),
		}
	}
}

/// The best title for a set of observed files.
#[derive(Debug, Clone, Copy)]
pub struct ContentMatch<'a> {
	pub title: &'a Title,
	/// Parts matched by size and checksum.
	pub exact: usize,
	/// Parts matched by size alone.
	pub size_only: usize,
}

impl ContentMatch<'_> {
	/// Returns true when every declared part was matched exactly.
	pub fn is_complete(&self) -> bool {
		self.exact == self.title.part_count()
	}

	fn rank(&self, observed: usize) -> (bool, bool, usize, usize) {
		(
			self.is_complete(),
			self.title.part_count() == observed,
			self.exact,
			self.size_only,
		)
	}
}

impl Catalog {
	/// Finds the title that best explains `observed`, or `None` when no
	/// title shares a single checksum with it.
	pub fn find_by_content(&self, observed: &[ObservedFile]) -> Option<ContentMatch<'_>> {
		let best = self
			.titles()
			.filter_map(|title| score(title, observed))
			.max_by(|a, b| compare(a, b, observed.len()));
		if let Some(best) = &best {
			tracing::debug!(
				title = %best.title.name,
				exact = best.exact,
				size_only = best.size_only,
				"identified title by content"
			);
		}
		best
	}
}

fn score<'a>(title: &'a Title, observed: &[ObservedFile]) -> Option<ContentMatch<'a>> {
	let mut exact = 0;
	let mut size_only = 0;
	for (_, part) in title.parts() {
		let same_size = |file: &&ObservedFile| file.size == u64::from(part.size);
		if observed.iter().filter(same_size).any(|file| part.checksum.agrees_with(&file.checksum)) {
			exact += 1;
		} else if observed.iter().any(|file| same_size(&file)) {
			size_only += 1;
		}
	}
	(exact > 0).then_some(ContentMatch { title, exact, size_only })
}

/// Orders candidates so that the best one is the maximum.
fn compare(a: &ContentMatch<'_>, b: &ContentMatch<'_>, observed: usize) -> Ordering {
	a.rank(observed)
		.cmp(&b.rank(observed))
		.then_with(|| b.title.name.cmp(&a.title.name))
}
