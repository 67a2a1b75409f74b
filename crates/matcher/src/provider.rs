//! Capability contract for content sources.

use std::collections::BTreeMap;

use thiserror::Error;

/// A content source failed while reading.
///
/// Absent content is not an error; providers report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ContentError {
	#[error("failed to read {name}: {source}")]
	Read {
		/// Entry being read.
		name: String,
		source: Box<dyn std::error::Error + Send + Sync>,
	},
}

/// Hands out chip dumps by entry name.
pub trait ContentProvider {
	/// Returns the bytes stored under `name`, or `None` when there are none.
	fn fetch(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContentError>;

	/// Every entry name the provider offers, in a stable order.
	fn names(&self) -> Vec<String>;
}

/// In-memory provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryContent {
	entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryContent {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `data` under `name`, replacing any previous entry.
	pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
		self.entries.insert(name.into(), data.into());
	}

	pub fn get(&self, name: &str) -> Option<&[u8]> {
		self.entries.get(name).map(Vec::as_slice)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl<N, D> FromIterator<(N, D)> for MemoryContent
where
	N: Into<String>,
	D: Into<Vec<u8>>,
{
	fn from_iter<I: IntoIterator<Item = (N, D)>>(iter: I) -> Self {
		let mut content = Self::new();
		for (name, data) in iter {
			content.insert(name, data);
		}
		content
	}
}

impl ContentProvider for MemoryContent {
	fn fetch(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContentError> {
		Ok(self.entries.get(name).cloned())
	}

	fn names(&self) -> Vec<String> {
		self.entries.keys().cloned().collect()
	}
}
