//! ROM zips as content providers.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tirpk_matcher::{ContentError, ContentProvider};
use zip::ZipArchive;

use crate::error::{Result, RpkError};

/// Serves the entries of a ROM zip by file name.
///
/// Entries in subdirectories are served under their last path component;
/// when two entries share it, the first one wins.
pub struct ZipContent<R> {
	archive: ZipArchive<R>,
	entries: BTreeMap<String, usize>,
}

impl ZipContent<BufReader<File>> {
	pub fn open(path: &Path) -> Result<Self> {
		let file = File::open(path).map_err(|error| RpkError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let content = Self::new(BufReader::new(file))?;
		tracing::debug!(path = %path.display(), entries = content.entries.len(), "opened rom zip");
		Ok(content)
	}
}

impl<R: Read + Seek> ZipContent<R> {
	pub fn new(reader: R) -> Result<Self> {
		let mut archive = ZipArchive::new(reader)?;
		let mut entries = BTreeMap::new();
		for index in 0..archive.len() {
			let file = archive.by_index(index)?;
			if file.is_dir() {
				continue;
			}
			let name = file.name().rsplit('/').next().unwrap_or_default().to_string();
			if entries.contains_key(&name) {
				tracing::warn!(entry = %file.name(), "duplicate entry name ignored");
				continue;
			}
			entries.insert(name, index);
		}
		Ok(Self { archive, entries })
	}
}

impl<R: Read + Seek> ContentProvider for ZipContent<R> {
	fn fetch(&mut self, name: &str) -> std::result::Result<Option<Vec<u8>>, ContentError> {
		let Some(&index) = self.entries.get(name) else {
			return Ok(None);
		};
		let read_error = |source: Box<dyn std::error::Error + Send + Sync>| ContentError::Read {
			name: name.to_string(),
			source,
		};
		let mut file = self.archive.by_index(index).map_err(|err| read_error(err.into()))?;
		let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
		file.read_to_end(&mut data).map_err(|err| read_error(err.into()))?;
		Ok(Some(data))
	}

	fn names(&self) -> Vec<String> {
		self.entries.keys().cloned().collect()
	}
}
