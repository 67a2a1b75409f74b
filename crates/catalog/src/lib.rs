//! TI-99/4A software list model.
//!
//! Loads a MAME software list (`ti99_cart.xml`) into a [`Catalog`] of
//! [`Title`]s. Each title holds its board token and its data areas, and each
//! area the declared [`Part`]s with their sizes, offsets and checksums.
//!
//! ```xml
//! <softwarelist name="ti99_cart">
//!   <software name="alpiner">
//!     <description>Alpiner</description>
//!     <info name="serial" value="PHM 3056"/>
//!     <part name="cart" interface="ti99_cart">
//!       <feature name="pcb" value="standard"/>
//!       <dataarea name="grom" size="0x6000">
//!         <rom name="phm3056g.bin" size="0x6000" crc="..." sha1="..." offset="0x0000"/>
//!       </dataarea>
//!     </part>
//!   </software>
//! </softwarelist>
//! ```
//!
//! Broken entries are skipped and recorded in [`Catalog::warnings`]; only
//! malformed XML or a list without any usable entry fails the load.

mod builder;
pub mod checksum;
pub mod error;
pub mod lookup;
pub mod model;
mod parse;

use std::collections::BTreeMap;
use std::path::Path;

pub use checksum::{Checksum, Crc32, Sha1Digest};
pub use error::{CatalogError, CatalogWarning, EntryError, Result};
pub use lookup::{ContentMatch, ObservedFile};
pub use model::{AreaKind, DataArea, Part, Title};
pub use parse::parse_number;

/// A parsed software list. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	list_name: Option<String>,
	titles: BTreeMap<String, Title>,
	warnings: Vec<CatalogWarning>,
}

impl Catalog {
	/// Parses a software list document.
	pub fn parse(xml: &str) -> Result<Self> {
		parse::parse_catalog(xml)
	}

	/// Reads and parses a software list file.
	pub fn load(path: &Path) -> Result<Self> {
		let xml = std::fs::read_to_string(path).map_err(|error| CatalogError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let catalog = Self::parse(&xml)?;
		tracing::debug!(
			path = %path.display(),
			titles = catalog.len(),
			warnings = catalog.warnings.len(),
			"loaded software list"
		);
		Ok(catalog)
	}

	/// The `name` attribute of the list root, if any.
	pub fn list_name(&self) -> Option<&str> {
		self.list_name.as_deref()
	}

	pub fn get(&self, name: &str) -> Option<&Title> {
		self.titles.get(name)
	}

	/// Titles sorted by name.
	pub fn titles(&self) -> impl Iterator<Item = &Title> {
		self.titles.values()
	}

	pub fn len(&self) -> usize {
		self.titles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.titles.is_empty()
	}

	/// Non-fatal problems met while loading.
	pub fn warnings(&self) -> &[CatalogWarning] {
		&self.warnings
	}
}
