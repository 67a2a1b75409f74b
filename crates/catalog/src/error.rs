//! Error and warning types for software list loading.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::checksum::ChecksumParseError;
use crate::model::AreaKind;

/// Fatal errors that abort loading a software list.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// The software list file could not be read.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The document is not well-formed XML.
	#[error("malformed software list at byte {position}: {message}")]
	Xml {
		/// Byte offset where the parser gave up.
		position: u64,
		message: String,
	},

	/// Every entry was skipped, or the list has none.
	#[error("software list has no usable entries ({skipped} skipped)")]
	NoValidEntries { skipped: usize },
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Problems confined to one `<software>` entry. The entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
	#[error("<{element}> is missing attribute '{attribute}'")]
	MissingAttribute { element: &'static str, attribute: &'static str },

	#[error("invalid number '{value}' in attribute '{attribute}'")]
	InvalidNumber { attribute: &'static str, value: String },

	#[error(transparent)]
	Checksum(#[from] ChecksumParseError),

	/// A dump without any checksum, typically `status="nodump"`.
	#[error("{part} has no checksum")]
	NoChecksum { part: String },

	#[error("missing pcb feature")]
	MissingPcb,

	#[error("no rom declared")]
	NoParts,

	#[error("unknown dataarea '{0}'")]
	UnknownArea(String),

	#[error("part interface '{interface}' is not ti99_cart")]
	ForeignInterface { interface: String },

	#[error("rom {part} outside dataarea")]
	RomOutsideArea { part: String },

	#[error("invalid {area} dataarea size {size:#06x}")]
	AreaSize { area: AreaKind, size: u32 },

	#[error("redeclared dataarea {area} with size {size:#06x} (was {previous:#06x})")]
	AreaRedeclared { area: AreaKind, size: u32, previous: u32 },

	#[error("{part} is empty")]
	EmptyPart { part: String },

	#[error("{part} at {offset:#06x}+{size:#06x} is outside {area} dataarea of {area_size:#06x}")]
	PartOutOfRange {
		part: String,
		area: AreaKind,
		offset: u32,
		size: u32,
		area_size: u32,
	},

	#[error("overlapping roms {part} and {other}")]
	Overlap { part: String, other: String },

	#[error("invalid GROM size {size:#06x} for {part}")]
	GromPartSize { part: String, size: u32 },

	#[error("invalid GROM offset {offset:#06x} for {part}")]
	GromOffset { part: String, offset: u32 },
}

/// Non-fatal problems collected while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
	/// An entry was dropped.
	Skipped { name: String, error: EntryError },
	/// A later entry replaced an earlier one with the same name.
	Duplicate { name: String },
}

impl fmt::Display for CatalogWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CatalogWarning::Skipped { name, error } => write!(f, "skipped {name}: {error}"),
			CatalogWarning::Duplicate { name } => write!(f, "duplicate entry {name}, keeping the last one"),
		}
	}
}
