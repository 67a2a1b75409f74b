//! Errors raised while assembling or reading RPK containers.

use std::path::PathBuf;

use thiserror::Error;
use tirpk_board::{LayoutError, UnknownBoard};
use tirpk_catalog::{AreaKind, Checksum};
use tirpk_matcher::IncompleteMatch;
use zip::result::ZipError;

#[derive(Debug, Error)]
pub enum RpkError {
	/// Assembly was requested with unverified content.
	#[error(transparent)]
	IncompleteMatch(#[from] IncompleteMatch),

	/// The title does not fit its board.
	#[error(transparent)]
	Layout(#[from] LayoutError),

	#[error(transparent)]
	UnknownBoard(#[from] UnknownBoard),

	/// The container's metadata and payloads disagree.
	#[error("corrupt container: {0}")]
	Corrupt(#[from] Corruption),

	/// The container was built for another board than the title's.
	#[error("container is for a {found} board, but the title needs {expected}")]
	BoardMismatch { expected: String, found: String },

	/// A part lies outside the data area it belongs to.
	#[error("{part} does not fit its {area} dataarea")]
	PartOutOfArea { part: String, area: AreaKind },

	#[error("zip archive error: {0}")]
	Zip(#[from] ZipError),

	/// A metadata document could not be serialised.
	#[error("failed to write {document}: {message}")]
	Metadata { document: &'static str, message: String },

	#[error("I/O error on {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},
}

/// Ways a container's content contradicts its own metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
	#[error("not a readable zip archive: {0}")]
	Archive(String),

	#[error("missing layout.xml")]
	MissingLayout,

	#[error("malformed {document}: {message}")]
	Metadata { document: &'static str, message: String },

	#[error("socket {socket} uses undeclared resource {resource}")]
	UnknownResource { socket: String, resource: String },

	#[error("resource {resource} refers to missing entry {file}")]
	MissingPayload { resource: String, file: String },

	#[error("{file} holds {actual:#06x} bytes, but {declared:#06x} are declared")]
	SizeMismatch { file: String, declared: u64, actual: u64 },

	#[error("{file} has {actual}, but {declared} is declared")]
	ChecksumMismatch {
		file: String,
		declared: Checksum,
		actual: Checksum,
	},
}

pub type Result<T> = std::result::Result<T, RpkError>;
