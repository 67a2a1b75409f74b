//! Dump checksums, as declared by software lists and as computed from content.

use std::fmt;
use std::str::FromStr;

use sha1::{Digest, Sha1};
use thiserror::Error;

/// A checksum attribute that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} checksum '{value}'")]
pub struct ChecksumParseError {
	/// Which algorithm the value was declared for.
	pub kind: &'static str,
	/// The offending attribute value.
	pub value: String,
}

/// SHA-1 digest of a dump.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha1Digest([u8; 20]);

impl Sha1Digest {
	/// Hashes `data`.
	pub fn of(data: &[u8]) -> Self {
		Self(Sha1::digest(data).into())
	}

	pub const fn from_bytes(bytes: [u8; 20]) -> Self {
		Self(bytes)
	}

	pub fn as_bytes(&self) -> &[u8; 20] {
		&self.0
	}
}

impl fmt::Display for Sha1Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in &self.0 {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

impl fmt::Debug for Sha1Digest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Sha1Digest({self})")
	}
}

impl FromStr for Sha1Digest {
	type Err = ChecksumParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ChecksumParseError { kind: "sha1", value: s.to_string() };
		let s = s.trim();
		if s.len() != 40 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(err());
		}
		let mut bytes = [0u8; 20];
		for (i, byte) in bytes.iter_mut().enumerate() {
			*byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| err())?;
		}
		Ok(Self(bytes))
	}
}

/// CRC32 (IEEE) of a dump.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crc32(pub u32);

impl Crc32 {
	/// Hashes `data`.
	pub fn of(data: &[u8]) -> Self {
		Self(crc32fast::hash(data))
	}
}

impl fmt::Display for Crc32 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:08x}", self.0)
	}
}

impl fmt::Debug for Crc32 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Crc32({self})")
	}
}

impl FromStr for Crc32 {
	type Err = ChecksumParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.is_empty() || trimmed.len() > 8 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(ChecksumParseError { kind: "crc", value: s.to_string() });
		}
		u32::from_str_radix(trimmed, 16)
			.map(Self)
			.map_err(|_| ChecksumParseError { kind: "crc", value: s.to_string() })
	}
}

/// Checksums of one dump.
///
/// Declared checksums carry whatever the software list provides (at least one
/// algorithm). Computed checksums always carry both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Checksum {
	pub crc: Option<Crc32>,
	pub sha1: Option<Sha1Digest>,
}

impl Checksum {
	/// Computes both checksums of `data`.
	pub fn of(data: &[u8]) -> Self {
		Self {
			crc: Some(Crc32::of(data)),
			sha1: Some(Sha1Digest::of(data)),
		}
	}

	/// Returns true when no algorithm is present.
	pub fn is_empty(&self) -> bool {
		self.crc.is_none() && self.sha1.is_none()
	}

	/// Returns true when every checksum declared in `self` equals the one in `actual`.
	///
	/// An algorithm absent from `actual` never agrees with a declared value.
	pub fn agrees_with(&self, actual: &Checksum) -> bool {
		let crc_ok = self.crc.is_none_or(|crc| actual.crc == Some(crc));
		let sha1_ok = self.sha1.is_none_or(|sha1| actual.sha1 == Some(sha1));
		!self.is_empty() && crc_ok && sha1_ok
	}
}

impl fmt::Display for Checksum {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (self.crc, self.sha1) {
			(Some(crc), Some(sha1)) => write!(f, "crc {crc} sha1 {sha1}"),
			(Some(crc), None) => write!(f, "crc {crc}"),
			(None, Some(sha1)) => write!(f, "sha1 {sha1}"),
			(None, None) => f.write_str("no checksum"),
		}
	}
}
