//! Titles, data areas and parts of a software list.

use std::collections::BTreeMap;
use std::fmt;

use crate::checksum::Checksum;

/// Largest data area accepted from a software list.
pub const MAX_AREA_SIZE: u32 = 0x8_0000;
/// Address span of one GROM chip.
pub const GROM_SLOT: u32 = 0x2000;
/// Size of the populated part of a 6K GROM.
pub const GROM_DATA: u32 = 0x1800;
/// GROM address space available to cartridges (GROMs 3 to 7).
pub const MAX_GROM_AREA: u32 = 0xA000;

/// Kind of a data area, as named by `<dataarea name=...>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AreaKind {
	Rom,
	Grom,
	Ram,
	Nvram,
}

impl AreaKind {
	/// Parses a dataarea name. A trailing `_socket` is ignored, so both
	/// `rom` and `rom_socket` name the ROM area.
	pub fn from_area_name(name: &str) -> Option<Self> {
		match name.strip_suffix("_socket").unwrap_or(name) {
			"rom" => Some(Self::Rom),
			"grom" => Some(Self::Grom),
			"ram" => Some(Self::Ram),
			"nvram" => Some(Self::Nvram),
			_ => None,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			Self::Rom => "rom",
			Self::Grom => "grom",
			Self::Ram => "ram",
			Self::Nvram => "nvram",
		}
	}

	/// Returns true for writable areas.
	pub const fn is_ram(self) -> bool {
		matches!(self, Self::Ram | Self::Nvram)
	}
}

impl fmt::Display for AreaKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// One declared chip dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
	/// Dump file name; also the entry name inside a ROM zip.
	pub name: String,
	/// Declared size in bytes.
	pub size: u32,
	/// Offset of the dump within its data area.
	pub offset: u32,
	/// Declared checksums.
	pub checksum: Checksum,
}

impl Part {
	/// End offset (exclusive) within the data area.
	pub fn end(&self) -> u64 {
		u64::from(self.offset) + u64::from(self.size)
	}
}

/// A contiguous region of cartridge memory and the dumps loaded into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataArea {
	pub kind: AreaKind,
	pub size: u32,
	/// Parts in document order.
	pub parts: Vec<Part>,
}

/// A known cartridge from the software list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
	/// Short name, unique within the catalog.
	pub name: String,
	pub description: Option<String>,
	pub year: Option<String>,
	pub publisher: Option<String>,
	/// Parent title for clones.
	pub cloneof: Option<String>,
	/// `<info name value>` pairs.
	pub info: BTreeMap<String, String>,
	/// Board token from `<feature name="pcb">`.
	pub pcb: String,
	/// Data areas in document order.
	pub areas: Vec<DataArea>,
}

impl Title {
	/// All declared parts, area by area, in document order.
	pub fn parts(&self) -> impl Iterator<Item = (&DataArea, &Part)> {
		self.areas.iter().flat_map(|area| area.parts.iter().map(move |part| (area, part)))
	}

	pub fn part_count(&self) -> usize {
		self.areas.iter().map(|area| area.parts.len()).sum()
	}

	pub fn area(&self, kind: AreaKind) -> Option<&DataArea> {
		self.areas.iter().find(|area| area.kind == kind)
	}

	/// Base name for files derived from this title.
	///
	/// Uses the serial number (lowercased, whitespace removed) when the list
	/// declares one, else the short name.
	pub fn file_base(&self) -> String {
		match self.info.get("serial") {
			Some(serial) if !serial.trim().is_empty() => serial.split_whitespace().collect::<String>().to_lowercase(),
			_ => self.name.clone(),
		}
	}
}
