//! Accumulates one `<software>` entry and validates its geometry on completion.

use std::collections::BTreeMap;

use crate::error::EntryError;
use crate::model::{AreaKind, DataArea, GROM_DATA, GROM_SLOT, MAX_AREA_SIZE, MAX_GROM_AREA, Part, Title};

/// Board whose GROMs are emulated and therefore exempt from GROM geometry.
const GROM_EMULATION_PCB: &str = "gromemu";

#[derive(Debug, Default)]
pub(crate) struct TitleBuilder {
	pub name: String,
	pub description: Option<String>,
	pub year: Option<String>,
	pub publisher: Option<String>,
	pub cloneof: Option<String>,
	pub info: BTreeMap<String, String>,
	pub pcb: Option<String>,
	areas: Vec<DataArea>,
}

impl TitleBuilder {
	pub fn new(name: String) -> Self {
		Self { name, ..Self::default() }
	}

	/// Opens (or reopens) a data area and returns its index.
	pub fn open_area(&mut self, kind: AreaKind, size: u32) -> Result<usize, EntryError> {
		if let Some(index) = self.areas.iter().position(|area| area.kind == kind) {
			let previous = self.areas[index].size;
			if previous != size {
				return Err(EntryError::AreaRedeclared { area: kind, size, previous });
			}
			return Ok(index);
		}
		self.areas.push(DataArea { kind, size, parts: Vec::new() });
		Ok(self.areas.len() - 1)
	}

	pub fn add_part(&mut self, area: usize, part: Part) {
		self.areas[area].parts.push(part);
	}

	pub fn finish(self) -> Result<Title, EntryError> {
		let pcb = self.pcb.ok_or(EntryError::MissingPcb)?;
		let grom_rules = pcb != GROM_EMULATION_PCB;

		for area in &self.areas {
			check_area(area, grom_rules)?;
		}
		if self.areas.iter().all(|area| area.parts.is_empty()) {
			return Err(EntryError::NoParts);
		}

		Ok(Title {
			name: self.name,
			description: self.description,
			year: self.year,
			publisher: self.publisher,
			cloneof: self.cloneof,
			info: self.info,
			pcb,
			areas: self.areas,
		})
	}
}

fn check_area(area: &DataArea, grom_rules: bool) -> Result<(), EntryError> {
	let grom = grom_rules && area.kind == AreaKind::Grom;
	let size_ok = if grom {
		matches!(area.size % GROM_SLOT, 0 | GROM_DATA) && area.size <= MAX_GROM_AREA
	} else {
		area.size <= MAX_AREA_SIZE
	};
	if !size_ok {
		return Err(EntryError::AreaSize { area: area.kind, size: area.size });
	}

	for (index, part) in area.parts.iter().enumerate() {
		if part.size == 0 {
			return Err(EntryError::EmptyPart { part: part.name.clone() });
		}
		if part.end() > u64::from(area.size) {
			return Err(EntryError::PartOutOfRange {
				part: part.name.clone(),
				area: area.kind,
				offset: part.offset,
				size: part.size,
				area_size: area.size,
			});
		}
		if let Some(other) = area.parts[..index]
			.iter()
			.find(|other| u64::from(part.offset) < other.end() && u64::from(other.offset) < part.end())
		{
			return Err(EntryError::Overlap { part: part.name.clone(), other: other.name.clone() });
		}
		if grom {
			if part.size != GROM_DATA && part.size % GROM_SLOT != 0 {
				return Err(EntryError::GromPartSize { part: part.name.clone(), size: part.size });
			}
			if part.offset % GROM_SLOT != 0 {
				return Err(EntryError::GromOffset { part: part.name.clone(), offset: part.offset });
			}
		}
	}
	Ok(())
}
