//! Data area images built from verified parts.

use std::collections::BTreeMap;

use tirpk_board::{Board, Segment};
use tirpk_catalog::model::{GROM_DATA, GROM_SLOT};
use tirpk_catalog::{AreaKind, Part, Title};
use tirpk_matcher::Verified;

use crate::error::{Result, RpkError};

/// Bytes at the end of each GROM slot that a 6K GROM does not populate.
const GROM_GARBAGE: usize = 0x800;

/// Zero-filled images of a title's ROM and GROM areas with every verified
/// part copied to its offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AreaImages {
	images: BTreeMap<AreaKind, Vec<u8>>,
}

impl AreaImages {
	pub(crate) fn build(title: &Title, verified: &Verified<'_>, board: Board) -> Result<Self> {
		let mut images: BTreeMap<AreaKind, Vec<u8>> = title
			.areas
			.iter()
			.filter(|area| !area.kind.is_ram())
			.map(|area| (area.kind, vec![0; area.size as usize]))
			.collect();

		for (result, data) in verified.parts() {
			let out_of_area = || RpkError::PartOutOfArea {
				part: result.part.clone(),
				area: result.area,
			};
			let image = images.get_mut(&result.area).ok_or_else(out_of_area)?;
			let start = result.offset as usize;
			let slot = image.get_mut(start..start + data.len()).ok_or_else(out_of_area)?;
			slot.copy_from_slice(data);
		}

		if board.has_real_groms()
			&& let (Some(image), Some(area)) = (images.get_mut(&AreaKind::Grom), title.area(AreaKind::Grom))
		{
			regenerate_grom_garbage(image, &area.parts);
		}
		Ok(Self { images })
	}

	/// Concatenates the bytes `segments` select.
	pub(crate) fn concat(&self, segments: &[Segment]) -> Option<Vec<u8>> {
		let mut payload = Vec::new();
		for segment in segments {
			let image = self.images.get(&segment.area)?;
			payload.extend_from_slice(image.get(segment.offset as usize..segment.end() as usize)?);
		}
		Some(payload)
	}
}

/// Fills the unpopulated tail of every GROM slot a part occupies.
///
/// A 6K GROM answers reads of its last 2K with the OR of the bytes 0x800 and
/// 0x1000 below. Bytes a part declares are never rewritten, so its dump
/// survives unchanged. Returns the parts whose declared tail disagrees with
/// the regenerated garbage.
pub(crate) fn regenerate_grom_garbage(image: &mut [u8], parts: &[Part]) -> Vec<String> {
	let (slot_size, data_size) = (GROM_SLOT as usize, GROM_DATA as usize);
	let declared = |at: usize| {
		parts
			.iter()
			.any(|part| (part.offset as usize..part.offset as usize + part.size as usize).contains(&at))
	};
	let mut suspect_parts = Vec::new();
	for part in parts {
		let start = part.offset as usize;
		let end = start + part.size as usize;
		let mut suspect = false;
		for slot in (start..end).step_by(slot_size) {
			let garbage_start = slot + data_size;
			if garbage_start >= image.len() {
				continue;
			}
			let garbage_len = GROM_GARBAGE.min(image.len() - garbage_start);
			for i in 0..garbage_len {
				let garbage = image[slot + 0x800 + i] | image[slot + 0x1000 + i];
				let at = garbage_start + i;
				if image[at] == garbage {
					continue;
				}
				if declared(at) {
					suspect |= at < end;
				} else {
					image[at] = garbage;
				}
			}
		}
		if suspect {
			tracing::warn!(part = %part.name, "incorrect garbage, kept as dumped");
			suspect_parts.push(part.name.clone());
		}
	}
	suspect_parts
}
