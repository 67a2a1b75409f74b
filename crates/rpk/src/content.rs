//! Mapping RPK payloads back onto catalog parts.

use std::collections::BTreeMap;

use tirpk_board::{Board, Layout, SocketPlan};
use tirpk_catalog::{AreaKind, Title};
use tirpk_matcher::{ContentError, ContentProvider, MemoryContent};

use crate::container::RpkContainer;
use crate::error::{Result, RpkError};

/// One data area being reassembled, with the bytes written so far.
struct Reassembly {
	data: Vec<u8>,
	filled: Vec<bool>,
}

impl Reassembly {
	fn new(size: u32) -> Self {
		Self {
			data: vec![0; size as usize],
			filled: vec![false; size as usize],
		}
	}

	/// Writes `bytes` at `offset`. Returns the number of bytes that
	/// contradicted earlier writes.
	fn write(&mut self, offset: usize, bytes: &[u8]) -> usize {
		let mut conflicts = 0;
		for (i, &byte) in bytes.iter().enumerate() {
			let at = offset + i;
			let (Some(slot), Some(filled)) = (self.data.get_mut(at), self.filled.get_mut(at)) else {
				break;
			};
			if *filled && *slot != byte {
				conflicts += 1;
			}
			*slot = byte;
			*filled = true;
		}
		conflicts
	}

	/// The written bytes from `start`, up to `len` or the first gap.
	fn read(&self, start: usize, len: usize) -> &[u8] {
		let end = (start + len).min(self.data.len());
		let written = self
			.filled
			.get(start..end)
			.map_or(0, |filled| filled.iter().take_while(|filled| **filled).count());
		self.data.get(start..start + written).unwrap_or_default()
	}
}

/// Serves a title's parts out of an RPK.
///
/// Payloads are cut back into data areas along the title's socket plan.
/// A part a payload does not fully cover comes out truncated; a part no
/// payload touches is absent. Payloads of sockets the plan does not use and
/// unreferenced entries are offered as extra names.
#[derive(Debug, Clone)]
pub struct RpkContent {
	parts: MemoryContent,
	extras: Vec<String>,
}

impl RpkContent {
	pub fn new(container: &RpkContainer, title: &Title, layout: &Layout) -> Result<Self> {
		let found: Board = container.pcb.parse()?;
		if found.rpk_type() != layout.board.rpk_type() {
			return Err(RpkError::BoardMismatch {
				expected: layout.board.rpk_type().to_string(),
				found: container.pcb.clone(),
			});
		}

		let plan = SocketPlan::derive(title, layout)?;
		let mut areas: BTreeMap<AreaKind, Reassembly> = title
			.areas
			.iter()
			.filter(|area| !area.kind.is_ram())
			.map(|area| (area.kind, Reassembly::new(area.size)))
			.collect();

		let mut extras = Vec::new();
		let mut unplanned = Vec::new();
		for payload in &container.payloads {
			let Some(segments) = plan
				.payloads()
				.find(|(socket, _, _)| socket.id() == payload.socket)
				.map(|(_, _, segments)| segments)
			else {
				tracing::warn!(socket = %payload.socket, file = %payload.file, "payload for unplanned socket");
				unplanned.push(payload);
				extras.push(payload.file.clone());
				continue;
			};

			let mut rest = payload.data.as_slice();
			for segment in segments {
				let (chunk, tail) = rest.split_at(rest.len().min(segment.len as usize));
				rest = tail;
				if let Some(area) = areas.get_mut(&segment.area) {
					let conflicts = area.write(segment.offset as usize, chunk);
					if conflicts > 0 {
						tracing::warn!(
							socket = %payload.socket,
							area = %segment.area,
							conflicts,
							"payload disagrees with an earlier socket"
						);
					}
				}
			}
			if !rest.is_empty() {
				tracing::warn!(socket = %payload.socket, excess = rest.len(), "payload longer than planned");
			}
		}

		let mut parts = MemoryContent::new();
		for (area, part) in title.parts() {
			let Some(image) = areas.get(&area.kind) else {
				continue;
			};
			let bytes = image.read(part.offset as usize, part.size as usize);
			if !bytes.is_empty() {
				parts.insert(part.name.clone(), bytes);
			}
		}
		for payload in unplanned {
			parts.insert(payload.file.clone(), payload.data.clone());
		}
		extras.extend(container.extras.iter().cloned());

		tracing::debug!(title = %title.name, parts = parts.len(), extras = extras.len(), "mapped rpk onto title");
		Ok(Self { parts, extras })
	}
}

impl ContentProvider for RpkContent {
	fn fetch(&mut self, name: &str) -> std::result::Result<Option<Vec<u8>>, ContentError> {
		self.parts.fetch(name)
	}

	fn names(&self) -> Vec<String> {
		let mut names = self.parts.names();
		for extra in &self.extras {
			if !names.contains(extra) {
				names.push(extra.clone());
			}
		}
		names
	}
}
