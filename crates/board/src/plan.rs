//! Assigning a title's data areas to the sockets of its board.

use thiserror::Error;
use tirpk_catalog::{AreaKind, DataArea, Title};

use crate::board::Board;
use crate::layout::{Access, Layout, Socket};

/// Offset of the second ROM dump in a two-bank ROM area.
const SECOND_BANK: u32 = 0x2000;
/// Common ROM of a paged12k board, visible in both banks.
const PAGED12K_COMMON: u32 = 0x1000;

/// A title that does not fit its board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
	#[error("{board} board has no socket for the {area} area")]
	NoSocket { board: Board, area: AreaKind },

	#[error("invalid number of roms in dataarea rom: {count} (at most {max} on {board})")]
	RomCount { board: Board, count: usize, max: usize },

	#[error("invalid paged12k cartridge: expected a 0x1000 and a 0x2000 rom")]
	Paged12k,

	#[error("rom {part} too large: {size:#06x} exceeds {limit:#06x}")]
	RomTooLarge { part: String, size: u32, limit: u32 },

	#[error("wrong rom offset {offset:#06x} for {part}, expected {expected:#06x}")]
	RomOffset { part: String, offset: u32, expected: u32 },

	#[error("{area} area of {size:#06x} bytes exceeds the {capacity:#06x} bytes mapped for {socket}")]
	Capacity { area: AreaKind, socket: Socket, size: u32, capacity: u32 },
}

/// A run of bytes copied from a data area into a socket payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
	pub area: AreaKind,
	pub offset: u32,
	pub len: u32,
}

impl Segment {
	pub const fn end(&self) -> u32 {
		self.offset + self.len
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketContent {
	/// A ROM image: the concatenation of `segments`.
	Payload { file: String, segments: Vec<Segment> },
	/// RAM with no stored image. Persistent RAM names the file its content
	/// is saved to.
	Ram { size: u32, file: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSocket {
	pub socket: Socket,
	pub content: SocketContent,
}

impl PlannedSocket {
	/// Payload file and segments, for ROM sockets.
	pub fn payload(&self) -> Option<(&str, &[Segment])> {
		match &self.content {
			SocketContent::Payload { file, segments } => Some((file, segments)),
			SocketContent::Ram { .. } => None,
		}
	}

	/// Size of the payload (or of the RAM) in bytes.
	pub fn len(&self) -> u32 {
		match &self.content {
			SocketContent::Payload { segments, .. } => segments.iter().map(|segment| segment.len).sum(),
			SocketContent::Ram { size, .. } => *size,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Which bytes of a title go into which socket of its board.
///
/// Sockets are ordered ROM, second ROM, GROM, RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPlan {
	pub board: Board,
	/// File base shared by all payload names.
	pub base: String,
	pub sockets: Vec<PlannedSocket>,
}

impl SocketPlan {
	pub fn derive(title: &Title, layout: &Layout) -> Result<Self, LayoutError> {
		let board = layout.board;
		let base = title.file_base();
		let mut sockets = Vec::new();

		if let Some(area) = title.area(AreaKind::Rom) {
			require_socket(layout, Socket::Rom, area.kind)?;
			sockets.extend(plan_rom(area, layout, &base)?);
		}

		if let Some(area) = title.area(AreaKind::Grom) {
			require_socket(layout, Socket::Grom, area.kind)?;
			sockets.push(payload(Socket::Grom, &base, vec![Segment {
				area: AreaKind::Grom,
				offset: 0,
				len: area.size,
			}]));
		}

		let ram_areas: Vec<&DataArea> = title.areas.iter().filter(|area| area.kind.is_ram()).collect();
		if let Some(extra) = ram_areas.get(1) {
			return Err(LayoutError::NoSocket { board, area: extra.kind });
		}
		if let Some(area) = ram_areas.first() {
			require_socket(layout, Socket::Ram, area.kind)?;
			let capacity = layout.capacity(Socket::Ram);
			if area.size > capacity {
				return Err(LayoutError::Capacity {
					area: area.kind,
					socket: Socket::Ram,
					size: area.size,
					capacity,
				});
			}
			sockets.push(ram(Socket::Ram, &base, area.size, area.kind == AreaKind::Nvram));
		} else if layout.has_socket(Socket::Ram) {
			let persistent = layout.access(Socket::Ram) == Some(Access::Nvram);
			sockets.push(ram(Socket::Ram, &base, layout.capacity(Socket::Ram), persistent));
		}

		tracing::debug!(
			title = %title.name,
			board = %board,
			sockets = sockets.len(),
			"derived socket plan"
		);
		Ok(Self { board, base, sockets })
	}

	pub fn get(&self, socket: Socket) -> Option<&PlannedSocket> {
		self.sockets.iter().find(|planned| planned.socket == socket)
	}

	/// ROM sockets with their payload files and segments.
	pub fn payloads(&self) -> impl Iterator<Item = (Socket, &str, &[Segment])> {
		self.sockets
			.iter()
			.filter_map(|planned| planned.payload().map(|(file, segments)| (planned.socket, file, segments)))
	}
}

fn require_socket(layout: &Layout, socket: Socket, area: AreaKind) -> Result<(), LayoutError> {
	if layout.has_socket(socket) {
		Ok(())
	} else {
		Err(LayoutError::NoSocket { board: layout.board, area })
	}
}

fn payload(socket: Socket, base: &str, segments: Vec<Segment>) -> PlannedSocket {
	PlannedSocket {
		socket,
		content: SocketContent::Payload {
			file: format!("{base}{}", socket.file_suffix()),
			segments,
		},
	}
}

fn ram(socket: Socket, base: &str, size: u32, persistent: bool) -> PlannedSocket {
	PlannedSocket {
		socket,
		content: SocketContent::Ram {
			size,
			file: persistent.then(|| format!("{base}{}", socket.file_suffix())),
		},
	}
}

fn rom_segment(offset: u32, len: u32) -> Segment {
	Segment { area: AreaKind::Rom, offset, len }
}

fn plan_rom(area: &DataArea, layout: &Layout, base: &str) -> Result<Vec<PlannedSocket>, LayoutError> {
	let board = layout.board;
	let roms = &area.parts;

	if board == Board::Paged12k {
		let [common, banked] = roms.as_slice() else {
			return Err(LayoutError::Paged12k);
		};
		if common.size != PAGED12K_COMMON || banked.size != SECOND_BANK {
			return Err(LayoutError::Paged12k);
		}
		for (rom, expected) in [(common, 0), (banked, SECOND_BANK)] {
			if rom.offset != expected {
				return Err(LayoutError::RomOffset {
					part: rom.name.clone(),
					offset: rom.offset,
					expected,
				});
			}
		}
		// Each 8K bank repeats the common ROM in its lower half.
		return Ok(vec![
			payload(Socket::Rom, base, vec![
				rom_segment(0, PAGED12K_COMMON),
				rom_segment(SECOND_BANK, PAGED12K_COMMON),
			]),
			payload(Socket::Rom2, base, vec![
				rom_segment(0, PAGED12K_COMMON),
				rom_segment(SECOND_BANK + PAGED12K_COMMON, PAGED12K_COMMON),
			]),
		]);
	}

	let max = if layout.has_socket(Socket::Rom2) { 2 } else { 1 };
	if roms.is_empty() || roms.len() > max {
		return Err(LayoutError::RomCount { board, count: roms.len(), max });
	}

	let limit = board.chip_limit();
	let mut planned = Vec::new();
	for (rom, (socket, expected)) in roms.iter().zip([(Socket::Rom, 0), (Socket::Rom2, SECOND_BANK)]) {
		if rom.size > limit {
			return Err(LayoutError::RomTooLarge {
				part: rom.name.clone(),
				size: rom.size,
				limit,
			});
		}
		if rom.offset != expected {
			return Err(LayoutError::RomOffset {
				part: rom.name.clone(),
				offset: rom.offset,
				expected,
			});
		}
		planned.push(payload(socket, base, vec![rom_segment(rom.offset, rom.size)]));
	}
	Ok(planned)
}
