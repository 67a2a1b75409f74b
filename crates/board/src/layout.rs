use std::fmt;

use crate::board::{Board, UnknownBoard};

/// A named chip position on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Socket {
	Grom,
	Rom,
	Rom2,
	Ram,
}

impl Socket {
	/// Socket id used in RPK layouts.
	pub const fn id(self) -> &'static str {
		match self {
			Socket::Grom => "grom_socket",
			Socket::Rom => "rom_socket",
			Socket::Rom2 => "rom2_socket",
			Socket::Ram => "ram_socket",
		}
	}

	/// Resource id the socket uses in RPK layouts.
	pub const fn resource(self) -> &'static str {
		match self {
			Socket::Grom => "gromimage",
			Socket::Rom => "romimage",
			Socket::Rom2 => "rom2image",
			Socket::Ram => "ramimage",
		}
	}

	/// Suffix appended to the file base to name the socket's image.
	pub const fn file_suffix(self) -> &'static str {
		match self {
			Socket::Grom => "g.bin",
			Socket::Rom => "c.bin",
			Socket::Rom2 => "d.bin",
			Socket::Ram => "r.bin",
		}
	}

	pub fn from_id(id: &str) -> Option<Self> {
		[Socket::Grom, Socket::Rom, Socket::Rom2, Socket::Ram]
			.into_iter()
			.find(|socket| socket.id() == id)
	}
}

impl fmt::Display for Socket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.id())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
	Cpu,
	Grom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
	Rom,
	Ram,
	/// Battery-backed RAM whose content is persisted between sessions.
	Nvram,
}

/// How a board switches banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
	None,
	/// A write to `select + 2 * n` selects bank `n` (or the `n`th bank from
	/// the top when inverted).
	RomWrite { select: u16, inverted: bool },
	/// CRU bits from `base` select the bank.
	Cru { base: u16 },
	/// A write to a register inside the cartridge window selects the bank.
	Register { address: u16 },
	/// Paged ROM with GROM accesses emulated by the cartridge.
	GromEmulation,
}

/// One address range a socket answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketMapping {
	pub socket: Socket,
	pub space: AddressSpace,
	pub base: u32,
	pub width: u32,
	/// Bank index for paged ranges; `None` for ranges that are always mapped.
	pub bank: Option<u16>,
	pub access: Access,
}

impl SocketMapping {
	pub const fn fixed(socket: Socket, space: AddressSpace, base: u32, width: u32, access: Access) -> Self {
		Self {
			socket,
			space,
			base,
			width,
			bank: None,
			access,
		}
	}

	pub const fn banked(socket: Socket, base: u32, width: u32, bank: u16, access: Access) -> Self {
		Self {
			socket,
			space: AddressSpace::Cpu,
			base,
			width,
			bank: Some(bank),
			access,
		}
	}

	pub const fn end(&self) -> u32 {
		self.base + self.width
	}

	/// Returns true when both mappings can answer the same address at the
	/// same time. Distinct banks of one range never do; an unbanked range
	/// conflicts with every bank.
	pub fn overlaps(&self, other: &SocketMapping) -> bool {
		let same_bank = match (self.bank, other.bank) {
			(Some(a), Some(b)) => a == b,
			_ => true,
		};
		self.space == other.space && same_bank && self.base < other.end() && other.base < self.end()
	}
}

/// The memory layout of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
	pub board: Board,
	pub mappings: Vec<SocketMapping>,
	pub paging: Paging,
}

impl Layout {
	/// Distinct sockets in mapping order.
	pub fn sockets(&self) -> Vec<Socket> {
		let mut sockets = Vec::new();
		for mapping in &self.mappings {
			if !sockets.contains(&mapping.socket) {
				sockets.push(mapping.socket);
			}
		}
		sockets
	}

	pub fn has_socket(&self, socket: Socket) -> bool {
		self.mappings.iter().any(|mapping| mapping.socket == socket)
	}

	/// Total bytes mapped for `socket` across all ranges and banks.
	pub fn capacity(&self, socket: Socket) -> u32 {
		self.mappings
			.iter()
			.filter(|mapping| mapping.socket == socket)
			.map(|mapping| mapping.width)
			.sum()
	}

	/// Access of the first mapping of `socket`.
	pub fn access(&self, socket: Socket) -> Option<Access> {
		self.mappings.iter().find(|mapping| mapping.socket == socket).map(|mapping| mapping.access)
	}

	/// Number of banks the board switches between (1 when unbanked).
	pub fn bank_count(&self) -> u16 {
		self.mappings
			.iter()
			.filter_map(|mapping| mapping.bank)
			.max()
			.map_or(1, |bank| bank + 1)
	}

	/// Index pairs of mappings that overlap. Empty for every valid layout.
	pub fn overlaps(&self) -> Vec<(usize, usize)> {
		let mut pairs = Vec::new();
		for (i, a) in self.mappings.iter().enumerate() {
			for (j, b) in self.mappings.iter().enumerate().skip(i + 1) {
				if a.overlaps(b) {
					pairs.push((i, j));
				}
			}
		}
		pairs
	}
}

/// Resolves a board token into its layout.
pub fn resolve(pcb: &str) -> Result<Layout, UnknownBoard> {
	let board: Board = pcb.parse()?;
	let layout = board.layout();
	tracing::debug!(
		board = %board,
		sockets = layout.sockets().len(),
		banks = layout.bank_count(),
		"resolved board layout"
	);
	Ok(layout)
}
