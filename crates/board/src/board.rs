use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::layout::{Access, AddressSpace, Layout, Paging, Socket, SocketMapping};

/// Cartridge ROM window in CPU space.
const ROM_BASE: u32 = 0x6000;
const ROM_WINDOW: u32 = 0x2000;
/// GROMs 3 to 7 of the GROM address space.
const GROM_BASE: u32 = 0x6000;
const GROM_WINDOW: u32 = 0xA000;

/// The board token is not one this tool knows how to lay out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown board type '{0}'")]
pub struct UnknownBoard(pub String);

/// A cartridge board (PCB) design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
	/// Single 8K ROM, no banking.
	Standard,
	/// Two 8K banks, the second made of a 7K dump.
	Paged7,
	/// Two banks built from a 4K common ROM and an 8K banked ROM.
	Paged12k,
	/// Two 8K banks.
	Paged16k,
	/// 4K ROM plus 4K battery-backed RAM.
	Minimem,
	/// 32K RAM in four 8K banks, selected through CRU.
	Super,
	/// Milton Bradley boards: 16K ROM, 1K RAM, bank register at 0x6FFE.
	Mbx,
	/// Up to 16 banks, selected by inverted ROM writes.
	Paged379i,
	/// Up to 64 banks, selected by ROM writes.
	Paged378,
	/// Up to 64 banks, selected by ROM writes.
	Paged377,
	/// Up to 8 banks, selected through CRU.
	PagedCru,
	/// Paged ROM with emulated GROMs.
	GromEmu,
}

impl Board {
	pub const ALL: [Board; 12] = [
		Board::Standard,
		Board::Paged7,
		Board::Paged12k,
		Board::Paged16k,
		Board::Minimem,
		Board::Super,
		Board::Mbx,
		Board::Paged379i,
		Board::Paged378,
		Board::Paged377,
		Board::PagedCru,
		Board::GromEmu,
	];

	/// Token used by software lists.
	pub const fn token(self) -> &'static str {
		match self {
			Board::Standard => "standard",
			Board::Paged7 => "paged7",
			Board::Paged12k => "paged12k",
			Board::Paged16k => "paged16k",
			Board::Minimem => "minimem",
			Board::Super => "super",
			Board::Mbx => "mbx",
			Board::Paged379i => "paged379i",
			Board::Paged378 => "paged378",
			Board::Paged377 => "paged377",
			Board::PagedCru => "pagedcru",
			Board::GromEmu => "gromemu",
		}
	}

	/// Type written to an RPK's `<pcb type>`.
	///
	/// The two-bank boards are stored as plain `paged`, since their payloads
	/// are normalised to two 8K banks.
	pub const fn rpk_type(self) -> &'static str {
		match self {
			Board::Paged7 | Board::Paged12k | Board::Paged16k => "paged",
			other => other.token(),
		}
	}

	/// Largest ROM dump one socket of this board accepts.
	///
	/// Minimem dumps may span the full 8K window; the upper half is shadowed
	/// by the board's RAM.
	pub const fn chip_limit(self) -> u32 {
		match self {
			Board::Standard
			| Board::Paged7
			| Board::Paged12k
			| Board::Paged16k
			| Board::GromEmu
			| Board::Minimem => 0x2000,
			Board::Super => 0,
			Board::Mbx => 0x4000,
			Board::Paged379i => 0x2_0000,
			Board::Paged378 | Board::Paged377 => 0x8_0000,
			Board::PagedCru => 0x1_0000,
		}
	}

	/// Returns true when GROM dumps follow the 6K-in-8K GROM geometry.
	pub const fn has_real_groms(self) -> bool {
		!matches!(self, Board::GromEmu)
	}

	/// The canonical layout of this board.
	pub fn layout(self) -> Layout {
		let grom = SocketMapping::fixed(Socket::Grom, AddressSpace::Grom, GROM_BASE, GROM_WINDOW, Access::Rom);
		let (mut mappings, paging) = match self {
			Board::Standard => (vec![rom(ROM_BASE, ROM_WINDOW)], Paging::None),
			Board::Paged7 | Board::Paged12k | Board::Paged16k => (two_banks(), Paging::RomWrite { select: 0x6000, inverted: false }),
			Board::GromEmu => (two_banks(), Paging::GromEmulation),
			Board::Minimem => (
				vec![
					rom(ROM_BASE, 0x1000),
					SocketMapping::fixed(Socket::Ram, AddressSpace::Cpu, 0x7000, 0x1000, Access::Nvram),
				],
				Paging::None,
			),
			Board::Super => (
				(0..4)
					.map(|bank| SocketMapping::banked(Socket::Ram, ROM_BASE, ROM_WINDOW, bank, Access::Nvram))
					.collect(),
				Paging::Cru { base: 0x0800 },
			),
			Board::Mbx => {
				let mut mappings = vec![
					rom(ROM_BASE, 0x0C00),
					SocketMapping::fixed(Socket::Ram, AddressSpace::Cpu, 0x6C00, 0x0400, Access::Ram),
				];
				mappings.extend((0..4).map(|bank| SocketMapping::banked(Socket::Rom, 0x7000, 0x1000, bank, Access::Rom)));
				(mappings, Paging::Register { address: 0x6FFE })
			}
			Board::Paged379i => (rom_banks(16), Paging::RomWrite { select: 0x6000, inverted: true }),
			Board::Paged378 | Board::Paged377 => (rom_banks(64), Paging::RomWrite { select: 0x6000, inverted: false }),
			Board::PagedCru => (rom_banks(8), Paging::Cru { base: 0x0800 }),
		};
		mappings.push(grom);
		Layout { board: self, mappings, paging }
	}
}

fn rom(base: u32, width: u32) -> SocketMapping {
	SocketMapping::fixed(Socket::Rom, AddressSpace::Cpu, base, width, Access::Rom)
}

fn two_banks() -> Vec<SocketMapping> {
	vec![
		SocketMapping::banked(Socket::Rom, ROM_BASE, ROM_WINDOW, 0, Access::Rom),
		SocketMapping::banked(Socket::Rom2, ROM_BASE, ROM_WINDOW, 1, Access::Rom),
	]
}

fn rom_banks(count: u16) -> Vec<SocketMapping> {
	(0..count)
		.map(|bank| SocketMapping::banked(Socket::Rom, ROM_BASE, ROM_WINDOW, bank, Access::Rom))
		.collect()
}

impl fmt::Display for Board {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.token())
	}
}

impl FromStr for Board {
	type Err = UnknownBoard;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// Older lists and RPKs use plain "paged" for the two-bank board.
		if s == "paged" {
			return Ok(Board::Paged16k);
		}
		Board::ALL
			.into_iter()
			.find(|board| board.token() == s)
			.ok_or_else(|| UnknownBoard(s.to_string()))
	}
}
