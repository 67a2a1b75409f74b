//! Cartridge boards and their memory layouts.
//!
//! A [`Board`] is parsed from the `pcb` token of a software list entry and
//! resolves to a static [`Layout`]: which sockets the board has, where they
//! sit in the CPU or GROM address space, and how banks are selected.
//! [`SocketPlan`] then decides which bytes of a title's data areas go into
//! which socket.
//!
//! # Invariants
//!
//! - Mappings of one layout never overlap.
//!   - Enforced in: the static tables of [`Board::layout`].
//!   - Tested by: `tests::layouts_are_exclusive`.
//!   - Failure symptom: two chips answer the same address.
//!
//! - A socket plan never accepts a ROM dump larger than the board's chip limit.
//!   - Enforced in: [`SocketPlan::derive`].
//!   - Tested by: `tests::oversized_rom_is_rejected`.
//!   - Failure symptom: truncated banks on real hardware.

mod board;
mod layout;
mod plan;

pub use board::{Board, UnknownBoard};
pub use layout::{Access, AddressSpace, Layout, Paging, Socket, SocketMapping, resolve};
pub use plan::{LayoutError, PlannedSocket, Segment, SocketContent, SocketPlan};
