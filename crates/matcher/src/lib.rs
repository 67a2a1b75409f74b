//! Content verification against catalog titles.
//!
//! A [`ContentProvider`] hands out chip dumps by name, whether they come
//! from a ROM zip, from the payloads of an RPK, or from memory.
//! [`match_title`] compares every declared part of a [`Title`] with what the
//! provider offers and collects all differences into a [`MatchReport`];
//! nothing short of a provider I/O failure stops it early.
//!
//! [`Title`]: tirpk_catalog::Title

mod matcher;
mod provider;
mod report;

pub use matcher::{match_title, observe};
pub use provider::{ContentError, ContentProvider, MemoryContent};
pub use report::{IncompleteMatch, MatchReport, MatchResult, Mismatch, Verified};

#[cfg(test)]
mod tests;
