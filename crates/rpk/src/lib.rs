//! RPK cartridge containers.
//!
//! An RPK is a zip holding one payload per ROM socket plus three metadata
//! documents:
//!
//! - `layout.xml` names the board type and maps each socket to a resource,
//!   i.e. a payload file or a RAM declaration.
//! - `meta-inf.xml` carries the title's name, year, distributor and number.
//! - `softlist.xml` is a software list entry describing the payloads
//!   themselves, with sizes and checksums.
//!
//! [`assemble`] builds a container from verified content; [`RpkContainer`]
//! reads one back and [`RpkContent`] maps its payloads onto the parts of a
//! catalog title so they can be matched again. [`ZipContent`] serves the
//! dumps of a plain ROM zip.

mod archive;
mod assemble;
mod container;
mod content;
mod error;
mod image;
mod metadata;

pub use archive::ZipContent;
pub use assemble::{AssembleOptions, assemble};
pub use container::{LAYOUT_XML, META_INF_XML, Payload, RamSocket, RpkContainer, SOFTLIST_XML};
pub use content::RpkContent;
pub use error::{Corruption, Result, RpkError};

#[cfg(test)]
mod tests;
