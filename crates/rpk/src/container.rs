//! Reading RPK containers back.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tirpk_catalog::{Checksum, ObservedFile};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Corruption, Result, RpkError};
use crate::metadata::{self, DeclaredPayload};

pub const LAYOUT_XML: &str = "layout.xml";
pub const META_INF_XML: &str = "meta-inf.xml";
pub const SOFTLIST_XML: &str = "softlist.xml";

/// A ROM socket and the payload stored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
	pub socket: String,
	pub resource: String,
	pub file: String,
	pub data: Vec<u8>,
}

/// A RAM socket. RAM has no stored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamSocket {
	pub socket: String,
	pub size: u32,
	/// Backing file of persistent RAM.
	pub store: Option<String>,
}

/// A parsed and checked RPK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpkContainer {
	/// Software list name recorded in `layout.xml`.
	pub list_name: Option<String>,
	/// Board type recorded in `layout.xml`.
	pub pcb: String,
	/// ROM sockets in `layout.xml` order.
	pub payloads: Vec<Payload>,
	pub rams: Vec<RamSocket>,
	/// Entries no resource references, other than the metadata documents.
	pub extras: Vec<String>,
}

impl RpkContainer {
	pub fn open(path: &Path) -> Result<Self> {
		let file = File::open(path).map_err(|error| RpkError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let container = Self::read(BufReader::new(file))?;
		tracing::debug!(
			path = %path.display(),
			pcb = %container.pcb,
			payloads = container.payloads.len(),
			"opened rpk"
		);
		Ok(container)
	}

	/// Parses the container and checks every payload against its metadata.
	pub fn read<R: Read + Seek>(reader: R) -> Result<Self> {
		let mut archive = ZipArchive::new(reader).map_err(|err| Corruption::Archive(err.to_string()))?;

		let layout_xml = read_text(&mut archive, LAYOUT_XML)?.ok_or(Corruption::MissingLayout)?;
		let layout = metadata::read_layout(&layout_xml).map_err(|message| Corruption::Metadata {
			document: LAYOUT_XML,
			message,
		})?;
		let pcb = layout.pcb.clone().ok_or_else(|| Corruption::Metadata {
			document: LAYOUT_XML,
			message: "missing <pcb type>".to_string(),
		})?;
		let declared = match read_text(&mut archive, SOFTLIST_XML)? {
			Some(xml) => metadata::read_softlist(&xml).map_err(|message| Corruption::Metadata {
				document: SOFTLIST_XML,
				message,
			})?,
			None => Default::default(),
		};

		let mut payloads = Vec::new();
		let mut rams = Vec::new();
		for (socket, resource) in &layout.sockets {
			if let Some(file) = layout.roms.get(resource) {
				let data = read_entry(&mut archive, file)?.ok_or_else(|| Corruption::MissingPayload {
					resource: resource.clone(),
					file: file.clone(),
				})?;
				if let Some(declared) = declared.get(file) {
					check_declared(file, declared, &data)?;
				}
				payloads.push(Payload {
					socket: socket.clone(),
					resource: resource.clone(),
					file: file.clone(),
					data,
				});
			} else if let Some(ram) = layout.rams.get(resource) {
				rams.push(RamSocket {
					socket: socket.clone(),
					size: ram.size,
					store: ram.store.clone(),
				});
			} else {
				return Err(Corruption::UnknownResource {
					socket: socket.clone(),
					resource: resource.clone(),
				}
				.into());
			}
		}

		let mut extras: Vec<String> = archive
			.file_names()
			.filter(|name| !name.ends_with('/'))
			.filter(|name| ![LAYOUT_XML, META_INF_XML, SOFTLIST_XML].contains(name))
			.filter(|name| !payloads.iter().any(|payload| payload.file == *name))
			.map(str::to_string)
			.collect();
		extras.sort();
		for extra in &extras {
			tracing::warn!(entry = %extra, "unreferenced entry in rpk");
		}

		Ok(Self {
			list_name: layout.list_name,
			pcb,
			payloads,
			rams,
			extras,
		})
	}

	pub fn payload(&self, socket: &str) -> Option<&Payload> {
		self.payloads.iter().find(|payload| payload.socket == socket)
	}

	/// Hashes every payload, for title lookup.
	pub fn observed(&self) -> Vec<ObservedFile> {
		self.payloads
			.iter()
			.map(|payload| ObservedFile::of(payload.file.clone(), &payload.data))
			.collect()
	}
}

fn check_declared(file: &str, declared: &DeclaredPayload, data: &[u8]) -> std::result::Result<(), Corruption> {
	let actual_size = data.len() as u64;
	if actual_size != declared.size {
		return Err(Corruption::SizeMismatch {
			file: file.to_string(),
			declared: declared.size,
			actual: actual_size,
		});
	}
	let actual = Checksum::of(data);
	if !declared.checksum.is_empty() && !declared.checksum.agrees_with(&actual) {
		return Err(Corruption::ChecksumMismatch {
			file: file.to_string(),
			declared: declared.checksum,
			actual,
		});
	}
	Ok(())
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
	let mut file = match archive.by_name(name) {
		Ok(file) => file,
		Err(ZipError::FileNotFound) => return Ok(None),
		Err(err) => return Err(Corruption::Archive(err.to_string()).into()),
	};
	let mut data = Vec::new();
	file.read_to_end(&mut data)
		.map_err(|err| Corruption::Archive(format!("{name}: {err}")))?;
	Ok(Some(data))
}

fn read_text<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &'static str) -> Result<Option<String>> {
	let Some(bytes) = read_entry(archive, name)? else {
		return Ok(None);
	};
	String::from_utf8(bytes).map(Some).map_err(|err| {
		Corruption::Metadata {
			document: name,
			message: err.to_string(),
		}
		.into()
	})
}
