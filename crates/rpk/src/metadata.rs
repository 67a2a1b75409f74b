//! The three XML documents of an RPK.

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tirpk_board::{Board, PlannedSocket, Socket, SocketContent, SocketPlan};
use tirpk_catalog::{Checksum, Crc32, Sha1Digest, Title, parse_number};

use crate::container::{LAYOUT_XML, META_INF_XML, SOFTLIST_XML};
use crate::error::{Result, RpkError};

/// A payload as it will be stored, with its checksums.
pub(crate) struct StoredPayload<'a> {
	pub socket_id: &'static str,
	pub file: &'a str,
	pub data: &'a [u8],
}

/// Streaming XML writer for one document.
struct Document {
	name: &'static str,
	writer: Writer<Vec<u8>>,
}

impl Document {
	fn new(name: &'static str, indent_char: u8, indent_size: usize) -> Result<Self> {
		let mut doc = Self {
			name,
			writer: Writer::new_with_indent(Vec::new(), indent_char, indent_size),
		};
		doc.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
		Ok(doc)
	}

	fn write(&mut self, event: Event<'_>) -> Result<()> {
		let name = self.name;
		self.writer.write_event(event).map_err(|err| write_error(name, err))
	}

	fn start(&mut self, element: &str, attrs: &[(&str, &str)]) -> Result<()> {
		self.write(Event::Start(BytesStart::new(element).with_attributes(attrs.iter().copied())))
	}

	fn empty(&mut self, element: &str, attrs: &[(&str, &str)]) -> Result<()> {
		self.write(Event::Empty(BytesStart::new(element).with_attributes(attrs.iter().copied())))
	}

	fn end(&mut self, element: &str) -> Result<()> {
		self.write(Event::End(BytesEnd::new(element)))
	}

	fn text_element(&mut self, element: &str, text: &str) -> Result<()> {
		self.start(element, &[])?;
		self.write(Event::Text(BytesText::new(text)))?;
		self.end(element)
	}

	fn finish(self) -> Vec<u8> {
		let mut bytes = self.writer.into_inner();
		bytes.push(b'\n');
		bytes
	}
}

fn write_error(document: &'static str, err: impl fmt::Display) -> RpkError {
	RpkError::Metadata {
		document,
		message: err.to_string(),
	}
}

fn hex(value: usize) -> String {
	format!("{value:#06x}")
}

/// Metadata documents list the GROM socket before the others.
fn grom_first<T>(items: &[T], is_grom: impl Fn(&T) -> bool + Copy) -> impl Iterator<Item = &T> {
	let grom = items.iter().filter(move |item| is_grom(*item));
	grom.chain(items.iter().filter(move |item| !is_grom(*item)))
}

fn sockets_grom_first(plan: &SocketPlan) -> Vec<&PlannedSocket> {
	grom_first(&plan.sockets, |planned| planned.socket == Socket::Grom).collect()
}

/// `layout.xml`: resources and the sockets using them.
pub(crate) fn write_layout(title: &Title, plan: &SocketPlan) -> Result<Vec<u8>> {
	let mut doc = Document::new(LAYOUT_XML, b' ', 3)?;
	doc.start("romset", &[("version", "1.0"), ("listname", title.name.as_str())])?;

	let sockets = sockets_grom_first(plan);
	doc.start("resources", &[])?;
	for planned in &sockets {
		let id = planned.socket.resource();
		match &planned.content {
			SocketContent::Payload { file, .. } => doc.empty("rom", &[("id", id), ("file", file.as_str())])?,
			SocketContent::Ram { size, file } => {
				let size = hex(*size as usize);
				match file {
					Some(file) => doc.empty("ram", &[
						("id", id),
						("size", size.as_str()),
						("type", "persistent"),
						("store", file.as_str()),
					])?,
					None => doc.empty("ram", &[("id", id), ("size", size.as_str())])?,
				}
			}
		}
	}
	doc.end("resources")?;

	doc.start("configuration", &[])?;
	doc.start("pcb", &[("type", plan.board.rpk_type())])?;
	for planned in &sockets {
		doc.empty("socket", &[("id", planned.socket.id()), ("uses", planned.socket.resource())])?;
	}
	doc.end("pcb")?;
	doc.end("configuration")?;

	doc.end("romset")?;
	Ok(doc.finish())
}

/// `meta-inf.xml`: human readable title information.
pub(crate) fn write_meta_inf(title: &Title) -> Result<Vec<u8>> {
	let mut doc = Document::new(META_INF_XML, b' ', 2)?;
	doc.start("meta-inf", &[])?;
	let fields = [
		("name", title.description.as_deref()),
		("year", title.year.as_deref()),
		("dist", title.publisher.as_deref()),
		("number", title.info.get("serial").map(String::as_str)),
	];
	for (element, value) in fields {
		if let Some(value) = value {
			doc.text_element(element, value)?;
		}
	}
	if let Some(version) = title.info.get("version") {
		doc.empty("status", &[("version", version.as_str())])?;
	}
	doc.end("meta-inf")?;
	Ok(doc.finish())
}

/// `softlist.xml`: a software list entry describing the payloads.
pub(crate) fn write_softlist(title: &Title, board: Board, payloads: &[StoredPayload<'_>]) -> Result<Vec<u8>> {
	let mut doc = Document::new(SOFTLIST_XML, b'\t', 1)?;
	if let Some(description) = &title.description {
		// "--" may not appear inside a comment.
		let comment = format!(" Softlist entry for {} ", description.replace("--", "- -"));
		doc.write(Event::Comment(BytesText::from_escaped(comment)))?;
	}

	doc.start("software", &[("name", title.name.as_str())])?;
	let fields = [
		("description", &title.description),
		("year", &title.year),
		("publisher", &title.publisher),
	];
	for (element, value) in fields {
		if let Some(value) = value {
			doc.text_element(element, value)?;
		}
	}
	for (name, value) in &title.info {
		doc.empty("info", &[("name", name.as_str()), ("value", value.as_str())])?;
	}

	doc.start("part", &[("name", "cart"), ("interface", "ti99_cart")])?;
	doc.empty("feature", &[("name", "pcb"), ("value", board.rpk_type())])?;
	for payload in grom_first(payloads, |payload| payload.socket_id == Socket::Grom.id()) {
		let checksum = Checksum::of(payload.data);
		let size = hex(payload.data.len());
		let crc = checksum.crc.map(|crc| crc.to_string()).unwrap_or_default();
		let sha1 = checksum.sha1.map(|sha1| sha1.to_string()).unwrap_or_default();
		doc.start("dataarea", &[("name", payload.socket_id), ("size", size.as_str())])?;
		doc.empty("rom", &[
			("name", payload.file),
			("size", size.as_str()),
			("crc", crc.as_str()),
			("sha1", sha1.as_str()),
			("offset", "0x0000"),
		])?;
		doc.end("dataarea")?;
	}
	doc.end("part")?;
	doc.end("software")?;
	Ok(doc.finish())
}

/// RAM resource declared by `layout.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RamResource {
	pub size: u32,
	/// Backing file of persistent RAM.
	pub store: Option<String>,
}

/// What `layout.xml` declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LayoutDocument {
	pub list_name: Option<String>,
	pub pcb: Option<String>,
	/// ROM resource id to payload file.
	pub roms: BTreeMap<String, String>,
	pub rams: BTreeMap<String, RamResource>,
	/// `(socket id, resource id)` in document order.
	pub sockets: Vec<(String, String)>,
}

/// Size and checksum `softlist.xml` declares for one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeclaredPayload {
	pub size: u64,
	pub checksum: Checksum,
}

type Attributes = BTreeMap<String, String>;

/// Calls `visit` with the name and attributes of every element.
fn walk<F>(xml: &str, mut visit: F) -> std::result::Result<(), String>
where
	F: FnMut(&str, &Attributes) -> std::result::Result<(), String>,
{
	let mut reader = Reader::from_str(xml);
	reader.config_mut().trim_text(true);
	loop {
		let event = reader
			.read_event()
			.map_err(|err| format!("at byte {}: {err}", reader.error_position()))?;
		match event {
			Event::Start(start) | Event::Empty(start) => {
				let mut attrs = Attributes::new();
				for attr in start.attributes() {
					let attr = attr.map_err(|err| err.to_string())?;
					let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
					let value = attr.unescape_value().map_err(|err| err.to_string())?;
					attrs.insert(key, value.into_owned());
				}
				visit(&String::from_utf8_lossy(start.name().as_ref()), &attrs)?;
			}
			Event::Eof => return Ok(()),
			_ => {}
		}
	}
}

fn required<'a>(attrs: &'a Attributes, element: &str, key: &str) -> std::result::Result<&'a str, String> {
	attrs
		.get(key)
		.map(String::as_str)
		.ok_or_else(|| format!("<{element}> is missing attribute '{key}'"))
}

fn number(attrs: &Attributes, element: &str, key: &str) -> std::result::Result<u32, String> {
	let value = required(attrs, element, key)?;
	parse_number(value).ok_or_else(|| format!("invalid number '{value}' in <{element} {key}>"))
}

pub(crate) fn read_layout(xml: &str) -> std::result::Result<LayoutDocument, String> {
	let mut layout = LayoutDocument::default();
	walk(xml, |element, attrs| {
		match element {
			"romset" => layout.list_name = attrs.get("listname").cloned(),
			"pcb" => layout.pcb = Some(required(attrs, element, "type")?.to_string()),
			"rom" => {
				let id = required(attrs, element, "id")?;
				let file = required(attrs, element, "file")?;
				layout.roms.insert(id.to_string(), file.to_string());
			}
			"ram" => {
				let id = required(attrs, element, "id")?;
				let store = match attrs.get("type").map(String::as_str) {
					Some("persistent") => Some(required(attrs, element, "store")?.to_string()),
					_ => None,
				};
				let size = number(attrs, element, "size")?;
				layout.rams.insert(id.to_string(), RamResource { size, store });
			}
			"socket" => {
				let id = required(attrs, element, "id")?;
				let uses = required(attrs, element, "uses")?;
				layout.sockets.push((id.to_string(), uses.to_string()));
			}
			_ => {}
		}
		Ok(())
	})?;
	Ok(layout)
}

/// Declared payloads of `softlist.xml`, by file name.
pub(crate) fn read_softlist(xml: &str) -> std::result::Result<BTreeMap<String, DeclaredPayload>, String> {
	let mut declared = BTreeMap::new();
	walk(xml, |element, attrs| {
		if element == "rom" {
			let name = required(attrs, element, "name")?;
			let size = number(attrs, element, "size")?;
			let checksum = Checksum {
				crc: attrs.get("crc").map(|crc| crc.parse::<Crc32>()).transpose().map_err(|err| err.to_string())?,
				sha1: attrs
					.get("sha1")
					.map(|sha1| sha1.parse::<Sha1Digest>())
					.transpose()
					.map_err(|err| err.to_string())?,
			};
			declared.insert(name.to_string(), DeclaredPayload {
				size: u64::from(size),
				checksum,
			});
		}
		Ok(())
	})?;
	Ok(declared)
}
