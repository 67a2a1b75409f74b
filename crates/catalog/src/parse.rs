//! Streaming software list reader.
//!
//! Walks the document once. Each `<software>` element is accumulated into a
//! [`TitleBuilder`]; the first entry-level problem marks the entry as broken
//! and the rest of it is skipped. Only malformed XML aborts the load.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::builder::TitleBuilder;
use crate::checksum::{Checksum, Crc32, Sha1Digest};
use crate::error::{CatalogError, CatalogWarning, EntryError, Result};
use crate::model::{AreaKind, Part, Title};
use crate::Catalog;

/// The only part interface this catalog describes.
const CART_INTERFACE: &str = "ti99_cart";

pub(crate) fn parse_catalog(xml: &str) -> Result<Catalog> {
	let mut reader = Reader::from_str(xml);
	reader.config_mut().trim_text(true);

	let mut loader = Loader::default();
	loop {
		let event = reader.read_event().map_err(|err| CatalogError::Xml {
			position: reader.error_position(),
			message: err.to_string(),
		})?;
		let malformed = |message: String| CatalogError::Xml {
			position: reader.buffer_position(),
			message,
		};
		match event {
			Event::Start(start) => {
				let attrs = Attrs::of(&start).map_err(malformed)?;
				loader.open(&element_name(&start), &attrs);
			}
			Event::Empty(start) => {
				let name = element_name(&start);
				let attrs = Attrs::of(&start).map_err(malformed)?;
				loader.open(&name, &attrs);
				loader.close(&name);
			}
			Event::End(end) => loader.close(&String::from_utf8_lossy(end.name().as_ref())),
			Event::Text(text) => {
				let text = text.unescape().map_err(|err| malformed(err.to_string()))?;
				loader.text(&text);
			}
			Event::CData(data) => loader.text(&String::from_utf8_lossy(&data)),
			Event::Eof => break,
			_ => {}
		}
	}

	if loader.depth != 0 {
		return Err(CatalogError::Xml {
			position: reader.buffer_position(),
			message: "unexpected end of document".to_string(),
		});
	}
	loader.into_catalog()
}

fn element_name(start: &BytesStart<'_>) -> String {
	String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// Unescaped attributes of one element.
struct Attrs {
	values: Vec<(String, String)>,
}

/// Attributes viewed as belonging to a known element, for error reporting.
struct Scoped<'a> {
	element: &'static str,
	attrs: &'a Attrs,
}

impl Attrs {
	fn of(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
		let mut values = Vec::new();
		for attr in start.attributes() {
			let attr = attr.map_err(|err| err.to_string())?;
			let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
			let value = attr.unescape_value().map_err(|err| err.to_string())?;
			values.push((key, value.into_owned()));
		}
		Ok(Self { values })
	}

	fn get(&self, key: &str) -> Option<&str> {
		self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	fn scoped(&self, element: &'static str) -> Scoped<'_> {
		Scoped { element, attrs: self }
	}
}

impl<'a> Scoped<'a> {
	fn get(&self, key: &str) -> Option<&'a str> {
		self.attrs.get(key)
	}

	fn require(&self, key: &'static str) -> std::result::Result<&'a str, EntryError> {
		self.get(key).ok_or(EntryError::MissingAttribute {
			element: self.element,
			attribute: key,
		})
	}

	fn number(&self, key: &'static str) -> std::result::Result<u32, EntryError> {
		let value = self.require(key)?;
		parse_number(value).ok_or_else(|| EntryError::InvalidNumber {
			attribute: key,
			value: value.to_string(),
		})
	}
}

/// Parses an integer the way software lists write them: `0x`, `0o` and `0b`
/// prefixes or plain decimal.
pub fn parse_number(value: &str) -> Option<u32> {
	let value = value.trim();
	let (digits, radix) = match value.get(..2) {
		Some("0x" | "0X") => (&value[2..], 16),
		Some("0o" | "0O") => (&value[2..], 8),
		Some("0b" | "0B") => (&value[2..], 2),
		_ => (value, 10),
	};
	if digits.is_empty() || digits.starts_with(['+', '-']) {
		return None;
	}
	u32::from_str_radix(digits, radix).ok()
}

#[derive(Debug, Clone, Copy)]
enum TextField {
	Description,
	Year,
	Publisher,
}

struct Entry {
	builder: TitleBuilder,
	error: Option<EntryError>,
	area: Option<usize>,
	field: Option<TextField>,
	text: String,
}

#[derive(Default)]
struct Loader {
	list_name: Option<String>,
	titles: BTreeMap<String, Title>,
	warnings: Vec<CatalogWarning>,
	skipped: usize,
	depth: usize,
	entry: Option<Entry>,
}

impl Loader {
	fn open(&mut self, name: &str, attrs: &Attrs) {
		self.depth += 1;
		// A lone `<software>` document (as embedded in an RPK) has no list root.
		if self.depth == 1 && name != "software" {
			self.list_name = attrs.get("name").map(str::to_string);
			return;
		}

		let Some(entry) = self.entry.as_mut() else {
			if name == "software" {
				let mut builder = TitleBuilder::new(attrs.get("name").unwrap_or("<unnamed>").to_string());
				builder.cloneof = attrs.get("cloneof").map(str::to_string);
				let error = attrs
					.get("name")
					.is_none()
					.then_some(EntryError::MissingAttribute { element: "software", attribute: "name" });
				self.entry = Some(Entry {
					builder,
					error,
					area: None,
					field: None,
					text: String::new(),
				});
			} else {
				tracing::trace!(element = name, "ignoring element outside software entry");
			}
			return;
		};

		if entry.error.is_some() {
			return;
		}
		if let Err(error) = entry.open(name, attrs) {
			entry.error = Some(error);
		}
	}

	fn close(&mut self, name: &str) {
		self.depth = self.depth.saturating_sub(1);
		let Some(entry) = self.entry.as_mut() else {
			return;
		};
		match name {
			"software" => {
				if let Some(entry) = self.entry.take() {
					self.finish(entry);
				}
			}
			"dataarea" => entry.area = None,
			"description" | "year" | "publisher" => {
				if let Some(field) = entry.field.take() {
					let text = std::mem::take(&mut entry.text);
					let slot = match field {
						TextField::Description => &mut entry.builder.description,
						TextField::Year => &mut entry.builder.year,
						TextField::Publisher => &mut entry.builder.publisher,
					};
					*slot = Some(text);
				}
			}
			_ => {}
		}
	}

	fn text(&mut self, text: &str) {
		if let Some(entry) = self.entry.as_mut()
			&& entry.field.is_some()
		{
			entry.text.push_str(text);
		}
	}

	fn finish(&mut self, entry: Entry) {
		let name = entry.builder.name.clone();
		let result = match entry.error {
			Some(error) => Err(error),
			None => entry.builder.finish(),
		};
		match result {
			Ok(title) => {
				tracing::trace!(title = %title.name, pcb = %title.pcb, parts = title.part_count(), "loaded title");
				if self.titles.insert(title.name.clone(), title).is_some() {
					tracing::warn!(title = %name, "duplicate software entry");
					self.warnings.push(CatalogWarning::Duplicate { name });
				}
			}
			Err(error) => {
				tracing::warn!(title = %name, %error, "skipping software entry");
				self.skipped += 1;
				self.warnings.push(CatalogWarning::Skipped { name, error });
			}
		}
	}

	fn into_catalog(self) -> Result<Catalog> {
		if self.titles.is_empty() {
			return Err(CatalogError::NoValidEntries { skipped: self.skipped });
		}
		Ok(Catalog {
			list_name: self.list_name,
			titles: self.titles,
			warnings: self.warnings,
		})
	}
}

impl Entry {
	fn open(&mut self, name: &str, attrs: &Attrs) -> std::result::Result<(), EntryError> {
		match name {
			"description" => self.capture(TextField::Description),
			"year" => self.capture(TextField::Year),
			"publisher" => self.capture(TextField::Publisher),
			"info" => {
				let attrs = attrs.scoped("info");
				let key = attrs.require("name")?.to_string();
				let value = attrs.get("value").unwrap_or_default().to_string();
				self.builder.info.insert(key, value);
			}
			"part" => {
				let interface = attrs.get("interface").unwrap_or_default();
				if interface != CART_INTERFACE {
					return Err(EntryError::ForeignInterface { interface: interface.to_string() });
				}
			}
			"feature" => {
				let attrs = attrs.scoped("feature");
				if attrs.require("name")? == "pcb" {
					self.builder.pcb = Some(attrs.require("value")?.to_string());
				}
			}
			"dataarea" => {
				let attrs = attrs.scoped("dataarea");
				let area_name = attrs.require("name")?;
				let kind = AreaKind::from_area_name(area_name).ok_or_else(|| EntryError::UnknownArea(area_name.to_string()))?;
				let size = attrs.number("size")?;
				self.area = Some(self.builder.open_area(kind, size)?);
			}
			"rom" => {
				let attrs = attrs.scoped("rom");
				let part = parse_part(&attrs)?;
				let area = self.area.ok_or_else(|| EntryError::RomOutsideArea { part: part.name.clone() })?;
				self.builder.add_part(area, part);
			}
			_ => tracing::trace!(element = name, title = %self.builder.name, "ignoring element"),
		}
		Ok(())
	}

	fn capture(&mut self, field: TextField) {
		self.field = Some(field);
		self.text.clear();
	}
}

fn parse_part(attrs: &Scoped<'_>) -> std::result::Result<Part, EntryError> {
	let name = attrs.require("name")?.to_string();
	let size = attrs.number("size")?;
	let offset = attrs.number("offset")?;
	let checksum = Checksum {
		crc: attrs.get("crc").map(str::parse::<Crc32>).transpose()?,
		sha1: attrs.get("sha1").map(str::parse::<Sha1Digest>).transpose()?,
	};
	if checksum.is_empty() {
		return Err(EntryError::NoChecksum { part: name });
	}
	Ok(Part { name, size, offset, checksum })
}
