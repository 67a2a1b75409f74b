//! Building RPK containers from verified content.

use std::io::{Cursor, Write};

use tirpk_board::{Layout, SocketPlan};
use tirpk_catalog::{AreaKind, Title};
use tirpk_matcher::MatchReport;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::container::{LAYOUT_XML, META_INF_XML, SOFTLIST_XML};
use crate::error::{Result, RpkError};
use crate::image::AreaImages;
use crate::metadata::{self, StoredPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
	/// Deflate level, 0 to 9. Level 0 stores entries uncompressed.
	pub compression_level: u8,
}

impl Default for AssembleOptions {
	fn default() -> Self {
		Self { compression_level: 9 }
	}
}

/// Builds an RPK for `title` from a fully matched `report`.
///
/// Refuses any report with an unmatched part before touching the content.
/// Entries are written payloads first, then `layout.xml`, `meta-inf.xml`
/// and `softlist.xml`, all stamped 1980-01-01 00:00, so equal inputs give
/// byte-identical containers.
pub fn assemble(title: &Title, layout: &Layout, report: &MatchReport, options: &AssembleOptions) -> Result<Vec<u8>> {
	let verified = report.verified()?;
	let plan = SocketPlan::derive(title, layout)?;
	let images = AreaImages::build(title, &verified, layout.board)?;

	let mut payloads = Vec::new();
	for (socket, file, segments) in plan.payloads() {
		let data = images.concat(segments).ok_or_else(|| RpkError::PartOutOfArea {
			part: file.to_string(),
			area: segments.first().map_or(AreaKind::Rom, |segment| segment.area),
		})?;
		payloads.push((socket, file, data));
	}
	let stored: Vec<StoredPayload<'_>> = payloads
		.iter()
		.map(|(socket, file, data)| StoredPayload {
			socket_id: socket.id(),
			file,
			data,
		})
		.collect();

	let layout_xml = metadata::write_layout(title, &plan)?;
	let meta_inf = metadata::write_meta_inf(title)?;
	let softlist = metadata::write_softlist(title, plan.board, &stored)?;

	let file_options = match options.compression_level.min(9) {
		0 => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
		level => SimpleFileOptions::default()
			.compression_method(CompressionMethod::Deflated)
			.compression_level(Some(level.into())),
	}
	.last_modified_time(DateTime::default())
	.unix_permissions(0o644);

	let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
	let entries = stored
		.iter()
		.map(|payload| (payload.file, payload.data))
		.chain([
			(LAYOUT_XML, layout_xml.as_slice()),
			(META_INF_XML, meta_inf.as_slice()),
			(SOFTLIST_XML, softlist.as_slice()),
		]);
	for (name, data) in entries {
		zip.start_file(name, file_options)?;
		zip.write_all(data).map_err(ZipError::from)?;
	}
	let bytes = zip.finish()?.into_inner();

	tracing::debug!(
		title = %title.name,
		board = %plan.board,
		payloads = stored.len(),
		bytes = bytes.len(),
		"assembled rpk"
	);
	Ok(bytes)
}
