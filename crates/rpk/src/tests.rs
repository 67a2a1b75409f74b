use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use pretty_assertions::assert_eq;
use tirpk_board::{Board, SocketPlan, resolve};
use tirpk_catalog::{AreaKind, Checksum, DataArea, Part, Title};
use tirpk_matcher::{ContentProvider, MemoryContent, match_title};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::*;
use crate::image::regenerate_grom_garbage;
use crate::metadata::{StoredPayload, read_layout, read_softlist, write_layout, write_meta_inf, write_softlist};

fn dump(seed: u8, len: usize) -> Vec<u8> {
	(0..len).map(|i| seed.wrapping_mul(31).wrapping_add((i * 7 % 251) as u8)).collect()
}

fn part(name: &str, data: &[u8], offset: u32) -> Part {
	Part {
		name: name.to_string(),
		size: data.len() as u32,
		offset,
		checksum: Checksum::of(data),
	}
}

fn title(name: &str, pcb: &str, areas: Vec<DataArea>) -> Title {
	Title {
		name: name.to_string(),
		description: Some("Mini Memory".to_string()),
		year: Some("1981".to_string()),
		publisher: Some("Texas Instruments".to_string()),
		cloneof: None,
		info: BTreeMap::from([
			("serial".to_string(), "PHM 3058".to_string()),
			("version".to_string(), "2".to_string()),
		]),
		pcb: pcb.to_string(),
		areas,
	}
}

fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
	let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
	for (name, data) in entries {
		zip.start_file(*name, SimpleFileOptions::default()).expect("must start entry");
		zip.write_all(data).expect("must write entry");
	}
	zip.finish().expect("must finish zip").into_inner()
}

const LAYOUT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<romset version="1.0" listname="alpiner">
   <resources>
      <rom id="romimage" file="phm3056c.bin"/>
   </resources>
   <configuration>
      <pcb type="standard">
         <socket id="rom_socket" uses="romimage"/>
      </pcb>
   </configuration>
</romset>
"#;

fn softlist_declaring(size: usize, data: &[u8]) -> String {
	let checksum = Checksum::of(data);
	format!(
		r#"<software name="alpiner"><part name="cart" interface="ti99_cart"><dataarea name="rom_socket" size="{size:#06x}"><rom name="phm3056c.bin" size="{size:#06x}" crc="{}" sha1="{}" offset="0x0000"/></dataarea></part></software>"#,
		checksum.crc.expect("computed"),
		checksum.sha1.expect("computed"),
	)
}

#[test]
fn short_grom_gets_garbage_without_warning() {
	let grom = dump(1, 0x1800);
	let mut image = vec![0u8; 0x2000];
	image[..0x1800].copy_from_slice(&grom);

	let fixed = regenerate_grom_garbage(&mut image, &[part("g.bin", &grom, 0)]);
	assert_eq!(fixed, Vec::<String>::new());
	for i in 0..0x800 {
		assert_eq!(image[0x1800 + i], grom[0x800 + i] | grom[0x1000 + i]);
	}
}

#[test]
fn wrong_garbage_in_full_slot_is_kept_and_reported() {
	let mut grom = dump(2, 0x2000);
	for i in 0..0x800 {
		grom[0x1800 + i] = grom[0x800 + i] | grom[0x1000 + i];
	}
	let mut image = grom.clone();
	assert_eq!(regenerate_grom_garbage(&mut image, &[part("g.bin", &grom, 0)]), Vec::<String>::new());
	assert_eq!(image, grom);

	grom[0x1FFF] = !grom[0x1FFF];
	let mut image = grom.clone();
	let suspect = regenerate_grom_garbage(&mut image, &[part("g.bin", &grom, 0)]);
	assert_eq!(suspect, vec!["g.bin".to_string()]);
	assert_eq!(image, grom);
}

#[test]
fn garbage_never_overwrites_a_neighbouring_part() {
	let first = dump(3, 0x1800);
	let tail = dump(4, 0x800);
	let mut image = vec![0u8; 0x2000];
	image[..0x1800].copy_from_slice(&first);
	image[0x1800..].copy_from_slice(&tail);

	regenerate_grom_garbage(&mut image, &[part("g3.bin", &first, 0), part("g3x.bin", &tail, 0x1800)]);
	assert_eq!(&image[0x1800..], tail.as_slice());
}

#[test]
fn layout_document_lists_sockets_and_resources() {
	let rom = dump(3, 0x2000);
	let title = title("minimem", "minimem", vec![
		DataArea {
			kind: AreaKind::Rom,
			size: 0x2000,
			parts: vec![part("phm3058c.bin", &rom, 0)],
		},
		DataArea {
			kind: AreaKind::Nvram,
			size: 0x1000,
			parts: vec![],
		},
	]);
	let layout = resolve("minimem").expect("known board");
	let plan = SocketPlan::derive(&title, &layout).expect("fits");

	let xml = String::from_utf8(write_layout(&title, &plan).expect("must write")).expect("utf-8");
	assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));

	let parsed = read_layout(&xml).expect("must parse");
	assert_eq!(parsed.list_name.as_deref(), Some("minimem"));
	assert_eq!(parsed.pcb.as_deref(), Some("minimem"));
	assert_eq!(parsed.roms, BTreeMap::from([("romimage".to_string(), "phm3058c.bin".to_string())]));
	assert_eq!(parsed.rams.get("ramimage").map(|ram| (ram.size, ram.store.clone())), Some((0x1000, Some("phm3058r.bin".to_string()))));
	assert_eq!(parsed.sockets, vec![
		("rom_socket".to_string(), "romimage".to_string()),
		("ram_socket".to_string(), "ramimage".to_string()),
	]);
}

#[test]
fn metadata_lists_the_grom_socket_first() {
	let rom = dump(5, 0x2000);
	let grom = dump(6, 0x1800);
	let title = title("alpiner", "standard", vec![
		DataArea {
			kind: AreaKind::Rom,
			size: 0x2000,
			parts: vec![part("phm3058c.bin", &rom, 0)],
		},
		DataArea {
			kind: AreaKind::Grom,
			size: 0x1800,
			parts: vec![part("phm3058g3.bin", &grom, 0)],
		},
	]);
	let layout = resolve("standard").expect("known board");
	let plan = SocketPlan::derive(&title, &layout).expect("fits");

	let xml = String::from_utf8(write_layout(&title, &plan).expect("must write")).expect("utf-8");
	assert_eq!(read_layout(&xml).expect("must parse").sockets, vec![
		("grom_socket".to_string(), "gromimage".to_string()),
		("rom_socket".to_string(), "romimage".to_string()),
	]);
	let grom_resource = xml.find(r#"id="gromimage""#).expect("grom resource");
	let rom_resource = xml.find(r#"id="romimage""#).expect("rom resource");
	assert!(grom_resource < rom_resource, "{xml}");

	let payloads = [
		StoredPayload { socket_id: "rom_socket", file: "phm3058c.bin", data: &rom },
		StoredPayload { socket_id: "grom_socket", file: "phm3058g.bin", data: &grom },
	];
	let xml = String::from_utf8(write_softlist(&title, Board::Standard, &payloads).expect("must write")).expect("utf-8");
	let grom_area = xml.find(r#"<dataarea name="grom_socket""#).expect("grom dataarea");
	let rom_area = xml.find(r#"<dataarea name="rom_socket""#).expect("rom dataarea");
	assert!(grom_area < rom_area, "{xml}");
}

#[test]
fn meta_inf_carries_title_information() {
	let title = title("minimem", "minimem", vec![]);
	let xml = String::from_utf8(write_meta_inf(&title).expect("must write")).expect("utf-8");
	for expected in [
		"<name>Mini Memory</name>",
		"<year>1981</year>",
		"<dist>Texas Instruments</dist>",
		"<number>PHM 3058</number>",
		"<status version=\"2\"/>",
	] {
		assert!(xml.contains(expected), "{expected} missing from {xml}");
	}
}

#[test]
fn softlist_reader_collects_declared_payloads() {
	let data = dump(4, 0x2000);
	let declared = read_softlist(&softlist_declaring(0x2000, &data)).expect("must parse");
	let entry = declared.get("phm3056c.bin").expect("declared");
	assert_eq!(entry.size, 0x2000);
	assert_eq!(entry.checksum, Checksum::of(&data));
}

#[test]
fn container_reads_payloads_and_extras() {
	let data = dump(5, 0x2000);
	let softlist = softlist_declaring(0x2000, &data);
	let bytes = zip_of(&[
		("phm3056c.bin", data.as_slice()),
		("layout.xml", LAYOUT.as_bytes()),
		("softlist.xml", softlist.as_bytes()),
		("notes.txt", &b"hi"[..]),
	]);

	let container = RpkContainer::read(Cursor::new(bytes)).expect("must read");
	assert_eq!(container.list_name.as_deref(), Some("alpiner"));
	assert_eq!(container.pcb, "standard");
	assert_eq!(container.payload("rom_socket").map(|payload| payload.data.len()), Some(0x2000));
	assert_eq!(container.extras, vec!["notes.txt".to_string()]);
	assert_eq!(container.observed().len(), 1);
}

#[test]
fn container_without_layout_is_corrupt() {
	let bytes = zip_of(&[("phm3056c.bin", &[0u8; 16][..])]);
	let err = RpkContainer::read(Cursor::new(bytes)).expect_err("must fail");
	assert!(matches!(err, RpkError::Corrupt(Corruption::MissingLayout)), "{err}");
}

#[test]
fn missing_payload_is_corrupt() {
	let bytes = zip_of(&[("layout.xml", LAYOUT.as_bytes())]);
	let err = RpkContainer::read(Cursor::new(bytes)).expect_err("must fail");
	assert!(
		matches!(&err, RpkError::Corrupt(Corruption::MissingPayload { file, .. }) if file == "phm3056c.bin"),
		"{err}"
	);
}

#[test]
fn short_payload_is_corrupt() {
	let data = dump(6, 0x2000);
	let softlist = softlist_declaring(0x2000, &data);
	let bytes = zip_of(&[
		("phm3056c.bin", &data[..0x1000]),
		("layout.xml", LAYOUT.as_bytes()),
		("softlist.xml", softlist.as_bytes()),
	]);
	let err = RpkContainer::read(Cursor::new(bytes)).expect_err("must fail");
	assert!(
		matches!(err, RpkError::Corrupt(Corruption::SizeMismatch { declared: 0x2000, actual: 0x1000, .. })),
		"{err}"
	);
}

#[test]
fn altered_payload_is_corrupt() {
	let data = dump(7, 0x2000);
	let softlist = softlist_declaring(0x2000, &data);
	let mut altered = data.clone();
	altered[0] ^= 0xFF;
	let bytes = zip_of(&[
		("phm3056c.bin", altered.as_slice()),
		("layout.xml", LAYOUT.as_bytes()),
		("softlist.xml", softlist.as_bytes()),
	]);
	let err = RpkContainer::read(Cursor::new(bytes)).expect_err("must fail");
	assert!(matches!(err, RpkError::Corrupt(Corruption::ChecksumMismatch { .. })), "{err}");
}

#[test]
fn socket_with_undeclared_resource_is_corrupt() {
	let layout = LAYOUT.replace("uses=\"romimage\"", "uses=\"gromimage\"");
	let bytes = zip_of(&[("layout.xml", layout.as_bytes())]);
	let err = RpkContainer::read(Cursor::new(bytes)).expect_err("must fail");
	assert_eq!(
		err.to_string(),
		"corrupt container: socket rom_socket uses undeclared resource gromimage"
	);
}

#[test]
fn garbage_input_is_not_a_container() {
	let err = RpkContainer::read(Cursor::new(b"not a zip at all".to_vec())).expect_err("must fail");
	assert!(matches!(err, RpkError::Corrupt(Corruption::Archive(_))), "{err}");
}

#[test]
fn zip_content_serves_entries_by_file_name() {
	let bytes = zip_of(&[("alpiner/phm3056c.bin", &b"rom"[..]), ("alpiner/phm3056g.bin", &b"grom"[..])]);
	let mut content = ZipContent::new(Cursor::new(bytes)).expect("must open");
	assert_eq!(content.names(), vec!["phm3056c.bin".to_string(), "phm3056g.bin".to_string()]);
	assert_eq!(content.fetch("phm3056g.bin").expect("must read"), Some(b"grom".to_vec()));
	assert_eq!(content.fetch("phm3056d.bin").expect("must read"), None);
}

#[test]
fn paged12k_payloads_map_back_to_both_roms() {
	let common = dump(8, 0x1000);
	let banked = dump(9, 0x2000);
	let title = title("paged12k", "paged12k", vec![DataArea {
		kind: AreaKind::Rom,
		size: 0x4000,
		parts: vec![part("a.bin", &common, 0), part("b.bin", &banked, 0x2000)],
	}]);
	let layout = resolve("paged12k").expect("known board");
	let report = match_title(&title, &mut MemoryContent::from_iter([("a.bin", common.clone()), ("b.bin", banked.clone())]))
		.expect("in-memory reads succeed");

	let bytes = assemble(&title, &layout, &report, &AssembleOptions::default()).expect("must assemble");
	let container = RpkContainer::read(Cursor::new(bytes)).expect("must read");
	assert_eq!(container.pcb, "paged");

	let c = &container.payload("rom_socket").expect("rom payload").data;
	let d = &container.payload("rom2_socket").expect("rom2 payload").data;
	assert_eq!(&c[..0x1000], common.as_slice());
	assert_eq!(&d[..0x1000], common.as_slice());
	assert_eq!(&c[0x1000..], &banked[..0x1000]);
	assert_eq!(&d[0x1000..], &banked[0x1000..]);

	let mut content = RpkContent::new(&container, &title, &layout).expect("same board");
	assert_eq!(content.fetch("a.bin").expect("must read"), Some(common));
	assert_eq!(content.fetch("b.bin").expect("must read"), Some(banked));
}

#[test]
fn container_for_another_board_is_rejected() {
	let data = dump(10, 0x2000);
	let bytes = zip_of(&[("phm3056c.bin", data.as_slice()), ("layout.xml", LAYOUT.as_bytes())]);
	let container = RpkContainer::read(Cursor::new(bytes)).expect("must read");

	let title = title("paged", "paged16k", vec![DataArea {
		kind: AreaKind::Rom,
		size: 0x2000,
		parts: vec![part("phm3056c.bin", &data, 0)],
	}]);
	let err = RpkContent::new(&container, &title, &Board::Paged16k.layout()).expect_err("must fail");
	assert_eq!(err.to_string(), "container is for a standard board, but the title needs paged");
}

#[test]
fn short_payload_truncates_its_part() {
	let data = dump(11, 0x2000);
	let bytes = zip_of(&[("phm3056c.bin", &data[..0x800]), ("layout.xml", LAYOUT.as_bytes())]);
	let container = RpkContainer::read(Cursor::new(bytes)).expect("no softlist to contradict");

	let title = title("alpiner", "standard", vec![DataArea {
		kind: AreaKind::Rom,
		size: 0x2000,
		parts: vec![part("phm3056c.bin", &data, 0)],
	}]);
	let mut content = RpkContent::new(&container, &title, &Board::Standard.layout()).expect("same board");
	let report = match_title(&title, &mut content).expect("in-memory reads succeed");
	assert_eq!(report.results[0].actual_size, Some(0x800));
	assert!(!report.all_matched());
}
