use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tirpk_catalog::{AreaKind, Checksum, Crc32, DataArea, Part, Sha1Digest, Title};

use super::*;

fn dump(seed: u8, len: usize) -> Vec<u8> {
	(0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

fn part(name: &str, data: &[u8], offset: u32) -> Part {
	Part {
		name: name.to_string(),
		size: data.len() as u32,
		offset,
		checksum: Checksum::of(data),
	}
}

fn title(areas: Vec<DataArea>) -> Title {
	Title {
		name: "minimem".to_string(),
		description: Some("Mini Memory".to_string()),
		year: Some("1981".to_string()),
		publisher: Some("Texas Instruments".to_string()),
		cloneof: None,
		info: BTreeMap::new(),
		pcb: "minimem".to_string(),
		areas,
	}
}

fn rom_title(rom: &[u8]) -> Title {
	title(vec![DataArea {
		kind: AreaKind::Rom,
		size: 0x2000,
		parts: vec![part("phm3058c.bin", rom, 0)],
	}])
}

struct FailingContent;

impl ContentProvider for FailingContent {
	fn fetch(&mut self, name: &str) -> Result<Option<Vec<u8>>, ContentError> {
		Err(ContentError::Read {
			name: name.to_string(),
			source: "disk on fire".into(),
		})
	}

	fn names(&self) -> Vec<String> {
		vec!["phm3058c.bin".to_string()]
	}
}

#[test]
fn exact_content_matches() {
	let rom = dump(0x10, 0x2000);
	let mut content = MemoryContent::from_iter([("phm3058c.bin", rom.clone())]);

	let report = match_title(&rom_title(&rom), &mut content).expect("in-memory reads succeed");
	assert!(report.is_full_match());
	assert_eq!(report.results.len(), 1);

	let result = &report.results[0];
	assert_eq!(result.actual_size, Some(0x2000));
	assert_eq!(result.actual, Some(Checksum::of(&rom)));
	assert_eq!(result.data.as_deref(), Some(rom.as_slice()));

	let verified = report.verified().expect("all parts matched");
	let parts: Vec<_> = verified.parts().map(|(result, data)| (result.part.as_str(), data.len())).collect();
	assert_eq!(parts, vec![("phm3058c.bin", 0x2000)]);
}

#[test]
fn wrong_checksum_is_reported_with_both_values() {
	let rom = dump(0x10, 0x2000);
	let bad = dump(0x11, 0x2000);
	let mut content = MemoryContent::from_iter([("phm3058c.bin", bad.clone())]);

	let report = match_title(&rom_title(&rom), &mut content).expect("in-memory reads succeed");
	assert!(!report.all_matched());

	let result = &report.results[0];
	assert_eq!(result.mismatches, vec![
		Mismatch::Sha1 {
			expected: Sha1Digest::of(&rom),
			actual: Sha1Digest::of(&bad),
		},
		Mismatch::Crc {
			expected: Crc32::of(&rom),
			actual: Crc32::of(&bad),
		},
	]);
	assert_eq!(result.data, None);
	assert_eq!(
		report.verified().map(|_| ()),
		Err(IncompleteMatch {
			title: "minimem".into(),
			mismatched: 1,
			total: 1,
		})
	);
}

#[test]
fn declared_sha1_outranks_matching_crc() {
	let rom = dump(0x10, 0x2000);
	let mut declared = part("phm3058c.bin", &rom, 0);
	declared.checksum.sha1 = Some(Sha1Digest::from_bytes([0xAA; 20]));
	let title = title(vec![DataArea {
		kind: AreaKind::Rom,
		size: 0x2000,
		parts: vec![declared],
	}]);

	let mut content = MemoryContent::from_iter([("phm3058c.bin", rom)]);
	let report = match_title(&title, &mut content).expect("in-memory reads succeed");
	assert!(matches!(report.results[0].mismatches.as_slice(), [Mismatch::Sha1 { .. }]));
}

#[test]
fn extra_content_is_reported_but_parts_still_match() {
	let rom = dump(0x10, 0x2000);
	let mut content = MemoryContent::from_iter([("phm3058c.bin", rom.clone()), ("readme.txt", b"hello".to_vec())]);

	let report = match_title(&rom_title(&rom), &mut content).expect("in-memory reads succeed");
	assert!(report.all_matched());
	assert!(!report.is_full_match());
	assert_eq!(report.extras, vec!["readme.txt".to_string()]);
	assert!(report.verified().is_ok());
}

#[test]
fn every_broken_part_is_listed() {
	let grom0 = dump(1, 0x1800);
	let grom1 = dump(2, 0x1800);
	let grom2 = dump(3, 0x1800);
	let rom = dump(4, 0x2000);
	let title = title(vec![
		DataArea {
			kind: AreaKind::Grom,
			size: 0x6000,
			parts: vec![part("g0.bin", &grom0, 0), part("g1.bin", &grom1, 0x2000), part("g2.bin", &grom2, 0x4000)],
		},
		DataArea {
			kind: AreaKind::Rom,
			size: 0x2000,
			parts: vec![part("c.bin", &rom, 0)],
		},
	]);

	// g0 missing, g1 truncated, g2 intact, c corrupted.
	let mut content = MemoryContent::from_iter([
		("g1.bin", grom1[..0x1000].to_vec()),
		("g2.bin", grom2.clone()),
		("c.bin", dump(5, 0x2000)),
	]);
	let report = match_title(&title, &mut content).expect("in-memory reads succeed");

	let broken: Vec<&str> = report.mismatched().map(|result| result.part.as_str()).collect();
	assert_eq!(broken, vec!["g0.bin", "g1.bin", "c.bin"]);
	assert_eq!(report.results[0].mismatches, vec![Mismatch::Missing]);
	assert_eq!(report.results[0].actual_size, None);
	assert!(matches!(
		report.results[1].mismatches.first(),
		Some(Mismatch::Size { expected: 0x1800, actual: 0x1000 })
	));
	assert!(report.results[2].matched());
	assert_eq!(report.verified().map(|_| ()).map_err(|err| err.mismatched), Err(3));
}

#[test]
fn provider_failure_aborts() {
	let rom = dump(0x10, 0x2000);
	let err = match_title(&rom_title(&rom), &mut FailingContent).expect_err("provider fails");
	assert_eq!(err.to_string(), "failed to read phm3058c.bin: disk on fire");
}

#[test]
fn observe_hashes_every_entry() {
	let mut content = MemoryContent::from_iter([("b.bin", vec![2u8; 16]), ("a.bin", vec![1u8; 8])]);
	let observed = observe(&mut content).expect("in-memory reads succeed");
	let summary: Vec<_> = observed.iter().map(|file| (file.name.as_str(), file.size)).collect();
	assert_eq!(summary, vec![("a.bin", 8), ("b.bin", 16)]);
	assert_eq!(observed[1].checksum, Checksum::of(&[2u8; 16]));
}

#[rstest]
#[case(Mismatch::Missing, "missing")]
#[case(Mismatch::Size { expected: 0x2000, actual: 0x1000 }, "wrong length 0x1000, expected 0x2000")]
#[case(Mismatch::Crc { expected: Crc32(0xCBF43926), actual: Crc32(0x1) }, "wrong crc32 00000001, expected cbf43926")]
fn mismatch_messages(#[case] mismatch: Mismatch, #[case] message: &str) {
	assert_eq!(mismatch.to_string(), message);
}
