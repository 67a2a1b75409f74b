use std::collections::BTreeSet;

use tirpk_catalog::{AreaKind, Checksum, ObservedFile, Part, Title};

use crate::provider::{ContentError, ContentProvider};
use crate::report::{MatchReport, MatchResult, Mismatch};

/// Compares every declared part of `title` with the content `provider`
/// offers under the part's name.
///
/// Missing or differing content is recorded in the part's result and
/// matching carries on with the next part. Names nobody claimed end up in
/// [`MatchReport::extras`].
pub fn match_title<P>(title: &Title, provider: &mut P) -> Result<MatchReport, ContentError>
where
	P: ContentProvider + ?Sized,
{
	let mut results = Vec::with_capacity(title.part_count());
	for (area, part) in title.parts() {
		let content = provider.fetch(&part.name)?;
		let result = compare(area.kind, part, content);
		for mismatch in &result.mismatches {
			tracing::debug!(title = %title.name, part = %part.name, %mismatch, "part mismatch");
		}
		results.push(result);
	}

	let claimed: BTreeSet<&str> = title.parts().map(|(_, part)| part.name.as_str()).collect();
	let extras: Vec<String> = provider
		.names()
		.into_iter()
		.filter(|name| !claimed.contains(name.as_str()))
		.collect();
	for extra in &extras {
		tracing::warn!(title = %title.name, entry = %extra, "unexpected extra content");
	}

	let report = MatchReport {
		title: title.name.clone(),
		results,
		extras,
	};
	tracing::debug!(
		title = %report.title,
		parts = report.results.len(),
		mismatched = report.mismatched().count(),
		extras = report.extras.len(),
		"matched content"
	);
	Ok(report)
}

/// Hashes every entry `provider` offers, for title lookup.
pub fn observe<P>(provider: &mut P) -> Result<Vec<ObservedFile>, ContentError>
where
	P: ContentProvider + ?Sized,
{
	let mut observed = Vec::new();
	for name in provider.names() {
		if let Some(data) = provider.fetch(&name)? {
			observed.push(ObservedFile::of(name, &data));
		}
	}
	Ok(observed)
}

fn compare(area: AreaKind, part: &Part, content: Option<Vec<u8>>) -> MatchResult {
	let mut result = MatchResult {
		part: part.name.clone(),
		area,
		offset: part.offset,
		expected_size: part.size,
		expected: part.checksum,
		actual_size: None,
		actual: None,
		mismatches: Vec::new(),
		data: None,
	};
	let Some(data) = content else {
		result.mismatches.push(Mismatch::Missing);
		return result;
	};

	let actual_size = data.len() as u64;
	let actual = Checksum::of(&data);
	if actual_size != u64::from(part.size) {
		result.mismatches.push(Mismatch::Size {
			expected: u64::from(part.size),
			actual: actual_size,
		});
	}
	if let (Some(expected), Some(found)) = (part.checksum.sha1, actual.sha1)
		&& expected != found
	{
		result.mismatches.push(Mismatch::Sha1 { expected, actual: found });
	}
	if let (Some(expected), Some(found)) = (part.checksum.crc, actual.crc)
		&& expected != found
	{
		result.mismatches.push(Mismatch::Crc { expected, actual: found });
	}

	result.actual_size = Some(actual_size);
	result.actual = Some(actual);
	if result.mismatches.is_empty() {
		result.data = Some(data);
	}
	result
}
