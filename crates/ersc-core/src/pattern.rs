// Naive subsequence search. Needles are owner-id sized and the haystack is a
// single slot, so a plain scan over every candidate offset is enough.

/// Lazily yields every offset in `haystack` where `needle` starts, ascending.
///
/// Overlapping occurrences are all reported. An empty needle yields nothing
/// (callers must not rely on that), as does a needle longer than the haystack.
pub fn starting_indices<'a>(
    haystack: &'a [u8],
    needle: &'a [u8],
) -> impl Iterator<Item = usize> + 'a {
    debug_assert!(!needle.is_empty(), "empty needle");
    let candidates = if needle.is_empty() || needle.len() > haystack.len() {
        0..0
    } else {
        0..haystack.len() - needle.len() + 1
    };
    candidates.filter(move |&start| {
        needle
            .iter()
            .enumerate()
            .all(|(i, b)| haystack[start + i] == *b)
    })
}

/// Overwrites every occurrence of `from` inside `buf` with `to`.
///
/// Offsets are collected before writing, so a replacement can never create
/// or hide a later match. Returns the offsets that were rewritten.
pub(crate) fn replace_all(buf: &mut [u8], from: &[u8], to: &[u8]) -> Vec<usize> {
    assert_eq!(from.len(), to.len(), "replacement must keep the same width");
    let hits: Vec<usize> = starting_indices(buf, from).collect();
    for &at in &hits {
        buf[at..at + to.len()].copy_from_slice(to);
    }
    hits
}
