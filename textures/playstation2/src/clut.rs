//! CLUT (palette) ordering.
//!
//! 256 color CLUTs are uploaded as a PSMCT32 texture, so in memory every group of 32 entries
//! has its second and third runs of 8 swapped. The swap is its own inverse.

use log::warn;

/// Entries per twiddled group
pub const GROUP: usize = 32;

/// Whether a palette of `len` colors is stored twiddled
pub const fn is_twiddled(len: usize) -> bool {
	len >= GROUP
}

/// Swaps entries 8..16 and 16..24 of every complete 32 entry group.
/// A trailing partial group is copied unchanged.
pub fn twiddle<T: Clone>(colors: &[T]) -> Vec<T> {
	if colors.len() % GROUP != 0 {
		warn!("{} CLUT entries is not a multiple of {}, tail left as-is", colors.len(), GROUP);
	}

	let mut out = Vec::with_capacity(colors.len());
	let mut groups = colors.chunks_exact(GROUP);

	for group in groups.by_ref() {
		out.extend_from_slice(&group[0..8]);
		out.extend_from_slice(&group[16..24]);
		out.extend_from_slice(&group[8..16]);
		out.extend_from_slice(&group[24..32]);
	}

	out.extend_from_slice(groups.remainder());
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_twiddle_order() {
		let colors: Vec<usize> = (0..32).collect();
		let expected: Vec<usize> = (0..8).chain(16..24).chain(8..16).chain(24..32).collect();

		assert_eq!(twiddle(&colors), expected);
	}

	#[test]
	fn test_twiddle_is_involution() {
		for len in [32, 64, 256] {
			let colors: Vec<usize> = (0..len).map(|i| i * 3 + 1).collect();
			assert_eq!(twiddle(&twiddle(&colors)), colors);
		}
	}

	#[test]
	fn test_twiddle_partial_group() {
		let colors: Vec<usize> = (0..40).collect();
		let out = twiddle(&colors);

		assert_eq!(out[8], 16);
		assert_eq!(&out[32..], &colors[32..]);
	}

	#[test]
	fn test_is_twiddled() {
		assert!(!is_twiddled(16));
		assert!(!is_twiddled(31));
		assert!(is_twiddled(32));
		assert!(is_twiddled(256));
	}
}
