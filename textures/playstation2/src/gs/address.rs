//! Pixel coordinate to local memory byte offset, per pixel storage format.
//!
//! Memory is split into 8 KiB pages of 32 blocks, each block into 4 columns of 16 words.
//! `base` is a block address (64 words) and `buffer_width` is in units of 64 pixels, the same
//! units as the DBP/DBW fields of BITBLTBUF.

use super::tables::*;

pub const WORD_SIZE: usize = 4;
pub const BLOCK_WORDS: usize = 64;
pub const PAGE_WORDS: usize = 2048;
pub const COLUMN_WORDS: usize = 16;

#[inline]
fn word_offset(base: usize, page: usize, block: usize, column: usize, word: usize) -> usize {
	(base * BLOCK_WORDS + page * PAGE_WORDS + block * BLOCK_WORDS + column * COLUMN_WORDS + word) *
		WORD_SIZE
}

/// Byte offset of the 32-bit word holding pixel (x, y) of a PSMCT32 buffer.
/// Pages are 64x32 pixels, blocks 8x8, columns 2 rows high.
pub fn psmct32(base: usize, buffer_width: usize, x: usize, y: usize) -> usize {
	let page = x / 64 + (y / 32) * buffer_width;

	let (px, py) = (x % 64, y % 32);
	let block = BLOCK32[px / 8 + (py / 8) * 8];

	let (bx, by) = (px % 8, py % 8);
	let column = by / 2;
	let word = COLUMN_WORD32[bx + (by % 2) * 8];

	word_offset(base, page, block, column, word)
}

/// Byte offset of pixel (x, y) of a PSMT8 buffer.
/// Pages are 128x64 pixels, blocks 16x16, columns 4 rows high.
pub fn psmt8(base: usize, buffer_width: usize, x: usize, y: usize) -> usize {
	// pages are two buffer width units wide
	let page = x / 128 + (y / 64) * (buffer_width >> 1);

	let (px, py) = (x % 128, y % 64);
	let block = BLOCK8[px / 16 + (py / 16) * 8];

	let (bx, by) = (px % 16, py % 16);
	let column = by / 4;
	let cell = bx + (by % 4) * 16;
	let word = COLUMN_WORD8[column & 1][cell];

	word_offset(base, page, block, column, word) + COLUMN_BYTE8[cell]
}

/// Byte offset of pixel (x, y) of a PSMT4 buffer, and whether it sits in the high nibble.
/// Pages are 128x128 pixels, blocks 32x16, columns 4 rows high.
pub fn psmt4(base: usize, buffer_width: usize, x: usize, y: usize) -> (usize, bool) {
	let page = x / 128 + (y / 128) * (buffer_width >> 1);

	let (px, py) = (x % 128, y % 128);
	let block = BLOCK4[px / 32 + (py / 16) * 4];

	let (bx, by) = (px % 32, py % 16);
	let column = by / 4;
	let cell = bx + (by % 4) * 32;
	let word = COLUMN_WORD4[column & 1][cell];
	let nibble = COLUMN_NIBBLE4[cell];

	(word_offset(base, page, block, column, word) + (nibble >> 1), nibble & 1 != 0)
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	const PAGE_BYTES: usize = PAGE_WORDS * WORD_SIZE;

	#[test]
	fn test_psmct32_points() {
		assert_eq!(psmct32(0, 1, 0, 0), 0);
		assert_eq!(psmct32(0, 1, 1, 0), 4);
		assert_eq!(psmct32(0, 1, 0, 1), 8);
		assert_eq!(psmct32(0, 1, 2, 0), 16);
		assert_eq!(psmct32(0, 1, 0, 2), 64);
		assert_eq!(psmct32(0, 1, 8, 0), 256);
		assert_eq!(psmct32(0, 1, 0, 8), 2 * 256);
		assert_eq!(psmct32(0, 2, 64, 0), PAGE_BYTES);
		assert_eq!(psmct32(0, 2, 0, 32), 2 * PAGE_BYTES);
		assert_eq!(psmct32(1, 1, 0, 0), 256);
	}

	#[test]
	fn test_psmt8_points() {
		assert_eq!(psmt8(0, 2, 0, 0), 0);
		assert_eq!(psmt8(0, 2, 1, 0), 4);
		assert_eq!(psmt8(0, 2, 8, 0), 2);
		assert_eq!(psmt8(0, 2, 0, 1), 8);
		assert_eq!(psmt8(0, 2, 0, 2), 33);
		assert_eq!(psmt8(0, 2, 16, 0), 256);
		assert_eq!(psmt8(0, 4, 128, 0), PAGE_BYTES);
		assert_eq!(psmt8(0, 2, 0, 64), PAGE_BYTES);
	}

	#[test]
	fn test_psmt4_points() {
		assert_eq!(psmt4(0, 2, 0, 0), (0, false));
		assert_eq!(psmt4(0, 2, 1, 0), (4, false));
		assert_eq!(psmt4(0, 2, 8, 0), (1, false));
		assert_eq!(psmt4(0, 2, 0, 2), (32, true));
		assert_eq!(psmt4(0, 2, 32, 0), (2 * 256, false));
		assert_eq!(psmt4(0, 2, 0, 128), (PAGE_BYTES, false));
	}

	#[test]
	fn test_psmct32_page_is_bijective() {
		let mut seen = HashSet::new();

		for y in 0..32 {
			for x in 0..64 {
				let offset = psmct32(0, 1, x, y);
				assert!(offset < PAGE_BYTES);
				assert_eq!(offset % WORD_SIZE, 0);
				assert!(seen.insert(offset));
			}
		}

		assert_eq!(seen.len(), PAGE_WORDS);
	}

	#[test]
	fn test_psmt8_page_is_bijective() {
		let mut seen = HashSet::new();

		for y in 0..64 {
			for x in 0..128 {
				let offset = psmt8(0, 2, x, y);
				assert!(offset < PAGE_BYTES);
				assert!(seen.insert(offset));
			}
		}

		assert_eq!(seen.len(), PAGE_BYTES);
	}

	#[test]
	fn test_psmt4_page_is_bijective() {
		let mut seen = HashSet::new();

		for y in 0..128 {
			for x in 0..128 {
				let (offset, high) = psmt4(0, 2, x, y);
				assert!(offset < PAGE_BYTES);
				assert!(seen.insert((offset, high)));
			}
		}

		assert_eq!(seen.len(), PAGE_BYTES * 2);
	}
}
