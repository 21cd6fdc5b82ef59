//! Emulation of the Graphics Synthesizer's local memory addressing.
//!
//! A [`GsMemory`] is a plain owned buffer, so every conversion can use its own plane.

pub mod address;
pub mod swizzle;
pub mod tables;

use thiserror::Error;

pub use swizzle::{
	swizzle,
	unswizzle
};

/// Size of GS local memory
pub const MEMORY_SIZE: usize = 1024 * 1024 * 4;

#[derive(Debug, Error, PartialEq)]
pub enum GsError {
	#[error("Address {0:#X} is outside of GS local memory")]
	MemoryOverflow(usize),
	#[error("Transfer needs {expected} bytes, buffer holds {got}")]
	DataSize {
		expected: usize,
		got: usize,
	},
	#[error("Cannot swizzle a {width}x{height} image")]
	Dimensions {
		width: usize,
		height: usize,
	},
}

/// Pixel storage formats the address engine knows about
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Psm {
	Ct32 = 0x00,
	T8 = 0x13,
	T4 = 0x14,
}

impl Psm {
	/// Bytes needed to hold `pixels` pixels in this format
	pub const fn bytes_for(self, pixels: usize) -> usize {
		match self {
			Psm::Ct32 => pixels * 4,
			Psm::T8 => pixels,
			Psm::T4 => (pixels + 1) / 2,
		}
	}
}

/// Bit depth of an indexed image
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Bpp {
	Four = 4,
	Eight = 8,
}

impl Bpp {
	pub const fn psm(self) -> Psm {
		match self {
			Bpp::Four => Psm::T4,
			Bpp::Eight => Psm::T8,
		}
	}

	/// Largest palette an image of this depth can address
	pub const fn palette_capacity(self) -> usize {
		match self {
			Bpp::Four => 16,
			Bpp::Eight => 256,
		}
	}

	/// Size in bytes of a packed index stream
	pub const fn stream_size(self, width: usize, height: usize) -> usize {
		self.psm().bytes_for(width * height)
	}
}

/// A rectangular transfer to or from local memory, in the units of BITBLTBUF/TRXPOS/TRXREG
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Transfer {
	/// Base block pointer
	pub base: usize,
	/// Buffer width in units of 64 pixels
	pub buffer_width: usize,
	pub x: usize,
	pub y: usize,
	pub width: usize,
	pub height: usize,
}

impl Transfer {
	/// A transfer of the top-left `width`x`height` rectangle of a buffer at block 0
	pub fn new(width: usize, height: usize, buffer_width: usize) -> Transfer {
		Transfer {
			base: 0,
			buffer_width: buffer_width,
			x: 0,
			y: 0,
			width: width,
			height: height,
		}
	}

	pub fn pixels(&self) -> usize {
		self.width * self.height
	}

	/// Every coordinate of the rectangle, row-major
	fn coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		(self.y..self.y + self.height)
			.flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
	}

	fn check(&self, psm: Psm, len: usize) -> Result<(), GsError> {
		let expected = psm.bytes_for(self.pixels());
		if len < expected {
			return Err(GsError::DataSize {
				expected: expected,
				got: len,
			});
		}

		Ok(())
	}
}

/// GS local memory, 4 MiB
#[derive(Clone)]
pub struct GsMemory {
	bytes: Box<[u8]>,
}

impl GsMemory {
	pub fn new() -> GsMemory {
		GsMemory {
			bytes: vec![0; MEMORY_SIZE].into_boxed_slice(),
		}
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	#[inline]
	fn byte(&self, offset: usize) -> Result<u8, GsError> {
		self.bytes.get(offset).copied().ok_or(GsError::MemoryOverflow(offset))
	}

	#[inline]
	fn byte_mut(&mut self, offset: usize) -> Result<&mut u8, GsError> {
		self.bytes.get_mut(offset).ok_or(GsError::MemoryOverflow(offset))
	}

	#[inline]
	fn word_mut(&mut self, offset: usize) -> Result<&mut [u8], GsError> {
		self.bytes.get_mut(offset..offset + 4).ok_or(GsError::MemoryOverflow(offset))
	}

	/// Host to local transfer of 32-bit pixels
	pub fn write_psmct32(&mut self, trx: &Transfer, data: &[u8]) -> Result<(), GsError> {
		trx.check(Psm::Ct32, data.len())?;

		for ((x, y), src) in trx.coords().zip(data.chunks_exact(4)) {
			let offset = address::psmct32(trx.base, trx.buffer_width, x, y);
			self.word_mut(offset)?.copy_from_slice(src);
		}

		Ok(())
	}

	/// Local to host transfer of 32-bit pixels
	pub fn read_psmct32(&self, trx: &Transfer, out: &mut [u8]) -> Result<(), GsError> {
		trx.check(Psm::Ct32, out.len())?;

		for ((x, y), dst) in trx.coords().zip(out.chunks_exact_mut(4)) {
			let offset = address::psmct32(trx.base, trx.buffer_width, x, y);
			let word = self.bytes.get(offset..offset + 4).ok_or(GsError::MemoryOverflow(offset))?;
			dst.copy_from_slice(word);
		}

		Ok(())
	}

	/// Host to local transfer of 8-bit indices
	pub fn write_psmt8(&mut self, trx: &Transfer, data: &[u8]) -> Result<(), GsError> {
		trx.check(Psm::T8, data.len())?;

		for ((x, y), src) in trx.coords().zip(data.iter()) {
			*self.byte_mut(address::psmt8(trx.base, trx.buffer_width, x, y))? = *src;
		}

		Ok(())
	}

	/// Local to host transfer of 8-bit indices
	pub fn read_psmt8(&self, trx: &Transfer, out: &mut [u8]) -> Result<(), GsError> {
		trx.check(Psm::T8, out.len())?;

		for ((x, y), dst) in trx.coords().zip(out.iter_mut()) {
			*dst = self.byte(address::psmt8(trx.base, trx.buffer_width, x, y))?;
		}

		Ok(())
	}

	/// Host to local transfer of 4-bit indices, two per byte with the low nibble first
	pub fn write_psmt4(&mut self, trx: &Transfer, data: &[u8]) -> Result<(), GsError> {
		trx.check(Psm::T4, data.len())?;

		let mut src = 0;
		let mut odd = false;

		for (x, y) in trx.coords() {
			let (offset, high) = address::psmt4(trx.base, trx.buffer_width, x, y);
			let sample = if odd { data[src] >> 4 } else { data[src] & 0x0F };

			let dst = self.byte_mut(offset)?;
			*dst = if high {
				(*dst & 0x0F) | (sample << 4)
			} else {
				(*dst & 0xF0) | sample
			};

			if odd {
				src += 1;
			}
			odd = !odd;
		}

		Ok(())
	}

	/// Local to host transfer of 4-bit indices, two per byte with the low nibble first
	pub fn read_psmt4(&self, trx: &Transfer, out: &mut [u8]) -> Result<(), GsError> {
		trx.check(Psm::T4, out.len())?;

		let mut dst = 0;
		let mut odd = false;

		for (x, y) in trx.coords() {
			let (offset, high) = address::psmt4(trx.base, trx.buffer_width, x, y);
			let pix = self.byte(offset)?;
			let sample = if high { pix >> 4 } else { pix & 0x0F };

			out[dst] = if odd {
				(out[dst] & 0x0F) | (sample << 4)
			} else {
				(out[dst] & 0xF0) | sample
			};

			if odd {
				dst += 1;
			}
			odd = !odd;
		}

		Ok(())
	}
}

impl Default for GsMemory {
	fn default() -> Self {
		GsMemory::new()
	}
}

impl std::fmt::Debug for GsMemory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GsMemory").field("size", &self.bytes.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_psmct32_transfer() {
		let mut mem = GsMemory::new();
		let trx = Transfer::new(64, 32, 1);
		let data: Vec<u8> = (0..trx.pixels() * 4).map(|i| i as u8).collect();

		mem.write_psmct32(&trx, &data).unwrap();

		// second pixel of the first row lands in word 1
		assert_eq!(&mem.as_bytes()[4..8], &data[4..8]);

		let mut out = vec![0; data.len()];
		mem.read_psmct32(&trx, &mut out).unwrap();
		assert_eq!(out, data);
	}

	#[test]
	fn test_psmt8_transfer() {
		let mut mem = GsMemory::new();
		let trx = Transfer::new(128, 64, 2);
		let data: Vec<u8> = (0..trx.pixels()).map(|i| (i * 7) as u8).collect();

		mem.write_psmt8(&trx, &data).unwrap();
		assert_eq!(mem.as_bytes()[2], data[8]);

		let mut out = vec![0; data.len()];
		mem.read_psmt8(&trx, &mut out).unwrap();
		assert_eq!(out, data);
	}

	#[test]
	fn test_psmt4_transfer() {
		let mut mem = GsMemory::new();
		let trx = Transfer::new(128, 128, 2);
		let data: Vec<u8> = (0..trx.pixels() / 2).map(|i| (i * 13) as u8).collect();

		mem.write_psmt4(&trx, &data).unwrap();

		// pixel (0, 2) is the high nibble of byte 32; row 2 starts at packed byte 128
		assert_eq!(mem.as_bytes()[32] >> 4, data[128] & 0x0F);

		let mut out = vec![0; data.len()];
		mem.read_psmt4(&trx, &mut out).unwrap();
		assert_eq!(out, data);
	}

	#[test]
	fn test_short_buffer() {
		let mut mem = GsMemory::new();
		let trx = Transfer::new(16, 16, 1);

		assert_eq!(mem.write_psmt8(&trx, &[0; 255]), Err(GsError::DataSize { expected: 256, got: 255 }));
		assert_eq!(mem.read_psmt4(&trx, &mut [0; 127]), Err(GsError::DataSize { expected: 128, got: 127 }));
	}

	#[test]
	fn test_overflow() {
		let mut mem = GsMemory::new();
		let trx = Transfer {
			base: MEMORY_SIZE / 256,
			..Transfer::new(1, 1, 1)
		};

		assert_eq!(mem.write_psmct32(&trx, &[0; 4]), Err(GsError::MemoryOverflow(MEMORY_SIZE)));
	}
}
