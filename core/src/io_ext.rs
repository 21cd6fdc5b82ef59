use std::io::{
	Read,
	Result
};

pub trait ReadBinExt: Read {
	/// Reads exactly `N` bytes into an array
	#[inline]
	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut buf = [0; N];
		self.read_exact(&mut buf)?;

		Ok(buf)
	}

	/// Reads a fixed-width, NUL padded string.
	/// The whole field is always consumed; the string ends at the first NUL.
	#[inline]
	fn read_fixed_str(&mut self, length: usize) -> Result<String> {
		let mut buf = vec![0; length];
		self.read_exact(&mut buf)?;

		Ok(buf.iter().take_while(|b| **b != 0).map(|b| *b as char).collect())
	}
}

impl<R> ReadBinExt for R
where
	R: Read + ?Sized,
{
}

/// Encodes a string into a fixed-width, NUL padded field, truncating if needed.
/// Characters outside ASCII are stored as `_`.
pub fn fixed_str<const N: usize>(s: &str) -> [u8; N] {
	let mut field = [0; N];

	for (dst, c) in field.iter_mut().zip(s.chars()) {
		*dst = if c.is_ascii() { c as u8 } else { b'_' };
	}

	field
}
