use log::trace;

use super::{
	Bpp,
	GsError,
	GsMemory,
	Transfer
};

/// PSMT4 and PSMT8 pages are 128 pixels wide; narrower page rows map onto other pages' memory
const WIDTH_ALIGN: usize = 128;

/// Splits an indexed image into the PSMCT32 rectangle covering the same bytes and the
/// rectangle of the image itself.
///
/// A 32-bit word holds 8 4-bit or 4 8-bit pixels, laid out as 2x4 or 2x2 pixels,
/// hence the halved width and quartered/halved height. Both views must cover the same blocks,
/// so widths are whole pages, 4-bit heights whole 128 row pages and 8-bit heights whole columns.
fn transfers(width: usize, height: usize, bpp: Bpp) -> Result<(Transfer, Transfer), GsError> {
	let (rows, height_align) = match bpp {
		Bpp::Four => (4, 128),
		Bpp::Eight => (2, 4),
	};

	if width == 0 || height == 0 || width % WIDTH_ALIGN != 0 || height % height_align != 0 {
		return Err(GsError::Dimensions {
			width: width,
			height: height,
		});
	}

	let packed_width = width / 2;
	let packed = Transfer::new(packed_width, height / rows, packed_width / 64);
	let indexed = Transfer::new(width, height, width / 64);

	Ok((packed, indexed))
}

impl GsMemory {
	/// Converts an index stream from GS memory order into linear order.
	///
	/// The stream is uploaded as PSMCT32 and read back as PSMT4/PSMT8. The touched region is
	/// fully overwritten first, so earlier contents of the plane do not matter.
	pub fn unswizzle(&mut self, data: &[u8], width: usize, height: usize, bpp: Bpp)
		-> Result<Vec<u8>, GsError>
	{
		let (packed, indexed) = transfers(width, height, bpp)?;
		trace!("unswizzle {}x{} {:?}: {:?} -> {:?}", width, height, bpp, packed, indexed);

		let mut out = vec![0; data.len()];
		self.write_psmct32(&packed, data)?;

		match bpp {
			Bpp::Four => self.read_psmt4(&indexed, &mut out)?,
			Bpp::Eight => self.read_psmt8(&indexed, &mut out)?,
		}

		Ok(out)
	}

	/// Converts a linear index stream into GS memory order, the inverse of [`GsMemory::unswizzle`]
	pub fn swizzle(&mut self, data: &[u8], width: usize, height: usize, bpp: Bpp)
		-> Result<Vec<u8>, GsError>
	{
		let (packed, indexed) = transfers(width, height, bpp)?;
		trace!("swizzle {}x{} {:?}: {:?} -> {:?}", width, height, bpp, indexed, packed);

		let mut out = vec![0; data.len()];

		match bpp {
			Bpp::Four => self.write_psmt4(&indexed, data)?,
			Bpp::Eight => self.write_psmt8(&indexed, data)?,
		}
		self.read_psmct32(&packed, &mut out)?;

		Ok(out)
	}
}

/// [`GsMemory::unswizzle`] on a fresh memory plane
pub fn unswizzle(data: &[u8], width: usize, height: usize, bpp: Bpp) -> Result<Vec<u8>, GsError> {
	GsMemory::new().unswizzle(data, width, height, bpp)
}

/// [`GsMemory::swizzle`] on a fresh memory plane
pub fn swizzle(data: &[u8], width: usize, height: usize, bpp: Bpp) -> Result<Vec<u8>, GsError> {
	GsMemory::new().swizzle(data, width, height, bpp)
}
