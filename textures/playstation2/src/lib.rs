pub mod clut;
pub mod error;
pub mod gs;
pub mod picture;
pub mod raster;
pub mod tm2;

#[cfg(feature = "import")]
use std::fs;

use gsk_core::texture::{
	Color,
	find_palette_index,
	Texture
};

pub use error::TimError;
pub use raster::{
	ExportCfg,
	ImportCfg,
	ImportFlag
};
pub use tm2::{
	Tm2,
	Variant
};

/// Reads a TIM2 or TIM3 file, telling them apart by magic
#[cfg(feature = "import")]
pub fn read_tm2(filepath: &str) -> Result<Tm2, TimError> {
	let input = fs::read(filepath)?;
	Tm2::from_bytes_any(&input)
}

/// Builds an indexed texture out of a row-major RGBA8 raster, one palette entry per distinct color
pub fn texture_from_rgba8(width: usize, height: usize, rgba: &[u8]) -> Result<Texture, TimError> {
	let expected = width * height;
	if rgba.len() / 4 != expected || rgba.len() % 4 != 0 {
		return Err(TimError::ImageSize {
			expected: expected,
			got: rgba.len() / 4,
		});
	}

	let mut texture = Texture::new(width, height);
	texture.indices.reserve(expected);

	for px in rgba.chunks_exact(4) {
		let c = Color::from_rgba8([px[0], px[1], px[2], px[3]]);

		// Since these are direct color values, we'll have to build a palette.
		let i = match find_palette_index(&texture.palette, &c) {
			Some(i) => i,
			None => {
				let i = texture.palette.len();
				if i == 256 {
					return Err(TimError::PaletteCapacity(i + 1));
				}

				texture.palette.push(c);
				i
			}
		};

		texture.indices.push(i as u8);
	}

	Ok(texture)
}
