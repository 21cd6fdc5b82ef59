use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
	#[error("Palette index {index} out of bounds for {colors} colors")]
	PaletteIndex {
		index: usize,
		colors: usize,
	},
	#[error("Expected {expected} indices for the texture, got {got}")]
	Size {
		expected: usize,
		got: usize,
	},
}

/// An 8 bit per channel color, straight (non-premultiplied) alpha
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Color {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
	pub alpha: u8,
}

impl Color {
	pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Color {
		Color {
			red: red,
			green: green,
			blue: blue,
			alpha: alpha,
		}
	}

	pub const fn from_rgba8(rgba: [u8; 4]) -> Color {
		Color::new(rgba[0], rgba[1], rgba[2], rgba[3])
	}

	pub const fn to_rgba8(&self) -> [u8; 4] {
		[self.red, self.green, self.blue, self.alpha]
	}

	/// Returns a textual hex representation in the form of `#rrggbbaa`
	pub fn hex_rgba(&self) -> String {
		format!("#{:02x}{:02x}{:02x}{:02x}", self.red, self.green, self.blue, self.alpha)
	}
}

/// An indexed raster: up to 256 palette entries and one index per pixel, row-major
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
	pub palette: Vec<Color>,
	pub indices: Vec<u8>,
	pub width: usize,
	pub height: usize,
}

impl Texture {
	pub fn new(width: usize, height: usize) -> Texture {
		Texture {
			palette: vec![],
			indices: vec![],
			width: width,
			height: height,
		}
	}

	/// Checks that there is one index per pixel and every index hits the palette
	pub fn validate(&self) -> Result<(), TextureError> {
		let expected = self.width * self.height;
		if self.indices.len() != expected {
			return Err(TextureError::Size {
				expected: expected,
				got: self.indices.len(),
			});
		}

		if let Some(i) = self.indices.iter().find(|i| (**i as usize) >= self.palette.len()) {
			return Err(TextureError::PaletteIndex {
				index: *i as usize,
				colors: self.palette.len(),
			});
		}

		Ok(())
	}

	/// Uses the palette and indices to build a pixel array
	pub fn pixels(&self) -> Result<Vec<Color>, TextureError> {
		self.validate()?;

		Ok(self.indices.iter().map(|i| self.palette[*i as usize]).collect())
	}

	/// Builds a row-major RGBA8 raster, 4 bytes per pixel
	pub fn to_rgba8(&self) -> Result<Vec<u8>, TextureError> {
		Ok(self.pixels()?.iter().flat_map(|c| c.to_rgba8()).collect())
	}
}

/// Returns the index of the specified color, if present
pub fn find_palette_index(palette: &[Color], color: &Color) -> Option<usize> {
	palette.iter().position(|c| c == color)
}
