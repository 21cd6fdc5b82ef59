use std::io::{
	self,
	ErrorKind
};

use thiserror::Error;

use gsk_core::texture::TextureError;

use crate::{
	gs::GsError,
	picture::ImageType
};

#[derive(Debug, Error)]
pub enum TimError {
	#[error("Not a TIM2/TIM3 container: {0:#010X}")]
	Signature(u32),
	#[error("Container holds no pictures")]
	EmptyPicture,
	#[error("Picture {index} out of bounds, container holds {total}")]
	PictureIndex {
		index: usize,
		total: usize,
	},
	#[error("Palette index {index} out of bounds for {colors} colors")]
	PaletteIndex {
		index: usize,
		colors: usize,
	},
	#[error("{0} colors exceeds the maximum of 256")]
	PaletteCapacity(usize),
	#[error("{0} colors cannot be stored with 4 bits per pixel")]
	PaletteBpp(usize),
	#[error("Unexpected end of data")]
	BufferUnderrun,
	#[error("Unknown image type: {0:#04X}")]
	ImageType(u8),
	#[error("Image type not supported here: {0}")]
	UnsupportedImageType(ImageType),
	#[error("Image needs {expected} indices, stream holds {got}")]
	ImageSize {
		expected: usize,
		got: usize,
	},
	#[error("Invalid image dimensions: {width}x{height}")]
	Dimensions {
		width: usize,
		height: usize,
	},
	#[error("GS memory error")]
	Gs {
		#[from]
		source: GsError,
	},
	#[error("I/O error")]
	IO {
		#[source]
		source: io::Error,
	},
}

impl From<io::Error> for TimError {
	fn from(source: io::Error) -> Self {
		match source.kind() {
			ErrorKind::UnexpectedEof => TimError::BufferUnderrun,
			_ => TimError::IO {
				source: source,
			},
		}
	}
}

impl From<TextureError> for TimError {
	fn from(source: TextureError) -> Self {
		match source {
			TextureError::PaletteIndex { index, colors } => TimError::PaletteIndex {
				index: index,
				colors: colors,
			},
			TextureError::Size { expected, got } => TimError::ImageSize {
				expected: expected,
				got: got,
			},
		}
	}
}
