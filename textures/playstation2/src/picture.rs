use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use log::debug;

use std::fmt::{
	Display,
	Formatter,
	self
};

use gsk_core::{
	cursor::ByteCursor,
	texture::Color
};

use crate::{
	clut,
	error::TimError,
	gs::{
		Bpp,
		Psm
	}
};

/// Size of a picture header without mipmap or user data
pub const HEADER_SIZE: u16 = 48;

/// Bilinear magnification and minification, base address auto-computed
pub const DEFAULT_TEX1: u64 = 0x260;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ImageType {
	None = 0,
	Rgba16,
	Rgb24,
	Rgba32,
	Indexed4,
	Indexed8,
}

impl ImageType {
	pub fn from_u8(v: u8) -> Result<ImageType, TimError> {
		match v {
			0 => Ok(ImageType::None),
			1 => Ok(ImageType::Rgba16),
			2 => Ok(ImageType::Rgb24),
			3 => Ok(ImageType::Rgba32),
			4 => Ok(ImageType::Indexed4),
			5 => Ok(ImageType::Indexed8),
			_ => Err(TimError::ImageType(v)),
		}
	}

	pub const fn bits_per_pixel(self) -> usize {
		match self {
			ImageType::None => 0,
			ImageType::Rgba16 => 16,
			ImageType::Rgb24 => 24,
			ImageType::Rgba32 => 32,
			ImageType::Indexed4 => 4,
			ImageType::Indexed8 => 8,
		}
	}

	/// Index depth, for the palettized types
	pub const fn bpp(self) -> Option<Bpp> {
		match self {
			ImageType::Indexed4 => Some(Bpp::Four),
			ImageType::Indexed8 => Some(Bpp::Eight),
			_ => None,
		}
	}
}

impl From<Bpp> for ImageType {
	fn from(bpp: Bpp) -> Self {
		match bpp {
			Bpp::Four => ImageType::Indexed4,
			Bpp::Eight => ImageType::Indexed8,
		}
	}
}

impl Display for ImageType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let s = match self {
			ImageType::None => "None",
			ImageType::Rgba16 => "16 Bit Color",
			ImageType::Rgb24 => "24 Bit Color",
			ImageType::Rgba32 => "32 Bit Color",
			ImageType::Indexed4 => "4 Bit Texture",
			ImageType::Indexed8 => "8 Bit Texture",
		};

		write!(f, "{}", s)
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClutStorageMode {
	Csm1,
	Csm2,
}

/// The CLUT type byte: pixel format in the low 5 bits, storage mode in bit 6, compound flag in bit 7
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClutType(pub u8);

impl ClutType {
	/// 32-bit CLUT entries, CSM1
	pub const RGBA32: ClutType = ClutType(3);

	pub fn format(self) -> ImageType {
		match self.0 & 0x1F {
			1 => ImageType::Rgba16,
			2 => ImageType::Rgb24,
			3 => ImageType::Rgba32,
			_ => ImageType::None,
		}
	}

	pub fn storage_mode(self) -> ClutStorageMode {
		if (self.0 >> 6) & 1 == 0 {
			ClutStorageMode::Csm1
		} else {
			ClutStorageMode::Csm2
		}
	}

	pub fn compound(self) -> bool {
		(self.0 >> 7) & 1 == 1
	}
}

impl Display for ClutType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Format: {}, Compound Mode: {}, Storage: {:?}", self.format(), self.compound(),
			self.storage_mode())
	}
}

/// The GS TEX0 register
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tex0 {
	/// Texture base pointer, in blocks
	pub tbp0: u16,
	/// Texture buffer width, in units of 64 pixels
	pub tbw: u8,
	pub psm: u8,
	/// log2 of the width
	pub tw: u8,
	/// log2 of the height
	pub th: u8,
	pub tcc: bool,
	pub tfx: u8,
	/// CLUT base pointer, in blocks
	pub cbp: u16,
	pub cpsm: u8,
	pub csm: bool,
	pub csa: u8,
	pub cld: u8,
}

impl Tex0 {
	pub fn from_bits(v: u64) -> Tex0 {
		Tex0 {
			tbp0: (v & 0x3FFF) as u16,
			tbw: ((v >> 14) & 0x3F) as u8,
			psm: ((v >> 20) & 0x3F) as u8,
			tw: ((v >> 26) & 0xF) as u8,
			th: ((v >> 30) & 0xF) as u8,
			tcc: (v >> 34) & 1 == 1,
			tfx: ((v >> 35) & 0x3) as u8,
			cbp: ((v >> 37) & 0x3FFF) as u16,
			cpsm: ((v >> 51) & 0xF) as u8,
			csm: (v >> 55) & 1 == 1,
			csa: ((v >> 56) & 0x1F) as u8,
			cld: ((v >> 61) & 0x7) as u8,
		}
	}

	pub fn to_bits(&self) -> u64 {
		(self.tbp0 as u64 & 0x3FFF) |
			(self.tbw as u64 & 0x3F) << 14 |
			(self.psm as u64 & 0x3F) << 20 |
			(self.tw as u64 & 0xF) << 26 |
			(self.th as u64 & 0xF) << 30 |
			(self.tcc as u64) << 34 |
			(self.tfx as u64 & 0x3) << 35 |
			(self.cbp as u64 & 0x3FFF) << 37 |
			(self.cpsm as u64 & 0xF) << 51 |
			(self.csm as u64) << 55 |
			(self.csa as u64 & 0x1F) << 56 |
			(self.cld as u64 & 0x7) << 61
	}

	/// TEX0 for an indexed texture at block 0 with its CLUT at block 0
	pub fn for_indexed(width: u16, height: u16, bpp: Bpp) -> Tex0 {
		Tex0 {
			tbw: (width / 64) as u8,
			psm: bpp.psm() as u8,
			tw: width.max(1).ilog2() as u8,
			th: height.max(1).ilog2() as u8,
			cpsm: Psm::Ct32 as u8,
			..Tex0::default()
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PictureHeader {
	/// Header, image and CLUT sizes combined
	pub total_size: u32,
	pub clut_size: u32,
	pub image_size: u32,
	pub header_size: u16,
	pub clut_colors: u16,
	pub picture_format: u8,
	pub num_mipmaps: u8,
	pub clut_type: ClutType,
	pub image_type: ImageType,
	pub width: u16,
	pub height: u16,
	pub tex0: Tex0,
	pub tex1: u64,
	pub regs: u32,
	pub tex_clut: u32,
}

impl PictureHeader {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<PictureHeader, TimError>
	where
		R: ReadBytesExt,
	{
		Ok(PictureHeader {
			total_size: buf.read_u32::<LE>()?,
			clut_size: buf.read_u32::<LE>()?,
			image_size: buf.read_u32::<LE>()?,
			header_size: buf.read_u16::<LE>()?,
			clut_colors: buf.read_u16::<LE>()?,
			picture_format: buf.read_u8()?,
			num_mipmaps: buf.read_u8()?,
			clut_type: ClutType(buf.read_u8()?),
			image_type: ImageType::from_u8(buf.read_u8()?)?,
			width: buf.read_u16::<LE>()?,
			height: buf.read_u16::<LE>()?,
			tex0: Tex0::from_bits(buf.read_u64::<LE>()?),
			tex1: buf.read_u64::<LE>()?,
			regs: buf.read_u32::<LE>()?,
			tex_clut: buf.read_u32::<LE>()?,
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> Result<(), TimError>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.total_size)?;
		buf.write_u32::<LE>(self.clut_size)?;
		buf.write_u32::<LE>(self.image_size)?;
		buf.write_u16::<LE>(self.header_size)?;
		buf.write_u16::<LE>(self.clut_colors)?;
		buf.write_u8(self.picture_format)?;
		buf.write_u8(self.num_mipmaps)?;
		buf.write_u8(self.clut_type.0)?;
		buf.write_u8(self.image_type as u8)?;
		buf.write_u16::<LE>(self.width)?;
		buf.write_u16::<LE>(self.height)?;
		buf.write_u64::<LE>(self.tex0.to_bits())?;
		buf.write_u64::<LE>(self.tex1)?;
		buf.write_u32::<LE>(self.regs)?;
		buf.write_u32::<LE>(self.tex_clut)?;

		Ok(())
	}
}

/// A single picture as stored: the index stream in file order (tiled for swizzled TIM3 pictures)
/// and the CLUT in logical order with GS alpha (0..=128).
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
	pub header: PictureHeader,
	pub data: Vec<u8>,
	pub clut: Vec<Color>,
}

impl Picture {
	#[cfg(feature = "import")]
	pub fn read(cur: &mut ByteCursor) -> Result<Picture, TimError> {
		let header = PictureHeader::read(cur)?;
		debug!("picture {}x{} {}, {} bytes, {} colors ({})", header.width, header.height,
			header.image_type, header.image_size, header.clut_colors, header.clut_type);

		let data = cur.read_bytes(header.image_size as usize)?.to_vec();

		let colors = header.clut_colors as usize;
		let mut clut: Vec<Color> = cur.read_bytes(colors * 4)?
			.chunks_exact(4)
			.map(|c| Color::new(c[0], c[1], c[2], c[3]))
			.collect();

		if clut::is_twiddled(colors) {
			clut = clut::twiddle(&clut);
		}

		Ok(Picture {
			header: header,
			data: data,
			clut: clut,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> Result<(), TimError>
	where
		W: WriteBytesExt,
	{
		self.header.write(buf)?;
		buf.write_all(&self.data)?;

		let stored;
		let clut = if clut::is_twiddled(self.clut.len()) {
			stored = clut::twiddle(&self.clut);
			&stored
		} else {
			&self.clut
		};

		for c in clut.iter() {
			buf.write_all(&c.to_rgba8())?;
		}

		Ok(())
	}

	/// Number of bytes [`Picture::write`] produces
	pub fn size(&self) -> usize {
		HEADER_SIZE as usize + self.data.len() + self.clut.len() * 4
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tex0_fields() {
		let tex0 = Tex0::for_indexed(256, 128, Bpp::Eight);

		assert_eq!(tex0.tw, 8);
		assert_eq!(tex0.th, 7);
		assert_eq!(tex0.tbw, 4);
		assert_eq!(tex0.psm, 0x13);
		assert_eq!(tex0.to_bits(), (7 << 30) | (8 << 26) | (0x13 << 20) | (4 << 14));
	}

	#[test]
	fn test_tex0_bits_round_trip() {
		for bits in [0u64, u64::MAX, 0x0123_4567_89AB_CDEF, 0xA5A5_5A5A_F00F_0FF0] {
			assert_eq!(Tex0::from_bits(bits).to_bits(), bits);
		}

		let tex0 = Tex0::from_bits(u64::MAX);
		assert_eq!(tex0.cld, 7);
		assert_eq!(tex0.cbp, 0x3FFF);
		assert!(tex0.csm);
	}

	#[test]
	fn test_tex0_small_width() {
		let tex0 = Tex0::for_indexed(16, 8, Bpp::Four);

		assert_eq!(tex0.tbw, 0);
		assert_eq!(tex0.tw, 4);
		assert_eq!(tex0.th, 3);
		assert_eq!(tex0.psm, 0x14);
	}

	#[test]
	fn test_image_type() {
		assert_eq!(ImageType::from_u8(5).unwrap(), ImageType::Indexed8);
		assert_eq!(ImageType::Indexed4.bpp(), Some(Bpp::Four));
		assert_eq!(ImageType::Rgb24.bpp(), None);
		assert_eq!(ImageType::Rgb24.bits_per_pixel(), 24);
		assert_eq!(ImageType::Indexed4.to_string(), "4 Bit Texture");
		assert!(matches!(ImageType::from_u8(6), Err(TimError::ImageType(6))));
	}

	#[test]
	fn test_clut_type() {
		let t = ClutType(0xC3);

		assert_eq!(t.format(), ImageType::Rgba32);
		assert_eq!(t.storage_mode(), ClutStorageMode::Csm2);
		assert!(t.compound());
		assert_eq!(ClutType::RGBA32.storage_mode(), ClutStorageMode::Csm1);
		assert!(!ClutType::RGBA32.compound());
	}
}
