use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use log::debug;
use rayon::prelude::*;

use gsk_core::{
	cursor::ByteCursor,
	io_ext::ReadBinExt,
	rtag4,
	texture::Texture
};

use crate::{
	error::TimError,
	picture::{
		Picture,
		PictureHeader
	},
	raster::{
		ExportCfg,
		ImportCfg
	}
};

pub const TIM2_MAGIC: u32 = rtag4!(b"TIM2");
pub const TIM3_MAGIC: u32 = rtag4!(b"TIM3");

/// Version byte written into new containers
pub const FORMAT_VERSION: u8 = 4;

/// Below this size in either dimension the GS cannot hold a texture swizzled
pub const TILE_MIN: u16 = 128;

/// The two container flavours, which differ in magic and in whether pixel data is swizzled
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Variant {
	/// Index streams are always linear
	Tim2,
	/// Index streams of pictures at least 128x128 are stored in GS memory order
	Tim3,
}

impl Variant {
	pub const fn magic(self) -> u32 {
		match self {
			Variant::Tim2 => TIM2_MAGIC,
			Variant::Tim3 => TIM3_MAGIC,
		}
	}

	pub const fn from_magic(magic: u32) -> Option<Variant> {
		match magic {
			TIM2_MAGIC => Some(Variant::Tim2),
			TIM3_MAGIC => Some(Variant::Tim3),
			_ => None,
		}
	}

	/// Format id byte written into new containers
	pub const fn format_id(self) -> u8 {
		match self {
			Variant::Tim2 => 0,
			Variant::Tim3 => 6,
		}
	}

	/// Whether a picture's index stream is stored swizzled
	pub const fn is_tiled(self, width: u16, height: u16) -> bool {
		match self {
			Variant::Tim2 => false,
			Variant::Tim3 => width >= TILE_MIN && height >= TILE_MIN,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	pub magic: u32,
	pub format_version: u8,
	pub format_id: u8,
	pub num_pictures: u16,
	reserved: [u8; 8],
}

impl Header {
	pub fn new(variant: Variant, format_version: u8, num_pictures: u16) -> Header {
		Header {
			magic: variant.magic(),
			format_version: format_version,
			format_id: variant.format_id(),
			num_pictures: num_pictures,
			reserved: [0; 8],
		}
	}

	#[cfg(feature = "import")]
	fn read(cur: &mut ByteCursor, expected: Option<Variant>) -> Result<(Header, Variant), TimError> {
		let magic = cur.read_u32::<LE>()?;

		let variant = match (Variant::from_magic(magic), expected) {
			(Some(v), None) => v,
			(Some(v), Some(e)) if v == e => v,
			_ => return Err(TimError::Signature(magic)),
		};

		let header = Header {
			magic: magic,
			format_version: cur.read_u8()?,
			format_id: cur.read_u8()?,
			num_pictures: cur.read_u16::<LE>()?,
			reserved: cur.read_array()?,
		};

		Ok((header, variant))
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> Result<(), TimError>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.magic)?;
		buf.write_u8(self.format_version)?;
		buf.write_u8(self.format_id)?;
		buf.write_u16::<LE>(self.num_pictures)?;
		buf.write_all(&self.reserved)?;

		Ok(())
	}
}

/// A TIM2 or TIM3 picture container
#[derive(Clone, Debug, PartialEq)]
pub struct Tm2 {
	pub variant: Variant,
	pub header: Header,
	pub pictures: Vec<Picture>,
}

impl Tm2 {
	/// Parses a container of the given variant at the cursor position
	#[cfg(feature = "import")]
	pub fn read(cur: &mut ByteCursor, variant: Variant) -> Result<Tm2, TimError> {
		Tm2::read_inner(cur, Some(variant))
	}

	/// Parses a container at the cursor position, taking the variant from its magic
	#[cfg(feature = "import")]
	pub fn read_any(cur: &mut ByteCursor) -> Result<Tm2, TimError> {
		Tm2::read_inner(cur, None)
	}

	#[cfg(feature = "import")]
	fn read_inner(cur: &mut ByteCursor, expected: Option<Variant>) -> Result<Tm2, TimError> {
		let (header, variant) = Header::read(cur, expected)?;
		debug!("{:?} v{} id {}, {} pictures", variant, header.format_version, header.format_id,
			header.num_pictures);

		let mut pictures = Vec::with_capacity(header.num_pictures as usize);
		for _ in 0..header.num_pictures {
			pictures.push(Picture::read(cur)?);
		}

		Ok(Tm2 {
			variant: variant,
			header: header,
			pictures: pictures,
		})
	}

	#[cfg(feature = "import")]
	pub fn from_bytes(data: &[u8], variant: Variant) -> Result<Tm2, TimError> {
		Tm2::read(&mut ByteCursor::new(data), variant)
	}

	#[cfg(feature = "import")]
	pub fn from_bytes_any(data: &[u8]) -> Result<Tm2, TimError> {
		Tm2::read_any(&mut ByteCursor::new(data))
	}

	pub fn picture(&self, index: usize) -> Result<&Picture, TimError> {
		if self.pictures.is_empty() {
			return Err(TimError::EmptyPicture);
		}

		self.pictures.get(index).ok_or(TimError::PictureIndex {
			index: index,
			total: self.pictures.len(),
		})
	}

	/// Decodes one picture into an indexed raster
	#[cfg(feature = "import")]
	pub fn to_texture(&self, index: usize, cfg: &ImportCfg) -> Result<Texture, TimError> {
		self.picture(index)?.to_texture(self.variant, cfg)
	}

	/// Decodes every picture, in parallel, each with its own GS memory
	#[cfg(feature = "import")]
	pub fn to_textures(&self, cfg: &ImportCfg) -> Result<Vec<Texture>, TimError> {
		if self.pictures.is_empty() {
			return Err(TimError::EmptyPicture);
		}

		self.pictures.par_iter().map(|p| p.to_texture(self.variant, cfg)).collect()
	}

	/// Builds a container holding one picture per texture
	#[cfg(feature = "export")]
	pub fn from_textures(variant: Variant, textures: &[Texture], cfg: &ExportCfg) -> Result<Tm2, TimError> {
		let pictures = textures.iter()
			.map(|t| Picture::from_texture(t, variant, cfg))
			.collect::<Result<Vec<Picture>, TimError>>()?;

		if pictures.len() > u16::MAX as usize {
			return Err(TimError::PictureIndex {
				index: pictures.len(),
				total: u16::MAX as usize,
			});
		}

		Ok(Tm2 {
			variant: variant,
			header: Header::new(variant, cfg.format_version, pictures.len() as u16),
			pictures: pictures,
		})
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> Result<(), TimError>
	where
		W: WriteBytesExt,
	{
		debug!("writing {:?} with {} pictures", self.variant, self.pictures.len());
		self.header.write(buf)?;

		for picture in self.pictures.iter() {
			picture.write(buf)?;
		}

		Ok(())
	}

	#[cfg(feature = "export")]
	pub fn to_bytes(&self) -> Result<Vec<u8>, TimError> {
		let mut out = Vec::with_capacity(16 + self.pictures.iter().map(|p| p.size()).sum::<usize>());
		self.write(&mut out)?;

		Ok(out)
	}

	/// One line per picture: size, type and palette
	pub fn summary(&self) -> Vec<String> {
		self.pictures.iter().enumerate().map(|(i, p)| {
			let h: &PictureHeader = &p.header;
			let tiled = h.image_type.bpp().is_some() && self.variant.is_tiled(h.width, h.height);

			format!("#{} {}x{} {}{}, {} colors, {} bytes", i, h.width, h.height, h.image_type,
				if tiled { " (swizzled)" } else { "" }, h.clut_colors, h.total_size)
		}).collect()
	}
}
