//! Conversion between stored pictures and indexed rasters.

use bitflags::bitflags;

use log::{
	debug,
	warn
};

use gsk_core::{
	scale8_to_gs_alpha,
	scale_gs_alpha_to8,
	texture::{
		Color,
		Texture
	}
};

use crate::{
	error::TimError,
	gs::{
		self,
		Bpp
	},
	picture::{
		ClutType,
		ImageType,
		Picture,
		PictureHeader,
		Tex0,
		DEFAULT_TEX1,
		HEADER_SIZE
	},
	tm2::{
		Variant,
		FORMAT_VERSION
	}
};

bitflags! {
	pub struct ImportFlag: u32 {
		/// Expands TIM2 4-bit streams two indices per byte instead of one
		const UNPACK_UNTILED_NIBBLES = 0b00000001;
		/// Leaves palette alpha in the GS range (0..=128)
		const KEEP_GS_ALPHA = 0b00000010;
	}
}

#[derive(Clone, Copy, Debug)]
pub struct ImportCfg {
	pub flags: ImportFlag,
}

impl Default for ImportCfg {
	fn default() -> Self {
		ImportCfg {
			flags: ImportFlag::empty(),
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct ExportCfg {
	pub bpp: Bpp,
	pub format_version: u8,
}

impl Default for ExportCfg {
	fn default() -> Self {
		ExportCfg {
			bpp: Bpp::Eight,
			format_version: FORMAT_VERSION,
		}
	}
}

/// How a picture's index stream is stored
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
	pub bpp: Bpp,
	/// Two indices per byte, low nibble first
	pub packed: bool,
	/// Stored in GS memory order
	pub tiled: bool,
}

impl Layout {
	pub fn of(header: &PictureHeader, variant: Variant, cfg: &ImportCfg) -> Result<Layout, TimError> {
		let bpp = header.image_type.bpp().ok_or(TimError::UnsupportedImageType(header.image_type))?;

		let packed = match (variant, bpp) {
			(_, Bpp::Eight) => false,
			(Variant::Tim3, Bpp::Four) => true,
			(Variant::Tim2, Bpp::Four) => {
				let unpack = cfg.flags.contains(ImportFlag::UNPACK_UNTILED_NIBBLES);
				if !unpack {
					warn!("TIM2 4-bit picture decoded one index per byte");
				}

				unpack
			}
		};

		Ok(Layout {
			bpp: bpp,
			packed: packed,
			tiled: variant.is_tiled(header.width, header.height),
		})
	}

	/// Bytes of stream needed for `pixels` indices
	pub fn stream_size(&self, pixels: usize) -> usize {
		if self.packed {
			(pixels + 1) / 2
		} else {
			pixels
		}
	}
}

impl Picture {
	/// Decodes the picture into one index per pixel and an 8-bit alpha palette
	#[cfg(feature = "import")]
	pub fn to_texture(&self, variant: Variant, cfg: &ImportCfg) -> Result<Texture, TimError> {
		let header = &self.header;
		let layout = Layout::of(header, variant, cfg)?;
		debug!("decoding {}x{} as {:?}", header.width, header.height, layout);

		let width = header.width as usize;
		let height = header.height as usize;
		let pixels = width * height;

		let needed = layout.stream_size(pixels);
		if self.data.len() < needed {
			return Err(TimError::ImageSize {
				expected: pixels,
				got: if layout.packed { self.data.len() * 2 } else { self.data.len() },
			});
		}

		let stream = &self.data[..needed];
		let linear = if layout.tiled {
			gs::unswizzle(stream, width, height, layout.bpp)?
		} else {
			stream.to_vec()
		};

		let indices: Vec<u8> = if layout.packed {
			linear.iter().flat_map(|b| [b & 0x0F, b >> 4]).take(pixels).collect()
		} else {
			linear
		};

		if let Some(i) = indices.iter().find(|i| (**i as usize) >= self.clut.len()) {
			return Err(TimError::PaletteIndex {
				index: *i as usize,
				colors: self.clut.len(),
			});
		}

		let palette = if cfg.flags.contains(ImportFlag::KEEP_GS_ALPHA) {
			self.clut.clone()
		} else {
			self.clut.iter()
				.map(|c| Color::new(c.red, c.green, c.blue, scale_gs_alpha_to8(c.alpha)))
				.collect()
		};

		Ok(Texture {
			palette: palette,
			indices: indices,
			width: width,
			height: height,
		})
	}

	/// Builds a picture from an indexed raster, swizzling when the variant stores it tiled
	#[cfg(feature = "export")]
	pub fn from_texture(tex: &Texture, variant: Variant, cfg: &ExportCfg) -> Result<Picture, TimError> {
		let bpp = cfg.bpp;
		let colors = tex.palette.len();

		if colors > Bpp::Eight.palette_capacity() {
			return Err(TimError::PaletteCapacity(colors));
		}
		if colors > bpp.palette_capacity() {
			return Err(TimError::PaletteBpp(colors));
		}

		if tex.width == 0 || tex.height == 0 || tex.width > u16::MAX as usize || tex.height > u16::MAX as usize {
			return Err(TimError::Dimensions {
				width: tex.width,
				height: tex.height,
			});
		}

		tex.validate()?;

		let width = tex.width as u16;
		let height = tex.height as u16;

		let linear: Vec<u8> = match bpp {
			Bpp::Four => tex.indices.chunks(2)
				.map(|pair| (pair[0] & 0x0F) | (pair.get(1).copied().unwrap_or(0) << 4))
				.collect(),
			Bpp::Eight => tex.indices.clone(),
		};

		let data = if variant.is_tiled(width, height) {
			gs::swizzle(&linear, tex.width, tex.height, bpp)?
		} else {
			linear
		};

		let mut clut: Vec<Color> = tex.palette.iter()
			.map(|c| Color::new(c.red, c.green, c.blue, scale8_to_gs_alpha(c.alpha)))
			.collect();
		clut.resize(bpp.palette_capacity(), Color::default());

		let image_size = data.len() as u32;
		let clut_size = (clut.len() * 4) as u32;

		let header = PictureHeader {
			total_size: clut_size + image_size + HEADER_SIZE as u32,
			clut_size: clut_size,
			image_size: image_size,
			header_size: HEADER_SIZE,
			clut_colors: clut.len() as u16,
			picture_format: 0,
			num_mipmaps: 1,
			clut_type: ClutType::RGBA32,
			image_type: ImageType::from(bpp),
			width: width,
			height: height,
			tex0: Tex0::for_indexed(width, height, bpp),
			tex1: DEFAULT_TEX1,
			regs: 0,
			tex_clut: 0,
		};
		debug!("encoded {}x{} {} for {:?}, {} bytes", width, height, header.image_type, variant,
			header.total_size);

		Ok(Picture {
			header: header,
			data: data,
			clut: clut,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		gs::GsError,
		tm2::Tm2
	};

	fn texture(width: usize, height: usize, colors: usize) -> Texture {
		Texture {
			palette: (0..colors).map(|i| Color::new(i as u8, (i * 3) as u8, 255 - i as u8, 255)).collect(),
			indices: (0..width * height).map(|i| ((i * 7 + i / width) % colors) as u8).collect(),
			width: width,
			height: height,
		}
	}

	fn export(bpp: Bpp) -> ExportCfg {
		ExportCfg {
			bpp: bpp,
			..ExportCfg::default()
		}
	}

	fn round_trip(tex: &Texture, variant: Variant, bpp: Bpp, cfg: &ImportCfg) -> Texture {
		let bytes = Tm2::from_textures(variant, &[tex.clone()], &export(bpp)).unwrap().to_bytes().unwrap();
		Tm2::from_bytes(&bytes, variant).unwrap().to_texture(0, cfg).unwrap()
	}

	fn assert_same(decoded: &Texture, tex: &Texture, capacity: usize) {
		assert_eq!(decoded.width, tex.width);
		assert_eq!(decoded.height, tex.height);
		assert_eq!(decoded.indices, tex.indices);
		assert_eq!(decoded.palette.len(), capacity);
		assert_eq!(&decoded.palette[..tex.palette.len()], &tex.palette[..]);
		assert!(decoded.palette[tex.palette.len()..].iter().all(|c| *c == Color::default()));
	}

	#[test_log::test]
	fn test_tim3_8bpp_tiled_round_trip() {
		let tex = texture(128, 128, 256);
		let decoded = round_trip(&tex, Variant::Tim3, Bpp::Eight, &ImportCfg::default());

		assert_same(&decoded, &tex, 256);
	}

	#[test_log::test]
	fn test_tim3_4bpp_tiled_round_trip() {
		let tex = texture(256, 128, 16);
		let decoded = round_trip(&tex, Variant::Tim3, Bpp::Four, &ImportCfg::default());

		assert_same(&decoded, &tex, 16);
	}

	#[test]
	fn test_tim3_4bpp_untiled_round_trip() {
		let tex = texture(16, 8, 10);
		let decoded = round_trip(&tex, Variant::Tim3, Bpp::Four, &ImportCfg::default());

		assert_same(&decoded, &tex, 16);
	}

	#[test]
	fn test_tim2_8bpp_round_trip() {
		let tex = texture(20, 10, 40);
		let decoded = round_trip(&tex, Variant::Tim2, Bpp::Eight, &ImportCfg::default());

		assert_same(&decoded, &tex, 256);
	}

	#[test]
	fn test_tim2_4bpp_needs_unpack_flag() {
		let tex = texture(16, 16, 16);
		let tm2 = Tm2::from_textures(Variant::Tim2, &[tex.clone()], &export(Bpp::Four)).unwrap();

		assert!(matches!(
			tm2.to_texture(0, &ImportCfg::default()),
			Err(TimError::ImageSize { expected: 256, got: 128 })
		));

		let cfg = ImportCfg {
			flags: ImportFlag::UNPACK_UNTILED_NIBBLES,
		};
		assert_same(&tm2.to_texture(0, &cfg).unwrap(), &tex, 16);
	}

	#[test]
	fn test_tiled_data_differs_from_linear() {
		let tex = texture(128, 128, 256);

		let tim3 = Picture::from_texture(&tex, Variant::Tim3, &export(Bpp::Eight)).unwrap();
		let tim2 = Picture::from_texture(&tex, Variant::Tim2, &export(Bpp::Eight)).unwrap();

		assert_ne!(tim3.data, tex.indices);
		assert_eq!(tim2.data, tex.indices);
	}

	#[test]
	fn test_tiled_partial_pages_rejected() {
		for (w, h, bpp) in [(192, 128, Bpp::Four), (130, 128, Bpp::Eight)] {
			let tex = texture(w, h, 16);

			assert!(matches!(
				Picture::from_texture(&tex, Variant::Tim3, &export(bpp)),
				Err(TimError::Gs { source: GsError::Dimensions { .. } })
			));

			// stored linear, so any size goes
			let decoded = round_trip(&tex, Variant::Tim2, Bpp::Eight, &ImportCfg::default());
			assert_eq!(decoded.indices, tex.indices);
		}

		let tex = texture(384, 128, 16);
		assert_same(&round_trip(&tex, Variant::Tim3, Bpp::Four, &ImportCfg::default()), &tex, 16);
	}

	#[test]
	fn test_palette_too_large() {
		assert!(matches!(
			Picture::from_texture(&texture(4, 4, 300), Variant::Tim3, &export(Bpp::Eight)),
			Err(TimError::PaletteCapacity(300))
		));
		assert!(matches!(
			Picture::from_texture(&texture(4, 4, 20), Variant::Tim3, &export(Bpp::Four)),
			Err(TimError::PaletteBpp(20))
		));
	}

	#[test]
	fn test_encode_rejects_bad_texture() {
		let mut tex = texture(4, 4, 8);
		tex.indices[3] = 8;
		assert!(matches!(
			Picture::from_texture(&tex, Variant::Tim2, &ExportCfg::default()),
			Err(TimError::PaletteIndex { index: 8, colors: 8 })
		));

		let tex = texture(4, 4, 8);
		let empty = Texture::new(0, 4);
		assert!(matches!(
			Picture::from_texture(&empty, Variant::Tim2, &ExportCfg::default()),
			Err(TimError::Dimensions { width: 0, height: 4 })
		));

		let short = Texture {
			indices: tex.indices[..10].to_vec(),
			..tex
		};
		assert!(matches!(
			Picture::from_texture(&short, Variant::Tim2, &ExportCfg::default()),
			Err(TimError::ImageSize { expected: 16, got: 10 })
		));
	}

	#[test]
	fn test_alpha_quantization() {
		let alphas = [0, 64, 128, 192, 255];
		let tex = Texture {
			palette: alphas.iter().map(|a| Color::new(10, 20, 30, *a)).collect(),
			indices: vec![0, 1, 2, 3, 4, 0, 0, 0],
			width: 4,
			height: 2,
		};

		let decoded = round_trip(&tex, Variant::Tim2, Bpp::Eight, &ImportCfg::default());
		let got: Vec<u8> = decoded.palette[..5].iter().map(|c| c.alpha).collect();
		assert_eq!(got, vec![0, 63, 127, 191, 255]);

		let raw = ImportCfg {
			flags: ImportFlag::KEEP_GS_ALPHA,
		};
		let decoded = round_trip(&tex, Variant::Tim2, Bpp::Eight, &raw);
		let got: Vec<u8> = decoded.palette[..5].iter().map(|c| c.alpha).collect();
		assert_eq!(got, vec![0, 32, 64, 96, 128]);
	}

	#[test]
	fn test_encoded_header() {
		let pic = Picture::from_texture(&texture(256, 128, 16), Variant::Tim3, &export(Bpp::Four)).unwrap();
		let h = &pic.header;

		assert_eq!(h.image_size, 256 * 128 / 2);
		assert_eq!(h.clut_size, 64);
		assert_eq!(h.total_size, 256 * 128 / 2 + 64 + 48);
		assert_eq!(h.header_size, 48);
		assert_eq!(h.clut_colors, 16);
		assert_eq!(h.num_mipmaps, 1);
		assert_eq!(h.clut_type, ClutType::RGBA32);
		assert_eq!(h.image_type, ImageType::Indexed4);
		assert_eq!(h.tex0.psm, 0x14);
		assert_eq!(h.tex0.tw, 8);
		assert_eq!(h.tex0.th, 7);
		assert_eq!(h.tex0.tbw, 4);
		assert_eq!(h.tex1, 0x260);
		assert_eq!(pic.size(), h.total_size as usize);

		let pic = Picture::from_texture(&texture(64, 64, 3), Variant::Tim2, &ExportCfg::default()).unwrap();
		assert_eq!(pic.header.clut_size, 1024);
		assert_eq!(pic.header.image_size, 64 * 64);
		assert_eq!(pic.header.tex0.psm, 0x13);
	}

	#[test]
	fn test_decode_bad_palette_index() {
		let mut pic = Picture::from_texture(&texture(8, 8, 16), Variant::Tim3, &export(Bpp::Four)).unwrap();
		pic.clut.truncate(4);
		pic.data[0] = 0x05;

		assert!(matches!(
			pic.to_texture(Variant::Tim3, &ImportCfg::default()),
			Err(TimError::PaletteIndex { index: 5, colors: 4 })
		));
	}

	#[test]
	fn test_direct_color_unsupported() {
		let mut pic = Picture::from_texture(&texture(8, 8, 16), Variant::Tim2, &ExportCfg::default()).unwrap();
		pic.header.image_type = ImageType::Rgba32;

		assert!(matches!(
			pic.to_texture(Variant::Tim2, &ImportCfg::default()),
			Err(TimError::UnsupportedImageType(ImageType::Rgba32))
		));
	}

	#[test_log::test]
	fn test_multiple_pictures() {
		let textures = [texture(128, 128, 200), texture(32, 16, 7), texture(256, 256, 256)];
		let tm2 = Tm2::from_textures(Variant::Tim3, &textures, &ExportCfg::default()).unwrap();

		assert_eq!(tm2.header.num_pictures, 3);
		assert_eq!(tm2.header.format_id, 6);

		let bytes = tm2.to_bytes().unwrap();
		let decoded = Tm2::from_bytes_any(&bytes).unwrap().to_textures(&ImportCfg::default()).unwrap();

		for (d, t) in decoded.iter().zip(textures.iter()) {
			assert_same(d, t, 256);
		}
	}
}
