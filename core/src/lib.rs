pub mod cursor;

#[cfg(feature = "io_ext")]
pub mod io_ext;

pub mod texture;

/// Converts a 4-byte string into a 32-bit little endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! rtag4 {
	($b4: literal) => {
		u32::from_le_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Converts a 4-byte string into a 32-bit big endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! tag4 {
	($b4: literal) => {
		u32::from_be_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Full opacity as the GS stores it
pub const GS_ALPHA_MAX: u8 = 0x80;

/// Scales a GS alpha value (0..=128) to 8 bits, saturating anything above 128
pub const fn scale_gs_alpha_to8(a: u8) -> u8 {
	let scaled = (a as u32 * 255) / GS_ALPHA_MAX as u32;

	if scaled > 255 {
		255
	} else {
		scaled as u8
	}
}

/// Scales an 8 bit alpha value to the GS range (0..=128), truncating
pub const fn scale8_to_gs_alpha(a: u8) -> u8 {
	((a as u32 * GS_ALPHA_MAX as u32) / 255) as u8
}
