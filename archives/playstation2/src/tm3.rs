//! TM3 texture archives: a directory of offsets and 8 character names followed by TIM3 payloads.

use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use log::debug;

use std::io::{
	self,
	ErrorKind
};

use thiserror::Error;

use gsk_core::{
	cursor::ByteCursor,
	io_ext::{
		fixed_str,
		ReadBinExt
	},
	rtag4
};

pub const MAGIC: u32 = rtag4!(b"TM3\x00");
pub const NAME_LENGTH: usize = 8;

/// Payloads of a packed archive start at a multiple of this
pub const PAYLOAD_ALIGN: usize = 64;
/// Payloads of a packed archive never start before this
pub const MIN_PAYLOAD_OFFSET: usize = 128;

#[derive(Debug, Error)]
pub enum Tm3Error {
	#[error("Not a TM3 archive: {0:#010X}")]
	Signature(u32),
	#[error("Unexpected end of data")]
	BufferUnderrun,
	#[error("Entry {index} lies outside of the archive")]
	EntryBounds {
		index: usize,
	},
	#[error("Entry {index} out of bounds, archive holds {total}")]
	EntryIndex {
		index: usize,
		total: usize,
	},
	#[error("I/O error")]
	IO {
		#[source]
		source: io::Error,
	},
}

impl From<io::Error> for Tm3Error {
	fn from(source: io::Error) -> Self {
		match source.kind() {
			ErrorKind::UnexpectedEof => Tm3Error::BufferUnderrun,
			_ => Tm3Error::IO {
				source: source,
			},
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	pub magic: u32,
	pub num_entries: u32,
	reserved: [u32; 2],
}

impl Header {
	pub fn new(num_entries: u32) -> Header {
		Header {
			magic: MAGIC,
			num_entries: num_entries,
			reserved: [4, 0],
		}
	}

	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<Header, Tm3Error>
	where
		R: ReadBytesExt,
	{
		let magic = buf.read_u32::<LE>()?;
		if magic != MAGIC {
			return Err(Tm3Error::Signature(magic));
		}

		Ok(Header {
			magic: magic,
			num_entries: buf.read_u32::<LE>()?,
			reserved: [buf.read_u32::<LE>()?, buf.read_u32::<LE>()?],
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> Result<(), Tm3Error>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.magic)?;
		buf.write_u32::<LE>(self.num_entries)?;
		buf.write_u32::<LE>(self.reserved[0])?;
		buf.write_u32::<LE>(self.reserved[1])?;

		Ok(())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
	pub name: String,
	/// Relative to the start of the archive
	pub offset: u32,
	pub size: u32,
}

impl Entry {
	/// Name to extract the entry under: printable characters of the name, then the index
	pub fn file_name(&self, index: usize) -> String {
		let name: String = self.name.chars().filter(|c| c.is_ascii_graphic()).collect();
		format!("{}_{:03}.tm3", name, index)
	}
}

/// Offset of the first payload in a packed archive.
/// The directory is sized as if the entry count were even, for the names as well as the offsets.
pub fn payload_offset(entries: usize) -> usize {
	let even = entries + entries % 2;
	(16 + even * (4 + NAME_LENGTH)).next_multiple_of(PAYLOAD_ALIGN).max(MIN_PAYLOAD_OFFSET)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tm3 {
	pub header: Header,
	pub entries: Vec<Entry>,
}

impl Tm3 {
	/// Reads the directory of an archive that starts at the cursor position and runs to its end
	#[cfg(feature = "import")]
	pub fn read(cur: &mut ByteCursor) -> Result<Tm3, Tm3Error> {
		let total = cur.remaining();
		let header = Header::read(cur)?;
		let count = header.num_entries as usize;
		debug!("TM3 with {} entries, {} bytes", count, total);

		let mut offsets = Vec::with_capacity(count.min(total / 4));
		for _ in 0..count {
			offsets.push(cur.read_u32::<LE>()?);
		}

		if count % 2 == 1 {
			cur.read_bytes(4)?;
		}

		let mut entries = Vec::with_capacity(offsets.len());
		for (i, offset) in offsets.iter().enumerate() {
			let end = offsets.get(i + 1).map_or(total, |next| *next as usize);
			let start = *offset as usize;

			if start > total || end < start {
				return Err(Tm3Error::EntryBounds {
					index: i,
				});
			}

			entries.push(Entry {
				name: cur.read_fixed_str(NAME_LENGTH)?,
				offset: *offset,
				size: (end - start) as u32,
			});
		}

		Ok(Tm3 {
			header: header,
			entries: entries,
		})
	}

	#[cfg(feature = "import")]
	pub fn from_bytes(data: &[u8]) -> Result<Tm3, Tm3Error> {
		Tm3::read(&mut ByteCursor::new(data))
	}

	/// Borrows an entry's payload out of the archive it was read from
	pub fn entry_data<'a>(&self, archive: &'a [u8], index: usize) -> Result<&'a [u8], Tm3Error> {
		let entry = self.entries.get(index).ok_or(Tm3Error::EntryIndex {
			index: index,
			total: self.entries.len(),
		})?;

		let start = entry.offset as usize;
		archive.get(start..start + entry.size as usize).ok_or(Tm3Error::EntryBounds {
			index: index,
		})
	}

	/// Writes the header and directory, without payloads
	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> Result<(), Tm3Error>
	where
		W: WriteBytesExt,
	{
		self.header.write(buf)?;

		for entry in self.entries.iter() {
			buf.write_u32::<LE>(entry.offset)?;
		}

		if self.entries.len() % 2 == 1 {
			buf.write_u32::<LE>(0)?;
		}

		for entry in self.entries.iter() {
			buf.write_all(&fixed_str::<NAME_LENGTH>(&entry.name))?;
		}

		Ok(())
	}

	/// Builds an archive out of named payloads, stored in the given order.
	/// Names longer than 8 characters are truncated.
	#[cfg(feature = "export")]
	pub fn pack(files: &[(&str, &[u8])]) -> Result<Vec<u8>, Tm3Error> {
		let count = u32::try_from(files.len()).map_err(|_| Tm3Error::EntryIndex {
			index: files.len(),
			total: u32::MAX as usize,
		})?;

		let mut offset = payload_offset(files.len());
		let mut entries = Vec::with_capacity(files.len());

		for (i, (name, data)) in files.iter().enumerate() {
			let bounds = || Tm3Error::EntryBounds {
				index: i,
			};

			entries.push(Entry {
				name: name.chars().take(NAME_LENGTH).collect(),
				offset: u32::try_from(offset).map_err(|_| bounds())?,
				size: u32::try_from(data.len()).map_err(|_| bounds())?,
			});
			offset += data.len();
		}

		let tm3 = Tm3 {
			header: Header::new(count),
			entries: entries,
		};

		let mut out = Vec::with_capacity(offset);
		tm3.write(&mut out)?;
		out.resize(payload_offset(files.len()), 0);

		for (_, data) in files.iter() {
			out.extend_from_slice(data);
		}
		debug!("packed {} entries into {} bytes", count, out.len());

		Ok(out)
	}
}
