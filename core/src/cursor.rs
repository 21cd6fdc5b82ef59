use std::io::{
	self,
	ErrorKind,
	Read
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekMode {
	Start,
	Current,
	End,
}

/// A sequential reader over a borrowed, fixed-size buffer.
///
/// Integer reads come from `byteorder::ReadBytesExt`, which works on any [`Read`]; every read
/// that runs past the end of the buffer fails with [`ErrorKind::UnexpectedEof`] instead of
/// yielding whatever happens to follow.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
	data: &'a [u8],
	position: usize,
}

impl<'a> ByteCursor<'a> {
	pub fn new(data: &'a [u8]) -> ByteCursor<'a> {
		ByteCursor {
			data: data,
			position: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn position(&self) -> usize {
		self.position
	}

	pub fn remaining(&self) -> usize {
		self.data.len() - self.position
	}

	/// Moves the cursor and returns the new position.
	/// The target is clamped into `[0, len - 1]`, so seeking never fails.
	pub fn seek(&mut self, n: i64, mode: SeekMode) -> usize {
		let last = self.data.len().saturating_sub(1) as i64;

		let target = match mode {
			SeekMode::Start => n,
			SeekMode::Current => self.position as i64 + n,
			SeekMode::End => last + n,
		};

		self.position = target.clamp(0, last) as usize;
		self.position
	}

	/// Borrows the next `n` bytes and advances past them
	pub fn read_bytes(&mut self, n: usize) -> io::Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(underrun(n, self.remaining()));
		}

		let bytes = &self.data[self.position..self.position + n];
		self.position += n;

		Ok(bytes)
	}
}

impl Read for ByteCursor<'_> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let n = buf.len().min(self.remaining());
		buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
		self.position += n;

		Ok(n)
	}

	fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
		// Check up front so a failed read leaves the position untouched
		let bytes = self.read_bytes(buf.len())?;
		buf.copy_from_slice(bytes);

		Ok(())
	}
}

fn underrun(wanted: usize, left: usize) -> io::Error {
	io::Error::new(ErrorKind::UnexpectedEof, format!("wanted {} bytes, {} left", wanted, left))
}

#[cfg(test)]
mod tests {
	use byteorder::{
		BE,
		LE,
		ReadBytesExt
	};

	use super::*;

	#[test]
	fn test_seek_clamps() {
		let data = [0u8; 16];
		let mut cur = ByteCursor::new(&data);

		assert_eq!(cur.seek(4, SeekMode::Start), 4);
		assert_eq!(cur.seek(8, SeekMode::Current), 12);
		assert_eq!(cur.seek(100, SeekMode::Current), 15);
		assert_eq!(cur.seek(-100, SeekMode::Current), 0);
		assert_eq!(cur.seek(0, SeekMode::End), 15);
		assert_eq!(cur.seek(-5, SeekMode::End), 10);
		assert_eq!(cur.seek(-1, SeekMode::Start), 0);
	}

	#[test]
	fn test_seek_empty() {
		let mut cur = ByteCursor::new(&[]);
		assert_eq!(cur.seek(10, SeekMode::End), 0);
		assert!(cur.is_empty());
	}

	#[test]
	fn test_read_ints() {
		let data = [0x54, 0x49, 0x4D, 0x32, 0x01, 0x02, 0x03, 0x04, 0xFF];
		let mut cur = ByteCursor::new(&data);

		assert_eq!(cur.read_u32::<LE>().unwrap(), 0x324D4954);
		assert_eq!(cur.read_u16::<BE>().unwrap(), 0x0102);
		assert_eq!(cur.read_u16::<LE>().unwrap(), 0x0403);
		assert_eq!(cur.read_i8().unwrap(), -1);
		assert_eq!(cur.remaining(), 0);
	}

	#[test]
	fn test_underrun() {
		let data = [1u8, 2, 3];
		let mut cur = ByteCursor::new(&data);

		let err = cur.read_u32::<LE>().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
		assert_eq!(cur.position(), 0);

		assert_eq!(cur.read_bytes(2).unwrap(), &[1, 2]);
		assert!(cur.read_bytes(2).is_err());
		assert_eq!(cur.read_u8().unwrap(), 3);
		assert!(cur.read_u8().is_err());
	}
}
