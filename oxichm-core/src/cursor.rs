//! Bounded little-endian cursor for fixed-layout structures.
//!
//! Every ITSF structure (archive header, directory header, directory pages,
//! LZXC control data, reset table) is a packed little-endian record. The
//! [`Cursor`] reads those records out of a byte slice while tracking how much
//! input remains, so a short or lying buffer becomes a
//! [`ChmError::TruncatedInput`] instead of a panic.
//!
//! # Compressed words
//!
//! Directory entries store their integers as "compressed words": a big-endian
//! base-128 encoding where every byte except the last has its high bit set.
//!
//! ```
//! use oxichm_core::cursor::{Cursor, encode_cword};
//!
//! let encoded = encode_cword(300);
//! assert_eq!(encoded, vec![0x82, 0x2C]);
//!
//! let mut cursor = Cursor::new(&encoded);
//! assert_eq!(cursor.read_cword().unwrap(), 300);
//! ```

use crate::error::{ChmError, Result};

/// A read-only cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a cursor positioned at `pos` within `data`.
    ///
    /// A position past the end is clamped to the end.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether all input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `count` bytes.
    #[inline]
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(ChmError::truncated(count, self.remaining()));
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Read a fixed-size array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    /// Skip `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read a little-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// Read a 16-byte GUID as raw bytes.
    pub fn read_uuid(&mut self) -> Result<[u8; 16]> {
        self.read_array()
    }

    /// Read a compressed word.
    pub fn read_cword(&mut self) -> Result<u64> {
        let mut accum = 0u64;
        loop {
            let byte = self.read_u8()?;
            if byte < 0x80 {
                return Ok((accum << 7).wrapping_add(byte as u64));
            }
            accum = (accum << 7).wrapping_add((byte & 0x7F) as u64);
        }
    }

    /// Skip over a compressed word without decoding it.
    pub fn skip_cword(&mut self) -> Result<()> {
        while self.read_u8()? >= 0x80 {}
        Ok(())
    }

    /// Read exactly `count` bytes of UTF-8 text narrowed to single-byte
    /// characters.
    ///
    /// ASCII characters pass through unchanged; every other character
    /// (including invalid sequences) becomes `?`.
    pub fn read_narrow_string(&mut self, count: usize) -> Result<String> {
        let bytes = self.take(count)?;
        Ok(narrow_utf8(bytes))
    }
}

/// Narrow UTF-8 bytes to an ASCII string, replacing everything else with `?`.
pub fn narrow_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

/// Encode `value` as a compressed word.
pub fn encode_cword(value: u64) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        groups.push((rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    groups.reverse();
    groups
}
