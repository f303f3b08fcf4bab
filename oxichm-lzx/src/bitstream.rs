//! Bit reader for LZX frames.
//!
//! LZX packs its bitstream as 16-bit little-endian words, read most
//! significant bit first. The reader keeps a 32-bit buffer whose valid bits
//! are left-aligned, so peeking `n` bits is a single shift.
//!
//! # Reading past the end
//!
//! Huffman decoding always asks for 16 bits of lookahead, which near the end
//! of a frame can exceed the real input. Missing words read as zero while the
//! byte position keeps advancing; the decoder inspects [`LzxBitReader::position`]
//! after each block header to decide whether the overrun was legitimate.
//!
//! ```
//! use oxichm_lzx::bitstream::LzxBitReader;
//!
//! // Word 0xA5C3 stored little-endian.
//! let mut bits = LzxBitReader::new(&[0xC3, 0xA5]);
//! assert_eq!(bits.read(4), 0xA);
//! assert_eq!(bits.read(8), 0x5C);
//! assert_eq!(bits.read(4), 0x3);
//! ```

use oxichm_core::error::{ChmError, Result};

/// Width of the bit buffer.
const BUFFER_BITS: u32 = 32;

/// MSB-first reader over 16-bit little-endian words.
#[derive(Debug, Clone)]
pub struct LzxBitReader<'a> {
    input: &'a [u8],
    /// Byte position of the next word to load. May run past `input.len()`.
    pos: usize,
    /// Left-aligned bit buffer.
    buf: u32,
    /// Number of valid bits in `buf`.
    bits_left: u32,
}

impl<'a> LzxBitReader<'a> {
    /// Create a reader at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            buf: 0,
            bits_left: 0,
        }
    }

    /// Byte position of the next unread word.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of buffered bits.
    pub fn bits_left(&self) -> u32 {
        self.bits_left
    }

    /// Length of the underlying input.
    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    /// Raw buffer contents, left-aligned.
    #[inline]
    pub fn buffer(&self) -> u32 {
        self.buf
    }

    /// Discard buffered bits and restart at the current byte position.
    pub fn restart(&mut self) {
        self.buf = 0;
        self.bits_left = 0;
    }

    #[inline]
    fn byte_at(&self, index: usize) -> u8 {
        self.input.get(index).copied().unwrap_or(0)
    }

    /// Make sure at least `n` bits (at most 17) are buffered.
    #[inline]
    pub fn ensure(&mut self, n: u32) {
        while self.bits_left < n {
            let word = u32::from(self.byte_at(self.pos)) | (u32::from(self.byte_at(self.pos + 1)) << 8);
            self.buf |= word << (BUFFER_BITS - 16 - self.bits_left);
            self.bits_left += 16;
            self.pos += 2;
        }
    }

    /// Top `n` buffered bits, without consuming them.
    #[inline]
    pub fn peek(&self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.buf >> (BUFFER_BITS - n)
        }
    }

    /// Drop `n` bits from the buffer.
    #[inline]
    pub fn consume(&mut self, n: u32) {
        self.buf = if n >= BUFFER_BITS { 0 } else { self.buf << n };
        self.bits_left = self.bits_left.saturating_sub(n);
    }

    /// Read `n` bits (at most 17).
    #[inline]
    pub fn read(&mut self, n: u32) -> u32 {
        self.ensure(n);
        let value = self.peek(n);
        self.consume(n);
        value
    }

    /// Move to the 16-bit boundary that precedes an uncompressed block's
    /// raw fields.
    ///
    /// A word holding partially consumed bits ends the bitstream; if no bits
    /// were pending, one whole padding word is skipped instead.
    pub fn align_for_raw(&mut self) {
        self.ensure(16);
        if self.bits_left > 16 {
            self.pos -= 2;
        }
        self.restart();
    }

    /// Skip `count` raw bytes.
    pub fn skip_raw(&mut self, count: usize) {
        self.pos += count;
    }

    /// Read a raw little-endian `u32` at the byte position.
    pub fn read_raw_u32(&mut self) -> Result<u32> {
        let bytes = self.raw_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Take `count` raw bytes at the byte position.
    pub fn raw_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| {
                ChmError::illegal_data(format!(
                    "raw read of {} bytes at {} exceeds frame of {} bytes",
                    count,
                    self.pos,
                    self.input.len()
                ))
            })?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}
