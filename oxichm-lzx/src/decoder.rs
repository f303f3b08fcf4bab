//! LZX block decoder.
//!
//! The decoder is a state machine over blocks. Each call to
//! [`LzxDecoder::decompress`] consumes one self-contained input frame and
//! produces an exact number of output bytes; block boundaries need not line
//! up with frame boundaries, so the current block type, its remaining length,
//! the Huffman code lengths, and the repeat offsets all carry across calls.
//!
//! ```text
//! NeedBlockHeader ──► Verbatim | Aligned | Uncompressed ──► DecodingRun
//!        ▲                                                      │
//!        └──────────────────── block exhausted ◄────────────────┘
//! ```

use crate::bitstream::LzxBitReader;
use crate::huffman::{HuffmanTable, read_lengths};
use crate::intel::E8Translator;
use crate::tables::{
    ALIGNED_MAXSYMBOLS, ALIGNED_NUM_ELEMENTS, ALIGNED_TABLEBITS, EXTRA_BITS, LENGTH_MAXSYMBOLS,
    LENGTH_TABLEBITS, MAINTREE_MAXSYMBOLS, MAINTREE_TABLEBITS, MAX_WINDOW_BITS, MIN_MATCH,
    MIN_WINDOW_BITS, NUM_CHARS, NUM_PRIMARY_LENGTHS, NUM_SECONDARY_LENGTHS, POSITION_BASE,
    PRETREE_MAXSYMBOLS, PRETREE_TABLEBITS, main_elements,
};
use oxichm_core::error::{ChmError, Result};

/// Main tree symbol whose presence means the block may hold E8 calls.
const E8_SYMBOL: usize = 0xE8;

/// LZX block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// No block decoded yet, or an unknown type.
    Invalid,
    /// Huffman-coded literals and matches.
    Verbatim,
    /// As verbatim, with the low offset bits coded by the aligned tree.
    Aligned,
    /// Raw bytes.
    Uncompressed,
}

impl BlockType {
    /// Map the 3-bit block type field.
    pub fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::Verbatim,
            2 => Self::Aligned,
            3 => Self::Uncompressed,
            _ => Self::Invalid,
        }
    }
}

/// Stateful LZX decompressor.
#[derive(Debug)]
pub struct LzxDecoder {
    window: Vec<u8>,
    window_bits: u32,
    window_posn: usize,
    /// Repeat offsets R0, R1, R2 (most recent first).
    r: [u32; 3],
    main_elements: usize,
    header_read: bool,
    block_type: BlockType,
    block_length: u32,
    block_remaining: u32,
    intel: E8Translator,
    pretree: HuffmanTable,
    main_tree: HuffmanTable,
    length_tree: HuffmanTable,
    aligned_tree: HuffmanTable,
}

impl LzxDecoder {
    /// Create a decoder with a window of `2^window_bits` bytes.
    ///
    /// `window_bits` must be in `15..=21`.
    pub fn new(window_bits: u32) -> Result<Self> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&window_bits) {
            return Err(ChmError::unsupported(format!(
                "LZX window of 2^{} bytes",
                window_bits
            )));
        }

        let size = 1usize << window_bits;
        let mut window = Vec::new();
        window
            .try_reserve_exact(size)
            .map_err(|_| ChmError::NoMemory { bytes: size })?;
        window.resize(size, 0);

        let mut decoder = Self {
            window,
            window_bits,
            window_posn: 0,
            r: [1; 3],
            main_elements: main_elements(window_bits),
            header_read: false,
            block_type: BlockType::Invalid,
            block_length: 0,
            block_remaining: 0,
            intel: E8Translator::default(),
            pretree: HuffmanTable::new(PRETREE_MAXSYMBOLS, PRETREE_TABLEBITS),
            main_tree: HuffmanTable::new(MAINTREE_MAXSYMBOLS, MAINTREE_TABLEBITS),
            length_tree: HuffmanTable::new(LENGTH_MAXSYMBOLS, LENGTH_TABLEBITS),
            aligned_tree: HuffmanTable::new(ALIGNED_MAXSYMBOLS, ALIGNED_TABLEBITS),
        };
        decoder.reset();
        Ok(decoder)
    }

    /// Window size in bytes.
    pub fn window_size(&self) -> usize {
        self.window.len()
    }

    /// Window size as a power of two.
    pub fn window_bits(&self) -> u32 {
        self.window_bits
    }

    /// Current repeat offsets (R0, R1, R2).
    pub fn repeat_offsets(&self) -> [u32; 3] {
        self.r
    }

    /// E8 translation file size read from the stream header.
    pub fn intel_filesize(&self) -> i32 {
        self.intel.filesize()
    }

    /// Type of the block currently being decoded.
    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    /// Return to the start-of-stream state.
    ///
    /// Required at every reset point of the compressed stream and after any
    /// decode error.
    pub fn reset(&mut self) {
        self.r = [1; 3];
        self.header_read = false;
        self.block_type = BlockType::Invalid;
        self.block_length = 0;
        self.block_remaining = 0;
        self.intel.reset();
        self.window_posn = 0;
        self.main_tree.clear_lengths();
        self.length_tree.clear_lengths();
    }

    /// Decode one frame of `input` into exactly `output.len()` bytes.
    ///
    /// On error the decoder state is unspecified until [`reset`](Self::reset).
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        let window_size = self.window.len();
        if output.len() > window_size {
            return Err(ChmError::data_format(format!(
                "output of {} bytes exceeds {} byte window",
                output.len(),
                window_size
            )));
        }

        let mut bits = LzxBitReader::new(input);
        let end = input.len();
        let mut window_posn = self.window_posn;
        let mut r = self.r;

        if !self.header_read {
            let filesize = if bits.read(1) != 0 {
                let hi = bits.read(16);
                let lo = bits.read(16);
                ((hi << 16) | lo) as i32
            } else {
                0
            };
            self.intel.set_filesize(filesize);
            self.header_read = true;
        }

        let mut togo = output.len();
        while togo > 0 {
            if self.block_remaining == 0 {
                if self.block_type == BlockType::Uncompressed {
                    if self.block_length & 1 != 0 {
                        bits.skip_raw(1);
                    }
                    bits.restart();
                }
                self.read_block_header(&mut bits, &mut r)?;
            }

            // Lookahead may run up to one word past the frame, provided the
            // phantom word was not actually needed.
            if bits.position() > end && (bits.position() > end + 2 || bits.bits_left() < 16) {
                return Err(ChmError::illegal_data(format!(
                    "read {} bytes past end of {} byte frame",
                    bits.position() - end,
                    end
                )));
            }

            while self.block_remaining > 0 && togo > 0 {
                let this_run = (self.block_remaining as usize).min(togo);
                togo -= this_run;
                self.block_remaining -= this_run as u32;

                window_posn &= window_size - 1;
                if window_posn + this_run > window_size {
                    return Err(ChmError::data_format(format!(
                        "run of {} bytes at {} straddles the window end",
                        this_run, window_posn
                    )));
                }

                match self.block_type {
                    BlockType::Verbatim => {
                        self.decode_run(&mut bits, &mut window_posn, &mut r, this_run, false)?
                    }
                    BlockType::Aligned => {
                        self.decode_run(&mut bits, &mut window_posn, &mut r, this_run, true)?
                    }
                    BlockType::Uncompressed => {
                        if bits.position() + this_run > end {
                            return Err(ChmError::illegal_data(
                                "uncompressed block runs past end of frame",
                            ));
                        }
                        let raw = bits.raw_bytes(this_run)?;
                        self.window[window_posn..window_posn + this_run].copy_from_slice(raw);
                        window_posn += this_run;
                    }
                    BlockType::Invalid => {
                        return Err(ChmError::illegal_data("invalid block type"));
                    }
                }
            }
        }

        let stop = if window_posn == 0 {
            window_size
        } else {
            window_posn
        };
        let start = stop.checked_sub(output.len()).ok_or_else(|| {
            ChmError::data_format(format!(
                "output of {} bytes wraps the window at {}",
                output.len(),
                stop
            ))
        })?;
        output.copy_from_slice(&self.window[start..stop]);

        self.window_posn = window_posn;
        self.r = r;

        self.intel.translate(output);
        Ok(())
    }

    fn read_block_header(&mut self, bits: &mut LzxBitReader<'_>, r: &mut [u32; 3]) -> Result<()> {
        let kind = bits.read(3);
        let hi = bits.read(16);
        let lo = bits.read(8);
        self.block_length = (hi << 8) | lo;
        self.block_remaining = self.block_length;
        self.block_type = BlockType::from_bits(kind);

        log::trace!(
            "LZX block: type={:?} length={}",
            self.block_type,
            self.block_length
        );

        match self.block_type {
            BlockType::Aligned => {
                for len in self
                    .aligned_tree
                    .lengths_mut()
                    .iter_mut()
                    .take(ALIGNED_NUM_ELEMENTS)
                {
                    *len = bits.read(3) as u8;
                }
                self.aligned_tree.build()?;
                self.read_main_and_length_trees(bits)
            }
            BlockType::Verbatim => self.read_main_and_length_trees(bits),
            BlockType::Uncompressed => {
                self.intel.mark_started();
                bits.align_for_raw();
                for slot in r.iter_mut() {
                    *slot = bits.read_raw_u32()?;
                }
                Ok(())
            }
            BlockType::Invalid => Err(ChmError::illegal_data(format!(
                "unknown block type {}",
                kind
            ))),
        }
    }

    fn read_main_and_length_trees(&mut self, bits: &mut LzxBitReader<'_>) -> Result<()> {
        read_lengths(
            &mut self.pretree,
            self.main_tree.lengths_mut(),
            0,
            NUM_CHARS,
            bits,
        )?;
        read_lengths(
            &mut self.pretree,
            self.main_tree.lengths_mut(),
            NUM_CHARS,
            self.main_elements,
            bits,
        )?;
        self.main_tree.build()?;
        if self.main_tree.lengths()[E8_SYMBOL] != 0 {
            self.intel.mark_started();
        }

        read_lengths(
            &mut self.pretree,
            self.length_tree.lengths_mut(),
            0,
            NUM_SECONDARY_LENGTHS,
            bits,
        )?;
        self.length_tree.build()
    }

    /// Decode `this_run` bytes of a verbatim or aligned block into the window.
    ///
    /// A match may overshoot the run; the overshoot is charged to the run
    /// but not to the block, exactly as the format's reference decoder does.
    fn decode_run(
        &mut self,
        bits: &mut LzxBitReader<'_>,
        window_posn: &mut usize,
        r: &mut [u32; 3],
        this_run: usize,
        aligned: bool,
    ) -> Result<()> {
        let window_size = self.window.len();
        let mut remaining = this_run as isize;

        while remaining > 0 {
            let main = usize::from(self.main_tree.read_symbol(bits)?);
            if main < NUM_CHARS {
                self.window[*window_posn] = main as u8;
                *window_posn += 1;
                remaining -= 1;
                continue;
            }

            let main = main - NUM_CHARS;
            let mut match_length = main & NUM_PRIMARY_LENGTHS;
            if match_length == NUM_PRIMARY_LENGTHS {
                match_length += usize::from(self.length_tree.read_symbol(bits)?);
            }
            match_length += MIN_MATCH;

            let slot = main >> 3;
            let match_offset = match slot {
                0 => r[0],
                1 => {
                    let offset = r[1];
                    r[1] = r[0];
                    r[0] = offset;
                    offset
                }
                2 => {
                    let offset = r[2];
                    r[2] = r[0];
                    r[0] = offset;
                    offset
                }
                _ => {
                    let offset = if aligned {
                        self.aligned_offset(bits, slot)?
                    } else {
                        verbatim_offset(bits, slot)
                    };
                    r[2] = r[1];
                    r[1] = r[0];
                    r[0] = offset;
                    offset
                }
            };

            let dest = *window_posn;
            *window_posn += match_length;
            if *window_posn > window_size {
                return Err(ChmError::illegal_data(format!(
                    "match of {} bytes runs past the window end",
                    match_length
                )));
            }
            remaining -= match_length as isize;

            self.copy_match(dest, match_offset as usize, match_length)?;
        }
        Ok(())
    }

    /// Offset for slot >= 3 in an aligned block.
    fn aligned_offset(&self, bits: &mut LzxBitReader<'_>, slot: usize) -> Result<u32> {
        let extra = u32::from(EXTRA_BITS[slot]);
        let base = POSITION_BASE[slot] - 2;
        let offset = match extra {
            0 => {
                // Only slot 3; its base already works out to 1.
                1
            }
            1 | 2 => base + bits.read(extra),
            3 => base + u32::from(self.aligned_tree.read_symbol(bits)?),
            _ => {
                let verbatim = bits.read(extra - 3) << 3;
                base + verbatim + u32::from(self.aligned_tree.read_symbol(bits)?)
            }
        };
        Ok(offset)
    }

    fn copy_match(&mut self, mut dest: usize, offset: usize, length: usize) -> Result<()> {
        let window_size = self.window.len();
        if offset > window_size {
            return Err(ChmError::illegal_data(format!(
                "match offset {} exceeds window",
                offset
            )));
        }

        // A source before the window start continues from the window end.
        let mut src = if offset > dest {
            dest + window_size - offset
        } else {
            dest - offset
        };
        for _ in 0..length {
            self.window[dest] = self.window[src];
            dest += 1;
            src += 1;
            if src == window_size {
                src = 0;
            }
        }
        Ok(())
    }
}

/// Offset for slot >= 3 in a verbatim block.
fn verbatim_offset(bits: &mut LzxBitReader<'_>, slot: usize) -> u32 {
    if slot == 3 {
        return 1;
    }
    let extra = u32::from(EXTRA_BITS[slot]);
    POSITION_BASE[slot] - 2 + bits.read(extra)
}
