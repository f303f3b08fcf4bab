//! Canonical Huffman decode tables for LZX.
//!
//! LZX transmits only code lengths; codes are assigned canonically (shorter
//! codes first, ties broken by symbol order). Each tree is decoded through a
//! direct lookup table of `2^table_bits` entries. Codes longer than
//! `table_bits` continue into a binary tree stored in the same flat array:
//! a direct entry that is `>= max_symbols` is a node index, and the two
//! children of node `n` live at `2n` and `2n + 1`.
//!
//! Code lengths arrive as deltas against the previous block's lengths,
//! themselves encoded with a small "pretree" (see [`read_lengths`]).

use crate::bitstream::LzxBitReader;
use crate::tables::{LENTABLE_SAFETY, PRETREE_NUM_ELEMENTS};
use oxichm_core::error::{ChmError, Result};

/// Longest code length LZX allows.
pub const MAX_CODE_LENGTH: u32 = 16;

/// A code-length array together with its decode table.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    max_symbols: usize,
    table_bits: u32,
    /// Code length per symbol, plus [`LENTABLE_SAFETY`] bytes of slack.
    lengths: Vec<u8>,
    /// Direct lookup entries followed by the overflow tree.
    table: Vec<u16>,
}

impl HuffmanTable {
    /// Create an empty table (all lengths zero, nothing decodable).
    pub fn new(max_symbols: usize, table_bits: u32) -> Self {
        Self {
            max_symbols,
            table_bits,
            lengths: vec![0; max_symbols + LENTABLE_SAFETY],
            table: vec![0; (1 << table_bits) + (max_symbols << 1)],
        }
    }

    /// Number of symbols in the alphabet.
    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    /// Code lengths.
    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    /// Mutable code lengths, for the delta reader.
    pub fn lengths_mut(&mut self) -> &mut [u8] {
        &mut self.lengths
    }

    /// Zero every code length.
    pub fn clear_lengths(&mut self) {
        self.lengths.fill(0);
    }

    /// Rebuild the decode table from the current lengths.
    pub fn build(&mut self) -> Result<()> {
        make_decode_table(
            self.max_symbols,
            self.table_bits,
            &self.lengths,
            &mut self.table,
        )
    }

    /// Decode one symbol.
    pub fn read_symbol(&self, bits: &mut LzxBitReader<'_>) -> Result<u16> {
        bits.ensure(16);

        let max = self.max_symbols as u32;
        let mut sym = u32::from(self.entry(bits.peek(self.table_bits) as usize)?);
        if sym >= max {
            let buf = bits.buffer();
            let mut mask = 1u32 << (32 - self.table_bits);
            loop {
                mask >>= 1;
                if mask == 0 {
                    return Err(ChmError::illegal_data("Huffman code longer than 16 bits"));
                }
                sym = (sym << 1) | u32::from(buf & mask != 0);
                sym = u32::from(self.entry(sym as usize)?);
                if sym < max {
                    break;
                }
            }
        }

        let len = self.lengths[sym as usize];
        if len == 0 {
            return Err(ChmError::illegal_data(format!(
                "symbol {} has no code in this table",
                sym
            )));
        }
        bits.consume(u32::from(len));
        Ok(sym as u16)
    }

    fn entry(&self, index: usize) -> Result<u16> {
        self.table
            .get(index)
            .copied()
            .ok_or_else(|| ChmError::illegal_data("Huffman tree index out of range"))
    }
}

fn table_overrun() -> ChmError {
    ChmError::illegal_data("Huffman decode table overrun")
}

fn put(table: &mut [u16], index: usize, value: u16) -> Result<()> {
    *table.get_mut(index).ok_or_else(table_overrun)? = value;
    Ok(())
}

/// Build a decode table for `nsyms` symbols from `lengths`.
///
/// Codes up to `nbits` long resolve with one lookup; longer codes (up to 16
/// bits) are linked into the overflow area past `2^nbits`. The lengths must
/// describe a complete prefix code, except that an all-zero length set is
/// accepted and yields a table that decodes nothing.
pub fn make_decode_table(nsyms: usize, nbits: u32, lengths: &[u8], table: &mut [u16]) -> Result<()> {
    let lengths = lengths
        .get(..nsyms)
        .ok_or_else(|| ChmError::illegal_data("length table shorter than alphabet"))?;

    let mut pos: u32 = 0;
    let mut table_mask: u32 = 1 << nbits;
    let mut bit_mask: u32 = table_mask >> 1;
    let mut next_symbol: u32 = bit_mask;
    let mut bit_num: u32 = 1;

    // Codes short enough for direct lookup fill 2^(nbits - len) entries each.
    while bit_num <= nbits {
        for (sym, &len) in lengths.iter().enumerate() {
            if u32::from(len) != bit_num {
                continue;
            }
            let leaf = pos as usize;
            pos += bit_mask;
            if pos > table_mask {
                return Err(table_overrun());
            }
            table
                .get_mut(leaf..pos as usize)
                .ok_or_else(table_overrun)?
                .fill(sym as u16);
        }
        bit_mask >>= 1;
        bit_num += 1;
    }

    if pos != table_mask {
        table
            .get_mut(pos as usize..table_mask as usize)
            .ok_or_else(table_overrun)?
            .fill(0);

        // Work in 16 extra bits of precision for the long codes.
        pos <<= 16;
        table_mask <<= 16;
        bit_mask = 1 << 15;

        while bit_num <= MAX_CODE_LENGTH {
            for (sym, &len) in lengths.iter().enumerate() {
                if u32::from(len) != bit_num {
                    continue;
                }
                let mut leaf = (pos >> 16) as usize;
                for fill in 0..(bit_num - nbits) {
                    let node = *table.get(leaf).ok_or_else(table_overrun)?;
                    if node == 0 {
                        let child = (next_symbol << 1) as usize;
                        put(table, child, 0)?;
                        put(table, child + 1, 0)?;
                        put(table, leaf, next_symbol as u16)?;
                        next_symbol += 1;
                    }
                    leaf = (*table.get(leaf).ok_or_else(table_overrun)? as usize) << 1;
                    if (pos >> (15 - fill)) & 1 != 0 {
                        leaf += 1;
                    }
                }
                put(table, leaf, sym as u16)?;

                pos += bit_mask;
                if pos > table_mask {
                    return Err(table_overrun());
                }
            }
            bit_mask >>= 1;
            bit_num += 1;
        }
    }

    if pos == table_mask || lengths.iter().all(|&len| len == 0) {
        Ok(())
    } else {
        Err(ChmError::illegal_data("incomplete Huffman code"))
    }
}

/// Pretree symbol: a run of `4 + read(4)` zero lengths.
const PRETREE_ZEROS_SHORT: u16 = 17;
/// Pretree symbol: a run of `20 + read(5)` zero lengths.
const PRETREE_ZEROS_LONG: u16 = 18;
/// Pretree symbol: a run of `4 + read(1)` copies of one delta-coded length.
const PRETREE_SAME: u16 = 19;

/// Read delta-coded lengths for symbols `first..last` of `lengths`.
///
/// A fresh pretree (20 four-bit lengths) precedes the symbols. Runs may
/// overshoot `last` into the table's safety margin but never past the end
/// of `lengths`.
pub fn read_lengths(
    pretree: &mut HuffmanTable,
    lengths: &mut [u8],
    first: usize,
    last: usize,
    bits: &mut LzxBitReader<'_>,
) -> Result<()> {
    for len in pretree.lengths_mut().iter_mut().take(PRETREE_NUM_ELEMENTS) {
        *len = bits.read(4) as u8;
    }
    pretree.build()?;

    let mut x = first;
    while x < last {
        let z = pretree.read_symbol(bits)?;
        match z {
            PRETREE_ZEROS_SHORT => {
                let run = 4 + bits.read(4) as usize;
                fill_run(lengths, x, run, 0)?;
                x += run;
            }
            PRETREE_ZEROS_LONG => {
                let run = 20 + bits.read(5) as usize;
                fill_run(lengths, x, run, 0)?;
                x += run;
            }
            PRETREE_SAME => {
                let run = 4 + bits.read(1) as usize;
                let delta = pretree.read_symbol(bits)?;
                let value = apply_delta(lengths[x], delta);
                fill_run(lengths, x, run, value)?;
                x += run;
            }
            delta => {
                lengths[x] = apply_delta(lengths[x], delta);
                x += 1;
            }
        }
    }
    Ok(())
}

/// `(old - delta) mod 17`.
#[inline]
fn apply_delta(old: u8, delta: u16) -> u8 {
    let value = i32::from(old) - i32::from(delta);
    value.rem_euclid(17) as u8
}

fn fill_run(lengths: &mut [u8], start: usize, run: usize, value: u8) -> Result<()> {
    lengths
        .get_mut(start..start + run)
        .ok_or_else(|| ChmError::illegal_data("code length run overruns table"))?
        .fill(value);
    Ok(())
}
