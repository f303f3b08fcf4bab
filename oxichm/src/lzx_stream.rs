//! Random access into the LZX-compressed content section.
//!
//! The content stream is cut into blocks of `reset_table.block_len`
//! decompressed bytes, each an independent LZX frame. The decoder state is
//! only reset every `reset_blkcount` blocks, so decoding block `n` needs
//! every block since the preceding reset point. [`LzxSection`] tracks the
//! last block the decoder produced and replays the fewest blocks that get
//! it to the requested one, filling the block cache on the way.

use crate::cache::BlockCache;
use crate::header::{LzxcControlData, LzxcResetTable};
use crate::storage::SharedReader;
use crate::unit::UnitInfo;
use log::{debug, trace, warn};
use oxichm_core::{ChmError, Cursor, Result};
use oxichm_lzx::LzxDecoder;
use parking_lot::Mutex;
use std::io::{Read, Seek};

/// Slack allowed between a block's compressed length and its decompressed
/// length.
const MAX_EXPANSION: u64 = 6144;

/// Parameters of the compressed section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionInfo {
    /// LZXC control data
    pub control: LzxcControlData,
    /// Reset table header
    pub reset_table: LzxcResetTable,
    /// Blocks between decoder resets
    pub reset_blkcount: u32,
}

impl CompressionInfo {
    /// Combine control data and reset table, deriving the reset block count.
    pub fn new(control: LzxcControlData, reset_table: LzxcResetTable) -> Result<Self> {
        let half_window = control.window_size / 2;
        let reset_blkcount = (control.reset_interval / half_window)
            .checked_mul(control.windows_per_reset)
            .ok_or_else(|| ChmError::unsupported("reset block count overflows"))?;

        if reset_blkcount == 0 {
            return Err(ChmError::unsupported("zero reset block count"));
        }
        if reset_table.block_len == 0 {
            return Err(ChmError::unsupported("zero compressed block length"));
        }

        Ok(Self {
            control,
            reset_table,
            reset_blkcount,
        })
    }

    /// LZX window size in bytes.
    pub fn window_size(&self) -> u32 {
        self.control.window_size
    }

    /// Window size as a power of two.
    pub fn window_bits(&self) -> u32 {
        self.control.window_size.trailing_zeros()
    }

    /// Bytes between decoder resets.
    pub fn reset_interval(&self) -> u32 {
        self.control.reset_interval
    }

    /// Decompressed length of every block.
    pub fn block_len(&self) -> u64 {
        self.reset_table.block_len
    }

    /// Number of blocks in the content stream.
    pub fn block_count(&self) -> u32 {
        self.reset_table.block_count
    }
}

/// Decoder state shared by every reader of the section.
#[derive(Debug, Default)]
pub(crate) struct LzxStream {
    decoder: Option<LzxDecoder>,
    last_block: Option<u64>,
}

impl LzxStream {
    /// Drop the decoder; the next request starts from a reset.
    pub(crate) fn release(&mut self) {
        self.decoder = None;
        self.last_block = None;
    }
}

fn ensure_decoder(slot: &mut Option<LzxDecoder>, window_bits: u32) -> Result<&mut LzxDecoder> {
    let decoder = match slot.take() {
        Some(decoder) => decoder,
        None => {
            debug!("creating LZX decoder with a 2^{window_bits} byte window");
            LzxDecoder::new(window_bits)?
        }
    };
    Ok(slot.insert(decoder))
}

/// The compressed section of an open archive.
#[derive(Debug, Clone)]
pub(crate) struct LzxSection {
    pub(crate) info: CompressionInfo,
    data_offset: u64,
    reset_unit: UnitInfo,
    content: UnitInfo,
}

impl LzxSection {
    pub(crate) fn new(
        info: CompressionInfo,
        data_offset: u64,
        reset_unit: UnitInfo,
        content: UnitInfo,
    ) -> Self {
        Self {
            info,
            data_offset,
            reset_unit,
            content,
        }
    }

    fn fetch_exact<R: Read + Seek>(
        reader: &SharedReader<R>,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<()> {
        let read = reader.fetch(offset, buf)?;
        if read != buf.len() {
            return Err(ChmError::corrupted(
                offset,
                format!("short read: {read} of {} bytes", buf.len()),
            ));
        }
        Ok(())
    }

    /// Absolute offset and length of compressed block `block`.
    pub(crate) fn block_bounds<R: Read + Seek>(
        &self,
        reader: &SharedReader<R>,
        block: u64,
    ) -> Result<(u64, u64)> {
        let table = &self.info.reset_table;
        let count = u64::from(table.block_count);
        let entry = self
            .data_offset
            .saturating_add(self.reset_unit.start)
            .saturating_add(u64::from(table.table_offset))
            .saturating_add(block.saturating_mul(8));

        if block >= count {
            return Err(ChmError::corrupted(
                entry,
                format!("block {block} beyond the reset table ({count} blocks)"),
            ));
        }

        let (start, end) = if block + 1 < count {
            let mut raw = [0u8; 16];
            Self::fetch_exact(reader, entry, &mut raw)?;
            let mut cursor = Cursor::new(&raw);
            (cursor.read_u64()?, cursor.read_u64()?)
        } else {
            let mut raw = [0u8; 8];
            Self::fetch_exact(reader, entry, &mut raw)?;
            (u64::from_le_bytes(raw), table.compressed_len)
        };

        let len = end.checked_sub(start).ok_or_else(|| {
            ChmError::corrupted(entry, format!("block {block} ends before it starts"))
        })?;
        if len > table.block_len.saturating_add(MAX_EXPANSION) {
            return Err(ChmError::corrupted(
                entry,
                format!("block {block} compressed length {len} is implausible"),
            ));
        }

        let offset = self
            .data_offset
            .saturating_add(self.content.start)
            .saturating_add(start);
        Ok((offset, len))
    }

    /// Decode one block with the decoder in whatever state it is in.
    fn decode_block<R: Read + Seek>(
        &self,
        reader: &SharedReader<R>,
        decoder: &mut LzxDecoder,
        block: u64,
    ) -> Result<Vec<u8>> {
        if block % u64::from(self.info.reset_blkcount) == 0 {
            trace!("resetting decoder at block {block}");
            decoder.reset();
        }

        let block_len = self.info.block_len();
        if block_len > decoder.window_size() as u64 {
            return Err(ChmError::data_format(format!(
                "block length {block_len} exceeds the {} byte window",
                decoder.window_size()
            )));
        }

        let (offset, len) = self.block_bounds(reader, block)?;
        let mut compressed = vec![0u8; len as usize];
        Self::fetch_exact(reader, offset, &mut compressed)?;

        let mut out = vec![0u8; block_len as usize];
        decoder.decompress(&compressed, &mut out)?;
        trace!("decoded block {block}: {len} -> {block_len} bytes");
        Ok(out)
    }

    /// Decode `block`, replaying from the closest usable starting point.
    ///
    /// Blocks decoded on the way are stored in `cache`; the target block is
    /// returned to the caller.
    fn decompress_block<R: Read + Seek>(
        &self,
        reader: &SharedReader<R>,
        decoder: &mut LzxDecoder,
        last_block: &mut Option<u64>,
        cache: &Mutex<BlockCache>,
        block: u64,
    ) -> Result<Vec<u8>> {
        let boundary = block - block % u64::from(self.info.reset_blkcount);
        let first = match *last_block {
            Some(last) if last >= boundary && last < block => last + 1,
            _ => boundary,
        };
        if first < block {
            debug!("block {block}: replaying blocks {first}..{block}");
        }

        let result = (first..block)
            .try_for_each(|index| -> Result<()> {
                let data = self.decode_block(reader, decoder, index)?;
                *last_block = Some(index);
                cache.lock().insert(index, data);
                Ok(())
            })
            .and_then(|()| self.decode_block(reader, decoder, block));

        match result {
            Ok(data) => {
                *last_block = Some(block);
                Ok(data)
            }
            Err(e) => {
                warn!("failed to decompress block {block}: {e}");
                *last_block = None;
                Err(e)
            }
        }
    }

    /// Copy decompressed bytes starting at `start` into `out`, never
    /// crossing a block boundary. Returns the number of bytes produced.
    pub(crate) fn decompress_region<R: Read + Seek>(
        &self,
        reader: &SharedReader<R>,
        stream: &Mutex<LzxStream>,
        cache: &Mutex<BlockCache>,
        start: u64,
        out: &mut [u8],
    ) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let block_len = self.info.block_len();
        let block = start / block_len;
        let offset = (start % block_len) as usize;
        let len = out.len().min(block_len as usize - offset);
        let out = &mut out[..len];

        if let Some(n) = cache.lock().copy_out(block, offset, out) {
            return Ok(n);
        }

        let mut guard = stream.lock();
        // Another reader may have decoded it while we waited.
        if let Some(n) = cache.lock().copy_out(block, offset, out) {
            return Ok(n);
        }

        let LzxStream {
            decoder,
            last_block,
        } = &mut *guard;
        let decoder = ensure_decoder(decoder, self.info.window_bits())?;
        let data = self.decompress_block(reader, decoder, last_block, cache, block)?;

        let available = data.get(offset..).unwrap_or_default();
        let n = len.min(available.len());
        out[..n].copy_from_slice(&available[..n]);
        cache.lock().insert(block, data);
        Ok(n)
    }
}
