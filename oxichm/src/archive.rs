//! The archive handle.

use crate::cache::BlockCache;
use crate::directory::Directory;
use crate::header::{ITSF_V2_LEN, ITSF_V3_LEN, ITSP_V1_LEN, ItsfHeader, ItspHeader};
use crate::header::{LzxcControlData, LzxcResetTable, RESET_TABLE_LEN};
use crate::lzx_stream::{CompressionInfo, LzxSection, LzxStream};
use crate::storage::SharedReader;
use crate::unit::{EnumerateFlags, EnumerateStatus, StorageSpace, UnitInfo};
use log::{debug, warn};
use oxichm_core::{ChmError, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Reset table of the compressed section.
pub const RESET_TABLE_PATH: &str = "::DataSpace/Storage/MSCompressed/Transform/\
{7FC28940-9D31-11D0-9B27-00A0C91E9C7C}/InstanceData/ResetTable";
/// Raw LZX stream of the compressed section.
pub const CONTENT_PATH: &str = "::DataSpace/Storage/MSCompressed/Content";
/// LZXC control data of the compressed section.
pub const CONTROL_DATA_PATH: &str = "::DataSpace/Storage/MSCompressed/ControlData";
/// Decompressed length of the compressed section.
pub const SPAN_INFO_PATH: &str = "::DataSpace/Storage/MSCompressed/SpanInfo";

/// Decompressed blocks cached by a freshly opened archive.
pub const DEFAULT_CACHE_BLOCKS: usize = 5;

/// Largest control data unit accepted.
const MAX_CONTROL_DATA_LEN: u64 = 256;

/// An open CHM archive.
///
/// All methods take `&self`; the handle can be shared between threads,
/// which serialize on the reader and on the decompressor.
pub struct ChmFile<R = File> {
    reader: SharedReader<R>,
    itsf: ItsfHeader,
    itsp: ItspHeader,
    directory: Directory,
    section: Option<LzxSection>,
    // Lock order: stream, then cache, then reader.
    stream: Mutex<LzxStream>,
    cache: Mutex<BlockCache>,
}

impl ChmFile<File> {
    /// Open the archive at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> ChmFile<R> {
    /// Open an archive from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let reader = SharedReader::new(reader);

        let mut buf = [0u8; ITSF_V3_LEN];
        let read = reader.fetch(0, &mut buf)?;
        let itsf_len = if read >= ITSF_V3_LEN {
            ITSF_V3_LEN
        } else if read >= ITSF_V2_LEN {
            ITSF_V2_LEN
        } else {
            return Err(ChmError::malformed(
                "ITSF",
                format!("file too short for a header ({read} bytes)"),
            ));
        };
        let itsf = ItsfHeader::parse(&buf[..itsf_len])?;
        debug!(
            "ITSF v{}: directory at {:#x} ({:#x} bytes), content at {:#x}",
            itsf.version, itsf.dir_offset, itsf.dir_len, itsf.data_offset
        );

        let mut buf = [0u8; ITSP_V1_LEN];
        let read = reader.fetch(itsf.dir_offset, &mut buf)?;
        let itsp = ItspHeader::parse(&buf[..read])?;
        debug!(
            "ITSP: {:#x} byte pages, root {}, head {}, {} pages",
            itsp.block_len, itsp.index_root, itsp.index_head, itsp.num_blocks
        );

        let header_len = itsp.header_len as u64;
        let directory = Directory::new(
            itsf.dir_offset.saturating_add(header_len),
            itsf.dir_len.saturating_sub(header_len),
            &itsp,
        )?;

        let section = match load_section(&reader, &directory, itsf.data_offset) {
            Ok(section) => {
                debug!(
                    "compressed section: window {:#x}, reset interval {:#x}, {} blocks of {:#x} bytes, reset every {} blocks",
                    section.info.window_size(),
                    section.info.reset_interval(),
                    section.info.block_count(),
                    section.info.block_len(),
                    section.info.reset_blkcount
                );
                Some(section)
            }
            Err(e) => {
                warn!("compression disabled: {e}");
                None
            }
        };

        Ok(Self {
            reader,
            itsf,
            itsp,
            directory,
            section,
            stream: Mutex::new(LzxStream::default()),
            cache: Mutex::new(BlockCache::new(DEFAULT_CACHE_BLOCKS)),
        })
    }

    /// Look up an entry by path, ignoring ASCII case.
    pub fn resolve(&self, path: &str) -> Result<UnitInfo> {
        self.directory.resolve(&self.reader, path)
    }

    /// Read bytes of `unit` starting at `addr` into `buf`.
    ///
    /// Returns the number of bytes produced, which is short when the unit
    /// ends first and zero when `addr` is past its end or the unit is
    /// compressed but the compressed section is unusable.
    pub fn retrieve(&self, unit: &UnitInfo, addr: u64, buf: &mut [u8]) -> Result<usize> {
        if !self.reader.is_open() {
            return Err(ChmError::ArchiveClosed);
        }
        if addr >= unit.length {
            return Ok(0);
        }
        let remaining = unit.length - addr;
        let len = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let buf = &mut buf[..len];

        match unit.space {
            StorageSpace::Uncompressed => read_uncompressed(
                &self.reader,
                self.itsf.data_offset,
                unit,
                addr,
                buf,
            ),
            StorageSpace::Compressed => {
                let Some(section) = &self.section else {
                    warn!("{}: compressed section unavailable", unit.path);
                    return Ok(0);
                };

                let mut total = 0;
                while total < len {
                    let start = unit
                        .start
                        .saturating_add(addr)
                        .saturating_add(total as u64);
                    let n = section.decompress_region(
                        &self.reader,
                        &self.stream,
                        &self.cache,
                        start,
                        &mut buf[total..],
                    )?;
                    if n == 0 {
                        break;
                    }
                    total += n;
                }
                Ok(total)
            }
            StorageSpace::Other(space) => Err(ChmError::unsupported(format!(
                "storage space {space} of {}",
                unit.path
            ))),
        }
    }

    /// Read a whole unit into memory.
    ///
    /// Fails with [`ChmError::TruncatedInput`] if fewer than `unit.length`
    /// bytes could be produced.
    pub fn read_unit(&self, unit: &UnitInfo) -> Result<Vec<u8>> {
        let len = usize::try_from(unit.length).map_err(|_| ChmError::NoMemory {
            bytes: usize::MAX,
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ChmError::NoMemory { bytes: len })?;
        data.resize(len, 0);

        let read = self.retrieve(unit, 0, &mut data)?;
        if read != len {
            return Err(ChmError::truncated(len, read));
        }
        Ok(data)
    }

    /// Visit every entry passing `filter`, in directory order.
    pub fn enumerate<F>(&self, filter: EnumerateFlags, visitor: F) -> Result<()>
    where
        F: FnMut(&UnitInfo) -> EnumerateStatus,
    {
        self.directory.enumerate(&self.reader, filter, visitor)
    }

    /// Collect every entry passing `filter`.
    pub fn entries(&self, filter: EnumerateFlags) -> Result<Vec<UnitInfo>> {
        let mut units = Vec::new();
        self.enumerate(filter, |unit| {
            units.push(unit.clone());
            EnumerateStatus::Continue
        })?;
        Ok(units)
    }
}

impl<R> ChmFile<R> {
    /// Change how many decompressed blocks are kept. Zero disables caching.
    pub fn set_cache_size(&self, blocks: usize) {
        let mut cache = self.cache.lock();
        if cache.capacity() != blocks {
            debug!("cache resized from {} to {blocks} blocks", cache.capacity());
            cache.resize(blocks);
        }
    }

    /// Number of decompressed blocks kept.
    pub fn cache_size(&self) -> usize {
        self.cache.lock().capacity()
    }

    /// Release the reader, the decompressor, and the cache.
    ///
    /// Closing twice is harmless; any later read fails with
    /// [`ChmError::ArchiveClosed`].
    pub fn close(&self) {
        let mut stream = self.stream.lock();
        let mut cache = self.cache.lock();
        if self.reader.close() {
            debug!("archive closed");
        }
        stream.release();
        cache.clear();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        !self.reader.is_open()
    }

    /// Whether compressed entries can be read.
    pub fn is_compression_enabled(&self) -> bool {
        self.section.is_some()
    }

    /// Parameters of the compressed section, when it is usable.
    pub fn compression(&self) -> Option<&CompressionInfo> {
        self.section.as_ref().map(|section| &section.info)
    }

    /// The ITSF file header.
    pub fn itsf_header(&self) -> &ItsfHeader {
        &self.itsf
    }

    /// The ITSP directory header.
    pub fn itsp_header(&self) -> &ItspHeader {
        &self.itsp
    }

    /// Offset of the uncompressed content section.
    pub fn data_offset(&self) -> u64 {
        self.itsf.data_offset
    }

    /// Offset of the first directory page.
    pub fn dir_offset(&self) -> u64 {
        self.directory.dir_offset
    }

    /// Length of the directory page area.
    pub fn dir_len(&self) -> u64 {
        self.directory.dir_len
    }

    /// Length of each directory page.
    pub fn page_len(&self) -> u32 {
        self.directory.block_len
    }

    /// Page where lookups start (the head leaf when there is no index).
    pub fn index_root(&self) -> i32 {
        self.directory.index_root
    }

    /// First leaf page.
    pub fn index_head(&self) -> i32 {
        self.directory.index_head
    }
}

impl<R> std::fmt::Debug for ChmFile<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChmFile")
            .field("itsf", &self.itsf)
            .field("itsp", &self.itsp)
            .field("compression", &self.compression())
            .finish_non_exhaustive()
    }
}

fn read_uncompressed<R: Read + Seek>(
    reader: &SharedReader<R>,
    data_offset: u64,
    unit: &UnitInfo,
    addr: u64,
    buf: &mut [u8],
) -> Result<usize> {
    let offset = data_offset
        .saturating_add(unit.start)
        .saturating_add(addr);
    reader.fetch(offset, buf)
}

/// Resolve a unit the compressed section depends on; it must be stored
/// uncompressed.
fn prefetch_unit<R: Read + Seek>(
    reader: &SharedReader<R>,
    directory: &Directory,
    path: &str,
) -> Result<UnitInfo> {
    let unit = directory.resolve(reader, path)?;
    if unit.space != StorageSpace::Uncompressed {
        return Err(ChmError::unsupported(format!(
            "{path} is not in the uncompressed section"
        )));
    }
    Ok(unit)
}

fn load_section<R: Read + Seek>(
    reader: &SharedReader<R>,
    directory: &Directory,
    data_offset: u64,
) -> Result<LzxSection> {
    let reset_unit = prefetch_unit(reader, directory, RESET_TABLE_PATH)?;
    let content = prefetch_unit(reader, directory, CONTENT_PATH)?;
    let control_unit = prefetch_unit(reader, directory, CONTROL_DATA_PATH)?;

    let mut buf = [0u8; RESET_TABLE_LEN];
    let want = RESET_TABLE_LEN.min(usize::try_from(reset_unit.length).unwrap_or(usize::MAX));
    let read = read_uncompressed(reader, data_offset, &reset_unit, 0, &mut buf[..want])?;
    let reset_table = LzxcResetTable::parse(&buf[..read])?;

    if control_unit.length > MAX_CONTROL_DATA_LEN {
        return Err(ChmError::malformed(
            "LZXC",
            format!("control data is {} bytes", control_unit.length),
        ));
    }
    let mut buf = vec![0u8; control_unit.length as usize];
    let read = read_uncompressed(reader, data_offset, &control_unit, 0, &mut buf)?;
    let control = LzxcControlData::parse(&buf[..read])?;

    let info = CompressionInfo::new(control, reset_table)?;
    Ok(LzxSection::new(info, data_offset, reset_unit, content))
}
