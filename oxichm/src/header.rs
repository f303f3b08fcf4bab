//! CHM directory and section header structures.
//!
//! This module defines the fixed-layout structures of an ITSF file:
//! - ITSF: File header locating the directory and the content section
//! - ITSP: Directory header describing the page tree
//! - PMGL / PMGI: Directory leaf and index pages
//! - LZXC: Control data and reset table of the compressed section
//!
//! Every parser takes exactly the bytes it is allowed to see and validates
//! the length, signature, and version before returning.

use oxichm_core::{ChmError, Cursor, Result};

/// ITSF magic number.
pub const ITSF_MAGIC: [u8; 4] = *b"ITSF";
/// ITSP magic number.
pub const ITSP_MAGIC: [u8; 4] = *b"ITSP";
/// PMGL (directory leaf) magic number.
pub const PMGL_MAGIC: [u8; 4] = *b"PMGL";
/// PMGI (directory index) magic number.
pub const PMGI_MAGIC: [u8; 4] = *b"PMGI";
/// LZXC control data magic number.
pub const LZXC_MAGIC: [u8; 4] = *b"LZXC";

/// Length of a version 2 ITSF header.
pub const ITSF_V2_LEN: usize = 0x58;
/// Length of a version 3 ITSF header.
pub const ITSF_V3_LEN: usize = 0x60;
/// Length of an ITSP header.
pub const ITSP_V1_LEN: usize = 0x54;
/// Length of a PMGL page header.
pub const PMGL_LEN: usize = 0x14;
/// Length of a PMGI page header.
pub const PMGI_LEN: usize = 0x08;
/// Minimum length of LZXC control data.
pub const LZXC_MIN_LEN: usize = 0x18;
/// Length of LZXC control data carrying the trailing field.
pub const LZXC_V2_LEN: usize = 0x1c;
/// Length of the LZXC reset table header.
pub const RESET_TABLE_LEN: usize = 0x28;

/// Longest path a directory entry may declare.
pub const MAX_PATH_LEN: u64 = 512;

/// Multiplier applied to version 2 control data sizes.
const LZXC_V2_UNIT: u32 = 0x8000;

fn check_len(structure: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(ChmError::malformed(
            structure,
            format!("expected {expected:#x} bytes, got {:#x}", data.len()),
        ));
    }
    Ok(())
}

fn check_magic(structure: &'static str, found: [u8; 4], expected: [u8; 4]) -> Result<()> {
    if found != expected {
        return Err(ChmError::malformed(
            structure,
            format!(
                "bad signature {:?}",
                String::from_utf8_lossy(&found).into_owned()
            ),
        ));
    }
    Ok(())
}

/// ITSF file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItsfHeader {
    /// Format version (2 or 3)
    pub version: i32,
    /// Declared header length
    pub header_len: i32,
    /// Unknown field at 0x0c
    pub unknown_000c: i32,
    /// Timestamp of the last modification
    pub last_modified: u32,
    /// Windows language identifier
    pub lang_id: u32,
    /// Directory UUID
    pub dir_uuid: [u8; 16],
    /// Stream UUID
    pub stream_uuid: [u8; 16],
    /// Offset of the unknown section
    pub unknown_offset: u64,
    /// Length of the unknown section
    pub unknown_len: u64,
    /// Offset of the directory (ITSP header)
    pub dir_offset: u64,
    /// Length of the directory including the ITSP header
    pub dir_len: u64,
    /// Offset of the content section (computed for version 2)
    pub data_offset: u64,
}

impl ItsfHeader {
    /// Parse an ITSF header from exactly 0x58 or 0x60 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != ITSF_V2_LEN && data.len() != ITSF_V3_LEN {
            return Err(ChmError::malformed(
                "ITSF",
                format!("unsupported header length {:#x}", data.len()),
            ));
        }

        let mut cursor = Cursor::new(data);
        let signature = cursor.read_array::<4>()?;
        let version = cursor.read_i32()?;
        let header_len = cursor.read_i32()?;
        let unknown_000c = cursor.read_i32()?;
        let last_modified = cursor.read_u32()?;
        let lang_id = cursor.read_u32()?;
        let dir_uuid = cursor.read_uuid()?;
        let stream_uuid = cursor.read_uuid()?;
        let unknown_offset = cursor.read_u64()?;
        let unknown_len = cursor.read_u64()?;
        let dir_offset = cursor.read_u64()?;
        let dir_len = cursor.read_u64()?;

        check_magic("ITSF", signature, ITSF_MAGIC)?;
        let required = match version {
            2 => ITSF_V2_LEN,
            3 => ITSF_V3_LEN,
            other => {
                return Err(ChmError::malformed(
                    "ITSF",
                    format!("unsupported version {other}"),
                ));
            }
        };
        if header_len < required as i32 {
            return Err(ChmError::malformed(
                "ITSF",
                format!("header length {header_len:#x} too small for version {version}"),
            ));
        }

        let data_offset = if version == 3 {
            if cursor.is_empty() {
                return Err(ChmError::malformed(
                    "ITSF",
                    "version 3 header without data offset",
                ));
            }
            cursor.read_u64()?
        } else {
            dir_offset.saturating_add(dir_len)
        };

        Ok(Self {
            version,
            header_len,
            unknown_000c,
            last_modified,
            lang_id,
            dir_uuid,
            stream_uuid,
            unknown_offset,
            unknown_len,
            dir_offset,
            dir_len,
            data_offset,
        })
    }
}

/// ITSP directory header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItspHeader {
    /// Format version (always 1)
    pub version: i32,
    /// Declared header length (always 0x54)
    pub header_len: i32,
    /// Unknown field at 0x0c
    pub unknown_000c: i32,
    /// Length of every directory page
    pub block_len: u32,
    /// Density of the quick-reference section
    pub blockidx_intvl: i32,
    /// Depth of the index tree (1 when there are no PMGI pages)
    pub index_depth: i32,
    /// Page number of the index root, or -1
    pub index_root: i32,
    /// Page number of the first leaf
    pub index_head: i32,
    /// Unknown field at 0x24
    pub unknown_0024: i32,
    /// Number of directory pages
    pub num_blocks: u32,
    /// Unknown field at 0x2c
    pub unknown_002c: i32,
    /// Windows language identifier
    pub lang_id: u32,
    /// System UUID
    pub system_uuid: [u8; 16],
    /// Unknown bytes at 0x44
    pub unknown_0044: [u8; 16],
}

impl ItspHeader {
    /// Parse an ITSP header from exactly 0x54 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        check_len("ITSP", data, ITSP_V1_LEN)?;

        let mut cursor = Cursor::new(data);
        let signature = cursor.read_array::<4>()?;
        let header = Self {
            version: cursor.read_i32()?,
            header_len: cursor.read_i32()?,
            unknown_000c: cursor.read_i32()?,
            block_len: cursor.read_u32()?,
            blockidx_intvl: cursor.read_i32()?,
            index_depth: cursor.read_i32()?,
            index_root: cursor.read_i32()?,
            index_head: cursor.read_i32()?,
            unknown_0024: cursor.read_i32()?,
            num_blocks: cursor.read_u32()?,
            unknown_002c: cursor.read_i32()?,
            lang_id: cursor.read_u32()?,
            system_uuid: cursor.read_uuid()?,
            unknown_0044: cursor.read_array::<16>()?,
        };

        check_magic("ITSP", signature, ITSP_MAGIC)?;
        if header.version != 1 {
            return Err(ChmError::malformed(
                "ITSP",
                format!("unsupported version {}", header.version),
            ));
        }
        if header.header_len != ITSP_V1_LEN as i32 {
            return Err(ChmError::malformed(
                "ITSP",
                format!("header length {:#x}", header.header_len),
            ));
        }

        Ok(header)
    }
}

/// PMGL directory leaf page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmglHeader {
    /// Unused bytes at the end of the page
    pub free_space: u32,
    /// Unknown field at 0x08
    pub unknown_0008: u32,
    /// Previous leaf page, or -1
    pub block_prev: i32,
    /// Next leaf page, or -1
    pub block_next: i32,
}

impl PmglHeader {
    /// Parse a PMGL header from exactly 0x14 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        check_len("PMGL", data, PMGL_LEN)?;

        let mut cursor = Cursor::new(data);
        let signature = cursor.read_array::<4>()?;
        check_magic("PMGL", signature, PMGL_MAGIC)?;

        Ok(Self {
            free_space: cursor.read_u32()?,
            unknown_0008: cursor.read_u32()?,
            block_prev: cursor.read_i32()?,
            block_next: cursor.read_i32()?,
        })
    }
}

/// PMGI directory index page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmgiHeader {
    /// Unused bytes at the end of the page
    pub free_space: u32,
}

impl PmgiHeader {
    /// Parse a PMGI header from exactly 0x08 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        check_len("PMGI", data, PMGI_LEN)?;

        let mut cursor = Cursor::new(data);
        let signature = cursor.read_array::<4>()?;
        check_magic("PMGI", signature, PMGI_MAGIC)?;

        Ok(Self {
            free_space: cursor.read_u32()?,
        })
    }
}

/// Read the length-prefixed path that starts every directory entry.
pub fn read_entry_path(cursor: &mut Cursor<'_>) -> Result<String> {
    let len = cursor.read_cword()?;
    if len > MAX_PATH_LEN {
        return Err(ChmError::corrupt_directory(format!(
            "entry path length {len} exceeds {MAX_PATH_LEN}"
        )));
    }
    cursor.read_narrow_string(len as usize)
}

/// One entry of a PMGL page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmglEntry {
    /// Entry path, narrowed to single-byte characters
    pub path: String,
    /// Raw storage space number
    pub space: u64,
    /// Offset within the storage space
    pub start: u64,
    /// Length in bytes
    pub length: u64,
}

impl PmglEntry {
    /// Parse the entry at the cursor.
    pub fn parse(cursor: &mut Cursor<'_>) -> Result<Self> {
        let path = read_entry_path(cursor)?;
        Ok(Self {
            path,
            space: cursor.read_cword()?,
            start: cursor.read_cword()?,
            length: cursor.read_cword()?,
        })
    }

    /// Skip the space, start, and length of an entry whose path was read.
    pub fn skip_entry_data(cursor: &mut Cursor<'_>) -> Result<()> {
        cursor.skip_cword()?;
        cursor.skip_cword()?;
        cursor.skip_cword()
    }
}

/// LZXC control data of the compressed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzxcControlData {
    /// Number of dwords that follow the size field
    pub size: u32,
    /// Control data version
    pub version: u32,
    /// Bytes between decoder resets (scaled for version 2)
    pub reset_interval: u32,
    /// LZX window size in bytes (scaled for version 2)
    pub window_size: u32,
    /// Windows per reset
    pub windows_per_reset: u32,
    /// Trailing field, zero when absent
    pub unknown_18: u32,
}

impl LzxcControlData {
    /// Parse control data from at least 0x18 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < LZXC_MIN_LEN {
            return Err(ChmError::malformed(
                "LZXC",
                format!("control data too short ({:#x} bytes)", data.len()),
            ));
        }

        let mut cursor = Cursor::new(data);
        let size = cursor.read_u32()?;
        let signature = cursor.read_array::<4>()?;
        let version = cursor.read_u32()?;
        let mut reset_interval = cursor.read_u32()?;
        let mut window_size = cursor.read_u32()?;
        let windows_per_reset = cursor.read_u32()?;
        let unknown_18 = if data.len() >= LZXC_V2_LEN {
            cursor.read_u32()?
        } else {
            0
        };

        if version == 2 {
            let scale = |value: u32, field: &str| {
                value.checked_mul(LZXC_V2_UNIT).ok_or_else(|| {
                    ChmError::malformed("LZXC", format!("{field} {value:#x} overflows"))
                })
            };
            reset_interval = scale(reset_interval, "reset interval")?;
            window_size = scale(window_size, "window size")?;
        }

        if window_size == 0 || reset_interval == 0 {
            return Err(ChmError::malformed(
                "LZXC",
                "zero window size or reset interval",
            ));
        }
        if window_size == 1 {
            return Err(ChmError::malformed("LZXC", "window size of one byte"));
        }
        if reset_interval % (window_size / 2) != 0 {
            return Err(ChmError::malformed(
                "LZXC",
                format!(
                    "reset interval {reset_interval:#x} is not a multiple of half the window {window_size:#x}"
                ),
            ));
        }
        check_magic("LZXC", signature, LZXC_MAGIC)?;

        Ok(Self {
            size,
            version,
            reset_interval,
            window_size,
            windows_per_reset,
            unknown_18,
        })
    }
}

/// LZXC reset table header.
///
/// The table itself is an array of `block_count` little-endian `u64`
/// offsets into the content stream, stored at `table_offset` within the
/// reset table unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzxcResetTable {
    /// Table version (always 2)
    pub version: u32,
    /// Number of compressed blocks
    pub block_count: u32,
    /// Unknown field at 0x08
    pub unknown: u32,
    /// Offset of the offset array within the unit
    pub table_offset: u32,
    /// Total decompressed length
    pub uncompressed_len: u64,
    /// Total compressed length
    pub compressed_len: u64,
    /// Decompressed length of every block
    pub block_len: u64,
}

impl LzxcResetTable {
    /// Parse a reset table header from exactly 0x28 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        check_len("reset table", data, RESET_TABLE_LEN)?;

        let mut cursor = Cursor::new(data);
        let table = Self {
            version: cursor.read_u32()?,
            block_count: cursor.read_u32()?,
            unknown: cursor.read_u32()?,
            table_offset: cursor.read_u32()?,
            uncompressed_len: cursor.read_u64()?,
            compressed_len: cursor.read_u64()?,
            block_len: cursor.read_u64()?,
        };

        if table.version != 2 {
            return Err(ChmError::malformed(
                "reset table",
                format!("unsupported version {}", table.version),
            ));
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxichm_core::encode_cword;

    fn itsf_bytes(version: i32, header_len: i32, len: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(len);
        buf.extend_from_slice(b"ITSF");
        buf.extend_from_slice(&version.to_le_bytes());
        buf.extend_from_slice(&header_len.to_le_bytes());
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(&0x1234_5678u32.to_le_bytes());
        buf.extend_from_slice(&0x0409u32.to_le_bytes());
        buf.extend_from_slice(&[0xAA; 16]);
        buf.extend_from_slice(&[0xBB; 16]);
        buf.extend_from_slice(&0x60u64.to_le_bytes());
        buf.extend_from_slice(&0x18u64.to_le_bytes());
        buf.extend_from_slice(&0x78u64.to_le_bytes());
        buf.extend_from_slice(&0x1054u64.to_le_bytes());
        if len == ITSF_V3_LEN {
            buf.extend_from_slice(&0x2000u64.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_itsf_v2_computes_data_offset() {
        let header = ItsfHeader::parse(&itsf_bytes(2, 0x58, ITSF_V2_LEN)).unwrap();
        assert_eq!(header.version, 2);
        assert_eq!(header.lang_id, 0x0409);
        assert_eq!(header.dir_uuid, [0xAA; 16]);
        assert_eq!(header.dir_offset, 0x78);
        assert_eq!(header.data_offset, 0x78 + 0x1054);
    }

    #[test]
    fn test_itsf_v3_reads_data_offset() {
        let header = ItsfHeader::parse(&itsf_bytes(3, 0x60, ITSF_V3_LEN)).unwrap();
        assert_eq!(header.version, 3);
        assert_eq!(header.data_offset, 0x2000);
    }

    #[test]
    fn test_itsf_v3_needs_full_length() {
        let bytes = itsf_bytes(3, 0x60, ITSF_V2_LEN);
        assert!(matches!(
            ItsfHeader::parse(&bytes),
            Err(ChmError::MalformedHeader { structure: "ITSF", .. })
        ));
    }

    #[test]
    fn test_itsf_rejects_bad_input() {
        // Wrong slice length.
        assert!(ItsfHeader::parse(&[0u8; 0x40]).is_err());

        // Unknown version.
        assert!(ItsfHeader::parse(&itsf_bytes(4, 0x60, ITSF_V3_LEN)).is_err());

        // Header length too small for the version.
        assert!(ItsfHeader::parse(&itsf_bytes(3, 0x58, ITSF_V3_LEN)).is_err());

        // Bad signature.
        let mut bytes = itsf_bytes(2, 0x58, ITSF_V2_LEN);
        bytes[0] = b'X';
        assert!(ItsfHeader::parse(&bytes).is_err());
    }

    fn itsp_bytes(version: i32, header_len: i32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ITSP_V1_LEN);
        buf.extend_from_slice(b"ITSP");
        for value in [version, header_len, 10] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&0x1000u32.to_le_bytes());
        for value in [2i32, 2, 3, 0, -1] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&(-1i32).to_le_bytes());
        buf.extend_from_slice(&0x0409u32.to_le_bytes());
        buf.extend_from_slice(&[0x11; 16]);
        buf.extend_from_slice(&[0x22; 16]);
        buf
    }

    #[test]
    fn test_itsp_parse() {
        let header = ItspHeader::parse(&itsp_bytes(1, 0x54)).unwrap();
        assert_eq!(header.block_len, 0x1000);
        assert_eq!(header.index_depth, 2);
        assert_eq!(header.index_root, 3);
        assert_eq!(header.index_head, 0);
        assert_eq!(header.num_blocks, 4);
        assert_eq!(header.system_uuid, [0x11; 16]);
        assert_eq!(header.unknown_0044, [0x22; 16]);
    }

    #[test]
    fn test_itsp_rejects_bad_input() {
        assert!(ItspHeader::parse(&itsp_bytes(2, 0x54)).is_err());
        assert!(ItspHeader::parse(&itsp_bytes(1, 0x58)).is_err());
        assert!(ItspHeader::parse(&itsp_bytes(1, 0x54)[..0x50]).is_err());
    }

    #[test]
    fn test_pmgl_header() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"PMGL");
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&(-1i32).to_le_bytes());
        buf.extend_from_slice(&7i32.to_le_bytes());
        let header = PmglHeader::parse(&buf).unwrap();
        assert_eq!(header.free_space, 100);
        assert_eq!(header.block_prev, -1);
        assert_eq!(header.block_next, 7);

        buf[3] = b'I';
        assert!(PmglHeader::parse(&buf).is_err());
    }

    #[test]
    fn test_pmgi_header() {
        let mut buf = b"PMGI".to_vec();
        buf.extend_from_slice(&12u32.to_le_bytes());
        assert_eq!(PmgiHeader::parse(&buf).unwrap().free_space, 12);
        assert!(PmgiHeader::parse(&buf[..6]).is_err());
    }

    #[test]
    fn test_pmgl_entry() {
        let mut buf = encode_cword(9);
        buf.extend_from_slice(b"/index.ht");
        buf.extend(encode_cword(1));
        buf.extend(encode_cword(300));
        buf.extend(encode_cword(70_000));
        buf.push(0xFF);

        let mut cursor = Cursor::new(&buf);
        let entry = PmglEntry::parse(&mut cursor).unwrap();
        assert_eq!(entry.path, "/index.ht");
        assert_eq!(entry.space, 1);
        assert_eq!(entry.start, 300);
        assert_eq!(entry.length, 70_000);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_entry_skip_data() {
        let mut buf = encode_cword(2);
        buf.extend_from_slice(b"/a");
        buf.extend(encode_cword(0));
        buf.extend(encode_cword(1 << 20));
        buf.extend(encode_cword(5));

        let mut cursor = Cursor::new(&buf);
        assert_eq!(read_entry_path(&mut cursor).unwrap(), "/a");
        PmglEntry::skip_entry_data(&mut cursor).unwrap();
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_entry_path_length_guard() {
        let buf = encode_cword(MAX_PATH_LEN + 1);
        let mut cursor = Cursor::new(&buf);
        assert!(matches!(
            read_entry_path(&mut cursor),
            Err(ChmError::CorruptDirectory { .. })
        ));
    }

    #[test]
    fn test_entry_path_narrowed() {
        let mut buf = encode_cword(4);
        buf.extend_from_slice("/é!".as_bytes());
        let mut cursor = Cursor::new(&buf);
        assert_eq!(read_entry_path(&mut cursor).unwrap(), "/?!");
    }

    fn lzxc_bytes(version: u32, interval: u32, window: u32, per_reset: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&6u32.to_le_bytes());
        buf.extend_from_slice(b"LZXC");
        for value in [version, interval, window, per_reset, 0] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf
    }

    #[test]
    fn test_lzxc_version2_scaling() {
        let ctl = LzxcControlData::parse(&lzxc_bytes(2, 2, 2, 1)).unwrap();
        assert_eq!(ctl.reset_interval, 0x10000);
        assert_eq!(ctl.window_size, 0x10000);
        assert_eq!(ctl.windows_per_reset, 1);
    }

    #[test]
    fn test_lzxc_version1_and_short_form() {
        let bytes = lzxc_bytes(1, 0x8000, 0x8000, 2);
        let ctl = LzxcControlData::parse(&bytes[..LZXC_MIN_LEN]).unwrap();
        assert_eq!(ctl.reset_interval, 0x8000);
        assert_eq!(ctl.window_size, 0x8000);
        assert_eq!(ctl.unknown_18, 0);
    }

    #[test]
    fn test_lzxc_rejects_bad_parameters() {
        assert!(LzxcControlData::parse(&lzxc_bytes(1, 0, 0x8000, 1)).is_err());
        assert!(LzxcControlData::parse(&lzxc_bytes(1, 0x8000, 0, 1)).is_err());
        assert!(LzxcControlData::parse(&lzxc_bytes(1, 0x8000, 1, 1)).is_err());
        // Not a multiple of half the window.
        assert!(LzxcControlData::parse(&lzxc_bytes(1, 0x6000, 0x8000, 1)).is_err());
        assert!(LzxcControlData::parse(&lzxc_bytes(1, 0x8000, 0x8000, 1)[..0x14]).is_err());

        let mut bad_magic = lzxc_bytes(1, 0x8000, 0x8000, 1);
        bad_magic[4] = b'X';
        assert!(LzxcControlData::parse(&bad_magic).is_err());
    }

    #[test]
    fn test_reset_table() {
        let mut buf = Vec::new();
        for value in [2u32, 3, 0, 0x28] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for value in [0x18000u64, 0x9000, 0x8000] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        let table = LzxcResetTable::parse(&buf).unwrap();
        assert_eq!(table.block_count, 3);
        assert_eq!(table.table_offset, 0x28);
        assert_eq!(table.compressed_len, 0x9000);
        assert_eq!(table.block_len, 0x8000);

        buf[0] = 1;
        assert!(LzxcResetTable::parse(&buf).is_err());
        assert!(LzxcResetTable::parse(&[0u8; 0x20]).is_err());
    }
}
