//! # OxiCHM
//!
//! Reader for Microsoft Compiled HTML Help (`.chm`) archives.
//!
//! A CHM file is an ITSF container: a directory of named entries followed
//! by a content section. Entries live either in the uncompressed section or
//! in a single LZX-compressed stream that is split into blocks with
//! periodic decoder resets, so any byte range can be decoded without
//! starting from the beginning.
//!
//! ## Components
//!
//! - [`header`]: ITSF, ITSP, PMGL, PMGI, and LZXC structure parsers
//! - [`unit`]: Entry descriptors and enumeration filters
//! - [`cache`]: Direct-mapped cache of decompressed blocks
//! - [`lzx_stream`]: Compressed section parameters
//! - [`archive`]: The [`ChmFile`] handle
//! - [`system`]: The `/#SYSTEM` metadata unit
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxichm::{ChmFile, EnumerateFlags, EnumerateStatus};
//!
//! let chm = ChmFile::open("manual.chm").unwrap();
//! chm.enumerate(EnumerateFlags::NORMAL, |unit| {
//!     println!("{} ({} bytes)", unit.path, unit.length);
//!     EnumerateStatus::Continue
//! })
//! .unwrap();
//!
//! let unit = chm.resolve("/index.html").unwrap();
//! let html = chm.read_unit(&unit).unwrap();
//! println!("{}", String::from_utf8_lossy(&html));
//! ```
//!
//! ## Concurrency
//!
//! [`ChmFile`] methods take `&self`. Reads of the underlying stream, the
//! LZX decoder, and the block cache are each guarded by their own lock, so
//! one handle can serve several threads.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod cache;
mod directory;
pub mod header;
pub mod lzx_stream;
mod storage;
pub mod system;
pub mod unit;

// Re-exports
pub use archive::{
    CONTENT_PATH, CONTROL_DATA_PATH, ChmFile, DEFAULT_CACHE_BLOCKS, RESET_TABLE_PATH,
    SPAN_INFO_PATH,
};
pub use cache::BlockCache;
pub use header::{ItsfHeader, ItspHeader, LzxcControlData, LzxcResetTable, MAX_PATH_LEN};
pub use lzx_stream::CompressionInfo;
pub use oxichm_core::{ChmError, Result};
pub use system::{Compatibility, SystemEntry, SystemFile};
pub use unit::{EnumerateFlags, EnumerateStatus, StorageSpace, UnitInfo};
