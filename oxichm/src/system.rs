//! The `/#SYSTEM` metadata unit.
//!
//! `#SYSTEM` starts with an `i32` version followed by tagged records, each a
//! `u16` code, a `u16` length, and that many bytes of data. String records
//! are NUL-terminated Windows-1252 text.

use crate::ChmFile;
use encoding_rs::WINDOWS_1252;
use oxichm_core::{Cursor, Result};
use std::io::{Read, Seek};

/// Path of the metadata unit.
pub const SYSTEM_PATH: &str = "/#SYSTEM";

/// Record codes found in `#SYSTEM`.
pub mod code {
    /// Table of contents file (`.hhc`)
    pub const CONTENTS_FILE: u16 = 0;
    /// Index file (`.hhk`)
    pub const INDEX_FILE: u16 = 1;
    /// Default topic
    pub const DEFAULT_TOPIC: u16 = 2;
    /// Title
    pub const TITLE: u16 = 3;
    /// Options bit field
    pub const OPTIONS: u16 = 4;
    /// Default window name
    pub const DEFAULT_WINDOW: u16 = 5;
    /// Compiled file name
    pub const COMPILED_FILE: u16 = 6;
    /// Binary index
    pub const BINARY_INDEX: u16 = 7;
    /// Strings pointer
    pub const STRINGS_PTR: u16 = 8;
    /// Generator version
    pub const GENERATOR_VERSION: u16 = 9;
    /// Compilation timestamp
    pub const TIMESTAMP: u16 = 10;
    /// Binary table of contents
    pub const BINARY_TOC: u16 = 11;
    /// Number of information types
    pub const INFO_TYPE_COUNT: u16 = 12;
    /// Index header
    pub const IDX_HEADER: u16 = 13;
    /// MSO extensions
    pub const MSO_EXTENSIONS: u16 = 14;
    /// Information type checksum
    pub const INFO_TYPE_CHECKSUM: u16 = 15;
    /// Default font
    pub const DEFAULT_FONT: u16 = 16;
}

/// Compiler compatibility level recorded in the version field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Any other version
    Unknown,
    /// HTML Help 1.0
    V1_0,
    /// HTML Help 1.1 and later
    V1_1,
}

impl Compatibility {
    /// Map a `#SYSTEM` version number.
    pub fn from_version(version: i32) -> Self {
        match version {
            2 => Compatibility::V1_0,
            3 => Compatibility::V1_1,
            _ => Compatibility::Unknown,
        }
    }
}

/// One `#SYSTEM` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEntry {
    /// Record code
    pub code: u16,
    /// Record data
    pub data: Vec<u8>,
}

impl SystemEntry {
    /// Decode the data as NUL-terminated Windows-1252 text.
    pub fn text(&self) -> String {
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(&self.data[..end]);
        text.into_owned()
    }
}

/// Parsed `#SYSTEM` unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFile {
    version: i32,
    entries: Vec<SystemEntry>,
}

impl SystemFile {
    /// Resolve and parse `/#SYSTEM` from an archive.
    pub fn read<R: Read + Seek>(chm: &ChmFile<R>) -> Result<Self> {
        let unit = chm.resolve(SYSTEM_PATH)?;
        let data = chm.read_unit(&unit)?;
        Self::parse(&data)
    }

    /// Parse the raw bytes of a `#SYSTEM` unit.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let version = cursor.read_i32()?;

        let mut entries = Vec::new();
        while !cursor.is_empty() {
            let code = cursor.read_u16()?;
            let len = cursor.read_u16()?;
            let data = cursor.read_bytes(usize::from(len))?.to_vec();
            entries.push(SystemEntry { code, data });
        }

        Ok(Self { version, entries })
    }

    /// Raw version field.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Compatibility level.
    pub fn compatibility(&self) -> Compatibility {
        Compatibility::from_version(self.version)
    }

    /// All records in file order.
    pub fn entries(&self) -> &[SystemEntry] {
        &self.entries
    }

    /// First record with `code`.
    pub fn entry(&self, code: u16) -> Option<&SystemEntry> {
        self.entries.iter().find(|entry| entry.code == code)
    }

    /// Text of the first record with `code`.
    pub fn string(&self, code: u16) -> Option<String> {
        self.entry(code).map(SystemEntry::text)
    }

    /// Title of the help file.
    pub fn title(&self) -> Option<String> {
        self.string(code::TITLE)
    }

    /// Topic shown on open.
    pub fn default_topic(&self) -> Option<String> {
        self.string(code::DEFAULT_TOPIC)
    }

    /// Table of contents file.
    pub fn contents_file(&self) -> Option<String> {
        self.string(code::CONTENTS_FILE)
    }

    /// Index file.
    pub fn index_file(&self) -> Option<String> {
        self.string(code::INDEX_FILE)
    }

    /// Default window name.
    pub fn default_window(&self) -> Option<String> {
        self.string(code::DEFAULT_WINDOW)
    }

    /// Name the file was compiled as.
    pub fn compiled_file(&self) -> Option<String> {
        self.string(code::COMPILED_FILE)
    }

    /// Version string of the compiler.
    pub fn generator_version(&self) -> Option<String> {
        self.string(code::GENERATOR_VERSION)
    }

    /// Default font specification.
    pub fn default_font(&self) -> Option<String> {
        self.string(code::DEFAULT_FONT)
    }
}
