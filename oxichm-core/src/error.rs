//! Error types for OxiCHM operations.
//!
//! A single error enum covers every layer: structure parsing, directory
//! traversal, LZX decoding, and the underlying I/O.

use std::io;
use thiserror::Error;

/// The main error type for OxiCHM operations.
#[derive(Debug, Error)]
pub enum ChmError {
    /// I/O error from the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A fixed-layout structure had a bad length, signature, or version.
    #[error("Malformed {structure} header: {message}")]
    MalformedHeader {
        /// Name of the structure being parsed (e.g. "ITSF").
        structure: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The input ended before a field could be read.
    #[error("Truncated input: need {needed} bytes, have {available}")]
    TruncatedInput {
        /// Number of bytes the field requires.
        needed: usize,
        /// Number of bytes left in the input.
        available: usize,
    },

    /// A directory page could not be interpreted.
    #[error("Corrupt directory: {message}")]
    CorruptDirectory {
        /// Description of the problem.
        message: String,
    },

    /// The requested path is not present in the directory.
    #[error("Entry not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The LZX bitstream is malformed (bad Huffman table, overrun, etc.).
    #[error("Illegal LZX data: {message}")]
    IllegalData {
        /// Description of the problem.
        message: String,
    },

    /// The LZX stream is structurally impossible for the window size.
    #[error("LZX data format error: {message}")]
    DataFormat {
        /// Description of the problem.
        message: String,
    },

    /// A buffer allocation failed.
    #[error("Out of memory allocating {bytes} bytes")]
    NoMemory {
        /// Requested allocation size.
        bytes: usize,
    },

    /// Unsupported storage space, version, or window size.
    #[error("Unsupported: {what}")]
    Unsupported {
        /// What was not supported.
        what: String,
    },

    /// Compressed stream bookkeeping is inconsistent.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// An enumeration visitor asked to abort.
    #[error("Enumeration aborted at {path}")]
    EnumerationAborted {
        /// Path of the entry the visitor rejected.
        path: String,
    },

    /// The archive handle has been closed.
    #[error("Archive has been closed")]
    ArchiveClosed,

    /// Path traversal attempt detected (e.g., "../" in an entry path).
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious path.
        path: String,
    },
}

/// Result type alias for OxiCHM operations.
pub type Result<T> = std::result::Result<T, ChmError>;

impl ChmError {
    /// Create a malformed header error.
    pub fn malformed(structure: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            structure,
            message: message.into(),
        }
    }

    /// Create a truncated input error.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedInput { needed, available }
    }

    /// Create a corrupt directory error.
    pub fn corrupt_directory(message: impl Into<String>) -> Self {
        Self::CorruptDirectory {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an illegal LZX data error.
    pub fn illegal_data(message: impl Into<String>) -> Self {
        Self::IllegalData {
            message: message.into(),
        }
    }

    /// Create an LZX data format error.
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat {
            message: message.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported { what: what.into() }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Whether this error came out of the LZX decoder.
    ///
    /// The decoder must be reset before it is used again after any of these.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::IllegalData { .. } | Self::DataFormat { .. } | Self::NoMemory { .. }
        )
    }
}
