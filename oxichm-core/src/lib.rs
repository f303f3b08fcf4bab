//! # OxiCHM Core
//!
//! Core components for the OxiCHM archive library.
//!
//! This crate provides the fundamental building blocks shared by the codec
//! and container layers:
//!
//! - [`cursor`]: Bounded little-endian reader for fixed-layout structures,
//!   including the ITSF "compressed word" variable-length integers
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiCHM is layered the same way as the rest of the OxiArc family:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     list / extract / info                               │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     ITSF/ITSP headers, PMGL/PMGI directory, block cache │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZX (Huffman + sliding window + E8 translation)     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     Cursor, compressed words, errors                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxichm_core::cursor::Cursor;
//!
//! let data = [0x34, 0x12, 0x81, 0x00];
//! let mut cursor = Cursor::new(&data);
//! assert_eq!(cursor.read_u16().unwrap(), 0x1234);
//! assert_eq!(cursor.read_cword().unwrap(), 128);
//! assert!(cursor.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cursor;
pub mod error;

// Re-exports for convenience
pub use cursor::{Cursor, encode_cword, narrow_utf8};
pub use error::{ChmError, Result};
