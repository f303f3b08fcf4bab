//! # OxiCHM LZX
//!
//! Pure Rust LZX decompression as used by Microsoft Compiled HTML Help.
//!
//! LZX combines an LZ77 sliding window (32 KiB to 2 MiB) with canonical
//! Huffman coding, a three-entry repeat-offset cache, and an optional
//! post-pass that undoes x86 `CALL` operand rewriting ("E8 translation").
//!
//! ## Components
//!
//! - [`bitstream`]: MSB-first reader over 16-bit little-endian words
//! - [`huffman`]: Decode table construction and code-length delta reader
//! - [`decoder`]: The block state machine and sliding window
//! - [`intel`]: E8 call translation
//! - [`tables`]: Position slot tables and format constants
//!
//! ## Frames and resets
//!
//! Compressed data is a sequence of frames, each decoded by one call to
//! [`LzxDecoder::decompress`]. Decoding is only valid forward: frame `n`
//! depends on every frame since the last reset point. The caller decides
//! where reset points are and calls [`LzxDecoder::reset`] there.
//!
//! ## Example
//!
//! ```rust
//! use oxichm_lzx::LzxDecoder;
//!
//! // A single uncompressed block holding "abc" (+ pad byte).
//! let input = [
//!     0x00, 0x30, 0x30, 0x00, // no E8 header, type 3, length 3
//!     0x01, 0x00, 0x00, 0x00, // R0
//!     0x01, 0x00, 0x00, 0x00, // R1
//!     0x01, 0x00, 0x00, 0x00, // R2
//!     b'a', b'b', b'c', 0x00,
//! ];
//!
//! let mut decoder = LzxDecoder::new(15).unwrap();
//! let mut output = [0u8; 3];
//! decoder.decompress(&input, &mut output).unwrap();
//! assert_eq!(&output, b"abc");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod decoder;
pub mod huffman;
pub mod intel;
pub mod tables;

// Re-exports
pub use bitstream::LzxBitReader;
pub use decoder::{BlockType, LzxDecoder};
pub use huffman::{HuffmanTable, make_decode_table, read_lengths};
pub use intel::E8Translator;
