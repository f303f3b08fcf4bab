//! Constant tables for LZX decoding.
//!
//! LZX encodes match offsets as a "position slot" plus a number of footer
//! bits. [`POSITION_BASE`] gives the smallest formatted offset of each slot
//! and [`EXTRA_BITS`] how many footer bits follow it.

/// Smallest supported window (32 KiB).
pub const MIN_WINDOW_BITS: u32 = 15;

/// Largest supported window (2 MiB).
pub const MAX_WINDOW_BITS: u32 = 21;

/// Shortest match the format can express.
pub const MIN_MATCH: usize = 2;

/// Longest match the format can express.
pub const MAX_MATCH: usize = 257;

/// Number of literal symbols at the start of the main tree.
pub const NUM_CHARS: usize = 256;

/// Length headers 0..7 live in the main symbol; 7 means "read the length tree".
pub const NUM_PRIMARY_LENGTHS: usize = 7;

/// Number of symbols in the length tree.
pub const NUM_SECONDARY_LENGTHS: usize = 249;

/// Number of symbols in the pretree used to transmit code lengths.
pub const PRETREE_NUM_ELEMENTS: usize = 20;

/// Number of symbols in the aligned offset tree.
pub const ALIGNED_NUM_ELEMENTS: usize = 8;

/// Pretree decode table parameters.
pub const PRETREE_MAXSYMBOLS: usize = PRETREE_NUM_ELEMENTS;
/// Direct lookup bits for the pretree.
pub const PRETREE_TABLEBITS: u32 = 6;

/// Main tree decode table parameters (largest window: 50 slots).
pub const MAINTREE_MAXSYMBOLS: usize = NUM_CHARS + 50 * 8;
/// Direct lookup bits for the main tree.
pub const MAINTREE_TABLEBITS: u32 = 12;

/// Length tree decode table parameters.
pub const LENGTH_MAXSYMBOLS: usize = NUM_SECONDARY_LENGTHS + 1;
/// Direct lookup bits for the length tree.
pub const LENGTH_TABLEBITS: u32 = 12;

/// Aligned offset tree decode table parameters.
pub const ALIGNED_MAXSYMBOLS: usize = ALIGNED_NUM_ELEMENTS;
/// Direct lookup bits for the aligned offset tree.
pub const ALIGNED_TABLEBITS: u32 = 7;

/// Slack past the end of every length table; run codes may overshoot into it.
pub const LENTABLE_SAFETY: usize = 64;

/// Number of output frames that are subject to E8 translation.
pub const INTEL_MAX_FRAMES: u32 = 32768;

/// Footer bit count per position slot.
pub const EXTRA_BITS: [u8; 51] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, //
    7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, //
    15, 15, 16, 16, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, 17, //
    17, 17, 17,
];

/// Base formatted offset per position slot.
pub const POSITION_BASE: [u32; 51] = [
    0, 1, 2, 3, 4, 6, 8, 12, 16, 24, 32, 48, 64, 96, 128, 192, //
    256, 384, 512, 768, 1024, 1536, 2048, 3072, 4096, 6144, 8192, 12288, 16384, 24576, 32768,
    49152, //
    65536, 98304, 131072, 196608, 262144, 393216, 524288, 655360, 786432, 917504, 1048576,
    1179648, 1310720, 1441792, 1572864, 1703936, //
    1835008, 1966080, 2097152,
];

/// Number of position slots for a window of `2^window_bits` bytes.
///
/// The 1 MiB and 2 MiB windows use 42 and 50 slots rather than the
/// `2 * window_bits` that holds for the smaller sizes.
pub fn position_slots(window_bits: u32) -> usize {
    match window_bits {
        20 => 42,
        21 => 50,
        bits => (bits as usize) << 1,
    }
}

/// Number of main tree symbols for a window of `2^window_bits` bytes.
pub fn main_elements(window_bits: u32) -> usize {
    NUM_CHARS + (position_slots(window_bits) << 3)
}
