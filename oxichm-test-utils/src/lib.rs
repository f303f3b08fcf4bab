//! Test utilities for OxiCHM
//!
//! A minimal LZX stream writer for building decoder and archive test inputs.
//!
//! Produces valid Verbatim, Aligned, and Uncompressed blocks from an explicit
//! token list. Huffman codes are complete canonical codes over the symbols a
//! block actually uses; code-length deltas use every pretree run form.
//!
//! Frames are flushed to a word boundary and followed by one zero word, so
//! the decoder's 16-bit lookahead never reaches past the frame. An odd-length
//! uncompressed block must not end a frame: its pad byte would belong to the
//! next frame.

use oxichm_lzx::tables::{
    ALIGNED_NUM_ELEMENTS, EXTRA_BITS, MIN_MATCH, NUM_CHARS, NUM_PRIMARY_LENGTHS,
    NUM_SECONDARY_LENGTHS, POSITION_BASE, PRETREE_NUM_ELEMENTS, main_elements,
};

/// MSB-first bit writer emitting 16-bit little-endian words.
#[derive(Debug, Default)]
pub struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    nbits: u32,
}

impl BitWriter {
    pub fn write(&mut self, value: u32, n: u32) {
        for i in (0..n).rev() {
            self.acc = (self.acc << 1) | ((value >> i) & 1);
            self.nbits += 1;
            if self.nbits == 16 {
                self.out.extend_from_slice(&(self.acc as u16).to_le_bytes());
                self.acc = 0;
                self.nbits = 0;
            }
        }
    }

    pub fn pad_to_word(&mut self) {
        if self.nbits > 0 {
            self.write(0, 16 - self.nbits);
        }
    }

    /// Padding in front of an uncompressed block: up to the next word
    /// boundary, or a whole word when already aligned.
    pub fn align_for_raw(&mut self) {
        self.write(0, 16 - self.nbits);
    }

    pub fn push_raw(&mut self, bytes: &[u8]) {
        assert_eq!(self.nbits, 0, "raw bytes need word alignment");
        self.out.extend_from_slice(bytes);
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }
}

/// One unit of compressed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(u8),
    /// Explicit offset (position slot >= 3).
    Match { distance: u32, length: usize },
    /// Reuse repeat offset R0, R1, or R2.
    Repeat { index: usize, length: usize },
}

impl Token {
    pub fn output_len(&self) -> usize {
        match *self {
            Token::Literal(_) => 1,
            Token::Match { length, .. } | Token::Repeat { length, .. } => length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Verbatim,
    Aligned,
}

/// Code lengths of a complete prefix code over `used` (dummy added for one).
pub fn complete_lengths(nsyms: usize, used: &[usize]) -> Vec<u8> {
    let mut syms: Vec<usize> = used.to_vec();
    syms.sort_unstable();
    syms.dedup();

    let mut lengths = vec![0u8; nsyms];
    if syms.is_empty() {
        return lengths;
    }
    if syms.len() == 1 {
        let dummy = if syms[0] == 0 { 1 } else { 0 };
        syms.push(dummy);
        syms.sort_unstable();
    }

    let n = syms.len();
    let k = n.next_power_of_two().trailing_zeros() as u8;
    let short = (1usize << k) - n;
    for (i, &sym) in syms.iter().enumerate() {
        lengths[sym] = if i < short { k - 1 } else { k };
    }
    lengths
}

/// Canonical codes for `lengths` (shorter first, then by symbol).
pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..lengths.len()).filter(|&s| lengths[s] > 0).collect();
    order.sort_by_key(|&s| (lengths[s], s));

    let mut codes = vec![0u32; lengths.len()];
    let mut code = 0u32;
    let mut prev = 0u8;
    for sym in order {
        code <<= lengths[sym] - prev;
        codes[sym] = code;
        code += 1;
        prev = lengths[sym];
    }
    codes
}

struct Code {
    lengths: Vec<u8>,
    codes: Vec<u32>,
}

impl Code {
    fn new(nsyms: usize, used: &[usize]) -> Self {
        let lengths = complete_lengths(nsyms, used);
        let codes = canonical_codes(&lengths);
        Self { lengths, codes }
    }

    fn emit(&self, bits: &mut BitWriter, sym: usize) {
        assert!(self.lengths[sym] > 0, "symbol {} has no code", sym);
        bits.write(self.codes[sym], u32::from(self.lengths[sym]));
    }
}

#[derive(Debug, Clone, Copy)]
enum PreToken {
    Delta(u8),
    ShortZeros(u32),
    LongZeros(u32),
    Same(u32, u8),
}

/// Delta-code `new` against `old` with a fresh pretree.
fn write_lengths(bits: &mut BitWriter, old: &[u8], new: &[u8]) {
    let delta = |o: u8, n: u8| ((u32::from(o) + 17 - u32::from(n)) % 17) as u8;

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < new.len() {
        let value = new[i];
        let run = new[i..].iter().take_while(|&&v| v == value).count();
        if value == 0 && run >= 20 {
            let n = run.min(51);
            tokens.push(PreToken::LongZeros((n - 20) as u32));
            i += n;
        } else if value == 0 && run >= 4 {
            let n = run.min(19);
            tokens.push(PreToken::ShortZeros((n - 4) as u32));
            i += n;
        } else if run >= 4 {
            let n = run.min(5);
            tokens.push(PreToken::Same((n - 4) as u32, delta(old[i], value)));
            i += n;
        } else {
            tokens.push(PreToken::Delta(delta(old[i], value)));
            i += 1;
        }
    }

    let used: Vec<usize> = tokens
        .iter()
        .flat_map(|t| match *t {
            PreToken::Delta(z) => vec![usize::from(z)],
            PreToken::ShortZeros(_) => vec![17],
            PreToken::LongZeros(_) => vec![18],
            PreToken::Same(_, z) => vec![19, usize::from(z)],
        })
        .collect();
    let pretree = Code::new(PRETREE_NUM_ELEMENTS, &used);

    for &len in &pretree.lengths {
        bits.write(u32::from(len), 4);
    }
    for token in tokens {
        match token {
            PreToken::Delta(z) => pretree.emit(bits, usize::from(z)),
            PreToken::ShortZeros(k) => {
                pretree.emit(bits, 17);
                bits.write(k, 4);
            }
            PreToken::LongZeros(k) => {
                pretree.emit(bits, 18);
                bits.write(k, 5);
            }
            PreToken::Same(k, z) => {
                pretree.emit(bits, 19);
                bits.write(k, 1);
                pretree.emit(bits, usize::from(z));
            }
        }
    }
}

/// How one token is spelled in the bitstream.
struct Spelled {
    main: usize,
    length: Option<usize>,
    verbatim: Option<(u32, u32)>,
    aligned: Option<usize>,
}

fn spell(token: Token, kind: Kind) -> Spelled {
    let (slot, length) = match token {
        Token::Literal(b) => {
            return Spelled {
                main: usize::from(b),
                length: None,
                verbatim: None,
                aligned: None,
            };
        }
        Token::Repeat { index, length } => {
            assert!(index < 3);
            (index, length)
        }
        Token::Match { distance, length } => {
            let formatted = distance + 2;
            let slot = (3..POSITION_BASE.len())
                .rev()
                .find(|&s| POSITION_BASE[s] <= formatted)
                .expect("slot");
            (slot, length)
        }
    };

    assert!(length >= MIN_MATCH);
    let header = (length - MIN_MATCH).min(NUM_PRIMARY_LENGTHS);
    let length_sym = (header == NUM_PRIMARY_LENGTHS).then(|| length - MIN_MATCH - NUM_PRIMARY_LENGTHS);
    let main = NUM_CHARS + ((slot << 3) | header);

    let (mut verbatim, mut aligned) = (None, None);
    if let Token::Match { distance, .. } = token {
        let footer = distance + 2 - POSITION_BASE[slot];
        let extra = u32::from(EXTRA_BITS[slot]);
        match kind {
            Kind::Verbatim => {
                if slot != 3 {
                    verbatim = Some((footer, extra));
                }
            }
            Kind::Aligned => {
                if extra > 3 {
                    verbatim = Some((footer >> 3, extra - 3));
                    aligned = Some((footer & 7) as usize);
                } else if extra == 3 {
                    aligned = Some(footer as usize);
                } else if extra > 0 {
                    verbatim = Some((footer, extra));
                }
            }
        }
    }

    Spelled {
        main,
        length: length_sym,
        verbatim,
        aligned,
    }
}

/// Stateful LZX writer mirroring the decoder's persistent code lengths.
pub struct LzxWriter {
    bits: BitWriter,
    main_elements: usize,
    main_lens: Vec<u8>,
    length_lens: Vec<u8>,
    header_pending: bool,
}

impl LzxWriter {
    pub fn new(window_bits: u32) -> Self {
        let main_elements = main_elements(window_bits);
        Self {
            bits: BitWriter::default(),
            main_elements,
            main_lens: vec![0; main_elements],
            length_lens: vec![0; NUM_SECONDARY_LENGTHS],
            header_pending: true,
        }
    }

    /// Start a new reset interval.
    pub fn reset(&mut self) {
        self.main_lens.fill(0);
        self.length_lens.fill(0);
        self.header_pending = true;
    }

    fn stream_header(&mut self) {
        if self.header_pending {
            self.bits.write(0, 1);
            self.header_pending = false;
        }
    }

    /// Announce an E8 translation file size. Must precede the first block.
    pub fn e8_header(&mut self, filesize: i32) {
        assert!(self.header_pending);
        let value = filesize as u32;
        self.bits.write(1, 1);
        self.bits.write(value >> 16, 16);
        self.bits.write(value & 0xFFFF, 16);
        self.header_pending = false;
    }

    /// A verbatim or aligned block whose tokens all live in one frame.
    pub fn compressed(&mut self, kind: Kind, tokens: &[Token]) {
        let frames = self.compressed_across_frames(kind, &[tokens]);
        assert!(frames.is_empty());
    }

    /// A verbatim or aligned block split across frames.
    ///
    /// Every part but the last ends its frame; those frames are returned.
    pub fn compressed_across_frames(&mut self, kind: Kind, parts: &[&[Token]]) -> Vec<Vec<u8>> {
        self.stream_header();

        let all: Vec<Token> = parts.iter().flat_map(|p| p.iter().copied()).collect();
        let block_len: usize = all.iter().map(Token::output_len).sum();
        let spelled: Vec<Spelled> = all.iter().map(|&t| spell(t, kind)).collect();

        let mains: Vec<usize> = spelled.iter().map(|s| s.main).collect();
        assert!(mains.iter().all(|&m| m < self.main_elements));
        let lengths: Vec<usize> = spelled.iter().filter_map(|s| s.length).collect();
        let aligned: Vec<usize> = spelled.iter().filter_map(|s| s.aligned).collect();

        let main_code = Code::new(self.main_elements, &mains);
        let length_code = Code::new(NUM_SECONDARY_LENGTHS, &lengths);
        let aligned_code = Code::new(ALIGNED_NUM_ELEMENTS, &aligned);

        let block_type = match kind {
            Kind::Verbatim => 1,
            Kind::Aligned => 2,
        };
        self.bits.write(block_type, 3);
        self.bits.write((block_len >> 8) as u32, 16);
        self.bits.write((block_len & 0xFF) as u32, 8);

        if kind == Kind::Aligned {
            for &len in &aligned_code.lengths {
                self.bits.write(u32::from(len), 3);
            }
        }
        write_lengths(
            &mut self.bits,
            &self.main_lens[..NUM_CHARS],
            &main_code.lengths[..NUM_CHARS],
        );
        write_lengths(
            &mut self.bits,
            &self.main_lens[NUM_CHARS..],
            &main_code.lengths[NUM_CHARS..],
        );
        write_lengths(&mut self.bits, &self.length_lens, &length_code.lengths);
        self.main_lens.copy_from_slice(&main_code.lengths);
        self.length_lens.copy_from_slice(&length_code.lengths);

        let mut frames = Vec::new();
        let mut index = 0;
        for (n, part) in parts.iter().enumerate() {
            for _ in 0..part.len() {
                let s = &spelled[index];
                index += 1;
                main_code.emit(&mut self.bits, s.main);
                if let Some(sym) = s.length {
                    length_code.emit(&mut self.bits, sym);
                }
                if let Some((value, count)) = s.verbatim {
                    self.bits.write(value, count);
                }
                if let Some(sym) = s.aligned {
                    aligned_code.emit(&mut self.bits, sym);
                }
            }
            if n + 1 < parts.len() {
                frames.push(self.take_frame());
            }
        }
        frames
    }

    /// An uncompressed block that sets R0..R2.
    pub fn uncompressed(&mut self, r: [u32; 3], data: &[u8]) {
        self.stream_header();
        self.bits.write(3, 3);
        self.bits.write((data.len() >> 8) as u32, 16);
        self.bits.write((data.len() & 0xFF) as u32, 8);
        self.bits.align_for_raw();
        for value in r {
            self.bits.push_raw(&value.to_le_bytes());
        }
        self.bits.push_raw(data);
        if data.len() % 2 == 1 {
            self.bits.push_raw(&[0]);
        }
    }

    /// Close the current frame and return its bytes.
    pub fn take_frame(&mut self) -> Vec<u8> {
        self.bits.pad_to_word();
        self.bits.push_raw(&[0, 0]);
        self.bits.take()
    }
}

/// Reference expansion of a token stream starting from R0 = R1 = R2 = 1.
pub fn expand(tokens: &[Token]) -> (Vec<u8>, [u32; 3]) {
    expand_from(Vec::new(), [1; 3], tokens)
}

/// Reference expansion continuing `out` with repeat offsets `r`.
pub fn expand_from(mut out: Vec<u8>, mut r: [u32; 3], tokens: &[Token]) -> (Vec<u8>, [u32; 3]) {
    for &token in tokens {
        let (distance, length) = match token {
            Token::Literal(b) => {
                out.push(b);
                continue;
            }
            Token::Match { distance, length } => {
                r = [distance, r[0], r[1]];
                (distance, length)
            }
            Token::Repeat { index, length } => {
                let distance = r[index];
                r.swap(0, index);
                (distance, length)
            }
        };
        for _ in 0..length {
            let byte = out[out.len() - distance as usize];
            out.push(byte);
        }
    }
    (out, r)
}

/// Deterministic pseudo-random bytes.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Literal tokens for `data`.
pub fn literals(data: &[u8]) -> Vec<Token> {
    data.iter().map(|&b| Token::Literal(b)).collect()
}
