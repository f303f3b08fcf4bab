//! Synthetic CHM archives for integration tests.
//!
//! [`ChmBuilder`] lays out a complete ITSF file: header, ITSP, PMGL leaves
//! chained in sorted order, PMGI index levels when there is more than one
//! leaf, and a content section holding raw entries plus the LZX-compressed
//! stream with its control data and reset table.

#![allow(dead_code)]

use oxichm::ChmFile;
use oxichm::{CONTENT_PATH, CONTROL_DATA_PATH, RESET_TABLE_PATH, SPAN_INFO_PATH};
use oxichm_core::encode_cword;
use oxichm_test_utils::{Kind, LzxWriter, Token};
use std::collections::HashMap;
use std::io::Write;

/// Decompressed bytes per compressed block.
pub const BLOCK_LEN: usize = 0x1000;
/// LZX window of every generated stream.
pub const WINDOW_BITS: u32 = 15;

const WINDOW_SIZE: usize = 1 << WINDOW_BITS;
const MAX_DISTANCE: usize = WINDOW_SIZE - 3;
const MAX_MATCH: usize = 257;
const MIN_TOKEN_MATCH: usize = 3;

const PMGL_LEN: usize = 0x14;
const PMGI_LEN: usize = 0x08;
const ITSP_LEN: usize = 0x54;

#[derive(Debug, Clone)]
enum Body {
    Raw(Vec<u8>),
    Compressed(Vec<u8>),
    Dir,
}

#[derive(Debug, Clone)]
struct Entry {
    path: String,
    space: u64,
    start: u64,
    length: u64,
}

/// Builder for an in-memory CHM file.
#[derive(Debug, Clone)]
pub struct ChmBuilder {
    version: i32,
    page_len: usize,
    force_index: bool,
    data_gap: usize,
    blocks_per_reset: usize,
    control_data: Option<Vec<u8>>,
    with_section: bool,
    bodies: Vec<(String, Body)>,
}

impl Default for ChmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChmBuilder {
    pub fn new() -> Self {
        Self {
            version: 3,
            page_len: 0x1000,
            force_index: false,
            data_gap: 0,
            blocks_per_reset: 2,
            control_data: None,
            with_section: true,
            bodies: Vec::new(),
        }
    }

    /// ITSF version, 2 or 3.
    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Directory page length.
    pub fn page_len(mut self, len: usize) -> Self {
        self.page_len = len;
        self
    }

    /// Emit a PMGI root even when a single leaf would do.
    pub fn force_index(mut self) -> Self {
        self.force_index = true;
        self
    }

    /// Unused bytes between the directory and the content section
    /// (version 3 only).
    pub fn data_gap(mut self, gap: usize) -> Self {
        self.data_gap = gap;
        self
    }

    /// Compressed blocks between LZX resets.
    pub fn blocks_per_reset(mut self, blocks: usize) -> Self {
        assert!(blocks > 0 && blocks * BLOCK_LEN <= WINDOW_SIZE);
        self.blocks_per_reset = blocks;
        self
    }

    /// Replace the generated LZXC control data.
    pub fn control_data(mut self, data: &[u8]) -> Self {
        self.control_data = Some(data.to_vec());
        self
    }

    /// Leave out the reset table, content, and control data entries.
    pub fn without_section(mut self) -> Self {
        self.with_section = false;
        self
    }

    /// An entry stored in the uncompressed section.
    pub fn raw(mut self, path: &str, data: &[u8]) -> Self {
        self.bodies.push((path.to_string(), Body::Raw(data.to_vec())));
        self
    }

    /// An entry stored in the compressed section.
    pub fn compressed(mut self, path: &str, data: &[u8]) -> Self {
        self.bodies
            .push((path.to_string(), Body::Compressed(data.to_vec())));
        self
    }

    /// A zero-length directory entry.
    pub fn dir(mut self, path: &str) -> Self {
        self.bodies.push((path.to_string(), Body::Dir));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut entries = Vec::new();
        let mut section0 = Vec::new();
        let mut content = Vec::new();

        for (path, body) in &self.bodies {
            let (space, start, length) = match body {
                Body::Raw(data) => {
                    let start = section0.len() as u64;
                    section0.extend_from_slice(data);
                    (0, start, data.len() as u64)
                }
                Body::Compressed(data) => {
                    let start = content.len() as u64;
                    content.extend_from_slice(data);
                    (1, start, data.len() as u64)
                }
                Body::Dir => (0, 0, 0),
            };
            entries.push(Entry {
                path: path.clone(),
                space,
                start,
                length,
            });
        }

        if self.with_section {
            let padded = content.len().div_ceil(BLOCK_LEN).max(1) * BLOCK_LEN;
            content.resize(padded, 0);
            let (stream, offsets) = compress(&content, self.blocks_per_reset);

            let control = self
                .control_data
                .clone()
                .unwrap_or_else(|| control_data(self.blocks_per_reset));
            let reset_table = reset_table(&offsets, content.len(), stream.len());
            let span_info = (content.len() as u64).to_le_bytes().to_vec();

            for (path, data) in [
                (CONTROL_DATA_PATH, control),
                (RESET_TABLE_PATH, reset_table),
                (SPAN_INFO_PATH, span_info),
                (CONTENT_PATH, stream),
            ] {
                entries.push(Entry {
                    path: path.to_string(),
                    space: 0,
                    start: section0.len() as u64,
                    length: data.len() as u64,
                });
                section0.extend(data);
            }
        }

        entries.sort_by_key(|entry| entry.path.to_ascii_lowercase());
        let directory = Directory::layout(&entries, self.page_len, self.force_index);

        let itsf_len = if self.version == 3 { 0x60 } else { 0x58 };
        let dir_offset = itsf_len as u64;
        let dir_len = (ITSP_LEN + directory.pages.len() * self.page_len) as u64;
        let gap = if self.version == 3 { self.data_gap } else { 0 };
        let data_offset = dir_offset + dir_len + gap as u64;

        let mut out = Vec::new();
        out.extend_from_slice(b"ITSF");
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(itsf_len as i32).to_le_bytes());
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&0x6502_1a9bu32.to_le_bytes());
        out.extend_from_slice(&0x0409u32.to_le_bytes());
        out.extend_from_slice(&[0x10; 16]);
        out.extend_from_slice(&[0x11; 16]);
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&dir_offset.to_le_bytes());
        out.extend_from_slice(&dir_len.to_le_bytes());
        if self.version == 3 {
            out.extend_from_slice(&data_offset.to_le_bytes());
        }
        assert_eq!(out.len(), itsf_len);

        out.extend_from_slice(b"ITSP");
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&(ITSP_LEN as i32).to_le_bytes());
        out.extend_from_slice(&0x0ai32.to_le_bytes());
        out.extend_from_slice(&(self.page_len as u32).to_le_bytes());
        out.extend_from_slice(&2i32.to_le_bytes());
        out.extend_from_slice(&directory.depth.to_le_bytes());
        out.extend_from_slice(&directory.root.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&(-1i32).to_le_bytes());
        out.extend_from_slice(&(directory.pages.len() as u32).to_le_bytes());
        out.extend_from_slice(&(-1i32).to_le_bytes());
        out.extend_from_slice(&0x0409u32.to_le_bytes());
        out.extend_from_slice(&[0x12; 16]);
        out.extend_from_slice(&[0x13; 16]);
        assert_eq!(out.len(), itsf_len + ITSP_LEN);

        for page in &directory.pages {
            out.extend_from_slice(page);
        }
        out.resize(out.len() + gap, 0xEE);
        assert_eq!(out.len() as u64, data_offset);

        out.extend(section0);
        out
    }

    /// Build and open from memory.
    pub fn open(&self) -> ChmFile<std::io::Cursor<Vec<u8>>> {
        ChmFile::from_reader(std::io::Cursor::new(self.build())).unwrap()
    }
}

struct Directory {
    pages: Vec<Vec<u8>>,
    root: i32,
    depth: i32,
}

impl Directory {
    fn layout(entries: &[Entry], page_len: usize, force_index: bool) -> Self {
        let mut leaves: Vec<(String, Vec<u8>)> = Vec::new();
        for entry in entries {
            let mut bytes = encode_cword(entry.path.len() as u64);
            bytes.extend_from_slice(entry.path.as_bytes());
            bytes.extend(encode_cword(entry.space));
            bytes.extend(encode_cword(entry.start));
            bytes.extend(encode_cword(entry.length));
            assert!(PMGL_LEN + bytes.len() <= page_len, "entry too long for page");

            let fits = leaves
                .last()
                .is_some_and(|(_, body)| PMGL_LEN + body.len() + bytes.len() <= page_len);
            if fits {
                leaves.last_mut().unwrap().1.extend(bytes);
            } else {
                leaves.push((entry.path.clone(), bytes));
            }
        }
        if leaves.is_empty() {
            leaves.push((String::new(), Vec::new()));
        }

        let count = leaves.len();
        let mut pages = Vec::new();
        let mut level = Vec::new();
        for (i, (first, body)) in leaves.into_iter().enumerate() {
            let prev = if i == 0 { -1 } else { i as i32 - 1 };
            let next = if i + 1 == count { -1 } else { i as i32 + 1 };
            let mut page = b"PMGL".to_vec();
            page.extend_from_slice(&((page_len - PMGL_LEN - body.len()) as u32).to_le_bytes());
            page.extend_from_slice(&0u32.to_le_bytes());
            page.extend_from_slice(&prev.to_le_bytes());
            page.extend_from_slice(&next.to_le_bytes());
            page.extend(body);
            page.resize(page_len, 0);
            pages.push(page);
            level.push((first, i));
        }

        let mut root = -1;
        let mut depth = 1;
        if force_index || level.len() > 1 {
            loop {
                let mut next_level = Vec::new();
                let mut body: Vec<u8> = Vec::new();
                let mut first: Option<String> = None;
                let mut flush = |first: &mut Option<String>, body: &mut Vec<u8>| {
                    let mut page = b"PMGI".to_vec();
                    page.extend_from_slice(
                        &((page_len - PMGI_LEN - body.len()) as u32).to_le_bytes(),
                    );
                    page.append(body);
                    page.resize(page_len, 0);
                    next_level.push((first.take().unwrap_or_default(), pages.len()));
                    pages.push(page);
                };

                for (key, child) in &level {
                    let mut bytes = encode_cword(key.len() as u64);
                    bytes.extend_from_slice(key.as_bytes());
                    bytes.extend(encode_cword(*child as u64));
                    assert!(PMGI_LEN + bytes.len() <= page_len, "key too long for page");

                    if PMGI_LEN + body.len() + bytes.len() > page_len {
                        flush(&mut first, &mut body);
                    }
                    if first.is_none() {
                        first = Some(key.clone());
                    }
                    body.extend(bytes);
                }
                flush(&mut first, &mut body);

                depth += 1;
                assert!(next_level.len() < level.len() || level.len() == 1);
                if next_level.len() == 1 {
                    root = next_level[0].1 as i32;
                    break;
                }
                level = next_level;
            }
        }

        Self { pages, root, depth }
    }
}

fn control_data(blocks_per_reset: usize) -> Vec<u8> {
    let half_window = (WINDOW_SIZE / 2) as u32;
    let interval = blocks_per_reset as u32 * half_window;
    // Version 2 counts in 0x8000 byte units.
    let (version, interval, window) = if interval % 0x8000 == 0 {
        (2u32, interval / 0x8000, WINDOW_SIZE as u32 / 0x8000)
    } else {
        (1u32, interval, WINDOW_SIZE as u32)
    };

    let mut data = 6u32.to_le_bytes().to_vec();
    data.extend_from_slice(b"LZXC");
    data.extend_from_slice(&version.to_le_bytes());
    data.extend_from_slice(&interval.to_le_bytes());
    data.extend_from_slice(&window.to_le_bytes());
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data
}

fn reset_table(offsets: &[u64], uncompressed_len: usize, compressed_len: usize) -> Vec<u8> {
    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&(offsets.len() as u32).to_le_bytes());
    data.extend_from_slice(&8u32.to_le_bytes());
    data.extend_from_slice(&0x28u32.to_le_bytes());
    data.extend_from_slice(&(uncompressed_len as u64).to_le_bytes());
    data.extend_from_slice(&(compressed_len as u64).to_le_bytes());
    data.extend_from_slice(&(BLOCK_LEN as u64).to_le_bytes());
    for offset in offsets {
        data.extend_from_slice(&offset.to_le_bytes());
    }
    data
}

/// Compress `content` (a whole number of blocks) into one LZX frame per
/// block. Returns the stream and the offset of every frame.
fn compress(content: &[u8], blocks_per_reset: usize) -> (Vec<u8>, Vec<u64>) {
    let mut writer = LzxWriter::new(WINDOW_BITS);
    let mut stream = Vec::new();
    let mut offsets = Vec::new();

    for index in 0..content.len() / BLOCK_LEN {
        if index % blocks_per_reset == 0 {
            writer.reset();
        }
        let group_start = (index - index % blocks_per_reset) * BLOCK_LEN;
        let start = index * BLOCK_LEN;
        let tokens = tokenize(content, group_start, start, start + BLOCK_LEN);
        writer.compressed(Kind::Verbatim, &tokens);

        offsets.push(stream.len() as u64);
        stream.extend(writer.take_frame());
    }
    (stream, offsets)
}

/// Greedy matcher over `data[start..end]` that may refer back as far as
/// `history`.
fn tokenize(data: &[u8], history: usize, start: usize, end: usize) -> Vec<Token> {
    let mut last: HashMap<[u8; 3], usize> = HashMap::new();
    let key = |pos: usize| [data[pos], data[pos + 1], data[pos + 2]];
    for pos in history..start {
        last.insert(key(pos), pos);
    }

    let mut tokens = Vec::new();
    let mut pos = start;
    while pos < end {
        let candidate = (pos + MIN_TOKEN_MATCH <= end)
            .then(|| last.get(&key(pos)).copied())
            .flatten()
            .filter(|&c| pos - c <= MAX_DISTANCE);

        let length = candidate.map_or(0, |c| {
            let limit = (end - pos).min(MAX_MATCH);
            (0..limit).take_while(|&i| data[c + i] == data[pos + i]).count()
        });

        if let (Some(c), true) = (candidate, length >= MIN_TOKEN_MATCH) {
            tokens.push(Token::Match {
                distance: (pos - c) as u32,
                length,
            });
            for p in pos..pos + length {
                if p + MIN_TOKEN_MATCH <= end {
                    last.insert(key(p), p);
                }
            }
            pos += length;
        } else {
            tokens.push(Token::Literal(data[pos]));
            if pos + MIN_TOKEN_MATCH <= end {
                last.insert(key(pos), pos);
            }
            pos += 1;
        }
    }
    tokens
}

/// HTML-ish text with plenty of repetition.
pub fn page_text(len: usize, seed: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 64);
    let mut i = 0u64;
    while out.len() < len {
        out.extend_from_slice(
            format!("<p id=\"s{seed}-{i}\">Section {i} of topic {seed}.</p>\n").as_bytes(),
        );
        i += 1;
    }
    out.truncate(len);
    out
}

/// Pseudo-random bytes that defeat the matcher.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    oxichm_test_utils::noise(len, seed)
}

/// A `#SYSTEM` unit body.
pub fn system_unit(version: i32, records: &[(u16, &[u8])]) -> Vec<u8> {
    let mut data = version.to_le_bytes().to_vec();
    for (code, body) in records {
        data.extend_from_slice(&code.to_le_bytes());
        data.extend_from_slice(&(body.len() as u16).to_le_bytes());
        data.extend_from_slice(body);
    }
    data
}

/// Write an archive to a temporary file.
pub fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
