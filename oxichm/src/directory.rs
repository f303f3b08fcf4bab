//! PMGI/PMGL directory navigation.
//!
//! The directory is a sequence of fixed-length pages following the ITSP
//! header. Leaf pages (PMGL) hold entries and are chained through
//! `block_next`; index pages (PMGI) map the first key of each child page to
//! its page number. Pages are read on demand and never cached.

use crate::header::{
    ItspHeader, PMGI_LEN, PMGI_MAGIC, PMGL_LEN, PMGL_MAGIC, PmgiHeader, PmglEntry, PmglHeader,
    read_entry_path,
};
use crate::storage::SharedReader;
use crate::unit::{EnumerateFlags, EnumerateStatus, StorageSpace, UnitInfo};
use log::trace;
use oxichm_core::{ChmError, Cursor, Result};
use std::cmp::Ordering;
use std::io::{Read, Seek};

/// Location and shape of the directory page tree.
#[derive(Debug, Clone)]
pub(crate) struct Directory {
    /// Offset of page 0.
    pub(crate) dir_offset: u64,
    /// Length of the page area.
    pub(crate) dir_len: u64,
    /// Length of every page.
    pub(crate) block_len: u32,
    /// Page where lookups start.
    pub(crate) index_root: i32,
    /// First leaf page.
    pub(crate) index_head: i32,
    /// Upper bound on pages visited by one walk.
    page_limit: u64,
}

impl Directory {
    /// Describe the directory from its (already adjusted) location and ITSP.
    pub(crate) fn new(dir_offset: u64, dir_len: u64, itsp: &ItspHeader) -> Result<Self> {
        if (itsp.block_len as usize) < PMGL_LEN {
            return Err(ChmError::malformed(
                "ITSP",
                format!("directory page length {} too small", itsp.block_len),
            ));
        }

        let index_root = if itsp.index_root <= -1 {
            itsp.index_head
        } else {
            itsp.index_root
        };
        let page_limit = (dir_len / u64::from(itsp.block_len))
            .max(u64::from(itsp.num_blocks))
            .max(1);

        Ok(Self {
            dir_offset,
            dir_len,
            block_len: itsp.block_len,
            index_root,
            index_head: itsp.index_head,
            page_limit,
        })
    }

    fn fetch_page<R: Read + Seek>(
        &self,
        reader: &SharedReader<R>,
        page: i32,
        buf: &mut [u8],
    ) -> Result<()> {
        let index = u64::try_from(page)
            .map_err(|_| ChmError::corrupt_directory(format!("invalid page number {page}")))?;
        let offset = self
            .dir_offset
            .saturating_add(index.saturating_mul(u64::from(self.block_len)));

        let read = reader.fetch(offset, buf)?;
        if read != buf.len() {
            return Err(ChmError::corrupt_directory(format!(
                "page {page} truncated: {read} of {} bytes",
                buf.len()
            )));
        }
        Ok(())
    }

    /// Look up `path`, comparing ASCII case-insensitively.
    pub(crate) fn resolve<R: Read + Seek>(
        &self,
        reader: &SharedReader<R>,
        path: &str,
    ) -> Result<UnitInfo> {
        let mut page_buf = vec![0u8; self.block_len as usize];
        let mut page = self.index_root;
        let mut visited = 0u64;

        while page != -1 {
            visited += 1;
            if visited > self.page_limit {
                return Err(ChmError::corrupt_directory(
                    "index descent visits more pages than the directory holds",
                ));
            }
            self.fetch_page(reader, page, &mut page_buf)?;

            if page_buf.starts_with(&PMGL_MAGIC) {
                return find_in_leaf(&page_buf, path)?.ok_or_else(|| ChmError::not_found(path));
            } else if page_buf.starts_with(&PMGI_MAGIC) {
                let child = find_in_index(&page_buf, path)?;
                trace!("{path}: index page {page} -> {child}");
                page = child;
            } else {
                return Err(ChmError::corrupt_directory(format!(
                    "page {page} is neither PMGL nor PMGI"
                )));
            }
        }

        Err(ChmError::not_found(path))
    }

    /// Walk every leaf from the head page, calling `visitor` for entries
    /// that pass `filter`.
    pub(crate) fn enumerate<R, F>(
        &self,
        reader: &SharedReader<R>,
        filter: EnumerateFlags,
        mut visitor: F,
    ) -> Result<()>
    where
        R: Read + Seek,
        F: FnMut(&UnitInfo) -> EnumerateStatus,
    {
        let mut page_buf = vec![0u8; self.block_len as usize];
        let mut page = self.index_head;
        let mut visited = 0u64;

        while page != -1 {
            visited += 1;
            if visited > self.page_limit {
                return Err(ChmError::corrupt_directory(
                    "leaf chain is longer than the directory",
                ));
            }
            self.fetch_page(reader, page, &mut page_buf)?;

            let (header, mut cursor) = leaf_body(&page_buf)?;
            while !cursor.is_empty() {
                let unit = parse_unit(&mut cursor)?;
                if !filter.matches(unit.flags) {
                    continue;
                }
                match visitor(&unit) {
                    EnumerateStatus::Continue => {}
                    EnumerateStatus::Stop => return Ok(()),
                    EnumerateStatus::Abort => {
                        return Err(ChmError::EnumerationAborted { path: unit.path });
                    }
                }
            }

            page = header.block_next;
        }

        Ok(())
    }
}

/// End of the used area of a page.
fn page_end(page: &[u8], free_space: u32) -> Result<usize> {
    page.len()
        .checked_sub(free_space as usize)
        .ok_or_else(|| {
            ChmError::corrupt_directory(format!(
                "free space {free_space} exceeds page length {}",
                page.len()
            ))
        })
}

/// Header of a leaf page and a cursor over its entries.
fn leaf_body(page: &[u8]) -> Result<(PmglHeader, Cursor<'_>)> {
    let header = PmglHeader::parse(&page[..PMGL_LEN])?;
    let end = page_end(page, header.free_space)?;
    Ok((header, Cursor::at(&page[..end], PMGL_LEN)))
}

/// Entries are bounded by the page; running off it means corruption.
fn within_page(err: ChmError) -> ChmError {
    match err {
        ChmError::TruncatedInput { .. } => {
            ChmError::corrupt_directory("entry runs past the end of its page")
        }
        other => other,
    }
}

fn parse_unit(cursor: &mut Cursor<'_>) -> Result<UnitInfo> {
    let entry = PmglEntry::parse(cursor).map_err(within_page)?;
    Ok(UnitInfo::new(
        entry.path,
        StorageSpace::from_raw(entry.space),
        entry.start,
        entry.length,
    ))
}

fn find_in_leaf(page: &[u8], path: &str) -> Result<Option<UnitInfo>> {
    let (_, mut cursor) = leaf_body(page)?;
    while !cursor.is_empty() {
        let name = read_entry_path(&mut cursor).map_err(within_page)?;
        if name.eq_ignore_ascii_case(path) {
            let space = cursor.read_cword().map_err(within_page)?;
            let start = cursor.read_cword().map_err(within_page)?;
            let length = cursor.read_cword().map_err(within_page)?;
            return Ok(Some(UnitInfo::new(
                name,
                StorageSpace::from_raw(space),
                start,
                length,
            )));
        }
        PmglEntry::skip_entry_data(&mut cursor).map_err(within_page)?;
    }
    Ok(None)
}

/// Child page of the last index key not greater than `path`, or -1.
fn find_in_index(page: &[u8], path: &str) -> Result<i32> {
    let header = PmgiHeader::parse(&page[..PMGI_LEN])?;
    let end = page_end(page, header.free_space)?;
    let mut cursor = Cursor::at(&page[..end], PMGI_LEN);

    let mut child = -1;
    while !cursor.is_empty() {
        let key = read_entry_path(&mut cursor).map_err(within_page)?;
        if compare_ignore_ascii_case(&key, path) == Ordering::Greater {
            break;
        }
        let value = cursor.read_cword().map_err(within_page)?;
        child = i32::try_from(value).map_err(|_| {
            ChmError::corrupt_directory(format!("child page {value} out of range"))
        })?;
    }
    Ok(child)
}

fn compare_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxichm_core::encode_cword;

    const PAGE: usize = 256;

    fn entry(path: &str, space: u64, start: u64, length: u64) -> Vec<u8> {
        let mut buf = encode_cword(path.len() as u64);
        buf.extend_from_slice(path.as_bytes());
        buf.extend(encode_cword(space));
        buf.extend(encode_cword(start));
        buf.extend(encode_cword(length));
        buf
    }

    fn leaf(entries: &[Vec<u8>], next: i32) -> Vec<u8> {
        let body: Vec<u8> = entries.concat();
        let mut page = b"PMGL".to_vec();
        page.extend_from_slice(&((PAGE - PMGL_LEN - body.len()) as u32).to_le_bytes());
        page.extend_from_slice(&0u32.to_le_bytes());
        page.extend_from_slice(&(-1i32).to_le_bytes());
        page.extend_from_slice(&next.to_le_bytes());
        page.extend(body);
        page.resize(PAGE, 0);
        page
    }

    fn index(keys: &[(&str, u64)]) -> Vec<u8> {
        let mut body = Vec::new();
        for &(key, child) in keys {
            body.extend(encode_cword(key.len() as u64));
            body.extend_from_slice(key.as_bytes());
            body.extend(encode_cword(child));
        }
        let mut page = b"PMGI".to_vec();
        page.extend_from_slice(&((PAGE - PMGI_LEN - body.len()) as u32).to_le_bytes());
        page.extend(body);
        page.resize(PAGE, 0);
        page
    }

    #[test]
    fn test_find_in_leaf_case_insensitive() {
        let page = leaf(
            &[
                entry("/a.htm", 0, 10, 20),
                entry("/Index.HTML", 1, 300, 4000),
            ],
            -1,
        );
        let unit = find_in_leaf(&page, "/index.html").unwrap().unwrap();
        assert_eq!(unit.path, "/Index.HTML");
        assert_eq!(unit.space, StorageSpace::Compressed);
        assert_eq!(unit.start, 300);
        assert_eq!(unit.length, 4000);

        assert!(find_in_leaf(&page, "/missing").unwrap().is_none());
    }

    #[test]
    fn test_find_in_index_last_key_not_greater() {
        let page = index(&[("/a", 0), ("/m", 1), ("/t", 2)]);
        assert_eq!(find_in_index(&page, "/a").unwrap(), 0);
        assert_eq!(find_in_index(&page, "/b.htm").unwrap(), 0);
        assert_eq!(find_in_index(&page, "/M").unwrap(), 1);
        assert_eq!(find_in_index(&page, "/zzz").unwrap(), 2);
        // Before the first key.
        assert_eq!(find_in_index(&page, "/").unwrap(), -1);
    }

    #[test]
    fn test_free_space_overflow() {
        let mut page = leaf(&[], -1);
        page[4..8].copy_from_slice(&(PAGE as u32 + 1).to_le_bytes());
        assert!(matches!(
            find_in_leaf(&page, "/x"),
            Err(ChmError::CorruptDirectory { .. })
        ));
    }

    #[test]
    fn test_entry_past_page_end() {
        let mut page = leaf(&[entry("/abc", 0, 0, 0)], -1);
        // Claim the entry area ends in the middle of the path.
        let free = (PAGE - PMGL_LEN - 3) as u32;
        page[4..8].copy_from_slice(&free.to_le_bytes());
        assert!(matches!(
            find_in_leaf(&page, "/abc"),
            Err(ChmError::CorruptDirectory { .. })
        ));
    }

    #[test]
    fn test_compare_ignore_ascii_case() {
        assert_eq!(compare_ignore_ascii_case("/ABC", "/abc"), Ordering::Equal);
        assert_eq!(compare_ignore_ascii_case("/a", "/B"), Ordering::Less);
        assert_eq!(compare_ignore_ascii_case("/b/", "/b"), Ordering::Greater);
    }
}
