//! Directory entry descriptors and enumeration filters.

use bitflags::bitflags;

/// Storage space an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSpace {
    /// Section 0: stored bytes following the directory.
    Uncompressed,
    /// Section 1: the LZX-compressed content stream.
    Compressed,
    /// Any other section number.
    Other(u64),
}

impl StorageSpace {
    /// Map a raw section number.
    pub fn from_raw(value: u64) -> Self {
        match value {
            0 => StorageSpace::Uncompressed,
            1 => StorageSpace::Compressed,
            other => StorageSpace::Other(other),
        }
    }

    /// Raw section number.
    pub fn as_raw(self) -> u64 {
        match self {
            StorageSpace::Uncompressed => 0,
            StorageSpace::Compressed => 1,
            StorageSpace::Other(value) => value,
        }
    }
}

bitflags! {
    /// Entry classification used to filter enumeration.
    ///
    /// The low three bits select entry kinds; the remaining bits, when any
    /// are set, additionally select files or directories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnumerateFlags: u32 {
        /// Ordinary content (`/page.htm`).
        const NORMAL = 1;
        /// Entries outside the `/` tree (`::DataSpace/...`).
        const META = 2;
        /// System entries (`/#SYSTEM`, `/$FIftiMain`).
        const SPECIAL = 4;
        /// Paths not ending in `/`.
        const FILES = 8;
        /// Paths ending in `/`.
        const DIRS = 16;
        /// Everything.
        const ALL = Self::NORMAL.bits()
            | Self::META.bits()
            | Self::SPECIAL.bits()
            | Self::FILES.bits()
            | Self::DIRS.bits();
    }
}

impl EnumerateFlags {
    const TYPE_MASK: u32 = 0x07;
    const FILTER_MASK: u32 = 0xF8;

    /// Classify an entry path.
    pub fn classify(path: &str) -> Self {
        let mut flags = if path.ends_with('/') {
            EnumerateFlags::DIRS
        } else {
            EnumerateFlags::FILES
        };

        if let Some(rest) = path.strip_prefix('/') {
            if rest.starts_with('#') || rest.starts_with('$') {
                flags |= EnumerateFlags::SPECIAL;
            } else {
                flags |= EnumerateFlags::NORMAL;
            }
        } else {
            flags |= EnumerateFlags::META;
        }
        flags
    }

    /// Whether an entry classified as `entry` passes this filter.
    pub fn matches(self, entry: EnumerateFlags) -> bool {
        let type_bits = self.bits() & Self::TYPE_MASK;
        let filter_bits = self.bits() & Self::FILTER_MASK;
        if type_bits & entry.bits() == 0 {
            return false;
        }
        filter_bits == 0 || filter_bits & entry.bits() != 0
    }
}

/// What an enumeration visitor wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerateStatus {
    /// Visit the next entry.
    Continue,
    /// Stop successfully.
    Stop,
    /// Stop with [`oxichm_core::ChmError::EnumerationAborted`].
    Abort,
}

/// A resolved directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    /// Entry path
    pub path: String,
    /// Storage space
    pub space: StorageSpace,
    /// Offset within the storage space
    pub start: u64,
    /// Length in bytes
    pub length: u64,
    /// Classification of the path
    pub flags: EnumerateFlags,
}

impl UnitInfo {
    /// Build a unit, classifying its path.
    pub fn new(path: String, space: StorageSpace, start: u64, length: u64) -> Self {
        let flags = EnumerateFlags::classify(&path);
        Self {
            path,
            space,
            start,
            length,
            flags,
        }
    }

    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.flags.contains(EnumerateFlags::DIRS)
    }

    /// Whether this entry is stored in the compressed section.
    pub fn is_compressed(&self) -> bool {
        self.space == StorageSpace::Compressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            EnumerateFlags::classify("/index.html"),
            EnumerateFlags::NORMAL | EnumerateFlags::FILES
        );
        assert_eq!(
            EnumerateFlags::classify("/images/"),
            EnumerateFlags::NORMAL | EnumerateFlags::DIRS
        );
        assert_eq!(
            EnumerateFlags::classify("/#SYSTEM"),
            EnumerateFlags::SPECIAL | EnumerateFlags::FILES
        );
        assert_eq!(
            EnumerateFlags::classify("/$WWKeywordLinks/"),
            EnumerateFlags::SPECIAL | EnumerateFlags::DIRS
        );
        assert_eq!(
            EnumerateFlags::classify("::DataSpace/NameList"),
            EnumerateFlags::META | EnumerateFlags::FILES
        );
        assert_eq!(
            EnumerateFlags::classify("/"),
            EnumerateFlags::NORMAL | EnumerateFlags::DIRS
        );
    }

    #[test]
    fn test_all_is_31() {
        assert_eq!(EnumerateFlags::ALL.bits(), 31);
    }

    #[test]
    fn test_matches_type_bits() {
        let page = EnumerateFlags::classify("/a.htm");
        let meta = EnumerateFlags::classify("::DataSpace/x");

        assert!(EnumerateFlags::NORMAL.matches(page));
        assert!(!EnumerateFlags::NORMAL.matches(meta));
        assert!(EnumerateFlags::ALL.matches(meta));
        // File/dir bits alone select no entry kind.
        assert!(!EnumerateFlags::FILES.matches(page));
    }

    #[test]
    fn test_matches_filter_bits() {
        let file = EnumerateFlags::classify("/a.htm");
        let dir = EnumerateFlags::classify("/a/");

        let files_only = EnumerateFlags::NORMAL | EnumerateFlags::FILES;
        assert!(files_only.matches(file));
        assert!(!files_only.matches(dir));

        let dirs_only = EnumerateFlags::NORMAL | EnumerateFlags::DIRS;
        assert!(dirs_only.matches(dir));
        assert!(!dirs_only.matches(file));
    }

    #[test]
    fn test_storage_space() {
        assert_eq!(StorageSpace::from_raw(0), StorageSpace::Uncompressed);
        assert_eq!(StorageSpace::from_raw(1), StorageSpace::Compressed);
        assert_eq!(StorageSpace::from_raw(7), StorageSpace::Other(7));
        assert_eq!(StorageSpace::Other(7).as_raw(), 7);
    }

    #[test]
    fn test_unit_info() {
        let unit = UnitInfo::new("/dir/".to_string(), StorageSpace::Uncompressed, 0, 0);
        assert!(unit.is_dir());
        assert!(!unit.is_compressed());
    }
}
