//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxichm::{ChmError, EnumerateFlags, StorageSpace, UnitInfo};
use std::path::{Component, Path, PathBuf};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb
}

/// Check if an entry path matches the filter patterns.
///
/// Patterns are matched against the path without its leading `/`.
/// - If include patterns are specified, the path must match at least one
/// - If exclude patterns are specified, the path must not match any
pub fn matches_filters(path: &str, include: &[String], exclude: &[String]) -> bool {
    let name = path.trim_start_matches('/');
    let matches = |pattern: &String| {
        Pattern::new(pattern)
            .map(|pattern| pattern.matches(name))
            .unwrap_or(false)
    };

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Filter units based on include/exclude patterns.
pub fn filter_units(units: Vec<UnitInfo>, include: &[String], exclude: &[String]) -> Vec<UnitInfo> {
    if include.is_empty() && exclude.is_empty() {
        return units;
    }

    units
        .into_iter()
        .filter(|unit| matches_filters(&unit.path, include, exclude))
        .collect()
}

/// Short name of a storage space.
pub fn space_name(space: StorageSpace) -> String {
    match space {
        StorageSpace::Uncompressed => "stored".to_string(),
        StorageSpace::Compressed => "lzx".to_string(),
        StorageSpace::Other(n) => format!("space{}", n),
    }
}

/// Short name of an entry's kind.
pub fn kind_name(flags: EnumerateFlags) -> &'static str {
    if flags.contains(EnumerateFlags::META) {
        "meta"
    } else if flags.contains(EnumerateFlags::SPECIAL) {
        "special"
    } else {
        "normal"
    }
}

/// Print units in a formatted table.
pub fn print_units(units: &[UnitInfo], long: bool) {
    if long {
        println!("{:>10} {:>7} {:>10}  Path", "Length", "Section", "Offset");
        println!("{}", "-".repeat(60));

        let mut total = 0u64;
        for unit in units {
            println!(
                "{:>10} {:>7} {:>10}  {}",
                unit.length,
                space_name(unit.space),
                unit.start,
                unit.path
            );
            total += unit.length;
        }

        println!("{}", "-".repeat(60));
        println!("{:>10}                     {} entries", total, units.len());
    } else {
        for unit in units {
            println!("{}", unit.path);
        }
    }
}

/// Where `path` lands below `root`.
///
/// The leading `/` is dropped; `..`, absolute, and drive-prefixed
/// components are rejected.
pub fn output_path(root: &Path, path: &str) -> Result<PathBuf, ChmError> {
    let relative = Path::new(path.trim_start_matches('/'));
    let mut out = root.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ChmError::path_traversal(path));
            }
        }
    }
    Ok(out)
}

/// Default extraction directory: the archive path without its extension.
pub fn default_output_dir(archive: &Path) -> PathBuf {
    let stem = archive.with_extension("");
    if stem == archive {
        let mut name = archive.as_os_str().to_os_string();
        name.push(".d");
        PathBuf::from(name)
    } else {
        stem
    }
}
