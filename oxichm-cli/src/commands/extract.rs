//! Extract command implementation.

use crate::utils::{create_progress_bar, default_output_dir, filter_units, output_path};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use oxichm::{ChmError, ChmFile, EnumerateFlags, UnitInfo};
use rayon::prelude::*;
use std::fs;
use std::io::{Read, Seek};
use std::path::Path;

/// Options for extracting CHM contents.
pub struct ExtractOptions<'a> {
    pub output: Option<&'a Path>,
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub progress: bool,
    pub cache_blocks: usize,
}

/// Outcome of an extraction run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub bytes: u64,
    pub failed: usize,
}

pub fn cmd_extract(
    archive: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let chm = ChmFile::open(archive)?;
    chm.set_cache_size(options.cache_blocks);
    if !chm.is_compression_enabled() {
        warn!("compressed entries cannot be read from {}", archive.display());
    }

    let root = options
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_dir(archive));
    let units = filter_units(
        chm.entries(EnumerateFlags::NORMAL | EnumerateFlags::FILES)?,
        options.include,
        options.exclude,
    );

    fs::create_dir_all(&root)?;
    info!("extracting {} files to {}", units.len(), root.display());

    let pb = create_progress_bar(units.len() as u64, options.progress);
    let summary = extract_units(&chm, &units, &root, &pb);
    pb.finish_and_clear();

    println!(
        "Extracted {} files ({} bytes) to {}",
        summary.files,
        summary.bytes,
        root.display()
    );
    if summary.failed > 0 {
        return Err(format!("{} of {} files failed", summary.failed, units.len()).into());
    }
    Ok(())
}

/// Extract `units` below `root` in parallel over one shared handle.
///
/// A failing entry is logged and skipped.
pub fn extract_units<R>(
    chm: &ChmFile<R>,
    units: &[UnitInfo],
    root: &Path,
    pb: &ProgressBar,
) -> ExtractSummary
where
    R: Read + Seek + Send,
{
    units
        .par_iter()
        .map(|unit| {
            let result = extract_unit(chm, unit, root);
            pb.inc(1);
            match result {
                Ok(bytes) => {
                    debug!("{}: {} bytes", unit.path, bytes);
                    ExtractSummary {
                        files: 1,
                        bytes,
                        failed: 0,
                    }
                }
                Err(e) => {
                    warn!("{}: {}", unit.path, e);
                    ExtractSummary {
                        failed: 1,
                        ..ExtractSummary::default()
                    }
                }
            }
        })
        .reduce(ExtractSummary::default, |a, b| ExtractSummary {
            files: a.files + b.files,
            bytes: a.bytes + b.bytes,
            failed: a.failed + b.failed,
        })
}

fn extract_unit<R: Read + Seek>(
    chm: &ChmFile<R>,
    unit: &UnitInfo,
    root: &Path,
) -> Result<u64, ChmError> {
    let path = output_path(root, &unit.path)?;
    let data = chm.read_unit(unit)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &data)?;
    Ok(data.len() as u64)
}
