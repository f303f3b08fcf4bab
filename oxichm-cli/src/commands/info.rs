//! Info command implementation.

use oxichm::{ChmFile, EnumerateFlags, StorageSpace, SystemFile};
use std::path::Path;

pub fn cmd_info(archive: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let chm = ChmFile::open(archive)?;
    let metadata = std::fs::metadata(archive)?;
    let itsf = chm.itsf_header();
    let itsp = chm.itsp_header();

    println!("CHM Information");
    println!("===============");
    println!("File: {}", archive.display());
    println!("Size: {} bytes", metadata.len());
    println!("ITSF version: {}", itsf.version);
    println!("Language: {:#06x}", itsf.lang_id);

    println!();
    println!("Directory:");
    println!("  Offset: {:#x}", chm.dir_offset());
    println!("  Length: {} bytes", chm.dir_len());
    println!("  Page size: {} bytes", chm.page_len());
    println!("  Pages: {}", itsp.num_blocks);
    println!("  Index depth: {}", itsp.index_depth);
    println!("  Content offset: {:#x}", chm.data_offset());

    println!();
    match chm.compression() {
        Some(info) => {
            println!("Compressed section:");
            println!("  Window: {} bytes (2^{})", info.window_size(), info.window_bits());
            println!("  Reset interval: {} bytes", info.reset_interval());
            println!("  Blocks: {} of {} bytes", info.block_count(), info.block_len());
            println!("  Blocks per reset: {}", info.reset_blkcount);
            println!(
                "  Uncompressed length: {} bytes",
                info.reset_table.uncompressed_len
            );
            println!(
                "  Compressed length: {} bytes",
                info.reset_table.compressed_len
            );
        }
        None => println!("Compressed section: unavailable"),
    }

    let units = chm.entries(EnumerateFlags::ALL)?;
    let count = |flag: EnumerateFlags| units.iter().filter(|u| u.flags.contains(flag)).count();
    let normal_files = units
        .iter()
        .filter(|u| u.flags.contains(EnumerateFlags::NORMAL | EnumerateFlags::FILES));
    let total_size: u64 = normal_files.clone().map(|u| u.length).sum();
    let compressed_files = normal_files
        .filter(|u| u.space == StorageSpace::Compressed)
        .count();

    println!();
    println!("Contents:");
    println!(
        "  Files: {} ({} compressed)",
        count(EnumerateFlags::NORMAL) - count(EnumerateFlags::NORMAL | EnumerateFlags::DIRS),
        compressed_files
    );
    println!(
        "  Directories: {}",
        count(EnumerateFlags::NORMAL | EnumerateFlags::DIRS)
    );
    println!("  Special entries: {}", count(EnumerateFlags::SPECIAL));
    println!("  Metadata entries: {}", count(EnumerateFlags::META));
    println!("  Total size: {} bytes", total_size);

    match SystemFile::read(&chm) {
        Ok(system) => {
            println!();
            println!("Help file:");
            println!("  Compatibility: {:?}", system.compatibility());
            let fields = [
                ("Title", system.title()),
                ("Default topic", system.default_topic()),
                ("Contents", system.contents_file()),
                ("Index", system.index_file()),
                ("Generator", system.generator_version()),
            ];
            for (label, value) in fields {
                if let Some(value) = value.filter(|v| !v.is_empty()) {
                    println!("  {}: {}", label, value);
                }
            }
        }
        Err(e) => log::info!("no #SYSTEM metadata: {e}"),
    }

    Ok(())
}
