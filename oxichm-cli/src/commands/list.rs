//! List command implementation.

use crate::utils::{filter_units, kind_name, print_units, space_name};
use oxichm::{ChmFile, EnumerateFlags, UnitInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON serializable entry data for CHM listings.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    path: String,
    kind: String,
    section: String,
    offset: u64,
    length: u64,
    is_dir: bool,
}

impl EntryJson {
    fn from_unit(unit: &UnitInfo) -> Self {
        Self {
            path: unit.path.clone(),
            kind: kind_name(unit.flags).to_string(),
            section: space_name(unit.space),
            offset: unit.start,
            length: unit.length,
            is_dir: unit.is_dir(),
        }
    }
}

/// JSON output for CHM listing.
#[derive(Debug, Serialize, Deserialize)]
struct ListJson {
    archive: String,
    compressed_section: bool,
    entries: Vec<EntryJson>,
}

/// Options for listing CHM contents.
pub struct ListOptions<'a> {
    pub all: bool,
    pub long: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let chm = ChmFile::open(archive)?;

    let filter = if options.all {
        EnumerateFlags::ALL
    } else {
        EnumerateFlags::NORMAL
    };
    let units = filter_units(chm.entries(filter)?, options.include, options.exclude);

    if options.json {
        let listing = ListJson {
            archive: archive.display().to_string(),
            compressed_section: chm.is_compression_enabled(),
            entries: units.iter().map(EntryJson::from_unit).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {}", archive.display());
    println!();
    print_units(&units, options.long);

    Ok(())
}
