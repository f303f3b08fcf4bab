//! OxiCHM CLI - Compiled HTML Help reader
//!
//! Lists, inspects, and extracts the contents of `.chm` files.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{ExtractOptions, ListOptions, cmd_extract, cmd_info, cmd_list};
use oxichm::DEFAULT_CACHE_BLOCKS;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxichm")]
#[command(
    author,
    version,
    about = "Pure Rust reader for Microsoft Compiled HTML Help (CHM) files"
)]
#[command(long_about = "
OxiCHM reads ITSF/CHM help files, including their LZX-compressed section.

Examples:
  oxichm list manual.chm
  oxichm list --all --json manual.chm
  oxichm extract manual.chm
  oxichm extract manual.chm -o html -I '*.htm'
  oxichm info manual.chm
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries of a CHM file
    #[command(alias = "l")]
    List {
        /// CHM file to list
        archive: PathBuf,

        /// Include special and metadata entries
        #[arg(short, long)]
        all: bool,

        /// Show storage section, offset, and length
        #[arg(short, long)]
        long: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.htm, images/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract files from a CHM file
    #[command(alias = "x")]
    Extract {
        /// CHM file to extract
        archive: PathBuf,

        /// Output directory (defaults to the file name without extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include only files matching pattern (glob syntax: *.htm, images/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,

        /// Decompressed blocks to cache
        #[arg(long, default_value_t = DEFAULT_CACHE_BLOCKS)]
        cache_blocks: usize,
    },

    /// Show information about a CHM file
    #[command(alias = "i")]
    Info {
        /// CHM file to inspect
        archive: PathBuf,
    },
}

/// Log level selected by `-v`/`-q`; warnings by default.
fn log_level(verbose: u8, quiet: bool) -> log::LevelFilter {
    match (verbose, quiet) {
        (0, true) => log::LevelFilter::Error,
        (0, false) => log::LevelFilter::Warn,
        (1, _) => log::LevelFilter::Info,
        (2, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Logger filtered at the `-v`/`-q` level, with `env` directives on top.
fn logger(verbose: u8, quiet: bool, env: env_logger::Env<'_>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log_level(verbose, quiet))
        .parse_env(env);
    builder
}

fn init_logging(verbose: u8, quiet: bool) {
    logger(verbose, quiet, env_logger::Env::default()).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::List {
            archive,
            all,
            long,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                all,
                long,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            output,
            include,
            exclude,
            progress,
            cache_blocks,
        } => cmd_extract(
            &archive,
            &ExtractOptions {
                output: output.as_deref(),
                include: &include,
                exclude: &exclude,
                progress,
                cache_blocks,
            },
        ),
        Commands::Info { archive } => cmd_info(&archive),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
