//! Command implementations for OxiCHM CLI.

pub mod extract;
pub mod info;
pub mod list;

pub use extract::{ExtractOptions, cmd_extract};
pub use info::cmd_info;
pub use list::{ListOptions, cmd_list};
