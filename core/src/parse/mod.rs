//! Parsers for the text output of the external enumeration tools.
//!
//! Everything here is a pure function over `&str`, so the parsing pipeline
//! can be tested without invoking any external tool.

mod address;
mod listing;

pub use address::parse_address;
pub use listing::{build_command_map, parse_listing, MAX_COMMAND_LEN};

pub(crate) use listing::truncate_command;
