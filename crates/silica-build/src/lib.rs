//! Host-side view of the Silica vector table: slot layout, the dispatch model
//! and checks against linked images.

pub mod config;
pub mod inspect;
pub mod layout;
pub mod resolve;

pub use config::{parse_address, TableArgs, TableSpec};
pub use inspect::{inspect_bytes, inspect_file, ImageReport};
pub use layout::LayoutReport;
pub use resolve::{resolve, resolve_on, Resolution};
