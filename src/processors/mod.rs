//! Feature engineering jobs and their building blocks.

pub mod cell;
pub mod cyclic;
pub mod dictionary;
pub mod encoding;
pub mod location;

// Re-export key types for convenience
pub use cell::{parse_list_literal, CellValue, LiteralError};
pub use dictionary::{CategoryDictionary, DictionaryError};
pub use encoding::{encode_tables, run_encoding_job, EncodeStats};
pub use location::{clean_table, run_location_job, CleanStats};
