//! Feature engineering for real-estate listing tables.
//!
//! This crate provides two batch jobs over CSV tables:
//! - Location cleaning: repairs redacted or known-bad coordinates and
//!   replaces latitude/longitude with polar coordinates around a fixed
//!   reference point
//! - Categorical encoding: one-hot expands list-valued columns, persists the
//!   category dictionary, and cyclically encodes the closing month and day
//!
//! # Example
//!
//! ```no_run
//! use listing_features::{core::loaders::load_table, processors::location::clean_table};
//! use listing_features::config::LocationConfig;
//!
//! let mut table = load_table("test_modified.csv").unwrap();
//! let stats = clean_table(&mut table, &LocationConfig::default()).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{EncodingConfig, LocationConfig, PathsConfig, PipelineConfig};
pub use core::table::Table;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
