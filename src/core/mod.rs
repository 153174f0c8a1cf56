//! Core data types and I/O operations.

pub mod loaders;
pub mod table;
pub mod transforms;
pub mod writers;

pub use loaders::{load_table, LoaderError};
pub use table::{Table, TableError};
pub use transforms::{GeoPoint, PolarCoordinate, ReferencePoint};
pub use writers::{write_table, WriteError};
