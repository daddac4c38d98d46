//! Infrastructure Layer: Utilities
//!
//! Support functionality shared by the codec crates. Currently this is the
//! zlib compression wrapper used by the compressed external format.

pub mod compression;

pub use compression::{compress2, uncompress, CompressionError, CompressionLevel};
