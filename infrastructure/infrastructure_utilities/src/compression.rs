//! Compression Module
//!
//! Provides zlib compression and decompression using the `flate2` crate
//! (`miniz_oxide` backend, pure safe Rust). The external format uses these
//! as one-shot operations: a whole encoded term in, a whole stream out.
//!
//! Decompression is bounded: the caller states the expected uncompressed
//! length (carried in the compressed-format header) and anything that
//! inflates past it is rejected rather than allowed to grow without limit.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Compression level enumeration matching zlib levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// No compression (0)
    None = 0,
    /// Best speed (1)
    BestSpeed = 1,
    /// Default compression (6)
    Default = 6,
    /// Best compression (9)
    BestCompression = 9,
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::None => Compression::none(),
            CompressionLevel::BestSpeed => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::BestCompression => Compression::best(),
        }
    }
}

/// Compression error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    /// Data error (corrupted or invalid stream)
    DataError,
    /// Inflated output does not match the declared length
    LengthMismatch { expected: usize, actual: usize },
    /// Other error
    Other(String),
}

impl std::fmt::Display for CompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionError::DataError => write!(f, "Data error"),
            CompressionError::LengthMismatch { expected, actual } => {
                write!(f, "Length mismatch: expected {}, got {}", expected, actual)
            }
            CompressionError::Other(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl std::error::Error for CompressionError {}

/// Result type for compression operations
pub type CompressionResult<T> = Result<T, CompressionError>;

/// Compress `source` in one shot
///
/// # Arguments
/// * `source` - Data to compress
/// * `level` - Compression level
///
/// # Returns
/// * `Ok(Vec<u8>)` - The zlib stream
/// * `Err(CompressionError)` - Error occurred
pub fn compress2(source: &[u8], level: CompressionLevel) -> CompressionResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level.into());
    encoder
        .write_all(source)
        .map_err(|e| CompressionError::Other(format!("Write error: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| CompressionError::Other(format!("Finish error: {}", e)))
}

/// Decompress a zlib stream, bounded by the declared output length
///
/// # Arguments
/// * `source` - The zlib stream
/// * `expected_len` - Exact uncompressed length the stream must produce
///
/// # Returns
/// * `Ok(Vec<u8>)` - Exactly `expected_len` decompressed bytes
/// * `Err(CompressionError)` - Corrupt stream or length mismatch
pub fn uncompress(source: &[u8], expected_len: usize) -> CompressionResult<Vec<u8>> {
    let decoder = ZlibDecoder::new(source);
    let mut output = Vec::with_capacity(expected_len.min(1 << 20));
    // Read one byte past the declared length so oversize streams are
    // detected instead of truncated.
    decoder
        .take(expected_len as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|_| CompressionError::DataError)?;
    if output.len() != expected_len {
        return Err(CompressionError::LengthMismatch {
            expected: expected_len,
            actual: output.len(),
        });
    }
    Ok(output)
}
