//! Infrastructure Layer: Bignum Encoding
//!
//! Wire encoding for arbitrary-precision integers. A big integer travels as
//! a length header (one byte below 256 digits, four bytes otherwise), a sign
//! byte, and the magnitude as least-significant-first base-256 digit bytes.
//!
//! The digit sequence length must match the declared count exactly; the
//! decoder rejects anything else before touching the digits.

pub mod bignum_codec;

pub use bignum_codec::{decode_big, encode_big, BigDecodeError, BigEncodeError};

/// Tag for big integers with fewer than 256 digit bytes
pub const SMALL_BIG_EXT: u8 = 110;

/// Tag for big integers with a 4-byte digit count
pub const LARGE_BIG_EXT: u8 = 111;
