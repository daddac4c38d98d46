//! Big Number Module
//!
//! Arbitrary-precision integer wrapper used by `Term::Big`.
//!
//! This module uses the `malachite` crate for arbitrary-precision
//! arithmetic. The wire format stores big integers as a sign byte plus a
//! least-significant-first sequence of base-256 digit bytes, so the wrapper
//! exposes exactly that view: [`digit_bytes`](BigNumber::digit_bytes),
//! [`digit_count`](BigNumber::digit_count) and
//! [`from_digit_bytes`](BigNumber::from_digit_bytes).

use malachite::Integer;

/// Big number representation backed by malachite's Integer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BigNumber {
    value: Integer,
}

impl BigNumber {
    /// Create a big number from i64
    pub fn from_i64(value: i64) -> Self {
        Self {
            value: Integer::from(value),
        }
    }

    /// Create a big number from u64
    pub fn from_u64(value: u64) -> Self {
        Self {
            value: Integer::from(value),
        }
    }

    /// Reconstruct a big number from its sign and least-significant-first
    /// digit bytes. Trailing zero digits are tolerated; the value is
    /// normalized by the underlying integer.
    pub fn from_digit_bytes(negative: bool, digits: &[u8]) -> Self {
        let base = Integer::from(256);
        let mut value = Integer::from(0);
        for &digit in digits.iter().rev() {
            let shifted = &value * &base;
            value = &shifted + &Integer::from(u32::from(digit));
        }
        if negative {
            value = &Integer::from(0) - &value;
        }
        Self { value }
    }

    /// True if the value is strictly negative
    pub fn is_negative(&self) -> bool {
        self.value < 0
    }

    /// True if the value is zero
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Convert to i64, or None when out of range
    pub fn to_i64(&self) -> Option<i64> {
        self.value.to_string().parse::<i64>().ok()
    }

    /// Number of base-256 digits in the magnitude; zero has no digits.
    /// Computes by repeated division, no digit buffer is built.
    pub fn digit_count(&self) -> usize {
        let base = Integer::from(256);
        let mut magnitude = self.magnitude();
        let mut count = 0;
        while magnitude != 0 {
            count += 1;
            magnitude = &magnitude / &base;
        }
        count
    }

    /// Magnitude as least-significant-first digit bytes
    pub fn digit_bytes(&self) -> Vec<u8> {
        let base = Integer::from(256);
        let mut magnitude = self.magnitude();
        let mut digits = Vec::new();
        while magnitude != 0 {
            let digit = &magnitude % &base;
            digits.push(digit.to_string().parse::<u8>().unwrap_or(0));
            magnitude = &magnitude / &base;
        }
        digits
    }

    fn magnitude(&self) -> Integer {
        if self.value < 0 {
            &Integer::from(0) - &self.value
        } else {
            self.value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_i64_roundtrip() {
        let n = BigNumber::from_i64(-123_456_789);
        assert_eq!(n.to_i64(), Some(-123_456_789));
        assert!(n.is_negative());
        assert!(!n.is_zero());
    }

    #[test]
    fn test_digit_bytes_little_endian() {
        // 0x0102 -> digits [0x02, 0x01]
        let n = BigNumber::from_i64(0x0102);
        assert_eq!(n.digit_bytes(), vec![0x02, 0x01]);
        assert_eq!(n.digit_count(), 2);
    }

    #[test]
    fn test_digit_bytes_negative_magnitude() {
        let n = BigNumber::from_i64(-256);
        assert_eq!(n.digit_bytes(), vec![0x00, 0x01]);
        assert!(n.is_negative());
    }

    #[test]
    fn test_from_digit_bytes() {
        let n = BigNumber::from_digit_bytes(false, &[0x02, 0x01]);
        assert_eq!(n.to_i64(), Some(0x0102));

        let m = BigNumber::from_digit_bytes(true, &[0x2a]);
        assert_eq!(m.to_i64(), Some(-42));
    }

    #[test]
    fn test_from_digit_bytes_trailing_zeros_normalize() {
        let a = BigNumber::from_digit_bytes(false, &[0x2a, 0x00, 0x00]);
        let b = BigNumber::from_i64(42);
        assert_eq!(a, b);
        assert_eq!(a.digit_count(), 1);
    }

    #[test]
    fn test_zero_has_no_digits() {
        let z = BigNumber::from_i64(0);
        assert!(z.is_zero());
        assert_eq!(z.digit_count(), 0);
        assert!(z.digit_bytes().is_empty());
    }

    #[test]
    fn test_wide_value_roundtrip() {
        // 2^80 + 5 does not fit i64
        let mut digits = vec![0u8; 11];
        digits[0] = 5;
        digits[10] = 1;
        let n = BigNumber::from_digit_bytes(false, &digits);
        assert_eq!(n.to_i64(), None);
        assert_eq!(n.digit_bytes(), digits);
        assert_eq!(n.digit_count(), 11);
    }
}
