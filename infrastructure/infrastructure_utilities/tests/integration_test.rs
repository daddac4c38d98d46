//! Integration tests for infrastructure_utilities

use infrastructure_utilities::{compress2, uncompress, CompressionLevel};

#[test]
fn test_roundtrip_binary_payload() {
    let data: Vec<u8> = (0..u8::MAX).cycle().take(10_000).collect();
    let compressed = compress2(&data, CompressionLevel::Default).unwrap();
    let decompressed = uncompress(&compressed, data.len()).unwrap();
    assert_eq!(decompressed, data);
}

#[test]
fn test_incompressible_payload_still_roundtrips() {
    // A pseudo-random byte soup that zlib cannot shrink
    let mut state = 0x12345678u32;
    let data: Vec<u8> = (0..512)
        .map(|_| {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        })
        .collect();
    let compressed = compress2(&data, CompressionLevel::Default).unwrap();
    assert_eq!(uncompress(&compressed, data.len()).unwrap(), data);
}
