//! Size Calculation Module
//!
//! Both sizing directions of the codec:
//!
//! - [`encode_size`] answers "how many bytes will encoding this term
//!   produce" by running the unified encoder with no output buffer, so the
//!   answer is the write path's own arithmetic.
//! - [`decode_size`] answers "how many destination cells will decoding this
//!   buffer consume" with a single forward scan. It is the sole
//!   bounds-checking gate before arena allocation and must never
//!   under-count.
//!
//! The scan is non-recursive: an explicit stack holds the number of sibling
//! terms still outstanding at each nesting level, so hostile nesting depth
//! costs O(depth) auxiliary memory, not call stack.
//!
//! The cell-cost functions here are the single definition of the heap cost
//! model; the decoder charges its arena through these same functions.

use entities_term::{Term, MAX_REF_NUMBERS};

use crate::connection::DistConnection;
use crate::constants::*;
use crate::decoding::DecodeError;
use crate::encoding::{enc_term, EncodeError};
use crate::CodecEnv;

/// Cells for a float
pub const FLOAT_CELLS: usize = 3;

/// Cells for the node-bearing head of a pid or port
pub const IDENTITY_CELLS: usize = 4;

/// Cells for a big integer of `n` digit bytes
pub fn big_cells(n: usize) -> usize {
    1 + (n + 7) / 8
}

/// Cells for a binary of `n` bytes
pub fn binary_cells(n: usize) -> usize {
    2 + (n + 7) / 8
}

/// Cells for a tuple of arity `n`
pub fn tuple_cells(n: usize) -> usize {
    n + 1
}

/// Cells for `n` cons cells; a string of `n` bytes charges the same
pub fn list_cells(n: usize) -> usize {
    2 * n
}

/// Cells for a reference carrying `k` numbers
pub fn ref_cells(k: usize) -> usize {
    4 + k
}

/// Cells for a fun with `n` free variables
pub fn fun_cells(n: usize) -> usize {
    6 + n
}

/// Exact encoded byte length of a term, including the version byte
///
/// With an established atom cache the result is an upper bound (atoms are
/// charged as cache misses); otherwise it is exact. Never mutates the cache
/// and never allocates.
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone serialization
/// * `term` - The term to size
/// * `dflags` - Capability flags governing variant selection
pub fn encode_size(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    term: &Term,
    dflags: u32,
) -> Result<usize, EncodeError> {
    let mut index = 0;
    enc_term(env, ctx, term, &mut None, &mut index, dflags)?;
    Ok(1 + index)
}

fn truncated() -> DecodeError {
    DecodeError::MalformedTerm("truncated buffer".to_string())
}

fn take(bytes: &[u8], pos: &mut usize, n: usize) -> Result<(), DecodeError> {
    if bytes.len() - *pos < n {
        return Err(truncated());
    }
    *pos += n;
    Ok(())
}

fn peek_u8(bytes: &[u8], pos: usize) -> Result<u8, DecodeError> {
    bytes.get(pos).copied().ok_or_else(truncated)
}

fn peek_u16(bytes: &[u8], pos: usize) -> Result<u16, DecodeError> {
    if bytes.len() - pos.min(bytes.len()) < 2 {
        return Err(truncated());
    }
    Ok(u16::from_be_bytes([bytes[pos], bytes[pos + 1]]))
}

fn peek_u32(bytes: &[u8], pos: usize) -> Result<u32, DecodeError> {
    if bytes.len() - pos.min(bytes.len()) < 4 {
        return Err(truncated());
    }
    Ok(u32::from_be_bytes([
        bytes[pos],
        bytes[pos + 1],
        bytes[pos + 2],
        bytes[pos + 3],
    ]))
}

/// Exact destination cell count for a buffer starting at the version byte
pub fn decode_size(bytes: &[u8]) -> Result<usize, DecodeError> {
    match bytes.first() {
        Some(&VERSION_MAGIC) => decode_size_body(&bytes[1..]),
        _ => Err(DecodeError::ProtocolViolation(
            "unsupported version byte".to_string(),
        )),
    }
}

/// Exact destination cell count for raw term bytes (no version byte)
///
/// Rejects structurally invalid input: unknown tags, truncated length
/// fields, declared lengths past the end of the buffer, and counts above
/// protocol maxima.
pub fn decode_size_body(bytes: &[u8]) -> Result<usize, DecodeError> {
    let mut pos = 0usize;
    let mut cells = 0usize;
    let mut terms = 1usize;
    // Fixed fields that trail the node atom of a pid/port/reference
    let mut atom_extra_skip = 0usize;
    let mut stack: Vec<usize> = Vec::new();

    loop {
        while terms > 0 {
            terms -= 1;
            let tag = peek_u8(bytes, pos)?;
            pos += 1;
            match tag {
                SMALL_INTEGER_EXT => take(bytes, &mut pos, 1)?,
                INTEGER_EXT => take(bytes, &mut pos, 4)?,
                SMALL_BIG_EXT => {
                    let n = peek_u8(bytes, pos)? as usize;
                    take(bytes, &mut pos, 1 + 1 + n)?;
                    cells += big_cells(n);
                }
                LARGE_BIG_EXT => {
                    let n = peek_u32(bytes, pos)? as usize;
                    take(bytes, &mut pos, 4 + 1 + n)?;
                    cells += big_cells(n);
                }
                ATOM_EXT => {
                    let n = peek_u16(bytes, pos)? as usize;
                    take(bytes, &mut pos, 2 + n + atom_extra_skip)?;
                    atom_extra_skip = 0;
                }
                NEW_CACHE => {
                    let n = peek_u16(bytes, pos + 1)? as usize;
                    take(bytes, &mut pos, 3 + n + atom_extra_skip)?;
                    atom_extra_skip = 0;
                }
                CACHED_ATOM => {
                    take(bytes, &mut pos, 1 + atom_extra_skip)?;
                    atom_extra_skip = 0;
                }
                PID_EXT => {
                    // Node atom scans as the next term
                    atom_extra_skip = 4 + 4 + 1;
                    cells += IDENTITY_CELLS;
                    terms += 1;
                }
                PORT_EXT => {
                    atom_extra_skip = 4 + 1;
                    cells += IDENTITY_CELLS;
                    terms += 1;
                }
                REFERENCE_EXT => {
                    atom_extra_skip = 4 + 1;
                    cells += ref_cells(1);
                    terms += 1;
                }
                NEW_REFERENCE_EXT => {
                    let k = peek_u16(bytes, pos)? as usize;
                    if k == 0 || k > MAX_REF_NUMBERS {
                        return Err(DecodeError::MalformedTerm(
                            "reference number count out of range".to_string(),
                        ));
                    }
                    pos += 2;
                    atom_extra_skip = 1 + 4 * k;
                    cells += ref_cells(k);
                    terms += 1;
                }
                NIL_EXT => {}
                LIST_EXT => {
                    let n = peek_u32(bytes, pos)? as usize;
                    pos += 4;
                    if n > 0 {
                        stack.push(terms);
                        terms = n + 1; // elements plus the tail term
                        cells += list_cells(n);
                    }
                    // A zero count decodes to Nil and carries no tail
                }
                SMALL_TUPLE_EXT => {
                    let n = peek_u8(bytes, pos)? as usize;
                    pos += 1;
                    stack.push(terms);
                    terms = n;
                    cells += tuple_cells(n);
                }
                LARGE_TUPLE_EXT => {
                    let n = peek_u32(bytes, pos)? as usize;
                    pos += 4;
                    stack.push(terms);
                    terms = n;
                    cells += tuple_cells(n);
                }
                STRING_EXT => {
                    let n = peek_u16(bytes, pos)? as usize;
                    take(bytes, &mut pos, 2 + n)?;
                    cells += list_cells(n);
                }
                FLOAT_EXT => {
                    take(bytes, &mut pos, 31)?;
                    cells += FLOAT_CELLS;
                }
                BINARY_EXT => {
                    let n = peek_u32(bytes, pos)? as usize;
                    take(bytes, &mut pos, 4 + n)?;
                    cells += binary_cells(n);
                }
                NEW_FUN_EXT => {
                    let total = peek_u32(bytes, pos)? as usize;
                    if bytes.len() - pos < total {
                        return Err(truncated());
                    }
                    // size, arity, 16-byte uniq, index
                    take(bytes, &mut pos, 4 + 1 + 16 + 4)?;
                    let num_free = peek_u32(bytes, pos)? as usize;
                    pos += 4;
                    stack.push(terms);
                    terms = 4 + num_free; // module, old_index, old_uniq, creator, env
                    cells += fun_cells(num_free);
                }
                FUN_EXT => {
                    let num_free = peek_u32(bytes, pos)? as usize;
                    pos += 4;
                    stack.push(terms);
                    terms = 4 + num_free; // creator, module, old_index, old_uniq, env
                    cells += fun_cells(num_free);
                }
                other => {
                    return Err(DecodeError::MalformedTerm(format!(
                        "unknown tag: {}",
                        other
                    )))
                }
            }
        }
        match stack.pop() {
            Some(outer) => terms = outer,
            None => return Ok(cells),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_term::{AtomTable, NodeRegistry};

    #[test]
    fn test_encode_size_includes_version_byte() {
        let atoms = AtomTable::new(10);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        assert_eq!(encode_size(&env, None, &Term::Nil, TERM_TO_BINARY_DFLAGS), Ok(2));
        assert_eq!(
            encode_size(&env, None, &Term::Small(42), TERM_TO_BINARY_DFLAGS),
            Ok(3)
        );
    }

    #[test]
    fn test_decode_size_simple() {
        // version, SMALL_INTEGER 42
        assert_eq!(decode_size(&[131, 97, 42]), Ok(0));
        // version, NIL
        assert_eq!(decode_size(&[131, 106]), Ok(0));
    }

    #[test]
    fn test_decode_size_bad_version() {
        assert!(matches!(
            decode_size(&[130, 97, 42]),
            Err(DecodeError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_decode_size_tuple_cells() {
        // {1, 2}: tuple arity 2 -> 3 cells
        let body = [104, 2, 97, 1, 97, 2];
        assert_eq!(decode_size_body(&body), Ok(3));
    }

    #[test]
    fn test_decode_size_truncation_detected() {
        let body = [104, 2, 97, 1, 97]; // missing the final byte
        assert!(decode_size_body(&body).is_err());
    }

    #[test]
    fn test_decode_size_unknown_tag() {
        assert!(matches!(
            decode_size_body(&[200]),
            Err(DecodeError::MalformedTerm(_))
        ));
    }

    #[test]
    fn test_decode_size_deep_nesting_is_iterative() {
        // 60k nested single-element tuples would overflow a recursive scan
        let depth = 60_000;
        let mut body = Vec::with_capacity(depth * 2 + 2);
        for _ in 0..depth {
            body.extend_from_slice(&[104, 1]);
        }
        body.push(106);
        let cells = decode_size_body(&body).unwrap();
        assert_eq!(cells, depth * 2);
    }

    #[test]
    fn test_decode_size_list_counts_cells() {
        // [1, 2 | 3]: two cons cells
        let body = [108, 0, 0, 0, 2, 97, 1, 97, 2, 97, 3];
        assert_eq!(decode_size_body(&body), Ok(4));
    }

    #[test]
    fn test_decode_size_rejects_oversized_ref_count() {
        // NEW_REFERENCE_EXT with count 4 > MAX_REF_NUMBERS
        let body = [114, 0, 4];
        assert!(matches!(
            decode_size_body(&body),
            Err(DecodeError::MalformedTerm(_))
        ));
    }

    #[test]
    fn test_decode_size_string_cells() {
        let body = [107, 0, 3, b'a', b'b', b'c'];
        assert_eq!(decode_size_body(&body), Ok(6));
    }

    #[test]
    fn test_decode_size_declared_length_past_end() {
        // Binary claiming 100 bytes with only 2 present
        let body = [109, 0, 0, 0, 100, 1, 2];
        assert!(decode_size_body(&body).is_err());
    }
}
