//! External Format Entry Points
//!
//! High-level orchestration of the codec: size, allocate once, run the
//! walker, and the optional compression wrapper around the byte output.
//!
//! Compression is a pure best-effort optimization. The compressed form is
//! only used when, header included, it is strictly smaller than the plain
//! form; any compression failure falls back to the plain form. Decoding
//! bounds inflation by the declared uncompressed length, so a hostile
//! stream cannot expand without limit.

use entities_term::{Term, TermArena};
use infrastructure_utilities::{compress2, uncompress, CompressionLevel};

use crate::connection::DistConnection;
use crate::constants::{COMPRESSED, TERM_TO_BINARY_DFLAGS, VERSION_MAGIC};
use crate::decoding::{dec_term, DecodeError};
use crate::encoding::{enc_term, EncodeError};
use crate::size_calculation::{decode_size_body, encode_size};
use crate::CodecEnv;

/// Encode a term to the external format
///
/// Estimates the exact size, allocates once, encodes, and trims the slack
/// that cache hits may have left. The encoder outrunning the estimate is an
/// internal-consistency fault and aborts the operation.
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone serialization
/// * `term` - The term to encode
/// * `dflags` - Capability flags governing variant selection
pub fn to_external(
    env: &CodecEnv,
    mut ctx: Option<&mut DistConnection>,
    term: &Term,
    dflags: u32,
) -> Result<Vec<u8>, EncodeError> {
    let size = encode_size(env, ctx.as_deref_mut(), term, dflags)?;
    let mut out = vec![0u8; size];
    out[0] = VERSION_MAGIC;
    let mut index = 1;
    enc_term(env, ctx, term, &mut Some(&mut out[..]), &mut index, dflags)?;
    out.truncate(index);
    Ok(out)
}

/// Encode a term with best-effort compression
///
/// The payload is encoded into a scratch buffer and deflated; the
/// compressed form `{version, compressed-marker, u32 plain length, stream}`
/// is emitted only when it beats the plain form.
pub fn to_external_compressed(env: &CodecEnv, term: &Term) -> Result<Vec<u8>, EncodeError> {
    let size = encode_size(env, None, term, TERM_TO_BINARY_DFLAGS)?;
    let mut scratch = vec![0u8; size - 1];
    let mut index = 0;
    enc_term(
        env,
        None,
        term,
        &mut Some(&mut scratch[..]),
        &mut index,
        TERM_TO_BINARY_DFLAGS,
    )?;
    scratch.truncate(index);

    if let Ok(stream) = compress2(&scratch, CompressionLevel::Default) {
        if stream.len() + 6 < scratch.len() + 1 {
            let mut out = Vec::with_capacity(stream.len() + 6);
            out.push(VERSION_MAGIC);
            out.push(COMPRESSED);
            out.extend_from_slice(&(scratch.len() as u32).to_be_bytes());
            out.extend_from_slice(&stream);
            return Ok(out);
        }
    }

    let mut out = Vec::with_capacity(scratch.len() + 1);
    out.push(VERSION_MAGIC);
    out.extend_from_slice(&scratch);
    Ok(out)
}

/// Decode a term from the external format
///
/// Checks the version byte, inflates a compressed payload (bounded by its
/// declared length), scans for the exact destination size, and decodes.
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone decoding
/// * `bytes` - The encoded bytes, starting at the version byte
pub fn from_external(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    bytes: &[u8],
) -> Result<Term, DecodeError> {
    let body = match bytes.split_first() {
        Some((&VERSION_MAGIC, body)) => body,
        _ => {
            return Err(DecodeError::ProtocolViolation(
                "unsupported version byte".to_string(),
            ))
        }
    };

    if body.len() >= 5 && body[0] == COMPRESSED {
        let declared =
            u32::from_be_bytes([body[1], body[2], body[3], body[4]]) as usize;
        let inflated = uncompress(&body[5..], declared).map_err(|e| {
            DecodeError::MalformedTerm(format!("corrupt compressed payload: {}", e))
        })?;
        return decode_body(env, ctx, &inflated);
    }

    decode_body(env, ctx, body)
}

fn decode_body(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    body: &[u8],
) -> Result<Term, DecodeError> {
    let cells = decode_size_body(body)?;
    let mut arena = TermArena::with_capacity(cells);
    let mut pos = 0;
    dec_term(env, ctx, body, &mut pos, &mut arena)
}
