//! Encoding Module
//!
//! Term encoder for the external format. One definition per tag serves both
//! size calculation and writing: every function takes
//! `buf: &mut Option<&mut [u8]>` and advances `index` identically whether it
//! is sizing (`None`) or writing (`Some`), so the size arithmetic cannot
//! drift from the write arithmetic.
//!
//! The single exception is atoms under an established cache: sizing charges
//! the worst case (a cache miss spelling the text out) because the actual
//! encoding may be the two-byte cached form. The writer therefore only ever
//! comes in at or below the estimate, and the façade trims the slack.
//!
//! Writing past the sized buffer is an internal-consistency fault: the
//! operation is aborted rather than silently truncated, since a truncated
//! write would corrupt a coalesced transmit buffer.

use entities_term::{Pid, Term};
use infrastructure_bignum_encoding::encode_big;

use crate::connection::DistConnection;
use crate::constants::*;
use crate::CodecEnv;

/// Encoding error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Encoder and size estimator disagree, or a capability invariant was
    /// broken; fatal for the operation
    InternalInconsistency(String),
    /// A term refers to an atom id the table does not know
    AtomNotFound,
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::InternalInconsistency(msg) => {
                write!(f, "internal inconsistency: {}", msg)
            }
            EncodeError::AtomNotFound => write!(f, "atom not found"),
        }
    }
}

impl std::error::Error for EncodeError {}

fn overrun() -> EncodeError {
    EncodeError::InternalInconsistency("encoded length exceeds the estimated size".to_string())
}

fn put_u8(buf: &mut Option<&mut [u8]>, index: &mut usize, value: u8) -> Result<(), EncodeError> {
    if let Some(b) = buf.as_mut() {
        if *index >= b.len() {
            return Err(overrun());
        }
        b[*index] = value;
    }
    *index += 1;
    Ok(())
}

fn put_bytes(
    buf: &mut Option<&mut [u8]>,
    index: &mut usize,
    bytes: &[u8],
) -> Result<(), EncodeError> {
    if let Some(b) = buf.as_mut() {
        if *index + bytes.len() > b.len() {
            return Err(overrun());
        }
        b[*index..*index + bytes.len()].copy_from_slice(bytes);
    }
    *index += bytes.len();
    Ok(())
}

fn put_u16(buf: &mut Option<&mut [u8]>, index: &mut usize, value: u16) -> Result<(), EncodeError> {
    put_bytes(buf, index, &value.to_be_bytes())
}

fn put_u32(buf: &mut Option<&mut [u8]>, index: &mut usize, value: u32) -> Result<(), EncodeError> {
    put_bytes(buf, index, &value.to_be_bytes())
}

/// Overwrite 4 bytes at an already-written position (length backpatch)
fn patch_u32(
    buf: &mut Option<&mut [u8]>,
    at: usize,
    value: u32,
) -> Result<(), EncodeError> {
    if let Some(b) = buf.as_mut() {
        if at + 4 > b.len() {
            return Err(overrun());
        }
        b[at..at + 4].copy_from_slice(&value.to_be_bytes());
    }
    Ok(())
}

/// Encode an atom
///
/// Without an established cache the text is always spelled out. With one,
/// a hit on the atom's slot emits the two-byte cached form; a miss evicts
/// the slot's occupant and carries the text along with the slot assignment,
/// keeping the peer's incoming table in lockstep.
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone serialization
/// * `atom` - Atom id
/// * `buf` - Optional buffer to write to (None for size calculation)
/// * `index` - Current index in buffer
pub fn enc_atom(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    atom: u32,
    buf: &mut Option<&mut [u8]>,
    index: &mut usize,
) -> Result<(), EncodeError> {
    let has_cache = ctx.as_ref().map_or(false, |c| c.has_cache());

    if buf.is_none() {
        // Sizing must not touch the cache: charge the worst case under a
        // cache, the exact plain form otherwise.
        let len = env.atoms.text_len(atom).ok_or(EncodeError::AtomNotFound)?;
        *index += if has_cache { 1 + 1 + 2 + len } else { 1 + 2 + len };
        return Ok(());
    }

    if !has_cache {
        let text = env.atoms.text(atom).ok_or(EncodeError::AtomNotFound)?;
        put_u8(buf, index, ATOM_EXT)?;
        put_u16(buf, index, text.len() as u16)?;
        return put_bytes(buf, index, &text);
    }

    let cache = match ctx.and_then(|c| c.cache_mut()) {
        Some(cache) => cache,
        None => return Err(EncodeError::InternalInconsistency("cache vanished".to_string())),
    };
    if let Some(slot) = cache.lookup_outgoing(atom) {
        put_u8(buf, index, CACHED_ATOM)?;
        put_u8(buf, index, slot)
    } else {
        let slot = cache.insert_outgoing(atom);
        let text = env.atoms.text(atom).ok_or(EncodeError::AtomNotFound)?;
        put_u8(buf, index, NEW_CACHE)?;
        put_u8(buf, index, slot)?;
        put_u16(buf, index, text.len() as u16)?;
        put_bytes(buf, index, &text)
    }
}

/// Encode a pid: node atom, then fixed-width number/serial/creation
pub fn enc_pid(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    pid: &Pid,
    buf: &mut Option<&mut [u8]>,
    index: &mut usize,
) -> Result<(), EncodeError> {
    put_u8(buf, index, PID_EXT)?;
    enc_atom(env, ctx, pid.node.sysname, buf, index)?;
    put_u32(buf, index, pid.number)?;
    put_u32(buf, index, pid.serial)?;
    put_u8(buf, index, pid.node.creation)
}

/// Length of a proper byte list eligible for the compact string encoding
fn string_length(term: &Term) -> Option<usize> {
    let mut len = 0usize;
    let mut cur = term;
    loop {
        match cur {
            Term::Nil => return if len > 0 { Some(len) } else { None },
            Term::List { head, tail } => {
                if !head.is_byte() {
                    return None;
                }
                len += 1;
                if len >= MAX_STRING_LEN {
                    return None;
                }
                cur = tail.as_ref();
            }
            _ => return None,
        }
    }
}

/// Encode a term
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone serialization
/// * `term` - The term to encode
/// * `buf` - Optional buffer to write to (None for size calculation)
/// * `index` - Current index in buffer
/// * `dflags` - Capability flags governing variant selection
pub fn enc_term(
    env: &CodecEnv,
    mut ctx: Option<&mut DistConnection>,
    term: &Term,
    buf: &mut Option<&mut [u8]>,
    index: &mut usize,
    dflags: u32,
) -> Result<(), EncodeError> {
    match term {
        Term::Nil => put_u8(buf, index, NIL_EXT),

        Term::Small(value) => {
            if (0..=255).contains(value) {
                put_u8(buf, index, SMALL_INTEGER_EXT)?;
                put_u8(buf, index, *value as u8)
            } else if (i64::from(i32::MIN)..=i64::from(i32::MAX)).contains(value) {
                put_u8(buf, index, INTEGER_EXT)?;
                put_bytes(buf, index, &(*value as i32).to_be_bytes())
            } else {
                // Out of the 32-bit tag's range: small-big with the digit
                // bytes of the magnitude, least significant first.
                let mut magnitude = value.unsigned_abs();
                let mut digits = [0u8; 8];
                let mut n = 0;
                while magnitude > 0 {
                    digits[n] = (magnitude & 0xff) as u8;
                    magnitude >>= 8;
                    n += 1;
                }
                put_u8(buf, index, SMALL_BIG_EXT)?;
                put_u8(buf, index, n as u8)?;
                put_u8(buf, index, u8::from(*value < 0))?;
                put_bytes(buf, index, &digits[..n])
            }
        }

        Term::Big(value) => encode_big(buf, index, value).map_err(|_| overrun()),

        Term::Float(value) => {
            put_u8(buf, index, FLOAT_EXT)?;
            if buf.is_some() {
                let text = format!("{:.20e}", value);
                put_bytes(buf, index, text.as_bytes())?;
                for _ in text.len()..31 {
                    put_u8(buf, index, 0)?;
                }
                Ok(())
            } else {
                *index += 31;
                Ok(())
            }
        }

        Term::Atom(atom) => enc_atom(env, ctx, *atom, buf, index),

        Term::Tuple(elements) => {
            if elements.len() <= 0xff {
                put_u8(buf, index, SMALL_TUPLE_EXT)?;
                put_u8(buf, index, elements.len() as u8)?;
            } else {
                put_u8(buf, index, LARGE_TUPLE_EXT)?;
                put_u32(buf, index, elements.len() as u32)?;
            }
            for element in elements {
                enc_term(env, ctx.as_deref_mut(), element, buf, index, dflags)?;
            }
            Ok(())
        }

        Term::List { .. } => {
            if let Some(len) = string_length(term) {
                put_u8(buf, index, STRING_EXT)?;
                put_u16(buf, index, len as u16)?;
                let mut cur = term;
                while let Term::List { head, tail } = cur {
                    match head.as_ref() {
                        Term::Small(v) => put_u8(buf, index, *v as u8)?,
                        _ => return Err(EncodeError::InternalInconsistency(
                            "string element changed underfoot".to_string(),
                        )),
                    }
                    cur = tail.as_ref();
                }
                return Ok(());
            }
            put_u8(buf, index, LIST_EXT)?;
            let length_at = *index;
            put_u32(buf, index, 0)?;
            let mut count = 0u32;
            let mut cur = term;
            while let Term::List { head, tail } = cur {
                count += 1;
                enc_term(env, ctx.as_deref_mut(), head, buf, index, dflags)?;
                cur = tail.as_ref();
            }
            // Tail term; NIL_EXT closes a proper list.
            enc_term(env, ctx.as_deref_mut(), cur, buf, index, dflags)?;
            patch_u32(buf, length_at, count)
        }

        Term::Binary(data) => {
            put_u8(buf, index, BINARY_EXT)?;
            put_u32(buf, index, data.len() as u32)?;
            put_bytes(buf, index, data)
        }

        Term::Pid(pid) => enc_pid(env, ctx, pid, buf, index),

        Term::Port(port) => {
            put_u8(buf, index, PORT_EXT)?;
            enc_atom(env, ctx, port.node.sysname, buf, index)?;
            put_u32(buf, index, port.number)?;
            put_u8(buf, index, port.node.creation)
        }

        Term::Reference(reference) => {
            if dflags & DFLAG_EXTENDED_REFERENCES == 0 {
                return Err(EncodeError::InternalInconsistency(
                    "peer without extended references".to_string(),
                ));
            }
            put_u8(buf, index, NEW_REFERENCE_EXT)?;
            put_u16(buf, index, reference.numbers.len() as u16)?;
            enc_atom(env, ctx, reference.node.sysname, buf, index)?;
            put_u8(buf, index, reference.node.creation)?;
            for number in &reference.numbers {
                put_u32(buf, index, *number)?;
            }
            Ok(())
        }

        Term::Fun(fun) => {
            let new_tags = dflags & DFLAG_NEW_FUN_TAGS != 0;
            if let Some(new_id) = fun.new_id.as_ref().filter(|_| new_tags) {
                put_u8(buf, index, NEW_FUN_EXT)?;
                let size_at = *index;
                put_u32(buf, index, 0)?;
                put_u8(buf, index, fun.arity)?;
                put_bytes(buf, index, &new_id.uniq)?;
                put_u32(buf, index, new_id.index)?;
                put_u32(buf, index, fun.free_vars.len() as u32)?;
                enc_atom(env, ctx.as_deref_mut(), fun.module, buf, index)?;
                enc_term(
                    env,
                    ctx.as_deref_mut(),
                    &Term::Small(i64::from(fun.old_index)),
                    buf,
                    index,
                    dflags,
                )?;
                enc_term(
                    env,
                    ctx.as_deref_mut(),
                    &Term::Small(i64::from(fun.old_uniq)),
                    buf,
                    index,
                    dflags,
                )?;
                enc_pid(env, ctx.as_deref_mut(), &fun.creator, buf, index)?;
                for free_var in &fun.free_vars {
                    enc_term(env, ctx.as_deref_mut(), free_var, buf, index, dflags)?;
                }
                // Total size spans from the size field itself, for peers
                // that skip funs they cannot use.
                patch_u32(buf, size_at, (*index - size_at) as u32)
            } else if dflags & DFLAG_FUN_TAGS != 0 {
                put_u8(buf, index, FUN_EXT)?;
                put_u32(buf, index, fun.free_vars.len() as u32)?;
                enc_pid(env, ctx.as_deref_mut(), &fun.creator, buf, index)?;
                enc_atom(env, ctx.as_deref_mut(), fun.module, buf, index)?;
                enc_term(
                    env,
                    ctx.as_deref_mut(),
                    &Term::Small(i64::from(fun.old_index)),
                    buf,
                    index,
                    dflags,
                )?;
                enc_term(
                    env,
                    ctx.as_deref_mut(),
                    &Term::Small(i64::from(fun.old_uniq)),
                    buf,
                    index,
                    dflags,
                )?;
                for free_var in &fun.free_vars {
                    enc_term(env, ctx.as_deref_mut(), free_var, buf, index, dflags)?;
                }
                Ok(())
            } else {
                // Peer understands no fun encoding at all: ship a plain
                // tuple {'fun', Module, Index, Uniq, {FreeVars...}} instead
                // of failing the whole message.
                let fun_atom = env
                    .atoms
                    .intern(b"fun")
                    .map_err(|_| EncodeError::InternalInconsistency("atom table full".to_string()))?;
                put_u8(buf, index, SMALL_TUPLE_EXT)?;
                put_u8(buf, index, 5)?;
                enc_atom(env, ctx.as_deref_mut(), fun_atom, buf, index)?;
                enc_atom(env, ctx.as_deref_mut(), fun.module, buf, index)?;
                put_u8(buf, index, INTEGER_EXT)?;
                put_bytes(buf, index, &(fun.old_index as i32).to_be_bytes())?;
                put_u8(buf, index, INTEGER_EXT)?;
                put_bytes(buf, index, &(fun.old_uniq as i32).to_be_bytes())?;
                if fun.free_vars.len() <= 0xff {
                    put_u8(buf, index, SMALL_TUPLE_EXT)?;
                    put_u8(buf, index, fun.free_vars.len() as u8)?;
                } else {
                    put_u8(buf, index, LARGE_TUPLE_EXT)?;
                    put_u32(buf, index, fun.free_vars.len() as u32)?;
                }
                for free_var in &fun.free_vars {
                    enc_term(env, ctx.as_deref_mut(), free_var, buf, index, dflags)?;
                }
                Ok(())
            }
        }
    }
}
