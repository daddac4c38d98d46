//! Decoding Module
//!
//! Term decoder for the external format. Input is untrusted: every length
//! is checked against the remaining buffer, every count against its
//! protocol maximum, and construction never recurses: a hostile,
//! arbitrarily deep message costs O(depth) worklist memory, not call stack.
//!
//! Container tags push a frame recording how many children are still
//! outstanding; each completed term attaches to the innermost frame, and a
//! full frame pops and assembles its container. This is the worklist
//! rendition of the patch-list construction: the destination is charged in
//! one forward pass against an arena whose capacity the size scan computed
//! beforehand, so a disagreement between the two surfaces as a hard error
//! before anything is overrun.

use entities_term::{
    Fun, FunNewId, Pid, Port, Reference, Term, TermArena, MAX_CREATION, MAX_PID_NUMBER,
    MAX_PID_SERIAL, MAX_PORT_NUMBER, MAX_REFERENCE, MAX_REF_NUMBERS,
};
use infrastructure_bignum_encoding::{decode_big, BigDecodeError};

use crate::connection::DistConnection;
use crate::constants::*;
use crate::size_calculation::{
    big_cells, binary_cells, fun_cells, list_cells, ref_cells, tuple_cells, FLOAT_CELLS,
    IDENTITY_CELLS,
};
use crate::CodecEnv;

/// Decoding error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Structurally invalid input: bad tag, truncated field, length or
    /// count out of range
    MalformedTerm(String),
    /// Input assumes a capability the connection never negotiated, or an
    /// unsupported version byte
    ProtocolViolation(String),
    /// The decoder charged more cells than the size scan predicted; a
    /// codec bug, not an input fault
    InternalInconsistency(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MalformedTerm(msg) => write!(f, "malformed term: {}", msg),
            DecodeError::ProtocolViolation(msg) => write!(f, "protocol violation: {}", msg),
            DecodeError::InternalInconsistency(msg) => {
                write!(f, "internal inconsistency: {}", msg)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

fn malformed(msg: &str) -> DecodeError {
    DecodeError::MalformedTerm(msg.to_string())
}

fn take_u8(bytes: &[u8], pos: &mut usize) -> Result<u8, DecodeError> {
    let value = *bytes.get(*pos).ok_or_else(|| malformed("truncated buffer"))?;
    *pos += 1;
    Ok(value)
}

fn take_bytes<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], DecodeError> {
    if bytes.len() - *pos < n {
        return Err(malformed("truncated buffer"));
    }
    let slice = &bytes[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}

fn take_u16(bytes: &[u8], pos: &mut usize) -> Result<u16, DecodeError> {
    let b = take_bytes(bytes, pos, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

fn take_u32(bytes: &[u8], pos: &mut usize) -> Result<u32, DecodeError> {
    let b = take_bytes(bytes, pos, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn charge(arena: &mut TermArena, cells: usize) -> Result<(), DecodeError> {
    arena.allocate(cells).map(|_| ()).map_err(|overflow| {
        DecodeError::InternalInconsistency(format!(
            "arena overrun: requested {} cells with {} available",
            overflow.requested, overflow.available
        ))
    })
}

/// Decode an atom (plain or cache opcode), returning its id
///
/// Cache opcodes are only legal on a connection that negotiated
/// DFLAG_ATOM_CACHE and has a cache installed; anywhere else they are a
/// protocol violation, since the peer's slot assignments cannot be mirrored.
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone decoding
/// * `bytes` - Input buffer
/// * `pos` - Current position, advanced past the atom
pub fn dec_atom(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    bytes: &[u8],
    pos: &mut usize,
) -> Result<u32, DecodeError> {
    let tag = take_u8(bytes, pos)?;
    match tag {
        ATOM_EXT => {
            let len = take_u16(bytes, pos)? as usize;
            if len > entities_term::MAX_ATOM_CHARACTERS {
                return Err(malformed("atom text too long"));
            }
            let text = take_bytes(bytes, pos, len)?;
            env.atoms
                .intern(text)
                .map_err(|_| malformed("atom table exhausted"))
        }
        NEW_CACHE | CACHED_ATOM => {
            let conn = match ctx {
                Some(conn) if conn.supports(DFLAG_ATOM_CACHE) && conn.has_cache() => conn,
                _ => {
                    return Err(DecodeError::ProtocolViolation(
                        "atom cache opcode without negotiated cache".to_string(),
                    ))
                }
            };
            let slot = take_u8(bytes, pos)?;
            if tag == NEW_CACHE {
                let len = take_u16(bytes, pos)? as usize;
                if len > entities_term::MAX_ATOM_CHARACTERS {
                    return Err(malformed("atom text too long"));
                }
                let text = take_bytes(bytes, pos, len)?;
                let atom = env
                    .atoms
                    .intern(text)
                    .map_err(|_| malformed("atom table exhausted"))?;
                let cache = conn
                    .cache_mut()
                    .ok_or_else(|| malformed("cache vanished"))?;
                if !cache.insert_incoming(slot, atom) {
                    return Err(malformed("cache slot out of range"));
                }
                Ok(atom)
            } else {
                let cache = conn
                    .cache_mut()
                    .ok_or_else(|| malformed("cache vanished"))?;
                cache.lookup_incoming(slot).ok_or_else(|| {
                    DecodeError::ProtocolViolation("cached atom slot never defined".to_string())
                })
            }
        }
        _ => Err(malformed("expected an atom tag")),
    }
}

/// Decode the body of a pid (the PID_EXT tag already consumed)
pub fn dec_pid(
    env: &CodecEnv,
    ctx: Option<&mut DistConnection>,
    bytes: &[u8],
    pos: &mut usize,
    arena: &mut TermArena,
) -> Result<Pid, DecodeError> {
    let sysname = dec_atom(env, ctx, bytes, pos)?;
    let number = take_u32(bytes, pos)?;
    let serial = take_u32(bytes, pos)?;
    let creation = take_u8(bytes, pos)?;
    if creation >= MAX_CREATION {
        return Err(malformed("pid creation out of range"));
    }
    if number > MAX_PID_NUMBER {
        return Err(malformed("pid number out of range"));
    }
    if serial > MAX_PID_SERIAL {
        return Err(malformed("pid serial out of range"));
    }
    let creation = env.nodes.resolve_creation(sysname, creation);
    let node = env.nodes.find_or_insert(sysname, creation);
    charge(arena, IDENTITY_CELLS)?;
    Ok(Pid {
        node,
        number,
        serial,
    })
}

enum FrameKind {
    Tuple,
    /// Children are the elements followed by the tail term
    List,
    /// Children: module, old_index, old_uniq, creator, free vars
    FunNew {
        arity: u8,
        uniq: [u8; 16],
        index: u32,
    },
    /// Children: creator, module, old_index, old_uniq, free vars
    FunOld,
}

struct Frame {
    kind: FrameKind,
    expected: usize,
    children: Vec<Term>,
}

impl Frame {
    fn new(kind: FrameKind, expected: usize) -> Self {
        Self {
            kind,
            expected,
            children: Vec::new(),
        }
    }
}

fn expect_atom(term: &Term, what: &str) -> Result<u32, DecodeError> {
    match term {
        Term::Atom(atom) => Ok(*atom),
        _ => Err(malformed(what)),
    }
}

fn expect_uint(term: &Term, what: &str) -> Result<u32, DecodeError> {
    match term {
        Term::Small(value) if (0..=i64::from(u32::MAX)).contains(value) => Ok(*value as u32),
        _ => Err(malformed(what)),
    }
}

fn expect_pid(term: &Term, what: &str) -> Result<Pid, DecodeError> {
    match term {
        Term::Pid(pid) => Ok(pid.clone()),
        _ => Err(malformed(what)),
    }
}

fn complete_frame(frame: Frame) -> Result<Term, DecodeError> {
    let Frame { kind, children, .. } = frame;
    match kind {
        FrameKind::Tuple => Ok(Term::Tuple(children)),
        FrameKind::List => {
            let mut children = children;
            let mut tail = match children.pop() {
                Some(tail) => tail,
                None => return Err(DecodeError::InternalInconsistency(
                    "empty list frame".to_string(),
                )),
            };
            while let Some(head) = children.pop() {
                tail = Term::cons(head, tail);
            }
            Ok(tail)
        }
        FrameKind::FunNew { arity, uniq, index } => {
            let mut it = children.into_iter();
            let module = expect_atom(
                it.next().as_ref().ok_or_else(|| malformed("fun missing module"))?,
                "fun module must be an atom",
            )?;
            let old_index = expect_uint(
                it.next().as_ref().ok_or_else(|| malformed("fun missing index"))?,
                "fun index must be an integer",
            )?;
            let old_uniq = expect_uint(
                it.next().as_ref().ok_or_else(|| malformed("fun missing uniq"))?,
                "fun uniq must be an integer",
            )?;
            let creator = expect_pid(
                it.next().as_ref().ok_or_else(|| malformed("fun missing creator"))?,
                "fun creator must be a pid",
            )?;
            Ok(Term::Fun(Box::new(Fun {
                module,
                arity,
                old_index,
                old_uniq,
                creator,
                free_vars: it.collect(),
                new_id: Some(FunNewId { uniq, index }),
            })))
        }
        FrameKind::FunOld => {
            let mut it = children.into_iter();
            let creator = expect_pid(
                it.next().as_ref().ok_or_else(|| malformed("fun missing creator"))?,
                "fun creator must be a pid",
            )?;
            let module = expect_atom(
                it.next().as_ref().ok_or_else(|| malformed("fun missing module"))?,
                "fun module must be an atom",
            )?;
            let old_index = expect_uint(
                it.next().as_ref().ok_or_else(|| malformed("fun missing index"))?,
                "fun index must be an integer",
            )?;
            let old_uniq = expect_uint(
                it.next().as_ref().ok_or_else(|| malformed("fun missing uniq"))?,
                "fun uniq must be an integer",
            )?;
            Ok(Term::Fun(Box::new(Fun {
                module,
                arity: 0,
                old_index,
                old_uniq,
                creator,
                free_vars: it.collect(),
                new_id: None,
            })))
        }
    }
}

/// Decode one term from raw term bytes (no version byte)
///
/// # Arguments
/// * `env` - Atom table and node registry
/// * `ctx` - Connection context, None for standalone decoding
/// * `bytes` - Input buffer
/// * `pos` - Current position, advanced past the decoded term
/// * `arena` - Destination arena sized by the preceding size scan
///
/// # Returns
/// * `Ok(Term)` - Decoded term
/// * `Err(DecodeError)` - Decoding error; the arena may be partially used
pub fn dec_term(
    env: &CodecEnv,
    mut ctx: Option<&mut DistConnection>,
    bytes: &[u8],
    pos: &mut usize,
    arena: &mut TermArena,
) -> Result<Term, DecodeError> {
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let tag = take_u8(bytes, pos)?;
        let mut term = match tag {
            SMALL_INTEGER_EXT => Term::Small(i64::from(take_u8(bytes, pos)?)),

            INTEGER_EXT => {
                let b = take_bytes(bytes, pos, 4)?;
                Term::Small(i64::from(i32::from_be_bytes([b[0], b[1], b[2], b[3]])))
            }

            SMALL_BIG_EXT | LARGE_BIG_EXT => {
                let n = if tag == SMALL_BIG_EXT {
                    take_u8(bytes, pos)? as usize
                } else {
                    take_u32(bytes, pos)? as usize
                };
                charge(arena, big_cells(n))?;
                let big = decode_big(bytes, pos, n).map_err(|e| match e {
                    BigDecodeError::BufferTooShort => malformed("truncated big integer"),
                    BigDecodeError::InvalidSign(_) => malformed("invalid big integer sign"),
                })?;
                Term::from_big(big)
            }

            ATOM_EXT | NEW_CACHE | CACHED_ATOM => {
                *pos -= 1;
                Term::Atom(dec_atom(env, ctx.as_deref_mut(), bytes, pos)?)
            }

            NIL_EXT => Term::Nil,

            FLOAT_EXT => {
                charge(arena, FLOAT_CELLS)?;
                let raw = take_bytes(bytes, pos, 31)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(31);
                let text = std::str::from_utf8(&raw[..end])
                    .map_err(|_| malformed("float text is not ascii"))?;
                let value: f64 = text
                    .trim()
                    .parse()
                    .map_err(|_| malformed("unparsable float text"))?;
                Term::Float(value)
            }

            STRING_EXT => {
                let n = take_u16(bytes, pos)? as usize;
                charge(arena, list_cells(n))?;
                let data = take_bytes(bytes, pos, n)?;
                Term::byte_list(data)
            }

            BINARY_EXT => {
                let n = take_u32(bytes, pos)? as usize;
                if bytes.len() - *pos < n {
                    return Err(malformed("truncated binary"));
                }
                charge(arena, binary_cells(n))?;
                Term::Binary(take_bytes(bytes, pos, n)?.to_vec())
            }

            PID_EXT => Term::Pid(dec_pid(env, ctx.as_deref_mut(), bytes, pos, arena)?),

            PORT_EXT => {
                let sysname = dec_atom(env, ctx.as_deref_mut(), bytes, pos)?;
                let number = take_u32(bytes, pos)?;
                let creation = take_u8(bytes, pos)?;
                if number > MAX_PORT_NUMBER {
                    return Err(malformed("port number out of range"));
                }
                if creation >= MAX_CREATION {
                    return Err(malformed("port creation out of range"));
                }
                let creation = env.nodes.resolve_creation(sysname, creation);
                charge(arena, IDENTITY_CELLS)?;
                Term::Port(Port {
                    node: env.nodes.find_or_insert(sysname, creation),
                    number,
                })
            }

            REFERENCE_EXT => {
                let sysname = dec_atom(env, ctx.as_deref_mut(), bytes, pos)?;
                let number = take_u32(bytes, pos)?;
                let creation = take_u8(bytes, pos)?;
                if number > MAX_REFERENCE {
                    return Err(malformed("reference number out of range"));
                }
                if creation >= MAX_CREATION {
                    return Err(malformed("reference creation out of range"));
                }
                let creation = env.nodes.resolve_creation(sysname, creation);
                charge(arena, ref_cells(1))?;
                Term::Reference(Reference {
                    node: env.nodes.find_or_insert(sysname, creation),
                    numbers: vec![number],
                })
            }

            NEW_REFERENCE_EXT => {
                let count = take_u16(bytes, pos)? as usize;
                if count == 0 || count > MAX_REF_NUMBERS {
                    return Err(malformed("reference number count out of range"));
                }
                let sysname = dec_atom(env, ctx.as_deref_mut(), bytes, pos)?;
                let creation = take_u8(bytes, pos)?;
                if creation >= MAX_CREATION {
                    return Err(malformed("reference creation out of range"));
                }
                let mut numbers = Vec::with_capacity(count);
                let first = take_u32(bytes, pos)?;
                if first > MAX_REFERENCE {
                    return Err(malformed("reference number out of range"));
                }
                numbers.push(first);
                for _ in 1..count {
                    numbers.push(take_u32(bytes, pos)?);
                }
                let creation = env.nodes.resolve_creation(sysname, creation);
                charge(arena, ref_cells(count))?;
                Term::Reference(Reference {
                    node: env.nodes.find_or_insert(sysname, creation),
                    numbers,
                })
            }

            SMALL_TUPLE_EXT | LARGE_TUPLE_EXT => {
                let arity = if tag == SMALL_TUPLE_EXT {
                    take_u8(bytes, pos)? as usize
                } else {
                    take_u32(bytes, pos)? as usize
                };
                charge(arena, tuple_cells(arity))?;
                if arity == 0 {
                    Term::Tuple(Vec::new())
                } else {
                    stack.push(Frame::new(FrameKind::Tuple, arity));
                    continue;
                }
            }

            LIST_EXT => {
                let count = take_u32(bytes, pos)? as usize;
                if count == 0 {
                    // A zero count carries no tail and decodes to Nil
                    Term::Nil
                } else {
                    charge(arena, list_cells(count))?;
                    stack.push(Frame::new(FrameKind::List, count + 1));
                    continue;
                }
            }

            NEW_FUN_EXT => {
                let _total_size = take_u32(bytes, pos)?;
                let arity = take_u8(bytes, pos)?;
                let uniq_bytes = take_bytes(bytes, pos, 16)?;
                let mut uniq = [0u8; 16];
                uniq.copy_from_slice(uniq_bytes);
                let index = take_u32(bytes, pos)?;
                let num_free = take_u32(bytes, pos)? as usize;
                charge(arena, fun_cells(num_free))?;
                stack.push(Frame::new(
                    FrameKind::FunNew { arity, uniq, index },
                    4 + num_free,
                ));
                continue;
            }

            FUN_EXT => {
                let num_free = take_u32(bytes, pos)? as usize;
                charge(arena, fun_cells(num_free))?;
                stack.push(Frame::new(FrameKind::FunOld, 4 + num_free));
                continue;
            }

            other => return Err(DecodeError::MalformedTerm(format!("unknown tag: {}", other))),
        };

        // Attach the completed term; pop every frame it fills.
        'attach: loop {
            match stack.last_mut() {
                None => return Ok(term),
                Some(top) => {
                    top.children.push(term);
                    if top.children.len() < top.expected {
                        break 'attach;
                    }
                }
            }
            match stack.pop() {
                Some(frame) => term = complete_frame(frame)?,
                None => {
                    return Err(DecodeError::InternalInconsistency(
                        "worklist underflow".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_calculation::decode_size_body;
    use entities_term::{AtomTable, NodeRegistry};

    fn decode_one(body: &[u8]) -> Result<Term, DecodeError> {
        let atoms = AtomTable::new(100);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let cells = decode_size_body(body)?;
        let mut arena = TermArena::with_capacity(cells);
        let mut pos = 0;
        dec_term(&env, None, body, &mut pos, &mut arena)
    }

    #[test]
    fn test_dec_small_integer() {
        assert_eq!(decode_one(&[SMALL_INTEGER_EXT, 42]), Ok(Term::Small(42)));
    }

    #[test]
    fn test_dec_integer() {
        assert_eq!(
            decode_one(&[INTEGER_EXT, 0xff, 0xff, 0xff, 0xff]),
            Ok(Term::Small(-1))
        );
    }

    #[test]
    fn test_dec_nil() {
        assert_eq!(decode_one(&[NIL_EXT]), Ok(Term::Nil));
    }

    #[test]
    fn test_dec_small_big_collapses_to_word() {
        // 300 = 0x012c as a 2-digit big
        assert_eq!(
            decode_one(&[SMALL_BIG_EXT, 2, 0, 0x2c, 0x01]),
            Ok(Term::Small(300))
        );
    }

    #[test]
    fn test_dec_tuple() {
        let body = [SMALL_TUPLE_EXT, 2, SMALL_INTEGER_EXT, 1, SMALL_INTEGER_EXT, 2];
        assert_eq!(
            decode_one(&body),
            Ok(Term::Tuple(vec![Term::Small(1), Term::Small(2)]))
        );
    }

    #[test]
    fn test_dec_empty_tuple() {
        assert_eq!(decode_one(&[SMALL_TUPLE_EXT, 0]), Ok(Term::Tuple(vec![])));
    }

    #[test]
    fn test_dec_list_with_nil_tail() {
        let body = [
            LIST_EXT, 0, 0, 0, 2, SMALL_INTEGER_EXT, 1, SMALL_INTEGER_EXT, 2, NIL_EXT,
        ];
        assert_eq!(
            decode_one(&body),
            Ok(Term::list(vec![Term::Small(1), Term::Small(2)]))
        );
    }

    #[test]
    fn test_dec_improper_list() {
        let body = [LIST_EXT, 0, 0, 0, 1, SMALL_INTEGER_EXT, 1, SMALL_INTEGER_EXT, 2];
        assert_eq!(
            decode_one(&body),
            Ok(Term::cons(Term::Small(1), Term::Small(2)))
        );
    }

    #[test]
    fn test_dec_zero_length_list_is_nil() {
        assert_eq!(decode_one(&[LIST_EXT, 0, 0, 0, 0]), Ok(Term::Nil));
    }

    #[test]
    fn test_dec_string_builds_byte_list() {
        let body = [STRING_EXT, 0, 2, b'h', b'i'];
        assert_eq!(decode_one(&body), Ok(Term::byte_list(b"hi")));
    }

    #[test]
    fn test_dec_atom_interns() {
        let atoms = AtomTable::new(100);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let body = [ATOM_EXT, 0, 2, b'o', b'k'];
        let mut pos = 0;
        let id = dec_atom(&env, None, &body, &mut pos).unwrap();
        assert_eq!(pos, 5);
        assert_eq!(atoms.text(id), Some(b"ok".to_vec()));
    }

    #[test]
    fn test_dec_cache_opcode_without_context_is_violation() {
        let body = [CACHED_ATOM, 3];
        assert!(matches!(
            decode_one(&body),
            Err(DecodeError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_dec_cache_opcode_without_capability_is_violation() {
        let atoms = AtomTable::new(100);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let mut conn = DistConnection::new(0);
        let body = [NEW_CACHE, 0, 0, 2, b'o', b'k'];
        let mut pos = 0;
        assert!(matches!(
            dec_atom(&env, Some(&mut conn), &body, &mut pos),
            Err(DecodeError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_dec_undefined_cache_slot_is_violation() {
        let atoms = AtomTable::new(100);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let mut conn = DistConnection::new(DFLAG_ATOM_CACHE);
        conn.install_cache();
        let body = [CACHED_ATOM, 9];
        let mut pos = 0;
        assert!(matches!(
            dec_atom(&env, Some(&mut conn), &body, &mut pos),
            Err(DecodeError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_dec_float_text() {
        let mut body = vec![FLOAT_EXT];
        let text = *b"1.50000000000000000000e+00\0\0\0\0\0";
        body.extend_from_slice(&text);
        assert_eq!(decode_one(&body), Ok(Term::Float(1.5)));
    }

    #[test]
    fn test_dec_pid_range_checks() {
        // number above the 15-bit field range
        let mut body = vec![PID_EXT, ATOM_EXT, 0, 1, b'n'];
        body.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        body.push(0);
        assert!(matches!(
            decode_one(&body),
            Err(DecodeError::MalformedTerm(_))
        ));
    }

    #[test]
    fn test_dec_creation_at_limit_rejected() {
        let mut body = vec![PID_EXT, ATOM_EXT, 0, 1, b'n'];
        body.extend_from_slice(&1u32.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        body.push(MAX_CREATION);
        assert!(matches!(
            decode_one(&body),
            Err(DecodeError::MalformedTerm(_))
        ));
    }

    #[test]
    fn test_dec_unknown_tag() {
        assert!(matches!(
            decode_one(&[0xfe]),
            Err(DecodeError::MalformedTerm(_))
        ));
    }

    #[test]
    fn test_dec_deep_nesting_is_iterative() {
        let depth = 60_000;
        let mut body = Vec::with_capacity(depth * 2 + 1);
        for _ in 0..depth {
            body.extend_from_slice(&[SMALL_TUPLE_EXT, 1]);
        }
        body.push(NIL_EXT);
        let term = decode_one(&body).unwrap();
        // Spot-check the top of the tower
        match &term {
            Term::Tuple(inner) => assert_eq!(inner.len(), 1),
            other => panic!("expected tuple, got {:?}", other),
        }
    }

    #[test]
    fn test_dec_arena_exactness() {
        let body = [
            LIST_EXT, 0, 0, 0, 2, SMALL_INTEGER_EXT, 1, SMALL_TUPLE_EXT, 1, SMALL_INTEGER_EXT, 2,
            NIL_EXT,
        ];
        let atoms = AtomTable::new(100);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let cells = decode_size_body(&body).unwrap();
        let mut arena = TermArena::with_capacity(cells);
        let mut pos = 0;
        dec_term(&env, None, &body, &mut pos, &mut arena).unwrap();
        assert_eq!(arena.used(), cells);
        assert_eq!(pos, body.len());
    }
}
