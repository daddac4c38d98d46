//! External Format Constants
//!
//! Tag bytes and protocol limits of the external term format. Every
//! top-level encoding starts with `VERSION_MAGIC`; the tag values are fixed
//! by the wire protocol and shared with every peer implementation.

/// First byte of any top-level encoded value
pub const VERSION_MAGIC: u8 = 131;

/// Marker following the version byte when the payload is deflate-compressed
pub const COMPRESSED: u8 = 80;

/// Integer in 0..=255
pub const SMALL_INTEGER_EXT: u8 = 97;

/// 32-bit signed integer
pub const INTEGER_EXT: u8 = 98;

/// Float as 31 bytes of zero-padded decimal text
pub const FLOAT_EXT: u8 = 99;

/// Atom as u16 length + text
pub const ATOM_EXT: u8 = 100;

/// Old single-number reference (decode only)
pub const REFERENCE_EXT: u8 = 101;

pub const PORT_EXT: u8 = 102;

pub const PID_EXT: u8 = 103;

/// Tuple with arity in one byte
pub const SMALL_TUPLE_EXT: u8 = 104;

/// Tuple with arity in four bytes
pub const LARGE_TUPLE_EXT: u8 = 105;

/// The empty list
pub const NIL_EXT: u8 = 106;

/// Compact encoding for short proper lists of byte-valued integers
pub const STRING_EXT: u8 = 107;

pub const LIST_EXT: u8 = 108;

pub const BINARY_EXT: u8 = 109;

/// Big integer with a one-byte digit count
pub const SMALL_BIG_EXT: u8 = 110;

/// Big integer with a four-byte digit count
pub const LARGE_BIG_EXT: u8 = 111;

/// New-style fun with 16-byte id and total-size prefix
pub const NEW_FUN_EXT: u8 = 112;

/// Reference with up to MAX_REF_NUMBERS 32-bit numbers
pub const NEW_REFERENCE_EXT: u8 = 114;

/// Legacy fun layout
pub const FUN_EXT: u8 = 117;

/// Atom cache opcode: define a slot and carry the full text
pub const NEW_CACHE: u8 = 78;

/// Atom cache opcode: refer to a previously defined slot
pub const CACHED_ATOM: u8 = 67;

/// Number of slots in each half of a connection's atom cache
pub const MAXINDX: usize = 255;

/// Proper byte lists strictly shorter than this use STRING_EXT
pub const MAX_STRING_LEN: usize = 0xffff;

/// Peer understands the atom cache opcodes
pub const DFLAG_ATOM_CACHE: u32 = 0x02;

/// Peer understands NEW_REFERENCE_EXT
pub const DFLAG_EXTENDED_REFERENCES: u32 = 0x04;

/// Peer understands FUN_EXT
pub const DFLAG_FUN_TAGS: u32 = 0x10;

/// Peer understands NEW_FUN_EXT
pub const DFLAG_NEW_FUN_TAGS: u32 = 0x80;

/// Capabilities assumed for standalone serialization (no peer involved)
pub const TERM_TO_BINARY_DFLAGS: u32 = DFLAG_EXTENDED_REFERENCES | DFLAG_NEW_FUN_TAGS;
