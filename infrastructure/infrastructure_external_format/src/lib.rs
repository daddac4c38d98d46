//! Infrastructure Layer: External Term Format
//!
//! The wire-format codec of the runtime: converts terms to and from the
//! versioned, self-describing binary encoding used both for persistent
//! serialization and for messages between nodes.
//!
//! ## Modules
//!
//! - **[`constants`](constants/index.html)**: tag bytes, field limits and
//!   distribution capability flags
//! - **[`atom_cache`](atom_cache/index.html)**: per-connection direct-mapped
//!   atom cache reducing repeated-atom wire cost
//! - **[`connection`](connection/index.html)**: per-connection codec context
//!   (negotiated flags + cache)
//! - **[`encoding`](encoding/index.html)**: term encoder
//!   (enc_term, enc_atom, enc_pid); one definition per tag serves both
//!   sizing and writing
//! - **[`size_calculation`](size_calculation/index.html)**: exact encoded
//!   size (encode_size) and exact destination cell count (decode_size)
//! - **[`decoding`](decoding/index.html)**: explicit-worklist term decoder
//!   (dec_term, dec_atom, dec_pid)
//! - **[`external`](external/index.html)**: high-level entry points
//!   (to_external, to_external_compressed, from_external)
//! - **[`transmit`](transmit/index.html)**: coalescing transmit buffer for
//!   connection writes
//!
//! ## Control flow
//!
//! Encode: estimate size, allocate the buffer once, run the encoder, then
//! optionally compress. Decode: optionally decompress, scan for the exact
//! destination size, allocate the arena, run the decoder. The encoder never
//! reallocates mid-encode; the decoder never recurses on input structure.
//!
//! ## Concurrency
//!
//! The codec is synchronous and lock-free by itself. A connection's
//! [`DistConnection`] (and its [`TransmitBuffer`], when messages are
//! coalesced) is mutable per-connection state: guard both under the same
//! exclusive-access discipline, since an encode that inserts into the atom
//! cache also needs a consistent buffer tail. Contexts of different
//! connections are fully independent.

pub mod atom_cache;
pub mod connection;
pub mod constants;
pub mod decoding;
pub mod encoding;
pub mod external;
pub mod size_calculation;
pub mod transmit;

pub use atom_cache::AtomCache;
pub use connection::DistConnection;
pub use constants::{COMPRESSED, VERSION_MAGIC};
pub use decoding::{dec_atom, dec_pid, dec_term, DecodeError};
pub use encoding::{enc_atom, enc_pid, enc_term, EncodeError};
pub use external::{from_external, to_external, to_external_compressed};
pub use size_calculation::{decode_size, decode_size_body, encode_size};
pub use transmit::TransmitBuffer;

use entities_term::{AtomTable, NodeRegistry};

/// Collaborators the codec needs from the surrounding runtime: the atom
/// table that interns symbol text, and the node registry that owns the
/// local identity and hands out reference-counted node descriptors.
pub struct CodecEnv<'a> {
    pub atoms: &'a AtomTable,
    pub nodes: &'a NodeRegistry,
}
