//! Entities Layer: Term Model
//!
//! Core value types for the distribution wire-format codec:
//!
//! - **[`term`](term/index.html)**: the tagged term union (`Term`) and the
//!   identity types embedded in it (`Pid`, `Port`, `Reference`, `Fun`)
//! - **[`atom`](atom/index.html)**: the atom table interning symbol text to
//!   small integer ids
//! - **[`node`](node/index.html)**: node descriptors and the reference-counted
//!   node registry used by external pids, ports and references
//! - **[`arena`](arena/index.html)**: bump cell accounting for decode
//!   destinations
//! - **[`big`](big/index.html)**: arbitrary-precision integer wrapper
//!
//! This crate has no knowledge of the wire encoding itself; the
//! infrastructure layer builds the codec on top of these types.

pub mod arena;
pub mod atom;
pub mod big;
pub mod node;
pub mod term;

pub use arena::{ArenaOverflow, TermArena};
pub use atom::{AtomError, AtomTable, MAX_ATOM_CHARACTERS};
pub use big::BigNumber;
pub use node::{Node, NodeRegistry};
pub use term::{
    Fun, FunNewId, Pid, Port, Reference, Term, MAX_CREATION, MAX_PID_NUMBER, MAX_PID_SERIAL,
    MAX_PORT_NUMBER, MAX_REFERENCE, MAX_REF_NUMBERS,
};
