//! Transmit Buffer Module
//!
//! Coalesces several encoded messages into one buffer before a single
//! connection write: a control message, then the payload message, and so
//! on. Growing for a new message must never disturb what was already
//! encoded, so each append reserves at the tail, encodes in place, and
//! trims to what was written.
//!
//! The append sequence (size estimate, reserve, encode) must be atomic with
//! respect to other appenders on the same connection; callers serialize it
//! under the same lock that guards the connection's atom cache, since an
//! encode that inserts into the cache needs a consistent buffer tail. An
//! append that fails with an internal inconsistency leaves the buffer as it
//! was, but the cache may already hold new slots: the connection is no
//! longer in lockstep with the peer and must be torn down.

use entities_term::Term;

use crate::connection::DistConnection;
use crate::constants::VERSION_MAGIC;
use crate::encoding::{enc_term, EncodeError};
use crate::size_calculation::encode_size;
use crate::CodecEnv;

/// Growable buffer of coalesced encoded messages
#[derive(Debug, Default)]
pub struct TransmitBuffer {
    buf: Vec<u8>,
}

impl TransmitBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append one encoded message, returning the bytes it occupies
    pub fn append(
        &mut self,
        env: &CodecEnv,
        mut ctx: Option<&mut DistConnection>,
        term: &Term,
        dflags: u32,
    ) -> Result<usize, EncodeError> {
        let size = encode_size(env, ctx.as_deref_mut(), term, dflags)?;
        let start = self.buf.len();
        self.buf.resize(start + size, 0);
        self.buf[start] = VERSION_MAGIC;
        let mut index = start + 1;
        match enc_term(
            env,
            ctx,
            term,
            &mut Some(&mut self.buf[..]),
            &mut index,
            dflags,
        ) {
            Ok(()) => {
                self.buf.truncate(index);
                Ok(index - start)
            }
            Err(e) => {
                self.buf.truncate(start);
                Err(e)
            }
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Hand the coalesced bytes to the transport, leaving the buffer empty
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TERM_TO_BINARY_DFLAGS;
    use crate::external::from_external;
    use entities_term::{AtomTable, NodeRegistry};

    #[test]
    fn test_appends_coalesce() {
        let atoms = AtomTable::new(10);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let mut out = TransmitBuffer::new();

        let first = out
            .append(&env, None, &Term::Small(1), TERM_TO_BINARY_DFLAGS)
            .unwrap();
        let second = out
            .append(&env, None, &Term::Small(300), TERM_TO_BINARY_DFLAGS)
            .unwrap();
        assert_eq!(out.len(), first + second);

        // Both messages decode back from their offsets
        let bytes = out.take();
        assert!(out.is_empty());
        assert_eq!(
            from_external(&env, None, &bytes[..first]).unwrap(),
            Term::Small(1)
        );
        assert_eq!(
            from_external(&env, None, &bytes[first..]).unwrap(),
            Term::Small(300)
        );
    }

    #[test]
    fn test_grow_preserves_existing_content() {
        let atoms = AtomTable::new(10);
        let nodes = NodeRegistry::new(0, 1);
        let env = CodecEnv {
            atoms: &atoms,
            nodes: &nodes,
        };
        let mut out = TransmitBuffer::new();

        out.append(&env, None, &Term::Small(7), TERM_TO_BINARY_DFLAGS)
            .unwrap();
        let snapshot = out.as_slice().to_vec();
        out.append(
            &env,
            None,
            &Term::Binary(vec![0xaa; 4096]),
            TERM_TO_BINARY_DFLAGS,
        )
        .unwrap();
        assert_eq!(&out.as_slice()[..snapshot.len()], &snapshot[..]);
    }
}
