//! Connection Context Module
//!
//! Codec-side state of one distribution connection: the capability flags
//! negotiated during the handshake and, once installed, the atom cache.
//!
//! A context is created when the connection is established and dropped with
//! it; it is never shared between connections. The very first message on a
//! fresh connection is encoded before `install_cache` runs, so atoms in it
//! are always fully spelled out; the peer cache state does not exist yet.
//!
//! Encoding and decoding both mutate the cache, so one connection's context
//! must be accessed under that connection's exclusive-access discipline
//! (`&mut` here; a mutex at the caller when threads share the connection).

use crate::atom_cache::AtomCache;
use crate::constants::DFLAG_ATOM_CACHE;

/// Per-connection codec context
#[derive(Debug, Clone)]
pub struct DistConnection {
    /// Capability flags agreed with the peer
    pub flags: u32,
    cache: Option<AtomCache>,
}

impl DistConnection {
    /// Context for a fresh connection; no cache until the handshake is done
    pub fn new(flags: u32) -> Self {
        Self { flags, cache: None }
    }

    /// True when the peer negotiated `flag`
    pub fn supports(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Install an empty atom cache once DFLAG_ATOM_CACHE is negotiated
    pub fn install_cache(&mut self) {
        if self.supports(DFLAG_ATOM_CACHE) && self.cache.is_none() {
            self.cache = Some(AtomCache::new());
        }
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache_mut(&mut self) -> Option<&mut AtomCache> {
        self.cache.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DFLAG_EXTENDED_REFERENCES;

    #[test]
    fn test_fresh_connection_has_no_cache() {
        let conn = DistConnection::new(DFLAG_ATOM_CACHE);
        assert!(!conn.has_cache());
        assert!(conn.supports(DFLAG_ATOM_CACHE));
    }

    #[test]
    fn test_install_cache_requires_capability() {
        let mut conn = DistConnection::new(DFLAG_EXTENDED_REFERENCES);
        conn.install_cache();
        assert!(!conn.has_cache());

        let mut conn = DistConnection::new(DFLAG_ATOM_CACHE);
        conn.install_cache();
        assert!(conn.has_cache());
    }

    #[test]
    fn test_install_cache_is_idempotent() {
        let mut conn = DistConnection::new(DFLAG_ATOM_CACHE);
        conn.install_cache();
        if let Some(cache) = conn.cache_mut() {
            cache.insert_outgoing(42);
        }
        conn.install_cache();
        let slot = AtomCache::slot_of(42);
        assert_eq!(
            conn.cache_mut().and_then(|c| c.lookup_incoming(slot)),
            None
        );
        assert!(conn
            .cache_mut()
            .map(|c| c.lookup_outgoing(42).is_some())
            .unwrap_or(false));
    }
}
