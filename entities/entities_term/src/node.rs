//! Node Registry Module
//!
//! Node descriptors identify the runtime instances participating in
//! distribution: a symbolic name (atom id) plus a small creation counter
//! that disambiguates successive lifetimes of the same name.
//!
//! External pids, ports and references share their descriptor by reference
//! count: every embedding term clones an `Arc<Node>` out of the registry and
//! releases it when the term is dropped. The registry itself only holds weak
//! handles, so a descriptor is reclaimed as soon as the last referencing
//! term goes away. The registry is an explicit value with an explicit
//! lifecycle, created alongside the local node identity.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

/// A node descriptor: symbolic name plus creation counter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    /// Atom id of the node name
    pub sysname: u32,
    /// Creation counter; 0 on the wire means "unknown, resolve locally"
    pub creation: u8,
}

/// Registry interning node descriptors by (sysname, creation)
pub struct NodeRegistry {
    local: Arc<Node>,
    table: RwLock<HashMap<(u32, u8), Weak<Node>>>,
}

impl NodeRegistry {
    /// Create a registry owning the local node identity
    pub fn new(local_sysname: u32, local_creation: u8) -> Self {
        Self {
            local: Arc::new(Node {
                sysname: local_sysname,
                creation: local_creation,
            }),
            table: RwLock::new(HashMap::new()),
        }
    }

    /// Handle to the local node
    pub fn this_node(&self) -> Arc<Node> {
        Arc::clone(&self.local)
    }

    /// True when the handle refers to the local node
    pub fn is_local(&self, node: &Arc<Node>) -> bool {
        **node == *self.local
    }

    /// Resolve a wire creation value against the local identity.
    ///
    /// A creation of 0 means the sender did not know the node's current
    /// creation; when the name matches the local node it resolves to the
    /// local creation, otherwise it stays 0.
    pub fn resolve_creation(&self, sysname: u32, creation: u8) -> u8 {
        if creation == 0 && sysname == self.local.sysname {
            self.local.creation
        } else {
            creation
        }
    }

    /// Look up or create the descriptor for (sysname, creation)
    pub fn find_or_insert(&self, sysname: u32, creation: u8) -> Arc<Node> {
        if sysname == self.local.sysname && creation == self.local.creation {
            return Arc::clone(&self.local);
        }

        let key = (sysname, creation);
        {
            let table = self.table.read().unwrap();
            if let Some(node) = table.get(&key).and_then(Weak::upgrade) {
                return node;
            }
        }

        let mut table = self.table.write().unwrap();
        if let Some(node) = table.get(&key).and_then(Weak::upgrade) {
            return node;
        }
        // Drop entries whose last term reference is gone.
        table.retain(|_, weak| weak.upgrade().is_some());
        let node = Arc::new(Node { sysname, creation });
        table.insert(key, Arc::downgrade(&node));
        node
    }

    /// Number of external descriptors still referenced by live terms
    pub fn live_count(&self) -> usize {
        self.table
            .read()
            .unwrap()
            .values()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }
}
