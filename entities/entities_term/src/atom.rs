//! Atom Table Module
//!
//! Interns atom text to small integer ids. Atoms are unique symbols that are
//! compared by index rather than by byte comparison; the wire codec only
//! ever moves ids around and spells the text out when a peer has not seen
//! the atom yet.
//!
//! ## Overview
//!
//! - **Interning**: [`intern`](AtomTable::intern) returns the existing id
//!   for known text and creates a new entry otherwise
//! - **Lookup**: [`text`](AtomTable::text) and
//!   [`text_len`](AtomTable::text_len) map ids back to their bytes
//! - **Thread safety**: all operations take `&self`; the table is guarded
//!   by `RwLock`s internally
//!
//! ## Limits
//!
//! - Maximum bytes per atom: 255 (`MAX_ATOM_CHARACTERS`)
//! - Maximum atoms in the table: configurable via `AtomTable::new(limit)`

/*
 * %CopyrightBegin%
 *
 * SPDX-License-Identifier: Apache-2.0
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * %CopyrightEnd%
 */

use std::collections::HashMap;
use std::sync::RwLock;

/// Maximum number of bytes in an atom
pub const MAX_ATOM_CHARACTERS: usize = 255;

/// Atom table error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomError {
    /// Atom text exceeds MAX_ATOM_CHARACTERS
    TooLong,
    /// The table reached its configured capacity
    TableFull,
}

/// Atom table mapping symbol text to ids and back
pub struct AtomTable {
    /// Map from atom text to index
    atoms: RwLock<HashMap<Vec<u8>, u32>>,
    /// Reverse map from index to atom text
    index_to_name: RwLock<Vec<Vec<u8>>>,
    /// Maximum number of atoms
    limit: usize,
}

impl AtomTable {
    /// Create a new atom table with the given capacity limit
    pub fn new(limit: usize) -> Self {
        Self {
            atoms: RwLock::new(HashMap::new()),
            index_to_name: RwLock::new(Vec::new()),
            limit,
        }
    }

    /// Get or create an atom id for the given text
    ///
    /// # Arguments
    /// * `name` - Atom text bytes
    ///
    /// # Returns
    /// * `Ok(u32)` - The atom id
    /// * `Err(AtomError::TooLong)` - Text exceeds the per-atom byte limit
    /// * `Err(AtomError::TableFull)` - The table is at capacity
    pub fn intern(&self, name: &[u8]) -> Result<u32, AtomError> {
        if name.len() > MAX_ATOM_CHARACTERS {
            return Err(AtomError::TooLong);
        }

        {
            let atoms = self.atoms.read().unwrap();
            if let Some(&index) = atoms.get(name) {
                return Ok(index);
            }
        }

        let mut atoms = self.atoms.write().unwrap();
        let mut index_to_name = self.index_to_name.write().unwrap();

        // Re-check under the write lock; another thread may have won.
        if let Some(&index) = atoms.get(name) {
            return Ok(index);
        }
        if index_to_name.len() >= self.limit {
            return Err(AtomError::TableFull);
        }

        let index = index_to_name.len() as u32;
        atoms.insert(name.to_vec(), index);
        index_to_name.push(name.to_vec());
        Ok(index)
    }

    /// Look up an atom id without creating it
    pub fn get(&self, name: &[u8]) -> Option<u32> {
        self.atoms.read().unwrap().get(name).copied()
    }

    /// Text of the atom with the given id
    pub fn text(&self, index: u32) -> Option<Vec<u8>> {
        self.index_to_name
            .read()
            .unwrap()
            .get(index as usize)
            .cloned()
    }

    /// Byte length of the atom with the given id, without copying the text
    pub fn text_len(&self, index: u32) -> Option<usize> {
        self.index_to_name
            .read()
            .unwrap()
            .get(index as usize)
            .map(|name| name.len())
    }

    /// Number of atoms currently in the table
    pub fn len(&self) -> usize {
        self.index_to_name.read().unwrap().len()
    }

    /// True when the table holds no atoms
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
