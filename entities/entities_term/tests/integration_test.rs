//! Integration tests for entities_term
//!
//! Exercises the term model together with the atom table and node registry,
//! the way the codec layers use them.

use std::sync::Arc;

use entities_term::{AtomTable, BigNumber, NodeRegistry, Pid, Reference, Term, TermArena};

#[test]
fn test_atoms_and_terms() {
    let atoms = AtomTable::new(100);
    let ok = atoms.intern(b"ok").unwrap();
    let error = atoms.intern(b"error").unwrap();

    let t = Term::Tuple(vec![Term::Atom(ok), Term::Small(42)]);
    let u = Term::Tuple(vec![Term::Atom(ok), Term::Small(42)]);
    let v = Term::Tuple(vec![Term::Atom(error), Term::Small(42)]);
    assert_eq!(t, u);
    assert_ne!(t, v);
}

#[test]
fn test_external_identity_lifecycle() {
    let atoms = AtomTable::new(100);
    let registry = NodeRegistry::new(atoms.intern(b"this@host").unwrap(), 1);
    let peer = atoms.intern(b"peer@host").unwrap();

    let term = Term::Pid(Pid {
        node: registry.find_or_insert(peer, 2),
        number: 17,
        serial: 0,
    });
    assert_eq!(registry.live_count(), 1);

    let copy = term.clone();
    drop(term);
    // The clone still pins the descriptor
    assert_eq!(registry.live_count(), 1);
    drop(copy);
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn test_reference_equality_across_lookups() {
    let atoms = AtomTable::new(100);
    let registry = NodeRegistry::new(atoms.intern(b"this@host").unwrap(), 1);
    let peer = atoms.intern(b"peer@host").unwrap();

    let a = Term::Reference(Reference {
        node: registry.find_or_insert(peer, 1),
        numbers: vec![1, 2, 3],
    });
    let b = Term::Reference(Reference {
        node: registry.find_or_insert(peer, 1),
        numbers: vec![1, 2, 3],
    });
    assert_eq!(a, b);

    if let (Term::Reference(ra), Term::Reference(rb)) = (&a, &b) {
        assert!(Arc::ptr_eq(&ra.node, &rb.node));
    }
}

#[test]
fn test_big_normalization_into_terms() {
    // Exactly i64::MAX fits the word, one more does not.
    let max = BigNumber::from_i64(i64::MAX);
    assert_eq!(Term::from_big(max), Term::Small(i64::MAX));

    let mut digits = BigNumber::from_i64(i64::MAX).digit_bytes();
    digits.push(1);
    let over = BigNumber::from_digit_bytes(false, &digits);
    assert!(matches!(Term::from_big(over), Term::Big(_)));
}

#[test]
fn test_arena_accounting() {
    let mut arena = TermArena::with_capacity(8);
    arena.allocate(3).unwrap();
    arena.allocate(5).unwrap();
    assert_eq!(arena.used(), arena.capacity());
    assert!(arena.allocate(1).is_err());
}
