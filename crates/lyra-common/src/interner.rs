//! String interning for identifier deduplication.
//!
//! Qualified names, type-parameter names, and parameter names repeat heavily
//! across an analysis session. Interning stores each distinct string once and
//! hands out a small copyable handle (`Atom`) that supports O(1) equality and
//! hashing. The interner is append-only: atoms stay valid for the lifetime of
//! the `Interner` that produced them.

use dashmap::DashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Handle to an interned string.
///
/// Equality and hashing compare the handle only, so two `Atom`s are equal
/// iff they were produced by the same `Interner` for the same string.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// Sentinel for "no string". Never returned by `Interner::intern`.
    pub const INVALID: Self = Self(u32::MAX);
}

/// Thread-safe append-only string interner.
///
/// Writes go through a `DashMap` for deduplication; resolution reads the
/// backing slab under a read lock. Both paths are safe to call from
/// concurrent analysis threads.
pub struct Interner {
    map: DashMap<String, Atom, rustc_hash::FxBuildHasher>,
    strings: RwLock<Vec<String>>,
    next: AtomicU32,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Self {
            map: DashMap::default(),
            strings: RwLock::new(Vec::new()),
            next: AtomicU32::new(0),
        }
    }

    /// Intern a string, returning its stable `Atom`.
    pub fn intern(&self, s: &str) -> Atom {
        if let Some(existing) = self.map.get(s) {
            return *existing;
        }
        // Two threads may race to intern the same new string; the entry API
        // makes the second one observe the first one's atom.
        let entry = self.map.entry(s.to_string()).or_insert_with(|| {
            let id = self.next.fetch_add(1, Ordering::SeqCst);
            let mut strings = self.strings.write().unwrap_or_else(|e| e.into_inner());
            debug_assert_eq!(strings.len(), id as usize);
            strings.push(s.to_string());
            Atom(id)
        });
        *entry
    }

    /// Look up a string without interning it on a miss.
    pub fn get(&self, s: &str) -> Option<Atom> {
        self.map.get(s).map(|entry| *entry)
    }

    /// Resolve an atom back to its string. Returns an owned copy so the
    /// caller never holds the slab lock.
    pub fn resolve(&self, atom: Atom) -> String {
        let strings = self.strings.read().unwrap_or_else(|e| e.into_inner());
        strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| String::from("<unknown-atom>"))
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.next.load(Ordering::SeqCst) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
