//! Dedupe store
//!
//! Remembers every alert occurrence already emitted. Keys are never evicted
//! and never persisted: a restart forgets them, after which any currently due
//! alert fires once more.

use std::collections::HashSet;

use finwatch_types::DedupeKey;

#[derive(Debug, Default)]
pub struct DedupeStore {
    fired: HashSet<DedupeKey>,
}

impl DedupeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `keys`
    pub fn with_keys(keys: impl IntoIterator<Item = DedupeKey>) -> Self {
        Self {
            fired: keys.into_iter().collect(),
        }
    }

    pub fn contains(&self, key: &DedupeKey) -> bool {
        self.fired.contains(key)
    }

    pub fn record(&mut self, key: DedupeKey) {
        self.fired.insert(key);
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}
