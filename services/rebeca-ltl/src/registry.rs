//! Atomic proposition registry
//!
//! Interns proposition names to dense indices for one translation batch. The
//! registry is an explicit context: whoever owns the batch owns the registry, and
//! two batches that must not share indices simply use two registries.

use std::collections::HashMap;

/// Name → index interning table.
///
/// Indices are assigned in first-seen order starting at 0. `names[i]` is always
/// the name interned at index `i`, so the table has no holes by construction.
#[derive(Debug, Clone, Default)]
pub struct PropositionRegistry {
    indices: HashMap<String, usize>,
    names: Vec<String>,
}

impl PropositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, registering it first if it is new to this batch
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(index) = self.indices.get(name) {
            return *index;
        }

        let index = self.names.len();
        self.indices.insert(name.to_string(), index);
        self.names.push(name.to_string());
        index
    }

    /// Index of `name` if it has been interned
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    /// Forget every proposition; the next `intern` returns 0
    pub fn reset(&mut self) {
        self.indices.clear();
        self.names.clear();
    }

    /// Names in index order, as of now
    pub fn snapshot(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Next free index, equal to the number of interned names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
