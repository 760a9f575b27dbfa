// THEORY:
// A growable union-find forest over component labels. Slot `n` holds the parent of
// label `n`, and a parent of 0 marks a root. Label 0 itself is reserved for
// background and is never handed out, so slot 0 is a placeholder.
//
// The forest only ever grows: `make_set` appends a new root, and `attach` hangs one
// root under a *different* root. Chains therefore always end at a root and cannot
// form a cycle. An optional capacity turns the store into a bounded table that
// refuses to allocate past its limit instead of writing out of range.

use crate::core_modules::error::{Result, SegmentError};

/// Union-find over `u32` labels starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisjointSet {
    parents: Vec<u32>,
    capacity: Option<usize>,
}

impl Default for DisjointSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DisjointSet {
    /// An unbounded forest.
    pub fn new() -> Self {
        Self {
            parents: vec![0],
            capacity: None,
        }
    }

    /// A forest that fails with `CapacityExceeded` once `capacity` labels exist.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            parents: vec![0],
            capacity: Some(capacity),
        }
    }

    /// Number of labels handed out so far.
    pub fn label_count(&self) -> usize {
        self.parents.len() - 1
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Allocates the next label as a singleton root.
    pub fn make_set(&mut self) -> Result<u32> {
        if let Some(capacity) = self.capacity {
            if self.label_count() >= capacity {
                return Err(SegmentError::CapacityExceeded { capacity });
            }
        }
        let label = u32::try_from(self.parents.len()).map_err(|_| SegmentError::CapacityExceeded {
            capacity: u32::MAX as usize,
        })?;
        self.parents.push(0);
        Ok(label)
    }

    /// Walks parent links up to the root of `label`.
    pub fn find(&self, mut label: u32) -> u32 {
        while self.parents[label as usize] != 0 {
            label = self.parents[label as usize];
        }
        label
    }

    /// Merges the set containing `from` into the set containing `into`.
    /// Returns false when both already share a root.
    pub fn attach(&mut self, from: u32, into: u32) -> bool {
        let from_root = self.find(from);
        let into_root = self.find(into);
        if from_root == into_root {
            return false;
        }
        self.parents[from_root as usize] = into_root;
        true
    }

    pub fn is_root(&self, label: u32) -> bool {
        self.parents[label as usize] == 0
    }

    /// Number of distinct roots among allocated labels.
    pub fn root_count(&self) -> usize {
        (1..self.parents.len()).filter(|&l| self.parents[l] == 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_start_at_one_and_grow() {
        let mut sets = DisjointSet::new();
        assert_eq!(sets.make_set().unwrap(), 1);
        assert_eq!(sets.make_set().unwrap(), 2);
        assert_eq!(sets.make_set().unwrap(), 3);
        assert_eq!(sets.label_count(), 3);
        assert_eq!(sets.root_count(), 3);
        assert_eq!(sets.find(2), 2);
    }

    #[test]
    fn attach_hangs_source_root_under_target_root() {
        let mut sets = DisjointSet::new();
        let a = sets.make_set().unwrap();
        let b = sets.make_set().unwrap();
        let c = sets.make_set().unwrap();

        assert!(sets.attach(a, b));
        assert_eq!(sets.find(a), b);
        assert!(sets.attach(c, a));
        assert_eq!(sets.find(c), b);
        assert!(sets.is_root(b));
        assert!(!sets.is_root(a));
        assert_eq!(sets.root_count(), 1);

        // Already merged.
        assert!(!sets.attach(a, c));
    }

    #[test]
    fn grows_past_the_old_fixed_table_size() {
        let mut sets = DisjointSet::new();
        for _ in 0..5000 {
            sets.make_set().unwrap();
        }
        assert_eq!(sets.label_count(), 5000);
        assert_eq!(sets.find(4999), 4999);
    }

    #[test]
    fn bounded_store_refuses_extra_labels() {
        let mut sets = DisjointSet::bounded(2);
        sets.make_set().unwrap();
        sets.make_set().unwrap();
        assert_eq!(sets.make_set(), Err(SegmentError::CapacityExceeded { capacity: 2 }));
        assert_eq!(sets.label_count(), 2);
    }
}
