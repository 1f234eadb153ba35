// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{cell::Cell, collections::HashMap, fmt};

use unirep_common_types::FieldElement;
use unirep_hashing::Blake2bFieldHasher;
use unirep_mmr::{NodeIndex, NodeStore, SparseMerkleTree};

pub type TestSmt = SparseMerkleTree<Blake2bFieldHasher>;

pub fn fe(v: u64) -> FieldElement {
    FieldElement::from(v)
}

pub fn create_smt(depth: usize, leaves: &[(u64, u64)]) -> TestSmt {
    let mut tree = TestSmt::new(depth, FieldElement::ZERO, Blake2bFieldHasher::default()).unwrap();
    for (k, v) in leaves {
        tree.update(&fe(*k), fe(*v)).unwrap();
    }
    tree
}

#[derive(Debug)]
pub struct StoreUnavailable;

impl fmt::Display for StoreUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("store unavailable")
    }
}

impl std::error::Error for StoreUnavailable {}

/// A node store that starts failing every read once `reads_left` hits zero, and fails the single write numbered
/// `failing_write`.
#[derive(Default)]
pub struct FlakyStore {
    pub nodes: HashMap<NodeIndex, FieldElement>,
    pub reads_left: Cell<Option<usize>>,
    pub writes: usize,
    pub failing_write: Option<usize>,
}

impl FlakyStore {
    fn write(&mut self) -> Result<(), StoreUnavailable> {
        let n = self.writes;
        self.writes += 1;
        if self.failing_write == Some(n) {
            return Err(StoreUnavailable);
        }
        Ok(())
    }
}

impl NodeStore for FlakyStore {
    type Error = StoreUnavailable;

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn get_node(&self, index: &NodeIndex) -> Result<Option<FieldElement>, Self::Error> {
        match self.reads_left.get() {
            Some(0) => Err(StoreUnavailable),
            Some(n) => {
                self.reads_left.set(Some(n - 1));
                Ok(self.nodes.get(index).copied())
            },
            None => Ok(self.nodes.get(index).copied()),
        }
    }

    fn insert_node(&mut self, index: NodeIndex, hash: FieldElement) -> Result<(), Self::Error> {
        self.write()?;
        self.nodes.insert(index, hash);
        Ok(())
    }

    fn remove_node(&mut self, index: &NodeIndex) -> Result<(), Self::Error> {
        self.write()?;
        self.nodes.remove(index);
        Ok(())
    }
}
