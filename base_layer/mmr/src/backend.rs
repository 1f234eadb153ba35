// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{collections::HashMap, convert::Infallible};

use primitive_types::U256;
use unirep_common_types::FieldElement;

/// Position of a node in a sparse Merkle tree. Leaves are at height 0; the node at `(height, index)` covers leaf keys
/// `index * 2^height .. (index + 1) * 2^height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex {
    pub height: usize,
    pub index: U256,
}

impl NodeIndex {
    pub fn new(height: usize, index: U256) -> Self {
        Self { height, index }
    }

    pub fn sibling(&self) -> Self {
        Self {
            height: self.height,
            index: self.index ^ U256::one(),
        }
    }

    pub fn parent(&self) -> Self {
        Self {
            height: self.height + 1,
            index: self.index >> 1usize,
        }
    }

    pub fn is_right_child(&self) -> bool {
        self.index.bit(0)
    }
}

/// A trait describing where the populated nodes of a sparse Merkle tree live, without imposing any specific details on
/// how this is actually done. Nodes that hash to the empty value for their height are never stored.
///
/// The contract is synchronous: each call completes before the next one is issued, and a tree never interleaves
/// calls from two mutations.
pub trait NodeStore {
    type Error: std::error::Error;

    /// Returns the number of stored nodes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the node hash at the given position, or `None` if the position holds an empty subtree
    fn get_node(&self, index: &NodeIndex) -> Result<Option<FieldElement>, Self::Error>;

    /// Store (or overwrite) the node hash at the given position
    fn insert_node(&mut self, index: NodeIndex, hash: FieldElement) -> Result<(), Self::Error>;

    /// Forget the node at the given position, so that it reads as an empty subtree again
    fn remove_node(&mut self, index: &NodeIndex) -> Result<(), Self::Error>;
}

impl NodeStore for HashMap<NodeIndex, FieldElement> {
    type Error = Infallible;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn get_node(&self, index: &NodeIndex) -> Result<Option<FieldElement>, Self::Error> {
        Ok(self.get(index).copied())
    }

    fn insert_node(&mut self, index: NodeIndex, hash: FieldElement) -> Result<(), Self::Error> {
        self.insert(index, hash);
        Ok(())
    }

    fn remove_node(&mut self, index: &NodeIndex) -> Result<(), Self::Error> {
        self.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn node_navigation() {
        let node = NodeIndex::new(0, U256::from(5u64));
        assert!(node.is_right_child());
        assert_eq!(node.sibling(), NodeIndex::new(0, U256::from(4u64)));
        assert_eq!(node.parent(), NodeIndex::new(1, U256::from(2u64)));
        assert!(!node.parent().is_right_child());
        assert_eq!(node.sibling().parent(), node.parent());
    }

    #[test]
    fn hashmap_store() {
        let mut store = HashMap::<NodeIndex, FieldElement>::new();
        assert!(NodeStore::is_empty(&store));
        let idx = NodeIndex::new(3, U256::from(1u64));
        store.insert_node(idx, FieldElement::ONE).unwrap();
        assert_eq!(store.get_node(&idx).unwrap(), Some(FieldElement::ONE));
        assert_eq!(NodeStore::len(&store), 1);
        store.remove_node(&idx).unwrap();
        assert_eq!(store.get_node(&idx).unwrap(), None);
    }
}
