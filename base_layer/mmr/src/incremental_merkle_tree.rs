// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::fmt;

use serde::{Deserialize, Serialize};
use unirep_common_types::FieldElement;
use unirep_hashing::FieldHasher;

use crate::error::MerkleTreeError;

/// Leaf indices are `u64` and the capacity `2^depth` must fit one.
pub const MAX_INCREMENTAL_TREE_DEPTH: usize = 32;

/// An authentication path for one leaf of an [`IncrementalMerkleTree`].
///
/// `indices[h]` is 1 when the path node at height `h` is a right child, in which case `path_elements[h]` is its left
/// sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub path_elements: Vec<FieldElement>,
    pub indices: Vec<u8>,
}

impl MerklePath {
    pub fn compute_root<H: FieldHasher>(&self, hasher: &H, leaf: FieldElement) -> FieldElement {
        self.path_elements
            .iter()
            .zip(&self.indices)
            .fold(leaf, |current, (sibling, is_right)| {
                if *is_right == 0 {
                    hasher.hash_left_right(current, *sibling)
                } else {
                    hasher.hash_left_right(*sibling, current)
                }
            })
    }

    #[must_use = "Must use the result of the proof verification"]
    pub fn verify<H: FieldHasher>(&self, hasher: &H, leaf: FieldElement, root: &FieldElement) -> bool {
        self.path_elements.len() == self.indices.len() && self.compute_root(hasher, leaf) == *root
    }

    /// The leaf index this path was generated for.
    pub fn leaf_index(&self) -> u64 {
        self.indices
            .iter()
            .enumerate()
            .fold(0u64, |acc, (h, bit)| acc | (u64::from(*bit & 1) << h))
    }
}

/// An append-only binary Merkle tree of fixed depth. Leaves are filled from index 0 and every unfilled leaf holds the
/// tree's zero value.
#[derive(Clone)]
pub struct IncrementalMerkleTree<H> {
    depth: usize,
    zeros: Vec<FieldElement>,
    // layers[0] are the leaves; layers[h] holds the populated prefix of row h
    layers: Vec<Vec<FieldElement>>,
    hasher: H,
}

impl<H: FieldHasher> IncrementalMerkleTree<H> {
    pub fn new(depth: usize, zero_value: FieldElement, hasher: H) -> Result<Self, MerkleTreeError> {
        if depth == 0 || depth > MAX_INCREMENTAL_TREE_DEPTH {
            return Err(MerkleTreeError::InvalidDepth {
                depth,
                max: MAX_INCREMENTAL_TREE_DEPTH,
            });
        }
        let mut zeros = Vec::with_capacity(depth + 1);
        zeros.push(zero_value);
        for h in 0..depth {
            let below = zeros[h];
            zeros.push(hasher.hash_left_right(below, below));
        }
        Ok(Self {
            depth,
            zeros,
            layers: vec![Vec::new(); depth + 1],
            hasher,
        })
    }

    /// Builds a tree and inserts `leaves` in order.
    pub fn from_leaves<I>(depth: usize, zero_value: FieldElement, hasher: H, leaves: I) -> Result<Self, MerkleTreeError>
    where I: IntoIterator<Item = FieldElement> {
        let mut tree = Self::new(depth, zero_value, hasher)?;
        for leaf in leaves {
            tree.insert(leaf)?;
        }
        Ok(tree)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn len(&self) -> u64 {
        self.layers[0].len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    pub fn zero_value(&self) -> FieldElement {
        self.zeros[0]
    }

    pub fn leaves(&self) -> &[FieldElement] {
        &self.layers[0]
    }

    pub fn root(&self) -> FieldElement {
        self.layers[self.depth].first().copied().unwrap_or(self.zeros[self.depth])
    }

    /// Appends a leaf and returns its index.
    pub fn insert(&mut self, leaf: FieldElement) -> Result<u64, MerkleTreeError> {
        let capacity = self.capacity();
        let index = self.len();
        if index >= capacity {
            return Err(MerkleTreeError::TreeFull { capacity });
        }
        let mut pos = index as usize;
        let mut current = leaf;
        self.set_node(0, pos, current);
        for h in 0..self.depth {
            current = if pos % 2 == 1 {
                self.hasher.hash_left_right(self.layers[h][pos - 1], current)
            } else {
                self.hasher.hash_left_right(current, self.zeros[h])
            };
            pos /= 2;
            self.set_node(h + 1, pos, current);
        }
        Ok(index)
    }

    /// Returns the authentication path of the leaf at `index`. Indices past the last inserted leaf are allowed as
    /// long as they are within capacity; they prove the zero value.
    pub fn gen_merkle_path(&self, index: u64) -> Result<MerklePath, MerkleTreeError> {
        let capacity = self.capacity();
        if index >= capacity {
            return Err(MerkleTreeError::IndexOutOfRange { index, capacity });
        }
        let mut pos = index as usize;
        let mut path_elements = Vec::with_capacity(self.depth);
        let mut indices = Vec::with_capacity(self.depth);
        for h in 0..self.depth {
            let sibling = pos ^ 1;
            path_elements.push(self.layers[h].get(sibling).copied().unwrap_or(self.zeros[h]));
            indices.push((pos & 1) as u8);
            pos /= 2;
        }
        Ok(MerklePath { path_elements, indices })
    }

    pub fn verify_merkle_path(&self, leaf: FieldElement, path: &MerklePath) -> bool {
        path.path_elements.len() == self.depth && path.verify(&self.hasher, leaf, &self.root())
    }

    fn set_node(&mut self, height: usize, pos: usize, value: FieldElement) {
        let row = &mut self.layers[height];
        if pos < row.len() {
            row[pos] = value;
        } else {
            // Rows only ever grow by one, since leaves are appended in order
            row.push(value);
        }
    }
}

impl<H> fmt::Debug for IncrementalMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalMerkleTree")
            .field("depth", &self.depth)
            .field("len", &self.layers[0].len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use unirep_hashing::Blake2bFieldHasher;

    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from(v)
    }

    #[test]
    fn empty_root_is_zero_tower() {
        let hasher = Blake2bFieldHasher::default();
        let tree = IncrementalMerkleTree::new(2, fe(7), hasher.clone()).unwrap();
        let h1 = hasher.hash_left_right(fe(7), fe(7));
        assert_eq!(tree.root(), hasher.hash_left_right(h1, h1));
        assert!(tree.is_empty());
        assert_eq!(tree.capacity(), 4);
    }

    #[test]
    fn root_matches_hand_computation() {
        let hasher = Blake2bFieldHasher::default();
        let z = FieldElement::ZERO;
        let tree = IncrementalMerkleTree::from_leaves(2, z, hasher.clone(), vec![fe(1), fe(2), fe(3)]).unwrap();
        let left = hasher.hash_left_right(fe(1), fe(2));
        let right = hasher.hash_left_right(fe(3), z);
        assert_eq!(tree.root(), hasher.hash_left_right(left, right));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.leaves(), &[fe(1), fe(2), fe(3)]);
    }

    #[test]
    fn fills_up() {
        let mut tree = IncrementalMerkleTree::new(2, FieldElement::ZERO, Blake2bFieldHasher::default()).unwrap();
        for i in 0..4 {
            assert_eq!(tree.insert(fe(i + 1)).unwrap(), i);
        }
        assert_eq!(tree.insert(fe(5)).unwrap_err(), MerkleTreeError::TreeFull { capacity: 4 });
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn paths_verify() {
        let hasher = Blake2bFieldHasher::default();
        let leaves: Vec<_> = (10..17).map(fe).collect();
        let tree = IncrementalMerkleTree::from_leaves(4, FieldElement::ZERO, hasher.clone(), leaves.clone()).unwrap();
        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.gen_merkle_path(i as u64).unwrap();
            assert_eq!(path.leaf_index(), i as u64);
            assert!(tree.verify_merkle_path(*leaf, &path));
            assert!(!tree.verify_merkle_path(fe(99), &path));
        }
        // An unfilled slot proves the zero value
        let path = tree.gen_merkle_path(12).unwrap();
        assert!(path.verify(&hasher, FieldElement::ZERO, &tree.root()));
        assert_eq!(
            tree.gen_merkle_path(16).unwrap_err(),
            MerkleTreeError::IndexOutOfRange { index: 16, capacity: 16 }
        );
    }

    #[test]
    fn old_paths_go_stale_after_insert() {
        let hasher = Blake2bFieldHasher::default();
        let mut tree = IncrementalMerkleTree::new(3, FieldElement::ZERO, hasher).unwrap();
        tree.insert(fe(1)).unwrap();
        let path = tree.gen_merkle_path(0).unwrap();
        assert!(tree.verify_merkle_path(fe(1), &path));
        tree.insert(fe(2)).unwrap();
        assert!(!tree.verify_merkle_path(fe(1), &path));
        assert!(tree.verify_merkle_path(fe(1), &tree.gen_merkle_path(0).unwrap()));
    }

    #[test]
    fn rejects_bad_depths() {
        let hasher = Blake2bFieldHasher::default();
        assert!(IncrementalMerkleTree::new(0, FieldElement::ZERO, hasher.clone()).is_err());
        assert!(IncrementalMerkleTree::new(33, FieldElement::ZERO, hasher.clone()).is_err());
        assert!(IncrementalMerkleTree::new(32, FieldElement::ZERO, hasher).is_ok());
    }

    #[test]
    fn path_serializes_with_decimal_strings() {
        let path = MerklePath {
            path_elements: vec![fe(3)],
            indices: vec![1],
        };
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"{"path_elements":["3"],"indices":[1]}"#);
    }
}
