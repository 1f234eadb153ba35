// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{collections::HashMap, fmt};

use log::*;
use unirep_common_types::FieldElement;
use unirep_hashing::FieldHasher;

use crate::{
    backend::{NodeIndex, NodeStore},
    error::MerkleTreeError,
    sparse_merkle_tree::verify_merkle_proof,
};

const LOG_TARGET: &str = "c::mmr::sparse_merkle_tree";

/// The deepest tree whose keys are all representable as field elements.
pub const MAX_SMT_DEPTH: usize = 254;

/// A fixed-depth sparse Merkle tree of field elements, keyed by field elements smaller than `2^depth`.
///
/// Only nodes that differ from the empty subtree hash of their height are kept in the store, so a fresh tree of any
/// depth costs `depth + 1` hashes to build.
pub struct SparseMerkleTree<H, S = HashMap<NodeIndex, FieldElement>> {
    depth: usize,
    empty_hashes: Vec<FieldElement>,
    root: FieldElement,
    store: S,
    hasher: H,
}

impl<H: FieldHasher> SparseMerkleTree<H> {
    /// Creates an empty in-memory tree in which every leaf holds `default_leaf`.
    pub fn new(depth: usize, default_leaf: FieldElement, hasher: H) -> Result<Self, MerkleTreeError> {
        Self::with_store(depth, default_leaf, hasher, HashMap::new())
    }
}

impl<H, S> SparseMerkleTree<H, S>
where
    H: FieldHasher,
    S: NodeStore,
{
    /// Creates a tree on top of an empty node store.
    pub fn with_store(depth: usize, default_leaf: FieldElement, hasher: H, store: S) -> Result<Self, MerkleTreeError> {
        if depth == 0 || depth > MAX_SMT_DEPTH {
            return Err(MerkleTreeError::InvalidDepth {
                depth,
                max: MAX_SMT_DEPTH,
            });
        }
        let mut empty_hashes = Vec::with_capacity(depth + 1);
        empty_hashes.push(default_leaf);
        for h in 0..depth {
            let below = empty_hashes[h];
            empty_hashes.push(hasher.hash_left_right(below, below));
        }
        let root = empty_hashes[depth];
        Ok(Self {
            depth,
            empty_hashes,
            root,
            store,
            hasher,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn default_leaf(&self) -> FieldElement {
        self.empty_hashes[0]
    }

    /// The hash of an empty subtree of the given height. Heights above the tree depth return the empty root.
    pub fn empty_hash(&self, height: usize) -> FieldElement {
        self.empty_hashes[height.min(self.depth)]
    }

    pub fn get_root_hash(&self) -> FieldElement {
        self.root
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The number of populated (non-empty) nodes, including the root.
    pub fn stored_node_count(&self) -> usize {
        self.store.len()
    }

    /// Returns the leaf stored at `key`, or the default leaf if it was never set.
    pub fn get_leaf(&self, key: &FieldElement) -> Result<FieldElement, MerkleTreeError> {
        self.check_key(key)?;
        let index = NodeIndex::new(0, *key.as_u256());
        self.node_or_empty(&index)
    }

    /// Sets the leaf at `key` to `value` and recomputes every ancestor up to the root.
    ///
    /// All new node hashes, and the nodes they replace, are read before the store is written to, so a key that is out
    /// of range or a store that fails on read leaves the tree unchanged. If a write fails part-way, the nodes already
    /// written are put back before the error is returned.
    pub fn update(&mut self, key: &FieldElement, value: FieldElement) -> Result<FieldElement, MerkleTreeError> {
        self.check_key(key)?;
        let mut writes = Vec::with_capacity(self.depth + 1);
        let mut index = NodeIndex::new(0, *key.as_u256());
        let mut current = value;
        writes.push((index, current));
        for height in 0..self.depth {
            let sibling = self.node_or_empty(&index.sibling())?;
            current = if index.is_right_child() {
                self.hasher.hash_left_right(sibling, current)
            } else {
                self.hasher.hash_left_right(current, sibling)
            };
            index = index.parent();
            debug_assert_eq!(index.height, height + 1);
            writes.push((index, current));
        }

        let previous = writes
            .iter()
            .map(|(node, _)| self.store.get_node(node).map_err(backend_error))
            .collect::<Result<Vec<_>, _>>()?;
        for (applied, (node, hash)) in writes.iter().enumerate() {
            if let Err(e) = self.write_node(*node, *hash) {
                self.restore_nodes(&writes[..applied], &previous[..applied]);
                return Err(backend_error(e));
            }
        }
        self.root = current;
        trace!(
            target: LOG_TARGET,
            "Set leaf {} of depth-{} tree; new root {}",
            key,
            self.depth,
            self.root
        );
        Ok(self.root)
    }

    /// Returns the `depth` sibling hashes on the path from `key` to the root, leaf level first.
    ///
    /// The path is valid for unset keys too, in which case it proves that the key holds the default leaf.
    pub fn get_merkle_proof(&self, key: &FieldElement) -> Result<Vec<FieldElement>, MerkleTreeError> {
        self.check_key(key)?;
        let mut index = NodeIndex::new(0, *key.as_u256());
        let mut siblings = Vec::with_capacity(self.depth);
        for _ in 0..self.depth {
            siblings.push(self.node_or_empty(&index.sibling())?);
            index = index.parent();
        }
        Ok(siblings)
    }

    /// Checks a proof produced by [`get_merkle_proof`](Self::get_merkle_proof) against the current root.
    pub fn verify_merkle_proof(&self, key: &FieldElement, leaf: FieldElement, siblings: &[FieldElement]) -> bool {
        siblings.len() == self.depth && verify_merkle_proof(&self.hasher, key, leaf, siblings, &self.root)
    }

    fn check_key(&self, key: &FieldElement) -> Result<(), MerkleTreeError> {
        if key.fits_in_bits(self.depth) {
            Ok(())
        } else {
            Err(MerkleTreeError::KeyOutOfRange {
                key: *key,
                depth: self.depth,
            })
        }
    }

    fn write_node(&mut self, node: NodeIndex, hash: FieldElement) -> Result<(), S::Error> {
        if hash == self.empty_hashes[node.height] {
            self.store.remove_node(&node)
        } else {
            self.store.insert_node(node, hash)
        }
    }

    /// Puts back the stored state of `nodes` after a failed update.
    fn restore_nodes(&mut self, nodes: &[(NodeIndex, FieldElement)], previous: &[Option<FieldElement>]) {
        for ((node, _), old) in nodes.iter().zip(previous).rev() {
            let result = match old {
                Some(hash) => self.store.insert_node(*node, *hash),
                None => self.store.remove_node(node),
            };
            if let Err(e) = result {
                warn!(
                    target: LOG_TARGET,
                    "Could not restore node at height {} after a failed update: {}", node.height, e
                );
            }
        }
    }

    fn node_or_empty(&self, index: &NodeIndex) -> Result<FieldElement, MerkleTreeError> {
        let stored = self.store.get_node(index).map_err(backend_error)?;
        Ok(stored.unwrap_or(self.empty_hashes[index.height]))
    }
}

impl<H: Clone, S: Clone> Clone for SparseMerkleTree<H, S> {
    fn clone(&self) -> Self {
        Self {
            depth: self.depth,
            empty_hashes: self.empty_hashes.clone(),
            root: self.root,
            store: self.store.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<H, S> fmt::Debug for SparseMerkleTree<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleTree")
            .field("depth", &self.depth)
            .field("root", &self.root)
            .finish()
    }
}

fn backend_error<E: std::error::Error>(e: E) -> MerkleTreeError {
    MerkleTreeError::BackendError(e.to_string())
}
