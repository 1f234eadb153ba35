// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Merkle trees over BN254 field elements.
//!
//! * [`SparseMerkleTree`] is a fixed-depth key/value tree over a key space of up to 2^254 keys. Only populated paths
//!   are stored; every untouched subtree hashes to a precomputed "empty" value derived from the tree's default leaf.
//!   It backs the epoch tree, the nullifier tree and the per-user reputation tree.
//! * [`IncrementalMerkleTree`] is a fixed-depth, append-only tree filled from the left, with unused leaves set to a
//!   zero value. It backs the per-epoch global state tree.
//!
//! Both trees hash internal nodes with the two-input [`FieldHasher::hash_left_right`] of the supplied hasher, left
//! child first.
//!
//! [`FieldHasher::hash_left_right`]: unirep_hashing::FieldHasher::hash_left_right

mod backend;
pub use backend::{NodeIndex, NodeStore};

mod error;
pub use error::MerkleTreeError;

mod incremental_merkle_tree;
pub use incremental_merkle_tree::{IncrementalMerkleTree, MerklePath, MAX_INCREMENTAL_TREE_DEPTH};

pub mod sparse_merkle_tree;
pub use sparse_merkle_tree::{SparseMerkleTree, MAX_SMT_DEPTH};
