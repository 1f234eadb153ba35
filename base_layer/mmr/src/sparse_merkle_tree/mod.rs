// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Sparse Merkle trees
//!
//! A sparse Merkle tree is a complete binary tree of fixed depth `d` over `2^d` leaves, where almost every leaf holds
//! the same default value. Instead of materialising the whole tree, only nodes on populated paths are stored. The
//! hash of an empty subtree of height `h` is the same everywhere, so it is computed once per tree:
//!
//! ```text
//! empty[0]     = default_leaf
//! empty[h + 1] = hash_left_right(empty[h], empty[h])
//! ```
//!
//! A leaf key `k` sits at position `k` of the bottom row. Walking up, bit `h` of the key says whether the node at
//! height `h` is a left (0) or right (1) child. A Merkle proof is the list of `d` sibling hashes from the leaf level
//! upwards, and never needs the key's own neighbours to exist in the store.
//!
//! # Example
//!
//! ```rust
//! use unirep_common_types::FieldElement;
//! use unirep_hashing::Blake2bFieldHasher;
//! use unirep_mmr::sparse_merkle_tree::{compute_root, SparseMerkleTree};
//!
//! let hasher = Blake2bFieldHasher::default();
//! let mut tree = SparseMerkleTree::new(80, FieldElement::ZERO, hasher.clone()).unwrap();
//! let empty_root = tree.get_root_hash();
//!
//! let key = FieldElement::from(1234u64);
//! tree.update(&key, FieldElement::ONE).unwrap();
//! assert_ne!(tree.get_root_hash(), empty_root);
//!
//! let siblings = tree.get_merkle_proof(&key).unwrap();
//! assert_eq!(siblings.len(), 80);
//! assert_eq!(compute_root(&hasher, &key, FieldElement::ONE, &siblings), tree.get_root_hash());
//! ```

mod bit_utils;
pub use bit_utils::{traverse_direction, TraverseDirection};

mod proofs;
pub use proofs::{compute_root, verify_merkle_proof};

mod tree;
pub use tree::{SparseMerkleTree, MAX_SMT_DEPTH};
