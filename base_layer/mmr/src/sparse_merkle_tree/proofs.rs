// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use unirep_common_types::FieldElement;
use unirep_hashing::FieldHasher;

use crate::sparse_merkle_tree::{traverse_direction, TraverseDirection};

/// Recomputes the root of a sparse Merkle tree from a leaf value and its sibling path (leaf level first).
///
/// Works for both membership and non-membership: a non-membership proof is a membership proof of the default leaf.
pub fn compute_root<H: FieldHasher>(
    hasher: &H,
    key: &FieldElement,
    leaf: FieldElement,
    siblings: &[FieldElement],
) -> FieldElement {
    siblings
        .iter()
        .enumerate()
        .fold(leaf, |current, (height, sibling)| match traverse_direction(key, height) {
            TraverseDirection::Left => hasher.hash_left_right(current, *sibling),
            TraverseDirection::Right => hasher.hash_left_right(*sibling, current),
        })
}

/// Checks that `key` holds `leaf` in the tree with the given root.
#[must_use = "Must use the result of the proof verification"]
pub fn verify_merkle_proof<H: FieldHasher>(
    hasher: &H,
    key: &FieldElement,
    leaf: FieldElement,
    siblings: &[FieldElement],
    root: &FieldElement,
) -> bool {
    compute_root(hasher, key, leaf, siblings) == *root
}
