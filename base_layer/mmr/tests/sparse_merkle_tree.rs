// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

#[allow(dead_code)]
mod support;

use quickcheck::quickcheck;
use support::{create_smt, fe, FlakyStore};
use unirep_common_types::FieldElement;
use unirep_hashing::{Blake2bFieldHasher, FieldHasher};
use unirep_mmr::{sparse_merkle_tree::compute_root, MerkleTreeError, SparseMerkleTree};

#[test]
fn one_leaf_and_zero_leaf_defaults() {
    let hasher = Blake2bFieldHasher::default();
    let zero_leaf = hasher.hash_left_right(FieldElement::ZERO, FieldElement::ZERO);
    let one_leaf = hasher.hash_left_right(FieldElement::ONE, FieldElement::ZERO);
    let mut tree = SparseMerkleTree::new(4, zero_leaf, hasher.clone()).unwrap();
    let empty_root = tree.get_root_hash();
    tree.update(&fe(3), one_leaf).unwrap();
    let proof = tree.get_merkle_proof(&fe(3)).unwrap();
    assert_eq!(compute_root(&hasher, &fe(3), one_leaf, &proof), tree.get_root_hash());
    // The sibling of an untouched leaf is the default leaf, not zero
    assert_eq!(proof[0], zero_leaf);
    tree.update(&fe(3), zero_leaf).unwrap();
    assert_eq!(tree.get_root_hash(), empty_root);
}

#[test]
fn store_errors_are_reported_and_leave_tree_unchanged() {
    let mut tree =
        SparseMerkleTree::with_store(8, FieldElement::ZERO, Blake2bFieldHasher::default(), FlakyStore::default())
            .unwrap();
    tree.update(&fe(1), fe(1)).unwrap();
    let root = tree.get_root_hash();
    let count = tree.stored_node_count();

    // Not enough reads to reach the root
    tree.store().reads_left.set(Some(3));
    match tree.update(&fe(200), fe(9)) {
        Err(MerkleTreeError::BackendError(msg)) => assert_eq!(msg, "store unavailable"),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(tree.get_root_hash(), root);
    assert_eq!(tree.stored_node_count(), count);

    tree.store().reads_left.set(None);
    tree.update(&fe(200), fe(9)).unwrap();
    assert_ne!(tree.get_root_hash(), root);
}

#[test]
fn failed_writes_are_rolled_back() {
    // Every update of a depth-8 tree writes 9 nodes; fail the fourth write of the third update
    let store = FlakyStore {
        failing_write: Some(2 * 9 + 3),
        ..Default::default()
    };
    let mut tree = SparseMerkleTree::with_store(8, FieldElement::ZERO, Blake2bFieldHasher::default(), store).unwrap();
    tree.update(&fe(1), fe(1)).unwrap();
    tree.update(&fe(2), fe(5)).unwrap();
    let root = tree.get_root_hash();
    let nodes = tree.store().nodes.clone();

    match tree.update(&fe(200), fe(9)) {
        Err(MerkleTreeError::BackendError(msg)) => assert_eq!(msg, "store unavailable"),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(tree.get_root_hash(), root);
    assert_eq!(tree.store().nodes, nodes);
    let proof = tree.get_merkle_proof(&fe(2)).unwrap();
    assert!(tree.verify_merkle_proof(&fe(2), fe(5), &proof));

    tree.update(&fe(200), fe(9)).unwrap();
    assert_eq!(tree.get_leaf(&fe(200)).unwrap(), fe(9));
    assert_ne!(tree.get_root_hash(), root);
}

quickcheck! {
    fn every_key_proves_its_leaf(entries: Vec<(u16, u64)>) -> bool {
        let leaves: Vec<(u64, u64)> = entries.iter().map(|(k, v)| (u64::from(*k), *v)).collect();
        let tree = create_smt(16, &leaves);
        let mut last = std::collections::HashMap::new();
        for (k, v) in &leaves {
            last.insert(*k, *v);
        }
        last.iter().all(|(k, v)| {
            let proof = tree.get_merkle_proof(&fe(*k)).unwrap();
            tree.get_leaf(&fe(*k)).unwrap() == fe(*v) && tree.verify_merkle_proof(&fe(*k), fe(*v), &proof)
        })
    }
}
