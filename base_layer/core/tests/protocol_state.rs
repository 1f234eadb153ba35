// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

#[allow(dead_code)]
mod helpers;

use helpers::{attestation, fe, init_logging, local_state};
use quickcheck::{quickcheck, TestResult};
use unirep_common_types::FieldElement;
use unirep_core::{
    attestation::EpochTreeLeaf,
    derivation::smt_one_leaf,
    protocol_state::ProtocolStateSnapshot,
    ProtocolEvent,
    ProtocolState,
    ProtocolStateError,
};
use unirep_hashing::Blake2bFieldHasher;

#[test]
fn empty_epoch_transition() {
    init_logging();
    let mut state = local_state();
    let leaf = fe(1234);
    assert_eq!(state.sign_up(1, leaf).unwrap(), 0);

    let report = state.epoch_transition(1, vec![]).unwrap();
    assert_eq!(report.current_epoch, 2);
    assert_eq!(state.current_epoch(), 2);

    let sentinel = smt_one_leaf(state.hasher());
    let epoch_tree = state.gen_epoch_tree(1).unwrap();
    assert_eq!(epoch_tree.stored_node_count(), 0);
    for key in [fe(0), fe(1), fe(987_654_321)] {
        assert_eq!(state.get_hashchain(&key), sentinel);
        assert_eq!(epoch_tree.get_leaf(&key).unwrap(), sentinel);
    }
    let gst = state.gen_gs_tree(1).unwrap();
    assert_eq!(gst.leaves(), &[leaf]);
    assert_eq!(state.get_num_gst_leaves(2), 0);
}

#[test]
fn epoch_tree_reproduces_sealed_leaves() {
    init_logging();
    let mut state = local_state();
    let leaves = vec![
        EpochTreeLeaf {
            epoch_key: fe(5),
            hashchain_result: fe(500),
        },
        EpochTreeLeaf {
            epoch_key: fe(1 << 40),
            hashchain_result: fe(600),
        },
    ];
    state.epoch_transition(1, leaves.clone()).unwrap();
    let tree = state.gen_epoch_tree(1).unwrap();
    for leaf in &leaves {
        assert_eq!(tree.get_leaf(&leaf.epoch_key).unwrap(), leaf.hashchain_result);
        assert_eq!(state.get_hashchain(&leaf.epoch_key), leaf.hashchain_result);
    }
    assert_eq!(state.get_hashchain(&fe(6)), smt_one_leaf(state.hasher()));
    // Unsealed epochs have an all-default epoch tree
    assert_eq!(
        state.gen_epoch_tree(2).unwrap().get_root_hash(),
        state.gen_epoch_tree(99).unwrap().get_root_hash()
    );
}

#[test]
fn out_of_order_events_fail_fast() {
    let mut state = local_state();
    let events = vec![
        ProtocolEvent::SignUp {
            epoch: 1,
            gst_leaf: fe(1),
        },
        ProtocolEvent::EpochTransition {
            epoch: 1,
            epoch_tree_leaves: vec![],
        },
        ProtocolEvent::SignUp {
            epoch: 1,
            gst_leaf: fe(2),
        },
        ProtocolEvent::SignUp {
            epoch: 2,
            gst_leaf: fe(3),
        },
    ];
    let err = state.replay(&events).unwrap_err();
    assert_eq!(err, ProtocolStateError::InvalidEpoch { expected: 2, actual: 1 });
    assert_eq!(state.get_num_gst_leaves(1), 1);
    assert_eq!(state.get_num_gst_leaves(2), 0);
}

#[test]
fn snapshots_survive_json() {
    let mut state = local_state();
    state.sign_up(1, fe(8)).unwrap();
    state.add_attestation(fe(3), attestation(2, 9, 1)).unwrap();
    state.add_attestation(fe(4), attestation(2, 1, 1)).unwrap();
    let leaves = state.gen_epoch_tree_leaves();
    state.epoch_transition(1, leaves).unwrap();
    state.user_state_transition(2, fe(9), &[fe(21), FieldElement::ZERO]).unwrap();

    let json = serde_json::to_string_pretty(&state.to_snapshot()).unwrap();
    let snapshot: ProtocolStateSnapshot = serde_json::from_str(&json).unwrap();
    let mut restored = ProtocolState::from_snapshot(snapshot, Blake2bFieldHasher::default()).unwrap();
    assert_eq!(
        restored.gen_epoch_tree(1).unwrap().get_root_hash(),
        state.gen_epoch_tree(1).unwrap().get_root_hash()
    );
    assert_eq!(
        restored.gen_nullifier_tree().unwrap().get_root_hash(),
        state.gen_nullifier_tree().unwrap().get_root_hash()
    );
    assert_eq!(restored.get_epoch_attestations(1, &fe(3)), state.get_epoch_attestations(1, &fe(3)));
    assert_eq!(restored.get_epoch_attestations(1, &fe(3)), &[attestation(2, 9, 1)]);
    assert_eq!(
        restored.user_state_transition(2, fe(10), &[fe(21)]),
        Err(ProtocolStateError::NullifierReplay(fe(21)))
    );
}

quickcheck! {
    fn gs_tree_holds_sign_ups_in_order(raw: Vec<u64>) -> TestResult {
        let mut state = local_state();
        let max_users = state.constants().max_users() as usize;
        let leaves: Vec<FieldElement> = raw.into_iter().take(max_users).map(fe).collect();
        for leaf in &leaves {
            state.sign_up(1, *leaf).unwrap();
        }
        let first = state.gen_gs_tree(1).unwrap();
        let second = state.gen_gs_tree(1).unwrap();
        TestResult::from_bool(first.leaves() == leaves.as_slice() && first.root() == second.root())
    }

    fn positive_nullifiers_are_single_use(n: u64, zeros: u8) -> TestResult {
        if n == 0 {
            return TestResult::discard();
        }
        let mut state = local_state();
        for _ in 0..zeros % 8 {
            if state.user_state_transition(1, fe(1), &[FieldElement::ZERO]).is_err() {
                return TestResult::failed();
            }
        }
        let first = state.user_state_transition(1, fe(2), &[fe(n)]);
        let second = state.user_state_transition(1, fe(3), &[fe(n)]);
        TestResult::from_bool(first.is_ok() && second == Err(ProtocolStateError::NullifierReplay(fe(n))))
    }
}
