// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Small builders shared by the unit tests of this crate.

use unirep_common_types::{
    types::{Epoch, EpochKey},
    FieldElement,
};
use unirep_hashing::FieldHasher;

use crate::{
    attestation::Attestation,
    consensus::ProtocolConstants,
    derivation::gen_epoch_key,
    identity::Identity,
    protocol_state::ProtocolState,
};

pub fn fe(v: u64) -> FieldElement {
    FieldElement::from(v)
}

/// A positive-only attestation that leaves graffiti alone.
pub fn att(attester: u64, pos: u64) -> Attestation {
    Attestation::new(fe(attester), fe(pos), FieldElement::ZERO, FieldElement::ZERO, false)
}

/// A fresh state with the small local tree sizes.
pub fn new_state() -> ProtocolState {
    ProtocolState::new(ProtocolConstants::local()).expect("local constants are valid")
}

pub fn identity(seed: u64) -> Identity {
    Identity::new(fe(seed), fe(seed + 1_000))
}

/// Signs `identity` up in the current epoch with an empty user state and returns the leaf index.
pub fn sign_up_user(state: &mut ProtocolState, identity: &Identity) -> u64 {
    let hasher = state.hasher();
    let leaf = hasher.hash_left_right(identity.commitment(hasher), state.empty_user_state_root());
    let epoch = state.current_epoch();
    state.sign_up(epoch, leaf).unwrap()
}

pub fn epoch_key_of(state: &ProtocolState, identity: &Identity, epoch: Epoch, nonce: usize) -> EpochKey {
    gen_epoch_key(
        state.hasher(),
        &identity.identity_nullifier,
        epoch,
        nonce,
        state.constants().epoch_tree_depth(),
    )
}

/// Seals the current epoch the way the contract does.
pub fn seal_epoch(state: &mut ProtocolState) {
    let leaves = state.gen_epoch_tree_leaves();
    let epoch = state.current_epoch();
    state.epoch_transition(epoch, leaves).unwrap();
}
