// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Builders for protocol states and users shared by the integration tests.

use unirep_common_types::{
    types::{Epoch, EpochKey},
    FieldElement,
};
use unirep_core::{
    attestation::Attestation,
    consensus::ProtocolConstants,
    derivation::gen_epoch_key,
    identity::Identity,
    protocol_state::EpochTransitionReport,
    ProtocolState,
};
use unirep_hashing::FieldHasher;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fe(v: u64) -> FieldElement {
    FieldElement::from(v)
}

pub fn attestation(attester: u64, pos: u64, neg: u64) -> Attestation {
    Attestation::new(fe(attester), fe(pos), fe(neg), FieldElement::ZERO, false)
}

pub fn identity(seed: u64) -> Identity {
    Identity::new(fe(seed), fe(seed.wrapping_mul(31).wrapping_add(7)))
}

/// A state with the small local tree sizes: GST depth 4, user state tree depth 4, 2 nonces and 6 attestation slots.
pub fn local_state() -> ProtocolState {
    ProtocolState::new(ProtocolConstants::local()).unwrap()
}

/// The leaf a fresh user's sign up carries.
pub fn sign_up_leaf(state: &ProtocolState, identity: &Identity) -> FieldElement {
    let hasher = state.hasher();
    hasher.hash_left_right(identity.commitment(hasher), state.empty_user_state_root())
}

pub fn sign_up(state: &mut ProtocolState, identity: &Identity) -> u64 {
    let leaf = sign_up_leaf(state, identity);
    let epoch = state.current_epoch();
    state.sign_up(epoch, leaf).unwrap()
}

pub fn epoch_key(state: &ProtocolState, identity: &Identity, epoch: Epoch, nonce: usize) -> EpochKey {
    gen_epoch_key(
        state.hasher(),
        &identity.identity_nullifier,
        epoch,
        nonce,
        state.constants().epoch_tree_depth(),
    )
}

/// Seals the current epoch with the hashchains of everything attested in it.
pub fn seal(state: &mut ProtocolState) -> EpochTransitionReport {
    let leaves = state.gen_epoch_tree_leaves();
    let epoch = state.current_epoch();
    state.epoch_transition(epoch, leaves).unwrap()
}
