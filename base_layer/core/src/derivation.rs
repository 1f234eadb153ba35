// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Values derived from an identity secret, and the fixed sentinel leaves of the protocol trees.
//!
//! Each derivation must agree bit for bit with the circuits and the on-chain contract, so every one of them goes
//! through the configured [`FieldHasher`] with a fixed input layout:
//!
//! | value | pre-image | truncated to |
//! |---|---|---|
//! | epoch key | `hash5(idNullifier, epoch, nonce, 0, 0)` | epoch tree depth |
//! | attestation nullifier | `hash5(1, idNullifier, attesterId, epoch, epochKey)` | nullifier tree depth |
//! | epoch key nullifier | `hash5(2, idNullifier, epoch, nonce, 0)` | nullifier tree depth |
//! | reputation nullifier | `hash5(3, idNullifier, epoch, nonce, 0)` | nullifier tree depth |

use unirep_common_types::{
    types::{AttesterId, Epoch, EpochKey, Nullifier},
    FieldElement,
};
use unirep_hashing::FieldHasher;

const ATTESTATION_NULLIFIER_DOMAIN: u64 = 1;
const EPOCH_KEY_NULLIFIER_DOMAIN: u64 = 2;
const REPUTATION_NULLIFIER_DOMAIN: u64 = 3;

/// The "does not exist" leaf of the nullifier tree.
pub fn smt_zero_leaf<H: FieldHasher>(hasher: &H) -> FieldElement {
    hasher.hash_left_right(FieldElement::ZERO, FieldElement::ZERO)
}

/// The "used" leaf of the nullifier tree, and the default leaf of the epoch tree.
pub fn smt_one_leaf<H: FieldHasher>(hasher: &H) -> FieldElement {
    hasher.hash_left_right(FieldElement::ONE, FieldElement::ZERO)
}

pub fn gen_epoch_key<H: FieldHasher>(
    hasher: &H,
    identity_nullifier: &FieldElement,
    epoch: Epoch,
    nonce: usize,
    epoch_tree_depth: usize,
) -> EpochKey {
    hasher
        .hash5([
            *identity_nullifier,
            FieldElement::from(epoch),
            FieldElement::from(nonce),
            FieldElement::ZERO,
            FieldElement::ZERO,
        ])
        .modulo_pow2(epoch_tree_depth)
}

pub fn gen_attestation_nullifier<H: FieldHasher>(
    hasher: &H,
    identity_nullifier: &FieldElement,
    attester_id: &AttesterId,
    epoch: Epoch,
    epoch_key: &EpochKey,
    nullifier_tree_depth: usize,
) -> Nullifier {
    hasher
        .hash5([
            FieldElement::from(ATTESTATION_NULLIFIER_DOMAIN),
            *identity_nullifier,
            *attester_id,
            FieldElement::from(epoch),
            *epoch_key,
        ])
        .modulo_pow2(nullifier_tree_depth)
}

pub fn gen_epoch_key_nullifier<H: FieldHasher>(
    hasher: &H,
    identity_nullifier: &FieldElement,
    epoch: Epoch,
    nonce: usize,
    nullifier_tree_depth: usize,
) -> Nullifier {
    nonce_nullifier(
        hasher,
        EPOCH_KEY_NULLIFIER_DOMAIN,
        identity_nullifier,
        epoch,
        FieldElement::from(nonce),
        nullifier_tree_depth,
    )
}

/// The nullifier burnt when one unit of reputation is spent in a reputation proof.
pub fn gen_reputation_nullifier<H: FieldHasher>(
    hasher: &H,
    identity_nullifier: &FieldElement,
    epoch: Epoch,
    nonce: u64,
    nullifier_tree_depth: usize,
) -> Nullifier {
    nonce_nullifier(
        hasher,
        REPUTATION_NULLIFIER_DOMAIN,
        identity_nullifier,
        epoch,
        FieldElement::from(nonce),
        nullifier_tree_depth,
    )
}

fn nonce_nullifier<H: FieldHasher>(
    hasher: &H,
    domain: u64,
    identity_nullifier: &FieldElement,
    epoch: Epoch,
    nonce: FieldElement,
    nullifier_tree_depth: usize,
) -> Nullifier {
    hasher
        .hash5([
            FieldElement::from(domain),
            *identity_nullifier,
            FieldElement::from(epoch),
            nonce,
            FieldElement::ZERO,
        ])
        .modulo_pow2(nullifier_tree_depth)
}
