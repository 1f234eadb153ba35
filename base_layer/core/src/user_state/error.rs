// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use primitive_types::U256;
use thiserror::Error;
use unirep_common_types::types::{AttesterId, Epoch, Nullifier};
use unirep_mmr::MerkleTreeError;

use crate::protocol_state::ProtocolStateError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserStateError {
    #[error("User has not signed up yet")]
    NotSignedUp,
    #[error("User has already signed up")]
    AlreadySignedUp,
    #[error("User has signed up but `{0}` is missing")]
    MissingRestoreField(&'static str),
    #[error("The stored commitment does not belong to the identity")]
    CommitmentMismatch,
    #[error("Attester id {attester_id} must be in (0, 2^{depth})")]
    InvalidAttesterId { attester_id: AttesterId, depth: usize },
    #[error("Epoch key nonce {nonce} must be less than {max}")]
    InvalidEpochKeyNonce { nonce: usize, max: usize },
    #[error("Epoch key with nonce {nonce} is already processed, its nullifier is {nullifier}")]
    EpochKeyAlreadyProcessed { nonce: usize, nullifier: Nullifier },
    #[error("Cannot transition from epoch {from} to epoch {to}")]
    InvalidTransitionEpoch { from: Epoch, to: Epoch },
    #[error("Spending {amount} reputation exceeds the per-proof budget of {max}")]
    ReputationBudgetExceeded { amount: u64, max: usize },
    #[error("Reputation nonces up to {required} are needed but only {available} reputation is available")]
    InsufficientReputation { required: U256, available: U256 },
    #[error("Reputation nonces {nonce_starter} + {amount} overflow")]
    ReputationNonceOverflow { nonce_starter: u64, amount: u64 },
    #[error("Graffiti pre-image does not match the graffiti")]
    GraffitiPreImageMismatch,
    #[error("Protocol state error: {0}")]
    ProtocolStateError(#[from] ProtocolStateError),
    #[error("Merkle tree error: {0}")]
    MerkleTreeError(#[from] MerkleTreeError),
}
