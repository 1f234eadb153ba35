// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use thiserror::Error;
use unirep_common::ConfigurationError;
use unirep_common_types::types::{AttesterId, Epoch, EpochKey, Nullifier};
use unirep_mmr::MerkleTreeError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolStateError {
    #[error("Epoch {actual} is not the current epoch {expected}")]
    InvalidEpoch { expected: Epoch, actual: Epoch },
    #[error("Nullifier {0} has already been recorded")]
    NullifierReplay(Nullifier),
    #[error("Nullifier {0} appears more than once in the same transition")]
    DuplicateNullifierInBatch(Nullifier),
    #[error("Nullifier {nullifier} does not fit in a nullifier tree of depth {depth}")]
    NullifierOutOfRange { nullifier: Nullifier, depth: usize },
    #[error("The global state tree of epoch {epoch} already holds the maximum of {max_users} leaves")]
    GlobalStateTreeFull { epoch: Epoch, max_users: u64 },
    #[error("Epoch key {epoch_key} does not fit in an epoch tree of depth {depth}")]
    EpochKeyOutOfRange { epoch_key: EpochKey, depth: usize },
    #[error("Epoch key {0} belongs to a sealed epoch")]
    EpochKeySealed(EpochKey),
    #[error("Epoch key {epoch_key} already has the maximum of {max} attestations")]
    TooManyAttestations { epoch_key: EpochKey, max: usize },
    #[error("Attester id {attester_id} must be in (0, 2^{depth})")]
    InvalidAttesterId { attester_id: AttesterId, depth: usize },
    #[error("Invalid protocol constants: {0}")]
    InvalidConstants(#[from] ConfigurationError),
    #[error("Snapshot is inconsistent: {0}")]
    InvalidSnapshot(String),
    #[error("Merkle tree error: {0}")]
    MerkleTreeError(#[from] MerkleTreeError),
}
