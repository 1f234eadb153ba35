// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! # Global protocol state
//!
//! An in-memory mirror of the enrollment and attestation bookkeeping the Unirep contract keeps on chain. It is a
//! replay machine: it accepts the four mutators in the order the chain emitted them and rejects anything that does
//! not apply to the current epoch.
//!
//! Trees are never held across calls. Each epoch keeps its raw leaf lists in an [`EpochRecord`], and the global state
//! tree, the epoch tree and the nullifier tree are rebuilt from those lists on request. Old epochs are never pruned,
//! since historical proofs must stay reconstructible.
//!
//! Every mutator validates its whole input before it touches stored data, so a failed call leaves the state exactly
//! as it was.

mod error;
pub use error::ProtocolStateError;

mod events;
pub use events::ProtocolEvent;

mod snapshot;
pub use snapshot::{EpochKeyAttestations, ProtocolStateSnapshot};

use std::collections::{HashMap, HashSet};

use log::*;
use serde::{Deserialize, Serialize};
use unirep_common_types::{
    types::{Epoch, EpochKey, Nullifier},
    FieldElement,
};
use unirep_hashing::{Blake2bFieldHasher, FieldHasher};
use unirep_mmr::{IncrementalMerkleTree, SparseMerkleTree};

use crate::{
    attestation::{Attestation, AttestationHashchain, EpochTreeLeaf},
    consensus::ProtocolConstants,
    derivation::{smt_one_leaf, smt_zero_leaf},
    reputation::Reputation,
};

const LOG_TARGET: &str = "c::unirep::protocol_state";

/// The raw data of one epoch. Trees are derived from it on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochRecord {
    /// Global state tree leaves in arrival order
    pub gst_leaves: Vec<FieldElement>,
    /// Epoch keys that received attestations during this epoch, in order of their first attestation
    pub attested_epoch_keys: Vec<EpochKey>,
    /// The epoch tree leaves, set when the epoch is sealed
    pub epoch_tree_leaves: Option<Vec<EpochTreeLeaf>>,
}

impl EpochRecord {
    pub fn is_sealed(&self) -> bool {
        self.epoch_tree_leaves.is_some()
    }
}

/// An epoch key that was sealed a second time. The first hashchain is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEpochKey {
    pub epoch: Epoch,
    pub epoch_key: EpochKey,
    pub ignored_hashchain_result: FieldElement,
}

/// The outcome of sealing an epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochTransitionReport {
    pub sealed_epoch: Epoch,
    pub current_epoch: Epoch,
    pub num_epoch_tree_leaves: usize,
    /// Epoch keys whose hashchain was already known. They do not abort the transition.
    pub duplicate_epoch_keys: Vec<EpochKey>,
}

pub struct ProtocolState<H = Blake2bFieldHasher> {
    constants: ProtocolConstants,
    hasher: H,
    current_epoch: Epoch,
    // epochs[e - 1] is epoch e; the last record is the live epoch
    epochs: Vec<EpochRecord>,
    // Attestations are scoped to the epoch they arrived in
    attestations: HashMap<(Epoch, EpochKey), Vec<Attestation>>,
    hashchains: HashMap<EpochKey, FieldElement>,
    nullifiers: Vec<Nullifier>,
    nullifier_set: HashSet<Nullifier>,
    duplicate_epoch_keys: Vec<DuplicateEpochKey>,
    empty_user_state_root: FieldElement,
    default_gst_leaf: FieldElement,
}

impl<H: FieldHasher> ProtocolState<H> {
    /// A fresh state at epoch 1, using the default-constructed hasher.
    pub fn new(constants: ProtocolConstants) -> Result<Self, ProtocolStateError> {
        Self::with_hasher(constants, H::default())
    }

    pub fn with_hasher(constants: ProtocolConstants, hasher: H) -> Result<Self, ProtocolStateError> {
        constants.validate()?;
        let empty_user_state_root = SparseMerkleTree::new(
            constants.user_state_tree_depth(),
            Reputation::default().hash(&hasher),
            hasher.clone(),
        )?
        .get_root_hash();
        let default_gst_leaf = hasher.hash_left_right(FieldElement::ZERO, empty_user_state_root);
        Ok(Self {
            constants,
            hasher,
            current_epoch: 1,
            epochs: vec![EpochRecord::default()],
            attestations: HashMap::new(),
            hashchains: HashMap::new(),
            nullifiers: Vec::new(),
            nullifier_set: HashSet::new(),
            duplicate_epoch_keys: Vec::new(),
            empty_user_state_root,
            default_gst_leaf,
        })
    }

    pub fn constants(&self) -> &ProtocolConstants {
        &self.constants
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn current_epoch(&self) -> Epoch {
        self.current_epoch
    }

    /// The root of a user state tree with no attestations.
    pub fn empty_user_state_root(&self) -> FieldElement {
        self.empty_user_state_root
    }

    /// The zero value of every global state tree: `hash_left_right(0, emptyUserStateRoot)`.
    pub fn default_gst_leaf(&self) -> FieldElement {
        self.default_gst_leaf
    }

    pub fn epoch_record(&self, epoch: Epoch) -> Option<&EpochRecord> {
        let index = usize::try_from(epoch.checked_sub(1)?).ok()?;
        self.epochs.get(index)
    }

    pub fn get_num_gst_leaves(&self, epoch: Epoch) -> u64 {
        self.epoch_record(epoch).map(|r| r.gst_leaves.len() as u64).unwrap_or(0)
    }

    /// The attestations received by `epoch_key` in the live epoch, in arrival order. Unknown keys have none.
    pub fn get_attestations(&self, epoch_key: &EpochKey) -> &[Attestation] {
        self.get_epoch_attestations(self.current_epoch, epoch_key)
    }

    /// The attestations received by `epoch_key` during `epoch`, in arrival order.
    pub fn get_epoch_attestations(&self, epoch: Epoch, epoch_key: &EpochKey) -> &[Attestation] {
        self.attestations
            .get(&(epoch, *epoch_key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The sealed hashchain of `epoch_key`. Unknown and unsealed keys resolve to the epoch tree's default leaf, so
    /// they are indistinguishable from keys sealed with no attestations.
    pub fn get_hashchain(&self, epoch_key: &EpochKey) -> FieldElement {
        self.hashchains
            .get(epoch_key)
            .copied()
            .unwrap_or_else(|| smt_one_leaf(&self.hasher))
    }

    /// Returns true if `nullifier` has been recorded. Zero is reserved and always counts as present.
    pub fn nullifier_exists(&self, nullifier: &Nullifier) -> bool {
        nullifier.is_zero() || self.nullifier_set.contains(nullifier)
    }

    pub fn nullifiers(&self) -> &[Nullifier] {
        &self.nullifiers
    }

    /// Epoch keys that were sealed more than once, with the hashchain that was ignored.
    pub fn duplicate_epoch_keys(&self) -> &[DuplicateEpochKey] {
        &self.duplicate_epoch_keys
    }

    /// Appends a global state tree leaf for a new user and returns its index.
    pub fn sign_up(&mut self, epoch: Epoch, gst_leaf: FieldElement) -> Result<u64, ProtocolStateError> {
        self.check_epoch(epoch)?;
        self.check_gst_capacity()?;
        let record = self.live_epoch_mut();
        record.gst_leaves.push(gst_leaf);
        let index = record.gst_leaves.len() as u64 - 1;
        debug!(
            target: LOG_TARGET,
            "Sign up in epoch {}: GST leaf #{} = {}", epoch, index, gst_leaf
        );
        Ok(index)
    }

    /// Records an attestation towards an epoch key of the live epoch.
    pub fn add_attestation(&mut self, epoch_key: EpochKey, attestation: Attestation) -> Result<(), ProtocolStateError> {
        self.check_epoch_key(&epoch_key)?;
        check_attester_id(&attestation.attester_id, self.constants.user_state_tree_depth())?;
        if self.hashchains.contains_key(&epoch_key) {
            return Err(ProtocolStateError::EpochKeySealed(epoch_key));
        }
        let max = self.constants.num_attestations_per_epoch_key();
        let received = self.get_attestations(&epoch_key).len();
        if received >= max {
            return Err(ProtocolStateError::TooManyAttestations { epoch_key, max });
        }

        if received == 0 {
            self.live_epoch_mut().attested_epoch_keys.push(epoch_key);
        }
        self.attestations
            .entry((self.current_epoch, epoch_key))
            .or_default()
            .push(attestation);
        debug!(
            target: LOG_TARGET,
            "Attestation #{} from attester {} to epoch key {} in epoch {}",
            received,
            attestation.attester_id,
            epoch_key,
            self.current_epoch
        );
        Ok(())
    }

    /// The sealed epoch tree leaves of every epoch key attested in the live epoch, in order of first attestation.
    /// This is what the contract computes when the epoch ends.
    pub fn gen_epoch_tree_leaves(&self) -> Vec<EpochTreeLeaf> {
        self.live_epoch()
            .attested_epoch_keys
            .iter()
            .map(|epoch_key| EpochTreeLeaf {
                epoch_key: *epoch_key,
                hashchain_result: AttestationHashchain::from_attestations(
                    &self.hasher,
                    self.get_attestations(epoch_key),
                )
                .seal(&self.hasher),
            })
            .collect()
    }

    /// Seals the live epoch with the given epoch tree leaves and opens the next one.
    ///
    /// An epoch key whose hashchain is already known keeps its first hashchain. This is recorded and logged, but
    /// does not fail the transition.
    pub fn epoch_transition(
        &mut self,
        epoch: Epoch,
        epoch_tree_leaves: Vec<EpochTreeLeaf>,
    ) -> Result<EpochTransitionReport, ProtocolStateError> {
        self.check_epoch(epoch)?;
        for leaf in &epoch_tree_leaves {
            self.check_epoch_key(&leaf.epoch_key)?;
        }

        let mut duplicates = Vec::new();
        for leaf in &epoch_tree_leaves {
            if self.hashchains.contains_key(&leaf.epoch_key) {
                warn!(
                    target: LOG_TARGET,
                    "Epoch key {} sealed again in epoch {}. Keeping the first hashchain", leaf.epoch_key, epoch
                );
                duplicates.push(leaf.epoch_key);
                self.duplicate_epoch_keys.push(DuplicateEpochKey {
                    epoch,
                    epoch_key: leaf.epoch_key,
                    ignored_hashchain_result: leaf.hashchain_result,
                });
            } else {
                self.hashchains.insert(leaf.epoch_key, leaf.hashchain_result);
            }
        }
        let num_epoch_tree_leaves = epoch_tree_leaves.len();
        self.live_epoch_mut().epoch_tree_leaves = Some(epoch_tree_leaves);
        self.current_epoch += 1;
        self.epochs.push(EpochRecord::default());
        debug!(
            target: LOG_TARGET,
            "Sealed epoch {} with {} epoch tree leaves. Current epoch is now {}",
            epoch,
            num_epoch_tree_leaves,
            self.current_epoch
        );
        Ok(EpochTransitionReport {
            sealed_epoch: epoch,
            current_epoch: self.current_epoch,
            num_epoch_tree_leaves,
            duplicate_epoch_keys: duplicates,
        })
    }

    /// Appends the new global state tree leaf of a transitioned user and records its nullifiers. Zero nullifiers
    /// are padding and are neither checked nor stored. Returns the index of the new leaf.
    pub fn user_state_transition(
        &mut self,
        epoch: Epoch,
        gst_leaf: FieldElement,
        nullifiers: &[Nullifier],
    ) -> Result<u64, ProtocolStateError> {
        self.check_epoch(epoch)?;
        self.check_gst_capacity()?;
        let depth = self.constants.nullifier_tree_depth();
        let mut batch = HashSet::with_capacity(nullifiers.len());
        for nullifier in nullifiers.iter().filter(|n| !n.is_zero()) {
            if !nullifier.fits_in_bits(depth) {
                return Err(ProtocolStateError::NullifierOutOfRange {
                    nullifier: *nullifier,
                    depth,
                });
            }
            if self.nullifier_set.contains(nullifier) {
                return Err(ProtocolStateError::NullifierReplay(*nullifier));
            }
            if !batch.insert(*nullifier) {
                return Err(ProtocolStateError::DuplicateNullifierInBatch(*nullifier));
            }
        }

        let record = self.live_epoch_mut();
        record.gst_leaves.push(gst_leaf);
        let index = record.gst_leaves.len() as u64 - 1;
        for nullifier in nullifiers.iter().filter(|n| !n.is_zero()) {
            self.nullifiers.push(*nullifier);
            self.nullifier_set.insert(*nullifier);
        }
        debug!(
            target: LOG_TARGET,
            "User state transition in epoch {}: GST leaf #{} = {}, {} nullifiers recorded",
            epoch,
            index,
            gst_leaf,
            batch.len()
        );
        Ok(index)
    }

    /// Rebuilds the global state tree of `epoch` from its leaves. Unknown epochs give an empty tree.
    pub fn gen_gs_tree(&self, epoch: Epoch) -> Result<IncrementalMerkleTree<H>, ProtocolStateError> {
        let leaves = self
            .epoch_record(epoch)
            .map(|r| r.gst_leaves.as_slice())
            .unwrap_or(&[]);
        let tree = IncrementalMerkleTree::from_leaves(
            self.constants.global_state_tree_depth(),
            self.default_gst_leaf,
            self.hasher.clone(),
            leaves.iter().copied(),
        )?;
        trace!(
            target: LOG_TARGET,
            "Built GST of epoch {} from {} leaves",
            epoch,
            leaves.len()
        );
        Ok(tree)
    }

    /// Rebuilds the epoch tree of `epoch`. Epochs that are not sealed yet give a tree of default leaves.
    pub fn gen_epoch_tree(&self, epoch: Epoch) -> Result<SparseMerkleTree<H>, ProtocolStateError> {
        let mut tree = SparseMerkleTree::new(
            self.constants.epoch_tree_depth(),
            smt_one_leaf(&self.hasher),
            self.hasher.clone(),
        )?;
        if let Some(leaves) = self.epoch_record(epoch).and_then(|r| r.epoch_tree_leaves.as_ref()) {
            for leaf in leaves {
                tree.update(&leaf.epoch_key, leaf.hashchain_result)?;
            }
        }
        Ok(tree)
    }

    /// Rebuilds the nullifier tree. Key 0 is reserved, and it and every recorded nullifier hold the "used" leaf.
    pub fn gen_nullifier_tree(&self) -> Result<SparseMerkleTree<H>, ProtocolStateError> {
        let used = smt_one_leaf(&self.hasher);
        let mut tree = SparseMerkleTree::new(
            self.constants.nullifier_tree_depth(),
            smt_zero_leaf(&self.hasher),
            self.hasher.clone(),
        )?;
        tree.update(&FieldElement::ZERO, used)?;
        for nullifier in &self.nullifiers {
            tree.update(nullifier, used)?;
        }
        Ok(tree)
    }

    fn check_epoch(&self, epoch: Epoch) -> Result<(), ProtocolStateError> {
        if epoch != self.current_epoch {
            return Err(ProtocolStateError::InvalidEpoch {
                expected: self.current_epoch,
                actual: epoch,
            });
        }
        Ok(())
    }

    fn check_gst_capacity(&self) -> Result<(), ProtocolStateError> {
        let max_users = self.constants.max_users();
        if self.live_epoch().gst_leaves.len() as u64 >= max_users {
            return Err(ProtocolStateError::GlobalStateTreeFull {
                epoch: self.current_epoch,
                max_users,
            });
        }
        Ok(())
    }

    fn check_epoch_key(&self, epoch_key: &EpochKey) -> Result<(), ProtocolStateError> {
        let depth = self.constants.epoch_tree_depth();
        if !epoch_key.fits_in_bits(depth) {
            return Err(ProtocolStateError::EpochKeyOutOfRange {
                epoch_key: *epoch_key,
                depth,
            });
        }
        Ok(())
    }

    fn live_epoch(&self) -> &EpochRecord {
        &self.epochs[self.epochs.len() - 1]
    }

    fn live_epoch_mut(&mut self) -> &mut EpochRecord {
        let last = self.epochs.len() - 1;
        &mut self.epochs[last]
    }
}

/// Attester ids are user state tree keys, and key 0 is reserved for padding.
fn check_attester_id(attester_id: &FieldElement, depth: usize) -> Result<(), ProtocolStateError> {
    if attester_id.is_zero() || !attester_id.fits_in_bits(depth) {
        return Err(ProtocolStateError::InvalidAttesterId {
            attester_id: *attester_id,
            depth,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::{att, fe, new_state};

    #[test]
    fn starts_at_epoch_one() {
        let state = new_state();
        assert_eq!(state.current_epoch(), 1);
        assert_eq!(state.get_num_gst_leaves(1), 0);
        assert_eq!(state.get_num_gst_leaves(0), 0);
        assert_eq!(state.get_num_gst_leaves(7), 0);
        let hasher = state.hasher();
        assert_eq!(
            state.default_gst_leaf(),
            hasher.hash_left_right(FieldElement::ZERO, state.empty_user_state_root())
        );
    }

    #[test]
    fn mutators_check_the_epoch() {
        let mut state = new_state();
        assert_eq!(
            state.sign_up(2, fe(1)),
            Err(ProtocolStateError::InvalidEpoch { expected: 1, actual: 2 })
        );
        assert!(state.epoch_transition(0, vec![]).is_err());
        assert!(state.user_state_transition(3, fe(1), &[]).is_err());
        assert_eq!(state.get_num_gst_leaves(1), 0);
        assert_eq!(state.current_epoch(), 1);
    }

    #[test]
    fn gs_tree_is_a_pure_function_of_leaves() {
        let mut state = new_state();
        let leaves = [fe(11), fe(22), fe(33)];
        for (i, leaf) in leaves.iter().enumerate() {
            assert_eq!(state.sign_up(1, *leaf).unwrap(), i as u64);
        }
        let a = state.gen_gs_tree(1).unwrap();
        let b = state.gen_gs_tree(1).unwrap();
        assert_eq!(a.root(), b.root());
        assert_eq!(a.leaves(), &leaves);
        let empty = state.gen_gs_tree(5).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.zero_value(), state.default_gst_leaf());
    }

    #[test]
    fn sign_ups_are_capped_at_max_users() {
        let mut state = new_state();
        let max = state.constants().max_users();
        for i in 0..max {
            state.sign_up(1, fe(i + 1)).unwrap();
        }
        assert_eq!(
            state.sign_up(1, fe(100)),
            Err(ProtocolStateError::GlobalStateTreeFull { epoch: 1, max_users: max })
        );
        assert!(state.user_state_transition(1, fe(100), &[]).is_err());
        assert_eq!(state.get_num_gst_leaves(1), max);
    }

    #[test]
    fn attestation_validation() {
        let mut state = new_state();
        assert!(matches!(
            state.add_attestation(fe(1), att(0, 1)),
            Err(ProtocolStateError::InvalidAttesterId { .. })
        ));
        assert!(matches!(
            state.add_attestation(fe(1), att(16, 1)),
            Err(ProtocolStateError::InvalidAttesterId { .. })
        ));
        let too_big = FieldElement::from_u256_reduced(primitive_types::U256::one() << 80);
        assert!(matches!(
            state.add_attestation(too_big, att(1, 1)),
            Err(ProtocolStateError::EpochKeyOutOfRange { .. })
        ));
        for _ in 0..state.constants().num_attestations_per_epoch_key() {
            state.add_attestation(fe(9), att(1, 1)).unwrap();
        }
        assert!(matches!(
            state.add_attestation(fe(9), att(2, 1)),
            Err(ProtocolStateError::TooManyAttestations { .. })
        ));
        assert_eq!(state.get_attestations(&fe(9)).len(), 6);
        assert!(state.get_attestations(&fe(10)).is_empty());
    }

    #[test]
    fn sealed_epoch_keys_reject_attestations() {
        let mut state = new_state();
        state.add_attestation(fe(5), att(1, 2)).unwrap();
        let leaves = state.gen_epoch_tree_leaves();
        state.epoch_transition(1, leaves).unwrap();
        assert_eq!(
            state.add_attestation(fe(5), att(1, 2)),
            Err(ProtocolStateError::EpochKeySealed(fe(5)))
        );
        state.add_attestation(fe(6), att(1, 2)).unwrap();
    }

    #[test]
    fn unsealed_attestations_stay_in_their_epoch() {
        let mut state = new_state();
        let max = state.constants().num_attestations_per_epoch_key();
        for _ in 0..max {
            state.add_attestation(fe(5), att(1, 1)).unwrap();
        }
        // The epoch is sealed without the attested key
        state.epoch_transition(1, vec![]).unwrap();
        assert!(state.get_attestations(&fe(5)).is_empty());
        assert_eq!(state.get_epoch_attestations(1, &fe(5)).len(), max);

        state.add_attestation(fe(5), att(2, 7)).unwrap();
        let leaves = state.gen_epoch_tree_leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].epoch_key, fe(5));
        let expected = AttestationHashchain::from_attestations(state.hasher(), &[att(2, 7)]).seal(state.hasher());
        assert_eq!(leaves[0].hashchain_result, expected);
        assert_eq!(state.epoch_record(2).unwrap().attested_epoch_keys, vec![fe(5)]);

        // The per-key cap counts this epoch only
        for _ in 1..max {
            state.add_attestation(fe(5), att(3, 1)).unwrap();
        }
        assert!(matches!(
            state.add_attestation(fe(5), att(3, 1)),
            Err(ProtocolStateError::TooManyAttestations { .. })
        ));
        assert_eq!(state.get_attestations(&fe(5)).len(), max);
    }

    #[test]
    fn epoch_transition_seals_hashchains() {
        let mut state = new_state();
        let attestations = [att(1, 3), att(2, 4)];
        for a in &attestations {
            state.add_attestation(fe(42), *a).unwrap();
        }
        state.add_attestation(fe(7), att(3, 1)).unwrap();
        let leaves = state.gen_epoch_tree_leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].epoch_key, fe(42));
        let expected = AttestationHashchain::from_attestations(state.hasher(), &attestations).seal(state.hasher());
        assert_eq!(leaves[0].hashchain_result, expected);

        let report = state.epoch_transition(1, leaves.clone()).unwrap();
        assert_eq!(report.sealed_epoch, 1);
        assert_eq!(report.current_epoch, 2);
        assert!(report.duplicate_epoch_keys.is_empty());
        assert_eq!(state.get_hashchain(&fe(42)), expected);
        assert!(state.epoch_record(1).unwrap().is_sealed());
        assert!(!state.epoch_record(2).unwrap().is_sealed());

        let tree = state.gen_epoch_tree(1).unwrap();
        for leaf in &leaves {
            let proof = tree.get_merkle_proof(&leaf.epoch_key).unwrap();
            assert!(tree.verify_merkle_proof(&leaf.epoch_key, leaf.hashchain_result, &proof));
        }
    }

    #[test]
    fn duplicate_epoch_keys_are_survivable() {
        let mut state = new_state();
        let first = EpochTreeLeaf {
            epoch_key: fe(3),
            hashchain_result: fe(100),
        };
        state.epoch_transition(1, vec![first]).unwrap();
        let second = EpochTreeLeaf {
            epoch_key: fe(3),
            hashchain_result: fe(200),
        };
        let report = state.epoch_transition(2, vec![second]).unwrap();
        assert_eq!(report.duplicate_epoch_keys, vec![fe(3)]);
        assert_eq!(state.get_hashchain(&fe(3)), fe(100));
        assert_eq!(state.duplicate_epoch_keys(), &[DuplicateEpochKey {
            epoch: 2,
            epoch_key: fe(3),
            ignored_hashchain_result: fe(200),
        }]);
        assert_eq!(state.current_epoch(), 3);
    }

    #[test]
    fn nullifiers_cannot_be_replayed() {
        let mut state = new_state();
        state.user_state_transition(1, fe(1), &[fe(5), FieldElement::ZERO]).unwrap();
        assert_eq!(
            state.user_state_transition(1, fe(2), &[fe(6), fe(5)]),
            Err(ProtocolStateError::NullifierReplay(fe(5)))
        );
        // Nothing from the failed call was recorded
        assert!(!state.nullifier_exists(&fe(6)));
        assert_eq!(state.get_num_gst_leaves(1), 1);
        assert_eq!(
            state.user_state_transition(1, fe(2), &[fe(7), fe(7)]),
            Err(ProtocolStateError::DuplicateNullifierInBatch(fe(7)))
        );
        for _ in 0..3 {
            state
                .user_state_transition(1, fe(3), &[FieldElement::ZERO, FieldElement::ZERO])
                .unwrap();
        }
        assert_eq!(state.nullifiers(), &[fe(5)]);
        assert!(state.nullifier_exists(&FieldElement::ZERO));
    }

    #[test]
    fn nullifier_tree_marks_used_keys() {
        let mut state = new_state();
        state.user_state_transition(1, fe(1), &[fe(5)]).unwrap();
        let tree = state.gen_nullifier_tree().unwrap();
        let used = smt_one_leaf(state.hasher());
        let unused = smt_zero_leaf(state.hasher());
        assert_eq!(tree.get_leaf(&FieldElement::ZERO).unwrap(), used);
        assert_eq!(tree.get_leaf(&fe(5)).unwrap(), used);
        assert_eq!(tree.get_leaf(&fe(6)).unwrap(), unused);
        let big = FieldElement::from_u256_reduced(primitive_types::U256::one() << 80);
        assert!(matches!(
            state.user_state_transition(1, fe(2), &[big]),
            Err(ProtocolStateError::NullifierOutOfRange { .. })
        ));
    }
}
