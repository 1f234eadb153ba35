// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use unirep_common_types::types::{Epoch, EpochKey, Nullifier};
use unirep_hashing::FieldHasher;

use super::{DuplicateEpochKey, EpochRecord, ProtocolState, ProtocolStateError};
use crate::{attestation::Attestation, consensus::ProtocolConstants};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochKeyAttestations {
    pub epoch: Epoch,
    pub epoch_key: EpochKey,
    pub attestations: Vec<Attestation>,
}

/// The serializable form of a [`ProtocolState`]. Lookup tables and cached roots are rebuilt on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolStateSnapshot {
    pub constants: ProtocolConstants,
    pub current_epoch: Epoch,
    pub epochs: Vec<EpochRecord>,
    pub attestations: Vec<EpochKeyAttestations>,
    pub nullifiers: Vec<Nullifier>,
    #[serde(default)]
    pub duplicate_epoch_keys: Vec<DuplicateEpochKey>,
}

impl<H: FieldHasher> ProtocolState<H> {
    pub fn to_snapshot(&self) -> ProtocolStateSnapshot {
        let attestations = self
            .epochs
            .iter()
            .zip(1..)
            .flat_map(|(record, epoch)| record.attested_epoch_keys.iter().map(move |epoch_key| (epoch, epoch_key)))
            .map(|(epoch, epoch_key)| EpochKeyAttestations {
                epoch,
                epoch_key: *epoch_key,
                attestations: self.get_epoch_attestations(epoch, epoch_key).to_vec(),
            })
            .collect();
        ProtocolStateSnapshot {
            constants: self.constants.clone(),
            current_epoch: self.current_epoch,
            epochs: self.epochs.clone(),
            attestations,
            nullifiers: self.nullifiers.clone(),
            duplicate_epoch_keys: self.duplicate_epoch_keys.clone(),
        }
    }

    /// Restores a state, checking that the snapshot could have been produced by replaying events.
    pub fn from_snapshot(snapshot: ProtocolStateSnapshot, hasher: H) -> Result<Self, ProtocolStateError> {
        let mut state = Self::with_hasher(snapshot.constants, hasher)?;
        let invalid = |msg: String| ProtocolStateError::InvalidSnapshot(msg);

        if snapshot.current_epoch == 0 || snapshot.epochs.len() as u64 != snapshot.current_epoch {
            return Err(invalid(format!(
                "{} epoch records for current epoch {}",
                snapshot.epochs.len(),
                snapshot.current_epoch
            )));
        }
        let last = snapshot.epochs.len() - 1;
        for (i, record) in snapshot.epochs.iter().enumerate() {
            if record.is_sealed() != (i < last) {
                return Err(invalid(format!(
                    "epoch {} has the wrong sealed status",
                    i as u64 + 1
                )));
            }
        }

        let mut hashchains = HashMap::new();
        for leaf in snapshot
            .epochs
            .iter()
            .filter_map(|r| r.epoch_tree_leaves.as_ref())
            .flatten()
        {
            hashchains.entry(leaf.epoch_key).or_insert(leaf.hashchain_result);
        }

        let mut attestations = HashMap::with_capacity(snapshot.attestations.len());
        for entry in snapshot.attestations {
            if entry.epoch == 0 || entry.epoch > snapshot.current_epoch {
                return Err(invalid(format!(
                    "attestations to epoch key {} in unknown epoch {}",
                    entry.epoch_key, entry.epoch
                )));
            }
            if attestations
                .insert((entry.epoch, entry.epoch_key), entry.attestations)
                .is_some()
            {
                return Err(invalid(format!(
                    "epoch key {} is listed twice in epoch {}",
                    entry.epoch_key, entry.epoch
                )));
            }
        }

        let mut nullifier_set = HashSet::with_capacity(snapshot.nullifiers.len());
        for nullifier in &snapshot.nullifiers {
            if nullifier.is_zero() || !nullifier_set.insert(*nullifier) {
                return Err(invalid(format!("nullifier {} is zero or repeated", nullifier)));
            }
        }

        state.current_epoch = snapshot.current_epoch;
        state.epochs = snapshot.epochs;
        state.attestations = attestations;
        state.hashchains = hashchains;
        state.nullifiers = snapshot.nullifiers;
        state.nullifier_set = nullifier_set;
        state.duplicate_epoch_keys = snapshot.duplicate_epoch_keys;
        Ok(state)
    }
}

#[cfg(test)]
mod test {
    use unirep_hashing::Blake2bFieldHasher;

    use super::*;
    use crate::test_helpers::{att, fe, new_state};

    #[test]
    fn json_round_trip() {
        let mut state = new_state();
        state.sign_up(1, fe(10)).unwrap();
        state.add_attestation(fe(4), att(1, 3)).unwrap();
        let leaves = state.gen_epoch_tree_leaves();
        state.epoch_transition(1, leaves).unwrap();
        state.user_state_transition(2, fe(11), &[fe(8)]).unwrap();

        let json = serde_json::to_string(&state.to_snapshot()).unwrap();
        let snapshot: ProtocolStateSnapshot = serde_json::from_str(&json).unwrap();
        let restored = ProtocolState::from_snapshot(snapshot, Blake2bFieldHasher::default()).unwrap();

        assert_eq!(restored.current_epoch(), 2);
        assert_eq!(restored.get_hashchain(&fe(4)), state.get_hashchain(&fe(4)));
        assert_eq!(restored.get_epoch_attestations(1, &fe(4)), &[att(1, 3)]);
        assert!(restored.nullifier_exists(&fe(8)));
        assert_eq!(
            restored.gen_gs_tree(1).unwrap().root(),
            state.gen_gs_tree(1).unwrap().root()
        );
        assert_eq!(
            restored.gen_nullifier_tree().unwrap().get_root_hash(),
            state.gen_nullifier_tree().unwrap().get_root_hash()
        );
        assert_eq!(restored.to_snapshot(), state.to_snapshot());
    }

    #[test]
    fn inconsistent_snapshots_are_rejected() {
        let state = new_state();
        let mut snapshot = state.to_snapshot();
        snapshot.current_epoch = 2;
        assert!(matches!(
            ProtocolState::from_snapshot(snapshot, Blake2bFieldHasher::default()),
            Err(ProtocolStateError::InvalidSnapshot(_))
        ));

        let mut snapshot = state.to_snapshot();
        snapshot.attestations = vec![EpochKeyAttestations {
            epoch: 3,
            epoch_key: fe(4),
            attestations: vec![att(1, 1)],
        }];
        assert!(matches!(
            ProtocolState::from_snapshot(snapshot, Blake2bFieldHasher::default()),
            Err(ProtocolStateError::InvalidSnapshot(_))
        ));

        let mut snapshot = state.to_snapshot();
        snapshot.nullifiers = vec![fe(1), fe(1)];
        assert!(matches!(
            ProtocolState::from_snapshot(snapshot, Blake2bFieldHasher::default()),
            Err(ProtocolStateError::InvalidSnapshot(_))
        ));
    }
}
