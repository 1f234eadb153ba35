// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};
use unirep_common_types::{
    types::{AttesterId, Epoch},
    FieldElement,
};
use unirep_hashing::FieldHasher;

use super::{UserState, UserStateError};
use crate::{
    identity::Identity,
    protocol_state::ProtocolState,
    reputation::{Reputation, UserStateLeaf},
};

/// One ledger row of a [`UserStateSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub attester_id: AttesterId,
    pub pos_rep: FieldElement,
    pub neg_rep: FieldElement,
    pub graffiti: FieldElement,
    #[serde(default)]
    pub graffiti_pre_image: FieldElement,
}

impl From<UserStateLeaf> for LedgerEntry {
    fn from(leaf: UserStateLeaf) -> Self {
        Self {
            attester_id: leaf.attester_id,
            pos_rep: leaf.reputation.pos_rep,
            neg_rep: leaf.reputation.neg_rep,
            graffiti: leaf.reputation.graffiti,
            graffiti_pre_image: leaf.reputation.graffiti_pre_image,
        }
    }
}

impl From<LedgerEntry> for UserStateLeaf {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            attester_id: entry.attester_id,
            reputation: Reputation {
                pos_rep: entry.pos_rep,
                neg_rep: entry.neg_rep,
                graffiti: entry.graffiti,
                graffiti_pre_image: entry.graffiti_pre_image,
            },
        }
    }
}

/// The persisted form of a [`UserState`]. It contains the identity secret and must be stored accordingly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStateSnapshot {
    pub identity: Identity,
    pub commitment: FieldElement,
    pub has_signed_up: bool,
    pub latest_transitioned_epoch: Epoch,
    #[serde(rename = "latestGSTLeafIndex")]
    pub latest_gst_leaf_index: u64,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
}

impl<'a, H: FieldHasher> UserState<'a, H> {
    pub fn to_snapshot(&self) -> UserStateSnapshot {
        UserStateSnapshot {
            identity: self.identity.clone(),
            commitment: self.commitment,
            has_signed_up: self.has_signed_up,
            latest_transitioned_epoch: self.latest_transitioned_epoch,
            latest_gst_leaf_index: self.latest_gst_leaf_index,
            ledger: self.ledger.to_leaves().into_iter().map(LedgerEntry::from).collect(),
        }
    }

    /// Rebuilds a user over `protocol_state`. The stored commitment must match the identity.
    pub fn from_snapshot(
        protocol_state: &'a ProtocolState<H>,
        snapshot: UserStateSnapshot,
    ) -> Result<Self, UserStateError> {
        if snapshot.identity.commitment(protocol_state.hasher()) != snapshot.commitment {
            return Err(UserStateError::CommitmentMismatch);
        }
        Self::restore(
            protocol_state,
            snapshot.identity,
            snapshot.has_signed_up,
            Some(snapshot.latest_transitioned_epoch),
            Some(snapshot.latest_gst_leaf_index),
            Some(snapshot.ledger.into_iter().map(UserStateLeaf::from).collect()),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::{fe, identity, new_state};

    #[test]
    fn snapshot_layout() {
        let state = new_state();
        let mut user = UserState::new(&state, identity(1));
        user.sign_up(1, 3).unwrap();
        let snapshot = UserStateSnapshot {
            ledger: vec![LedgerEntry {
                attester_id: fe(2),
                pos_rep: fe(5),
                neg_rep: fe(1),
                graffiti: fe(0),
                graffiti_pre_image: fe(0),
            }],
            ..user.to_snapshot()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["hasSignedUp"], true);
        assert_eq!(json["latestTransitionedEpoch"], 1);
        assert_eq!(json["latestGSTLeafIndex"], 3);
        assert_eq!(json["identity"]["identityNullifier"], "1");
        assert_eq!(json["ledger"][0]["attesterId"], "2");
        assert_eq!(json["ledger"][0]["posRep"], "5");
        assert_eq!(json["ledger"][0]["graffitiPreImage"], "0");

        let restored = UserState::from_snapshot(&state, serde_json::from_value(json).unwrap()).unwrap();
        assert_eq!(restored.get_rep_by_attester(&fe(2)).pos_rep, fe(5));
        assert_eq!(restored.latest_gst_leaf_index(), 3);
        assert_eq!(restored.to_snapshot(), snapshot);
    }

    #[test]
    fn foreign_commitments_are_rejected() {
        let state = new_state();
        let mut snapshot = UserState::new(&state, identity(1)).to_snapshot();
        snapshot.commitment = fe(99);
        assert!(matches!(
            UserState::from_snapshot(&state, snapshot),
            Err(UserStateError::CommitmentMismatch)
        ));
    }
}
