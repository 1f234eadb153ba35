// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};
use unirep_common_types::{types::AttesterId, FieldElement};
use unirep_hashing::FieldHasher;

use crate::{attestation::Attestation, user_state::UserStateError};

/// How an attestation's positive and negative reputation combine with the values already in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReputationFoldPolicy {
    /// The attestation's values replace the stored ones. This is what the deployed circuits expect.
    #[default]
    Replace,
    /// The attestation's values are added to the stored ones.
    Accumulate,
}

/// One user's reputation with one attester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reputation {
    pub pos_rep: FieldElement,
    pub neg_rep: FieldElement,
    pub graffiti: FieldElement,
    #[serde(default)]
    pub graffiti_pre_image: FieldElement,
}

impl Reputation {
    pub fn new(pos_rep: FieldElement, neg_rep: FieldElement, graffiti: FieldElement) -> Self {
        Self {
            pos_rep,
            neg_rep,
            graffiti,
            graffiti_pre_image: FieldElement::ZERO,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Folds an attestation into this reputation. Graffiti is only replaced when the attestation asks for it, and
    /// a replaced graffiti drops the known pre-image.
    #[must_use]
    pub fn update(&self, attestation: &Attestation, policy: ReputationFoldPolicy) -> Self {
        let (pos_rep, neg_rep) = match policy {
            ReputationFoldPolicy::Replace => (attestation.pos_rep, attestation.neg_rep),
            ReputationFoldPolicy::Accumulate => (
                self.pos_rep + attestation.pos_rep,
                self.neg_rep + attestation.neg_rep,
            ),
        };
        let (graffiti, graffiti_pre_image) = if attestation.overwrite_graffiti {
            (attestation.graffiti, FieldElement::ZERO)
        } else {
            (self.graffiti, self.graffiti_pre_image)
        };
        Self {
            pos_rep,
            neg_rep,
            graffiti,
            graffiti_pre_image,
        }
    }

    /// The user state tree leaf for this reputation, `hash5(posRep, negRep, graffiti, 0, 0)`.
    pub fn hash<H: FieldHasher>(&self, hasher: &H) -> FieldElement {
        hasher.hash5([
            self.pos_rep,
            self.neg_rep,
            self.graffiti,
            FieldElement::ZERO,
            FieldElement::ZERO,
        ])
    }

    /// Records the pre-image of the current graffiti. Fails if it does not hash to the graffiti.
    pub fn add_graffiti_pre_image<H: FieldHasher>(
        &mut self,
        hasher: &H,
        graffiti_pre_image: FieldElement,
    ) -> Result<(), UserStateError> {
        if hasher.hash_one(graffiti_pre_image) != self.graffiti {
            return Err(UserStateError::GraffitiPreImageMismatch);
        }
        self.graffiti_pre_image = graffiti_pre_image;
        Ok(())
    }
}

/// A non-default ledger entry, as handed to and from a user state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStateLeaf {
    pub attester_id: AttesterId,
    pub reputation: Reputation,
}

/// A user's sparse attester-to-reputation map. Default reputations are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReputationLedger {
    entries: BTreeMap<AttesterId, Reputation>,
}

impl ReputationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The reputation with `attester_id`, or the zero reputation.
    pub fn get(&self, attester_id: &AttesterId) -> Reputation {
        self.entries.get(attester_id).copied().unwrap_or_default()
    }

    pub fn get_mut(&mut self, attester_id: &AttesterId) -> Option<&mut Reputation> {
        self.entries.get_mut(attester_id)
    }

    /// Replaces (or inserts) the entry for `attester_id`.
    pub fn set(&mut self, attester_id: AttesterId, reputation: Reputation) {
        if reputation.is_default() {
            self.entries.remove(&attester_id);
        } else {
            self.entries.insert(attester_id, reputation);
        }
    }

    /// Folds an attestation into the entry of its attester and returns the new reputation.
    pub fn apply(&mut self, attestation: &Attestation, policy: ReputationFoldPolicy) -> Reputation {
        let updated = self.get(&attestation.attester_id).update(attestation, policy);
        self.set(attestation.attester_id, updated);
        updated
    }

    pub fn iter(&self) -> btree_map::Iter<'_, AttesterId, Reputation> {
        self.entries.iter()
    }

    pub fn to_leaves(&self) -> Vec<UserStateLeaf> {
        self.entries
            .iter()
            .map(|(attester_id, reputation)| UserStateLeaf {
                attester_id: *attester_id,
                reputation: *reputation,
            })
            .collect()
    }
}

impl FromIterator<UserStateLeaf> for ReputationLedger {
    /// Later leaves for the same attester replace earlier ones.
    fn from_iter<T: IntoIterator<Item = UserStateLeaf>>(iter: T) -> Self {
        let mut ledger = Self::new();
        for leaf in iter {
            ledger.set(leaf.attester_id, leaf.reputation);
        }
        ledger
    }
}
