// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};
use unirep_common_types::{
    types::{AttesterId, EpochKey},
    FieldElement,
};
use unirep_hashing::FieldHasher;

/// A reputation statement from an attester about one epoch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub attester_id: AttesterId,
    pub pos_rep: FieldElement,
    pub neg_rep: FieldElement,
    pub graffiti: FieldElement,
    pub overwrite_graffiti: bool,
}

impl Attestation {
    pub fn new(
        attester_id: AttesterId,
        pos_rep: FieldElement,
        neg_rep: FieldElement,
        graffiti: FieldElement,
        overwrite_graffiti: bool,
    ) -> Self {
        Self {
            attester_id,
            pos_rep,
            neg_rep,
            graffiti,
            overwrite_graffiti,
        }
    }

    pub fn hash<H: FieldHasher>(&self, hasher: &H) -> FieldElement {
        hasher.hash5([
            self.attester_id,
            self.pos_rep,
            self.neg_rep,
            self.graffiti,
            FieldElement::from(self.overwrite_graffiti),
        ])
    }
}

/// A leaf of an epoch tree, fixed when the epoch is sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochTreeLeaf {
    pub epoch_key: EpochKey,
    pub hashchain_result: FieldElement,
}

/// The running hash of the attestations an epoch key receives during an epoch.
///
/// The chain starts at zero and absorbs each attestation as `hash_left_right(attestation, chain)`. Sealing it wraps
/// the result once more as `hash_left_right(1, chain)`, so a sealed empty chain equals the epoch tree's default leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationHashchain {
    value: FieldElement,
}

impl AttestationHashchain {
    pub fn new() -> Self {
        Self {
            value: FieldElement::ZERO,
        }
    }

    pub fn from_attestations<'a, H, I>(hasher: &H, attestations: I) -> Self
    where
        H: FieldHasher,
        I: IntoIterator<Item = &'a Attestation>,
    {
        attestations.into_iter().fold(Self::new(), |chain, a| chain.absorb(hasher, a))
    }

    #[must_use]
    pub fn absorb<H: FieldHasher>(self, hasher: &H, attestation: &Attestation) -> Self {
        Self {
            value: hasher.hash_left_right(attestation.hash(hasher), self.value),
        }
    }

    pub fn value(&self) -> FieldElement {
        self.value
    }

    pub fn seal<H: FieldHasher>(self, hasher: &H) -> FieldElement {
        hasher.hash_left_right(FieldElement::ONE, self.value)
    }
}

impl Default for AttestationHashchain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use unirep_hashing::Blake2bFieldHasher;

    use super::*;
    use crate::derivation::smt_one_leaf;

    fn att(attester: u64, pos: u64) -> Attestation {
        Attestation::new(
            FieldElement::from(attester),
            FieldElement::from(pos),
            FieldElement::ZERO,
            FieldElement::ZERO,
            false,
        )
    }

    #[test]
    fn empty_sealed_chain_is_the_one_leaf() {
        let hasher = Blake2bFieldHasher::default();
        assert_eq!(AttestationHashchain::new().seal(&hasher), smt_one_leaf(&hasher));
    }

    #[test]
    fn chain_is_order_sensitive() {
        let hasher = Blake2bFieldHasher::default();
        let a = [att(1, 3), att(1, 5)];
        let b = [att(1, 5), att(1, 3)];
        let ca = AttestationHashchain::from_attestations(&hasher, &a);
        let cb = AttestationHashchain::from_attestations(&hasher, &b);
        assert_ne!(ca, cb);
        let manual = hasher.hash_left_right(
            a[1].hash(&hasher),
            hasher.hash_left_right(a[0].hash(&hasher), FieldElement::ZERO),
        );
        assert_eq!(ca.value(), manual);
    }

    #[test]
    fn overwrite_flag_is_hashed() {
        let hasher = Blake2bFieldHasher::default();
        let mut a = att(1, 1);
        let h = a.hash(&hasher);
        a.overwrite_graffiti = true;
        assert_ne!(a.hash(&hasher), h);
    }

    #[test]
    fn json_layout() {
        let json = serde_json::to_value(att(2, 7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "attesterId": "2",
                "posRep": "7",
                "negRep": "0",
                "graffiti": "0",
                "overwriteGraffiti": false
            })
        );
    }
}
