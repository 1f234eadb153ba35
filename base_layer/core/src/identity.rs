// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use unirep_common_types::FieldElement;
use unirep_hashing::FieldHasher;

/// A user's secret. Only the commitment ever leaves the user's machine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub identity_nullifier: FieldElement,
    pub identity_trapdoor: FieldElement,
}

impl Identity {
    pub fn new(identity_nullifier: FieldElement, identity_trapdoor: FieldElement) -> Self {
        Self {
            identity_nullifier,
            identity_trapdoor,
        }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            identity_nullifier: FieldElement::random(rng),
            identity_trapdoor: FieldElement::random(rng),
        }
    }

    /// The public identity commitment, `hash_left_right(identityNullifier, identityTrapdoor)`.
    pub fn commitment<H: FieldHasher>(&self, hasher: &H) -> FieldElement {
        hasher.hash_left_right(self.identity_nullifier, self.identity_trapdoor)
    }
}

// Never print the secret
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity(..)")
    }
}
