// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};
use unirep_common_types::FieldElement;

use super::{check_len, CircuitInputs, CircuitInputsError, CircuitKind};
use crate::consensus::ProtocolConstants;

/// Witness for proving ownership of an epoch key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyEpochKeyInputs {
    pub identity_nullifier: FieldElement,
    pub identity_trapdoor: FieldElement,
    pub user_state_root: FieldElement,
    /// Global state tree path of the user's leaf
    pub path_elements: Vec<FieldElement>,
    pub path_index: Vec<FieldElement>,
    /// Global state tree root
    pub root: FieldElement,
    pub nonce: FieldElement,
    pub epoch: FieldElement,
    pub epoch_key: FieldElement,
}

impl CircuitInputs for VerifyEpochKeyInputs {
    const KIND: CircuitKind = CircuitKind::VerifyEpochKey;
    const SCHEMA_VERSION: u32 = 1;

    fn check_shape(&self, constants: &ProtocolConstants) -> Result<(), CircuitInputsError> {
        let depth = constants.global_state_tree_depth();
        check_len(Self::KIND, "path_elements", depth, self.path_elements.len())?;
        check_len(Self::KIND, "path_index", depth, self.path_index.len())
    }
}
