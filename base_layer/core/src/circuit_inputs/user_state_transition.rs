// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};
use unirep_common_types::FieldElement;

use super::{check_len, check_paths, CircuitInputs, CircuitInputsError, CircuitKind};
use crate::consensus::ProtocolConstants;

/// Witness for moving a user from one epoch to the next.
///
/// Per-slot arrays have `nonces * attestations_per_epoch_key` entries in nonce-major order.
/// `intermediate_user_state_tree_roots` has one more: the root before the first slot is applied.
///
/// The attestation nullifiers themselves are not part of the record, since the circuit derives them from the identity
/// nullifier and only takes their nullifier tree paths. Padded slots prove key 0. The nullifier values, one per real
/// slot and zero for padded slots, come from
/// [`UserState::gen_user_state_transition_nullifiers`](crate::user_state::UserState::gen_user_state_transition_nullifiers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStateTransitionInputs {
    pub epoch: FieldElement,
    pub intermediate_user_state_tree_roots: Vec<FieldElement>,
    pub old_pos_reps: Vec<FieldElement>,
    pub old_neg_reps: Vec<FieldElement>,
    pub old_graffities: Vec<FieldElement>,
    #[serde(rename = "UST_path_elements")]
    pub ust_path_elements: Vec<Vec<FieldElement>>,
    pub identity_nullifier: FieldElement,
    pub identity_trapdoor: FieldElement,
    #[serde(rename = "GST_path_elements")]
    pub gst_path_elements: Vec<FieldElement>,
    #[serde(rename = "GST_path_index")]
    pub gst_path_index: Vec<FieldElement>,
    #[serde(rename = "GST_root")]
    pub gst_root: FieldElement,
    pub selectors: Vec<FieldElement>,
    pub attester_ids: Vec<FieldElement>,
    pub pos_reps: Vec<FieldElement>,
    pub neg_reps: Vec<FieldElement>,
    pub graffities: Vec<FieldElement>,
    pub overwrite_graffitis: Vec<FieldElement>,
    pub epk_path_elements: Vec<Vec<FieldElement>>,
    pub hash_chain_results: Vec<FieldElement>,
    pub epoch_tree_root: FieldElement,
    pub nullifier_tree_root: FieldElement,
    pub attestation_nullifier_path_elements: Vec<Vec<FieldElement>>,
}

impl UserStateTransitionInputs {
    /// The user state tree root after every slot has been applied.
    pub fn final_user_state_root(&self) -> Option<FieldElement> {
        self.intermediate_user_state_tree_roots.last().copied()
    }
}

impl CircuitInputs for UserStateTransitionInputs {
    const KIND: CircuitKind = CircuitKind::UserStateTransition;
    const SCHEMA_VERSION: u32 = 1;

    fn check_shape(&self, constants: &ProtocolConstants) -> Result<(), CircuitInputsError> {
        let kind = Self::KIND;
        let nonces = constants.num_epoch_key_nonce_per_epoch();
        let slots = constants.num_attestation_slots();
        check_len(
            kind,
            "intermediate_user_state_tree_roots",
            slots + 1,
            self.intermediate_user_state_tree_roots.len(),
        )?;
        for (field, values) in [
            ("old_pos_reps", &self.old_pos_reps),
            ("old_neg_reps", &self.old_neg_reps),
            ("old_graffities", &self.old_graffities),
            ("selectors", &self.selectors),
            ("attester_ids", &self.attester_ids),
            ("pos_reps", &self.pos_reps),
            ("neg_reps", &self.neg_reps),
            ("graffities", &self.graffities),
            ("overwrite_graffitis", &self.overwrite_graffitis),
        ] {
            check_len(kind, field, slots, values.len())?;
        }
        check_paths(
            kind,
            "UST_path_elements",
            &self.ust_path_elements,
            slots,
            constants.user_state_tree_depth(),
        )?;
        let gst_depth = constants.global_state_tree_depth();
        check_len(kind, "GST_path_elements", gst_depth, self.gst_path_elements.len())?;
        check_len(kind, "GST_path_index", gst_depth, self.gst_path_index.len())?;
        check_paths(
            kind,
            "epk_path_elements",
            &self.epk_path_elements,
            nonces,
            constants.epoch_tree_depth(),
        )?;
        check_len(kind, "hash_chain_results", nonces, self.hash_chain_results.len())?;
        check_paths(
            kind,
            "attestation_nullifier_path_elements",
            &self.attestation_nullifier_path_elements,
            slots,
            constants.nullifier_tree_depth(),
        )
    }
}
