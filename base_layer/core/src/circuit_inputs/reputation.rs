// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};
use unirep_common_types::FieldElement;

use super::{check_len, CircuitInputs, CircuitInputsError, CircuitKind};
use crate::consensus::ProtocolConstants;

/// Witness for proving that the reputation held with one attester meets public thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProveReputationInputs {
    pub identity_nullifier: FieldElement,
    pub identity_trapdoor: FieldElement,
    pub user_state_root: FieldElement,
    #[serde(rename = "GST_path_index")]
    pub gst_path_index: Vec<FieldElement>,
    #[serde(rename = "GST_path_elements")]
    pub gst_path_elements: Vec<FieldElement>,
    #[serde(rename = "GST_root")]
    pub gst_root: FieldElement,
    pub attester_id: FieldElement,
    pub pos_rep: FieldElement,
    pub neg_rep: FieldElement,
    pub graffiti: FieldElement,
    #[serde(rename = "UST_path_elements")]
    pub ust_path_elements: Vec<FieldElement>,
    pub min_pos_rep: FieldElement,
    pub max_neg_rep: FieldElement,
    pub graffiti_pre_image: FieldElement,
    /// Present when the proof also spends reputation
    #[serde(flatten)]
    pub karma: Option<KarmaInputs>,
}

/// The reputation-spending part of a reputation proof. Nullifier slots past `rep_nullifiers_amount` are zero and
/// deselected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaInputs {
    pub epoch: FieldElement,
    pub epoch_key_nonce: FieldElement,
    pub epoch_key: FieldElement,
    pub rep_nullifiers_amount: FieldElement,
    pub start_rep_nonce: FieldElement,
    pub rep_nullifiers: Vec<FieldElement>,
    pub selectors: Vec<FieldElement>,
}

impl CircuitInputs for ProveReputationInputs {
    const KIND: CircuitKind = CircuitKind::ProveReputation;
    const SCHEMA_VERSION: u32 = 1;

    fn check_shape(&self, constants: &ProtocolConstants) -> Result<(), CircuitInputsError> {
        let gst_depth = constants.global_state_tree_depth();
        check_len(Self::KIND, "GST_path_index", gst_depth, self.gst_path_index.len())?;
        check_len(Self::KIND, "GST_path_elements", gst_depth, self.gst_path_elements.len())?;
        check_len(
            Self::KIND,
            "UST_path_elements",
            constants.user_state_tree_depth(),
            self.ust_path_elements.len(),
        )?;
        if let Some(karma) = &self.karma {
            let budget = constants.max_reputation_budget();
            check_len(Self::KIND, "rep_nullifiers", budget, karma.rep_nullifiers.len())?;
            check_len(Self::KIND, "selectors", budget, karma.selectors.len())?;
        }
        Ok(())
    }
}
