// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use log::*;
use serde::{Deserialize, Serialize};
use unirep_common_types::{
    types::{Epoch, EpochKey, Nullifier},
    FieldElement,
};
use unirep_hashing::FieldHasher;

use super::{ProtocolState, ProtocolStateError, LOG_TARGET};
use crate::attestation::{Attestation, EpochTreeLeaf};

/// A contract event, in the form the chain watcher hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolEvent {
    #[serde(rename_all = "camelCase")]
    SignUp { epoch: Epoch, gst_leaf: FieldElement },
    #[serde(rename_all = "camelCase")]
    Attestation {
        epoch: Epoch,
        epoch_key: EpochKey,
        attestation: Attestation,
    },
    #[serde(rename_all = "camelCase")]
    EpochTransition {
        epoch: Epoch,
        epoch_tree_leaves: Vec<EpochTreeLeaf>,
    },
    #[serde(rename_all = "camelCase")]
    UserStateTransition {
        epoch: Epoch,
        gst_leaf: FieldElement,
        nullifiers: Vec<Nullifier>,
    },
}

impl ProtocolEvent {
    pub fn epoch(&self) -> Epoch {
        match self {
            ProtocolEvent::SignUp { epoch, .. } |
            ProtocolEvent::Attestation { epoch, .. } |
            ProtocolEvent::EpochTransition { epoch, .. } |
            ProtocolEvent::UserStateTransition { epoch, .. } => *epoch,
        }
    }
}

impl<H: FieldHasher> ProtocolState<H> {
    /// Routes one event to its mutator.
    pub fn apply_event(&mut self, event: &ProtocolEvent) -> Result<(), ProtocolStateError> {
        match event {
            ProtocolEvent::SignUp { epoch, gst_leaf } => {
                self.sign_up(*epoch, *gst_leaf)?;
            },
            ProtocolEvent::Attestation {
                epoch,
                epoch_key,
                attestation,
            } => {
                self.check_epoch(*epoch)?;
                self.add_attestation(*epoch_key, *attestation)?;
            },
            ProtocolEvent::EpochTransition {
                epoch,
                epoch_tree_leaves,
            } => {
                self.epoch_transition(*epoch, epoch_tree_leaves.clone())?;
            },
            ProtocolEvent::UserStateTransition {
                epoch,
                gst_leaf,
                nullifiers,
            } => {
                self.user_state_transition(*epoch, *gst_leaf, nullifiers)?;
            },
        }
        Ok(())
    }

    /// Applies events in order and stops at the first failure. Returns the number of events applied.
    pub fn replay<'a, I>(&mut self, events: I) -> Result<usize, ProtocolStateError>
    where I: IntoIterator<Item = &'a ProtocolEvent> {
        let mut applied = 0;
        for event in events {
            if let Err(err) = self.apply_event(event) {
                warn!(
                    target: LOG_TARGET,
                    "Replay stopped after {} events at an event of epoch {}: {}",
                    applied,
                    event.epoch(),
                    err
                );
                return Err(err);
            }
            applied += 1;
        }
        debug!(target: LOG_TARGET, "Replayed {} events", applied);
        Ok(applied)
    }
}
