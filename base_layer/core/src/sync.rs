// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Replays a protocol event stream into a [`ProtocolState`] while keeping one user's bookkeeping in step with it.

use log::*;
use thiserror::Error;
use unirep_common_types::{types::Epoch, FieldElement};
use unirep_hashing::{Blake2bFieldHasher, FieldHasher};

use crate::{
    identity::Identity,
    protocol_state::{ProtocolEvent, ProtocolState, ProtocolStateError},
    reputation::ReputationFoldPolicy,
    user_state::{NewUserState, UserState, UserStateError, UserStateSnapshot},
};

const LOG_TARGET: &str = "c::unirep::sync";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Protocol state error: {0}")]
    ProtocolStateError(#[from] ProtocolStateError),
    #[error("User state error: {0}")]
    UserStateError(#[from] UserStateError),
}

/// What applying one event did to the tracked user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    SignedUp { epoch: Epoch, gst_leaf_index: u64 },
    Transitioned { epoch: Epoch, gst_leaf_index: u64 },
}

pub struct UnirepSynchronizer<H = Blake2bFieldHasher> {
    state: ProtocolState<H>,
    user: UserStateSnapshot,
    fold_policy: ReputationFoldPolicy,
    // The tracked user's next state, valid for as long as their latest epoch does not change
    pending: Option<(Epoch, NewUserState)>,
}

impl<H: FieldHasher> UnirepSynchronizer<H> {
    /// Tracks a user that has not signed up yet.
    pub fn new(state: ProtocolState<H>, identity: Identity) -> Self {
        let user = UserState::new(&state, identity).to_snapshot();
        Self::with_user(state, user)
    }

    /// Tracks a previously persisted user.
    pub fn with_user(state: ProtocolState<H>, user: UserStateSnapshot) -> Self {
        Self {
            state,
            user,
            fold_policy: ReputationFoldPolicy::default(),
            pending: None,
        }
    }

    #[must_use]
    pub fn with_fold_policy(mut self, fold_policy: ReputationFoldPolicy) -> Self {
        self.fold_policy = fold_policy;
        self.pending = None;
        self
    }

    pub fn state(&self) -> &ProtocolState<H> {
        &self.state
    }

    pub fn user_snapshot(&self) -> &UserStateSnapshot {
        &self.user
    }

    /// A view of the tracked user over the current state.
    pub fn user_state(&self) -> Result<UserState<'_, H>, SyncError> {
        Ok(UserState::from_snapshot(&self.state, self.user.clone())?.with_fold_policy(self.fold_policy))
    }

    pub fn into_parts(self) -> (ProtocolState<H>, UserStateSnapshot) {
        (self.state, self.user)
    }

    /// Applies one event. The tracked user is signed up or transitioned when the event carries their leaf.
    pub fn process_event(&mut self, event: &ProtocolEvent) -> Result<SyncOutcome, SyncError> {
        let tracked = match event {
            ProtocolEvent::SignUp { gst_leaf, .. } => !self.user.has_signed_up && self.is_sign_up_leaf(gst_leaf)?,
            ProtocolEvent::UserStateTransition { gst_leaf, .. } => self.is_pending_leaf(gst_leaf)?,
            _ => false,
        };
        match (event, tracked) {
            (ProtocolEvent::SignUp { epoch, .. }, true) => self.apply_tracked_sign_up(event, *epoch),
            (ProtocolEvent::UserStateTransition { epoch, .. }, true) => self.apply_tracked_transition(event, *epoch),
            _ => {
                self.state.apply_event(event)?;
                Ok(SyncOutcome::Applied)
            },
        }
    }

    /// Applies events in order and stops at the first failure. Returns the number of events applied.
    pub fn sync<'a, I>(&mut self, events: I) -> Result<usize, SyncError>
    where I: IntoIterator<Item = &'a ProtocolEvent> {
        let mut applied = 0;
        for event in events {
            self.process_event(event)?;
            applied += 1;
        }
        debug!(target: LOG_TARGET, "Synchronised {} events", applied);
        Ok(applied)
    }

    fn apply_tracked_sign_up(&mut self, event: &ProtocolEvent, epoch: Epoch) -> Result<SyncOutcome, SyncError> {
        self.state.apply_event(event)?;
        let gst_leaf_index = self.state.get_num_gst_leaves(epoch) - 1;
        let mut user = self.user_state()?;
        user.sign_up(epoch, gst_leaf_index)?;
        self.user = user.to_snapshot();
        info!(
            target: LOG_TARGET,
            "Tracked user signed up in epoch {} at GST leaf #{}", epoch, gst_leaf_index
        );
        Ok(SyncOutcome::SignedUp { epoch, gst_leaf_index })
    }

    /// The user moves before the event is applied, so their recorded index is the one the new leaf lands at.
    fn apply_tracked_transition(&mut self, event: &ProtocolEvent, epoch: Epoch) -> Result<SyncOutcome, SyncError> {
        let next = {
            let mut user = self.user_state()?;
            let leaves = self
                .pending
                .as_ref()
                .map(|(_, pending)| pending.new_ust_leaves.clone())
                .unwrap_or_default();
            user.transition(leaves)?;
            user.to_snapshot()
        };
        self.state.apply_event(event)?;
        self.user = next;
        self.pending = None;
        let gst_leaf_index = self.user.latest_gst_leaf_index;
        info!(
            target: LOG_TARGET,
            "Tracked user transitioned to epoch {} at GST leaf #{}", epoch, gst_leaf_index
        );
        Ok(SyncOutcome::Transitioned { epoch, gst_leaf_index })
    }

    fn is_sign_up_leaf(&self, gst_leaf: &FieldElement) -> Result<bool, SyncError> {
        Ok(self.user_state()?.sign_up_gst_leaf() == *gst_leaf)
    }

    /// Whether `gst_leaf` is the tracked user's next leaf. The candidate is computed once the user's latest epoch is
    /// sealed, and is cached until the user moves.
    fn is_pending_leaf(&mut self, gst_leaf: &FieldElement) -> Result<bool, SyncError> {
        let from_epoch = self.user.latest_transitioned_epoch;
        if !self.user.has_signed_up || from_epoch >= self.state.current_epoch() {
            return Ok(false);
        }
        if self.pending.as_ref().map(|(epoch, _)| *epoch) != Some(from_epoch) {
            let next = match self.user_state()?.gen_new_user_state_after_transition() {
                Ok(next) => next,
                Err(UserStateError::EpochKeyAlreadyProcessed { nonce, nullifier }) => {
                    warn!(
                        target: LOG_TARGET,
                        "Epoch key {} of epoch {} was already processed (nullifier {})", nonce, from_epoch, nullifier
                    );
                    return Ok(false);
                },
                Err(e) => return Err(e.into()),
            };
            self.pending = Some((from_epoch, next));
        }
        Ok(self
            .pending
            .as_ref()
            .map(|(_, next)| next.new_gst_leaf == *gst_leaf)
            .unwrap_or(false))
    }
}
