// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! # User state
//!
//! A per-identity view over a [`ProtocolState`]. It holds the user's private reputation ledger and their position in
//! the global state tree, and turns both into witnesses for the epoch key, reputation and user state transition
//! circuits.
//!
//! A `UserState` borrows the protocol state it was built for, so it cannot observe a mutation half way through
//! producing a witness. Owners that need to keep a user across protocol mutations hold a [`UserStateSnapshot`] and
//! rebuild the view when they need it.

mod error;
pub use error::UserStateError;

mod snapshot;
pub use snapshot::{LedgerEntry, UserStateSnapshot};

use log::*;
use primitive_types::U256;
use unirep_common_types::{
    types::{AttesterId, Epoch, EpochKey, Nullifier},
    FieldElement,
};
use unirep_hashing::{Blake2bFieldHasher, FieldHasher};
use unirep_mmr::{MerklePath, SparseMerkleTree};

use crate::{
    circuit_inputs::{KarmaInputs, ProveReputationInputs, UserStateTransitionInputs, VerifyEpochKeyInputs},
    derivation::{gen_attestation_nullifier, gen_epoch_key, gen_epoch_key_nullifier, gen_reputation_nullifier},
    identity::Identity,
    protocol_state::ProtocolState,
    reputation::{Reputation, ReputationFoldPolicy, ReputationLedger, UserStateLeaf},
};

const LOG_TARGET: &str = "c::unirep::user_state";

/// The result of folding the attestations of the user's last epoch into their ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserState {
    pub new_gst_leaf: FieldElement,
    pub new_ust_leaves: Vec<UserStateLeaf>,
}

/// Parameters of a reputation proof that also spends reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KarmaParams {
    /// The epoch key that receives the spent reputation
    pub epoch_key_nonce: usize,
    /// How many reputation nullifiers to burn
    pub amount: u64,
    /// The first reputation nonce to burn
    pub nonce_starter: u64,
}

pub struct UserState<'a, H = Blake2bFieldHasher> {
    protocol_state: &'a ProtocolState<H>,
    identity: Identity,
    commitment: FieldElement,
    has_signed_up: bool,
    latest_transitioned_epoch: Epoch,
    latest_gst_leaf_index: u64,
    ledger: ReputationLedger,
    fold_policy: ReputationFoldPolicy,
}

impl<'a, H: FieldHasher> UserState<'a, H> {
    /// A user that has not signed up yet.
    pub fn new(protocol_state: &'a ProtocolState<H>, identity: Identity) -> Self {
        let commitment = identity.commitment(protocol_state.hasher());
        Self {
            protocol_state,
            identity,
            commitment,
            has_signed_up: false,
            latest_transitioned_epoch: 0,
            latest_gst_leaf_index: 0,
            ledger: ReputationLedger::new(),
            fold_policy: ReputationFoldPolicy::default(),
        }
    }

    /// Rebuilds a user from stored bookkeeping. A signed up user needs the epoch and leaf index; a missing ledger is
    /// empty. Everything else is ignored for a user that has not signed up.
    pub fn restore(
        protocol_state: &'a ProtocolState<H>,
        identity: Identity,
        has_signed_up: bool,
        latest_transitioned_epoch: Option<Epoch>,
        latest_gst_leaf_index: Option<u64>,
        latest_user_state_leaves: Option<Vec<UserStateLeaf>>,
    ) -> Result<Self, UserStateError> {
        let mut user = Self::new(protocol_state, identity);
        if !has_signed_up {
            return Ok(user);
        }
        user.latest_transitioned_epoch =
            latest_transitioned_epoch.ok_or(UserStateError::MissingRestoreField("latestTransitionedEpoch"))?;
        user.latest_gst_leaf_index =
            latest_gst_leaf_index.ok_or(UserStateError::MissingRestoreField("latestGSTLeafIndex"))?;
        let leaves = latest_user_state_leaves.unwrap_or_default();
        for leaf in &leaves {
            user.check_attester_id(&leaf.attester_id)?;
        }
        user.ledger = leaves.into_iter().collect();
        user.has_signed_up = true;
        Ok(user)
    }

    #[must_use]
    pub fn with_fold_policy(mut self, fold_policy: ReputationFoldPolicy) -> Self {
        self.fold_policy = fold_policy;
        self
    }

    pub fn protocol_state(&self) -> &'a ProtocolState<H> {
        self.protocol_state
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn commitment(&self) -> FieldElement {
        self.commitment
    }

    pub fn has_signed_up(&self) -> bool {
        self.has_signed_up
    }

    /// The latest epoch in whose global state tree the user has a leaf.
    pub fn latest_transitioned_epoch(&self) -> Epoch {
        self.latest_transitioned_epoch
    }

    pub fn latest_gst_leaf_index(&self) -> u64 {
        self.latest_gst_leaf_index
    }

    pub fn ledger(&self) -> &ReputationLedger {
        &self.ledger
    }

    pub fn fold_policy(&self) -> ReputationFoldPolicy {
        self.fold_policy
    }

    /// The global state tree leaf a fresh sign up of this user carries.
    pub fn sign_up_gst_leaf(&self) -> FieldElement {
        self.protocol_state
            .hasher()
            .hash_left_right(self.commitment, self.protocol_state.empty_user_state_root())
    }

    pub fn sign_up(&mut self, epoch: Epoch, gst_leaf_index: u64) -> Result<(), UserStateError> {
        if self.has_signed_up {
            return Err(UserStateError::AlreadySignedUp);
        }
        self.latest_transitioned_epoch = epoch;
        self.latest_gst_leaf_index = gst_leaf_index;
        self.has_signed_up = true;
        debug!(
            target: LOG_TARGET,
            "User signed up in epoch {} at GST leaf #{}", epoch, gst_leaf_index
        );
        Ok(())
    }

    /// The reputation with `attester_id`, or the zero reputation.
    pub fn get_rep_by_attester(&self, attester_id: &AttesterId) -> Reputation {
        self.ledger.get(attester_id)
    }

    /// Records the pre-image of the graffiti currently held with `attester_id`.
    pub fn add_graffiti_pre_image(
        &mut self,
        attester_id: &AttesterId,
        graffiti_pre_image: FieldElement,
    ) -> Result<(), UserStateError> {
        self.check_attester_id(attester_id)?;
        let mut reputation = self.ledger.get(attester_id);
        reputation.add_graffiti_pre_image(self.protocol_state.hasher(), graffiti_pre_image)?;
        self.ledger.set(*attester_id, reputation);
        Ok(())
    }

    pub fn gen_user_state_tree(&self) -> Result<SparseMerkleTree<H>, UserStateError> {
        self.build_user_state_tree(&self.ledger)
    }

    pub fn gen_epoch_key(&self, epoch: Epoch, nonce: usize) -> EpochKey {
        gen_epoch_key(
            self.protocol_state.hasher(),
            &self.identity.identity_nullifier,
            epoch,
            nonce,
            self.protocol_state.constants().epoch_tree_depth(),
        )
    }

    /// One nullifier per attestation received in `epoch`, nonce by nonce, each nonce zero-padded to the number of
    /// attestations an epoch key can hold.
    pub fn get_attestation_nullifiers(&self, epoch: Epoch) -> Vec<Nullifier> {
        let constants = self.protocol_state.constants();
        let mut nullifiers = Vec::with_capacity(constants.num_attestation_slots());
        for nonce in 0..constants.num_epoch_key_nonce_per_epoch() {
            let epoch_key = self.gen_epoch_key(epoch, nonce);
            let attestations = self.protocol_state.get_epoch_attestations(epoch, &epoch_key);
            nullifiers.extend(
                attestations
                    .iter()
                    .map(|a| self.attestation_nullifier(&a.attester_id, epoch, &epoch_key)),
            );
            let padding = constants.num_attestations_per_epoch_key().saturating_sub(attestations.len());
            nullifiers.extend(std::iter::repeat(FieldElement::ZERO).take(padding));
        }
        nullifiers
    }

    /// The retirement nullifier of each of the user's epoch keys of `epoch`.
    pub fn get_epoch_key_nullifiers(&self, epoch: Epoch) -> Vec<Nullifier> {
        (0..self.protocol_state.constants().num_epoch_key_nonce_per_epoch())
            .map(|nonce| self.epoch_key_nullifier(epoch, nonce))
            .collect()
    }

    /// The nullifiers a user state transition out of the user's latest epoch publishes: the attestation nullifiers
    /// followed by the epoch key nullifiers.
    pub fn gen_user_state_transition_nullifiers(&self) -> Result<Vec<Nullifier>, UserStateError> {
        self.check_signed_up()?;
        let epoch = self.latest_transitioned_epoch;
        let mut nullifiers = self.get_attestation_nullifiers(epoch);
        nullifiers.extend(self.get_epoch_key_nullifiers(epoch));
        Ok(nullifiers)
    }

    /// Folds every attestation of the user's latest epoch into a copy of the ledger. Nothing is stored; commit the
    /// result with [`transition`](Self::transition).
    pub fn gen_new_user_state_after_transition(&self) -> Result<NewUserState, UserStateError> {
        self.check_signed_up()?;
        let from_epoch = self.latest_transitioned_epoch;
        let mut ledger = self.ledger.clone();
        for nonce in 0..self.protocol_state.constants().num_epoch_key_nonce_per_epoch() {
            let nullifier = self.epoch_key_nullifier(from_epoch, nonce);
            if self.protocol_state.nullifier_exists(&nullifier) {
                return Err(UserStateError::EpochKeyAlreadyProcessed { nonce, nullifier });
            }
            let epoch_key = self.gen_epoch_key(from_epoch, nonce);
            for attestation in self.protocol_state.get_epoch_attestations(from_epoch, &epoch_key) {
                ledger.apply(attestation, self.fold_policy);
            }
        }
        let new_root = self.build_user_state_tree(&ledger)?.get_root_hash();
        let new_gst_leaf = self.protocol_state.hasher().hash_left_right(self.commitment, new_root);
        debug!(
            target: LOG_TARGET,
            "New user state after epoch {}: {} ledger entries, GST leaf {}",
            from_epoch,
            ledger.len(),
            new_gst_leaf
        );
        Ok(NewUserState {
            new_gst_leaf,
            new_ust_leaves: ledger.to_leaves(),
        })
    }

    /// The witness for the user state transition circuit.
    ///
    /// Slots are visited nonce by nonce and, within a nonce, in attestation arrival order followed by padding. Each
    /// slot records the reputation and user state tree path before its attestation is applied, then the root after.
    /// Padding slots prove key 0 and leave the root unchanged.
    pub fn gen_user_state_transition_circuit_inputs(&self) -> Result<UserStateTransitionInputs, UserStateError> {
        self.check_signed_up()?;
        let state = self.protocol_state;
        let hasher = state.hasher();
        let constants = state.constants();
        let from_epoch = self.latest_transitioned_epoch;
        let slots = constants.num_attestation_slots();
        let nonces = constants.num_epoch_key_nonce_per_epoch();

        let mut ledger = self.ledger.clone();
        let mut user_state_tree = self.build_user_state_tree(&ledger)?;
        let gst_path = self.gen_gst_path()?;
        let gst_root = state.gen_gs_tree(from_epoch)?.root();
        let epoch_tree = state.gen_epoch_tree(from_epoch)?;
        let nullifier_tree = state.gen_nullifier_tree()?;

        let mut inputs = UserStateTransitionInputs {
            epoch: FieldElement::from(from_epoch),
            intermediate_user_state_tree_roots: Vec::with_capacity(slots + 1),
            old_pos_reps: Vec::with_capacity(slots),
            old_neg_reps: Vec::with_capacity(slots),
            old_graffities: Vec::with_capacity(slots),
            ust_path_elements: Vec::with_capacity(slots),
            identity_nullifier: self.identity.identity_nullifier,
            identity_trapdoor: self.identity.identity_trapdoor,
            gst_path_elements: gst_path.path_elements.clone(),
            gst_path_index: path_indices(&gst_path),
            gst_root,
            selectors: Vec::with_capacity(slots),
            attester_ids: Vec::with_capacity(slots),
            pos_reps: Vec::with_capacity(slots),
            neg_reps: Vec::with_capacity(slots),
            graffities: Vec::with_capacity(slots),
            overwrite_graffitis: Vec::with_capacity(slots),
            epk_path_elements: Vec::with_capacity(nonces),
            hash_chain_results: Vec::with_capacity(nonces),
            epoch_tree_root: epoch_tree.get_root_hash(),
            nullifier_tree_root: nullifier_tree.get_root_hash(),
            attestation_nullifier_path_elements: Vec::with_capacity(slots),
        };
        inputs
            .intermediate_user_state_tree_roots
            .push(user_state_tree.get_root_hash());

        for nonce in 0..nonces {
            let epoch_key = self.gen_epoch_key(from_epoch, nonce);
            let attestations = state.get_epoch_attestations(from_epoch, &epoch_key);
            for attestation in attestations {
                let attester_id = attestation.attester_id;
                let old = ledger.get(&attester_id);
                inputs.old_pos_reps.push(old.pos_rep);
                inputs.old_neg_reps.push(old.neg_rep);
                inputs.old_graffities.push(old.graffiti);
                inputs
                    .ust_path_elements
                    .push(user_state_tree.get_merkle_proof(&attester_id)?);

                let new = ledger.apply(attestation, self.fold_policy);
                let root = user_state_tree.update(&attester_id, new.hash(hasher))?;
                inputs.intermediate_user_state_tree_roots.push(root);

                inputs.selectors.push(FieldElement::ONE);
                inputs.attester_ids.push(attester_id);
                inputs.pos_reps.push(attestation.pos_rep);
                inputs.neg_reps.push(attestation.neg_rep);
                inputs.graffities.push(attestation.graffiti);
                inputs
                    .overwrite_graffitis
                    .push(FieldElement::from(attestation.overwrite_graffiti));

                let nullifier = self.attestation_nullifier(&attester_id, from_epoch, &epoch_key);
                inputs
                    .attestation_nullifier_path_elements
                    .push(nullifier_tree.get_merkle_proof(&nullifier)?);
            }
            let padding = constants.num_attestations_per_epoch_key().saturating_sub(attestations.len());
            for _ in 0..padding {
                inputs.old_pos_reps.push(FieldElement::ZERO);
                inputs.old_neg_reps.push(FieldElement::ZERO);
                inputs.old_graffities.push(FieldElement::ZERO);
                inputs
                    .ust_path_elements
                    .push(user_state_tree.get_merkle_proof(&FieldElement::ZERO)?);
                inputs
                    .intermediate_user_state_tree_roots
                    .push(user_state_tree.get_root_hash());

                inputs.selectors.push(FieldElement::ZERO);
                inputs.attester_ids.push(FieldElement::ZERO);
                inputs.pos_reps.push(FieldElement::ZERO);
                inputs.neg_reps.push(FieldElement::ZERO);
                inputs.graffities.push(FieldElement::ZERO);
                inputs.overwrite_graffitis.push(FieldElement::ZERO);
                inputs
                    .attestation_nullifier_path_elements
                    .push(nullifier_tree.get_merkle_proof(&FieldElement::ZERO)?);
            }
            inputs
                .epk_path_elements
                .push(epoch_tree.get_merkle_proof(&epoch_key)?);
            inputs.hash_chain_results.push(state.get_hashchain(&epoch_key));
        }
        trace!(
            target: LOG_TARGET,
            "Built user state transition witness out of epoch {} with {} slots",
            from_epoch,
            slots
        );
        Ok(inputs)
    }

    /// Moves the user into the current epoch with the given ledger. The user's new leaf is expected to land at the
    /// next free index of the current epoch's global state tree.
    pub fn transition(&mut self, latest_state_leaves: Vec<UserStateLeaf>) -> Result<(), UserStateError> {
        self.check_signed_up()?;
        let from = self.latest_transitioned_epoch;
        let to = self.protocol_state.current_epoch();
        if from >= to {
            return Err(UserStateError::InvalidTransitionEpoch { from, to });
        }
        for leaf in &latest_state_leaves {
            self.check_attester_id(&leaf.attester_id)?;
        }
        self.latest_transitioned_epoch = to;
        self.latest_gst_leaf_index = self.protocol_state.get_num_gst_leaves(to);
        self.ledger = latest_state_leaves.into_iter().collect();
        info!(
            target: LOG_TARGET,
            "User transitioned from epoch {} to epoch {}, GST leaf #{}", from, to, self.latest_gst_leaf_index
        );
        Ok(())
    }

    /// The witness for proving ownership of the epoch key with `nonce` in the user's latest epoch.
    pub fn gen_verify_epoch_key_circuit_inputs(&self, nonce: usize) -> Result<VerifyEpochKeyInputs, UserStateError> {
        self.check_signed_up()?;
        self.check_nonce(nonce)?;
        let epoch = self.latest_transitioned_epoch;
        let gst_path = self.gen_gst_path()?;
        let inputs = VerifyEpochKeyInputs {
            identity_nullifier: self.identity.identity_nullifier,
            identity_trapdoor: self.identity.identity_trapdoor,
            user_state_root: self.gen_user_state_tree()?.get_root_hash(),
            path_index: path_indices(&gst_path),
            path_elements: gst_path.path_elements,
            root: self.protocol_state.gen_gs_tree(epoch)?.root(),
            nonce: FieldElement::from(nonce),
            epoch: FieldElement::from(epoch),
            epoch_key: self.gen_epoch_key(epoch, nonce),
        };
        trace!(
            target: LOG_TARGET,
            "Built epoch key witness for nonce {} in epoch {}", nonce, epoch
        );
        Ok(inputs)
    }

    /// The witness for proving that the reputation held with `attester_id` meets `min_pos_rep` and `max_neg_rep`,
    /// optionally spending some of it.
    pub fn gen_prove_reputation_circuit_inputs(
        &self,
        attester_id: &AttesterId,
        min_pos_rep: FieldElement,
        max_neg_rep: FieldElement,
        graffiti_pre_image: FieldElement,
        karma: Option<KarmaParams>,
    ) -> Result<ProveReputationInputs, UserStateError> {
        self.check_signed_up()?;
        self.check_attester_id(attester_id)?;
        let reputation = self.get_rep_by_attester(attester_id);
        let karma = karma
            .map(|params| self.gen_karma_inputs(&reputation, params))
            .transpose()?;
        let user_state_tree = self.gen_user_state_tree()?;
        let gst_path = self.gen_gst_path()?;
        let inputs = ProveReputationInputs {
            identity_nullifier: self.identity.identity_nullifier,
            identity_trapdoor: self.identity.identity_trapdoor,
            user_state_root: user_state_tree.get_root_hash(),
            gst_path_index: path_indices(&gst_path),
            gst_path_elements: gst_path.path_elements,
            gst_root: self.protocol_state.gen_gs_tree(self.latest_transitioned_epoch)?.root(),
            attester_id: *attester_id,
            pos_rep: reputation.pos_rep,
            neg_rep: reputation.neg_rep,
            graffiti: reputation.graffiti,
            ust_path_elements: user_state_tree.get_merkle_proof(attester_id)?,
            min_pos_rep,
            max_neg_rep,
            graffiti_pre_image,
            karma,
        };
        trace!(
            target: LOG_TARGET,
            "Built reputation witness for attester {}", attester_id
        );
        Ok(inputs)
    }

    fn gen_karma_inputs(&self, reputation: &Reputation, params: KarmaParams) -> Result<KarmaInputs, UserStateError> {
        self.check_nonce(params.epoch_key_nonce)?;
        let budget = self.protocol_state.constants().max_reputation_budget();
        if params.amount > budget as u64 {
            return Err(UserStateError::ReputationBudgetExceeded {
                amount: params.amount,
                max: budget,
            });
        }
        let available = reputation.pos_rep.as_u256().saturating_sub(*reputation.neg_rep.as_u256());
        let required = U256::from(params.nonce_starter) + U256::from(params.amount);
        if required > available {
            return Err(UserStateError::InsufficientReputation { required, available });
        }

        let end = params
            .nonce_starter
            .checked_add(params.amount)
            .ok_or(UserStateError::ReputationNonceOverflow {
                nonce_starter: params.nonce_starter,
                amount: params.amount,
            })?;

        let epoch = self.latest_transitioned_epoch;
        let depth = self.protocol_state.constants().nullifier_tree_depth();
        let mut rep_nullifiers = Vec::with_capacity(budget);
        let mut selectors = Vec::with_capacity(budget);
        for nonce in params.nonce_starter..end {
            rep_nullifiers.push(gen_reputation_nullifier(
                self.protocol_state.hasher(),
                &self.identity.identity_nullifier,
                epoch,
                nonce,
                depth,
            ));
            selectors.push(FieldElement::ONE);
        }
        rep_nullifiers.resize(budget, FieldElement::ZERO);
        selectors.resize(budget, FieldElement::ZERO);
        Ok(KarmaInputs {
            epoch: FieldElement::from(epoch),
            epoch_key_nonce: FieldElement::from(params.epoch_key_nonce),
            epoch_key: self.gen_epoch_key(epoch, params.epoch_key_nonce),
            rep_nullifiers_amount: FieldElement::from(params.amount),
            start_rep_nonce: FieldElement::from(params.nonce_starter),
            rep_nullifiers,
            selectors,
        })
    }

    fn build_user_state_tree(&self, ledger: &ReputationLedger) -> Result<SparseMerkleTree<H>, UserStateError> {
        let hasher = self.protocol_state.hasher();
        let mut tree = SparseMerkleTree::new(
            self.protocol_state.constants().user_state_tree_depth(),
            Reputation::default().hash(hasher),
            hasher.clone(),
        )?;
        for (attester_id, reputation) in ledger.iter() {
            tree.update(attester_id, reputation.hash(hasher))?;
        }
        Ok(tree)
    }

    fn gen_gst_path(&self) -> Result<MerklePath, UserStateError> {
        let tree = self.protocol_state.gen_gs_tree(self.latest_transitioned_epoch)?;
        Ok(tree.gen_merkle_path(self.latest_gst_leaf_index)?)
    }

    fn attestation_nullifier(&self, attester_id: &AttesterId, epoch: Epoch, epoch_key: &EpochKey) -> Nullifier {
        gen_attestation_nullifier(
            self.protocol_state.hasher(),
            &self.identity.identity_nullifier,
            attester_id,
            epoch,
            epoch_key,
            self.protocol_state.constants().nullifier_tree_depth(),
        )
    }

    fn epoch_key_nullifier(&self, epoch: Epoch, nonce: usize) -> Nullifier {
        gen_epoch_key_nullifier(
            self.protocol_state.hasher(),
            &self.identity.identity_nullifier,
            epoch,
            nonce,
            self.protocol_state.constants().nullifier_tree_depth(),
        )
    }

    fn check_signed_up(&self) -> Result<(), UserStateError> {
        if !self.has_signed_up {
            return Err(UserStateError::NotSignedUp);
        }
        Ok(())
    }

    fn check_nonce(&self, nonce: usize) -> Result<(), UserStateError> {
        let max = self.protocol_state.constants().num_epoch_key_nonce_per_epoch();
        if nonce >= max {
            return Err(UserStateError::InvalidEpochKeyNonce { nonce, max });
        }
        Ok(())
    }

    fn check_attester_id(&self, attester_id: &AttesterId) -> Result<(), UserStateError> {
        let depth = self.protocol_state.constants().user_state_tree_depth();
        if attester_id.is_zero() || !attester_id.fits_in_bits(depth) {
            return Err(UserStateError::InvalidAttesterId {
                attester_id: *attester_id,
                depth,
            });
        }
        Ok(())
    }
}

fn path_indices(path: &MerklePath) -> Vec<FieldElement> {
    path.indices.iter().map(|i| FieldElement::from(u32::from(*i))).collect()
}
