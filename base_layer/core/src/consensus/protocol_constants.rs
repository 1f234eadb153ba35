// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use config::Config;
use serde::{Deserialize, Serialize};
use unirep_common::{ConfigPath, ConfigurationError, DefaultConfigLoader};
use unirep_mmr::{MAX_INCREMENTAL_TREE_DEPTH, MAX_SMT_DEPTH};

/// This is the inner struct used to control all protocol values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConstants {
    /// Depth of the per-epoch global state tree
    global_state_tree_depth: usize,
    /// Depth of a user's reputation tree, keyed by attester id
    user_state_tree_depth: usize,
    /// Depth of the per-epoch epoch tree, keyed by epoch key
    epoch_tree_depth: usize,
    /// Depth of the global nullifier tree
    nullifier_tree_depth: usize,
    /// How many epoch keys a user holds in each epoch
    num_epoch_key_nonce_per_epoch: usize,
    /// How many attestations a single epoch key can receive in one epoch
    num_attestations_per_epoch_key: usize,
    /// Upper bound on global state tree leaves per epoch
    max_users: u64,
    /// How many reputation nullifiers one reputation proof can spend
    max_reputation_budget: usize,
    /// Epoch length in seconds. Informational; epochs advance on transition events
    epoch_length: u64,
}

impl ProtocolConstants {
    pub fn global_state_tree_depth(&self) -> usize {
        self.global_state_tree_depth
    }

    pub fn user_state_tree_depth(&self) -> usize {
        self.user_state_tree_depth
    }

    pub fn epoch_tree_depth(&self) -> usize {
        self.epoch_tree_depth
    }

    pub fn nullifier_tree_depth(&self) -> usize {
        self.nullifier_tree_depth
    }

    pub fn num_epoch_key_nonce_per_epoch(&self) -> usize {
        self.num_epoch_key_nonce_per_epoch
    }

    pub fn num_attestations_per_epoch_key(&self) -> usize {
        self.num_attestations_per_epoch_key
    }

    /// The number of attestation slots in one user state transition.
    pub fn num_attestation_slots(&self) -> usize {
        self.num_epoch_key_nonce_per_epoch * self.num_attestations_per_epoch_key
    }

    pub fn max_users(&self) -> u64 {
        self.max_users
    }

    pub fn max_reputation_budget(&self) -> usize {
        self.max_reputation_budget
    }

    pub fn epoch_length(&self) -> u64 {
        self.epoch_length
    }

    /// Small trees for local development and tests.
    pub fn local() -> Self {
        ProtocolConstants {
            global_state_tree_depth: 4,
            user_state_tree_depth: 4,
            epoch_tree_depth: 80,
            nullifier_tree_depth: 80,
            num_epoch_key_nonce_per_epoch: 2,
            num_attestations_per_epoch_key: 6,
            max_users: (1 << 4) - 1,
            max_reputation_budget: 10,
            epoch_length: 30,
        }
    }

    /// The tree sizes the production circuits are compiled for.
    pub fn circuit() -> Self {
        ProtocolConstants {
            global_state_tree_depth: 32,
            user_state_tree_depth: 32,
            epoch_tree_depth: 128,
            nullifier_tree_depth: 128,
            num_epoch_key_nonce_per_epoch: 2,
            num_attestations_per_epoch_key: 6,
            max_users: (1 << 32) - 1,
            max_reputation_budget: 10,
            epoch_length: 30,
        }
    }

    /// Checks that every tree depth can be built and that the global state tree can hold `max_users` leaves.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_depth(
            "global_state_tree_depth",
            self.global_state_tree_depth,
            MAX_INCREMENTAL_TREE_DEPTH,
        )?;
        check_depth("user_state_tree_depth", self.user_state_tree_depth, MAX_SMT_DEPTH)?;
        check_depth("epoch_tree_depth", self.epoch_tree_depth, MAX_SMT_DEPTH)?;
        check_depth("nullifier_tree_depth", self.nullifier_tree_depth, MAX_SMT_DEPTH)?;
        if self.num_epoch_key_nonce_per_epoch == 0 {
            return Err(ConfigurationError::new(
                "num_epoch_key_nonce_per_epoch",
                "must be greater than zero",
            ));
        }
        if self.num_attestations_per_epoch_key == 0 {
            return Err(ConfigurationError::new(
                "num_attestations_per_epoch_key",
                "must be greater than zero",
            ));
        }
        let gst_capacity = (1u64 << self.global_state_tree_depth) - 1;
        if self.max_users > gst_capacity {
            return Err(ConfigurationError::new(
                "max_users",
                format!(
                    "{} exceeds the {} leaves a global state tree of depth {} can hold",
                    self.max_users, gst_capacity, self.global_state_tree_depth
                ),
            ));
        }
        Ok(())
    }

    /// Loads the `[protocol]` section of `config`, falling back to [`ProtocolConstants::local`] for missing keys,
    /// and validates the result.
    pub fn load_from_config(config: &Config) -> Result<Self, ConfigurationError> {
        let constants = <Self as DefaultConfigLoader>::load_from(config)?;
        constants.validate()?;
        Ok(constants)
    }
}

fn check_depth(field: &str, depth: usize, max: usize) -> Result<(), ConfigurationError> {
    if depth == 0 || depth > max {
        return Err(ConfigurationError::new(
            field,
            format!("depth {} is outside 1..={}", depth, max),
        ));
    }
    Ok(())
}

impl Default for ProtocolConstants {
    fn default() -> Self {
        Self::local()
    }
}

impl ConfigPath for ProtocolConstants {
    fn main_key_prefix() -> &'static str {
        "protocol"
    }
}

/// Class to create custom protocol constants
pub struct ProtocolConstantsBuilder {
    constants: ProtocolConstants,
}

impl ProtocolConstantsBuilder {
    pub fn new(base: ProtocolConstants) -> Self {
        Self { constants: base }
    }

    pub fn with_global_state_tree_depth(mut self, depth: usize) -> Self {
        self.constants.global_state_tree_depth = depth;
        self
    }

    pub fn with_user_state_tree_depth(mut self, depth: usize) -> Self {
        self.constants.user_state_tree_depth = depth;
        self
    }

    pub fn with_epoch_tree_depth(mut self, depth: usize) -> Self {
        self.constants.epoch_tree_depth = depth;
        self
    }

    pub fn with_nullifier_tree_depth(mut self, depth: usize) -> Self {
        self.constants.nullifier_tree_depth = depth;
        self
    }

    pub fn with_num_epoch_key_nonce_per_epoch(mut self, count: usize) -> Self {
        self.constants.num_epoch_key_nonce_per_epoch = count;
        self
    }

    pub fn with_num_attestations_per_epoch_key(mut self, count: usize) -> Self {
        self.constants.num_attestations_per_epoch_key = count;
        self
    }

    pub fn with_max_users(mut self, max_users: u64) -> Self {
        self.constants.max_users = max_users;
        self
    }

    pub fn with_max_reputation_budget(mut self, budget: usize) -> Self {
        self.constants.max_reputation_budget = budget;
        self
    }

    pub fn with_epoch_length(mut self, seconds: u64) -> Self {
        self.constants.epoch_length = seconds;
        self
    }

    pub fn build(self) -> Result<ProtocolConstants, ConfigurationError> {
        self.constants.validate()?;
        Ok(self.constants)
    }
}
