// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! # Unirep core
//!
//! The off-chain half of the Unirep reputation protocol. A [`ProtocolState`] replays the contract's events and can
//! rebuild every tree the contract commits to. A [`UserState`] layers one identity's private reputation ledger on top
//! of it and produces the witnesses for the epoch key, reputation and user state transition circuits.
//!
//! Proving itself happens elsewhere, behind the [`prover::Prover`] trait.

pub mod attestation;
pub mod circuit_inputs;
pub mod consensus;
pub mod derivation;
pub mod identity;
pub mod protocol_state;
pub mod prover;
pub mod reputation;
pub mod sync;
pub mod user_state;

#[cfg(test)]
mod test_helpers;

pub use protocol_state::{ProtocolEvent, ProtocolState, ProtocolStateError};
pub use sync::{SyncError, UnirepSynchronizer};
pub use user_state::{UserState, UserStateError};
