// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The protocol parameters that the on-chain contract and the circuits are built with. Every tree shape and every
//! fixed-width witness array is derived from these values, so the off-chain state must use exactly the same set.

mod protocol_constants;
pub use protocol_constants::{ProtocolConstants, ProtocolConstantsBuilder};
