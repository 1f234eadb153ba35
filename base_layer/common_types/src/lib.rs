// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Shared types for the Unirep state replication engine.
//!
//! Everything that crosses the boundary to a zero-knowledge circuit is a [`FieldElement`], an integer in the BN254
//! scalar field. Epochs are plain integers; epoch keys, attester ids and nullifiers are field elements.

mod field_element;
pub use field_element::{FieldElement, FieldElementError, SNARK_FIELD_SIZE};

pub mod types;
