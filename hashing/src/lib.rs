// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The hash primitive consumed by the Unirep engine.
//!
//! All tree nodes, leaves, nullifiers and epoch keys are produced by a [`FieldHasher`]: a collision-resistant
//! function from a list of field elements to a field element. The circuits fix which concrete function is used
//! (typically Poseidon); this crate defines the contract and ships [`Blake2bFieldHasher`], a domain-separated
//! Blake2b instantiation used by default and in tests.

mod domains;
pub use domains::UnirepFieldHashDomain;

mod field_hasher;
pub use field_hasher::{Blake2bFieldHasher, DomainFieldHasher, FieldHasher};
