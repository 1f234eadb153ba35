// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use crate::FieldElement;

/// Epoch number. The first epoch is 1.
pub type Epoch = u64;

/// A pseudonymous, epoch-scoped handle derived from an identity nullifier.
pub type EpochKey = FieldElement;

/// Attester identifier. Valid ids lie in `(0, 2^userStateTreeDepth)`.
pub type AttesterId = FieldElement;

/// A one-time-use value. Zero is reserved as padding.
pub type Nullifier = FieldElement;
