// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! # Circuit inputs
//!
//! One record per circuit. Field names follow the circuit wire schema and every numeric value is a field element,
//! which serializes to JSON as a decimal string. Array members have a fixed width that depends only on the
//! [`ProtocolConstants`] the circuits were compiled for; [`CircuitInputs::check_shape`] verifies it before a record is
//! handed to a prover.

mod epoch_key;
pub use epoch_key::VerifyEpochKeyInputs;

mod reputation;
pub use reputation::{KarmaInputs, ProveReputationInputs};

mod user_state_transition;
pub use user_state_transition::UserStateTransitionInputs;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consensus::ProtocolConstants;

/// The circuits this crate produces witnesses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CircuitKind {
    VerifyEpochKey,
    ProveReputation,
    UserStateTransition,
}

impl CircuitKind {
    /// The name the circuit is compiled under.
    pub fn circuit_name(&self) -> &'static str {
        match self {
            CircuitKind::VerifyEpochKey => "verifyEpochKey",
            CircuitKind::ProveReputation => "proveReputation",
            CircuitKind::UserStateTransition => "userStateTransition",
        }
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.circuit_name())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CircuitInputsError {
    #[error("{kind} input `{field}` has {actual} elements, expected {expected}")]
    ShapeMismatch {
        kind: CircuitKind,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Could not serialize {kind} inputs: {message}")]
    Serialization { kind: CircuitKind, message: String },
}

pub trait CircuitInputs: Serialize {
    const KIND: CircuitKind;
    /// Bumped whenever a field is added, removed or renamed.
    const SCHEMA_VERSION: u32;

    /// Checks every array member against the widths the circuit was compiled for.
    fn check_shape(&self, constants: &ProtocolConstants) -> Result<(), CircuitInputsError>;

    fn to_json(&self) -> Result<serde_json::Value, CircuitInputsError> {
        serde_json::to_value(self).map_err(|e| CircuitInputsError::Serialization {
            kind: Self::KIND,
            message: e.to_string(),
        })
    }
}

pub(crate) fn check_len(
    kind: CircuitKind,
    field: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), CircuitInputsError> {
    if expected != actual {
        return Err(CircuitInputsError::ShapeMismatch {
            kind,
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Checks a list of paths: `outer` paths of `inner` elements each.
pub(crate) fn check_paths<T>(
    kind: CircuitKind,
    field: &'static str,
    paths: &[Vec<T>],
    outer: usize,
    inner: usize,
) -> Result<(), CircuitInputsError> {
    check_len(kind, field, outer, paths.len())?;
    paths.iter().try_for_each(|path| check_len(kind, field, inner, path.len()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds_display_as_circuit_names() {
        assert_eq!(CircuitKind::UserStateTransition.to_string(), "userStateTransition");
        assert_eq!(
            serde_json::to_string(&CircuitKind::VerifyEpochKey).unwrap(),
            r#""verifyEpochKey""#
        );
    }

    #[test]
    fn path_lists_are_checked_at_both_levels() {
        let kind = CircuitKind::ProveReputation;
        assert!(check_paths(kind, "p", &[vec![1, 2], vec![3, 4]], 2, 2).is_ok());
        assert_eq!(
            check_paths(kind, "p", &[vec![1, 2], vec![3]], 2, 2),
            Err(CircuitInputsError::ShapeMismatch {
                kind,
                field: "p",
                expected: 2,
                actual: 1
            })
        );
        assert!(check_paths::<u8>(kind, "p", &[], 1, 2).is_err());
    }
}
