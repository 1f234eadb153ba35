// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The seam to an external zero-knowledge proving backend. This crate only produces witnesses; compiling circuits,
//! proving and verifying is the backend's job.

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use unirep_common_types::FieldElement;

use crate::{
    circuit_inputs::{CircuitInputs, CircuitInputsError, CircuitKind},
    consensus::ProtocolConstants,
};

const LOG_TARGET: &str = "c::unirep::prover";

/// A proof in whatever encoding the backend uses, together with the public signals it commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofWithPublicSignals {
    pub proof: serde_json::Value,
    pub public_signals: Vec<FieldElement>,
}

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("Invalid circuit inputs: {0}")]
    InvalidInputs(#[from] CircuitInputsError),
    #[error("Proving backend error: {0}")]
    BackendError(String),
}

pub trait Prover {
    fn prove(&self, kind: CircuitKind, inputs: &serde_json::Value) -> Result<ProofWithPublicSignals, ProverError>;

    fn verify(&self, kind: CircuitKind, proof: &ProofWithPublicSignals) -> Result<bool, ProverError>;
}

/// Checks the shape of `inputs` against `constants` and proves them with `prover`.
pub fn prove_circuit<P, I>(
    prover: &P,
    constants: &ProtocolConstants,
    inputs: &I,
) -> Result<ProofWithPublicSignals, ProverError>
where
    P: Prover + ?Sized,
    I: CircuitInputs,
{
    inputs.check_shape(constants)?;
    let json = inputs.to_json()?;
    debug!(
        target: LOG_TARGET,
        "Proving {} (schema v{})",
        I::KIND,
        I::SCHEMA_VERSION
    );
    prover.prove(I::KIND, &json)
}

pub mod mocks {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    /// A prover that accepts everything while its flag is set, and fails every call otherwise.
    #[derive(Clone)]
    pub struct MockProver {
        is_valid: Arc<AtomicBool>,
    }

    pub struct SharedFlag(Arc<AtomicBool>);

    impl SharedFlag {
        pub fn set(&self, v: bool) {
            self.0.store(v, Ordering::SeqCst);
        }
    }

    impl MockProver {
        pub fn new(is_valid: bool) -> Self {
            Self {
                is_valid: Arc::new(AtomicBool::new(is_valid)),
            }
        }

        pub fn shared_flag(&self) -> SharedFlag {
            SharedFlag(self.is_valid.clone())
        }
    }

    impl Prover for MockProver {
        fn prove(&self, kind: CircuitKind, _inputs: &serde_json::Value) -> Result<ProofWithPublicSignals, ProverError> {
            if !self.is_valid.load(Ordering::SeqCst) {
                return Err(ProverError::BackendError("This mock prover always fails".to_string()));
            }
            Ok(ProofWithPublicSignals {
                proof: serde_json::json!({ "circuit": kind.circuit_name() }),
                public_signals: Vec::new(),
            })
        }

        fn verify(&self, kind: CircuitKind, proof: &ProofWithPublicSignals) -> Result<bool, ProverError> {
            Ok(self.is_valid.load(Ordering::SeqCst) && proof.proof["circuit"] == kind.circuit_name())
        }
    }
}
