// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{fmt, marker::PhantomData};

use blake2::Blake2b;
use digest::{consts::U32, Digest};
use tari_crypto::hashing::DomainSeparation;
use unirep_common_types::FieldElement;

use crate::UnirepFieldHashDomain;

/// A collision-resistant hash from field elements to a field element.
///
/// Implementations must give distinct results for inputs of different lengths, so that `hash(&[a, b])` and
/// `hash(&[a, b, 0])` never coincide by construction.
pub trait FieldHasher: Clone + Default + Send + Sync {
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement;

    fn hash_one(&self, input: FieldElement) -> FieldElement {
        self.hash(&[input])
    }

    /// The two-input node hash used by every binary tree in the engine.
    fn hash_left_right(&self, left: FieldElement, right: FieldElement) -> FieldElement {
        self.hash(&[left, right])
    }

    fn hash5(&self, inputs: [FieldElement; 5]) -> FieldElement {
        self.hash(&inputs)
    }
}

/// A [`FieldHasher`] built from any byte digest and a hash domain. The digest is seeded with the domain separation
/// tag, followed by the input count as a little-endian `u64` and then the 32-byte big-endian encoding of each input.
/// The first 32 bytes of output are reduced modulo the field size.
pub struct DomainFieldHasher<D, M> {
    _phantom: PhantomData<fn() -> (D, M)>,
}

const FIELD_HASH_LABEL: &str = "field_elements";

impl<D, M> DomainFieldHasher<D, M> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

impl<D, M> Default for DomainFieldHasher<D, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, M> Clone for DomainFieldHasher<D, M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<D, M> fmt::Debug for DomainFieldHasher<D, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DomainFieldHasher")
    }
}

impl<D, M> FieldHasher for DomainFieldHasher<D, M>
where
    D: Digest + Default,
    M: DomainSeparation,
{
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement {
        let mut digest = D::default();
        M::add_domain_separation_tag(&mut digest, FIELD_HASH_LABEL);
        digest.update((inputs.len() as u64).to_le_bytes());
        for input in inputs {
            digest.update(input.to_be_bytes());
        }
        let output = digest.finalize();
        let mut bytes = [0u8; 32];
        let n = output.len().min(32);
        bytes[32 - n..].copy_from_slice(&output[..n]);
        FieldElement::from_be_bytes_reduced(&bytes)
    }
}

/// The default field hasher: Blake2b-256 in the Unirep field hash domain.
pub type Blake2bFieldHasher = DomainFieldHasher<Blake2b<U32>, UnirepFieldHashDomain>;
