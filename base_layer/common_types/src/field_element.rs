// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{
    fmt,
    ops::{Add, AddAssign},
    str::FromStr,
};

use primitive_types::U256;
use rand::RngCore;
use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use thiserror::Error;

/// The BN254 scalar field modulus,
/// 21888242871839275222246405745257275088548364400416722299886324581622013495617.
pub const SNARK_FIELD_SIZE: U256 = U256([
    0x43e1_f593_f000_0001,
    0x2833_e848_79b9_7091,
    0xb850_45b6_8181_585d,
    0x3064_4e72_e131_a029,
]);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldElementError {
    #[error("Value {0} is not smaller than the field modulus")]
    OutOfRange(U256),
    #[error("Could not parse field element from `{value}`: {reason}")]
    ParseError { value: String, reason: String },
}

/// An element of the BN254 scalar field. The inner value is always smaller than [`SNARK_FIELD_SIZE`].
///
/// Human-readable serializers (JSON, TOML) see a decimal string, so that values above 2^53 survive a round trip
/// through JavaScript-style consumers. Binary serializers see 32 big-endian bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(U256);

impl FieldElement {
    pub const ONE: FieldElement = FieldElement(U256([1, 0, 0, 0]));
    pub const ZERO: FieldElement = FieldElement(U256([0, 0, 0, 0]));

    /// Creates a field element, failing if `value` is not a canonical representative.
    pub fn new(value: U256) -> Result<Self, FieldElementError> {
        if value >= SNARK_FIELD_SIZE {
            return Err(FieldElementError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Creates a field element from any 256-bit integer, reducing it modulo the field size.
    pub fn from_u256_reduced(value: U256) -> Self {
        Self(value % SNARK_FIELD_SIZE)
    }

    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self, FieldElementError> {
        Self::new(U256::from_big_endian(bytes))
    }

    pub fn from_be_bytes_reduced(bytes: &[u8; 32]) -> Self {
        Self::from_u256_reduced(U256::from_big_endian(bytes))
    }

    /// A uniformly-ish distributed random element (256 random bits reduced modulo the field size).
    pub fn random<R: RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self::from_be_bytes_reduced(&bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        buf
    }

    pub fn as_u256(&self) -> &U256 {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The number of significant bits.
    pub fn bits(&self) -> usize {
        self.0.bits()
    }

    /// Returns bit `index`, counting from the least significant bit.
    pub fn bit(&self, index: usize) -> bool {
        index < 256 && self.0.bit(index)
    }

    /// Keeps the lowest `bits` bits, i.e. `self mod 2^bits`.
    #[must_use]
    pub fn modulo_pow2(&self, bits: usize) -> Self {
        if bits >= 256 {
            return *self;
        }
        let mask = (U256::one() << bits) - U256::one();
        Self(self.0 & mask)
    }

    /// Returns true if `self < 2^bits`.
    pub fn fits_in_bits(&self, bits: usize) -> bool {
        self.bits() <= bits
    }

    /// Converts to a `u64`, if the value fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0.bits() > 64 {
            None
        } else {
            Some(self.0.low_u64())
        }
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: Self) -> Self::Output {
        // Both operands are below 2^254, so the sum cannot overflow 256 bits
        Self((self.0 + rhs.0) % SNARK_FIELD_SIZE)
    }
}

impl AddAssign for FieldElement {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self(U256::from(value))
    }
}

impl From<usize> for FieldElement {
    fn from(value: usize) -> Self {
        Self(U256::from(value))
    }
}

impl From<bool> for FieldElement {
    fn from(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

impl TryFrom<U256> for FieldElement {
    type Error = FieldElementError;

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldElement> for U256 {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl FromStr for FieldElement {
    type Err = FieldElementError;

    /// Parses a decimal string, or a hex string with a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse_err = |reason: String| FieldElementError::ParseError {
            value: s.to_string(),
            reason,
        };
        let value = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| parse_err(format!("{:?}", e)))?,
            None => U256::from_dec_str(trimmed).map_err(|e| parse_err(format!("{:?}", e)))?,
        };
        Self::new(value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.serialize_str(&self.to_string())
        } else {
            self.to_be_bytes().serialize(s)
        }
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct FieldElementVisitor;

        impl<'de> Visitor<'de> for FieldElementVisitor {
            type Value = FieldElement;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal or 0x-prefixed hex string, or an unsigned integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(FieldElement::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(FieldElement::from)
                    .map_err(|_| E::custom(format!("negative field element {}", v)))
            }
        }

        if d.is_human_readable() {
            d.deserialize_any(FieldElementVisitor)
        } else {
            let bytes = <[u8; 32]>::deserialize(d)?;
            FieldElement::from_be_bytes(&bytes).map_err(de::Error::custom)
        }
    }
}
