// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use thiserror::Error;
use unirep_common_types::FieldElement;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MerkleTreeError {
    #[error("Tree depth {depth} is not supported. Depth must be between 1 and {max}")]
    InvalidDepth { depth: usize, max: usize },
    #[error("Key {key} does not fit in a tree of depth {depth}")]
    KeyOutOfRange { key: FieldElement, depth: usize },
    #[error("Leaf index {index} is out of range. The capacity is {capacity}")]
    IndexOutOfRange { index: u64, capacity: u64 },
    #[error("The tree is full. The capacity is {capacity}")]
    TreeFull { capacity: u64 },
    #[error("The node store reported an error: {0}")]
    BackendError(String),
}
