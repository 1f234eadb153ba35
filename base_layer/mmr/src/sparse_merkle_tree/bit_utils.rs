// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::ops::Not;

use unirep_common_types::FieldElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraverseDirection {
    Left,
    Right,
}

impl Not for TraverseDirection {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            TraverseDirection::Left => TraverseDirection::Right,
            TraverseDirection::Right => TraverseDirection::Left,
        }
    }
}

/// Whether the ancestor of leaf `key` at the given height is the left or right child of its parent. Height 0 is the
/// leaf itself.
#[inline]
pub fn traverse_direction(key: &FieldElement, height: usize) -> TraverseDirection {
    if key.bit(height) {
        TraverseDirection::Right
    } else {
        TraverseDirection::Left
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn directions_follow_key_bits() {
        // 0b0110
        let key = FieldElement::from(6u64);
        assert_eq!(traverse_direction(&key, 0), TraverseDirection::Left);
        assert_eq!(traverse_direction(&key, 1), TraverseDirection::Right);
        assert_eq!(traverse_direction(&key, 2), TraverseDirection::Right);
        assert_eq!(traverse_direction(&key, 3), TraverseDirection::Left);
        assert_eq!(traverse_direction(&key, 200), TraverseDirection::Left);
        assert_eq!(!TraverseDirection::Left, TraverseDirection::Right);
    }
}
