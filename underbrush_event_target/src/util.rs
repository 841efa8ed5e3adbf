// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small sequence helpers.

use alloc::vec::Vec;

/// Remove the first element satisfying `matches` from an ordered sequence,
/// preserving the relative order of the remaining elements.
///
/// Returns whether an element was removed. Linear scan; the sequences this
/// crate maintains (owner back-reference lists) are short.
pub fn remove_element_if_present<T>(seq: &mut Vec<T>, mut matches: impl FnMut(&T) -> bool) -> bool {
    match seq.iter().position(|element| matches(element)) {
        Some(pos) => {
            seq.remove(pos);
            true
        }
        None => false,
    }
}
