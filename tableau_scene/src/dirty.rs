// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty bitset keyed by arena slot.

use alloc::vec::Vec;

/// Growable bitset marking arena slots whose cached region is stale.
#[derive(Clone, Debug, Default)]
pub(crate) struct DirtyBits {
    words: Vec<u64>,
    /// Number of set bits.
    count: usize,
}

impl DirtyBits {
    /// Marks `idx` dirty. Returns `true` if it was clean before.
    pub(crate) fn mark(&mut self, idx: usize) -> bool {
        let (word, bit) = (idx / 64, 1_u64 << (idx % 64));
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & bit == 0;
        if fresh {
            self.words[word] |= bit;
            self.count += 1;
        }
        fresh
    }

    /// Clears `idx`.
    pub(crate) fn clear(&mut self, idx: usize) {
        let (word, bit) = (idx / 64, 1_u64 << (idx % 64));
        if let Some(w) = self.words.get_mut(word)
            && *w & bit != 0
        {
            *w &= !bit;
            self.count -= 1;
        }
    }

    pub(crate) fn is_dirty(&self, idx: usize) -> bool {
        let (word, bit) = (idx / 64, 1_u64 << (idx % 64));
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Returns `true` if any slot is dirty.
    pub(crate) fn any(&self) -> bool {
        self.count > 0
    }
}
