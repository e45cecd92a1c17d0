//! Fixed 128-bit set of MIDI notes.

use keylight_midi::NoteNumber;
use serde::{Deserialize, Serialize};

/// One bit per MIDI note (bit `n` = note `n`).
///
/// Callers validate notes before touching the set; bits above 127 do not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteSet(u128);

impl NoteSet {
    pub const EMPTY: NoteSet = NoteSet(0);

    #[inline]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    #[inline]
    fn bit(note: NoteNumber) -> u128 {
        debug_assert!(note < 128);
        1u128 << note
    }

    #[inline]
    pub fn contains(&self, note: NoteNumber) -> bool {
        self.0 & Self::bit(note) != 0
    }

    /// Returns `true` if the note was not already present.
    #[inline]
    pub fn insert(&mut self, note: NoteNumber) -> bool {
        let was_set = self.contains(note);
        self.0 |= Self::bit(note);
        !was_set
    }

    /// Returns `true` if the note was present.
    #[inline]
    pub fn remove(&mut self, note: NoteNumber) -> bool {
        let was_set = self.contains(note);
        self.0 &= !Self::bit(note);
        was_set
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Empty the set and return what it held.
    #[inline]
    pub fn take(&mut self) -> NoteSet {
        std::mem::take(self)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Notes in ascending order.
    pub fn iter(&self) -> Iter {
        Iter { remaining: self.0 }
    }
}

impl FromIterator<NoteNumber> for NoteSet {
    fn from_iter<I: IntoIterator<Item = NoteNumber>>(iter: I) -> Self {
        let mut set = NoteSet::new();
        for note in iter {
            set.insert(note);
        }
        set
    }
}

impl IntoIterator for NoteSet {
    type Item = NoteNumber;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

impl IntoIterator for &NoteSet {
    type Item = NoteNumber;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        self.iter()
    }
}

/// Ascending iterator over the notes of a [`NoteSet`].
#[derive(Debug, Clone)]
pub struct Iter {
    remaining: u128,
}

impl Iterator for Iter {
    type Item = NoteNumber;

    fn next(&mut self) -> Option<NoteNumber> {
        if self.remaining == 0 {
            return None;
        }
        let note = self.remaining.trailing_zeros();
        // Clear lowest set bit
        self.remaining &= self.remaining - 1;
        Some(note as NoteNumber)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.remaining.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Iter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = NoteSet::new();
        assert!(set.is_empty());

        assert!(set.insert(60));
        assert!(!set.insert(60));
        assert!(set.contains(60));
        assert_eq!(set.len(), 1);

        assert!(set.remove(60));
        assert!(!set.remove(60));
        assert!(set.is_empty());
    }

    #[test]
    fn test_edges() {
        let mut set = NoteSet::new();
        set.insert(0);
        set.insert(127);
        assert!(set.contains(0));
        assert!(set.contains(127));
        assert!(!set.contains(64));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 127]);
    }

    #[test]
    fn test_iter_ascending() {
        let set: NoteSet = [72, 5, 64, 31, 100].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![5, 31, 64, 72, 100]);
        assert_eq!(set.iter().len(), 5);
    }

    #[test]
    fn test_take_empties() {
        let mut set: NoteSet = [1, 2, 3].into_iter().collect();
        let taken = set.take();
        assert!(set.is_empty());
        assert_eq!(taken.len(), 3);
    }

    #[test]
    fn test_full_set() {
        let set: NoteSet = (0..128).collect();
        assert_eq!(set.len(), 128);
        assert!(set.iter().eq(0..128));
    }

    #[test]
    fn test_serializes_as_bitmask() {
        let set: NoteSet = [0, 3].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), "9");
    }
}
