//! Enumeration facade (spec.md §4.6).
//!
//! Every public query appends matches into a caller-supplied accumulator
//! set and returns a lazy concatenation of the relevant ubiquitous
//! bucket(s) followed by the accumulator. Ubiquitous elements always
//! precede accumulator elements in the sequence; no other ordering is
//! promised (spec.md §5).

use rustc_hash::FxHashSet;
use std::collections::hash_set;
use std::hash::Hash;

/// Lazily chains an ubiquitous-bucket iterator in front of an
/// accumulator iterator. Supports [`Enumeration::reset`] to restart
/// iteration from the same two source sets; it is not safe to keep
/// iterating (or to reset) across a mutation of either source.
pub struct Enumeration<'a, T> {
    ubiquitous_src: &'a FxHashSet<T>,
    accumulator_src: &'a FxHashSet<T>,
    ubiquitous: hash_set::Iter<'a, T>,
    accumulator: hash_set::Iter<'a, T>,
}

impl<'a, T: Eq + Hash> Enumeration<'a, T> {
    pub fn new(ubiquitous: &'a FxHashSet<T>, accumulator: &'a FxHashSet<T>) -> Self {
        Self {
            ubiquitous_src: ubiquitous,
            accumulator_src: accumulator,
            ubiquitous: ubiquitous.iter(),
            accumulator: accumulator.iter(),
        }
    }

    /// Restart iteration from the beginning of both sources.
    pub fn reset(&mut self) {
        self.ubiquitous = self.ubiquitous_src.iter();
        self.accumulator = self.accumulator_src.iter();
    }
}

impl<'a, T: Eq + Hash> Iterator for Enumeration<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.ubiquitous.next().or_else(|| self.accumulator.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_ubiquitous_before_accumulator() {
        let mut ubiquitous = FxHashSet::default();
        ubiquitous.insert(1);
        let mut accumulator = FxHashSet::default();
        accumulator.insert(2);

        let mut enumeration = Enumeration::new(&ubiquitous, &accumulator);
        let first = enumeration.next().copied();
        assert_eq!(first, Some(1));
        assert_eq!(enumeration.next().copied(), Some(2));
        assert_eq!(enumeration.next(), None);

        enumeration.reset();
        assert_eq!(enumeration.next().copied(), Some(1));
    }
}
