//! Accepted product terms, grouped per output.

use crate::cube::{covers, Cube};

/// A cube accepted for one output.
///
/// `origin` is the index of the pre-heuristic term the cube descends from;
/// the selector uses it to invalidate sibling expansions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Term {
    pub cube: Cube,
    pub origin: usize,
}

/// The terms of one output, in insertion order, without content duplicates.
#[derive(Debug, Clone, Default)]
pub struct TermList {
    terms: Vec<Term>,
}

impl TermList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from cubes, numbering origins by position.
    /// Content duplicates after the first occurrence are skipped.
    pub fn from_cubes(cubes: impl IntoIterator<Item = Cube>) -> Self {
        let mut list = Self::new();
        for cube in cubes {
            let origin = list.len();
            list.insert(Term { cube, origin });
        }
        list
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    pub fn cubes(&self) -> impl Iterator<Item = &Cube> {
        self.terms.iter().map(|t| &t.cube)
    }

    pub fn get(&self, i: usize) -> &Term {
        &self.terms[i]
    }

    pub fn contains(&self, cube: &Cube) -> bool {
        self.position(cube).is_some()
    }

    pub fn position(&self, cube: &Cube) -> Option<usize> {
        self.terms.iter().position(|t| &t.cube == cube)
    }

    /// Append `term` unless a content-equal cube is already present.
    pub fn insert(&mut self, term: Term) -> bool {
        if self.contains(&term.cube) {
            return false;
        }
        self.terms.push(term);
        true
    }

    pub fn remove(&mut self, i: usize) -> Term {
        self.terms.remove(i)
    }

    /// Drop every term whose cube is covered by (or equal to) `cube`.
    /// Returns the number of removed terms.
    pub fn remove_covered_by(&mut self, cube: &Cube) -> usize {
        let before = self.terms.len();
        self.terms.retain(|t| !covers(cube, &t.cube).is_covering());
        before - self.terms.len()
    }

    /// Total number of defined literals over all terms.
    pub fn literal_count(&self) -> usize {
        self.terms.iter().map(|t| t.cube.literal_count()).sum()
    }
}

impl<'a> IntoIterator for &'a TermList {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn cube(s: &str) -> Cube {
        s.parse().unwrap()
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut list = TermList::new();
        assert!(list.insert(Term { cube: cube("10"), origin: 0 }));
        assert!(!list.insert(Term { cube: cube("10"), origin: 7 }));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0).origin, 0);
    }

    #[test]
    fn test_from_cubes_numbers_origins() {
        let list = TermList::from_cubes([cube("1-"), cube("01"), cube("1-")]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).origin, 0);
        assert_eq!(list.get(1).origin, 1);
    }

    #[test]
    fn test_remove_covered_by() {
        let mut list = TermList::from_cubes([cube("110"), cube("111"), cube("011"), cube("1-1")]);
        let removed = list.remove_covered_by(&cube("1-1"));
        // "111" is strictly covered, "1-1" is equal.
        assert_eq!(removed, 2);
        let left: Vec<String> = list.cubes().map(|c| c.to_string()).collect();
        assert_eq!(left, vec!["110", "011"]);
    }

    #[test]
    fn test_literal_count() {
        let list = TermList::from_cubes([cube("1-0"), cube("---"), cube("111")]);
        assert_eq!(list.literal_count(), 5);
        assert_eq!(list.position(&cube("---")), Some(1));
    }
}
