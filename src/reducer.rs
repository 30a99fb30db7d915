//! Removal of terms implied by their siblings.

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::term::TermList;

/// Drop every term of `terms` that is implied by the disjunction of the other
/// remaining terms. Returns the number of dropped terms.
///
/// Terms are visited in order and each test sees the list as already reduced,
/// so a second pass over the result removes nothing.
pub fn reduce(bdd: &Bdd, terms: &mut TermList) -> usize {
    let mut removed = 0;
    let mut i = 0;
    while i < terms.len() {
        let single = bdd.cube_function(&terms.get(i).cube);
        let rest = bdd.apply_or_many(
            terms
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, t)| bdd.cube_function(&t.cube)),
        );

        if bdd.is_implies(single, rest) {
            let term = terms.remove(i);
            trace!("redundant term {}", term.cube);
            removed += 1;
        } else {
            i += 1;
        }
    }
    removed
}

/// [`reduce`] every output. Returns the number of dropped terms per output.
pub fn reduce_all(bdd: &Bdd, terms: &mut [TermList]) -> Vec<usize> {
    let removed: Vec<usize> = terms.iter_mut().map(|list| reduce(bdd, list)).collect();
    debug!("redundant terms removed per output: {:?}", removed);
    removed
}
