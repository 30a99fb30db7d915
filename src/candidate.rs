//! Relaxed-cube candidates.
//!
//! Every accepted term spawns one candidate per defined literal: the same cube
//! with that literal freed. A candidate records how many off-set minterms the
//! relaxation would swallow and how many sibling terms it would make
//! superfluous.

use log::{debug, info, trace};
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::cube::{covers, Cube, Relation};
use crate::queue::PriorityQueue;
use crate::reference::Ref;
use crate::term::TermList;

#[derive(Debug, Clone)]
pub struct Candidate {
    pub cube: Cube,
    pub output: usize,
    /// Minterms of `cube ∩ off-set`, always positive.
    pub complemented_minterms: u64,
    /// Number of sibling terms strictly covered by `cube`.
    pub covered_count: usize,
    /// Origin of the term this candidate was relaxed from.
    pub origin: usize,
    pub valid: bool,
    /// `cube ∩ off-set[output]`, kept to avoid rebuilding it at admission.
    pub offset_intersection: Ref,
}

impl Candidate {
    pub fn priority(&self) -> f64 {
        self.covered_count as f64 / self.complemented_minterms as f64
    }
}

/// Count `m` as a machine integer if it lies in `1..=ct`.
pub(crate) fn count_within(m: &BigUint, ct: u64) -> Option<u64> {
    u64::try_from(m).ok().filter(|&m| m > 0 && m <= ct)
}

/// Builds the candidate queue for a set of per-output term lists.
pub struct Generator<'a> {
    bdd: &'a Bdd,
    num_inputs: usize,
    offset: &'a [Ref],
    ct: u64,
}

impl<'a> Generator<'a> {
    pub fn new(bdd: &'a Bdd, num_inputs: usize, offset: &'a [Ref], ct: u64) -> Self {
        Self {
            bdd,
            num_inputs,
            offset,
            ct,
        }
    }

    /// Classify the relaxation `relaxed` of a term of `output`.
    ///
    /// Returns `None` when the relaxation introduces no error, more error than
    /// the budget allows, or already exists among the siblings.
    pub fn classify(&self, relaxed: Cube, output: usize, origin: usize, siblings: &TermList) -> Option<Candidate> {
        let product = self.bdd.cube_function(&relaxed);
        let inter = self.bdd.apply_and(product, self.offset[output]);
        let m = self.bdd.sat_count(inter, self.num_inputs);

        let Some(complemented_minterms) = count_within(&m, self.ct) else {
            trace!("discard {} on output {}: {} off-set minterms", relaxed, output, m);
            return None;
        };

        let mut covered_count = 0;
        for sibling in siblings.cubes() {
            match covers(&relaxed, sibling) {
                Relation::Equal => {
                    trace!("discard {} on output {}: already present", relaxed, output);
                    return None;
                }
                Relation::StrictlyCovers => covered_count += 1,
                Relation::NoRelation => {}
            }
        }

        Some(Candidate {
            cube: relaxed,
            output,
            complemented_minterms,
            covered_count,
            origin,
            valid: true,
            offset_intersection: inter,
        })
    }

    /// Relax every defined literal of every term and queue the survivors.
    pub fn generate(&self, terms: &[TermList]) -> PriorityQueue<Candidate> {
        debug_assert_eq!(terms.len(), self.offset.len());

        let mut queue = PriorityQueue::new();
        for (output, list) in terms.iter().enumerate() {
            let before = queue.len();
            for term in list {
                for i in term.cube.defined_positions() {
                    let relaxed = term.cube.relax(i);
                    if let Some(candidate) = self.classify(relaxed, output, term.origin, list) {
                        queue.push(candidate.priority(), candidate);
                    }
                }
            }
            debug!(
                "output {}: {} terms, {} candidates",
                output,
                list.len(),
                queue.len() - before
            );
        }

        info!("Eligible candidates: {}", queue.len());
        queue
    }
}
