//! Greedy admission of candidates under an error budget.
//!
//! Candidates are popped in priority order. Each one is charged its
//! *effective* error: the off-set minterms it swallows minus those that fall
//! in the don't-care set. A candidate is admitted only if the charge keeps
//! the relevant counter within the budget `ct`. On admission the candidate
//! replaces every sibling term it covers, and queued candidates that expand
//! the same term (or carry the same cube) on that output are invalidated.

use log::{debug, info, trace};

use crate::bdd::Bdd;
use crate::candidate::Candidate;
use crate::config::ErrorMode;
use crate::queue::PriorityQueue;
use crate::reference::Ref;
use crate::term::{Term, TermList};

/// Error accumulated by admitted candidates.
///
/// Counters only ever grow.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ErrorLedger {
    per_output: Vec<u64>,
    global: u64,
    dc_minterms: u64,
    admitted: usize,
}

impl ErrorLedger {
    pub fn new(num_outputs: usize) -> Self {
        Self {
            per_output: vec![0; num_outputs],
            ..Default::default()
        }
    }

    pub fn per_output(&self) -> &[u64] {
        &self.per_output
    }

    pub fn output(&self, output: usize) -> u64 {
        self.per_output[output]
    }

    pub fn global(&self) -> u64 {
        self.global
    }

    /// Off-set minterms of admitted candidates that fell into the don't-care set.
    pub fn dc_minterms(&self) -> u64 {
        self.dc_minterms
    }

    /// Number of admitted candidates.
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    /// Whether charging `effective` to `output` would overrun `ct`.
    pub fn exceeds(&self, mode: ErrorMode, output: usize, effective: u64, ct: u64) -> bool {
        let current = match mode {
            ErrorMode::PerOutput => self.per_output[output],
            ErrorMode::Global => self.global,
        };
        current.saturating_add(effective) > ct
    }

    fn charge(&mut self, output: usize, effective: u64, dc_minterms: u64) {
        self.per_output[output] += effective;
        self.global += effective;
        self.dc_minterms += dc_minterms;
        self.admitted += 1;
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SelectionStats {
    pub popped: usize,
    pub skipped: usize,
    pub rejected: usize,
    /// Entries still queued when the loop stopped.
    pub leftover: usize,
}

pub struct Selector<'a> {
    bdd: &'a Bdd,
    num_inputs: usize,
    dc_set: &'a [Ref],
    mode: ErrorMode,
    ct: u64,
}

impl<'a> Selector<'a> {
    pub fn new(bdd: &'a Bdd, num_inputs: usize, dc_set: &'a [Ref], mode: ErrorMode, ct: u64) -> Self {
        Self {
            bdd,
            num_inputs,
            dc_set,
            mode,
            ct,
        }
    }

    /// Effective error of `candidate`: off-set minterms outside the dc-set.
    ///
    /// # Panics
    ///
    /// Panics if the dc-set part is larger than the off-set part, which means
    /// the off-set and dc-set handed to the selector are inconsistent.
    pub fn effective_minterms(&self, candidate: &Candidate) -> (u64, u64) {
        let dc_inter = self
            .bdd
            .apply_and(candidate.offset_intersection, self.dc_set[candidate.output]);
        let dc_m = self.bdd.sat_count(dc_inter, self.num_inputs);

        let effective = u64::try_from(&dc_m)
            .ok()
            .and_then(|dc_m| candidate.complemented_minterms.checked_sub(dc_m));
        let Some(effective) = effective else {
            panic!(
                "Negative effective error for {} on output {}: {} off-set minterms, {} dc-set minterms",
                candidate.cube, candidate.output, candidate.complemented_minterms, dc_m
            );
        };
        (effective, candidate.complemented_minterms - effective)
    }

    /// Run the admission loop until the queue is empty or, in global mode,
    /// the budget is used up. Admitted cubes are written into `terms`.
    pub fn select(
        &self,
        queue: &mut PriorityQueue<Candidate>,
        terms: &mut [TermList],
    ) -> (ErrorLedger, SelectionStats) {
        let mut ledger = ErrorLedger::new(terms.len());
        let mut stats = SelectionStats::default();

        while !queue.is_empty() {
            if self.mode == ErrorMode::Global && ledger.global() >= self.ct {
                debug!("global budget {} used up", self.ct);
                break;
            }

            let Some(candidate) = queue.pop() else {
                continue;
            };
            stats.popped += 1;
            if !candidate.valid {
                stats.skipped += 1;
                continue;
            }

            let (effective, dc_m) = self.effective_minterms(&candidate);
            if ledger.exceeds(self.mode, candidate.output, effective, self.ct) {
                trace!(
                    "reject {} on output {}: effective error {}",
                    candidate.cube,
                    candidate.output,
                    effective
                );
                stats.rejected += 1;
                continue;
            }

            ledger.charge(candidate.output, effective, dc_m);
            self.admit(candidate, queue, terms);
        }

        stats.leftover = queue.clear();

        info!("Admitted products: {}", ledger.admitted());
        info!("Total error: {}", ledger.global());
        info!("DC-set error: {}", ledger.dc_minterms());
        info!("Error per output: {:?}", ledger.per_output());
        debug!("selection: {:?}", stats);

        (ledger, stats)
    }

    fn admit(&self, candidate: Candidate, queue: &mut PriorityQueue<Candidate>, terms: &mut [TermList]) {
        let Candidate {
            cube, output, origin, ..
        } = candidate;

        trace!("admit {} on output {}", cube, output);

        for other in queue.iter_mut() {
            if other.output == output && (other.origin == origin || other.cube == cube) {
                other.valid = false;
            }
        }

        let list = &mut terms[output];
        let removed = list.remove_covered_by(&cube);
        trace!("{} covered terms removed from output {}", removed, output);
        list.insert(Term { cube, origin });
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use test_log::test;

    use super::*;
    use crate::candidate::Generator;
    use crate::cube::Cube;

    fn cube(s: &str) -> Cube {
        s.parse().unwrap()
    }

    fn run(on: &[&str], dc: &[&str], width: usize, mode: ErrorMode, ct: u64) -> (Vec<String>, ErrorLedger) {
        let bdd = Bdd::default();
        let f = bdd.apply_or_many(on.iter().map(|s| bdd.cube_function(&cube(s))));
        let d = bdd.apply_or_many(dc.iter().map(|s| bdd.cube_function(&cube(s))));
        let offset = [-f];
        let dc_set = [d];
        let mut terms = vec![TermList::from_cubes(on.iter().map(|s| cube(s)))];

        let mut queue = Generator::new(&bdd, width, &offset, ct).generate(&terms);
        let (ledger, _) = Selector::new(&bdd, width, &dc_set, mode, ct).select(&mut queue, &mut terms);
        assert!(queue.is_empty());

        let cubes = terms[0].cubes().map(|c| c.to_string()).collect();
        (cubes, ledger)
    }

    #[test]
    fn test_single_minterm_global() {
        let (cubes, ledger) = run(&["11"], &[], 2, ErrorMode::Global, 1);
        assert_eq!(cubes.len(), 1);
        assert!(cubes[0] == "1-" || cubes[0] == "-1", "{:?}", cubes);
        assert_eq!(ledger.global(), 1);
        assert_eq!(ledger.admitted(), 1);
    }

    #[test]
    fn test_admission_invalidates_same_origin() {
        let bdd = Bdd::default();
        let offset = [-bdd.cube_function(&cube("11"))];
        let dc_set = [bdd.zero()];
        let mut terms = vec![TermList::from_cubes([cube("11")])];

        let mut queue = Generator::new(&bdd, 2, &offset, 2).generate(&terms);
        assert_eq!(queue.len(), 2);
        let (ledger, stats) = Selector::new(&bdd, 2, &dc_set, ErrorMode::PerOutput, 2).select(&mut queue, &mut terms);

        assert_eq!(terms[0].len(), 1);
        assert_eq!(ledger.global(), 1);
        assert_eq!(ledger.admitted(), 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.leftover, 0);
    }

    #[test]
    fn test_admission_invalidates_same_cube() {
        let bdd = Bdd::default();
        // Every minterm counts as off-set, so "1-" costs two.
        let offset = [bdd.one()];
        let dc_set = [bdd.zero()];
        let mut terms = vec![TermList::from_cubes([cube("11"), cube("10")])];

        let generator = Generator::new(&bdd, 2, &offset, 4);
        let mut queue = PriorityQueue::new();
        for origin in 0..2 {
            let candidate = generator.classify(cube("1-"), 0, origin, &terms[0]).unwrap();
            assert_eq!(candidate.covered_count, 2);
            queue.push(candidate.priority(), candidate);
        }

        let (ledger, stats) = Selector::new(&bdd, 2, &dc_set, ErrorMode::PerOutput, 4).select(&mut queue, &mut terms);
        assert_eq!(ledger.admitted(), 1);
        assert_eq!(ledger.output(0), 2);
        assert_eq!(stats.skipped, 1);
        let cubes: Vec<String> = terms[0].cubes().map(|c| c.to_string()).collect();
        assert_eq!(cubes, vec!["1-"]);
    }

    #[test]
    fn test_zero_budget_keeps_terms() {
        for mode in [ErrorMode::Global, ErrorMode::PerOutput] {
            let (cubes, ledger) = run(&["11", "00"], &[], 2, mode, 0);
            assert_eq!(cubes, vec!["11", "00"]);
            assert_eq!(ledger.global(), 0);
        }
    }

    #[test]
    fn test_dc_set_is_free() {
        // "01" is a don't-care, so widening "11" to "-1" costs nothing.
        let (cubes, ledger) = run(&["11"], &["01"], 2, ErrorMode::PerOutput, 1);
        assert_eq!(ledger.global(), 0);
        assert_eq!(ledger.dc_minterms(), 1);
        assert_eq!(ledger.admitted(), 1);
        assert_eq!(cubes, vec!["-1"]);
    }

    #[test]
    fn test_per_output_budget_respected() {
        let bdd = Bdd::default();
        let outputs = [vec!["110", "011"], vec!["000", "101", "111"]];
        let f: Vec<Ref> = outputs
            .iter()
            .map(|o| bdd.apply_or_many(o.iter().map(|s| bdd.cube_function(&cube(s)))))
            .collect();
        let offset: Vec<Ref> = f.iter().map(|&f| -f).collect();
        let dc_set = vec![bdd.zero(); 2];
        let terms: Vec<TermList> = outputs
            .iter()
            .map(|o| TermList::from_cubes(o.iter().map(|s| cube(s))))
            .collect();

        for ct in 0..4 {
            let mut terms = terms.clone();
            let mut queue = Generator::new(&bdd, 3, &offset, ct).generate(&terms);
            let (ledger, _) = Selector::new(&bdd, 3, &dc_set, ErrorMode::PerOutput, ct).select(&mut queue, &mut terms);
            for o in 0..2 {
                assert!(ledger.output(o) <= ct);
                // Overlapping expansions may be charged twice, never less.
                let g = bdd.apply_or_many(terms[o].cubes().map(|c| bdd.cube_function(c)));
                let actual = bdd.sat_count(bdd.apply_and(g, offset[o]), 3);
                assert!(actual <= BigUint::from(ledger.output(o)));
                assert!(bdd.is_implies(f[o], g));
            }
            assert_eq!(ledger.global(), ledger.output(0) + ledger.output(1));
        }
    }

    #[test]
    fn test_global_budget_respected() {
        let bdd = Bdd::default();
        let on = ["0000", "0101", "1010", "1111", "1100"];
        let f = bdd.apply_or_many(on.iter().map(|s| bdd.cube_function(&cube(s))));
        let offset = [-f];
        let dc_set = [bdd.zero()];
        for ct in 0..6 {
            let mut terms = vec![TermList::from_cubes(on.iter().map(|s| cube(s)))];
            let mut queue = Generator::new(&bdd, 4, &offset, ct).generate(&terms);
            let (ledger, stats) = Selector::new(&bdd, 4, &dc_set, ErrorMode::Global, ct).select(&mut queue, &mut terms);
            assert!(ledger.global() <= ct);
            assert_eq!(ledger.admitted() + stats.rejected + stats.skipped, stats.popped);
        }
    }

    #[test]
    #[should_panic(expected = "Negative effective error")]
    fn test_inconsistent_sets_panic() {
        let bdd = Bdd::default();
        let f = bdd.cube_function(&cube("11"));
        let offset = [-f];
        // A dc-set that is not inside the off-set.
        let dc_set = [bdd.one()];
        let mut candidate = Generator::new(&bdd, 2, &offset, 1)
            .classify(cube("1-"), 0, 0, &TermList::new())
            .unwrap();
        // Pretend the intersection was larger than the recorded count.
        candidate.offset_intersection = bdd.one();
        Selector::new(&bdd, 2, &dc_set, ErrorMode::Global, 1).effective_minterms(&candidate);
    }
}
