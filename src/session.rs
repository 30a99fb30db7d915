//! A complete approximation run.
//!
//! A [`Session`] fixes the dimensions, the resolved budget and the engine for
//! one function. [`run`] drives the whole flow over a PLA: minimize the input
//! with the oracle, build the off-set and dc-set, generate and admit
//! candidates, drop redundant terms, re-minimize the result, keep the better
//! of the two covers, and optionally decompose.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::bdd::Bdd;
use crate::candidate::Generator;
use crate::config::{Budget, Config};
use crate::decompose::{Decomposer, Decomposition};
use crate::error::{Error, Result};
use crate::oracle::{MinimizeMode, Oracle};
use crate::pla::{Functions, Pla};
use crate::reducer::reduce_all;
use crate::reference::Ref;
use crate::selector::{ErrorLedger, SelectionStats, Selector};
use crate::stats::{choose_best, Choice, Gain, PlaStats};
use crate::term::TermList;

pub struct Session {
    num_inputs: usize,
    num_outputs: usize,
    config: Config,
    ct: u64,
    bdd: Bdd,
}

/// Result of the greedy phase on a set of term lists.
#[derive(Debug, Clone)]
pub struct Approximation {
    pub ledger: ErrorLedger,
    pub selection: SelectionStats,
    /// Cover right after selection, before redundancy removal.
    pub with_redundancy: Pla,
    /// Redundant terms removed per output.
    pub removed: Vec<usize>,
}

impl Session {
    pub fn new(num_inputs: usize, num_outputs: usize, config: Config) -> Result<Self> {
        if num_inputs == 0 || num_outputs == 0 {
            return Err(Error::InvalidDimensions {
                inputs: num_inputs,
                outputs: num_outputs,
            });
        }
        let ct = config.budget.resolve(num_inputs)?;
        let bdd = Bdd::new(config.engine_for(num_inputs));
        debug!("session: {} inputs, {} outputs, ct = {}, {:?}", num_inputs, num_outputs, ct, bdd);
        Ok(Self {
            num_inputs,
            num_outputs,
            config,
            ct,
            bdd,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The budget in minterms.
    pub fn ct(&self) -> u64 {
        self.ct
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    /// Budget as a share of the input space.
    pub fn ratio(&self) -> f64 {
        match self.config.budget {
            Budget::Percent(p) => p / 100.0,
            Budget::Absolute(ct) => ct as f64 / 2f64.powi(self.num_inputs as i32),
        }
    }

    /// Generate, admit and reduce, rewriting `terms` in place.
    pub fn approximate(&self, terms: &mut [TermList], offset: &[Ref], dc_set: &[Ref]) -> Approximation {
        assert_eq!(terms.len(), self.num_outputs);

        let mut queue = Generator::new(&self.bdd, self.num_inputs, offset, self.ct).generate(terms);
        let (ledger, selection) =
            Selector::new(&self.bdd, self.num_inputs, dc_set, self.config.mode, self.ct).select(&mut queue, terms);

        let with_redundancy = Pla::from_term_lists(self.num_inputs, terms);
        info!("After selection: {}", PlaStats::of(&with_redundancy));

        let removed = reduce_all(&self.bdd, terms);

        Approximation {
            ledger,
            selection,
            with_redundancy,
            removed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub ct: u64,
    /// `ct` as a share of `2^num_inputs`.
    pub ratio: f64,

    /// Stats of the input cover as given.
    pub input: PlaStats,
    /// Stats of the oracle-minimized input, the reference for gains.
    pub original: PlaStats,
    pub heuristic: PlaStats,
    pub with_redundancy: PlaStats,
    pub reminimized: PlaStats,
    pub choice: Choice,
    pub gain: Gain,

    pub ledger: ErrorLedger,
    pub selection: SelectionStats,
    /// Time spent in generation, selection and reduction.
    pub elapsed: Duration,

    pub minimized: Pla,
    pub approximate: Pla,
    pub approximate_with_redundancy: Pla,
    pub reminimized_pla: Pla,

    pub decomposition: Option<Decomposition>,
    /// Combined size of the chosen cover and `h`.
    pub decomposed: Option<PlaStats>,
}

impl Outcome {
    pub fn chosen(&self) -> &PlaStats {
        match self.choice {
            Choice::Heuristic => &self.heuristic,
            Choice::Reminimized => &self.reminimized,
        }
    }

    pub fn chosen_pla(&self) -> &Pla {
        match self.choice {
            Choice::Heuristic => &self.approximate,
            Choice::Reminimized => &self.reminimized_pla,
        }
    }
}

/// Approximate `input` under `config`.
///
/// Decomposition artifacts go to `artifacts` when given.
pub fn run<O: Oracle>(input: &Pla, oracle: &O, config: &Config, artifacts: Option<&Path>) -> Result<Outcome> {
    let session = Session::new(input.num_inputs, input.num_outputs, config.clone())?;
    let n = session.num_inputs();
    let bdd = session.bdd();

    let dc_pla = oracle.minimize(input, MinimizeMode::DontCareOnly)?.dc_set_view();
    let mode = if config.exact {
        MinimizeMode::Exact
    } else {
        MinimizeMode::Plain
    };
    let minimized = oracle.minimize(input, mode)?;
    if minimized.num_inputs != n || minimized.num_outputs != session.num_outputs() {
        return Err(Error::InvalidDimensions {
            inputs: minimized.num_inputs,
            outputs: minimized.num_outputs,
        });
    }

    let dc_set = Functions::from_pla(bdd, &dc_pla).on;
    let on_set = Functions::from_pla(bdd, &minimized).on;
    let offset: Vec<Ref> = on_set.iter().map(|&f| -f).collect();

    let input_stats = PlaStats::of(input);
    let original = PlaStats::of(&minimized);
    info!("NUM IN: {}, NUM OUT: {}", n, session.num_outputs());
    info!("Input function: {}", input_stats);
    info!("Minimized function: {}", original);
    info!(
        "Allowed error: {} minterms ({:?}), r = {}",
        session.ct(),
        config.mode,
        session.ratio()
    );

    let start = Instant::now();
    let mut terms = minimized.term_lists();
    let approximation = session.approximate(&mut terms, &offset, &dc_set);
    let approximate = Pla::from_term_lists(n, &terms);
    let elapsed = start.elapsed();

    let (hits, misses) = bdd.cache_stats();
    debug!("computed table: {} hits, {} misses", hits, misses);
    let roots: Vec<Ref> = on_set.iter().chain(&dc_set).chain(&offset).copied().collect();
    bdd.collect_garbage(&roots);

    let heuristic = PlaStats::of(&approximate);
    info!("After redundancy removal: {}", heuristic);

    let reminimized_pla = oracle.minimize(&approximate, MinimizeMode::Plain)?;
    let reminimized = PlaStats::of(&reminimized_pla);
    info!("Re-minimized: {}", reminimized);

    let choice = choose_best(&heuristic, &reminimized);
    let chosen = match choice {
        Choice::Heuristic => heuristic,
        Choice::Reminimized => reminimized,
    };
    let gain = Gain::between(&original, &chosen);
    info!("Gain ({:?}): {}", choice, gain);
    info!("CPU time: {:.3}s", elapsed.as_secs_f64());

    let (decomposition, decomposed) = if config.decompose {
        let decomposition = Decomposer::new(bdd, oracle, n).decompose(input, &dc_set, &approximate, artifacts)?;
        let h = PlaStats::of(&decomposition.h);
        let combined = PlaStats {
            and_literals: chosen.and_literals + h.and_literals,
            or_ports: chosen.or_ports + h.or_ports,
            ..Default::default()
        };
        info!(
            "Old SOP: AND {}, OR {}; new SOP: AND {}, OR {}",
            original.and_literals, original.or_ports, combined.and_literals, combined.or_ports
        );
        (Some(decomposition), Some(combined))
    } else {
        (None, None)
    };

    Ok(Outcome {
        num_inputs: n,
        num_outputs: session.num_outputs(),
        ct: session.ct(),
        ratio: session.ratio(),
        input: input_stats,
        original,
        heuristic,
        with_redundancy: PlaStats::of(&approximation.with_redundancy),
        reminimized,
        choice,
        gain,
        ledger: approximation.ledger,
        selection: approximation.selection,
        elapsed,
        minimized,
        approximate,
        approximate_with_redundancy: approximation.with_redundancy,
        reminimized_pla,
        decomposition,
        decomposed,
    })
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::config::ErrorMode;
    use crate::oracle::BddOracle;

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Session::new(0, 1, Config::default()),
            Err(Error::InvalidDimensions { inputs: 0, outputs: 1 })
        ));
        assert!(matches!(
            Session::new(3, 0, Config::default()),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_budget_resolution() {
        let config = Config::default().with_budget(Budget::Percent(50.0));
        let session = Session::new(4, 1, config).unwrap();
        assert_eq!(session.ct(), 8);
        assert_eq!(session.ratio(), 0.5);

        let config = Config::default().with_budget(Budget::Absolute(2));
        let session = Session::new(3, 1, config).unwrap();
        assert_eq!(session.ratio(), 0.25);

        let config = Config::default().with_budget(Budget::Percent(1.0));
        assert!(matches!(
            Session::new(70, 1, config),
            Err(Error::BudgetOutOfRange { inputs: 70 })
        ));
    }

    #[test]
    fn test_approximate_in_memory() {
        let config = Config::default().with_mode(ErrorMode::Global).with_budget(Budget::Absolute(1));
        let session = Session::new(2, 1, config).unwrap();
        let bdd = session.bdd();
        let f = bdd.mk_cube([1, 2]);
        let mut terms = vec![TermList::from_cubes(["11".parse().unwrap()])];

        let approximation = session.approximate(&mut terms, &[-f], &[bdd.zero()]);
        assert_eq!(approximation.ledger.global(), 1);
        assert_eq!(terms[0].len(), 1);
        assert_eq!(approximation.removed, vec![0]);
        assert_eq!(approximation.with_redundancy.rows.len(), 1);
    }

    #[test]
    fn test_run_with_bdd_oracle() {
        let input = Pla::parse(".i 3\n.o 2\n111 10\n110 10\n011 01\n001 01\n100 -0\n").unwrap();
        let config = Config::default().with_budget(Budget::Absolute(2));
        let outcome = run(&input, &BddOracle::new(), &config, None).unwrap();

        assert_eq!(outcome.ct, 2);
        assert!(outcome.ledger.admitted() > 0);
        for o in 0..2 {
            assert!(outcome.ledger.output(o) <= 2);
        }
        assert!(outcome.chosen().total() <= outcome.original.total());
        assert!(outcome.decomposition.is_none());

        // The approximation still covers the on-set of the input.
        let bdd = Bdd::default();
        let f = Functions::from_pla(&bdd, &input).on;
        let g = Functions::from_pla(&bdd, &outcome.approximate).on;
        for o in 0..2 {
            assert!(bdd.is_implies(f[o], g[o]));
        }
    }

    #[test]
    fn test_run_with_decomposition() {
        let input = Pla::parse(".i 3\n.o 1\n111 1\n101 1\n011 1\n").unwrap();
        let config = Config::default().with_budget(Budget::Absolute(2)).with_decompose(true);
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(&input, &BddOracle::new(), &config, Some(dir.path())).unwrap();

        let decomposition = outcome.decomposition.as_ref().unwrap();
        assert!(BddOracle::new().verify(&input, &decomposition.product).unwrap());
        assert!(outcome.decomposed.is_some());
    }
}
