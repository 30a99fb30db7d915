//! Two-level minimization and equivalence checking.
//!
//! The pipeline only talks to an [`Oracle`]. [`BddOracle`] answers in-process
//! and deterministically; [`EspressoProcess`] drives an external `espresso`
//! executable through temporary files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};

use log::{debug, trace};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::bdd::{Bdd, BddConfig};
use crate::pla::{Functions, Pla, PlaError};
use crate::reducer::reduce;
use crate::reference::Ref;
use crate::term::{Term, TermList};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MinimizeMode {
    /// Heuristic minimization of the on-set, using the dc-set as slack.
    Plain,
    /// Only the don't-care set, echoed as a cover with `-` outputs.
    DontCareOnly,
    /// Minimum cover.
    Exact,
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unreadable oracle output: {0}")]
    Output(#[from] PlaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Oracle {
    fn minimize(&self, pla: &Pla, mode: MinimizeMode) -> Result<Pla, OracleError>;

    /// Whether `a` and `b` denote the same multi-output function.
    fn verify(&self, a: &Pla, b: &Pla) -> Result<bool, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn minimize(&self, pla: &Pla, mode: MinimizeMode) -> Result<Pla, OracleError> {
        (**self).minimize(pla, mode)
    }

    fn verify(&self, a: &Pla, b: &Pla) -> Result<bool, OracleError> {
        (**self).verify(a, b)
    }
}

/// In-process oracle over a private engine.
///
/// A minterm that is both on and don't-care counts as don't-care, as in
/// espresso's `fd` covers. Minimization expands every path cube of
/// `on ∧ ¬dc` literal by literal as long as it stays inside on-set ∪ dc-set,
/// then drops cubes implied by the rest. The result is a valid, irredundant cover but not necessarily a
/// minimum one; [`MinimizeMode::Exact`] uses the same procedure.
#[derive(Debug, Clone, Default)]
pub struct BddOracle {
    config: Option<BddConfig>,
}

impl BddOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BddConfig) -> Self {
        Self { config: Some(config) }
    }

    fn engine(&self, num_inputs: usize) -> Bdd {
        Bdd::new(self.config.unwrap_or_else(|| BddConfig::for_inputs(num_inputs)))
    }

    /// Irredundant cover of `required` that stays inside `care`.
    pub fn cover(bdd: &Bdd, num_inputs: usize, required: Ref, care: Ref) -> TermList {
        let mut terms = TermList::new();
        for cube in bdd.cubes(required, num_inputs) {
            let mut cube = cube;
            let positions: Vec<usize> = cube.defined_positions().collect();
            for i in positions {
                let relaxed = cube.relax(i);
                if bdd.is_implies(bdd.cube_function(&relaxed), care) {
                    cube = relaxed;
                }
            }
            let origin = terms.len();
            terms.insert(Term { cube, origin });
        }
        reduce(bdd, &mut terms);
        terms
    }

    /// Outputs on which `a` and `b` differ outside the union of their
    /// don't-care sets.
    pub fn mismatches(&self, a: &Pla, b: &Pla) -> Vec<usize> {
        let num_inputs = a.num_inputs.max(b.num_inputs);
        let bdd = self.engine(num_inputs);
        let fa = Functions::from_pla(&bdd, a);
        let fb = Functions::from_pla(&bdd, b);
        (0..a.num_outputs.max(b.num_outputs))
            .filter(|&o| match (fa.on.get(o), fb.on.get(o)) {
                (Some(&on_a), Some(&on_b)) => {
                    let dc = bdd.apply_or(fa.dc[o], fb.dc[o]);
                    !bdd.is_implies(on_a, bdd.apply_or(on_b, dc)) || !bdd.is_implies(on_b, bdd.apply_or(on_a, dc))
                }
                _ => true,
            })
            .collect()
    }
}

impl Oracle for BddOracle {
    fn minimize(&self, pla: &Pla, mode: MinimizeMode) -> Result<Pla, OracleError> {
        let bdd = self.engine(pla.num_inputs);
        let functions = Functions::from_pla(&bdd, pla);

        let result = match mode {
            MinimizeMode::DontCareOnly => {
                let none = vec![bdd.zero(); functions.num_outputs()];
                Pla::from_functions(&bdd, pla.num_inputs, &none, &functions.dc)
            }
            MinimizeMode::Plain | MinimizeMode::Exact => {
                let terms: Vec<TermList> = functions
                    .on
                    .iter()
                    .zip(&functions.dc)
                    .map(|(&on, &dc)| {
                        let required = bdd.apply_and(on, -dc);
                        Self::cover(&bdd, pla.num_inputs, required, bdd.apply_or(on, dc))
                    })
                    .collect();
                Pla::from_term_lists(pla.num_inputs, &terms)
            }
        };

        debug!(
            "minimize {:?}: {} rows in, {} rows out",
            mode,
            pla.rows.len(),
            result.rows.len()
        );
        Ok(result)
    }

    fn verify(&self, a: &Pla, b: &Pla) -> Result<bool, OracleError> {
        if a.num_inputs != b.num_inputs || a.num_outputs != b.num_outputs {
            return Ok(false);
        }
        Ok(self.mismatches(a, b).is_empty())
    }
}

/// An external `espresso` executable.
#[derive(Debug, Clone)]
pub struct EspressoProcess {
    program: PathBuf,
}

impl Default for EspressoProcess {
    fn default() -> Self {
        Self::new("espresso")
    }
}

impl EspressoProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn temp_pla(pla: &Pla) -> Result<NamedTempFile, OracleError> {
        let mut file = tempfile::Builder::new().suffix(".pla").tempfile()?;
        write!(file, "{}", pla)?;
        file.flush()?;
        Ok(file)
    }

    fn run(&self, args: &[&str], files: &[&Path]) -> Result<Output, OracleError> {
        trace!("{} {:?} {:?}", self.program.display(), args, files);
        Command::new(&self.program)
            .args(args)
            .args(files)
            .output()
            .map_err(|source| OracleError::Spawn {
                program: self.program.display().to_string(),
                source,
            })
    }
}

impl Oracle for EspressoProcess {
    fn minimize(&self, pla: &Pla, mode: MinimizeMode) -> Result<Pla, OracleError> {
        let args: &[&str] = match mode {
            MinimizeMode::Plain => &[],
            MinimizeMode::DontCareOnly => &["-Decho", "-od"],
            MinimizeMode::Exact => &["-Dexact"],
        };
        let input = Self::temp_pla(pla)?;
        let output = self.run(args, &[input.path()])?;
        if !output.status.success() {
            return Err(OracleError::Failed {
                program: self.program.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(Pla::parse(&String::from_utf8_lossy(&output.stdout))?)
    }

    fn verify(&self, a: &Pla, b: &Pla) -> Result<bool, OracleError> {
        let fa = Self::temp_pla(a)?;
        let fb = Self::temp_pla(b)?;
        let output = self.run(&["-Dverify"], &[fa.path(), fb.path()])?;
        Ok(output.status.success())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::pla::OutputValue;

    #[test]
    fn test_minimize_merges_adjacent_cubes() {
        let pla = Pla::parse(".i 3\n.o 1\n110 1\n111 1\n100 1\n101 1\n011 1\n").unwrap();
        let result = BddOracle::new().minimize(&pla, MinimizeMode::Plain).unwrap();
        let mut rows: Vec<String> = result.rows.iter().map(|r| r.inputs.to_string()).collect();
        rows.sort();
        assert_eq!(rows, vec!["-11", "1--"]);
        assert!(BddOracle::new().verify(&pla, &result).unwrap());
    }

    #[test]
    fn test_minimize_uses_dc_set() {
        let pla = Pla::parse(".i 2\n.o 1\n11 1\n10 -\n").unwrap();
        let result = BddOracle::new().minimize(&pla, MinimizeMode::Exact).unwrap();
        assert_eq!(result.to_string(), ".i 2\n.o 1\n.p 1\n1- 1\n.e\n");
        assert!(BddOracle::new().verify(&pla, &result).unwrap());
    }

    #[test]
    fn test_minimize_empty_and_full() {
        let oracle = BddOracle::new();
        let empty = Pla::parse(".i 2\n.o 1\n").unwrap();
        assert!(oracle.minimize(&empty, MinimizeMode::Plain).unwrap().rows.is_empty());

        let full = Pla::parse(".i 2\n.o 1\n0- 1\n1- 1\n").unwrap();
        let result = oracle.minimize(&full, MinimizeMode::Plain).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].inputs.to_string(), "--");
    }

    #[test]
    fn test_dont_care_only() {
        let pla = Pla::parse(".i 2\n.o 2\n11 1-\n0- -0\n").unwrap();
        let result = BddOracle::new().minimize(&pla, MinimizeMode::DontCareOnly).unwrap();
        for row in &result.rows {
            assert!(!row.outputs.contains(&OutputValue::One));
        }
        let view = result.dc_set_view();
        let bdd = Bdd::default();
        let dc = Functions::from_pla(&bdd, &view).on;
        assert_eq!(dc[0], bdd.mk_cube([-1]));
        assert_eq!(dc[1], bdd.mk_cube([1, 2]));
    }

    #[test]
    fn test_overlapping_dc_set_wins() {
        let oracle = BddOracle::new();
        // "11" is listed as both on and don't-care.
        let pla = Pla::parse(".i 2\n.o 1\n1- 1\n11 -\n").unwrap();
        let result = oracle.minimize(&pla, MinimizeMode::Plain).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert!(oracle.verify(&pla, &result).unwrap());

        // Dropping the overlapped minterm is not a mismatch, in either order.
        let without = Pla::parse(".i 2\n.o 1\n10 1\n").unwrap();
        assert!(oracle.verify(&pla, &without).unwrap());
        assert!(oracle.verify(&without, &pla).unwrap());

        let only_dc = Pla::parse(".i 2\n.o 1\n11 1\n11 -\n").unwrap();
        let result = oracle.minimize(&only_dc, MinimizeMode::Plain).unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_with_config() {
        let oracle = BddOracle::with_config(BddConfig::for_inputs(3).with_storage_bits(12));
        let pla = Pla::parse(".i 3\n.o 1\n11- 1\n1-1 1\n").unwrap();
        let result = oracle.minimize(&pla, MinimizeMode::Plain).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert!(oracle.verify(&pla, &result).unwrap());
    }

    #[test]
    fn test_verify_detects_difference() {
        let oracle = BddOracle::new();
        let a = Pla::parse(".i 2\n.o 2\n11 11\n").unwrap();
        let b = Pla::parse(".i 2\n.o 2\n11 10\n1- 01\n").unwrap();
        assert!(!oracle.verify(&a, &b).unwrap());
        assert_eq!(oracle.mismatches(&a, &b), vec![1]);

        let c = Pla::parse(".i 2\n.o 1\n11 1\n").unwrap();
        assert!(!oracle.verify(&a, &c).unwrap());
    }

    #[test]
    fn test_espresso_missing_program() {
        let oracle = EspressoProcess::new("/nonexistent/espresso-binary");
        let pla = Pla::parse(".i 1\n.o 1\n1 1\n").unwrap();
        assert!(matches!(
            oracle.minimize(&pla, MinimizeMode::Plain),
            Err(OracleError::Spawn { .. })
        ));
        assert!(matches!(oracle.verify(&pla, &pla), Err(OracleError::Spawn { .. })));
    }
}
