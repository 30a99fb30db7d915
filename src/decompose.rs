//! AND-decomposition `f = g ∧ h` of a function against its approximation.
//!
//! Given an approximation `g ⊇ f`, the second factor `h` only has to agree
//! with `f` where `g` is on: everywhere `g` is off (and on the dc-set of `f`)
//! `h` is free. The oracle minimizes `h` under that tolerance, and the
//! product `g ∧ h` is checked against `f` by the oracle's verifier.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::bdd::Bdd;
use crate::error::{Error, Result};
use crate::oracle::{MinimizeMode, Oracle};
use crate::pla::{Functions, OutputValue, Pla, PlaRow};
use crate::reference::Ref;

pub const H_INPUT_FILE: &str = "h_input.pla";
pub const H_FILE: &str = "h.pla";
pub const PRODUCT_FILE: &str = "g_times_h.pla";

#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Minimized second factor.
    pub h: Pla,
    /// `g ∧ h`, one row per path cube and output.
    pub product: Pla,
    /// Files written, if an artifact directory was given.
    pub artifacts: Vec<PathBuf>,
}

pub struct Decomposer<'a, O: Oracle> {
    bdd: &'a Bdd,
    oracle: &'a O,
    num_inputs: usize,
}

impl<'a, O: Oracle> Decomposer<'a, O> {
    pub fn new(bdd: &'a Bdd, oracle: &'a O, num_inputs: usize) -> Self {
        Self {
            bdd,
            oracle,
            num_inputs,
        }
    }

    /// Cover of `functions`, one row per path cube with a one-hot output.
    fn product_pla(&self, functions: &[Ref]) -> Pla {
        let mut pla = Pla::new(self.num_inputs, functions.len());
        for (o, &f) in functions.iter().enumerate() {
            for cube in self.bdd.cubes(f, self.num_inputs) {
                let mut outputs = vec![OutputValue::Zero; functions.len()];
                outputs[o] = OutputValue::One;
                pla.rows.push(PlaRow { inputs: cube, outputs });
            }
        }
        pla
    }

    /// Decompose `f` (with dc-set `f_dc`) against its approximation `g`.
    ///
    /// Intermediate covers are written into `artifacts` when given. A product
    /// that the oracle does not accept as equivalent to `f` is reported as
    /// [`Error::DecompositionFailed`].
    pub fn decompose(&self, f: &Pla, f_dc: &[Ref], g: &Pla, artifacts: Option<&Path>) -> Result<Decomposition> {
        let bdd = self.bdd;
        let f_on = Functions::from_pla(bdd, &f.on_set_view()).on;
        let g_on = Functions::from_pla(bdd, &g.on_set_view()).on;

        let h_dc: Vec<Ref> = g_on
            .iter()
            .zip(f_dc)
            .map(|(&g, &dc)| bdd.apply_or(-g, dc))
            .collect();
        let h_input = Pla::from_functions(bdd, self.num_inputs, &f_on, &h_dc);
        let h = self.oracle.minimize(&h_input, MinimizeMode::Plain)?;
        let h_on = Functions::from_pla(bdd, &h).on;

        let and_out: Vec<Ref> = g_on
            .iter()
            .zip(&h_on)
            .map(|(&g, &h)| bdd.apply_and(g, h))
            .collect();
        let product = self.product_pla(&and_out);

        let mut written = Vec::new();
        if let Some(dir) = artifacts {
            fs::create_dir_all(dir)?;
            for (name, pla) in [(H_INPUT_FILE, &h_input), (H_FILE, &h), (PRODUCT_FILE, &product)] {
                let path = dir.join(name);
                pla.write(&path)?;
                written.push(path);
            }
        }

        if !self.oracle.verify(f, &product)? {
            let outputs = self.mismatches(&f_on, f_dc, &and_out);
            return Err(Error::DecompositionFailed {
                outputs,
                artifacts: written,
            });
        }

        debug!("h: {} rows, g*h: {} rows", h.rows.len(), product.rows.len());
        info!("Decomposition verified on {} outputs", and_out.len());
        Ok(Decomposition {
            h,
            product,
            artifacts: written,
        })
    }

    /// Outputs where `product` and `f` disagree outside the dc-set of `f`.
    fn mismatches(&self, f_on: &[Ref], f_dc: &[Ref], product: &[Ref]) -> Vec<usize> {
        let bdd = self.bdd;
        (0..product.len())
            .filter(|&o| {
                !bdd.is_implies(f_on[o], bdd.apply_or(product[o], f_dc[o]))
                    || !bdd.is_implies(product[o], bdd.apply_or(f_on[o], f_dc[o]))
            })
            .collect()
    }
}
