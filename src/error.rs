//! Error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::oracle::OracleError;
use crate::pla::PlaError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("PLA error: {0}")]
    Pla(#[from] PlaError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Input and output counts must both be positive.
    #[error("Invalid dimensions: {inputs} inputs, {outputs} outputs")]
    InvalidDimensions { inputs: usize, outputs: usize },

    /// A percentage budget cannot be converted for this many inputs.
    #[error("Percentage budget cannot be used with {inputs} inputs, give a minterm count instead")]
    BudgetOutOfRange { inputs: usize },

    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    /// `g ∧ h` is not equivalent to the target function.
    #[error("Decomposition failed on outputs {outputs:?} (artifacts: {artifacts:?})")]
    DecompositionFailed {
        outputs: Vec<usize>,
        artifacts: Vec<PathBuf>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
