//! Run configuration: error mode, error budget and engine sizing.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::bdd::BddConfig;
use crate::error::{Error, Result};

/// How the error budget is shared between outputs.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum ErrorMode {
    /// One budget for the sum of the errors of all outputs.
    Global,
    /// Each output gets the whole budget for itself.
    #[default]
    PerOutput,
}

/// Error budget, in minterms or as a share of the input space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Budget {
    Absolute(u64),
    /// Percentage of `2^num_inputs`, in `0..=100`.
    Percent(f64),
}

impl Default for Budget {
    fn default() -> Self {
        Budget::Absolute(1)
    }
}

impl Budget {
    /// The budget as a number of minterms for a function of `num_inputs` inputs.
    ///
    /// A percentage `p` becomes `floor(p / 100 * 2^num_inputs)`.
    pub fn resolve(&self, num_inputs: usize) -> Result<u64> {
        match *self {
            Budget::Absolute(ct) => Ok(ct),
            Budget::Percent(p) => {
                if !(0.0..=100.0).contains(&p) {
                    return Err(Error::InvalidBudget(format!("{}% is not in 0..=100", p)));
                }
                if num_inputs >= u64::BITS as usize {
                    return Err(Error::BudgetOutOfRange { inputs: num_inputs });
                }
                let space = (1u64 << num_inputs) as f64;
                Ok((p / 100.0 * space).floor() as u64)
            }
        }
    }
}

impl Display for Budget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Absolute(ct) => write!(f, "{}", ct),
            Budget::Percent(p) => write!(f, "{}%", p),
        }
    }
}

impl FromStr for Budget {
    type Err = Error;

    /// `"12"` is an absolute budget, `"12%"` a percentage.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(p) = s.strip_suffix('%') {
            let p: f64 = p
                .trim()
                .parse()
                .map_err(|_| Error::InvalidBudget(s.to_string()))?;
            if !(0.0..=100.0).contains(&p) {
                return Err(Error::InvalidBudget(format!("{}% is not in 0..=100", p)));
            }
            Ok(Budget::Percent(p))
        } else {
            s.parse()
                .map(Budget::Absolute)
                .map_err(|_| Error::InvalidBudget(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mode: ErrorMode,
    pub budget: Budget,
    /// Use the oracle's exact minimization for the input function.
    pub exact: bool,
    /// Run AND-decomposition of the approximate result.
    pub decompose: bool,
    /// Engine sizing. `None` picks a size from the number of inputs.
    pub engine: Option<BddConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: ErrorMode::default(),
            budget: Budget::default(),
            exact: false,
            decompose: false,
            engine: None,
        }
    }
}

impl Config {
    pub fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_decompose(mut self, decompose: bool) -> Self {
        self.decompose = decompose;
        self
    }

    pub fn with_engine(mut self, engine: BddConfig) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn engine_for(&self, num_inputs: usize) -> BddConfig {
        self.engine.unwrap_or_else(|| BddConfig::for_inputs(num_inputs))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_parse_budget() {
        assert_eq!("7".parse::<Budget>().unwrap(), Budget::Absolute(7));
        assert_eq!("12.5%".parse::<Budget>().unwrap(), Budget::Percent(12.5));
        assert!("101%".parse::<Budget>().is_err());
        assert!("-3".parse::<Budget>().is_err());
        assert!("abc".parse::<Budget>().is_err());
    }

    #[test]
    fn test_resolve_percent() {
        assert_eq!(Budget::Percent(25.0).resolve(4).unwrap(), 4);
        assert_eq!(Budget::Percent(10.0).resolve(4).unwrap(), 1);
        assert_eq!(Budget::Percent(100.0).resolve(3).unwrap(), 8);
        assert_eq!(Budget::Percent(0.0).resolve(10).unwrap(), 0);
        assert_eq!(Budget::Absolute(3).resolve(100).unwrap(), 3);
    }

    #[test]
    fn test_resolve_out_of_range() {
        assert!(matches!(
            Budget::Percent(1.0).resolve(64),
            Err(Error::BudgetOutOfRange { inputs: 64 })
        ));
        assert!(matches!(
            Budget::Percent(150.0).resolve(4),
            Err(Error::InvalidBudget(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.mode, ErrorMode::PerOutput);
        assert_eq!(config.budget, Budget::Absolute(1));
        assert_eq!(config.engine_for(8), BddConfig::for_inputs(8));
        let config = config.with_engine(BddConfig::default().with_storage_bits(12));
        assert_eq!(config.engine_for(8).storage_bits, 12);
    }
}
