//! # approx-sop: error-bounded approximate two-level minimization
//!
//! **`approx-sop`** shrinks a multi-output sum-of-products cover by trading
//! exactness for size: product terms are greedily generalized into larger,
//! less precise terms, and every generalization is charged the number of
//! off-set minterms it swallows. The total charge never exceeds a
//! caller-given budget, either per output or summed over all outputs.
//!
//! ## How it works
//!
//! 1. The input cover is minimized by an [`Oracle`][crate::oracle::Oracle].
//! 2. Every defined literal of every term is freed in turn; the relaxed cube
//!    becomes a [`Candidate`][crate::candidate::Candidate] ranked by
//!    `covered siblings / off-set minterms`.
//! 3. A [`Selector`][crate::selector::Selector] pops candidates from a
//!    [`PriorityQueue`][crate::queue::PriorityQueue] and admits those that fit
//!    the budget, replacing the sibling terms they cover.
//! 4. Terms implied by their siblings are dropped ([`reducer`]).
//! 5. Optionally, the target is factored as `g ∧ h` and verified
//!    ([`decompose`]).
//!
//! Boolean functions live in a [`Bdd`][crate::bdd::Bdd] manager: reduced
//! ordered BDDs with complement edges, hash-consed in a fixed-size arena.
//! Variables are 1-indexed; cube position `i` is variable `i + 1`.
//!
//! ## Basic usage
//!
//! ```rust
//! use approx_sop::config::{Budget, Config, ErrorMode};
//! use approx_sop::oracle::BddOracle;
//! use approx_sop::pla::Pla;
//! use approx_sop::session::run;
//!
//! let input: Pla = ".i 2\n.o 1\n11 1\n".parse().unwrap();
//! let config = Config::default()
//!     .with_mode(ErrorMode::Global)
//!     .with_budget(Budget::Absolute(1));
//!
//! let outcome = run(&input, &BddOracle::new(), &config, None).unwrap();
//! assert_eq!(outcome.ledger.global(), 1);
//! assert_eq!(outcome.approximate.rows.len(), 1);
//! assert_eq!(outcome.approximate.rows[0].inputs.literal_count(), 1);
//! ```

pub mod bdd;
pub mod cache;
pub mod candidate;
pub mod config;
pub mod cube;
pub mod decompose;
pub mod error;
pub mod oracle;
pub mod paths;
pub mod pla;
pub mod queue;
pub mod reducer;
pub mod reference;
pub mod sat;
pub mod selector;
pub mod session;
pub mod stats;
pub mod table;
pub mod term;
pub mod utils;
