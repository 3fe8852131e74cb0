//! univsat Solver - univariate bit-vector constraint solving
//!
//! Answers incremental questions about a single `W`-bit unknown `x`:
//! satisfiability, a satisfying value, the smallest and largest satisfying
//! values, and the dependency ids of an unsatisfiable subset of constraints.
//!
//! Constraints are stated over polynomials in `x` given as coefficient lists
//! (constant coefficient first) and are translated into bit-vector formulas
//! decided by a [`DecisionProcedure`].
//!
//! # Examples
//!
//! ```
//! use num_bigint::BigUint;
//! use univsat_solver::{bitblast_factory, CheckResult, UnivariateSolver, UnivariateSolverFactory};
//!
//! let mut solver = bitblast_factory().create(8).unwrap();
//! solver.add_uge_const(&BigUint::from(5u32), false, 1);
//! // 3x + 1 <= 100, evaluated modulo 2^8
//! let lhs = [BigUint::from(1u32), BigUint::from(3u32)];
//! solver.add_ule(&lhs, &[BigUint::from(100u32)], false, 2);
//!
//! assert_eq!(solver.check(), CheckResult::Sat);
//! assert_eq!(solver.find_min(), Some(BigUint::from(5u32)));
//! assert_eq!(solver.find_max(), Some(BigUint::from(203u32)));
//! ```
//!
//! [`DecisionProcedure`]: univsat_core::DecisionProcedure

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
pub mod encoder;
pub mod extremal;
pub mod factory;
pub mod solver;

pub use cache::ModelCache;
pub use encoder::PolyEncoder;
pub use extremal::Direction;
pub use factory::{bitblast_factory, BitblastFactory, UnivariateSolverFactory};
pub use solver::{BitblastSolver, Dep, SolverStats, UnivariateSolver, EXTREMAL_DEP};
pub use univsat_core::{CheckResult, SolverConfig, UnivsatError};
