//! univsat Core - terms, configuration and the decision procedure interface
//!
//! This crate provides the foundational types shared by the univsat crates:
//! - Hash-consed bit-vector and boolean terms with a reference evaluator
//! - Fixed-width numeral helpers
//! - Solver configuration
//! - The [`DecisionProcedure`] trait implemented by satisfiability backends
//!
//! # Examples
//!
//! ```
//! use num_bigint::BigUint;
//! use rustc_hash::FxHashMap;
//! use univsat_core::ast::{TermManager, Value};
//!
//! let mut tm = TermManager::new();
//! let x = tm.mk_bv_var("x", 8);
//! let k = tm.mk_bv_u64(200, 8);
//! let le = tm.mk_bv_ule(x, k);
//!
//! let mut env = FxHashMap::default();
//! env.insert(x, BigUint::from(201u32));
//! assert_eq!(tm.eval(le, &env), Some(Value::Bool(false)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod config;
pub mod error;
pub mod numeral;
pub mod traits;

pub use ast::{Sort, Term, TermId, TermKind, TermManager, Value};
pub use config::SolverConfig;
pub use error::{Result, UnivsatError};
pub use traits::{CheckResult, DecisionProcedure, Label};
