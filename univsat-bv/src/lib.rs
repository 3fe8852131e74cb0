//! univsat BV - bit-blasting decision procedure
//!
//! Translates univsat terms into CNF and decides them with the incremental
//! `varisat` SAT solver. Labeled assertions, scopes, models and unsatisfiable
//! cores are provided through the [`DecisionProcedure`] trait.
//!
//! # Example
//!
//! ```
//! use univsat_bv::VarisatBackend;
//! use univsat_core::{CheckResult, DecisionProcedure, Label, TermManager};
//!
//! let mut tm = TermManager::new();
//! let x = tm.mk_bv_var("x", 8);
//! let k = tm.mk_bv_u64(200, 8);
//! let le = tm.mk_bv_ule(x, k);
//! let ge = tm.mk_bv_ule(k, x);
//! let gt = tm.mk_not(le);
//!
//! let mut backend = VarisatBackend::new();
//! backend.declare(&tm, x);
//! backend.assert_labeled(&tm, ge, Label::new(0));
//! backend.assert_labeled(&tm, gt, Label::new(1));
//! assert_eq!(backend.check(), CheckResult::Sat);
//! ```
//!
//! [`DecisionProcedure`]: univsat_core::DecisionProcedure

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod blaster;

pub use backend::{BackendStats, VarisatBackend};
pub use blaster::{BitBlaster, Bits, BlastStats};
