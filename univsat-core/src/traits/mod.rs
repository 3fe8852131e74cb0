//! Interfaces between the univariate solver and its collaborators.

pub mod decision;

pub use decision::{CheckResult, DecisionProcedure, Label};
