//! Construction of configured solvers

use crate::solver::{BitblastSolver, UnivariateSolver};
use univsat_bv::VarisatBackend;
use univsat_core::{DecisionProcedure, Result, SolverConfig};

/// Supplies one solver, with its own decision procedure, per bit width
pub trait UnivariateSolverFactory {
    /// Create a solver for unknowns of `bit_width` bits
    fn create(&self, bit_width: u32) -> Result<Box<dyn UnivariateSolver>>;
}

/// Factory of [`BitblastSolver`]s over backends built by a closure
#[derive(Debug, Clone)]
pub struct BitblastFactory<F> {
    config: SolverConfig,
    make_backend: F,
}

impl<F, D> BitblastFactory<F>
where
    F: Fn(u32) -> D,
    D: DecisionProcedure + 'static,
{
    /// Create a factory from a backend constructor
    #[must_use]
    pub fn new(make_backend: F) -> Self {
        Self {
            config: SolverConfig::default(),
            make_backend,
        }
    }

    /// Use the given configuration for created solvers
    #[must_use]
    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration handed to created solvers
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl<F, D> UnivariateSolverFactory for BitblastFactory<F>
where
    F: Fn(u32) -> D,
    D: DecisionProcedure + 'static,
{
    fn create(&self, bit_width: u32) -> Result<Box<dyn UnivariateSolver>> {
        let backend = (self.make_backend)(bit_width);
        let solver = BitblastSolver::with_backend(bit_width, backend, self.config.clone())?;
        Ok(Box::new(solver))
    }
}

/// Factory of solvers over the `varisat` bit-blasting backend
#[must_use]
pub fn bitblast_factory() -> BitblastFactory<fn(u32) -> VarisatBackend> {
    let make_backend: fn(u32) -> VarisatBackend = |_| VarisatBackend::new();
    BitblastFactory::new(make_backend)
}
